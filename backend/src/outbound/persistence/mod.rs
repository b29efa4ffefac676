//! PostgreSQL adapters for the reputation ports.
//!
//! Adapters only translate between Diesel rows and domain types. Row structs
//! and table definitions stay private to this module, and every database
//! failure is mapped onto the owning port's error enum.
//!
//! # Example
//!
//! ```ignore
//! use reputation::outbound::persistence::{DbPool, DieselScoreRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/reputation")).await?;
//! let scores = DieselScoreRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_notification_repository;
mod diesel_score_repository;
mod diesel_user_directory;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_score_repository::DieselScoreRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};

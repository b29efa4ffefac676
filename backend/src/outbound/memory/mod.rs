//! In-process adapters used when no database is configured.

mod notification_repository;
mod score_repository;
mod user_directory;

pub use notification_repository::InMemoryNotificationRepository;
pub use score_repository::InMemoryScoreRepository;
pub use user_directory::InMemoryUserDirectory;

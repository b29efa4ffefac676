//! Forum reputation service: point scoring, rank progression and
//! notification delivery behind a hexagonal boundary.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
pub use settings::ReputationSettings;

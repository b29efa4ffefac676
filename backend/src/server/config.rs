//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use reputation::domain::{RankTable, ReputationServiceConfig};
use reputation::outbound::persistence::DbPool;
use reputation::outbound::push::DEFAULT_FEED_CAPACITY;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) rank_table: Arc<RankTable>,
    pub(crate) service: ReputationServiceConfig,
    pub(crate) feed_capacity: usize,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration over a validated rank table.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        rank_table: RankTable,
        service: ReputationServiceConfig,
    ) -> Self {
        Self {
            bind_addr,
            rank_table: Arc::new(rank_table),
            service,
            feed_capacity: DEFAULT_FEED_CAPACITY,
            db_pool: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, scores, notifications and the member directory are
    /// stored in PostgreSQL instead of process memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Buffer size of each live notification feed.
    #[must_use]
    pub fn with_feed_capacity(mut self, capacity: usize) -> Self {
        self.feed_capacity = capacity;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

//! Service configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `REPUTATION_*` environment variables and
//! configuration files. Every field is optional; the accessors supply the
//! defaults so an empty environment yields a working in-memory server.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{
    PointSchedule, RankTable, ReputationError, ReputationServiceConfig, RetryPolicy,
    RouterSettings,
};
use crate::outbound::push::DEFAULT_FEED_CAPACITY;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STEP_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_POOL_MAX_SIZE: u32 = 10;

/// Start-up settings for the reputation server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "REPUTATION")]
pub struct ReputationSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Absent means in-memory adapters.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub pool_max_size: Option<u32>,
    /// JSON file holding the rank tiers in ascending order.
    pub rank_table_path: Option<PathBuf>,
    pub post_created_points: Option<i64>,
    pub comment_created_points: Option<i64>,
    pub like_received_points: Option<i64>,
    pub deposit_confirmed_points: Option<i64>,
    /// Deadline for the scoring step of one event.
    pub scoring_timeout_ms: Option<u64>,
    /// Deadline for the notification fan-out of one event.
    pub delivery_timeout_ms: Option<u64>,
    /// Ledger attempts per update, including the first.
    pub retry_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    /// Buffered notifications per live feed subscriber.
    pub feed_capacity: Option<usize>,
}

impl ReputationSettings {
    /// Parse the configured listen address.
    ///
    /// # Errors
    /// Returns [`ReputationError::Config`] when the address is malformed.
    pub fn bind_addr(&self) -> Result<SocketAddr, ReputationError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err| {
            ReputationError::config(format!("bind address '{raw}' is invalid: {err}"))
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    pub fn feed_capacity(&self) -> usize {
        self.feed_capacity.unwrap_or(DEFAULT_FEED_CAPACITY).max(1)
    }

    /// Per-reason point amounts, overriding the defaults field by field.
    ///
    /// # Errors
    /// Returns [`ReputationError::Config`] for a negative amount.
    pub fn point_schedule(&self) -> Result<PointSchedule, ReputationError> {
        let defaults = PointSchedule::default();
        PointSchedule {
            post_created: self.post_created_points.unwrap_or(defaults.post_created),
            comment_created: self
                .comment_created_points
                .unwrap_or(defaults.comment_created),
            like_received: self.like_received_points.unwrap_or(defaults.like_received),
            deposit_confirmed: self
                .deposit_confirmed_points
                .unwrap_or(defaults.deposit_confirmed),
        }
        .validate()
    }

    /// Router deadlines, point schedule and ledger retry budget.
    ///
    /// # Errors
    /// Returns [`ReputationError::Config`] for negative amounts, zero
    /// timeouts or a zero retry budget.
    pub fn service_config(&self) -> Result<ReputationServiceConfig, ReputationError> {
        let scoring_timeout = positive_millis("scoring_timeout_ms", self.scoring_timeout_ms)?;
        let delivery_timeout = positive_millis("delivery_timeout_ms", self.delivery_timeout_ms)?;
        let defaults = RetryPolicy::default();
        let max_attempts = self.retry_attempts.unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            return Err(ReputationError::config("retry_attempts must be at least 1"));
        }
        let backoff = self
            .retry_backoff_ms
            .map_or(defaults.backoff, Duration::from_millis);

        Ok(ReputationServiceConfig {
            router: RouterSettings {
                schedule: self.point_schedule()?,
                scoring_timeout,
                delivery_timeout,
            },
            retry: RetryPolicy {
                max_attempts,
                backoff,
            },
        })
    }

    /// Load and validate the rank table, falling back to the stock forum
    /// progression when no path is configured.
    ///
    /// # Errors
    /// Returns [`ReputationError::Config`] when the file cannot be read or
    /// the table is invalid.
    pub fn rank_table(&self) -> Result<RankTable, ReputationError> {
        match &self.rank_table_path {
            Some(path) => load_rank_table(path),
            None => Ok(RankTable::forum_default()),
        }
    }
}

fn positive_millis(field: &str, value: Option<u64>) -> Result<Duration, ReputationError> {
    match value.unwrap_or(DEFAULT_STEP_TIMEOUT_MS) {
        0 => Err(ReputationError::config(format!("{field} must be positive"))),
        ms => Ok(Duration::from_millis(ms)),
    }
}

fn load_rank_table(path: &Path) -> Result<RankTable, ReputationError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        ReputationError::config(format!(
            "failed to read rank table {}: {err}",
            path.display()
        ))
    })?;
    RankTable::from_json(&raw)
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and defaults.

    use super::*;
    use std::ffi::OsString;
    use std::io::Write as _;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "REPUTATION_BIND_ADDR",
        "REPUTATION_DATABASE_URL",
        "REPUTATION_RANK_TABLE_PATH",
        "REPUTATION_POST_CREATED_POINTS",
        "REPUTATION_LIKE_RECEIVED_POINTS",
        "REPUTATION_SCORING_TIMEOUT_MS",
        "REPUTATION_DELIVERY_TIMEOUT_MS",
        "REPUTATION_RETRY_ATTEMPTS",
        "REPUTATION_FEED_CAPACITY",
    ];

    fn load_from_empty_args() -> ReputationSettings {
        ReputationSettings::load_from_iter([OsString::from("reputation")])
            .expect("config should load")
    }

    fn cleared() -> Vec<(&'static str, Option<String>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    fn with(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        let mut vars = cleared();
        for (name, value) in overrides {
            if let Some(slot) = vars.iter_mut().find(|(existing, _)| existing == name) {
                slot.1 = Some((*value).to_owned());
            }
        }
        vars
    }

    #[rstest]
    fn defaults_give_an_in_memory_server() {
        let _guard = lock_env(cleared());

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal")
        );
        assert!(settings.database_url().is_none());
        assert_eq!(settings.feed_capacity(), DEFAULT_FEED_CAPACITY);
        assert_eq!(
            settings.service_config().expect("defaults are valid"),
            ReputationServiceConfig::default()
        );
        assert_eq!(
            settings.rank_table().expect("stock table").len(),
            RankTable::forum_default().len()
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(with(&[
            ("REPUTATION_BIND_ADDR", "127.0.0.1:9000"),
            ("REPUTATION_DATABASE_URL", "postgres://forum@localhost/reputation"),
            ("REPUTATION_POST_CREATED_POINTS", "25"),
            ("REPUTATION_LIKE_RECEIVED_POINTS", "0"),
            ("REPUTATION_SCORING_TIMEOUT_MS", "750"),
            ("REPUTATION_RETRY_ATTEMPTS", "9"),
        ]));

        let settings = load_from_empty_args();
        let config = settings.service_config().expect("valid overrides");
        assert_eq!(settings.bind_addr().expect("address").port(), 9000);
        assert_eq!(
            settings.database_url(),
            Some("postgres://forum@localhost/reputation")
        );
        assert_eq!(config.router.schedule.post_created, 25);
        assert_eq!(config.router.schedule.like_received, 0);
        assert_eq!(config.router.schedule.comment_created, 5);
        assert_eq!(config.router.scoring_timeout, Duration::from_millis(750));
        assert_eq!(config.retry.max_attempts, 9);
    }

    #[rstest]
    #[case("REPUTATION_POST_CREATED_POINTS", "-1")]
    #[case("REPUTATION_DELIVERY_TIMEOUT_MS", "0")]
    #[case("REPUTATION_RETRY_ATTEMPTS", "0")]
    fn invalid_values_are_config_errors(#[case] name: &'static str, #[case] value: &str) {
        let _guard = lock_env(with(&[(name, value)]));

        let error = load_from_empty_args()
            .service_config()
            .expect_err("rejected");
        assert!(matches!(error, ReputationError::Config { .. }));
    }

    #[rstest]
    fn malformed_bind_address_is_rejected() {
        let _guard = lock_env(with(&[("REPUTATION_BIND_ADDR", "not-an-address")]));

        let error = load_from_empty_args().bind_addr().expect_err("rejected");
        assert!(matches!(error, ReputationError::Config { .. }));
    }

    #[rstest]
    fn rank_table_is_read_from_the_configured_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("rank-table-{}.json", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).expect("create table file");
        file.write_all(
            br#"[
                {"id": "lurker", "displayName": "Lurker", "minThreshold": 0, "iconRef": "eye", "colorRef": "grey"},
                {"id": "regular", "displayName": "Regular", "minThreshold": 30, "iconRef": "chat", "colorRef": "green"}
            ]"#,
        )
        .expect("write table file");

        let path_value = path.display().to_string();
        let table = {
            let _guard = lock_env(with(&[("REPUTATION_RANK_TABLE_PATH", path_value.as_str())]));
            load_from_empty_args().rank_table()
        };
        std::fs::remove_file(&path).expect("remove table file");

        let ids: Vec<String> = table
            .expect("valid table")
            .tiers_ordered_ascending()
            .map(|tier| tier.id.to_string())
            .collect();
        assert_eq!(ids, ["lurker", "regular"]);
    }

    #[rstest]
    fn unreadable_rank_table_aborts_start_up() {
        let _guard = lock_env(with(&[(
            "REPUTATION_RANK_TABLE_PATH",
            "/nonexistent/rank-table.json",
        )]));

        let error = load_from_empty_args().rank_table().expect_err("missing file");
        assert!(matches!(error, ReputationError::Config { .. }));
    }
}

//! Rank tiers and the pure evaluator that maps point totals onto them.
//!
//! A [`RankTable`] is validated once at start-up and is immutable thereafter.
//! [`RankEvaluator`] answers "which tier does this total earn?" and "is this
//! transition an advancement?" without touching storage.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ReputationError;

/// Stable identifier for a rank tier, e.g. `member`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "member")]
pub struct RankTierId(String);

impl RankTierId {
    /// Wrap a raw tier identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for RankTierId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RankTierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<&str> for RankTierId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A named band of reputation starting at `min_threshold` (inclusive).
///
/// The upper edge is implied by the next tier's threshold; the last tier in a
/// table is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankTier {
    /// Stable identifier.
    pub id: RankTierId,
    /// Label shown to members.
    #[schema(example = "Member")]
    pub display_name: String,
    /// Lowest total that qualifies for the tier.
    #[schema(example = 50)]
    pub min_threshold: i64,
    /// Icon reference for the presentation layer.
    #[schema(example = "fa-user")]
    pub icon_ref: String,
    /// Colour reference for the presentation layer.
    #[schema(example = "text-green-400")]
    pub color_ref: String,
}

impl RankTier {
    /// Convenience constructor used by the built-in table and tests.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        min_threshold: i64,
        icon_ref: impl Into<String>,
        color_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: RankTierId::new(id),
            display_name: display_name.into(),
            min_threshold,
            icon_ref: icon_ref.into(),
            color_ref: color_ref.into(),
        }
    }
}

/// Validated, ascending list of rank tiers.
///
/// ## Invariants
/// - At least one tier exists and the first starts at 0.
/// - Thresholds strictly increase; ids are unique and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankTable {
    first: RankTier,
    higher: Vec<RankTier>,
}

impl RankTable {
    /// Validate `tiers` (already in ascending order) into a table.
    ///
    /// # Errors
    /// Returns [`ReputationError::Config`] when any invariant is violated.
    pub fn new(tiers: Vec<RankTier>) -> Result<Self, ReputationError> {
        let mut iter = tiers.into_iter();
        let Some(first) = iter.next() else {
            return Err(ReputationError::config("rank table must define at least one tier"));
        };
        if first.min_threshold != 0 {
            return Err(ReputationError::config(format!(
                "first tier '{}' must start at 0, found {}",
                first.id, first.min_threshold
            )));
        }

        let higher: Vec<RankTier> = iter.collect();
        let mut seen = HashSet::new();
        let mut previous = &first;
        for tier in std::iter::once(&first).chain(higher.iter()) {
            if tier.id.as_ref().trim().is_empty() {
                return Err(ReputationError::config("tier ids must not be empty"));
            }
            if !seen.insert(tier.id.clone()) {
                return Err(ReputationError::config(format!(
                    "duplicate tier id '{}'",
                    tier.id
                )));
            }
            if !std::ptr::eq(tier, previous) && tier.min_threshold <= previous.min_threshold {
                return Err(ReputationError::config(format!(
                    "tier '{}' threshold {} must exceed '{}' threshold {}",
                    tier.id, tier.min_threshold, previous.id, previous.min_threshold
                )));
            }
            previous = tier;
        }

        Ok(Self { first, higher })
    }

    /// Parse a JSON array of tiers and validate it.
    ///
    /// # Errors
    /// Returns [`ReputationError::Config`] for malformed JSON or an invalid
    /// table.
    pub fn from_json(raw: &str) -> Result<Self, ReputationError> {
        let tiers: Vec<RankTier> = serde_json::from_str(raw)
            .map_err(|err| ReputationError::config(format!("rank table is not valid JSON: {err}")))?;
        Self::new(tiers)
    }

    /// The forum's stock progression: newbie, member, advanced, expert,
    /// moderator.
    pub fn forum_default() -> Self {
        Self {
            first: RankTier::new("newbie", "Newbie", 0, "fa-user-circle", "text-gray-400"),
            higher: vec![
                RankTier::new("member", "Member", 50, "fa-user", "text-green-400"),
                RankTier::new("advanced", "Advanced", 200, "fa-medal", "text-blue-400"),
                RankTier::new("expert", "Expert", 500, "fa-star", "text-yellow-400"),
                RankTier::new("moderator", "Moderator", 1000, "fa-shield-alt", "text-purple-400"),
            ],
        }
    }

    /// Tiers in ascending threshold order.
    pub fn tiers_ordered_ascending(&self) -> impl Iterator<Item = &RankTier> {
        std::iter::once(&self.first).chain(self.higher.iter())
    }

    /// The entry tier every new account starts in.
    pub fn first(&self) -> &RankTier {
        &self.first
    }

    /// Number of tiers in the table.
    pub fn len(&self) -> usize {
        self.higher.len() + 1
    }

    /// Tables are never empty; present for API symmetry with [`Self::len`].
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Look up a tier by id.
    pub fn tier(&self, id: &RankTierId) -> Option<&RankTier> {
        self.tiers_ordered_ascending().find(|tier| &tier.id == id)
    }

    /// Zero-based position of `id` in ascending order.
    pub fn position(&self, id: &RankTierId) -> Option<usize> {
        self.tiers_ordered_ascending().position(|tier| &tier.id == id)
    }
}

/// Pure mapping from point totals to tiers.
#[derive(Debug, Clone)]
pub struct RankEvaluator {
    table: Arc<RankTable>,
}

impl RankEvaluator {
    /// Build an evaluator over a shared table.
    pub fn new(table: Arc<RankTable>) -> Self {
        Self { table }
    }

    /// The underlying table.
    pub fn table(&self) -> &RankTable {
        &self.table
    }

    /// Tier with the greatest threshold not exceeding `total_points`.
    ///
    /// Totals below zero fall back to the first tier.
    pub fn evaluate(&self, total_points: i64) -> &RankTier {
        let higher = &self.table.higher;
        let qualified = higher.partition_point(|tier| tier.min_threshold <= total_points);
        qualified
            .checked_sub(1)
            .and_then(|index| higher.get(index))
            .unwrap_or(&self.table.first)
    }

    /// True iff `new_tier` sits strictly later in the table than `old_tier`.
    ///
    /// Unknown ids never count as an advancement.
    pub fn has_advanced(&self, old_tier: &RankTierId, new_tier: &RankTierId) -> bool {
        match (self.table.position(old_tier), self.table.position(new_tier)) {
            (Some(old), Some(new)) => new > old,
            _ => false,
        }
    }
}

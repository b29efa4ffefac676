//! Domain events reported by the forum, validated into a closed variant set.

use crate::domain::{PointReason, ReputationError, UserId};

/// A forum action that may award points and fan out notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForumEvent {
    PostCreated {
        author: UserId,
        content: String,
        link: Option<String>,
    },
    CommentCreated {
        author: UserId,
        content: String,
        replied_to_author: Option<UserId>,
        link: Option<String>,
    },
    LikeReceived {
        author: UserId,
        link: Option<String>,
    },
    DepositConfirmed {
        user: UserId,
        /// Deposited amount in the payment provider's smallest unit.
        amount: i64,
    },
}

impl ForumEvent {
    /// Reason recorded against the actor's ledger.
    pub fn reason(&self) -> PointReason {
        match self {
            Self::PostCreated { .. } => PointReason::PostCreated,
            Self::CommentCreated { .. } => PointReason::CommentCreated,
            Self::LikeReceived { .. } => PointReason::LikeReceived,
            Self::DepositConfirmed { .. } => PointReason::DepositConfirmed,
        }
    }

    /// The user whose score the event feeds.
    pub fn actor(&self) -> &UserId {
        match self {
            Self::PostCreated { author, .. }
            | Self::CommentCreated { author, .. }
            | Self::LikeReceived { author, .. } => author,
            Self::DepositConfirmed { user, .. } => user,
        }
    }

    /// Free text to scan for mentions.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::PostCreated { content, .. } | Self::CommentCreated { content, .. } => {
                Some(content.as_str())
            }
            Self::LikeReceived { .. } | Self::DepositConfirmed { .. } => None,
        }
    }

    /// Author being replied to, if this is a reply.
    pub fn replied_to(&self) -> Option<&UserId> {
        match self {
            Self::CommentCreated {
                replied_to_author, ..
            } => replied_to_author.as_ref(),
            _ => None,
        }
    }

    /// Link attached to notifications produced by the event.
    pub fn link(&self) -> Option<&str> {
        match self {
            Self::PostCreated { link, .. }
            | Self::CommentCreated { link, .. }
            | Self::LikeReceived { link, .. } => link.as_deref(),
            Self::DepositConfirmed { .. } => None,
        }
    }

    /// Check payload invariants that the type alone cannot express.
    ///
    /// # Errors
    /// Returns [`ReputationError::InvalidEvent`] for a non-positive deposit.
    pub fn validate(&self) -> Result<(), ReputationError> {
        match self {
            Self::DepositConfirmed { amount, .. } if *amount <= 0 => Err(
                ReputationError::invalid_event(format!("deposit amount must be positive, found {amount}")),
            ),
            _ => Ok(()),
        }
    }
}

/// Loosely typed event as received from a collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForumEventParts {
    pub kind: String,
    pub actor_id: String,
    pub content: Option<String>,
    pub replied_to_author_id: Option<String>,
    pub amount: Option<i64>,
    pub link: Option<String>,
}

fn parse_user(field: &str, raw: &str) -> Result<UserId, ReputationError> {
    UserId::new(raw).map_err(|err| ReputationError::invalid_event(format!("{field}: {err}")))
}

fn reject_amount(kind: PointReason, amount: Option<i64>) -> Result<(), ReputationError> {
    match amount {
        Some(_) => Err(ReputationError::invalid_event(format!(
            "{kind} events do not carry an amount"
        ))),
        None => Ok(()),
    }
}

impl TryFrom<ForumEventParts> for ForumEvent {
    type Error = ReputationError;

    fn try_from(parts: ForumEventParts) -> Result<Self, Self::Error> {
        let reason: PointReason = parts.kind.parse()?;
        let actor = parse_user("actorId", &parts.actor_id)?;

        let event = match reason {
            PointReason::PostCreated => {
                reject_amount(reason, parts.amount)?;
                Self::PostCreated {
                    author: actor,
                    content: parts.content.unwrap_or_default(),
                    link: parts.link,
                }
            }
            PointReason::CommentCreated => {
                reject_amount(reason, parts.amount)?;
                let replied_to_author = parts
                    .replied_to_author_id
                    .as_deref()
                    .map(|raw| parse_user("repliedToAuthorId", raw))
                    .transpose()?;
                Self::CommentCreated {
                    author: actor,
                    content: parts.content.unwrap_or_default(),
                    replied_to_author,
                    link: parts.link,
                }
            }
            PointReason::LikeReceived => {
                reject_amount(reason, parts.amount)?;
                Self::LikeReceived {
                    author: actor,
                    link: parts.link,
                }
            }
            PointReason::DepositConfirmed => {
                let Some(amount) = parts.amount else {
                    return Err(ReputationError::invalid_event(
                        "deposit_confirmed events require an amount",
                    ));
                };
                Self::DepositConfirmed {
                    user: actor,
                    amount,
                }
            }
        };

        event.validate()?;
        Ok(event)
    }
}

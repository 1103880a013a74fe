//! Subscription workflow error types.
//!
//! Mirrors the failure taxonomy of the bot: authorization, malformed input,
//! external platform failures, and state inconsistencies that need an
//! operator.

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

/// Subscription-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// A non-administrator invoked an administrator-only action.
    Unauthorized(UserId),

    /// Command arguments could not be parsed.
    InvalidInput { usage: String },

    /// Tier identifier is not in the catalogue.
    UnknownTier(String),

    /// No subscription exists for this user.
    NotFound(UserId),

    /// Invite link could not be created; nothing was persisted.
    InviteFailed { user_id: UserId, reason: String },

    /// Invite link exists but the record does not (or the other way round).
    Inconsistent { user_id: UserId, detail: String },

    /// Outbound platform call failed.
    Platform { reason: String },

    /// Store failure.
    Storage(String),
}

impl SubscriptionError {
    pub fn unauthorized(user_id: UserId) -> Self {
        SubscriptionError::Unauthorized(user_id)
    }

    pub fn invalid_input(usage: impl Into<String>) -> Self {
        SubscriptionError::InvalidInput { usage: usage.into() }
    }

    pub fn unknown_tier(tier: impl Into<String>) -> Self {
        SubscriptionError::UnknownTier(tier.into())
    }

    pub fn not_found(user_id: UserId) -> Self {
        SubscriptionError::NotFound(user_id)
    }

    pub fn invite_failed(user_id: UserId, reason: impl Into<String>) -> Self {
        SubscriptionError::InviteFailed {
            user_id,
            reason: reason.into(),
        }
    }

    pub fn inconsistent(user_id: UserId, detail: impl Into<String>) -> Self {
        SubscriptionError::Inconsistent {
            user_id,
            detail: detail.into(),
        }
    }

    pub fn platform(reason: impl Into<String>) -> Self {
        SubscriptionError::Platform { reason: reason.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        SubscriptionError::Storage(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::Unauthorized(_) => ErrorCode::Forbidden,
            SubscriptionError::InvalidInput { .. } => ErrorCode::ValidationFailed,
            SubscriptionError::UnknownTier(_) => ErrorCode::UnknownTier,
            SubscriptionError::NotFound(_) => ErrorCode::SubscriptionNotFound,
            SubscriptionError::InviteFailed { .. } | SubscriptionError::Platform { .. } => {
                ErrorCode::PlatformError
            }
            SubscriptionError::Inconsistent { .. } => ErrorCode::InconsistentState,
            SubscriptionError::Storage(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns the message shown to whoever triggered the action.
    pub fn message(&self) -> String {
        match self {
            SubscriptionError::Unauthorized(_) => {
                "This command is for the administrator only.".to_string()
            }
            SubscriptionError::InvalidInput { usage } => usage.clone(),
            SubscriptionError::UnknownTier(tier) => {
                format!("Unknown tier '{}'. Available: 14days, 1month.", tier)
            }
            SubscriptionError::NotFound(user_id) => {
                format!("No subscription found for user {}.", user_id)
            }
            SubscriptionError::InviteFailed { user_id, reason } => format!(
                "Could not create an invite link for {}: {}\nCheck GROUP_ID and the bot's admin rights. Nothing was saved.",
                user_id, reason
            ),
            SubscriptionError::Inconsistent { user_id, detail } => format!(
                "⚠️ Inconsistent state for user {}: {}\nManual check required.",
                user_id, detail
            ),
            SubscriptionError::Platform { reason } => format!("Platform error: {}", reason),
            SubscriptionError::Storage(msg) => format!("Storage error: {}", msg),
        }
    }

    /// True for errors caused by the caller rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SubscriptionError::Unauthorized(_)
                | SubscriptionError::InvalidInput { .. }
                | SubscriptionError::UnknownTier(_)
                | SubscriptionError::NotFound(_)
        )
    }
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SubscriptionError {}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PlatformError | ErrorCode::RateLimited => {
                SubscriptionError::Platform { reason: err.message }
            }
            ErrorCode::UnknownTier => SubscriptionError::UnknownTier(err.message),
            ErrorCode::ValidationFailed => {
                SubscriptionError::InvalidInput { usage: err.message }
            }
            _ => SubscriptionError::Storage(err.to_string()),
        }
    }
}

impl From<SubscriptionError> for DomainError {
    fn from(err: SubscriptionError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid() -> UserId {
        UserId::new(377139113).unwrap()
    }

    #[test]
    fn codes_follow_taxonomy() {
        assert_eq!(SubscriptionError::unauthorized(uid()).code(), ErrorCode::Forbidden);
        assert_eq!(
            SubscriptionError::invalid_input("usage").code(),
            ErrorCode::ValidationFailed
        );
        assert_eq!(
            SubscriptionError::invite_failed(uid(), "boom").code(),
            ErrorCode::PlatformError
        );
        assert_eq!(
            SubscriptionError::inconsistent(uid(), "saved nothing").code(),
            ErrorCode::InconsistentState
        );
    }

    #[test]
    fn invalid_input_message_is_the_usage() {
        let err = SubscriptionError::invalid_input("Usage: /approve <user_id> <tier>");
        assert_eq!(err.to_string(), "Usage: /approve <user_id> <tier>");
    }

    #[test]
    fn invite_failure_says_nothing_was_saved() {
        let msg = SubscriptionError::invite_failed(uid(), "chat not found").message();
        assert!(msg.contains("377139113"));
        assert!(msg.contains("Nothing was saved"));
    }

    #[test]
    fn database_domain_error_becomes_storage() {
        let err: SubscriptionError = DomainError::database("disk full").into();
        assert!(matches!(err, SubscriptionError::Storage(_)));
    }

    #[test]
    fn user_errors_are_flagged() {
        assert!(SubscriptionError::not_found(uid()).is_user_error());
        assert!(!SubscriptionError::storage("x").is_user_error());
    }
}

//! Strongly-typed identifier value objects.
//!
//! The chat platform identifies users, chats and messages with signed
//! integers. Wrapping them keeps a user id from being passed where a group
//! chat id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Stable external identifier of a user on the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a UserId, rejecting non-positive values.
    pub fn new(id: i64) -> Result<Self, ValidationError> {
        if id <= 0 {
            return Err(ValidationError::out_of_range("user_id", 1, i64::MAX, id));
        }
        Ok(Self(id))
    }

    /// Returns the raw identifier.
    pub fn get(&self) -> i64 {
        self.0
    }

    /// The private chat with a user has the same id as the user.
    pub fn chat(&self) -> ChatId {
        ChatId(self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: i64 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::invalid_format("user_id", format!("'{}' is not a number", s)))?;
        Self::new(id)
    }
}

/// Identifier of a chat (private chat, group, or supergroup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(i64);

impl ChatId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for ChatId {
    fn from(user: UserId) -> Self {
        user.chat()
    }
}

/// Identifier of a message within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_accepts_positive_values() {
        let id = UserId::new(377139113).unwrap();
        assert_eq!(id.get(), 377139113);
        assert_eq!(id.to_string(), "377139113");
    }

    #[test]
    fn user_id_rejects_zero_and_negative() {
        assert!(UserId::new(0).is_err());
        assert!(UserId::new(-100).is_err());
    }

    #[test]
    fn user_id_parses_from_string() {
        let id: UserId = " 555 ".parse().unwrap();
        assert_eq!(id.get(), 555);
    }

    #[test]
    fn user_id_parse_rejects_garbage() {
        let err = "abc".parse::<UserId>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn private_chat_shares_user_id() {
        let id = UserId::new(42).unwrap();
        assert_eq!(id.chat(), ChatId::new(42));
    }

    #[test]
    fn user_id_serializes_transparently() {
        let id = UserId::new(7).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }
}

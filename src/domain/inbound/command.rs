//! Text commands.
//!
//! Commands are whitespace-separated tokens with a leading `/`. The verb may
//! carry a `@botname` suffix, as platforms append it in group chats.

use crate::domain::foundation::UserId;
use crate::domain::subscription::{SubscriptionError, Tier};

pub const APPROVE_USAGE: &str =
    "Usage: /approve <user_id> <tier>\nExample: /approve 377139113 1month\nTiers: 14days, 1month";
pub const ADDSUB_USAGE: &str =
    "Usage: /addsub <user_id> <tier> <days>\nExample: /addsub 555 1month 30";
pub const REMOVESUB_USAGE: &str = "Usage: /removesub <user_id>\nExample: /removesub 555";

/// Upper bound for a direct grant.
pub const MAX_GRANT_DAYS: i64 = 3650;

/// Recognized text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` - show the welcome menu.
    Start,

    /// `/approve <user_id> <tier>`.
    Approve { user_id: UserId, tier: Tier },

    /// `/addsub <user_id> <tier> <days>`.
    AddSub { user_id: UserId, tier: Tier, days: i64 },

    /// `/removesub <user_id>`.
    RemoveSub { user_id: UserId },

    /// `/checksubs` - run a sweep now.
    CheckSubs,

    /// `/backupdb` - send the backup document now.
    BackupDb,

    /// `/admin` - open the administrator panel.
    Admin,
}

impl Command {
    /// Everything except `/start` is administrator-only.
    pub fn requires_admin(&self) -> bool {
        !matches!(self, Command::Start)
    }

    /// Parse a message text.
    ///
    /// Returns `None` when the text is not a recognized command, and
    /// `Some(Err(..))` when the verb is known but the arguments are not.
    pub fn parse(text: &str) -> Option<Result<Command, SubscriptionError>> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?.strip_prefix('/')?;
        let verb = head.split('@').next().unwrap_or(head).to_lowercase();
        let args: Vec<&str> = tokens.collect();

        let command = match verb.as_str() {
            "start" => Ok(Command::Start),
            "approve" => parse_approve(&args),
            "addsub" => parse_addsub(&args),
            "removesub" => parse_removesub(&args),
            "checksubs" => Ok(Command::CheckSubs),
            "backupdb" => Ok(Command::BackupDb),
            "admin" => Ok(Command::Admin),
            _ => return None,
        };
        Some(command)
    }
}

fn parse_user(arg: Option<&&str>, usage: &str) -> Result<UserId, SubscriptionError> {
    let raw = arg.ok_or_else(|| SubscriptionError::invalid_input(usage))?;
    raw.parse().map_err(|_| {
        SubscriptionError::invalid_input(format!("'{}' is not a valid user_id.\n{}", raw, usage))
    })
}

fn parse_approve(args: &[&str]) -> Result<Command, SubscriptionError> {
    if args.len() < 2 {
        return Err(SubscriptionError::invalid_input(APPROVE_USAGE));
    }
    let user_id = parse_user(args.first(), APPROVE_USAGE)?;
    let tier = args[1].parse()?;
    Ok(Command::Approve { user_id, tier })
}

fn parse_addsub(args: &[&str]) -> Result<Command, SubscriptionError> {
    if args.len() < 3 {
        return Err(SubscriptionError::invalid_input(ADDSUB_USAGE));
    }
    let user_id = parse_user(args.first(), ADDSUB_USAGE)?;
    let tier = args[1].parse()?;
    let days: i64 = args[2].parse().map_err(|_| {
        SubscriptionError::invalid_input(format!("'{}' is not a number of days.\n{}", args[2], ADDSUB_USAGE))
    })?;
    if !(1..=MAX_GRANT_DAYS).contains(&days) {
        return Err(SubscriptionError::invalid_input(format!(
            "Days must be between 1 and {}.\n{}",
            MAX_GRANT_DAYS, ADDSUB_USAGE
        )));
    }
    Ok(Command::AddSub { user_id, tier, days })
}

fn parse_removesub(args: &[&str]) -> Result<Command, SubscriptionError> {
    let user_id = parse_user(args.first(), REMOVESUB_USAGE)?;
    Ok(Command::RemoveSub { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Command::parse("hello there"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("approve 5 1month"), None);
    }

    #[test]
    fn unknown_verb_is_not_a_command() {
        assert_eq!(Command::parse("/weather"), None);
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(Command::parse("/start"), Some(Ok(Command::Start)));
        assert_eq!(Command::parse("/checksubs"), Some(Ok(Command::CheckSubs)));
        assert_eq!(Command::parse("/backupdb"), Some(Ok(Command::BackupDb)));
        assert_eq!(Command::parse("/admin"), Some(Ok(Command::Admin)));
    }

    #[test]
    fn strips_bot_mention() {
        assert_eq!(Command::parse("/checksubs@club_gate_bot"), Some(Ok(Command::CheckSubs)));
    }

    #[test]
    fn parses_approve_with_explicit_tier() {
        assert_eq!(
            Command::parse("/approve 377139113 1month"),
            Some(Ok(Command::Approve { user_id: uid(377139113), tier: Tier::OneMonth }))
        );
    }

    #[test]
    fn approve_without_tier_shows_usage() {
        let err = Command::parse("/approve 377139113").unwrap().unwrap_err();
        assert_eq!(err, SubscriptionError::invalid_input(APPROVE_USAGE));
    }

    #[test]
    fn approve_with_bad_user_id_is_rejected() {
        let err = Command::parse("/approve abc 1month").unwrap().unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidInput { .. }));
    }

    #[test]
    fn approve_with_unknown_tier_is_rejected() {
        let err = Command::parse("/approve 5 1year").unwrap().unwrap_err();
        assert_eq!(err, SubscriptionError::unknown_tier("1year"));
    }

    #[test]
    fn parses_addsub() {
        assert_eq!(
            Command::parse("/addsub 555 1month 30"),
            Some(Ok(Command::AddSub { user_id: uid(555), tier: Tier::OneMonth, days: 30 }))
        );
    }

    #[test]
    fn addsub_rejects_bad_days() {
        for text in ["/addsub 555 1month x", "/addsub 555 1month 0", "/addsub 555 1month 5000"] {
            let err = Command::parse(text).unwrap().unwrap_err();
            assert!(matches!(err, SubscriptionError::InvalidInput { .. }), "{}", text);
        }
    }

    #[test]
    fn removesub_requires_user() {
        assert!(Command::parse("/removesub").unwrap().is_err());
        assert_eq!(
            Command::parse("/removesub 555"),
            Some(Ok(Command::RemoveSub { user_id: uid(555) }))
        );
    }

    #[test]
    fn only_start_is_public() {
        assert!(!Command::Start.requires_admin());
        assert!(Command::CheckSubs.requires_admin());
    }
}

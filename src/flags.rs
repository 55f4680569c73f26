//! Operator-flag parsing for queue create/update commands
//!
//! A flags string like `-coop -host ra3.se -port 27960 -game baseq3` is
//! parsed into a typed [`FlagSet`]. Every field is optional so that an
//! update only overwrites what the flag string actually mentions.
//! Unknown flags and non-numeric values are parse errors rather than
//! silent ignores.

use crate::error::{PickupError, Result};

/// Typed view of the operator flags recognized on a queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    /// `-coop` / `-nocoop`
    pub coop: Option<bool>,
    /// `-rcon` / `-norcon`
    pub rcon: Option<bool>,
    /// `-teamsize <n>`
    pub team_size: Option<u32>,
    /// `-host <addr>`
    pub host: Option<String>,
    /// `-port <n>`
    pub port: Option<u16>,
    /// `-game <name>`, repeatable
    pub games: Option<Vec<String>>,
}

impl FlagSet {
    /// Parse a free-text flags string. An empty or whitespace-only string
    /// yields an empty set.
    pub fn parse(input: &str) -> Result<Self> {
        let mut flags = FlagSet::default();
        let mut tokens = input.split_whitespace().peekable();

        while let Some(token) = tokens.next() {
            match token {
                "-coop" => flags.coop = Some(true),
                "-nocoop" => flags.coop = Some(false),
                "-rcon" => flags.rcon = Some(true),
                "-norcon" => flags.rcon = Some(false),
                "-teamsize" => {
                    let value = Self::take_value(&mut tokens, token)?;
                    flags.team_size = Some(value.parse().map_err(|_| {
                        PickupError::InvalidFlags {
                            reason: format!("'{}' is not a valid team size", value),
                        }
                    })?);
                }
                "-host" => {
                    flags.host = Some(Self::take_value(&mut tokens, token)?.to_string());
                }
                "-port" => {
                    let value = Self::take_value(&mut tokens, token)?;
                    flags.port =
                        Some(value.parse().map_err(|_| PickupError::InvalidFlags {
                            reason: format!("'{}' is not a valid port", value),
                        })?);
                }
                "-game" => {
                    let value = Self::take_value(&mut tokens, token)?.to_string();
                    flags.games.get_or_insert_with(Vec::new).push(value);
                }
                unknown if unknown.starts_with('-') => {
                    return Err(PickupError::InvalidFlags {
                        reason: format!("unknown flag '{}'", unknown),
                    }
                    .into());
                }
                stray => {
                    return Err(PickupError::InvalidFlags {
                        reason: format!("unexpected value '{}' without a flag", stray),
                    }
                    .into());
                }
            }
        }

        Ok(flags)
    }

    /// True when no flag was present at all
    pub fn is_empty(&self) -> bool {
        *self == FlagSet::default()
    }

    fn take_value<'a>(
        tokens: &mut std::iter::Peekable<impl Iterator<Item = &'a str>>,
        flag: &str,
    ) -> Result<&'a str> {
        match tokens.peek() {
            Some(value) if !value.starts_with('-') => Ok(tokens.next().unwrap()),
            _ => Err(PickupError::InvalidFlags {
                reason: format!("flag '{}' requires a value", flag),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_string() {
        let flags = FlagSet::parse("").unwrap();
        assert!(flags.is_empty());

        let flags = FlagSet::parse("   ").unwrap();
        assert!(flags.is_empty());
    }

    #[test]
    fn test_parse_full_flag_string() {
        let flags = FlagSet::parse("-coop -rcon -teamsize 6 -host ra3.se -port 27960").unwrap();

        assert_eq!(flags.coop, Some(true));
        assert_eq!(flags.rcon, Some(true));
        assert_eq!(flags.team_size, Some(6));
        assert_eq!(flags.host.as_deref(), Some("ra3.se"));
        assert_eq!(flags.port, Some(27960));
        assert_eq!(flags.games, None);
    }

    #[test]
    fn test_negated_toggles_win_by_position() {
        let flags = FlagSet::parse("-rcon -norcon").unwrap();
        assert_eq!(flags.rcon, Some(false));

        let flags = FlagSet::parse("-nocoop -coop").unwrap();
        assert_eq!(flags.coop, Some(true));
    }

    #[test]
    fn test_game_flag_is_repeatable_in_order() {
        let flags = FlagSet::parse("-game baseq3 -game cpma").unwrap();
        assert_eq!(
            flags.games,
            Some(vec!["baseq3".to_string(), "cpma".to_string()])
        );
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        assert!(FlagSet::parse("-frobnicate").is_err());
    }

    #[test]
    fn test_missing_value_is_an_error() {
        assert!(FlagSet::parse("-teamsize").is_err());
        assert!(FlagSet::parse("-host -coop").is_err());
    }

    #[test]
    fn test_non_numeric_values_are_errors() {
        assert!(FlagSet::parse("-teamsize four").is_err());
        assert!(FlagSet::parse("-port game").is_err());
        assert!(FlagSet::parse("-port 123456789").is_err());
    }

    #[test]
    fn test_stray_value_is_an_error() {
        assert!(FlagSet::parse("coop").is_err());
    }
}

//! Text command parsing
//!
//! Commands arrive as chat lines with a prefix, e.g.
//! `!create "CTF Friday" 4 -coop -game ctf`. Queue names may be quoted
//! to contain spaces; whatever follows the fixed arguments is passed on
//! verbatim as the operator-flags string.

use crate::error::Result;
use anyhow::anyhow;

/// One validated operation requested through either entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueCommand {
    Create {
        name: String,
        team_size: Option<u32>,
        flags: String,
    },
    Join { name: String },
    Leave { name: String },
    Rename { name: String, new_name: String },
    Delete { name: String },
    List,
    WaitList { name: String },
    Promote { name: Option<String> },
    Start { name: String },
    Teams { name: String },
    Stop { name: String },
    UpdateOperators { name: String, flags: String },
}

/// Split a command line into tokens, honoring double quotes
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse a chat line into a command.
///
/// Returns `None` for lines without the prefix and for unknown command
/// words (both are somebody else's traffic); returns an error only for a
/// recognized command with unusable arguments.
pub fn parse_command(input: &str, prefix: &str) -> Option<Result<QueueCommand>> {
    let line = input.trim().strip_prefix(prefix)?;
    let tokens = tokenize(line);
    let (word, args) = tokens.split_first()?;

    let command = match word.to_lowercase().as_str() {
        "create" => {
            let name = match args.first() {
                Some(name) => name.clone(),
                None => return Some(Err(anyhow!("usage: {}create <name> [teamSize] [flags]", prefix))),
            };
            // the optional team size is just a leading numeric argument
            let (team_size, flag_start) = match args.get(1).and_then(|t| t.parse().ok()) {
                Some(n) => (Some(n), 2),
                None => (None, 1),
            };
            QueueCommand::Create {
                name,
                team_size,
                flags: args[flag_start.min(args.len())..].join(" "),
            }
        }
        "add" | "join" => match args.first() {
            Some(name) => QueueCommand::Join { name: name.clone() },
            None => return Some(Err(anyhow!("usage: {}add <name>", prefix))),
        },
        "remove" | "leave" => match args.first() {
            Some(name) => QueueCommand::Leave { name: name.clone() },
            None => return Some(Err(anyhow!("usage: {}leave <name>", prefix))),
        },
        "rename" => match (args.first(), args.get(1)) {
            (Some(name), Some(new_name)) => QueueCommand::Rename {
                name: name.clone(),
                new_name: new_name.clone(),
            },
            _ => return Some(Err(anyhow!("usage: {}rename <name> <newName>", prefix))),
        },
        "delete" | "del" | "cancel" => match args.first() {
            Some(name) => QueueCommand::Delete { name: name.clone() },
            None => return Some(Err(anyhow!("usage: {}delete <name>", prefix))),
        },
        "list" => QueueCommand::List,
        "waitlist" => match args.first() {
            Some(name) => QueueCommand::WaitList { name: name.clone() },
            None => return Some(Err(anyhow!("usage: {}waitlist <name>", prefix))),
        },
        "promote" => QueueCommand::Promote {
            name: args.first().cloned(),
        },
        "start" => match args.first() {
            Some(name) => QueueCommand::Start { name: name.clone() },
            None => return Some(Err(anyhow!("usage: {}start <name>", prefix))),
        },
        "teams" | "team" => match args.first() {
            Some(name) => QueueCommand::Teams { name: name.clone() },
            None => return Some(Err(anyhow!("usage: {}teams <name>", prefix))),
        },
        "stop" => match args.first() {
            Some(name) => QueueCommand::Stop { name: name.clone() },
            None => return Some(Err(anyhow!("usage: {}stop <name>", prefix))),
        },
        "set" | "operators" => match args.first() {
            Some(name) => QueueCommand::UpdateOperators {
                name: name.clone(),
                flags: args[1..].join(" "),
            },
            None => return Some(Err(anyhow!("usage: {}set <name> [flags]", prefix))),
        },
        _ => return None,
    };

    Some(Ok(command))
}

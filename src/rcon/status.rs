//! Parsing of the `status` console response
//!
//! The response is a small header block followed by one row per
//! connected player:
//!
//! ```text
//! map: q3dm17
//! num score ping name            lastmsg address               qport rate
//! --- ----- ---- --------------- ------- --------------------- ----- -----
//!   0     5   25 ^1orbb^7             0 203.0.113.9:27961     38291 25000
//! ```
//!
//! Only the player rows matter; column layout varies between server
//! versions, so rows are parsed positionally with slack for missing or
//! extra columns.

use serde::Serialize;

/// One connected player row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRow {
    pub id: i32,
    pub score: i32,
    pub ping: i32,
    pub name: String,
    pub address: Option<String>,
}

/// Structured view of a `status` response
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerStatus {
    pub players: Vec<PlayerRow>,
}

impl ServerStatus {
    /// Parse a raw (already marker-stripped and assembled) response.
    /// Rows that do not look like player rows are skipped rather than
    /// failing the whole parse.
    pub fn parse(raw: &str) -> Self {
        let mut players = Vec::new();
        let mut in_player_block = false;

        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if !in_player_block {
                if is_separator(trimmed) {
                    in_player_block = true;
                } else if trimmed.starts_with("num ") {
                    // some servers omit the dashes line
                    in_player_block = true;
                }
                continue;
            }

            if let Some(row) = parse_player_row(trimmed) {
                players.push(row);
            }
        }

        Self { players }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player_names(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.name.as_str()).collect()
    }
}

fn is_separator(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c == '-' || c.is_whitespace())
}

/// Remove quake-style `^n` color codes from a player name
fn strip_color_codes(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '^' && chars.peek().is_some_and(|n| n.is_ascii_alphanumeric()) {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_player_row(line: &str) -> Option<PlayerRow> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return None;
    }

    let id = tokens[0].parse().ok()?;
    let score = tokens[1].parse().ok()?;
    let ping = tokens[2].parse().ok()?;

    // the address is the rightmost host:port token; the name is whatever
    // sits between the ping column and it, minus trailing numeric columns
    // such as lastmsg
    let address_idx = tokens
        .iter()
        .rposition(|t| t.contains(':') && t.rsplit(':').next().is_some_and(|p| p.parse::<u16>().is_ok()));

    let mut name_tokens: Vec<&str> = match address_idx {
        Some(idx) if idx > 3 => tokens[3..idx].to_vec(),
        Some(_) => Vec::new(),
        None => tokens[3..].to_vec(),
    };
    while name_tokens
        .last()
        .is_some_and(|t| t.parse::<i64>().is_ok())
    {
        name_tokens.pop();
    }
    if name_tokens.is_empty() {
        return None;
    }

    Some(PlayerRow {
        id,
        score,
        ping,
        name: strip_color_codes(&name_tokens.join(" ")),
        address: address_idx.map(|idx| tokens[idx].to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_RESPONSE: &str = "\
map: q3dm17
num score ping name            lastmsg address               qport rate
--- ----- ---- --------------- ------- --------------------- ----- -----
  0     5   25 ^1orbb^7             0 203.0.113.9:27961     38291 25000
  1    12   48 keel                33 198.51.100.4:27960     2901 16000
";

    #[test]
    fn test_parse_player_rows() {
        let status = ServerStatus::parse(STATUS_RESPONSE);

        assert_eq!(status.player_count(), 2);
        assert_eq!(status.player_names(), vec!["orbb", "keel"]);

        assert_eq!(status.players[0].id, 0);
        assert_eq!(status.players[0].score, 5);
        assert_eq!(status.players[0].ping, 25);
        assert_eq!(
            status.players[0].address.as_deref(),
            Some("203.0.113.9:27961")
        );
    }

    #[test]
    fn test_parse_empty_server() {
        let raw = "\
map: q3dm17
num score ping name lastmsg address qport rate
--- ----- ---- ---- ------- ------- ----- ----
";
        let status = ServerStatus::parse(raw);
        assert_eq!(status.player_count(), 0);
    }

    #[test]
    fn test_parse_tolerates_fewer_columns() {
        // older servers print no lastmsg/qport/rate columns
        let raw = "\
--- ----- ---- ---------------
  2     0  110 sarge 192.0.2.17:27960
";
        let status = ServerStatus::parse(raw);
        assert_eq!(status.player_count(), 1);
        assert_eq!(status.players[0].name, "sarge");
        assert_eq!(status.players[0].ping, 110);
    }

    #[test]
    fn test_parse_name_with_spaces() {
        let raw = "\
--- ----- ---- ---------------
  3     7   60 major tom            12 192.0.2.2:27960   100 25000
";
        let status = ServerStatus::parse(raw);
        assert_eq!(status.players[0].name, "major tom");
    }

    #[test]
    fn test_parse_row_without_address() {
        let raw = "\
--- ----- ---- ----------
  4     1   30 bot_sarge 0
";
        let status = ServerStatus::parse(raw);
        assert_eq!(status.player_count(), 1);
        assert_eq!(status.players[0].name, "bot_sarge");
        assert_eq!(status.players[0].address, None);
    }

    #[test]
    fn test_garbage_rows_are_skipped() {
        let raw = "\
--- ----- ---- ----------
not a player row
  5     2   40 xaero      0 192.0.2.3:27960
";
        let status = ServerStatus::parse(raw);
        assert_eq!(status.player_count(), 1);
        assert_eq!(status.players[0].name, "xaero");
    }

    #[test]
    fn test_strip_color_codes() {
        assert_eq!(strip_color_codes("^1or^2bb^7"), "orbb");
        assert_eq!(strip_color_codes("plain"), "plain");
        assert_eq!(strip_color_codes("dangling^"), "dangling^");
    }

    #[test]
    fn test_header_without_separator_line() {
        let raw = "\
map: q3dm17
num score ping name lastmsg address qport rate
  6     3   20 grunt 0 192.0.2.8:27960 100 25000
";
        let status = ServerStatus::parse(raw);
        assert_eq!(status.player_count(), 1);
        assert_eq!(status.players[0].name, "grunt");
    }
}

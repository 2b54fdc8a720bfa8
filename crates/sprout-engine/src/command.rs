//! Parsing of operator commands typed on stdin.
//!
//! One command per line, words separated by whitespace:
//!
//! ```text
//! plant <tile> <crop>
//! harvest <tile>
//! remove <tile>
//! sell <crop> <quantity>
//! save | status | logout | quit
//! login <user>
//! ```

use std::str::FromStr;

use sprout_core::runner::FarmCommand;
use sprout_types::{TileId, UserId};

/// Why a line could not be turned into a [`FarmCommand`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line held nothing but whitespace.
    #[error("empty command")]
    Empty,

    /// The first word is not a known command.
    #[error("unknown command: {verb}")]
    UnknownVerb {
        /// The unrecognised word.
        verb: String,
    },

    /// The command has the wrong number of arguments.
    #[error("usage: {usage}")]
    Usage {
        /// The expected form.
        usage: &'static str,
    },

    /// A numeric argument did not parse.
    #[error("invalid number for {field}: {value} ({reason})")]
    InvalidNumber {
        /// Which argument was bad.
        field: &'static str,
        /// What was typed.
        value: String,
        /// The parser's complaint.
        reason: String,
    },
}

/// A parsed stdin line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine(pub FarmCommand);

impl FromStr for CommandLine {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            [] => return Err(ParseError::Empty),
            ["plant", tile, crop] => FarmCommand::Plant {
                tile: parse_tile(tile)?,
                crop: crop.to_lowercase(),
            },
            ["plant", ..] => return Err(usage("plant <tile> <crop>")),
            ["harvest", tile] => FarmCommand::Harvest {
                tile: parse_tile(tile)?,
            },
            ["harvest", ..] => return Err(usage("harvest <tile>")),
            ["remove", tile] => FarmCommand::Remove {
                tile: parse_tile(tile)?,
            },
            ["remove", ..] => return Err(usage("remove <tile>")),
            ["sell", crop, quantity] => FarmCommand::Sell {
                crop: crop.to_lowercase(),
                quantity: parse_number("quantity", quantity)?,
            },
            ["sell", ..] => return Err(usage("sell <crop> <quantity>")),
            ["login", user] => FarmCommand::Login(UserId::new(*user)),
            ["login", ..] => return Err(usage("login <user>")),
            ["save"] => FarmCommand::Save,
            ["status"] => FarmCommand::Status,
            ["logout"] => FarmCommand::Logout,
            ["quit" | "exit"] => FarmCommand::Quit,
            ["save" | "status" | "logout" | "quit" | "exit", ..] => {
                return Err(usage("save | status | logout | quit"));
            }
            [verb, ..] => {
                return Err(ParseError::UnknownVerb {
                    verb: (*verb).to_owned(),
                });
            }
        };
        Ok(Self(command))
    }
}

const fn usage(usage: &'static str) -> ParseError {
    ParseError::Usage { usage }
}

fn parse_tile(value: &str) -> Result<TileId, ParseError> {
    parse_number("tile", value).map(TileId)
}

fn parse_number<T>(field: &'static str, value: &str) -> Result<T, ParseError>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    value.parse().map_err(|e: std::num::ParseIntError| ParseError::InvalidNumber {
        field,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

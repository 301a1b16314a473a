//! Positional parameter syntax.

use serde::{Deserialize, Deserializer};
use std::fmt::{self, Write};
use std::str::FromStr;

/// How positional parameters are written into statement text.
///
/// Pick the variant your database engine understands:
///
/// | Variant    | Rendering         | Engines                  |
/// |------------|-------------------|--------------------------|
/// | `Question` | `?`, `?`, `?`     | SQLite, MySQL            |
/// | `Dollar`   | `$1`, `$2`, `$3`  | PostgreSQL               |
/// | `Colon`    | `:1`, `:2`, `:3`  | Oracle, SQLite           |
/// | `AtP`      | `@p1`, `@p2`      | SQL Server               |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Placeholder {
    #[default]
    Question,
    Dollar,
    Colon,
    AtP,
}

impl Placeholder {
    pub const ALL: [Placeholder; 4] = [
        Placeholder::Question,
        Placeholder::Dollar,
        Placeholder::Colon,
        Placeholder::AtP,
    ];

    /// Append the marker for the 1-based parameter `index` to `out`.
    pub fn write(self, out: &mut String, index: usize) {
        // Writing into a String cannot fail.
        let _ = match self {
            Placeholder::Question => {
                out.push('?');
                Ok(())
            }
            Placeholder::Dollar => write!(out, "${index}"),
            Placeholder::Colon => write!(out, ":{index}"),
            Placeholder::AtP => write!(out, "@p{index}"),
        };
    }

    /// The marker for the 1-based parameter `index`.
    pub fn render(self, index: usize) -> String {
        let mut out = String::with_capacity(4);
        self.write(&mut out, index);
        out
    }

    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Question => "question",
            Placeholder::Dollar => "dollar",
            Placeholder::Colon => "colon",
            Placeholder::AtP => "at_p",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown placeholder name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown placeholder style {0:?} (expected question, dollar, colon or at_p)")]
pub struct ParsePlaceholderError(String);

impl FromStr for Placeholder {
    type Err = ParsePlaceholderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "question" | "?" => Ok(Placeholder::Question),
            "dollar" | "$" => Ok(Placeholder::Dollar),
            "colon" | ":" => Ok(Placeholder::Colon),
            "at_p" | "atp" | "@p" => Ok(Placeholder::AtP),
            _ => Err(ParsePlaceholderError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Placeholder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

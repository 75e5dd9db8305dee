// Runlevels (0-9, S)

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Console line finit prints on every runlevel transition (followed by the level)
pub const RUNLEVEL_BANNER: &str = "entering runlevel";

/// A finit runlevel: `0`-`9` or `S` (single-user/bootstrap)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Runlevel(char);

impl Runlevel {
    /// Bootstrap runlevel
    pub const S: Runlevel = Runlevel('S');

    pub fn new(level: char) -> Result<Self> {
        match level {
            '0'..='9' => Ok(Self(level)),
            'S' | 's' => Ok(Self::S),
            other => Err(DomainError::InvalidRunlevel(other.to_string())),
        }
    }

    pub fn as_char(&self) -> char {
        self.0
    }

    /// Literal console text announcing a transition into this runlevel
    pub fn console_text(&self) -> String {
        format!("{RUNLEVEL_BANNER} {}", self.0)
    }
}

impl fmt::Display for Runlevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Runlevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c),
            _ => Err(DomainError::InvalidRunlevel(s.to_string())),
        }
    }
}

impl TryFrom<u8> for Runlevel {
    type Error = DomainError;

    fn try_from(level: u8) -> Result<Self> {
        if level <= 9 {
            Ok(Self(char::from(b'0' + level)))
        } else {
            Err(DomainError::InvalidRunlevel(level.to_string()))
        }
    }
}

impl TryFrom<char> for Runlevel {
    type Error = DomainError;

    fn try_from(level: char) -> Result<Self> {
        Self::new(level)
    }
}

impl TryFrom<String> for Runlevel {
    type Error = DomainError;

    fn try_from(level: String) -> Result<Self> {
        level.parse()
    }
}

impl From<Runlevel> for String {
    fn from(level: Runlevel) -> Self {
        level.to_string()
    }
}

// Entity names (services, tasks, interfaces)

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest name accepted for an entity
pub const MAX_NAME_LEN: usize = 255;

/// Name of a service, task or network interface inside the target.
///
/// Names end up verbatim in `initctl` command lines and condition paths, so
/// only `[A-Za-z0-9._@:+-]` is accepted, and a leading `-` is refused so a
/// name is never read as an `initctl` option. `/` would break the condition
/// grammar and anything shell-like would be interpreted by the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(String);

impl EntityName {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate("entity", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Check a single name (or condition segment) against the allowed set.
pub(crate) fn validate(kind: &'static str, value: &str) -> Result<()> {
    let invalid = |reason: &str| DomainError::InvalidName {
        kind,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }

    if value.len() > MAX_NAME_LEN {
        return Err(invalid("too long"));
    }

    if value.starts_with('-') {
        return Err(invalid("must not start with '-'"));
    }

    if let Some(c) = value.chars().find(|c| !is_name_char(*c)) {
        return Err(invalid(&format!(
            "character '{}' not allowed (alphanumeric and ._@:+- only)",
            c.escape_default()
        )));
    }

    Ok(())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | ':' | '+' | '-')
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EntityName {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<EntityName> for String {
    fn from(name: EntityName) -> Self {
        name.0
    }
}

impl std::str::FromStr for EntityName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

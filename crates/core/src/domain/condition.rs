//! Condition identifiers
//!
//! finit exposes runtime facts as conditions addressed by a three-segment
//! path, `<domain>/<name>/<state>`:
//! - `service/nginx/running`
//! - `task/setup/success`
//! - `net/eth0/up`
//!
//! `Condition` is the typed form; `Display` is the only serializer to the
//! wire string and `FromStr` is the only parser.

use super::error::{DomainError, Result};
use super::name::{validate as validate_segment, EntityName};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SERVICE_DOMAIN: &str = "service";
pub const TASK_DOMAIN: &str = "task";
pub const NET_DOMAIN: &str = "net";

pub const SERVICE_RUNNING: &str = "running";
pub const TASK_SUCCESS: &str = "success";
pub const NET_UP: &str = "up";

/// A finit condition identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Condition {
    /// `service/<name>/running`
    Service(EntityName),
    /// `task/<name>/success`
    Task(EntityName),
    /// `net/<name>/up`
    NetInterface(EntityName),
    /// Any other validated triple, e.g. `service/nginx/ready`
    Other(CustomCondition),
}

/// Segments of a condition outside the well-known triples.
///
/// Only `Condition::new` (and the parser built on it) can construct one, so
/// every segment has passed the name check:
///
/// ```compile_fail
/// use finit_harness_core::domain::{Condition, CustomCondition};
/// let _ = Condition::Other(CustomCondition {
///     domain: "a/b".to_string(),
///     name: "x; reboot".to_string(),
///     state: String::new(),
/// });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomCondition {
    domain: String,
    name: String,
    state: String,
}

impl Condition {
    pub fn service(name: EntityName) -> Self {
        Condition::Service(name)
    }

    pub fn task(name: EntityName) -> Self {
        Condition::Task(name)
    }

    pub fn net_interface(name: EntityName) -> Self {
        Condition::NetInterface(name)
    }

    /// Build a condition from raw segments.
    ///
    /// Well-known `(domain, state)` pairs collapse into their typed variant so
    /// that `Condition::new("service", "x", "running")` equals
    /// `Condition::Service(x)`.
    pub fn new(domain: &str, name: &str, state: &str) -> Result<Self> {
        let raw = format!("{domain}/{name}/{state}");
        let to_condition_error = |e: DomainError| DomainError::InvalidCondition {
            value: raw.clone(),
            reason: e.to_string(),
        };
        validate_segment("domain", domain).map_err(to_condition_error)?;
        let entity = EntityName::new(name).map_err(to_condition_error)?;
        validate_segment("state", state).map_err(to_condition_error)?;

        Ok(match (domain, state) {
            (SERVICE_DOMAIN, SERVICE_RUNNING) => Condition::Service(entity),
            (TASK_DOMAIN, TASK_SUCCESS) => Condition::Task(entity),
            (NET_DOMAIN, NET_UP) => Condition::NetInterface(entity),
            _ => Condition::Other(CustomCondition {
                domain: domain.to_string(),
                name: entity.into(),
                state: state.to_string(),
            }),
        })
    }

    pub fn domain(&self) -> &str {
        match self {
            Condition::Service(_) => SERVICE_DOMAIN,
            Condition::Task(_) => TASK_DOMAIN,
            Condition::NetInterface(_) => NET_DOMAIN,
            Condition::Other(custom) => &custom.domain,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Condition::Service(n) | Condition::Task(n) | Condition::NetInterface(n) => n.as_str(),
            Condition::Other(custom) => &custom.name,
        }
    }

    pub fn state(&self) -> &str {
        match self {
            Condition::Service(_) => SERVICE_RUNNING,
            Condition::Task(_) => TASK_SUCCESS,
            Condition::NetInterface(_) => NET_UP,
            Condition::Other(custom) => &custom.state,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.domain(), self.name(), self.state())
    }
}

impl std::str::FromStr for Condition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<&str> = s.split('/').collect();
        match segments.as_slice() {
            [domain, name, state] => Condition::new(domain, name, state),
            _ => Err(DomainError::InvalidCondition {
                value: s.to_string(),
                reason: format!(
                    "expected <domain>/<name>/<state>, got {} segment(s)",
                    segments.len()
                ),
            }),
        }
    }
}

impl TryFrom<String> for Condition {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> EntityName {
        EntityName::new(s).unwrap()
    }

    #[test]
    fn test_well_known_conditions_serialize() {
        assert_eq!(
            Condition::service(name("nginx")).to_string(),
            "service/nginx/running"
        );
        assert_eq!(Condition::task(name("setup")).to_string(), "task/setup/success");
        assert_eq!(Condition::net_interface(name("eth0")).to_string(), "net/eth0/up");
    }

    #[test]
    fn test_always_three_segments() {
        let conditions = [
            Condition::service(name("a")),
            Condition::task(name("getty:1")),
            Condition::net_interface(name("br0")),
            Condition::new("usr", "custom", "ready").unwrap(),
        ];
        for condition in conditions {
            let wire = condition.to_string();
            let segments: Vec<&str> = wire.split('/').collect();
            assert_eq!(segments.len(), 3, "{wire}");
            assert!(segments.iter().all(|s| !s.is_empty()), "{wire}");
        }
    }

    #[test]
    fn test_parse_collapses_to_typed_variant() {
        let parsed: Condition = "service/nginx/running".parse().unwrap();
        assert_eq!(parsed, Condition::Service(name("nginx")));

        let parsed: Condition = "net/eth0/up".parse().unwrap();
        assert_eq!(parsed, Condition::NetInterface(name("eth0")));
    }

    #[test]
    fn test_parse_other_triple() {
        let parsed: Condition = "service/nginx/ready".parse().unwrap();
        assert!(matches!(parsed, Condition::Other(_)));
        assert_eq!(parsed.domain(), "service");
        assert_eq!(parsed.name(), "nginx");
        assert_eq!(parsed.state(), "ready");
        assert_eq!(parsed.to_string(), "service/nginx/ready");
    }

    #[test]
    fn test_parse_rejects_wrong_segment_count() {
        for raw in ["service/nginx", "pid/syslogd", "a/b/c/d", "", "service"] {
            let err = raw.parse::<Condition>().unwrap_err();
            assert!(matches!(err, DomainError::InvalidCondition { .. }), "{raw}");
        }
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        let err = "service//running".parse::<Condition>().unwrap_err();
        assert!(err.to_string().contains("service//running"));
    }

    #[test]
    fn test_parse_rejects_unsafe_segment() {
        assert!("service/ngi nx/running".parse::<Condition>().is_err());
        assert!("service/x;reboot/running".parse::<Condition>().is_err());
    }

    #[test]
    fn test_custom_condition_segments_are_validated() {
        for (domain, name, state) in [
            ("a/b", "x", "ready"),
            ("usr", "x; reboot", "ready"),
            ("usr", "x", ""),
            ("usr", "--all", "ready"),
        ] {
            let err = Condition::new(domain, name, state).unwrap_err();
            assert!(matches!(err, DomainError::InvalidCondition { .. }));
        }

        let err = serde_json::from_str::<Condition>("\"a/b/x; reboot/\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_serde_uses_wire_string() {
        let json = serde_json::to_string(&Condition::task(name("setup"))).unwrap();
        assert_eq!(json, "\"task/setup/success\"");

        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Condition::task(name("setup")));
    }
}

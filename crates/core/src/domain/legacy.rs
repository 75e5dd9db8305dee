// Operations from the systemd-based test driver
//
// FinitMachine deliberately has no methods for these. They only exist here so
// that scenario files written against the old driver fail with a pointer to
// the finit replacement instead of a generic parse error.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyOperation {
    WaitForUnit,
    Systemctl,
    GetUnitInfo,
}

impl LegacyOperation {
    pub fn name(&self) -> &'static str {
        match self {
            LegacyOperation::WaitForUnit => "wait_for_unit",
            LegacyOperation::Systemctl => "systemctl",
            LegacyOperation::GetUnitInfo => "get_unit_info",
        }
    }

    /// The finit operation that covers the same need
    pub fn replacement(&self) -> &'static str {
        match self {
            LegacyOperation::WaitForUnit => "wait_for_service() or wait_for_condition()",
            LegacyOperation::Systemctl => "initctl()",
            LegacyOperation::GetUnitInfo => "get_service_status()",
        }
    }
}

impl fmt::Display for LegacyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

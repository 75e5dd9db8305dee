// Harness constants (no magic values)
use std::time::Duration;

/// Default bound for every wait_for_* operation (15 minutes)
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(900);

/// First delay between two condition queries
pub const DEFAULT_POLL_INITIAL_INTERVAL: Duration = Duration::from_millis(250);

/// Growth factor applied to the delay after every unsatisfied query
pub const DEFAULT_POLL_MULTIPLIER: f64 = 2.0;

/// Upper bound on the delay between two condition queries
pub const DEFAULT_POLL_MAX_INTERVAL: Duration = Duration::from_secs(2);

/// Floor for any configured poll interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Time granted to every condition query, including the last one issued at
/// the deadline
pub const MIN_QUERY_BUDGET: Duration = Duration::from_secs(1);

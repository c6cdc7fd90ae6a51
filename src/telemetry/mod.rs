mod stats;
mod tracing;

pub use self::stats::{SimulatorStats, StatsSnapshot};
pub use self::tracing::{init_tracing, TracingConfig, TracingGuard};

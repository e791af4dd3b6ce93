// Client side of the CO2 statistics service: query composition, typed
// fetch operations and their error type.

pub mod client;
pub mod error;
pub mod query;

pub use client::{HealthStatus, StatsClient, TopEmittersParams};
pub use error::{ApiError, Result};
pub use query::build_query;

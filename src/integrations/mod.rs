//! Platform integrations behind the metrics source.

pub mod diskstats;
pub mod gpu;
pub mod power;
pub mod system;

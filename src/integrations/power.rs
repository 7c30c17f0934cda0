//! Battery status through the `battery` crate.

use crate::monitor::error::{SourceError, SourceResult};
use crate::monitor::sampler::BatteryInfo;

/// First battery's status, `None` on machines without one.
pub fn read() -> SourceResult<Option<BatteryInfo>> {
    let manager = battery::Manager::new().map_err(unavailable)?;
    let mut batteries = manager.batteries().map_err(unavailable)?;

    let battery = match batteries.next() {
        Some(Ok(b)) => b,
        Some(Err(e)) => return Err(unavailable(e)),
        None => return Ok(None),
    };

    let charging = matches!(
        battery.state(),
        battery::State::Charging | battery::State::Full
    );
    let seconds = if charging {
        battery.time_to_full()
    } else {
        battery.time_to_empty()
    };

    Ok(Some(BatteryInfo {
        percent: (battery.state_of_charge().value * 100.0).clamp(0.0, 100.0),
        charging,
        minutes_remaining: seconds.map(|t| (t.value / 60.0).round() as u64),
    }))
}

fn unavailable(e: battery::Error) -> SourceError {
    SourceError::Unavailable(format!("battery: {}", e))
}

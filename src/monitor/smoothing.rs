//! CPU display smoothing.

use super::window::RollingWindow;

/// Readings averaged for the displayed CPU value (about five seconds at 1 Hz).
pub const CPU_SMOOTHING_SAMPLES: usize = 5;

/// Moving average over the last few raw CPU readings.
#[derive(Debug, Clone)]
pub struct CpuSmoother {
    readings: RollingWindow<f32>,
}

impl Default for CpuSmoother {
    fn default() -> Self {
        Self::new(CPU_SMOOTHING_SAMPLES)
    }
}

impl CpuSmoother {
    pub fn new(samples: usize) -> Self {
        Self {
            readings: RollingWindow::new(samples),
        }
    }

    /// Fold a raw reading in and return the smoothed display value.
    ///
    /// Non-finite readings are dropped and the current value is returned.
    pub fn push(&mut self, raw: f32) -> Option<u8> {
        if raw.is_finite() {
            self.readings.push(raw);
        }
        self.current()
    }

    /// Mean of the buffered readings, clamped to 0..=100 and rounded.
    pub fn current(&self) -> Option<u8> {
        if self.readings.is_empty() {
            return None;
        }
        let sum: f32 = self.readings.iter().sum();
        let mean = sum / self.readings.len() as f32;
        Some(mean.clamp(0.0, 100.0).round() as u8)
    }
}

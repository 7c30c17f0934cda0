//! Fixed-capacity FIFO buffers for recent samples.

use std::collections::VecDeque;

/// Number of points kept for sparkline graphs (one minute at 1 Hz).
pub const GRAPH_POINTS: usize = 60;

/// Bounded ordered sequence of the most recent samples.
///
/// Pushing past capacity evicts the oldest entry, so `len()` never exceeds
/// the capacity it was built with.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone> RollingWindow<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// Scale sparkline data into `0.0..=1.0`.
///
/// The ceiling is `max(data, 100)` so a quiet metric never stretches to
/// fill the graph.
pub fn normalize_percentages(data: &[f32]) -> Vec<f32> {
    let ceiling = data
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(100.0_f32, f32::max);

    data.iter()
        .map(|v| if v.is_finite() { (v / ceiling).clamp(0.0, 1.0) } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn never_exceeds_capacity() {
        let mut window = RollingWindow::new(GRAPH_POINTS);
        for i in 0..(GRAPH_POINTS + 25) {
            window.push(i);
            assert!(window.len() <= GRAPH_POINTS);
        }
        assert_eq!(window.len(), GRAPH_POINTS);
    }

    #[test]
    fn keeps_last_values_in_arrival_order() {
        let mut window = RollingWindow::new(3);
        for i in 1..=7 {
            window.push(i);
        }
        assert_eq!(window.to_vec(), vec![5, 6, 7]);
        assert_eq!(window.iter().last(), Some(&7));
    }

    #[test]
    fn partial_window_holds_everything() {
        let mut window = RollingWindow::new(5);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut window = RollingWindow::new(0);
        window.push("a");
        window.push("b");
        assert_eq!(window.len(), 1);
        assert_eq!(window.to_vec(), vec!["b"]);
    }

    #[test]
    fn normalization_never_collapses_below_100() {
        let scaled = normalize_percentages(&[10.0, 50.0]);
        assert_eq!(scaled, vec![0.1, 0.5]);
    }

    #[test]
    fn normalization_uses_larger_maximum() {
        let scaled = normalize_percentages(&[100.0, 200.0]);
        assert_eq!(scaled, vec![0.5, 1.0]);
    }
}

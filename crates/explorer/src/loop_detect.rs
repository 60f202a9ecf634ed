//! Sliding-window repetition detector.
//!
//! Complements the saturation guard: saturation counts coarse-location
//! re-entries across the whole session, while this catches short cycles of
//! the same progress transition (open menu, close menu, open menu ...)
//! the oracle cannot escape on its own.

use std::collections::VecDeque;

/// Watches the most recent progress-transition signatures.
#[derive(Debug)]
pub struct LoopDetector {
    window: VecDeque<String>,
    window_size: usize,
    threshold: usize,
}

impl LoopDetector {
    pub fn new(window_size: usize, threshold: usize) -> Self {
        Self {
            window: VecDeque::new(),
            window_size: window_size.max(1),
            threshold: threshold.max(2),
        }
    }

    /// Record a progress transition's signature.
    pub fn record(&mut self, signature: &str) {
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(signature.to_string());
    }

    /// True when the latest signature repeats at least `threshold` times
    /// within the window.
    pub fn is_looping(&self) -> bool {
        let Some(last) = self.window.back() else {
            return false;
        };
        self.window.iter().filter(|s| *s == last).count() >= self.threshold
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

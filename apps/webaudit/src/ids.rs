//! Sequential issue ids scoped to one audit run.
//!
//! Each run owns an `IdGenerator` and hands a reference to every rule
//! module, so ids stay unique within a report without process-wide state.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<prefix>-<n>`
    pub fn next(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.bump())
    }

    /// `<prefix>-<context>-<n>`
    pub fn contextual(&self, prefix: &str, context: &str) -> String {
        format!("{}-{}-{}", prefix, context, self.bump())
    }

    /// Restart numbering at 1. Intended for test setup.
    pub fn reset(&self) {
        self.counter.store(0, Ordering::Relaxed);
    }

    fn bump(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_and_reset() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next("a11y"), "a11y-1");
        assert_eq!(ids.contextual("perf", "image"), "perf-image-2");
        ids.reset();
        assert_eq!(ids.next("seo"), "seo-1");
    }

    #[test]
    fn test_generators_are_independent() {
        let a = IdGenerator::new();
        let b = IdGenerator::new();
        a.next("x");
        a.next("x");
        assert_eq!(b.next("x"), "x-1");
    }
}

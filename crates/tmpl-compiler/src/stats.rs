//! Build statistics with atomic counters.
//!
//! This module provides [`BuildStats`] for tracking build progress and
//! [`StatsSnapshot`] for point-in-time statistics views.
//!
//! # Thread Safety
//!
//! All counters use [`AtomicU64`] with [`Relaxed`](std::sync::atomic::Ordering::Relaxed)
//! ordering. Statistics are informational and don't require strict ordering
//! guarantees, so parallel workers can bump them without coordination.
//!
//! # Examples
//!
//! ```
//! use tmpl_compiler::BuildStats;
//!
//! let stats = BuildStats::new();
//! stats.increment_discovered();
//! stats.increment_compiled();
//!
//! let snapshot = stats.snapshot();
//! println!("Compiled {} of {} templates", snapshot.compiled, snapshot.discovered);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for build statistics.
#[derive(Debug, Default)]
pub struct BuildStats {
    /// Template files found by the walker.
    discovered: AtomicU64,
    /// Templates that produced a descriptor.
    compiled: AtomicU64,
    /// Templates without a type name.
    excluded: AtomicU64,
    /// Compiled templates carrying a route directive.
    routed: AtomicU64,
    /// Diagnostics reported across all templates.
    diagnostics: AtomicU64,
}

impl BuildStats {
    /// Creates a new [`BuildStats`] with all counters at zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmpl_compiler::BuildStats;
    ///
    /// let stats = BuildStats::new();
    /// assert_eq!(stats.snapshot().discovered, 0);
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` to the discovered templates counter.
    #[inline]
    pub fn add_discovered(&self, count: u64) {
        self.discovered.fetch_add(count, Ordering::Relaxed);
    }

    /// Increments the discovered templates counter.
    #[inline]
    pub fn increment_discovered(&self) {
        self.add_discovered(1);
    }

    /// Increments the compiled templates counter.
    #[inline]
    pub fn increment_compiled(&self) {
        self.compiled.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the excluded templates counter.
    #[inline]
    pub fn increment_excluded(&self) {
        self.excluded.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the routed templates counter.
    #[inline]
    pub fn increment_routed(&self) {
        self.routed.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds `count` to the diagnostics counter.
    #[inline]
    pub fn add_diagnostics(&self, count: u64) {
        self.diagnostics.fetch_add(count, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all statistics.
    ///
    /// Values are read one by one with relaxed ordering; while a build is
    /// running they may not reflect a perfectly consistent state.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            discovered: self.discovered.load(Ordering::Relaxed),
            compiled: self.compiled.load(Ordering::Relaxed),
            excluded: self.excluded.load(Ordering::Relaxed),
            routed: self.routed.load(Ordering::Relaxed),
            diagnostics: self.diagnostics.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.discovered.store(0, Ordering::Relaxed);
        self.compiled.store(0, Ordering::Relaxed);
        self.excluded.store(0, Ordering::Relaxed);
        self.routed.store(0, Ordering::Relaxed);
        self.diagnostics.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of build statistics.
///
/// # Examples
///
/// ```
/// use tmpl_compiler::StatsSnapshot;
///
/// let snap = StatsSnapshot {
///     discovered: 10,
///     compiled: 8,
///     excluded: 2,
///     routed: 5,
///     diagnostics: 3,
/// };
///
/// assert!((snap.compiled_percent() - 80.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Template files found by the walker.
    pub discovered: u64,
    /// Templates that produced a descriptor.
    pub compiled: u64,
    /// Templates without a type name.
    pub excluded: u64,
    /// Compiled templates carrying a route directive.
    pub routed: u64,
    /// Diagnostics reported across all templates.
    pub diagnostics: u64,
}

impl StatsSnapshot {
    /// Share of discovered templates that were compiled, as a percentage.
    ///
    /// Returns 100.0 if nothing was discovered.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Acceptable for statistics display
    pub fn compiled_percent(&self) -> f64 {
        if self.discovered == 0 {
            return 100.0;
        }

        (self.compiled as f64 / self.discovered as f64) * 100.0
    }

    /// Returns `true` if any diagnostic was reported.
    #[inline]
    #[must_use]
    pub const fn has_diagnostics(&self) -> bool {
        self.diagnostics > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_stats_new() {
        assert_eq!(BuildStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_build_stats_increment() {
        let stats = BuildStats::new();

        stats.add_discovered(2);
        stats.increment_discovered();
        stats.increment_compiled();
        stats.increment_compiled();
        stats.increment_excluded();
        stats.increment_routed();
        stats.add_diagnostics(4);

        let snap = stats.snapshot();
        assert_eq!(snap.discovered, 3);
        assert_eq!(snap.compiled, 2);
        assert_eq!(snap.excluded, 1);
        assert_eq!(snap.routed, 1);
        assert_eq!(snap.diagnostics, 4);
        assert!(snap.has_diagnostics());
    }

    #[test]
    fn test_build_stats_reset() {
        let stats = BuildStats::new();
        stats.increment_discovered();
        stats.add_diagnostics(1);

        stats.reset();

        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_compiled_percent() {
        let snap = StatsSnapshot::default();
        assert!((snap.compiled_percent() - 100.0).abs() < f64::EPSILON);

        let snap = StatsSnapshot {
            discovered: 4,
            compiled: 1,
            excluded: 3,
            ..Default::default()
        };
        assert!((snap.compiled_percent() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_snapshot_serialization() {
        let snap = StatsSnapshot {
            discovered: 3,
            compiled: 2,
            excluded: 1,
            routed: 1,
            diagnostics: 5,
        };

        let json = serde_json::to_string(&snap).unwrap();
        let parsed: StatsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, parsed);
    }
}

//! Table configuration (C9): a small, embedder-supplied surface, following
//! the plain-struct-with-`Default`-plus-`testing()` pattern used for other
//! configuration values in the reference stack.

/// Configuration accepted by [`crate::table::StateTable::new`].
///
/// The table reads no files, no environment variables, and no external
/// configuration source; everything here is supplied in-process by the
/// embedder at construction time.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// When `true`, [`crate::table::StateTable::prepare`] enforces the
    /// strictly-increasing-seq precondition unconditionally and returns
    /// [`crate::error::TableError::OrderingViolation`] on a detected
    /// violation rather than proceeding. When `false`, the guard still
    /// runs under `debug_assertions` but is compiled out of release
    /// builds — a non-monotonic seq then silently corrupts table state,
    /// matching "implementations may assert or silently corrupt ordering".
    pub assert_prepare_monotonic: bool,
    /// Optional hint for the number of distinct types expected, used to
    /// pre-size the committed index. Purely an allocation optimization.
    pub committed_capacity_hint: Option<usize>,
    /// Optional hint for the number of staging nodes expected in flight
    /// at once. Pre-sizes both the staging list's backing `VecDeque` and
    /// the pending-replication-context map, since the two grow together
    /// (one context per `Prepare` call, one staging node per entry).
    pub staging_capacity_hint: Option<usize>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            assert_prepare_monotonic: true,
            committed_capacity_hint: None,
            staging_capacity_hint: None,
        }
    }
}

impl TableConfig {
    /// A configuration tuned for fast, low-capacity tests: monotonicity
    /// assertion stays on (tests should catch ordering bugs eagerly), but
    /// capacity hints stay at their cheap defaults.
    #[must_use]
    pub fn testing() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_asserts_monotonicity() {
        let cfg = TableConfig::default();
        assert!(cfg.assert_prepare_monotonic);
        assert!(cfg.committed_capacity_hint.is_none());
    }

    #[test]
    fn testing_matches_default() {
        let a = TableConfig::testing();
        let b = TableConfig::default();
        assert_eq!(a.assert_prepare_monotonic, b.assert_prepare_monotonic);
    }
}

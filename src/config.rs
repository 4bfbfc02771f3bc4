//! Filter configuration.

use sieve_predicate::NormalizeOptions;

/// Policy for deciding which partitions are skipped before evaluation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PruningPolicy {
    /// Consult schema metadata and, when any synopsis kind is enabled, synopses.
    #[default]
    Auto,
    /// Consult schema metadata only.
    SchemaOnly,
    /// Never skip a partition.
    Disabled,
}

/// Which column synopses partition builders create.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SynopsisOptions {
    /// Summarize `bool` columns.
    pub bool_synopses: bool,
    /// Summarize `time` columns.
    pub time_synopses: bool,
}

impl Default for SynopsisOptions {
    fn default() -> Self {
        Self {
            bool_synopses: true,
            time_synopses: true,
        }
    }
}

impl SynopsisOptions {
    /// Returns true if at least one synopsis kind is enabled.
    #[must_use]
    pub fn any_enabled(&self) -> bool {
        self.bool_synopses || self.time_synopses
    }
}

/// Configuration of a [`Filter`](crate::filter::Filter).
#[derive(Clone, Debug, Default)]
pub struct FilterConfig {
    /// Partition pruning policy.
    pub pruning: PruningPolicy,
    /// Options passed to the normalizer.
    pub normalize: NormalizeOptions,
    /// Synopsis kinds to build and consult.
    pub synopsis: SynopsisOptions,
}

impl FilterConfig {
    /// Resolves `Auto` and returns the effective config.
    ///
    /// `Auto` without any enabled synopsis kind degrades to `SchemaOnly`.
    #[must_use]
    pub fn effective(&self) -> FilterConfig {
        let mut config = self.clone();
        if config.pruning == PruningPolicy::Auto && !config.synopsis.any_enabled() {
            config.pruning = PruningPolicy::SchemaOnly;
        }
        config
    }
}

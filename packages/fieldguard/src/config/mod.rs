//! Configuration for indexing, propagation, and parallel scheduling

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{FieldguardError, Result};

/// Heuristic thresholds for the pre-analysis indexing passes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Base threshold for hot call/return group suppression
    pub call_base: u64,
    /// Base threshold for hot per-node fan-in/fan-out suppression
    pub hot_base: u64,
    /// Maximum shortcut group size before a group is considered too noisy
    pub shortcut_threshold: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            call_base: 20,
            hot_base: 20,
            shortcut_threshold: 300,
        }
    }
}

impl IndexingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.call_base == 0 || self.hot_base == 0 {
            return Err(FieldguardError::config(
                "hot-node thresholds must be positive",
            ));
        }
        if self.shortcut_threshold == 0 {
            return Err(FieldguardError::config(
                "shortcut_threshold must be positive",
            ));
        }
        Ok(())
    }
}

/// Tuning for one propagation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum traversal-path length before further expansion is cut off
    pub max_path_edges: usize,
    /// Visits between adaptive suppression sweeps; 0 disables the sweeps
    /// entirely, making runs deterministic
    pub stat_window: u64,
    /// Hottest nodes promoted to the shared suppression set per sweep
    pub promote_top_k: usize,
    /// Shortcut group size limit shared with indexing
    pub shortcut_threshold: usize,
    /// Callee-name substrings treated as allocators and not traversed into
    pub alloc_denylist: Vec<String>,
    /// Linker sections whose writers do not disqualify protection
    pub init_sections: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_path_edges: 25,
            stat_window: 500_000,
            promote_top_k: 50,
            shortcut_threshold: 300,
            alloc_denylist: vec![
                "kmalloc".to_string(),
                "kzalloc".to_string(),
                "kcalloc".to_string(),
            ],
            init_sections: vec![".init.text".to_string(), ".exit.text".to_string()],
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_path_edges == 0 {
            return Err(FieldguardError::config("max_path_edges must be positive"));
        }
        if self.stat_window > 0 && self.promote_top_k == 0 {
            return Err(FieldguardError::config(
                "promote_top_k must be positive when stat_window is enabled",
            ));
        }
        Ok(())
    }

    /// True when `callee` matches the allocator denylist.
    pub fn is_alloc_callee(&self, callee: &str) -> bool {
        self.alloc_denylist.iter().any(|pat| callee.contains(pat))
    }

    /// True when `section` counts as initialization-only code.
    pub fn is_init_section(&self, section: &str) -> bool {
        self.init_sections.iter().any(|s| s == section)
    }
}

/// Parallel scheduling options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Worker thread count; defaults to the number of logical CPUs
    pub threads: usize,
    /// Directory for per-worker report files; `None` writes to stdout
    pub output_dir: Option<PathBuf>,
    /// Emit the compact name/ratio/offsets report instead of the detailed one
    pub legacy_report: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            output_dir: None,
            legacy_report: false,
        }
    }
}

impl ParallelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(FieldguardError::config("threads must be positive"));
        }
        Ok(())
    }
}

/// Top-level configuration bundle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldguardConfig {
    pub indexing: IndexingConfig,
    pub analysis: AnalysisConfig,
    pub parallel: ParallelConfig,
}

impl FieldguardConfig {
    pub fn validate(&self) -> Result<()> {
        self.indexing.validate()?;
        self.analysis.validate()?;
        self.parallel.validate()
    }
}

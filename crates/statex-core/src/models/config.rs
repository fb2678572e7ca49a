//! Configuration structures for the extraction pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Main configuration for the statex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatexConfig {
    /// Text source configuration.
    pub source: SourceConfig,

    /// Record extraction configuration.
    pub extraction: ExtractionConfig,

    /// Extra text repairs.
    pub normalization: NormalizationConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,
}

/// How source documents are opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Password for encrypted statements.
    pub password: Option<String>,

    /// Retry encrypted documents with the empty password.
    pub try_empty_password: bool,

    /// Documents with fewer text characters are flagged as needing OCR.
    pub min_text_length: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            password: None,
            try_empty_password: true,
            min_text_length: 40,
        }
    }
}

/// Record extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Force a statement format id instead of detecting it.
    pub format: Option<String>,

    /// Characters searched before an anchor for context fields.
    pub backtrack_window: usize,

    /// Per-format overrides of `backtrack_window`.
    pub backtrack_windows: BTreeMap<String, usize>,

    /// Try table rows before line patterns when a table source is present.
    pub use_tables: bool,

    /// Minimum cells for a line to count as a table row.
    pub min_table_cells: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            format: None,
            backtrack_window: 300,
            backtrack_windows: BTreeMap::new(),
            use_tables: true,
            min_table_cells: 3,
        }
    }
}

impl ExtractionConfig {
    /// Backtrack window for a format, falling back to the global value.
    pub fn backtrack_window_for(&self, format: &str) -> usize {
        self.backtrack_windows
            .get(format)
            .copied()
            .unwrap_or(self.backtrack_window)
    }
}

/// A user supplied text repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    /// Regular expression to find.
    pub pattern: String,
    /// Replacement text; `$1` style group references are allowed.
    pub replacement: String,
}

/// Normalization configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Repairs applied after the built-in table.
    pub replacements: Vec<ReplacementRule>,
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of parallel workers (0 = available cores).
    pub jobs: usize,

    /// Keep going when a document cannot be read.
    pub continue_on_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            continue_on_error: true,
        }
    }
}

impl BatchConfig {
    /// Worker count with 0 resolved to the available parallelism.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs > 0 {
            return self.jobs;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

impl StatexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

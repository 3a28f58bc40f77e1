//! Detector threshold configuration.
//!
//! Every detector starts from a red/yellow threshold pair looked up by its
//! id. The defaults ship inside the library as a TOML resource; callers can
//! load their own table from a string or a file.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DetectionError, Result};

/// Bundled default thresholds.
const BUNDLED_THRESHOLDS: &str = include_str!("../resources/thresholds.toml");

/// Red/yellow threshold pair for one detector.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Thresholds {
    pub red_level: f64,
    pub yellow_level: f64,
}

impl Thresholds {
    pub fn new(red_level: f64, yellow_level: f64) -> Self {
        Self {
            red_level,
            yellow_level,
        }
    }
}

/// Threshold pairs keyed by detector id.
///
/// # Example
/// ```
/// use anofox_surveillance::config::ThresholdTable;
///
/// let table = ThresholdTable::bundled().unwrap();
/// let ewma = table.get("EWMASages").unwrap();
/// assert_eq!(ewma.red_level, 0.01);
/// assert!(table.get("NoSuchDetector").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdTable {
    entries: HashMap<String, Thresholds>,
}

impl ThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The thresholds shipped with the library.
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_THRESHOLDS)
    }

    /// Parse a table of `[DetectorId]` sections.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let entries: HashMap<String, Thresholds> = toml::from_str(source)?;
        for (id, t) in &entries {
            if !t.red_level.is_finite() || !t.yellow_level.is_finite() {
                return Err(DetectionError::Config(format!(
                    "non-finite thresholds for {id}"
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Read a table from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Thresholds for `id`; a missing entry is a configuration error.
    pub fn get(&self, id: &str) -> Result<Thresholds> {
        self.entries
            .get(id)
            .copied()
            .ok_or_else(|| DetectionError::Config(format!("no thresholds for {id}")))
    }

    pub fn insert(&mut self, id: impl Into<String>, thresholds: Thresholds) {
        self.entries.insert(id.into(), thresholds);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

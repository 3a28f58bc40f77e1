//! Detector trait defining the common plug-in contract, and the registry
//! that maps detector ids to factories.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::config::{ThresholdTable, Thresholds};
use crate::core::{DetectionContext, DetectionResult};
use crate::error::{DetectionError, Result};

use super::ears::{EarsDetector, EarsVariant};
use super::ewma::EwmaSagesDetector;
use super::gssages::GsSagesDetector;

/// Common interface for all temporal detectors.
///
/// Detectors are stateless with respect to the data they process: the only
/// state that persists between runs is the red/yellow threshold pair. The
/// thresholds are configuration; changing them while another thread runs
/// the same detector is the caller's problem (use separate instances).
///
/// This trait is object-safe and can be used with `Box<dyn Detector>`.
pub trait Detector: Send + Sync {
    /// Stable identifier used for registry lookup.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    fn red_level(&self) -> f64;

    fn set_red_level(&mut self, level: f64);

    fn yellow_level(&self) -> f64;

    fn set_yellow_level(&mut self, level: f64);

    /// Run detection over the context's counts without modifying it.
    fn detect(&self, context: &DetectionContext) -> Result<DetectionResult>;

    /// Run detection and write every output array back into the context.
    fn run_detector(&self, context: &mut DetectionContext) -> Result<()> {
        debug!(detector = self.id(), points = context.len(), "running detector");
        let result = self.detect(context)?;
        debug!(
            detector = self.id(),
            alerts = result.alert_count(),
            "detector finished"
        );
        context.apply(result)
    }
}

/// Type alias for boxed detector trait objects.
pub type BoxedDetector = Box<dyn Detector>;

type DetectorFactory = Box<dyn Fn() -> BoxedDetector + Send + Sync>;

/// Registry of detector factories keyed by detector id.
///
/// # Example
///
/// ```
/// use anofox_surveillance::detectors::DetectorRegistry;
///
/// let registry = DetectorRegistry::bundled().unwrap();
/// let detector = registry.create("C2").unwrap();
/// assert_eq!(detector.id(), "C2");
/// assert!(registry.create("NoSuchDetector").is_err());
/// ```
#[derive(Default)]
pub struct DetectorRegistry {
    factories: BTreeMap<String, DetectorFactory>,
}

impl DetectorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in detector, configured from `table`.
    ///
    /// Fails when `table` lacks thresholds for any built-in detector.
    pub fn with_defaults(table: &ThresholdTable) -> Result<Self> {
        let mut registry = Self::new();

        let ewma = EwmaSagesDetector::from_thresholds(table)?;
        registry.register(EwmaSagesDetector::ID, move || Box::new(ewma.clone()));

        for variant in [EarsVariant::C1, EarsVariant::C2, EarsVariant::C3] {
            let ears = EarsDetector::from_thresholds(variant, table)?;
            registry.register(variant.id(), move || Box::new(ears.clone()));
        }

        let gssages = GsSagesDetector::from_thresholds(table)?;
        registry.register(GsSagesDetector::ID, move || Box::new(gssages.clone()));

        Ok(registry)
    }

    /// Registry with every built-in detector and the bundled thresholds.
    pub fn bundled() -> Result<Self> {
        Self::with_defaults(&ThresholdTable::bundled()?)
    }

    /// Register (or replace) the factory for `id`.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> BoxedDetector + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
    }

    /// Create a fresh detector instance.
    pub fn create(&self, id: &str) -> Result<BoxedDetector> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| DetectionError::UnknownDetector(id.to_string()))?;
        debug!(detector = id, "creating detector");
        Ok(factory())
    }

    /// Create a detector with explicit thresholds.
    pub fn create_with(&self, id: &str, thresholds: Thresholds) -> Result<BoxedDetector> {
        let mut detector = self.create(id)?;
        detector.set_red_level(thresholds.red_level);
        detector.set_yellow_level(thresholds.yellow_level);
        Ok(detector)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

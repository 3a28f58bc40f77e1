//! Post-detection color coding.
//!
//! Every detector finishes by mapping its levels onto four alert colors
//! with the same rule set, parameterised only by thresholds, the "no
//! signal" level and the direction in which levels get worse.

/// Discrete alert severity of a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum AlertColor {
    /// No signal, or no computation for this point.
    #[default]
    Normal = 0,
    /// A computed level that stays below the warning threshold.
    SubThreshold = 1,
    /// Level crossed the yellow threshold.
    Warning = 2,
    /// Level crossed the red threshold.
    Alert = 3,
}

impl AlertColor {
    /// Ordinal code (0-3).
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AlertColor::Normal),
            1 => Some(AlertColor::SubThreshold),
            2 => Some(AlertColor::Warning),
            3 => Some(AlertColor::Alert),
            _ => None,
        }
    }
}

impl From<AlertColor> for u8 {
    fn from(color: AlertColor) -> Self {
        color.code()
    }
}

/// Which way levels become more anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelDirection {
    /// Raw statistics: larger is worse (`>=` comparisons).
    HigherIsWorse,
    /// P-values: smaller is worse (`<=` comparisons).
    LowerIsWorse,
}

/// Threshold set used to color a level series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCoder {
    pub red: f64,
    pub yellow: f64,
    pub default_level: f64,
    pub direction: LevelDirection,
}

impl ColorCoder {
    pub fn new(red: f64, yellow: f64, default_level: f64, direction: LevelDirection) -> Self {
        Self {
            red,
            yellow,
            default_level,
            direction,
        }
    }

    /// P-value coloring: default level 0.5, lower is worse.
    pub fn p_value(red: f64, yellow: f64) -> Self {
        Self::new(red, yellow, 0.5, LevelDirection::LowerIsWorse)
    }

    /// Raw statistic coloring: default level 0, higher is worse.
    pub fn statistic(red: f64, yellow: f64) -> Self {
        Self::new(red, yellow, 0.0, LevelDirection::HigherIsWorse)
    }

    /// Color of a single level, ignoring the raw data rule.
    pub fn classify(&self, level: f64) -> AlertColor {
        let (hits_red, hits_yellow) = match self.direction {
            LevelDirection::HigherIsWorse => (level >= self.red, level >= self.yellow),
            LevelDirection::LowerIsWorse => (level <= self.red, level <= self.yellow),
        };
        if hits_red {
            AlertColor::Alert
        } else if hits_yellow {
            AlertColor::Warning
        } else if level != 0.0 && level != 0.5 {
            AlertColor::SubThreshold
        } else {
            AlertColor::Normal
        }
    }

    /// Color every point, resetting levels where the raw data cannot
    /// signal.
    ///
    /// Points with `data[i] <= 0` get `default_level` and
    /// [`AlertColor::Normal`] whatever their computed level was.
    pub fn apply(&self, data: &[f64], levels: &mut [f64]) -> Vec<AlertColor> {
        data.iter()
            .zip(levels.iter_mut())
            .map(|(&x, level)| {
                if x <= 0.0 {
                    *level = self.default_level;
                    AlertColor::Normal
                } else {
                    self.classify(*level)
                }
            })
            .collect()
    }
}

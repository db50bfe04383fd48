//! Letter-grade banding for assessment scores

use serde::{Deserialize, Serialize};

/// One band of the grading scale: percentages at or above `min_percentage`
/// earn `letter` unless a higher band matches first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    pub min_percentage: f64,
    pub letter: String,
}

impl GradeBand {
    pub fn new(min_percentage: f64, letter: impl Into<String>) -> Self {
        Self {
            min_percentage,
            letter: letter.into(),
        }
    }
}

/// Ordered set of grade bands plus the letter for anything below the lowest band
///
/// The default scale is A ≥ 80, B ≥ 60, C ≥ 50, D ≥ 40, otherwise F.
///
/// # Examples
///
/// ```
/// use census::core::aggregate::GradingScale;
///
/// let scale = GradingScale::default();
/// assert_eq!(scale.letter_for(80.0), "A");
/// assert_eq!(scale.letter_for(79.99), "B");
/// assert_eq!(scale.letter_for(12.0), "F");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GradingScale {
    bands: Vec<GradeBand>,
    fallback: String,
}

impl GradingScale {
    /// Build a scale from bands listed highest threshold first
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if a threshold is not a finite
    /// value within 0..=100, the thresholds are not strictly descending, or a
    /// letter is blank.
    pub fn new(bands: Vec<GradeBand>, fallback: impl Into<String>) -> Result<Self, String> {
        let fallback = fallback.into();
        if fallback.trim().is_empty() {
            return Err("grading.fallback cannot be empty".to_string());
        }

        for band in &bands {
            if !band.min_percentage.is_finite() || !(0.0..=100.0).contains(&band.min_percentage)
            {
                return Err(format!(
                    "grade band '{}' has min_percentage {} outside 0..=100",
                    band.letter, band.min_percentage
                ));
            }
            if band.letter.trim().is_empty() {
                return Err(format!(
                    "grade band at {} has an empty letter",
                    band.min_percentage
                ));
            }
        }

        if let Some(pair) = bands
            .windows(2)
            .find(|pair| pair[0].min_percentage <= pair[1].min_percentage)
        {
            return Err(format!(
                "grade band '{}' ({}) must have a higher threshold than '{}' ({})",
                pair[0].letter, pair[0].min_percentage, pair[1].letter, pair[1].min_percentage
            ));
        }

        Ok(Self { bands, fallback })
    }

    /// Bands, highest threshold first
    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Letter for a percentage; boundaries are inclusive on the lower edge
    pub fn letter_for(&self, percentage: f64) -> &str {
        self.bands
            .iter()
            .find(|band| percentage >= band.min_percentage)
            .map_or(self.fallback.as_str(), |band| band.letter.as_str())
    }

    /// Letter for a raw score, or `None` when no percentage can be computed
    pub fn letter_for_score(&self, score: f64, max_score: f64) -> Option<&str> {
        percentage(score, max_score).map(|p| self.letter_for(p))
    }
}

impl Default for GradingScale {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            fallback: "F".to_string(),
        }
    }
}

/// The A/B/C/D bands used when no `[grading]` section is configured
pub fn default_bands() -> Vec<GradeBand> {
    vec![
        GradeBand::new(80.0, "A"),
        GradeBand::new(60.0, "B"),
        GradeBand::new(50.0, "C"),
        GradeBand::new(40.0, "D"),
    ]
}

/// `score / max_score * 100`, defined only for finite inputs and a positive maximum
pub fn percentage(score: f64, max_score: f64) -> Option<f64> {
    if !score.is_finite() || !max_score.is_finite() || max_score <= 0.0 {
        return None;
    }
    Some(score / max_score * 100.0)
}

//! Local fallback predictions.
//!
//! Used only when no endpoint can classify. Every result is flagged
//! `isSimulated` and carries no source endpoint.

use rand::distributions::Uniform;
use rand::Rng;

use crate::config::SimulatorConfig;
use crate::prediction::types::{CanonicalSeverity, PredictionResult};

/// Prior weights per severity, in percent.
const DISTRIBUTION: [(CanonicalSeverity, u32); 5] = [
    (CanonicalSeverity::NoDr, 45),
    (CanonicalSeverity::Mild, 20),
    (CanonicalSeverity::Moderate, 20),
    (CanonicalSeverity::Severe, 10),
    (CanonicalSeverity::Proliferative, 5),
];

const TOTAL_WEIGHT: u32 = 100;

#[derive(Debug, Clone)]
pub struct FallbackSimulator {
    confidence: Uniform<f64>,
}

impl FallbackSimulator {
    /// Confidence is drawn from `[min, max)`. An empty range falls back to the defaults.
    pub fn new(config: &SimulatorConfig) -> Self {
        let (min, max) = if config.confidence_min < config.confidence_max {
            (config.confidence_min, config.confidence_max)
        } else {
            let defaults = SimulatorConfig::default();
            tracing::warn!(
                min = config.confidence_min,
                max = config.confidence_max,
                "Empty simulator confidence range, using defaults"
            );
            (defaults.confidence_min, defaults.confidence_max)
        };
        Self {
            confidence: Uniform::new(min, max),
        }
    }

    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R) -> PredictionResult {
        let severity = pick_severity(rng.gen_range(0..TOTAL_WEIGHT));
        let confidence = rng.sample(&self.confidence);
        tracing::debug!(severity = %severity, confidence, "Simulated prediction");
        PredictionResult::simulated(severity, confidence)
    }
}

fn pick_severity(mut roll: u32) -> CanonicalSeverity {
    for (severity, weight) in DISTRIBUTION {
        if roll < weight {
            return severity;
        }
        roll -= weight;
    }
    CanonicalSeverity::Proliferative
}

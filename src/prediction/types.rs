//! Canonical prediction types.

use serde::Serialize;

use crate::endpoints::Endpoint;
use crate::error::{GatewayError, GatewayResult};
use crate::prediction::labels;

/// Five-level diabetic retinopathy severity, ordered from healthy to worst.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CanonicalSeverity {
    #[serde(rename = "No DR")]
    NoDr = 0,
    Mild = 1,
    Moderate = 2,
    Severe = 3,
    #[serde(rename = "Proliferative DR")]
    Proliferative = 4,
}

impl CanonicalSeverity {
    pub const ALL: [CanonicalSeverity; 5] = [
        CanonicalSeverity::NoDr,
        CanonicalSeverity::Mild,
        CanonicalSeverity::Moderate,
        CanonicalSeverity::Severe,
        CanonicalSeverity::Proliferative,
    ];

    /// Ordinal position in the taxonomy.
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(level as usize).copied()
    }

    /// English clinical name.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalSeverity::NoDr => "No DR",
            CanonicalSeverity::Mild => "Mild",
            CanonicalSeverity::Moderate => "Moderate",
            CanonicalSeverity::Severe => "Severe",
            CanonicalSeverity::Proliferative => "Proliferative DR",
        }
    }
}

impl std::fmt::Display for CanonicalSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification returned to the application.
///
/// Fields are private: `severity_level` always follows `severity_label`,
/// confidence is always in `[0, 1]`, and simulated results never carry a
/// source endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    severity_label: CanonicalSeverity,
    severity_level: u8,
    localized_label: &'static str,
    confidence: f64,
    recommendation: String,
    is_simulated: bool,
    source_endpoint: Option<String>,
    upstream_simulated: bool,
}

impl PredictionResult {
    /// Result produced by a real inference endpoint.
    pub fn observed(
        severity: CanonicalSeverity,
        confidence: f64,
        recommendation: Option<&str>,
        source: &Endpoint,
        upstream_simulated: bool,
    ) -> Self {
        let mut result = Self::build(severity, confidence, recommendation);
        result.source_endpoint = Some(source.to_string());
        result.upstream_simulated = upstream_simulated;
        result
    }

    /// Result fabricated locally because no endpoint could answer.
    pub fn simulated(severity: CanonicalSeverity, confidence: f64) -> Self {
        let mut result = Self::build(severity, confidence, None);
        result.is_simulated = true;
        result
    }

    fn build(severity: CanonicalSeverity, confidence: f64, recommendation: Option<&str>) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        let recommendation = recommendation
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| labels::recommendation(severity));

        Self {
            severity_label: severity,
            severity_level: severity.level(),
            localized_label: labels::localized(severity),
            confidence,
            recommendation: recommendation.to_string(),
            is_simulated: false,
            source_endpoint: None,
            upstream_simulated: false,
        }
    }

    pub fn severity_label(&self) -> CanonicalSeverity {
        self.severity_label
    }

    pub fn severity_level(&self) -> u8 {
        self.severity_level
    }

    pub fn localized_label(&self) -> &str {
        self.localized_label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    pub fn is_simulated(&self) -> bool {
        self.is_simulated
    }

    pub fn source_endpoint(&self) -> Option<&str> {
        self.source_endpoint.as_deref()
    }

    /// The endpoint answered, but reported that it fabricated the prediction itself.
    pub fn upstream_simulated(&self) -> bool {
        self.upstream_simulated
    }
}

/// Image submitted for classification.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            file_name: "retina-image".to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Caller-side checks; failures here are the only errors `classify` surfaces.
    pub fn validate(&self, max_bytes: usize) -> GatewayResult<()> {
        if self.bytes.is_empty() {
            return Err(GatewayError::InvalidImage("image is empty".to_string()));
        }
        if self.bytes.len() > max_bytes {
            return Err(GatewayError::InvalidImage(format!(
                "image is {} bytes, limit is {}",
                self.bytes.len(),
                max_bytes
            )));
        }
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.strip_prefix("image/") {
            Some(subtype) if !subtype.is_empty() => Ok(()),
            _ => Err(GatewayError::InvalidImage(format!(
                "unsupported content type '{}'",
                self.content_type
            ))),
        }
    }
}

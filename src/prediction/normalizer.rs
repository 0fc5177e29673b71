//! Upstream response normalization.
//!
//! # Responsibilities
//! - Classify the raw body shape once (`class` or `severity`)
//! - Map the label through the label table, never locally
//! - Attach the fixed recommendation and clamp confidence
//!
//! A `class` key wins when both keys are present. The label is resolved
//! before confidence is checked, so a body with an unknown label and no
//! confidence reports the label.

use serde_json::{Map, Value};

use crate::endpoints::Endpoint;
use crate::error::{GatewayError, GatewayResult};
use crate::prediction::labels;
use crate::prediction::types::{CanonicalSeverity, PredictionResult};

/// Upstream prediction body, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPredictionResponse {
    /// `{"class": "Moderate", "confidence": 0.91, ...}`
    Class(RawFields),
    /// `{"severity": "DR Sedang", "severity_level": 2, "confidence": 0.91, ...}`
    Severity {
        fields: RawFields,
        severity_level: Option<i64>,
    },
}

/// Fields shared by every response shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFields {
    pub label: String,
    pub confidence: Option<f64>,
    pub recommendation: Option<String>,
    /// `raw_prediction.is_simulation` from the upstream body.
    pub upstream_simulated: bool,
}

impl RawPredictionResponse {
    pub fn parse(body: &Value) -> GatewayResult<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| malformed("prediction body is not a JSON object"))?;

        if let Some(class) = object.get("class") {
            let fields = RawFields::extract(object, "class", class)?;
            return Ok(RawPredictionResponse::Class(fields));
        }

        if let Some(severity) = object.get("severity") {
            let fields = RawFields::extract(object, "severity", severity)?;
            return Ok(RawPredictionResponse::Severity {
                fields,
                severity_level: object.get("severity_level").and_then(Value::as_i64),
            });
        }

        Err(malformed("prediction body has neither 'class' nor 'severity'"))
    }

    pub fn fields(&self) -> &RawFields {
        match self {
            RawPredictionResponse::Class(fields) => fields,
            RawPredictionResponse::Severity { fields, .. } => fields,
        }
    }
}

impl RawFields {
    fn extract(object: &Map<String, Value>, key: &str, label: &Value) -> GatewayResult<Self> {
        let label = label
            .as_str()
            .ok_or_else(|| malformed(format!("'{}' is not a string", key)))?
            .to_string();

        let confidence = match object.get("confidence") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_f64()
                    .ok_or_else(|| malformed("'confidence' is not a number"))?,
            ),
        };

        let recommendation = object
            .get("recommendation")
            .and_then(Value::as_str)
            .map(str::to_string);

        let upstream_simulated = object
            .get("raw_prediction")
            .and_then(|raw| raw.get("is_simulation"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(Self {
            label,
            confidence,
            recommendation,
            upstream_simulated,
        })
    }
}

/// Map a classified upstream response into the canonical result.
pub fn normalize(raw: &RawPredictionResponse, source: &Endpoint) -> GatewayResult<PredictionResult> {
    let fields = raw.fields();
    let severity = severity_of(&fields.label)?;

    if let RawPredictionResponse::Severity {
        severity_level: Some(level),
        ..
    } = raw
    {
        if *level != i64::from(severity.level()) {
            tracing::warn!(
                endpoint = %source,
                label = %fields.label,
                upstream_level = *level,
                upstream_severity = ?u8::try_from(*level).ok().and_then(CanonicalSeverity::from_level),
                canonical_level = severity.level(),
                "Upstream severity level disagrees with label, using label"
            );
        }
    }

    let confidence = fields
        .confidence
        .ok_or_else(|| malformed("prediction body has no 'confidence'"))?;

    Ok(PredictionResult::observed(
        severity,
        confidence,
        fields.recommendation.as_deref(),
        source,
        fields.upstream_simulated,
    ))
}

/// Parse and normalize in one step.
pub fn normalize_body(body: &Value, source: &Endpoint) -> GatewayResult<PredictionResult> {
    let raw = RawPredictionResponse::parse(body)?;
    normalize(&raw, source)
}

/// Canonical severity for a label.
pub fn severity_of(label: &str) -> GatewayResult<CanonicalSeverity> {
    labels::lookup(label).ok_or_else(|| GatewayError::UnmappedLabel(label.to_string()))
}

fn malformed(message: impl Into<String>) -> GatewayError {
    GatewayError::MalformedResponse(message.into())
}

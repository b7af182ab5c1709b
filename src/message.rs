// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Result records logged and published for every classified image
//!
//! Wire layout:
//! `{ "results": [{ "label": string, "confidence": number }], "metrics": { "evaltimeinms": number } }`

use serde::{Deserialize, Serialize};

use crate::vision::{ModelError, ScoringOutput};

/// Confidence reported for every label
///
/// The model's scores are not read; every result carries this fixed value.
pub const PLACEHOLDER_CONFIDENCE: f64 = 1.0;

/// One recognised label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelResult {
    pub label: String,
    pub confidence: f64,
}

/// Timing of one evaluation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultMetrics {
    pub evaltimeinms: u64,
}

/// Record produced for one image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageBody {
    pub results: Vec<LabelResult>,
    pub metrics: ResultMetrics,
}

impl MessageBody {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Map a model output to a result record
///
/// Takes the first label of the output vector, which is only the top
/// prediction if the engine returns labels ordered by confidence.
pub fn results_to_message(outcome: &ScoringOutput) -> Result<MessageBody, ModelError> {
    let label = outcome
        .class_label
        .first()
        .ok_or(ModelError::EmptyOutput)?;

    Ok(MessageBody {
        results: vec![LabelResult {
            label: label.clone(),
            confidence: PLACEHOLDER_CONFIDENCE,
        }],
        metrics: ResultMetrics::default(),
    })
}

//! Extraction normalization: turns raw vision-model output into a canonical
//! claim set with a bounded confidence value.
//!
//! The model is asked to return a single JSON object, but real output arrives
//! wrapped in prose and markdown fences. This module locates the first
//! balanced JSON object in the text, maps the recognized keys onto
//! `ExtractionResult`, and substitutes safe defaults for anything malformed.
//!
//! Normalization never fails: unusable output degrades to an all-empty
//! result with a confidence low enough to route the document to a human
//! reviewer instead of crashing the pipeline.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::EngineResult;
use crate::types::ExtractionResult;

/// Confidence assumed when the model returned a parseable object but no
/// confidence value of its own.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Confidence assigned when extraction was attempted but the output was
/// unusable. Low enough to land in the manual-review band under the
/// default threshold.
pub const FAILURE_CONFIDENCE: f64 = 0.80;

/// Keys the model is instructed to return, in contract order.
pub const EXTRACTION_KEYS: [&str; 7] = [
    "title",
    "institution",
    "recipient",
    "date_issued",
    "description",
    "raw_text",
    "confidence",
];

/// Request contract for the external extraction model.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub document: Vec<u8>,
    pub mime_type: String,
    pub instruction: String,
    pub timeout_ms: u64,
}

impl ExtractionRequest {
    pub fn new(document: Vec<u8>, mime_type: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            document,
            mime_type: mime_type.into(),
            instruction: extraction_instruction(),
            timeout_ms,
        }
    }
}

/// The canonical instruction sent with every extraction request.
pub fn extraction_instruction() -> String {
    format!(
        "Extract the document's structured fields and return a single JSON \
         object with exactly these keys: {}. Use empty strings for fields \
         you cannot determine and a number between 0.0 and 1.0 for \
         confidence.",
        EXTRACTION_KEYS.join(", ")
    )
}

/// Interface to the external vision-capable extraction model.
///
/// Implementations own their transport; the engine only supplies the
/// request contract and consumes free text. Errors (including timeouts and
/// cancellation) are recovered by the caller through the failure path of
/// [`normalize_extraction`].
pub trait ExtractionModel: Send + Sync {
    fn extract(&self, request: &ExtractionRequest) -> EngineResult<String>;
}

/// Normalize raw model output into an `ExtractionResult`.
///
/// `ocr_confidence` is the caller-supplied raw OCR confidence, used when the
/// model's JSON carries no confidence of its own. Guaranteed never to fail:
/// the worst case is an all-empty result with confidence
/// [`FAILURE_CONFIDENCE`].
pub fn normalize_extraction(raw: &str, ocr_confidence: Option<f64>) -> ExtractionResult {
    let object = match locate_json_object(raw).and_then(|s| serde_json::from_str::<Value>(s).ok())
    {
        Some(Value::Object(map)) => map,
        _ => {
            tracing::warn!("extraction output contained no parseable JSON object");
            return ExtractionResult::failed();
        }
    };

    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .or(ocr_confidence)
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);

    let mut fields = HashMap::new();
    for (key, value) in &object {
        if !EXTRACTION_KEYS.contains(&key.as_str()) {
            fields.insert(key.clone(), value.clone());
        }
    }

    ExtractionResult {
        title: string_field(&object, "title"),
        institution: string_field(&object, "institution"),
        recipient: string_field(&object, "recipient"),
        date_issued: string_field(&object, "date_issued"),
        description: string_field(&object, "description"),
        raw_text: string_field(&object, "raw_text"),
        confidence,
        fields,
    }
}

fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Locate the first balanced JSON object in free-form text.
///
/// Tracks string literals and escapes so braces inside quoted values do not
/// confuse the depth count. Returns the candidate slice without parsing it.
fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

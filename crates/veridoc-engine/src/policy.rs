//! Confidence/policy engine: combines extraction confidence, trusted-issuer
//! template match, and auxiliary signals into a single deterministic
//! decision.
//!
//! Pure function over its inputs; persistence of the breakdown is the
//! caller's responsibility.

use serde::{Deserialize, Serialize};

use crate::registry::{match_template, TrustedIssuer};
use crate::types::ExtractionResult;

/// Global auto-approval threshold, used when no issuer threshold applies.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Width of the manual-review band below the threshold. Scores inside the
/// band go to a human instead of being auto-rejected.
pub const REVIEW_MARGIN: f64 = 0.15;

/// Weight of the extraction confidence in the issuer blend; the template
/// score carries the remainder.
pub const BASE_WEIGHT: f64 = 0.6;

/// Floor applied when an externally verifiable code checks out.
pub const CODE_VERIFIED_FLOOR: f64 = 0.97;

/// Cap applied when a presented verification code fails to check out.
pub const CODE_FAILED_CAP: f64 = 0.5;

/// Cap applied when a machine-readable zone is present but invalid.
pub const MRZ_INVALID_CAP: f64 = 0.6;

// ---------------------------------------------------------------------------
// Auxiliary signals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeVerification {
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogoMatch {
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MrzCheck {
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AuxiliarySignals {
    pub code_verification: Option<CodeVerification>,
    pub logo_match: Option<LogoMatch>,
    pub mrz: Option<MrzCheck>,
}

impl AuxiliarySignals {
    pub fn none() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Decision and breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    AutoApprove,
    AutoReject,
    ManualReview,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::AutoApprove => write!(f, "auto_approve"),
            Decision::AutoReject => write!(f, "auto_reject"),
            Decision::ManualReview => write!(f, "manual_review"),
        }
    }
}

/// Signal-by-signal account of how a score was reached. Persisted verbatim
/// as `verification_details` so a reviewer sees exactly what the engine saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionBreakdown {
    pub base_confidence: f64,
    /// Present only when a trusted issuer was resolved.
    pub template_score: Option<f64>,
    pub matched_issuer: Option<String>,
    pub auxiliary: AuxiliarySignals,
    pub threshold_used: f64,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyOutcome {
    pub decision: Decision,
    pub combined_score: f64,
    pub breakdown: DecisionBreakdown,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Tunable policy parameters. The defaults are the canonical values; the
/// configuration layer may override them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyParams {
    pub default_threshold: f64,
    pub review_margin: f64,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_THRESHOLD,
            review_margin: REVIEW_MARGIN,
        }
    }
}

/// Evaluate a normalized extraction against policy with default parameters.
///
/// Deterministic and side-effect free. The algorithm, in order:
/// 1. base confidence from the extraction;
/// 2. issuer resolved: blend `0.6 * base + 0.4 * template_score`;
/// 3. code verification: verified raises to at least 0.97, failed caps
///    at 0.5;
/// 4. invalid MRZ caps at 0.6;
/// 5. threshold: issuer's own, else the global default;
/// 6. approve at or above the threshold, reject below `threshold - 0.15`,
///    manual review in between.
pub fn evaluate(
    extraction: &ExtractionResult,
    signals: &AuxiliarySignals,
    issuer: Option<&TrustedIssuer>,
) -> PolicyOutcome {
    evaluate_with(extraction, signals, issuer, PolicyParams::default())
}

/// Evaluate with explicit policy parameters. See [`evaluate`].
pub fn evaluate_with(
    extraction: &ExtractionResult,
    signals: &AuxiliarySignals,
    issuer: Option<&TrustedIssuer>,
    params: PolicyParams,
) -> PolicyOutcome {
    let base_confidence = extraction.confidence.clamp(0.0, 1.0);

    let template_score = issuer.map(|i| match_template(&extraction.raw_text, i));
    let mut combined = match template_score {
        Some(score) => BASE_WEIGHT * base_confidence + (1.0 - BASE_WEIGHT) * score,
        None => base_confidence,
    };

    if let Some(code) = signals.code_verification {
        if code.verified {
            combined = combined.max(CODE_VERIFIED_FLOOR);
        } else {
            combined = combined.min(CODE_FAILED_CAP);
        }
    }

    if let Some(mrz) = signals.mrz {
        if !mrz.valid {
            combined = combined.min(MRZ_INVALID_CAP);
        }
    }

    let threshold = resolve_threshold(issuer, params.default_threshold);

    let decision = if combined >= threshold {
        Decision::AutoApprove
    } else if combined < threshold - params.review_margin {
        Decision::AutoReject
    } else {
        Decision::ManualReview
    };

    PolicyOutcome {
        decision,
        combined_score: combined,
        breakdown: DecisionBreakdown {
            base_confidence,
            template_score,
            matched_issuer: issuer.map(|i| i.name.clone()),
            auxiliary: *signals,
            threshold_used: threshold,
            decision,
        },
    }
}

/// The matched issuer's threshold when it is sane, else the default.
/// An out-of-range threshold is treated as misconfiguration, not a hard
/// failure.
fn resolve_threshold(issuer: Option<&TrustedIssuer>, default_threshold: f64) -> f64 {
    match issuer {
        Some(i) if i.confidence_threshold > 0.0 && i.confidence_threshold <= 1.0 => {
            i.confidence_threshold
        }
        Some(i) => {
            tracing::warn!(
                issuer = %i.name,
                threshold = i.confidence_threshold,
                "issuer threshold out of range, using global default"
            );
            default_threshold
        }
        None => default_threshold,
    }
}

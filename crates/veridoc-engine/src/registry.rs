//! Trusted issuer registry: the catalog of known issuing organizations,
//! their domains, expected template phrases, and per-issuer confidence
//! thresholds. Read-only from the engine's perspective at decision time.

use serde::{Deserialize, Serialize};
use veridoc_core::IssuerId;

// ---------------------------------------------------------------------------
// TrustedIssuer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedIssuer {
    pub id: IssuerId,
    pub name: String,
    pub domain: String,
    /// Phrases expected verbatim in documents issued by this organization.
    pub template_phrases: Vec<String>,
    /// Per-issuer auto-approval threshold.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_confidence_threshold() -> f64 {
    0.9
}

fn default_active() -> bool {
    true
}

impl TrustedIssuer {
    pub fn new(
        id: IssuerId,
        name: impl Into<String>,
        domain: impl Into<String>,
        template_phrases: Vec<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            domain: domain.into(),
            template_phrases,
            confidence_threshold: default_confidence_threshold(),
            active: default_active(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}

/// Fraction of the issuer's template phrases found verbatim
/// (case-insensitive substring) in the supplied text.
///
/// An issuer with zero template phrases matches with score 0: it is never
/// auto-trusted by template alone.
pub fn match_template(text: &str, issuer: &TrustedIssuer) -> f64 {
    if issuer.template_phrases.is_empty() {
        return 0.0;
    }
    let haystack = text.to_lowercase();
    let found = issuer
        .template_phrases
        .iter()
        .filter(|phrase| haystack.contains(&phrase.to_lowercase()))
        .count();
    found as f64 / issuer.template_phrases.len() as f64
}

// ---------------------------------------------------------------------------
// IssuerRegistry
// ---------------------------------------------------------------------------

/// In-memory catalog of trusted issuers. Administered externally; the
/// engine only reads from it.
#[derive(Debug, Clone, Default)]
pub struct IssuerRegistry {
    issuers: Vec<TrustedIssuer>,
}

impl IssuerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, issuer: TrustedIssuer) {
        self.issuers.push(issuer);
    }

    /// Look up an active issuer by domain (case-insensitive).
    pub fn find_by_domain(&self, domain: &str) -> Option<&TrustedIssuer> {
        self.issuers
            .iter()
            .find(|i| i.active && i.domain.eq_ignore_ascii_case(domain))
    }

    /// Look up an active issuer by organization name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<&TrustedIssuer> {
        self.issuers
            .iter()
            .find(|i| i.active && i.name.eq_ignore_ascii_case(name))
    }

    /// Resolve an issuer from extracted claims: institution name first,
    /// then domain.
    pub fn resolve(&self, institution: &str, domain: Option<&str>) -> Option<&TrustedIssuer> {
        self.find_by_name(institution)
            .or_else(|| domain.and_then(|d| self.find_by_domain(d)))
    }

    pub fn list(&self) -> &[TrustedIssuer] {
        &self.issuers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn university() -> TrustedIssuer {
        TrustedIssuer::new(
            IssuerId::new("issuer-1"),
            "State University",
            "state.edu",
            vec![
                "hereby confers".into(),
                "Board of Trustees".into(),
                "with all the rights and privileges".into(),
            ],
        )
    }

    fn registry() -> IssuerRegistry {
        let mut registry = IssuerRegistry::new();
        registry.register(university());
        registry
    }

    #[test]
    fn test_find_by_domain() {
        let registry = registry();
        assert!(registry.find_by_domain("state.edu").is_some());
        assert!(registry.find_by_domain("STATE.EDU").is_some());
        assert!(registry.find_by_domain("other.edu").is_none());
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let registry = registry();
        assert!(registry.find_by_name("state university").is_some());
        assert!(registry.find_by_name("Unknown College").is_none());
    }

    #[test]
    fn test_inactive_issuer_not_resolvable() {
        let mut issuer = university();
        issuer.active = false;
        let mut registry = IssuerRegistry::new();
        registry.register(issuer);
        assert!(registry.find_by_domain("state.edu").is_none());
        assert!(registry.find_by_name("State University").is_none());
    }

    #[test]
    fn test_resolve_prefers_name() {
        let mut registry = registry();
        registry.register(TrustedIssuer::new(
            IssuerId::new("issuer-2"),
            "Other College",
            "other.edu",
            vec![],
        ));
        let resolved = registry.resolve("State University", Some("other.edu")).unwrap();
        assert_eq!(resolved.id, IssuerId::new("issuer-1"));
    }

    #[test]
    fn test_resolve_falls_back_to_domain() {
        let registry = registry();
        let resolved = registry.resolve("Misspelled University", Some("state.edu"));
        assert!(resolved.is_some());
    }

    #[test]
    fn test_match_template_full() {
        let issuer = university();
        let text = "State University hereby confers, by authority of the Board of \
                    Trustees, this degree with all the rights and privileges thereto";
        assert!((match_template(text, &issuer) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_match_template_partial() {
        let issuer = university();
        let text = "State University hereby confers this degree";
        let score = match_template(text, &issuer);
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_template_case_insensitive() {
        let issuer = university();
        let score = match_template("HEREBY CONFERS", &issuer);
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_template_no_phrases_scores_zero() {
        let issuer = TrustedIssuer::new(IssuerId::new("i"), "Empty Org", "empty.org", vec![]);
        assert_eq!(match_template("anything at all", &issuer), 0.0);
    }

    #[test]
    fn test_match_template_empty_text() {
        let issuer = university();
        assert_eq!(match_template("", &issuer), 0.0);
    }

    #[test]
    fn test_default_threshold() {
        let issuer = university();
        assert!((issuer.confidence_threshold - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_with_threshold() {
        let issuer = university().with_threshold(0.85);
        assert!((issuer.confidence_threshold - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serde_defaults_applied() {
        let json = r#"{"id": "issuer-9", "name": "X", "domain": "x.org", "template_phrases": []}"#;
        let issuer: TrustedIssuer = serde_json::from_str(json).unwrap();
        assert!(issuer.active);
        assert!((issuer.confidence_threshold - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_list() {
        let registry = registry();
        assert_eq!(registry.list().len(), 1);
    }
}

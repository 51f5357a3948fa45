//! Credential issuance: binds a document's approved claims into a
//! verifiable-credential document and signs it with the current active key.
//!
//! The signing input is the canonical JSON serialization of everything but
//! the proof; the proof carries the detached signature and the kid of the
//! key that produced it, so verifiers select the correct public key without
//! guessing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use veridoc_core::{CredentialId, Kid, OwnerId};

use crate::error::{IssuerError, IssuerResult};
use crate::keystore::KeyStore;

// ---------------------------------------------------------------------------
// Credential document shape
// ---------------------------------------------------------------------------

/// Claims bound to the credential subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSubject {
    pub subject: OwnerId,
    pub title: String,
    pub institution: String,
    pub recipient: String,
    pub date_issued: String,
}

/// Detached signature referencing the signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub kid: Kid,
    pub algorithm: String,
    /// base64url (no padding) Ed25519 signature over the signing input.
    pub signature: String,
}

/// Immutable once issued; superseded only by status registry records,
/// never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiableCredential {
    pub id: CredentialId,
    pub issuer: String,
    #[serde(rename = "issuanceDate")]
    pub issuance_date: String,
    #[serde(rename = "credentialSubject")]
    pub credential_subject: CredentialSubject,
    pub proof: Proof,
}

/// Canonical signing input: the credential document without its proof.
fn signing_input(
    id: &CredentialId,
    issuer: &str,
    issuance_date: &str,
    subject: &CredentialSubject,
) -> IssuerResult<Vec<u8>> {
    let payload = serde_json::json!({
        "id": id.as_str(),
        "issuer": issuer,
        "issuanceDate": issuance_date,
        "credentialSubject": subject,
    });
    serde_json::to_vec(&payload).map_err(|_| IssuerError::EncodingFailed)
}

/// Issue a credential over approved claims, signing with the current
/// active key.
///
/// The key store holds its read lock across kid selection and signing, so
/// issuance is atomic with respect to rotation. No active key is fatal for
/// this attempt only; the caller's document state is untouched and issuance
/// can be retried.
pub fn issue(
    subject: CredentialSubject,
    issuer: &str,
    keystore: &KeyStore,
) -> IssuerResult<VerifiableCredential> {
    let id = CredentialId::generate();
    let issuance_date = chrono::Utc::now().to_rfc3339();

    let input = signing_input(&id, issuer, &issuance_date, &subject)?;
    let (kid, signature) = keystore.sign(&input)?;

    let algorithm = keystore
        .get_by_kid(&kid)
        .map(|m| m.algorithm)
        .ok_or_else(|| IssuerError::UnknownKey(kid.as_str().to_string()))?;

    Ok(VerifiableCredential {
        id,
        issuer: issuer.to_string(),
        issuance_date,
        credential_subject: subject,
        proof: Proof {
            kid,
            algorithm,
            signature: URL_SAFE_NO_PAD.encode(signature),
        },
    })
}

/// Verify a credential's detached signature against the key named by its
/// proof. An evicted kid surfaces as `UnknownKey`, never a panic.
pub fn verify(credential: &VerifiableCredential, keystore: &KeyStore) -> IssuerResult<bool> {
    let input = signing_input(
        &credential.id,
        &credential.issuer,
        &credential.issuance_date,
        &credential.credential_subject,
    )?;

    let decoded = URL_SAFE_NO_PAD
        .decode(&credential.proof.signature)
        .map_err(|_| IssuerError::InvalidSignatureEncoding)?;
    let signature: [u8; 64] = decoded
        .try_into()
        .map_err(|_| IssuerError::InvalidSignatureEncoding)?;

    keystore.verify(&credential.proof.kid, &input, &signature)
}

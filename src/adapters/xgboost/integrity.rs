//! Model artifact integrity.
//!
//! A model directory may carry `manifest.json` (SHA-256 digests of the bound
//! files) and `model.sig` (detached Ed25519 signature over the manifest bytes).
//!
//! - A configured verifying key makes both files mandatory.
//! - Without a key, a present manifest is still checked for the digest.
//! - Without either, the model loads with a warning.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ModelLoadError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";
pub const MANIFEST_VERSION: u32 = 1;

/// Signed description of the files that make up a model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Unix timestamp (seconds) of signing.
    pub created_at: i64,
    /// Random 16-byte nonce, base64.
    pub nonce_b64: String,
    /// File name → lowercase SHA-256 hex digest.
    pub files: BTreeMap<String, String>,
}

impl ModelManifest {
    /// Manifest binding a single model file.
    #[must_use]
    pub fn for_model(
        file_name: &str,
        model_bytes: &[u8],
        created_at: i64,
        nonce: [u8; 16],
    ) -> Self {
        let mut files = BTreeMap::new();
        files.insert(file_name.to_string(), sha256_hex(model_bytes));
        Self {
            version: MANIFEST_VERSION,
            created_at,
            nonce_b64: base64::engine::general_purpose::STANDARD.encode(nonce),
            files,
        }
    }
}

/// How much of the artifact was verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Unsigned,
    DigestOnly,
    Signed,
}

/// Which checks the loader enforces.
#[derive(Debug, Clone, Default)]
pub struct IntegrityPolicy {
    verifying_key: Option<VerifyingKey>,
}

impl IntegrityPolicy {
    /// Check the manifest when present; accept unsigned artifacts.
    #[must_use]
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Require a manifest signed by `key`.
    #[must_use]
    pub fn require_signature(key: VerifyingKey) -> Self {
        Self {
            verifying_key: Some(key),
        }
    }

    /// Parse a 32-byte Ed25519 public key given as hex.
    ///
    /// # Errors
    /// Returns `ModelLoadError::Integrity` for malformed keys.
    pub fn from_public_key_hex(hex: &str) -> Result<Self, ModelLoadError> {
        let bytes = decode_hex(hex.trim())
            .ok_or_else(|| ModelLoadError::Integrity("verifying key is not valid hex".into()))?;
        let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            ModelLoadError::Integrity(format!(
                "verifying key must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| ModelLoadError::Integrity(format!("invalid verifying key: {e}")))?;
        Ok(Self::require_signature(key))
    }

    #[must_use]
    pub fn requires_signature(&self) -> bool {
        self.verifying_key.is_some()
    }
}

/// Verify `model_bytes` (read from `model_path`) against its manifest.
///
/// # Errors
/// Returns `ModelLoadError::Integrity` on any missing or failing check the
/// policy requires.
pub fn verify(
    model_path: &Path,
    model_bytes: &[u8],
    policy: &IntegrityPolicy,
) -> Result<Verification, ModelLoadError> {
    let dir = model_path.parent().unwrap_or_else(|| Path::new("."));
    let manifest_path = dir.join(MANIFEST_FILE);
    let sig_path = dir.join(SIGNATURE_FILE);

    let manifest_bytes = if manifest_path.exists() {
        fs::read(&manifest_path)?
    } else if policy.requires_signature() {
        tracing::error!("Model manifest not found at {:?}", manifest_path);
        return Err(ModelLoadError::Integrity(format!(
            "{MANIFEST_FILE} required next to the model"
        )));
    } else {
        tracing::warn!("Loading UNSIGNED model from {:?}", model_path);
        return Ok(Verification::Unsigned);
    };

    let mut level = Verification::DigestOnly;
    if let Some(key) = &policy.verifying_key {
        if !sig_path.exists() {
            return Err(ModelLoadError::Integrity(format!(
                "{SIGNATURE_FILE} required next to the model"
            )));
        }
        let sig_bytes = fs::read(&sig_path)?;
        let sig_bytes: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
            ModelLoadError::Integrity("invalid signature length (expected 64 bytes)".into())
        })?;
        key.verify(&manifest_bytes, &Signature::from_bytes(&sig_bytes))
            .map_err(|_| ModelLoadError::Integrity("invalid model signature".into()))?;
        level = Verification::Signed;
    } else if sig_path.exists() {
        tracing::warn!("Model signature present but no verifying key set; checking digest only");
    }

    let manifest: ModelManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ModelLoadError::Integrity(format!("invalid {MANIFEST_FILE}: {e}")))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(ModelLoadError::Integrity(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }

    let file_name = model_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ModelLoadError::Integrity("model path has no file name".into()))?;
    let expected = manifest.files.get(file_name).ok_or_else(|| {
        ModelLoadError::Integrity(format!("{MANIFEST_FILE} does not bind {file_name}"))
    })?;

    let actual = sha256_hex(model_bytes);
    if !constant_time_eq_str(&expected.to_ascii_lowercase(), &actual) {
        return Err(ModelLoadError::Integrity(format!(
            "digest mismatch for {file_name}"
        )));
    }

    tracing::info!("Model integrity verified ({:?})", level);
    Ok(level)
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    to_hex(&Sha256::digest(bytes))
}

#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Compare two digests without stopping at the first differing byte.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    const MODEL: &[u8] = br#"{"learner":{}}"#;

    fn write_artifact(dir: &Path, signing: Option<&SigningKey>) -> std::path::PathBuf {
        let model_path = dir.join("xgb_model.json");
        fs::write(&model_path, MODEL).expect("write model");

        let manifest = ModelManifest::for_model("xgb_model.json", MODEL, 1_700_000_000, [7u8; 16]);
        let manifest_bytes = serde_json::to_vec_pretty(&manifest).expect("serialize");
        fs::write(dir.join(MANIFEST_FILE), &manifest_bytes).expect("write manifest");

        if let Some(key) = signing {
            let sig = key.sign(&manifest_bytes);
            fs::write(dir.join(SIGNATURE_FILE), sig.to_bytes()).expect("write sig");
        }
        model_path
    }

    #[test]
    fn test_unsigned_without_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model_path = dir.path().join("xgb_model.json");
        fs::write(&model_path, MODEL).expect("write model");

        let level =
            verify(&model_path, MODEL, &IntegrityPolicy::permissive()).expect("Should load");
        assert_eq!(level, Verification::Unsigned);
    }

    #[test]
    fn test_digest_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model_path = write_artifact(dir.path(), None);
        let level =
            verify(&model_path, MODEL, &IntegrityPolicy::permissive()).expect("Should load");
        assert_eq!(level, Verification::DigestOnly);
    }

    #[test]
    fn test_tampered_model_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model_path = write_artifact(dir.path(), None);
        let err = verify(&model_path, b"{\"tampered\":1}", &IntegrityPolicy::permissive())
            .unwrap_err();
        assert!(matches!(err, ModelLoadError::Integrity(_)));
    }

    #[test]
    fn test_digest_compare() {
        let digest = sha256_hex(MODEL);
        assert!(constant_time_eq_str(&digest, &sha256_hex(MODEL)));
        assert!(!constant_time_eq_str(&digest, &sha256_hex(b"{}")));
        assert!(!constant_time_eq_str(&digest, &digest[1..]));
        assert!(!constant_time_eq_str(&digest, &digest.to_ascii_uppercase()));
    }

    #[test]
    fn test_uppercase_manifest_digest_accepted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model_path = dir.path().join("xgb_model.json");
        fs::write(&model_path, MODEL).expect("write model");

        let mut manifest = ModelManifest::for_model("xgb_model.json", MODEL, 0, [0u8; 16]);
        for digest in manifest.files.values_mut() {
            *digest = digest.to_ascii_uppercase();
        }
        let manifest_bytes = serde_json::to_vec(&manifest).expect("serialize");
        fs::write(dir.path().join(MANIFEST_FILE), manifest_bytes).expect("write manifest");

        let level =
            verify(&model_path, MODEL, &IntegrityPolicy::permissive()).expect("Should load");
        assert_eq!(level, Verification::DigestOnly);
    }

    #[test]
    fn test_signed_roundtrip_and_wrong_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let signing = SigningKey::from_bytes(&[42u8; 32]);
        let model_path = write_artifact(dir.path(), Some(&signing));

        let public_hex = to_hex(signing.verifying_key().as_bytes());
        let policy = IntegrityPolicy::from_public_key_hex(&public_hex).expect("valid key");
        let level = verify(&model_path, MODEL, &policy).expect("Should verify");
        assert_eq!(level, Verification::Signed);

        let other = SigningKey::from_bytes(&[9u8; 32]);
        let wrong = IntegrityPolicy::require_signature(other.verifying_key());
        assert!(matches!(
            verify(&model_path, MODEL, &wrong),
            Err(ModelLoadError::Integrity(_))
        ));
    }

    #[test]
    fn test_signature_required_when_key_configured() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model_path = write_artifact(dir.path(), None);
        let key = SigningKey::from_bytes(&[1u8; 32]).verifying_key();
        let err = verify(&model_path, MODEL, &IntegrityPolicy::require_signature(key)).unwrap_err();
        assert!(matches!(err, ModelLoadError::Integrity(_)));
    }

    #[test]
    fn test_bad_public_key_hex() {
        assert!(IntegrityPolicy::from_public_key_hex("zz").is_err());
        assert!(IntegrityPolicy::from_public_key_hex("abcd").is_err());
    }
}

//! Signs a Frailsight model artifact.
//!
//! Writes `manifest.json` (SHA-256 of the model file) and `model.sig`
//! (detached Ed25519 signature over the manifest bytes) next to the model,
//! then prints the verifying key to configure as `FRAILSIGHT_MODEL_PUBKEY_HEX`.
//!
//! # Usage
//!
//! ```bash
//! FRAILSIGHT_MODEL_SIGNING_KEY_B64_FILE=/secrets/seed.b64 \
//!     cargo run --bin sign_model -- models/xgb_model.json
//! ```
//!
//! The signing key is a base64-encoded 32-byte Ed25519 seed. It is wiped
//! from memory once the signature is written.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use frailsight::adapters::xgboost::integrity::{to_hex, MANIFEST_FILE, SIGNATURE_FILE};
use frailsight::adapters::xgboost::{IntegrityPolicy, ModelManifest, XgbModel};

const KEY_FILE_ENV: &str = "FRAILSIGHT_MODEL_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "FRAILSIGHT_MODEL_SIGNING_KEY_B64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = Zeroizing::new(
            fs::read_to_string(path.trim()).context("Failed reading signing key file")?,
        );
        let secret = content.trim_end_matches(['\n', '\r']).to_string();
        if secret.is_empty() {
            bail!("Empty signing key");
        }
        return Ok(Zeroizing::new(secret));
    }

    // Dev-only fallback.
    if cfg!(debug_assertions) {
        if let Ok(v) = env::var(KEY_ENV) {
            let secret = v.trim_end_matches(['\n', '\r']).to_string();
            if secret.is_empty() {
                bail!("Empty signing key");
            }
            return Ok(Zeroizing::new(secret));
        }
    }

    bail!("Missing signing key. Set {KEY_FILE_ENV} ({KEY_ENV} is accepted in debug builds only).")
}

fn read_signing_seed() -> Result<Seed> {
    let encoded = read_signing_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(encoded.trim())
            .context("Invalid base64 in signing key")?,
    );

    let seed: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(seed))
}

fn parse_args() -> Result<PathBuf> {
    let usage = "Usage: sign_model <model_path>";
    let mut args = env::args().skip(1);
    match (args.next(), args.next()) {
        (Some(arg), None) if arg != "-h" && arg != "--help" => Ok(PathBuf::from(arg)),
        _ => bail!(usage),
    }
}

fn main() -> Result<()> {
    let model_path = parse_args()?;
    let file_name = model_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Model path {model_path:?} has no file name"))?;
    let dir = model_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let model_bytes =
        fs::read(&model_path).with_context(|| format!("Failed to read {model_path:?}"))?;
    // Refuse to sign something the loader would reject.
    XgbModel::from_json_slice(&model_bytes)
        .with_context(|| format!("{model_path:?} is not a usable model"))?;

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);
    let verifying_key = signing_key.verifying_key();

    let mut nonce = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    let created_at = chrono::Utc::now().timestamp();
    let manifest = ModelManifest::for_model(file_name, &model_bytes, created_at, nonce);
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let manifest_path = dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes()).with_context(|| format!("Failed to write {sig_path:?}"))?;

    let pubkey_hex = to_hex(verifying_key.as_bytes());

    // Round-trip through the loader before reporting success.
    let policy = IntegrityPolicy::from_public_key_hex(&pubkey_hex)?;
    XgbModel::load(&model_path, &policy).context("Signed artifact failed verification")?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!("FRAILSIGHT_MODEL_PUBKEY_HEX={pubkey_hex}");

    Ok(())
}

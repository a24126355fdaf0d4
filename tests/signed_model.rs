//! Loading a signed copy of the fixture model.

use std::fs;
use std::path::{Path, PathBuf};

use ed25519_dalek::{Signer, SigningKey};

use frailsight::adapters::xgboost::integrity::{to_hex, MANIFEST_FILE, SIGNATURE_FILE};
use frailsight::adapters::xgboost::{IntegrityPolicy, ModelManifest, Verification, XgbModel};
use frailsight::adapters::ModelLoadError;
use frailsight::application::PredictionPipeline;
use frailsight::FrailsightError;

const MODEL_FILE: &str = "xgb_model.json";

fn sign_fixture_into(dir: &Path, key: &SigningKey) -> PathBuf {
    let source = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models").join(MODEL_FILE);
    let bytes = fs::read(source).expect("Should read fixture");
    let model_path = dir.join(MODEL_FILE);
    fs::write(&model_path, &bytes).expect("Should copy fixture");

    let manifest = ModelManifest::for_model(MODEL_FILE, &bytes, 1_700_000_000, [9u8; 16]);
    let manifest_bytes = serde_json::to_vec_pretty(&manifest).expect("Should serialize");
    fs::write(dir.join(MANIFEST_FILE), &manifest_bytes).expect("Should write manifest");
    fs::write(dir.join(SIGNATURE_FILE), key.sign(&manifest_bytes).to_bytes())
        .expect("Should write signature");

    model_path
}

fn policy_for(key: &SigningKey) -> IntegrityPolicy {
    IntegrityPolicy::from_public_key_hex(&to_hex(key.verifying_key().as_bytes()))
        .expect("Should parse key")
}

#[test]
fn signed_model_loads_and_verifies() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let key = SigningKey::from_bytes(&[7u8; 32]);
    let path = sign_fixture_into(dir.path(), &key);

    let bytes = fs::read(&path).expect("Should read model");
    let level = frailsight::adapters::xgboost::integrity::verify(&path, &bytes, &policy_for(&key))
        .expect("Should verify");
    assert_eq!(level, Verification::Signed);

    let model = XgbModel::load(&path, &policy_for(&key)).expect("Should load signed model");
    assert_eq!(model.num_trees(), 4);
}

#[test]
fn tampered_model_is_rejected() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let key = SigningKey::from_bytes(&[7u8; 32]);
    let path = sign_fixture_into(dir.path(), &key);

    let tampered = fs::read_to_string(&path)
        .expect("Should read model")
        .replacen("-0.31", "-0.91", 1);
    fs::write(&path, tampered).expect("Should write model");

    let err = XgbModel::load(&path, &policy_for(&key)).unwrap_err();
    assert!(matches!(err, ModelLoadError::Integrity(_)));

    // Even without a key, the manifest digest is enforced.
    let err = XgbModel::load(&path, &IntegrityPolicy::permissive()).unwrap_err();
    assert!(matches!(err, ModelLoadError::Integrity(_)));
}

#[test]
fn wrong_key_is_rejected() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let path = sign_fixture_into(dir.path(), &SigningKey::from_bytes(&[7u8; 32]));

    let other = SigningKey::from_bytes(&[8u8; 32]);
    let err = XgbModel::load(&path, &policy_for(&other)).unwrap_err();
    assert!(matches!(err, ModelLoadError::Integrity(_)));
}

#[test]
fn missing_model_never_builds_a_pipeline() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let missing = dir.path().join(MODEL_FILE);
    let result = PredictionPipeline::load(&missing, &IntegrityPolicy::permissive());

    match result {
        Err(FrailsightError::ModelLoad(ModelLoadError::NotFound(p))) => {
            assert!(p.ends_with(MODEL_FILE));
        }
        Err(other) => panic!("expected NotFound, got {other}"),
        Ok(_) => panic!("pipeline built without a model"),
    }
    assert!(frailsight::application::model::loaded().is_none());
}

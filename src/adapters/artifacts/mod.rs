//! Artifact adapter: Loads the fitted scaler and classifier from disk.
//!
//! A model directory holds:
//! - `scaler.json`: standard scaler parameters
//! - `model.json`: random forest trees and feature importances
//! - `manifest.json` + `model.sig`: SHA-256 digests of both files, signed
//!   with the developer's Ed25519 key
//!
//! # Security
//!
//! - The manifest signature is checked before any artifact is parsed
//! - The manifest must bind both artifact files, and each file's digest
//!   must match
//! - Unsigned loading is only possible through [`ArtifactLoader::unsigned`],
//!   which the configuration layer only hands out in debug builds
//!
//! # Key Rotation
//!
//! 1. Generate new keypair: `cargo run --bin generate_keypair`
//! 2. Point `DIABETES_RISK_MODEL_PUBKEY_FILE` at the new public key
//! 3. Re-sign all model directories with `cargo run --bin sign_model`
//! 4. Securely destroy old private key

mod forest;
mod scaler;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::ModelError;

pub use forest::{RandomForestArtifact, TreeArtifact, TREE_LEAF};
pub use scaler::StandardScalerArtifact;

pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";

/// Allowed clock skew for manifest timestamps, in seconds.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

/// Signed list of artifact digests.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignedManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was signed
    pub created_at: i64,
    /// File name -> lowercase hex SHA-256
    pub files: BTreeMap<String, String>,
}

impl SignedManifest {
    pub const VERSION: u32 = 1;
}

/// The pair of artifacts a scorer needs.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub scaler: StandardScalerArtifact,
    pub classifier: RandomForestArtifact,
}

/// Loads and verifies model directories.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    verifying_key: Option<VerifyingKey>,
}

impl ArtifactLoader {
    /// Loader that requires a valid signed manifest.
    #[must_use]
    pub fn signed(verifying_key: VerifyingKey) -> Self {
        Self {
            verifying_key: Some(verifying_key),
        }
    }

    /// Loader that skips signature checks entirely.
    #[must_use]
    pub fn unsigned() -> Self {
        Self {
            verifying_key: None,
        }
    }

    /// Signed loader whose key is read from a base64 file.
    ///
    /// # Errors
    /// Returns `ModelError::Integrity` if the file cannot be read or does
    /// not hold a valid Ed25519 public key.
    pub fn from_pubkey_file(path: &Path) -> Result<Self, ModelError> {
        let b64 = fs::read_to_string(path)
            .map_err(|e| ModelError::Integrity(format!("Failed reading pubkey file: {e}")))?;
        Ok(Self::signed(verifying_key_from_b64(&b64)?))
    }

    #[must_use]
    pub fn verifies_signatures(&self) -> bool {
        self.verifying_key.is_some()
    }

    /// Load both artifacts from `model_dir`.
    ///
    /// # Errors
    /// Returns `ModelError::Integrity` if verification fails,
    /// `ModelError::Load` if a file is missing or unparsable, and
    /// `ModelError::Corrupt` if an artifact is structurally invalid.
    pub fn load(&self, model_dir: &Path) -> Result<LoadedArtifacts, ModelError> {
        match &self.verifying_key {
            Some(key) => {
                verify_manifest(model_dir, key)?;
            }
            None => {
                tracing::warn!(
                    "Loading UNSIGNED model artifacts from {:?}. Signature checks are disabled.",
                    model_dir
                );
            }
        }

        let scaler: StandardScalerArtifact = read_json(&model_dir.join(SCALER_FILE))?;
        scaler.validate()?;

        let classifier: RandomForestArtifact = read_json(&model_dir.join(MODEL_FILE))?;
        classifier.validate()?;

        if scaler.feature_names != classifier.feature_names {
            return Err(ModelError::Corrupt(
                "scaler and model were fitted on different feature lists".into(),
            ));
        }

        tracing::info!(
            "Loaded artifacts from {:?} (n_features={}, n_trees={})",
            model_dir,
            classifier.feature_names.len(),
            classifier.trees.len()
        );

        Ok(LoadedArtifacts { scaler, classifier })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ModelError::Load(format!("Failed to read {path:?}: {e}")))?;
    serde_json::from_str(&content)
        .map_err(|e| ModelError::Load(format!("Failed to parse {path:?}: {e}")))
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Parse a base64 Ed25519 public key.
///
/// # Errors
/// Returns `ModelError::Integrity` on bad encoding or length.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ModelError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ModelError::Integrity("Invalid public key base64".into()))?;
    let pubkey: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ModelError::Integrity("Invalid public key length (expected 32 bytes)".into()))?;
    VerifyingKey::from_bytes(&pubkey)
        .map_err(|_| ModelError::Integrity("Invalid verifying key".into()))
}

/// Check the signature over `manifest.json` and every digest it lists.
fn verify_manifest(model_dir: &Path, key: &VerifyingKey) -> Result<SignedManifest, ModelError> {
    let sig_path = model_dir.join(SIGNATURE_FILE);
    let manifest_path = model_dir.join(MANIFEST_FILE);

    if !sig_path.exists() || !manifest_path.exists() {
        tracing::error!("Model signature not found at {:?}", sig_path);
        return Err(ModelError::Integrity(format!(
            "{MANIFEST_FILE} and {SIGNATURE_FILE} are required for signed loading"
        )));
    }

    let sig_bytes = fs::read(&sig_path)
        .map_err(|e| ModelError::Integrity(format!("Failed to read signature: {e}")))?;
    let sig_bytes: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ModelError::Integrity("Invalid signature length (expected 64 bytes)".into()))?;
    let signature = Signature::from_bytes(&sig_bytes);

    let manifest_content = fs::read(&manifest_path)
        .map_err(|e| ModelError::Integrity(format!("Failed to read manifest: {e}")))?;
    key.verify(&manifest_content, &signature)
        .map_err(|_| ModelError::Integrity("Invalid model signature".into()))?;

    let manifest: SignedManifest = serde_json::from_slice(&manifest_content)
        .map_err(|e| ModelError::Integrity(format!("Invalid {MANIFEST_FILE} format: {e}")))?;
    if manifest.version != SignedManifest::VERSION {
        return Err(ModelError::Integrity(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }
    if manifest.created_at > unix_now() + MAX_FUTURE_SKEW_SECS {
        return Err(ModelError::Integrity("manifest created_at is in the future".into()));
    }

    for required in [SCALER_FILE, MODEL_FILE] {
        if !manifest.files.contains_key(required) {
            return Err(ModelError::Integrity(format!(
                "{MANIFEST_FILE} must include {required}"
            )));
        }
    }

    for (rel, expected_hex) in &manifest.files {
        let path = model_dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            ModelError::Integrity(format!(
                "Manifest references missing/unreadable file {path:?}: {e}"
            ))
        })?;
        if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
            return Err(ModelError::Integrity(format!("File hash mismatch for {rel}")));
        }
    }

    tracing::info!("Model signature and hashes verified successfully");
    Ok(manifest)
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
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

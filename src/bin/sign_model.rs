//! Signs a model directory for verified loading.
//!
//! Writes `manifest.json` (SHA-256 of `scaler.json` and `model.json`) and
//! its Ed25519 signature `model.sig`, then loads the directory back through
//! the signed loader as a self-check.
//!
//! # Usage
//!
//! ```bash
//! DIABETES_RISK_MODEL_SIGNING_KEY_B64_FILE=keys/seed.b64 \
//!     cargo run --bin sign_model -- <model_dir>
//! ```
//!
//! The seed is read from, in order: an inherited file descriptor
//! (`DIABETES_RISK_MODEL_SIGNING_KEY_B64_FD`), a file
//! (`DIABETES_RISK_MODEL_SIGNING_KEY_B64_FILE`), the Docker secret
//! `/run/secrets/diabetes_risk_model_signing_key_b64`, or in debug builds
//! only, `DIABETES_RISK_MODEL_SIGNING_KEY_B64`.

use std::collections::BTreeMap;
use std::env;
use std::fs;
#[cfg(unix)]
use std::os::unix::io::FromRawFd;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use diabetes_risk::adapters::artifacts::{
    sha256_hex, ArtifactLoader, SignedManifest, MANIFEST_FILE, MODEL_FILE, SCALER_FILE,
    SIGNATURE_FILE,
};

const KEY_FD_ENV: &str = "DIABETES_RISK_MODEL_SIGNING_KEY_B64_FD";
const KEY_FILE_ENV: &str = "DIABETES_RISK_MODEL_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "DIABETES_RISK_MODEL_SIGNING_KEY_B64";
const DOCKER_SECRET_PATH: &str = "/run/secrets/diabetes_risk_model_signing_key_b64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn non_empty_secret(raw: &str) -> Result<Zeroizing<String>> {
    let secret = Zeroizing::new(raw.trim_end_matches(['\n', '\r']).to_string());
    if secret.is_empty() {
        bail!("Empty signing key");
    }
    Ok(secret)
}

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    #[cfg(unix)]
    if let Ok(fd_str) = env::var(KEY_FD_ENV) {
        use std::io::Read;

        let fd: i32 = fd_str.trim().parse().context("Invalid key FD")?;
        if fd <= 2 {
            bail!("Refusing to read signing key from stdio FD");
        }
        // SAFETY: take ownership of FD for one-time secret read.
        let mut file = unsafe { std::fs::File::from_raw_fd(fd) };
        let mut buf = Zeroizing::new(String::new());
        file.read_to_string(&mut buf)
            .context("Failed reading signing key from FD")?;
        return non_empty_secret(&buf);
    }

    if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = Zeroizing::new(
            fs::read_to_string(path.trim()).context("Failed reading signing key file")?,
        );
        return non_empty_secret(&content);
    }

    if Path::new(DOCKER_SECRET_PATH).exists() {
        let content = Zeroizing::new(
            fs::read_to_string(DOCKER_SECRET_PATH).context("Failed reading docker secret")?,
        );
        return non_empty_secret(&content);
    }

    if cfg!(debug_assertions) {
        if let Ok(v) = env::var(KEY_ENV) {
            return non_empty_secret(&Zeroizing::new(v));
        }
    }

    Err(anyhow!(
        "Missing signing key. Provide one of: {KEY_FD_ENV}, {KEY_FILE_ENV}, or {DOCKER_SECRET_PATH} ({KEY_ENV} only in debug builds)."
    ))
}

fn read_signing_seed() -> Result<Seed> {
    let b64 = read_signing_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.trim())
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
    let usage = "Usage: sign_model <model_dir>";
    let mut args = env::args().skip(1);
    let model_dir = match args.next().as_deref() {
        None | Some("-h") | Some("--help") => bail!(usage),
        Some(dir) => PathBuf::from(dir),
    };
    if args.next().is_some() {
        bail!(usage);
    }

    // Accept a path to one of the artifacts as well as the directory.
    if model_dir.is_file() {
        return model_dir
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("Model path has no parent directory"));
    }
    Ok(model_dir)
}

fn main() -> Result<()> {
    let model_dir = parse_args()?;

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);
    let verifying_key = signing_key.verifying_key();

    let mut files = BTreeMap::new();
    for rel in [SCALER_FILE, MODEL_FILE] {
        let path = model_dir.join(rel);
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {path:?}"))?;
        files.insert(rel.to_string(), sha256_hex(&bytes));
    }

    let manifest = SignedManifest {
        version: SignedManifest::VERSION,
        created_at: chrono::Utc::now().timestamp(),
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = model_dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes()).with_context(|| format!("Failed to write {sig_path:?}"))?;

    ArtifactLoader::signed(verifying_key)
        .load(&model_dir)
        .context("Signed directory failed verification")?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "Public key (base64)={}",
        general_purpose::STANDARD.encode(verifying_key.as_bytes())
    );

    Ok(())
}

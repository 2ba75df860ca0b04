//! Sign a handful of synthetic GOP hashes through a configured backend
//!
//! Usage: `cargo run --example sign_gop_hashes -- [rsa|ecdsa] [log-level]`
//!
//! The backend is taken from `SV_SIGNER_*` environment variables, e.g.
//! `SV_SIGNER_BACKEND=software`.

use anyhow::{bail, Context, Result};
use signing_plugin::config::load_config_from_env;
use signing_plugin::{create_plugin, hash_data, PrivateKey, SignAlgo, SigningSession};
use std::time::{Duration, Instant};
use tracing::info;

fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => {
            eprintln!("Unknown log level: {}, using INFO", log_level);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let algo = match args.next().as_deref() {
        None | Some("ecdsa") => SignAlgo::Ecdsa,
        Some("rsa") => SignAlgo::Rsa,
        Some(other) => bail!("unknown algorithm {:?}, expected rsa or ecdsa", other),
    };
    init_logging(args.next().as_deref().unwrap_or("info"))?;

    let config = load_config_from_env().context("Failed to load signer config")?;
    info!("Backend: {:?}, max_pending={}", config.backend, config.max_pending);

    // 1. Provision a key as a host would
    let private_key = PrivateKey::generate(algo)?;
    let private_pem = private_key.to_pem()?;
    let mut session = SigningSession::from_pem(create_plugin(&config), algo, private_pem.as_bytes())?;

    // 2. Sign one hash per GOP
    session.setup().context("Backend setup failed")?;
    let gops: Vec<String> = (0..8).map(|i| format!("gop-{:03}: I P P P P P P P", i)).collect();

    let started = Instant::now();
    for gop in &gops {
        session.sign_data(gop.as_bytes())?;
    }

    // 3. Poll for results and validate each one
    let mut signature = session.allocate_signature_buffer()?;
    for gop in &gops {
        let Some(id) = session.wait_for_signature(&mut signature, Duration::from_secs(10))? else {
            bail!("timed out waiting for the signature of {}", gop);
        };
        let valid = session.verify(&hash_data(gop.as_bytes()), signature.as_slice())?;
        info!(
            "{} {}: {} byte signature, valid={}",
            id,
            gop,
            signature.len(),
            valid
        );
    }

    info!("Signed {} GOPs with {} in {:?}", gops.len(), algo, started.elapsed());
    session.release_signature_buffer(signature);
    session.teardown();

    Ok(())
}

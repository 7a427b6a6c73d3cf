//! `issue-token`: sign a bearer token with the configured key.
//!
//! ```text
//! issue-token <subject> [name=value ...] [--lifetime SECONDS] [--audience AUDIENCE]
//! ```
//!
//! Reads `AUTH_*` configuration from the environment and prints the token as
//! JSON on stdout. Logs go to stderr; `LOG_FORMAT=json` switches them to JSON.

use auth_core::claims::{Claim, ClaimsIdentity};
use auth_core::config::AuthConfig;
use auth_core::issuance::TokenIssuer;
use clap::Parser;
use common::clock::SystemClock;
use common::secret::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "issue-token")]
#[command(about = "Sign a bearer token with the configured key")]
struct Args {
    /// Subject (`sub`) of the token
    subject: String,

    /// Additional claims as name=value; repeat a name for multiple values
    #[arg(value_parser = parse_claim)]
    claims: Vec<Claim>,

    /// Token lifetime in seconds (defaults to AUTH_TOKEN_LIFETIME_SECONDS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    lifetime: Option<u64>,

    /// Audience override (defaults to AUTH_AUDIENCE)
    #[arg(long)]
    audience: Option<String>,
}

impl Args {
    fn identity(&self) -> ClaimsIdentity {
        let mut identity = ClaimsIdentity::for_subject(self.subject.clone());
        for claim in &self.claims {
            identity.add_claim(claim.clone());
        }
        identity
    }
}

fn parse_claim(value: &str) -> Result<Claim, String> {
    match value.split_once('=') {
        Some((name, claim_value)) if !name.is_empty() => Ok(Claim::new(name, claim_value)),
        _ => Err(format!("expected name=value, got '{value}'")),
    }
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_core=info".into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing();

    let config = AuthConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let issuer = TokenIssuer::from_config(&config, Arc::new(SystemClock)).map_err(|e| {
        error!("Failed to initialize token issuer: {}", e);
        e
    })?;

    let token = issuer.generate(
        &args.identity(),
        args.lifetime.map(Duration::from_secs),
        args.audience.as_deref(),
    )?;

    info!(expires = %token.expires(), "Token issued");

    let output = serde_json::json!({
        "token_type": token.token_type(),
        "access_token": token.value().expose_secret(),
        "expires": token.expires().to_utc().to_rfc3339(),
    });
    println!("{output}");

    Ok(())
}

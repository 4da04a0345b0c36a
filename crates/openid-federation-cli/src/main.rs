//! OpenID Federation CLI: `ofed` command.
//!
//! Resolves trust chains against a live federation, verifies chains and
//! trust marks, and shows entity configurations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use openid_federation::time::secs_to_rfc3339;
use openid_federation::{
    ChainVerifier, EntityId, EntityStatement, FederationClient, HttpFetcher, ResolveOptions,
    TrustAnchorSet, TrustChain, TrustMarkOptions, VerifyOptions,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Read an argument that is either a literal value or `@path`.
fn read_arg(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {path}"))?
            .trim()
            .to_string()),
        None => Ok(value.to_string()),
    }
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// OpenID Federation CLI: resolve and verify trust chains and trust marks.
#[derive(Parser, Debug)]
#[command(
    name = "ofed",
    about = "OpenID Federation CLI",
    version,
    long_about = "ofed: OpenID Federation CLI\n\nResolve trust chains from an entity to a trust anchor, verify chains\nand trust marks, and inspect entity configurations."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Per-request HTTP timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a trust chain from an entity to one of the trust anchors
    Resolve {
        /// Entity identifier to resolve
        entity: String,

        /// Accepted trust anchor (repeatable)
        #[arg(long = "trust-anchor", required = true)]
        trust_anchors: Vec<String>,

        /// Verify the resolved chain
        #[arg(long)]
        verify: bool,

        /// Write the chain as a JSON array of tokens
        #[arg(long)]
        output: Option<PathBuf>,

        /// Longest chain to build
        #[arg(long, default_value_t = 10)]
        max_path_length: usize,
    },

    /// Verify a trust chain stored as a JSON array of tokens
    VerifyChain {
        /// Chain file
        file: PathBuf,

        /// Require the chain to end at this trust anchor
        #[arg(long = "trust-anchor")]
        trust_anchor: Option<String>,

        /// Reference time (seconds since epoch), default now
        #[arg(long)]
        at: Option<u64>,

        /// Allowed clock skew in seconds
        #[arg(long, default_value_t = 0)]
        leeway: u64,
    },

    /// Fetch and display an entity configuration statement
    EntityConfiguration {
        /// Entity identifier
        entity: String,
    },

    /// Verify a trust mark against its issuer's configuration
    VerifyTrustMark {
        /// Trust mark token, or @FILE
        token: String,

        /// Trust mark issuer (fetched for its keys)
        #[arg(long)]
        issuer: String,

        /// Require the mark to be issued to this entity
        #[arg(long)]
        subject: Option<String>,

        /// Reference time (seconds since epoch), default now
        #[arg(long)]
        at: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let timeout = Duration::from_secs(cli.timeout);

    let result = match cli.command {
        Commands::Resolve {
            entity,
            trust_anchors,
            verify,
            output,
            max_path_length,
        } => {
            cmd_resolve(
                &entity,
                &trust_anchors,
                verify,
                output.as_deref(),
                max_path_length,
                timeout,
                verbose,
            )
            .await
        }
        Commands::VerifyChain {
            file,
            trust_anchor,
            at,
            leeway,
        } => cmd_verify_chain(&file, trust_anchor, at, leeway),
        Commands::EntityConfiguration { entity } => cmd_entity_configuration(&entity, timeout).await,
        Commands::VerifyTrustMark {
            token,
            issuer,
            subject,
            at,
        } => cmd_verify_trust_mark(&token, &issuer, subject, at, timeout).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn http_client(timeout: Duration) -> Result<FederationClient> {
    log::debug!("HTTP fetch timeout {timeout:?}");
    let fetcher = HttpFetcher::with_timeout(timeout).context("failed to build HTTP client")?;
    Ok(FederationClient::new(Arc::new(fetcher)))
}

// ── Command implementations ───────────────────────────────────────────────────

/// `ofed resolve ENTITY --trust-anchor TA... [--verify] [--output FILE]`
async fn cmd_resolve(
    entity: &str,
    trust_anchors: &[String],
    verify: bool,
    output: Option<&Path>,
    max_path_length: usize,
    timeout: Duration,
    verbose: bool,
) -> Result<()> {
    let options = ResolveOptions::new()
        .with_max_path_length(max_path_length)
        .with_fetch_timeout(timeout);
    let client = http_client(timeout)?.with_resolve_options(options);
    let anchors: TrustAnchorSet = trust_anchors.iter().map(String::as_str).collect();
    let entity = EntityId::new(entity);

    let resolution = client
        .resolve_trust_chain(&entity, &anchors)
        .await
        .context("resolution aborted")?;

    if verbose {
        for failure in &resolution.failures {
            eprintln!("  dead branch: {failure}");
        }
    }

    let Some(chain) = resolution.trust_chain.as_ref() else {
        return Err(anyhow!(
            "{}",
            resolution
                .error_message()
                .unwrap_or_else(|| "resolution failed".to_string())
        ));
    };

    println!("Trust Chain");
    println!("  Entity:       {entity}");
    println!(
        "  Trust Anchor: {}",
        chain.anchor().map(EntityId::as_str).unwrap_or("-")
    );
    println!("  Length:       {}", chain.len());
    for (i, statement) in chain.iter().enumerate() {
        println!(
            "    [{i}] {statement} (expires {})",
            secs_to_rfc3339(statement.expires_at())
        );
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(chain).context("failed to serialize chain")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("  Written to:   {}", path.display());
    }

    if verify {
        let verification = client
            .verify_trust_chain(chain, &VerifyOptions::new())
            .context("verification failed")?;
        println!();
        print_verification(verification.is_valid, verification.failure_reason, verification.failed_at);
        if !verification.is_valid {
            return Err(anyhow!("trust chain is invalid"));
        }
    }

    Ok(())
}

/// `ofed verify-chain FILE [--trust-anchor TA] [--at SECS]`
fn cmd_verify_chain(
    file: &Path,
    trust_anchor: Option<String>,
    at: Option<u64>,
    leeway: u64,
) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let chain: TrustChain = serde_json::from_str(&json).context("failed to parse chain file")?;
    log::debug!("loaded {} statements from {}", chain.len(), file.display());

    let mut options = VerifyOptions::new().with_leeway(leeway);
    if let Some(anchor) = trust_anchor {
        options = options.with_trust_anchor(anchor);
    }
    if let Some(at) = at {
        options = options.at(at);
    }

    let verification = ChainVerifier::default()
        .verify(&chain, &options)
        .context("verification failed")?;

    println!("Trust Chain: {}", file.display());
    println!(
        "  Subject:  {}",
        chain.subject().map(EntityId::as_str).unwrap_or("-")
    );
    println!("  Length:   {}", verification.chain_length);
    println!("  Checked:  {}", secs_to_rfc3339(verification.verified_at));
    print_verification(verification.is_valid, verification.failure_reason, verification.failed_at);

    if verification.is_valid {
        Ok(())
    } else {
        Err(anyhow!("trust chain is invalid"))
    }
}

/// `ofed entity-configuration ENTITY`
async fn cmd_entity_configuration(entity: &str, timeout: Duration) -> Result<()> {
    let client = http_client(timeout)?;
    let statement = client
        .entity_configuration_statement(&EntityId::new(entity))
        .await
        .with_context(|| format!("failed to fetch configuration of {entity}"))?;

    print_statement(&statement)
}

/// `ofed verify-trust-mark TOKEN --issuer ID [--subject ID]`
async fn cmd_verify_trust_mark(
    token: &str,
    issuer: &str,
    subject: Option<String>,
    at: Option<u64>,
    timeout: Duration,
) -> Result<()> {
    let token = read_arg(token)?;
    let client = http_client(timeout)?;
    let issuer_config = client
        .entity_configuration_statement(&EntityId::new(issuer))
        .await
        .with_context(|| format!("failed to fetch configuration of {issuer}"))?;

    let mut options = TrustMarkOptions::new();
    if let Some(subject) = subject {
        options = options.for_subject(subject);
    }
    if let Some(at) = at {
        options = options.at(at);
    }

    let verification = client
        .verify_trust_mark_detailed(&token, &issuer_config, &options)
        .context("trust mark could not be verified")?;

    let mark = &verification.trust_mark;
    println!("Trust Mark: {}", mark.id());
    println!("  Issuer:  {}", mark.issuer());
    println!("  Subject: {}", mark.subject());
    println!("  Issued:  {}", secs_to_rfc3339(mark.issued_at()));
    match mark.expires_at() {
        Some(exp) => println!("  Expires: {}", secs_to_rfc3339(exp)),
        None => println!("  Expires: never"),
    }
    println!();
    match verification.failure_reason {
        None => println!("  Status: VALID"),
        Some(reason) => println!("  Status: INVALID ({reason})"),
    }

    if verification.is_valid {
        Ok(())
    } else {
        Err(anyhow!("trust mark is invalid"))
    }
}

fn print_verification(
    is_valid: bool,
    reason: Option<openid_federation::FailureReason>,
    failed_at: Option<usize>,
) {
    if is_valid {
        println!("  Status:   VALID");
        return;
    }
    let reason = reason.map(|r| r.to_string()).unwrap_or_else(|| "unknown".into());
    match failed_at {
        Some(i) => println!("  Status:   INVALID ({reason} at element {i})"),
        None => println!("  Status:   INVALID ({reason})"),
    }
}

fn print_statement(statement: &EntityStatement) -> Result<()> {
    println!("Entity Configuration: {}", statement.subject());
    println!("  Issuer:   {}", statement.issuer());
    println!("  Issued:   {}", secs_to_rfc3339(statement.issued_at()));
    println!("  Expires:  {}", secs_to_rfc3339(statement.expires_at()));
    println!("  Key ID:   {}", statement.key_id().unwrap_or("-"));
    println!("  Alg:      {}", statement.algorithm());

    if statement.authority_hints().is_empty() {
        println!("  Authority Hints: none");
    } else {
        println!("  Authority Hints:");
        for hint in statement.authority_hints() {
            println!("    - {hint}");
        }
    }

    let marks: Vec<&str> = statement.trust_mark_tokens().collect();
    if !marks.is_empty() {
        println!("  Trust Marks: {}", marks.len());
    }

    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(statement.claims()).context("failed to render claims")?
    );
    Ok(())
}

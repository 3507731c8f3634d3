//! capmint daemon: entry point for running the minting gateway.

use anyhow::Context;
use capmint_crypto::{derive_identity, generate_keypair, keypair_from_hex};
use capmint_gateway::{GatewayConfig, MintGateway, ShutdownController};
use capmint_ledger::RpcLedgerClient;
use capmint_rpc::{AppState, GatewayMetrics, RpcServer};
use capmint_utils::{format_duration, init_logging, LogFormat};
use capmint_verification::OracleClient;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "capmint-daemon", about = "Guarded minting gateway daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CAPMINT_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Settings that override the config file when given.
#[derive(clap::Args, Default)]
struct Overrides {
    /// Address the HTTP server binds to.
    #[arg(long, env = "CAPMINT_LISTEN_ADDR")]
    listen_addr: Option<SocketAddr>,

    /// JSON-RPC endpoint of the ledger network.
    #[arg(long, env = "CAPMINT_LEDGER_URL")]
    ledger_url: Option<String>,

    /// Token contract address.
    #[arg(long, env = "CAPMINT_CONTRACT")]
    contract: Option<String>,

    /// Raw units minted per accepted request.
    #[arg(long, env = "CAPMINT_MINT_AMOUNT")]
    mint_amount: Option<String>,

    /// Ed25519 signing key (64 hex characters).
    #[arg(long, env = "CAPMINT_SIGNING_KEY", hide_env_values = true)]
    signing_key: Option<String>,

    /// Siteverify endpoint of the verification oracle.
    #[arg(long, env = "CAPMINT_VERIFIER_URL")]
    verifier_url: Option<String>,

    /// Secret shared with the verification oracle.
    #[arg(long, env = "CAPMINT_VERIFIER_SECRET", hide_env_values = true)]
    verifier_secret: Option<String>,

    /// Site key the oracle binds tokens to.
    #[arg(long, env = "CAPMINT_VERIFIER_SITE_KEY")]
    verifier_site_key: Option<String>,

    /// Verification round-trip timeout in milliseconds.
    #[arg(long, env = "CAPMINT_VERIFIER_TIMEOUT_MS")]
    verifier_timeout_ms: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CAPMINT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CAPMINT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Serve Prometheus metrics on /metrics.
    #[arg(long, env = "CAPMINT_ENABLE_METRICS")]
    enable_metrics: Option<bool>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the gateway.
    Run,
    /// Generate a fresh signing key and print it with its identity.
    Keygen,
    /// Print the ledger identity of the configured signing key.
    Identity,
}

impl Overrides {
    fn apply(self, config: &mut GatewayConfig) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        fn set_some<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut config.listen_addr, self.listen_addr);
        set(&mut config.ledger_url, self.ledger_url);
        set_some(&mut config.contract, self.contract);
        set_some(&mut config.mint_amount, self.mint_amount);
        set_some(&mut config.signing_key_hex, self.signing_key);
        set(&mut config.verifier_url, self.verifier_url);
        set_some(&mut config.verifier_secret, self.verifier_secret);
        set_some(&mut config.verifier_site_key, self.verifier_site_key);
        set(&mut config.verifier_timeout_ms, self.verifier_timeout_ms);
        set(&mut config.log_format, self.log_format);
        set(&mut config.log_level, self.log_level);
        set(&mut config.enable_metrics, self.enable_metrics);
    }
}

fn load_config(path: Option<&PathBuf>, overrides: Overrides) -> anyhow::Result<GatewayConfig> {
    let mut config = match path {
        Some(path) => GatewayConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("loading {}", path.display()))?,
        None => GatewayConfig::default(),
    };
    overrides.apply(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref(), cli.overrides)?;

    match cli.command {
        Command::Run => {
            init_logging(config.log_format, &config.log_level);
            if let Some(path) = &cli.config {
                tracing::info!("loaded config from {}", path.display());
            }
            run(config).await
        }
        Command::Keygen => {
            let keypair = generate_keypair()?;
            println!("signing_key_hex = \"{}\"", keypair.private.to_hex());
            println!("# identity: {}", derive_identity(&keypair.public));
            Ok(())
        }
        Command::Identity => {
            let key = config
                .signing_key_hex
                .as_deref()
                .context("no signing key configured (signing_key_hex / CAPMINT_SIGNING_KEY)")?;
            let keypair = keypair_from_hex(key)?;
            println!("{}", derive_identity(&keypair.public));
            Ok(())
        }
    }
}

async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let started = Instant::now();
    let settings = config.validate().context("invalid configuration")?;
    tracing::debug!(?settings, "configuration validated");

    let mut oracle = OracleClient::with_timeout(
        settings.verifier_url.clone(),
        settings.verifier_secret.clone(),
        settings.verifier_timeout,
    );
    if let Some(site_key) = &settings.verifier_site_key {
        oracle = oracle.with_site_key(site_key.clone());
    }
    let ledger = Arc::new(RpcLedgerClient::new(settings.ledger_url.clone()));

    tracing::info!(
        identity = %settings.identity,
        contract = %settings.contract,
        amount = %settings.mint_amount,
        ledger = %settings.ledger_url,
        "starting capmint gateway"
    );

    let gateway = MintGateway::connect(
        Arc::new(oracle),
        ledger.clone(),
        settings.keypair,
        settings.contract,
        settings.mint_amount,
    )
    .await
    .context("reading the signer's sequence number from the ledger")?
    .with_verify_timeout(settings.verifier_timeout);

    let metrics = if settings.enable_metrics {
        Some(Arc::new(GatewayMetrics::new()?))
    } else {
        None
    };

    let state = AppState {
        gateway: Arc::new(gateway),
        token: ledger,
        metrics,
    };

    let shutdown = Arc::new(ShutdownController::new());
    let server = RpcServer::new(settings.listen_addr, state.clone());
    let server_task = tokio::spawn(server.start(shutdown.subscribe()));

    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move { shutdown.wait_for_signal().await });
    }

    server_task.await??;

    let signer = state.gateway.signer();
    tracing::info!(
        dispatched = signer.dispatched_count(),
        released = signer.released_count(),
        next_sequence = %signer.current().await,
        uptime = %format_duration(started.elapsed()),
        "capmint gateway stopped"
    );
    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use lbc_client::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "lbc-client")]
#[command(about = "Submit signed transactions to and query the LBC ledger", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "LBC_CONFIG")]
    config: Option<PathBuf>,

    /// CometBFT RPC URL [default: http://localhost:26657]
    #[arg(long, global = true, env = "LBC_RPC_URL")]
    rpc: Option<String>,

    /// Directory holding ed25519.key / ed25519.pub [default: ./config]
    #[arg(long, global = true, env = "LBC_KEY_DIR")]
    key_dir: Option<PathBuf>,

    /// Per-request timeout in seconds [default: 30]
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Extra HTTP header for every RPC request (repeatable)
    #[arg(long = "header", global = true, value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an identity, create a beneficiary, or create a promise with its commitment
    Send(SendArgs),
    /// Query ledger state with abci_query
    Get(GetArgs),
}

#[derive(Args)]
struct SendArgs {
    /// Register the local key as a commiter with this name
    #[arg(long, default_value = "")]
    name: String,

    /// Create a beneficiary with this name
    #[arg(long, default_value = "")]
    beneficiary_name: String,

    /// Promise text
    #[arg(long, default_value = "")]
    text: String,

    /// Promise due (YYYY-MM-DD or RFC3339)
    #[arg(long, default_value = "")]
    due: String,

    /// Beneficiary ID the promise is made to
    #[arg(long, default_value = "")]
    beneficiary_id: String,

    /// Optional parent promise ID
    #[arg(long, default_value = "")]
    parent_id: String,

    /// Commitment due (YYYY-MM-DD or RFC3339)
    #[arg(long, default_value = "")]
    commitment_due: String,
}

#[derive(Args)]
struct GetArgs {
    /// ABCI path (e.g. /list/promise)
    #[arg(long, default_value = "")]
    path: String,

    /// Entity alias: promise | commitment | commiter | beneficiary
    #[arg(long, default_value = "")]
    list: String,

    /// Optional key/arg (sent as base64)
    #[arg(long, default_value = "")]
    data: String,

    /// Block height
    #[arg(long, default_value = "")]
    height: String,

    /// Print the abci_query response as JSON (takes precedence over --value)
    #[arg(long)]
    raw_json: bool,

    /// Decode response.value and print it (default)
    #[arg(long)]
    value: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = %e.kind(), "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("lbc_client={level}"))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Merge file configuration with command-line overrides.
fn load_config(cli: &Cli) -> LbcResult<ClientConfig> {
    let mut config = ClientConfig::load_or_default(cli.config.as_deref())?;
    if let Some(rpc) = &cli.rpc {
        config.rpc_url = rpc.clone();
    }
    if let Some(dir) = &cli.key_dir {
        config.key_dir = dir.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    for header in &cli.headers {
        let (name, value) = header.split_once(':').ok_or_else(|| {
            LbcError::InvalidInput(format!("--header expects NAME:VALUE, got '{header}'"))
        })?;
        config
            .headers
            .insert(name.trim().to_string(), value.trim().to_string());
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> LbcResult<()> {
    let config = load_config(&cli)?;
    let client = LbcClient::from_config(&config)?;

    match cli.command {
        Commands::Send(args) => send(&client, args).await,
        Commands::Get(args) => get(&client, args).await,
    }
}

async fn send(client: &LbcClient, args: SendArgs) -> LbcResult<()> {
    if !args.name.is_empty() {
        client.register_commiter(&args.name).await?;
        println!("Commiter registered");
        return Ok(());
    }
    if !args.beneficiary_name.is_empty() {
        let receipt = client.create_beneficiary(&args.beneficiary_name).await?;
        println!("Beneficiary created: {}", receipt.payload.id);
        return Ok(());
    }

    if args.text.is_empty()
        || args.due.is_empty()
        || args.beneficiary_id.is_empty()
        || args.commitment_due.is_empty()
    {
        return Err(LbcError::InvalidInput(
            "for promise+commitment pass --text, --due, --beneficiary-id, --commitment-due"
                .to_string(),
        ));
    }
    let mut promise =
        CreatePromiseArgs::new(args.text, args.due, args.beneficiary_id, args.commitment_due);
    if !args.parent_id.is_empty() {
        promise = promise.with_parent(args.parent_id);
    }
    let receipt = client.create_promise_with_commitment(&promise).await?;
    println!("Promise+Commitment created atomically");
    println!("  promise:    {}", receipt.payload.promise.id);
    println!("  commitment: {}", receipt.payload.commitment.id);
    Ok(())
}

async fn get(client: &LbcClient, args: GetArgs) -> LbcResult<()> {
    let request = QueryRequest::resolve(Some(args.path.as_str()), Some(args.list.as_str()))?
        .with_data(args.data)
        .with_height(args.height);

    let response = client.query(&request).await?;

    tracing::debug!(raw_json = args.raw_json, value = args.value, "query output mode");
    if args.raw_json {
        let out = serde_json::to_string_pretty(&response)
            .map_err(|e| LbcError::Encoding(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    let view = QueryView::decode(response.response().and_then(|r| r.value.as_deref()))?;
    println!("{view}");
    Ok(())
}

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use coursehub_net::prelude::*;

#[derive(Debug, Parser)]
#[command(
    name = "coursehub-keyctl",
    about = "Canonical key and routing inspection for coursehub API calls."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the canonical key of a request shape.
    Key(RequestArgs),
    /// Print whether a call would go to the trusted or the local base.
    Route(RouteArgs),
}

#[derive(Debug, Args)]
struct RequestArgs {
    #[arg(long, default_value = "get")]
    method: ApiMethod,

    #[arg(long)]
    endpoint: String,

    /// Request options as a JSON object, e.g. '{"filter":{"id":1}}'.
    #[arg(long, value_name = "JSON")]
    options: Option<String>,

    /// Defaults to `local_port` from the coursehub config.
    #[arg(long)]
    local_port: Option<u16>,

    /// Defaults to `key_scheme` from the coursehub config.
    #[arg(long, value_enum)]
    scheme: Option<SchemeArg>,
}

#[derive(Debug, Args)]
struct RouteArgs {
    #[command(flatten)]
    request: RequestArgs,

    /// Defaults to `tokens_path` from the coursehub config.
    #[arg(long, value_name = "FILE")]
    tokens: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum SchemeArg {
    Wide,
    Legacy,
}

impl From<SchemeArg> for KeyScheme {
    fn from(value: SchemeArg) -> Self {
        match value {
            SchemeArg::Wide => KeyScheme::Wide,
            SchemeArg::Legacy => KeyScheme::Legacy,
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = ApiConfig::read().context("read coursehub config")?;
    match cli.command {
        Command::Key(args) => {
            let key = compute_key(&args, &config)?;
            println!("{key}");
        }
        Command::Route(args) => {
            let key = compute_key(&args.request, &config)?;
            let path = args
                .tokens
                .or_else(|| config.tokens_path.clone())
                .context("no token table: pass --tokens or set tokens_path")?;
            let tokens = TokenTable::from_path(&path)
                .with_context(|| format!("load token table {}", path.display()))?;
            match tokens.get(&key) {
                Some(_) => println!("trusted {key}"),
                None => println!("local {key}"),
            }
        }
    }
    Ok(())
}

fn compute_key(args: &RequestArgs, config: &ApiConfig) -> anyhow::Result<CanonicalKey> {
    let options: RequestOptions = match args.options.as_deref() {
        Some(raw) => serde_json::from_str(raw).context("parse --options JSON")?,
        None => RequestOptions::default(),
    };
    let (method, endpoint) = match args.method {
        ApiMethod::Sql => (ApiMethod::Sql, sql_endpoint(&args.endpoint)),
        other => (other, args.endpoint.clone()),
    };
    let local_port = args.local_port.unwrap_or(config.local_port);
    let scheme = args.scheme.map(KeyScheme::from).unwrap_or(config.key_scheme);
    let local_base = ApiConfig::new("keyctl", "http://localhost", local_port).local_base()?;
    let key =
        coursehub_net::key::canonical_key(scheme, method, &local_base, &endpoint, &options)?;
    Ok(key)
}

fn init_tracing() {
    if tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish(),
    )
    .is_err()
    {
        // Subscriber already installed.
    }
}

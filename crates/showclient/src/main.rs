//! show-client entry point.
//!
//! Runs one show query against the local switch databases and prints the
//! JSON payload on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sonic_showclient::{
    DEFAULT_CONFIG_PATH, DataSource, DbId, LocalHostFs, MemoryDataSource, OptionMap,
    RedisDataSource, ShowClientConfig, ShowContext, ShowError, ShowRouter,
};

/// SONiC interface show client
#[derive(Parser, Debug)]
#[command(name = "show-client")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults apply when absent)
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Redis server host
    #[arg(long)]
    redis_host: Option<String>,

    /// Redis server port
    #[arg(long)]
    redis_port: Option<u16>,

    /// Serve a database from a JSON dump instead of Redis (DB_NAME=path)
    #[arg(long = "dump", value_name = "DB=PATH")]
    dumps: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Request option (key=value), repeatable
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Show path, e.g. `interface counters`
    #[arg(required = true)]
    path: Vec<String>,
}

/// Initialize tracing/logging.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already installed");
    }
}

fn load_dumps(dumps: &[String]) -> anyhow::Result<MemoryDataSource> {
    let store = MemoryDataSource::new();
    for entry in dumps {
        let Some((db_name, path)) = entry.split_once('=') else {
            bail!("invalid --dump '{}', expected DB_NAME=path", entry);
        };
        let db = DbId::from_name(db_name)
            .with_context(|| format!("unknown database '{}'", db_name))?;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dump {}", path))?;
        let rows = store.load_json(db, &text)?;
        info!(db = db.name(), rows, path, "loaded database dump");
    }
    Ok(store)
}

async fn run(args: Args, cancel: CancellationToken) -> anyhow::Result<Vec<u8>> {
    let mut config = ShowClientConfig::load_or_default(&args.config)?;
    if let Some(host) = args.redis_host {
        config.database.redis_host = host;
    }
    if let Some(port) = args.redis_port {
        config.database.redis_port = port;
    }
    config.validate()?;

    init_logging(args.log_level.as_deref().unwrap_or(&config.logging.level));
    debug!(?config, "configuration loaded");

    let db: Arc<dyn DataSource> = if args.dumps.is_empty() {
        let redis = RedisDataSource::connect(&config.database).await?;
        info!(host = redis.host(), port = redis.port(), "connected to redis");
        Arc::new(redis)
    } else {
        Arc::new(load_dumps(&args.dumps)?)
    };

    let options = OptionMap::from_pairs(&args.options)?;
    let router = ShowRouter::new(ShowContext::new(db, Arc::new(LocalHostFs), config));
    Ok(router.handle_with_cancel(args.path.as_slice(), &options, &cancel).await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling request");
            on_signal.cancel();
        }
    });

    match run(args, cancel).await {
        Ok(payload) => {
            println!("{}", String::from_utf8_lossy(&payload));
            ExitCode::SUCCESS
        }
        Err(e) => {
            let code = e
                .downcast_ref::<ShowError>()
                .map(ShowError::status_code)
                .unwrap_or("INTERNAL");
            eprintln!("{}: {:#}", code, e);
            ExitCode::FAILURE
        }
    }
}

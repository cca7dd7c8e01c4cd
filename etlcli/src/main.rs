use anyhow::Result;
use clap::Parser;
use etlcli::EtlCliApp;
use etlpipe_core::Conf;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "etlcli")]
#[command(about = "Fetch users and posts, load them into SQLite and run example queries")]
#[command(version)]
struct Cli {
    /// JSON config file (defaults to config.json in the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// API base URL serving /users and /posts
    #[arg(long)]
    api_base: Option<String>,

    /// SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Do not touch the network; load the built-in samples
    #[arg(long)]
    offline: bool,

    /// Print the run summary (origins, counts, report) as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging (RUST_LOG still wins)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut conf = Conf::load(cli.config.as_deref())?;
    if let Some(api_base) = cli.api_base {
        conf.api_base = api_base;
    }
    if let Some(db) = cli.db {
        conf.db_path = db;
    }
    if let Some(timeout) = cli.timeout {
        conf.http_timeout_secs = timeout;
    }
    conf.validate()?;

    let app = EtlCliApp::new(conf).offline(cli.offline).json(cli.json);
    app.run()?;

    Ok(())
}

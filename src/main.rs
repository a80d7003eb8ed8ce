use app_factory::app::{self, AppError};
use app_factory::config::{Config, ConfigError, Overrides};
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

/// Environment variable overriding the working directory.
const WORKING_DIR_VAR: &str = "APP_WORKING_DIR";

/// Command-line options. Everything else comes from the environment.
#[derive(Debug, Default)]
struct Options {
    config_path: Option<PathBuf>,
    bind: Option<String>,
}

fn parse_options() -> Options {
    let mut options = Options::default();
    for arg in env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--config=") {
            options.config_path = Some(PathBuf::from(path));
        } else if let Some(addr) = arg.strip_prefix("--bind=") {
            options.bind = Some(addr.to_string());
        }
    }
    options
}

fn working_dir() -> Result<PathBuf, ConfigError> {
    match env::var_os(WORKING_DIR_VAR) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => env::current_dir().map_err(ConfigError::Provision),
    }
}

fn load_config(options: &Options, working_dir: &Path) -> Result<Config, ConfigError> {
    let mut config = Config::from_env(working_dir)?;

    let mut overrides = match &options.config_path {
        Some(path) => Overrides::load(path)?,
        None => Overrides::default(),
    };
    if let Some(bind) = &options.bind {
        overrides.server.get_or_insert_with(Default::default).bind = Some(bind.clone());
    }
    config.apply(&overrides)?;

    Ok(config)
}

async fn run() -> Result<(), AppError> {
    let options = parse_options();
    let working_dir = working_dir()?;
    let config = load_config(&options, &working_dir)?;

    let (app, _log_guard) = app::bootstrap(config).await?;
    info!(working_dir = %working_dir.display(), "Application bootstrapped");

    let result = app.serve().await;
    if let Err(ref e) = result {
        error!(error = %e, "Server error");
    }
    result
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        eprintln!("Failed to start application: {}", e);
        process::exit(1);
    }
}

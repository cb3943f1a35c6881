use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use grimoire::cli;
use grimoire::config::AppConfig;

fn main() -> ExitCode {
    // Diagnostics go to stderr only; stdout is reserved for command
    // output (including the play --json event stream).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("{} v{} starting", grimoire::NAME, grimoire::VERSION);

    let config = AppConfig::load();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match cli::run(&config, &args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(cli::EXIT_FAILURE)
        }
    }
}

use clap::Parser;
use tracing::error;

use tote::cli::Cli;
use tote::infrastructure::config::Config;

fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.init_logging();

    if let Err(e) = cli.run(&config) {
        error!(error = %e, "command failed");
        eprintln!("✗ {e}");
        std::process::exit(1);
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "cardcalc",
    about = "Debt payoff planning and rewards valuation API"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, help = "JSON file mapping rewards programs to cents-per-point rates")]
        rates: PathBuf,
        #[arg(long, help = "JSON file holding the card catalog")]
        catalog: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve {
            port,
            rates,
            catalog,
        } => {
            let config = match cardcalc::api::load_engine_config(&rates, &catalog) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    std::process::exit(1);
                }
            };
            if let Err(e) = cardcalc::api::run_http_server(port, config).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
    }
}

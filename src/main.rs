//! funChat - client da terminale per il server Fun Chat

use funchat::{App, Config};
use tokio::io::{BufReader, stdin};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Inizializza il logging su stderr: stdout è riservato alle view
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "funchat=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Carica la configurazione da .env e variabili d'ambiente
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    config.log_info();

    let app = App::new(config, std::io::stdout());
    match app.run(BufReader::new(stdin())).await {
        Ok(_) => info!("Bye"),
        Err(e) => {
            error!("Client terminated with error: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

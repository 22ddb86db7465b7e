// Entrypoint for the budget tracker client.
// - Keeps `main` small: load config, build the session and API client,
//   hand them to the UI loop.
// - Any failure that escapes the loop is logged and the process still
//   exits with status 0.

use budget_tracker_cli::{
    api::ApiClient,
    config::{ClientConfig, DEFAULT_CONFIG_FILE},
    session::Session,
    transport::HttpTransport,
    ui::main_menu,
};
use dialoguer::Input;
use std::path::Path;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn run() -> anyhow::Result<()> {
    println!("** Welcome to Budget Tracker Client **");

    let config = ClientConfig::load(Path::new(DEFAULT_CONFIG_FILE))?;
    let mut session = Session::load(&config, || {
        Ok(Input::<String>::new()
            .with_prompt("Enter the base URL for your API")
            .interact_text()?)
    })?;

    let transport = HttpTransport::new(config.timeout)?;
    let api = ApiClient::new(transport, ".");
    main_menu(&api, &mut session, &config)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        error!("Error in main: {e:#}");
    }
}

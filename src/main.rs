mod api;
mod app;
mod cli;
mod commands;
mod config;
mod conversation;
mod core;
mod display;
mod input;
mod settings;

use crate::api::client::QueryClient;
use crate::app::Application;
use crate::cli::Args;
use crate::commands::create_command_registry;
use crate::config::Config;
use crate::core::error::ObchatError;
use crate::settings::SettingsStore;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ObchatError> {
    // Quiet by default so log lines don't interleave with the chat UI.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("obchat=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(url) = &args.backend_url {
        config.backend_url = url.clone();
    }

    let settings = SettingsStore::load(Config::settings_path());
    let backend = QueryClient::new(&config)?;
    let command_dispatcher = create_command_registry();

    let mut app = Application::new(
        args,
        config,
        Box::new(backend),
        settings,
        command_dispatcher,
    )?;
    app.run().await
}

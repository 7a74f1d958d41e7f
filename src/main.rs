use std::sync::Arc;

use clap::Parser;
use log::info;
use tokio::sync::Mutex;

use panelnotes::{App, AutosaveRuntime, Cli, Config, FileStore, NoteRepository, Result};

pub fn initialize_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    initialize_logger();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    let store = Arc::new(FileStore::new(config.data_dir.clone())?);
    let mut repository = NoteRepository::new(store);
    repository.initialize().await?;
    let repository = Arc::new(Mutex::new(repository));

    let mut autosave = AutosaveRuntime::new(config.autosave_debounce_ms);
    autosave.set_repository(&repository);
    autosave.start()?;

    let app = App::new(Arc::clone(&repository), autosave, config, cli.verbose);
    app.run(cli.command).await?;
    app.shutdown().await?;

    info!("Session closed");
    Ok(())
}

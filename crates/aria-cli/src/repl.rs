//! Text REPL over the engine: one line in, zero or more lines out.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use aria_engine::{Collaborators, Disposition, Engine};
use aria_location::LocationResolver;
use aria_providers::HttpGeoIpProvider;
use aria_store::{Database, LocationStore};

use crate::config::AppConfig;

/// Build the engine from config and serve stdin until the user exits.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let db = Database::open_and_migrate(config.database_path.clone())
        .await
        .context("opening database")?;
    let resolver = LocationResolver::new(LocationStore::new(db), Arc::new(HttpGeoIpProvider::new()));

    // Geolocation needs no credentials and is always live; everything else
    // stays a self-describing stub until its integration is wired up.
    let providers = Collaborators::unconfigured();
    let engine = Engine::new(config.engine.clone(), providers, resolver);

    info!(user_id = %config.user_id, "ready; say a wake word to begin");
    println!("Aria is listening. Say a wake word (try 'hey aria'), or 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush().ok();
        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            break;
        };

        let response = engine.handle(&config.user_id, &line).await;
        for spoken in &response.lines {
            println!("aria> {spoken}");
        }
        match response.disposition {
            Disposition::Shutdown => break,
            Disposition::Continue | Disposition::Silent => {}
        }
    }

    info!("shutting down");
    Ok(())
}

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use splitledger::config::AppConfig;
use splitledger::routes::{self, AppState};
use splitledger::store::Store;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "splitledger=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    info!(backend = ?config.storage.backend, "opening ledger storage");
    let store = Store::connect(&config.storage).await?;
    info!(
        split_policy = ?config.ledger.split_policy,
        match_order = ?config.ledger.match_order,
        "storage ready"
    );

    let state = web::Data::new(AppState {
        store,
        ledger: config.ledger,
    });

    let address = (config.server.host.clone(), config.server.port);
    info!(host = %address.0, port = address.1, "listening");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(address)?
    .run()
    .await?;
    Ok(())
}

mod admin;
mod catalog;
mod config;
mod db;
mod decimal;
mod defaults;
mod entities;
mod error;
mod identifier;
mod merge;
mod models;
mod resolver;
mod routes;
mod store;
mod strapi;
mod tmdb;

use std::{sync::Arc, time::Duration};

use crate::{
    config::{Config, RecordBackend},
    defaults::StaticDefaults,
    store::{MovieStore, RecordSource},
    strapi::StrapiClient,
    tmdb::{ImageUrls, MetadataSource, TmdbClient},
};

pub struct AppState {
    pub config: Arc<Config>,
    /// CRUD always goes through the database.
    pub store: MovieStore,
    /// The display path reads from whichever backend is configured.
    pub records: Arc<dyn RecordSource>,
    pub tmdb: Arc<dyn MetadataSource>,
    pub defaults: StaticDefaults,
    pub images: ImageUrls,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,boxoffice=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("boxoffice/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url, config.db_pool_max).await?;
    let store = MovieStore::new(db);

    let records: Arc<dyn RecordSource> = match config.record_backend {
        RecordBackend::Database => Arc::new(store.clone()),
        RecordBackend::Strapi => {
            tracing::info!(base_url = %config.strapi_base_url, "display records come from Strapi");
            Arc::new(StrapiClient::new(http.clone(), config.strapi_base_url.clone()))
        },
    };

    let tmdb = TmdbClient::new(
        http,
        config.tmdb_access_token.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        records,
        tmdb: Arc::new(tmdb),
        defaults: StaticDefaults::default(),
        images: ImageUrls::new(config.tmdb_image_base_url.clone()),
    });

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

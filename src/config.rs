use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordBackend {
    Database,
    Strapi,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub db_pool_max: u32,
    pub tmdb_access_token: String,
    pub tmdb_base_url: String,
    pub tmdb_image_base_url: String,
    pub tmdb_rps: u32,
    pub max_concurrent: usize,
    pub record_backend: RecordBackend,
    pub strapi_base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://boxoffice.db?mode=rwc".to_string());

        let db_pool_max: u32 =
            std::env::var("DB_POOL_MAX").ok().and_then(|s| s.parse().ok()).unwrap_or(10);

        let tmdb_access_token = std::env::var("TMDB_ACCESS_TOKEN").unwrap_or_default();
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());
        let tmdb_image_base_url = std::env::var("TMDB_IMAGE_BASE_URL")
            .unwrap_or_else(|_| "https://image.tmdb.org/t/p".to_string());

        let tmdb_rps: u32 =
            std::env::var("TMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let max_concurrent: usize =
            std::env::var("MAX_CONCURRENT_REQUESTS").ok().and_then(|s| s.parse().ok()).unwrap_or(5);

        let record_backend = match std::env::var("RECORD_BACKEND").as_deref() {
            Ok("strapi") => RecordBackend::Strapi,
            Ok("database") | Err(_) => RecordBackend::Database,
            Ok(other) => anyhow::bail!("RECORD_BACKEND must be `database` or `strapi`, got `{other}`"),
        };
        let strapi_base_url = std::env::var("STRAPI_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:1337/api".to_string());

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            db_pool_max,
            tmdb_access_token,
            tmdb_base_url,
            tmdb_image_base_url,
            tmdb_rps,
            max_concurrent,
            record_backend,
            strapi_base_url,
        })
    }
}

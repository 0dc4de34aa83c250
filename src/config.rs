use anyhow::{Context, Result};

pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

pub struct DatabaseConfig {
    pub url: String,
}

pub struct ServerConfig {
    pub port: u16,
}

/// Load configuration from the environment. `DATABASE_URL` is mandatory,
/// `PORT` defaults to 3000.
pub fn load() -> Result<Config> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .context("PORT must be a valid port number")?;

    Ok(Config {
        database: DatabaseConfig { url },
        server: ServerConfig { port },
    })
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    /// Public origin used when building invite links.
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Server configuration
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        // Database configuration
        let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(val) => Some(
                val.parse()
                    .context("Failed to parse DATABASE_MAX_CONNECTIONS")?,
            ),
            Err(_) => Some(10),
        };
        let db_min_connections = match env::var("DATABASE_MIN_CONNECTIONS") {
            Ok(val) => Some(
                val.parse()
                    .context("Failed to parse DATABASE_MIN_CONNECTIONS")?,
            ),
            Err(_) => Some(1),
        };

        // App configuration
        let environment = env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .parse::<Environment>()
            .unwrap_or(Environment::Development);

        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "LMS Backend".to_string());
        let base_url =
            env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());

        Ok(Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections: db_max_connections,
                min_connections: db_min_connections,
            },
            app: AppConfig {
                name: app_name,
                environment,
                base_url,
            },
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    #[allow(unused)]
    pub fn is_production(&self) -> bool {
        self.app.environment == Environment::Production
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!(
            "Production".parse::<Environment>(),
            Ok(Environment::Production)
        );
        assert_eq!("staging".parse::<Environment>(), Ok(Environment::Staging));
        assert!("qa".parse::<Environment>().is_err());
    }
}

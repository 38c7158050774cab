/// Configuration management
///
/// Loads configuration from environment variables into a type-safe struct.
/// A `.env` file is honored in development via `dotenvy`.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool upper bound (default: 25)
/// - `DATABASE_MIN_CONNECTIONS`: idle connections kept warm (default: 5)
/// - `JWT_SECRET`: token signing secret, at least 32 bytes (required)
/// - `TOKEN_TTL_HOURS`: session token lifetime (default: 24)
///
/// # Example
///
/// ```no_run
/// use taskhub::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("pool size: {}", config.database.max_connections);
/// # Ok(())
/// # }
/// ```
use std::env;

use crate::db::pool::DatabaseConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database pool configuration
    pub database: DatabaseConfig,

    /// Token service configuration
    pub token: TokenConfig,
}

/// Token service configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret key for token signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Session token lifetime in hours
    pub ttl_hours: i64,
}

/// Minimum accepted signing secret length, in bytes
const MIN_SECRET_LEN: usize = 32;

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` or `JWT_SECRET` is missing, the
    /// secret is shorter than 32 bytes, or a numeric variable fails to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "25".to_string())
            .parse::<u32>()?;

        let min_connections = env::var("DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        let ttl_hours = env::var("TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse::<i64>()?;

        let config = Self {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                min_connections,
                ..Default::default()
            },
            token: TokenConfig { secret, ttl_hours },
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints that must hold before startup
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.token.secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {MIN_SECRET_LEN} bytes");
        }
        if self.token.ttl_hours <= 0 {
            anyhow::bail!("TOKEN_TTL_HOURS must be positive");
        }
        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "DATABASE_MIN_CONNECTIONS ({}) must not exceed DATABASE_MAX_CONNECTIONS ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }
        Ok(())
    }
}

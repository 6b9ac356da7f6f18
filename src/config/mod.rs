use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::authz::MatchMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub tokens: TokenConfig,
    pub authz: AuthzConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
    /// Default deadline applied to every store call
    pub statement_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    EdDsa,
    Rs256,
}

impl SigningAlgorithm {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "EDDSA" | "ED25519" => Some(SigningAlgorithm::EdDsa),
            "RS256" => Some(SigningAlgorithm::Rs256),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub ttl_minutes: i64,
    /// Constant `iss` claim stamped on every delegation token
    pub issuer: String,
    pub algorithm: SigningAlgorithm,
    pub private_key_path: Option<PathBuf>,
    pub public_key_path: Option<PathBuf>,
    /// Permit a process-local keypair when no key paths are set
    pub allow_ephemeral_keys: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthzConfig {
    pub pattern_match: MatchMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

/// Longest delegation token lifetime accepted from configuration (one week)
pub const MAX_TTL_MINUTES: i64 = 7 * 24 * 60;

impl TokenConfig {
    pub fn valid_ttl(ttl_minutes: i64) -> bool {
        (1..=MAX_TTL_MINUTES).contains(&ttl_minutes)
    }
}

impl DatabaseConfig {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `get`
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match get("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides(get)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    fn with_env_overrides<F>(mut self, get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Database overrides
        if let Some(v) = get("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = get("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = get("DATABASE_STATEMENT_TIMEOUT_MS") {
            self.database.statement_timeout_ms = v.parse().unwrap_or(self.database.statement_timeout_ms);
        }

        // Token overrides
        if let Some(v) = get("TOKEN_TTL_MINUTES") {
            self.tokens.ttl_minutes = v
                .parse()
                .ok()
                .filter(|ttl| TokenConfig::valid_ttl(*ttl))
                .unwrap_or(self.tokens.ttl_minutes);
        }
        if let Some(v) = get("TOKEN_ISSUER") {
            if !v.trim().is_empty() {
                self.tokens.issuer = v.trim().to_string();
            }
        }
        if let Some(v) = get("TOKEN_ALGORITHM") {
            self.tokens.algorithm = SigningAlgorithm::parse(&v).unwrap_or(self.tokens.algorithm);
        }
        if let Some(v) = get("TOKEN_PRIVATE_KEY_PATH") {
            self.tokens.private_key_path = non_empty_path(&v);
        }
        if let Some(v) = get("TOKEN_PUBLIC_KEY_PATH") {
            self.tokens.public_key_path = non_empty_path(&v);
        }
        // Never let an env var turn on throwaway keys in production
        if let Some(v) = get("TOKEN_ALLOW_EPHEMERAL_KEYS") {
            if self.environment != Environment::Production {
                self.tokens.allow_ephemeral_keys = v.parse().unwrap_or(self.tokens.allow_ephemeral_keys);
            }
        }

        // Authorization overrides
        if let Some(v) = get("AUTHZ_PATTERN_MATCH") {
            self.authz.pattern_match = MatchMode::parse(&v).unwrap_or(self.authz.pattern_match);
        }

        // API overrides
        if let Some(port) = get("API_PORT")
            .or_else(|| get("PORT"))
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Some(v) = get("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                statement_timeout_ms: 5_000,
            },
            tokens: TokenConfig {
                ttl_minutes: 60,
                issuer: "tenant-iam".to_string(),
                algorithm: SigningAlgorithm::EdDsa,
                private_key_path: None,
                public_key_path: None,
                allow_ephemeral_keys: true,
            },
            authz: AuthzConfig {
                pattern_match: MatchMode::AnchoredPrefix,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                statement_timeout_ms: 3_000,
            },
            tokens: TokenConfig {
                ttl_minutes: 30,
                issuer: "tenant-iam".to_string(),
                algorithm: SigningAlgorithm::EdDsa,
                private_key_path: None,
                public_key_path: None,
                allow_ephemeral_keys: false,
            },
            authz: AuthzConfig {
                pattern_match: MatchMode::AnchoredPrefix,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                statement_timeout_ms: 2_000,
            },
            tokens: TokenConfig {
                ttl_minutes: 15,
                issuer: "tenant-iam".to_string(),
                algorithm: SigningAlgorithm::EdDsa,
                private_key_path: None,
                public_key_path: None,
                allow_ephemeral_keys: false,
            },
            authz: AuthzConfig {
                pattern_match: MatchMode::AnchoredPrefix,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
        }
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

// Application configuration loaded from environment variables

use std::fmt;

use thiserror::Error;

/// Minimum accepted length of the HMAC signing secret, in bytes
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// JWT issuance settings
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in minutes
    pub ttl_minutes: i64,
    pub issuer: String,
}

impl JwtConfig {
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_minutes.saturating_mul(60)
    }
}

// The secret stays out of logs.
impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_minutes", &self.ttl_minutes)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Initial account created on startup when it does not exist yet
#[derive(Clone)]
pub struct SeedUser {
    pub name: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUser")
            .field("name", &self.name)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub seed_user: Option<SeedUser>,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => 8080,
        };

        let secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_JWT_SECRET_LENGTH),
            });
        }

        let ttl_minutes = match get("JWT_TTL") {
            Some(raw) => raw.parse::<i64>().map_err(|e| ConfigError::Invalid {
                name: "JWT_TTL",
                reason: e.to_string(),
            })?,
            None => 60,
        };
        if ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_TTL",
                reason: "must be greater than zero".to_string(),
            });
        }
        if ttl_minutes.checked_mul(60).is_none() {
            return Err(ConfigError::Invalid {
                name: "JWT_TTL",
                reason: "too large".to_string(),
            });
        }

        let issuer = get("JWT_ISSUER").unwrap_or_else(|| "auth-api".to_string());

        let seed_user = match (get("SEED_USER_USERNAME"), get("SEED_USER_PASSWORD")) {
            (Some(username), Some(password)) => Some(SeedUser {
                name: get("SEED_USER_NAME").unwrap_or_else(|| username.clone()),
                username,
                password,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("SEED_USER_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("SEED_USER_USERNAME")),
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt: JwtConfig {
                secret,
                ttl_minutes,
                issuer,
            },
            seed_user,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/auth"), ("JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.jwt.ttl_minutes, 60);
        assert_eq!(config.jwt.ttl_seconds(), 3600);
        assert_eq!(config.jwt.issuer, "auth-api");
        assert!(config.seed_user.is_none());
    }

    #[test]
    fn test_missing_required_values() {
        assert_eq!(
            load(&[("JWT_SECRET", SECRET)]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            load(&[("DATABASE_URL", "postgres://localhost/auth"), ("JWT_SECRET", "  ")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/auth"), ("JWT_SECRET", "short")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JWT_SECRET", .. }));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let base = [("DATABASE_URL", "postgres://localhost/auth"), ("JWT_SECRET", SECRET)];

        let mut vars = base.to_vec();
        vars.push(("PORT", "not-a-port"));
        assert!(matches!(load(&vars).unwrap_err(), ConfigError::Invalid { name: "PORT", .. }));

        let mut vars = base.to_vec();
        vars.push(("JWT_TTL", "0"));
        assert!(matches!(load(&vars).unwrap_err(), ConfigError::Invalid { name: "JWT_TTL", .. }));

        let mut vars = base.to_vec();
        vars.push(("JWT_TTL", "9223372036854775807"));
        assert!(matches!(load(&vars).unwrap_err(), ConfigError::Invalid { name: "JWT_TTL", .. }));
    }

    #[test]
    fn test_seed_user_requires_both_fields() {
        let base = [("DATABASE_URL", "postgres://localhost/auth"), ("JWT_SECRET", SECRET)];

        let mut vars = base.to_vec();
        vars.push(("SEED_USER_USERNAME", "admin"));
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("SEED_USER_PASSWORD"));

        vars.push(("SEED_USER_PASSWORD", "password123"));
        let seed = load(&vars).unwrap().seed_user.unwrap();
        assert_eq!(seed.username, "admin");
        assert_eq!(seed.name, "admin");
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/auth"),
            ("JWT_SECRET", SECRET),
            ("SEED_USER_USERNAME", "admin"),
            ("SEED_USER_PASSWORD", "hunter22"),
        ])
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains(SECRET));
        assert!(!debug.contains("hunter22"));
    }
}

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_db_host")]
    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    #[serde(default)]
    pub db_user: String,
    #[serde(default)]
    pub db_pass: String,
    #[serde(default)]
    pub db_name: String,
    /// Full connection string; takes precedence over the `db_*` parts.
    #[serde(default)]
    pub database_url: Option<String>,

    pub jwt_secret: String,
    #[serde(default = "default_jwt_alg")]
    pub jwt_alg: String,
    #[serde(default = "default_access_expires_min")]
    pub access_expires_min: i64,
    #[serde(default = "default_refresh_expires_days")]
    pub refresh_expires_days: i64,

    #[serde(default)]
    pub api_debug: bool,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default = "default_true")]
    pub scheduler_enabled: bool,
    #[serde(default = "default_reconcile_seconds")]
    pub scheduler_reconcile_seconds: u64,
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
    #[serde(default = "default_probe_retries")]
    pub probe_retries: u32,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
pub(crate) struct PartialServerConfig {
    db_host: Option<String>,
    db_port: Option<u16>,
    db_user: Option<String>,
    db_pass: Option<String>,
    db_name: Option<String>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    jwt_alg: Option<String>,
    access_expires_min: Option<i64>,
    refresh_expires_days: Option<i64>,
    api_debug: Option<bool>,
    bind_addr: Option<String>,
    log_dir: Option<String>,
    bcrypt_cost: Option<u32>,
    scheduler_enabled: Option<bool>,
    scheduler_reconcile_seconds: Option<u64>,
    max_concurrent_probes: Option<usize>,
    probe_retries: Option<u32>,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_jwt_alg() -> String {
    "HS256".to_string()
}

fn default_access_expires_min() -> i64 {
    15
}

fn default_refresh_expires_days() -> i64 {
    7
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_true() -> bool {
    true
}

fn default_reconcile_seconds() -> u64 {
    5
}

fn default_max_concurrent_probes() -> usize {
    32
}

fn default_probe_retries() -> u32 {
    1
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialServerConfig::default()
            }
        } else {
            PartialServerConfig::default()
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    pub(crate) fn merge(
        env_config: PartialServerConfig,
        file_config: PartialServerConfig,
    ) -> Result<Self, String> {
        let final_config = ServerConfig {
            db_host: env_config.db_host.or(file_config.db_host)
                .unwrap_or_else(default_db_host),
            db_port: env_config.db_port.or(file_config.db_port)
                .unwrap_or_else(default_db_port),
            db_user: env_config.db_user.or(file_config.db_user).unwrap_or_default(),
            db_pass: env_config.db_pass.or(file_config.db_pass).unwrap_or_default(),
            db_name: env_config.db_name.or(file_config.db_name).unwrap_or_default(),
            database_url: env_config.database_url.or(file_config.database_url),
            jwt_secret: env_config.jwt_secret.or(file_config.jwt_secret)
                .ok_or("JWT_SECRET is required")?,
            jwt_alg: env_config.jwt_alg.or(file_config.jwt_alg)
                .unwrap_or_else(default_jwt_alg),
            access_expires_min: env_config.access_expires_min.or(file_config.access_expires_min)
                .unwrap_or_else(default_access_expires_min),
            refresh_expires_days: env_config.refresh_expires_days.or(file_config.refresh_expires_days)
                .unwrap_or_else(default_refresh_expires_days),
            api_debug: env_config.api_debug.or(file_config.api_debug).unwrap_or(false),
            bind_addr: env_config.bind_addr.or(file_config.bind_addr)
                .unwrap_or_else(default_bind_addr),
            log_dir: env_config.log_dir.or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            bcrypt_cost: env_config.bcrypt_cost.or(file_config.bcrypt_cost)
                .unwrap_or_else(default_bcrypt_cost),
            scheduler_enabled: env_config.scheduler_enabled.or(file_config.scheduler_enabled)
                .unwrap_or(true),
            scheduler_reconcile_seconds: env_config.scheduler_reconcile_seconds
                .or(file_config.scheduler_reconcile_seconds)
                .unwrap_or_else(default_reconcile_seconds),
            max_concurrent_probes: env_config.max_concurrent_probes
                .or(file_config.max_concurrent_probes)
                .unwrap_or_else(default_max_concurrent_probes),
            probe_retries: env_config.probe_retries.or(file_config.probe_retries)
                .unwrap_or_else(default_probe_retries),
        };

        if final_config.database_url.is_none() && final_config.db_name.is_empty() {
            return Err("Either DATABASE_URL or DB_NAME must be set".to_string());
        }
        // Tokens are signed with the shared secret, so only HMAC algorithms work.
        match final_config.jwt_alg.parse::<jsonwebtoken::Algorithm>() {
            Ok(
                jsonwebtoken::Algorithm::HS256
                | jsonwebtoken::Algorithm::HS384
                | jsonwebtoken::Algorithm::HS512,
            ) => {}
            _ => return Err(format!("Unsupported JWT_ALG: {}", final_config.jwt_alg)),
        }

        Ok(final_config)
    }

    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.db_user, self.db_pass, self.db_host, self.db_port, self.db_name
            ),
        }
    }

    /// Defaults for everything except the secrets, used by tests and tooling.
    pub fn with_secret(jwt_secret: &str, database_url: &str) -> Result<Self, String> {
        let env = PartialServerConfig {
            jwt_secret: Some(jwt_secret.to_string()),
            database_url: Some(database_url.to_string()),
            ..Default::default()
        };
        Self::merge(env, PartialServerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_file() {
        let file: PartialServerConfig = toml::from_str(
            r#"
            jwt_secret = "from-file"
            db_name = "health"
            access_expires_min = 30
            "#,
        )
        .unwrap();
        let env = PartialServerConfig {
            jwt_secret: Some("from-env".to_string()),
            ..Default::default()
        };

        let config = ServerConfig::merge(env, file).unwrap();
        assert_eq!(config.jwt_secret, "from-env");
        assert_eq!(config.access_expires_min, 30);
        assert_eq!(config.refresh_expires_days, 7);
        assert_eq!(config.jwt_alg, "HS256");
        assert!(config.scheduler_enabled);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let env = PartialServerConfig {
            db_name: Some("health".to_string()),
            ..Default::default()
        };
        let err = ServerConfig::merge(env, PartialServerConfig::default()).unwrap_err();
        assert_eq!(err, "JWT_SECRET is required");
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let env = PartialServerConfig {
            jwt_secret: Some("s".to_string()),
            db_name: Some("health".to_string()),
            jwt_alg: Some("ROT13".to_string()),
            ..Default::default()
        };
        assert!(ServerConfig::merge(env, PartialServerConfig::default()).is_err());
    }

    #[test]
    fn only_hmac_algorithms_are_accepted() {
        let with_alg = |alg: &str| PartialServerConfig {
            jwt_secret: Some("s".to_string()),
            db_name: Some("health".to_string()),
            jwt_alg: Some(alg.to_string()),
            ..Default::default()
        };
        for alg in ["RS256", "ES256", "EdDSA"] {
            let err = ServerConfig::merge(with_alg(alg), PartialServerConfig::default()).unwrap_err();
            assert_eq!(err, format!("Unsupported JWT_ALG: {alg}"));
        }
        let config = ServerConfig::merge(with_alg("HS512"), PartialServerConfig::default()).unwrap();
        assert_eq!(config.jwt_alg, "HS512");
    }

    #[test]
    fn database_url_is_assembled_from_parts() {
        let env = PartialServerConfig {
            jwt_secret: Some("s".to_string()),
            db_host: Some("postgres".to_string()),
            db_user: Some("app".to_string()),
            db_pass: Some("pw".to_string()),
            db_name: Some("health".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::merge(env, PartialServerConfig::default()).unwrap();
        assert_eq!(config.database_url(), "postgres://app:pw@postgres:5432/health");

        let config = ServerConfig::with_secret("s", "sqlite::memory:").unwrap();
        assert_eq!(config.database_url(), "sqlite::memory:");
    }
}

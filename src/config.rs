// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Description:
//   Toute la configuration vient des variables d'environnement (.env chargé
//   par dotenv au démarrage). Les valeurs obligatoires absentes font échouer
//   le démarrage avec une ConfigError explicite.
//
// Variables:
//   - DATABASE_URL (obligatoire)
//   - JWT_SECRET (obligatoire) : secret HS256 du fournisseur d'identité
//   - BIND_ADDR / PORT : adresse d'écoute (127.0.0.1:8080 par défaut)
//   - WEBHOOK_SECRET : secret HMAC partagé avec les passerelles
//   - STORAGE_BASE_URL / STORAGE_SIGNING_SECRET : stockage des fichiers
//   - MAX_DOWNLOADS (3) / DOWNLOAD_LINK_TTL_SECS (3600)
//   - ACCESS_VALIDITY_DAYS : durée d'accès des commandes validées à la main
//   - GATEWAY_TIMEOUT_SECS (15) / PAYMENT_CALLBACK_URL
//   - MVOLA_API_URL / MVOLA_API_KEY, ORANGE_MONEY_API_URL / ORANGE_MONEY_API_KEY
//   - AUTO_MIGRATE : crée les tables depuis les entités au démarrage
//
// ============================================================================

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Point d'accès HTTP d'un opérateur mobile money
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayEndpoint {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub jwt_secret: String,
    pub webhook_secret: Option<String>,
    pub storage_base_url: String,
    pub storage_signing_secret: String,
    pub max_downloads: i32,
    pub download_link_ttl_secs: i64,
    pub access_validity_days: Option<i64>,
    pub gateway_timeout: Duration,
    pub payment_callback_url: Option<String>,
    pub mvola: Option<GatewayEndpoint>,
    pub orange_money: Option<GatewayEndpoint>,
    pub auto_migrate: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Construit la configuration depuis une source de variables quelconque
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let storage_base_url = get("STORAGE_BASE_URL").unwrap_or_default();
        let storage_signing_secret = get("STORAGE_SIGNING_SECRET").unwrap_or_default();

        let max_downloads = parse_or(&get, "MAX_DOWNLOADS", 3)?;
        if max_downloads < 1 {
            return Err(ConfigError::Invalid {
                name: "MAX_DOWNLOADS",
                value: max_downloads.to_string(),
            });
        }

        let endpoint = |url_var: &str, key_var: &str| {
            get(url_var).map(|base_url| GatewayEndpoint {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: get(key_var).unwrap_or_default(),
            })
        };

        Ok(Self {
            database_url,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            jwt_secret,
            webhook_secret: get("WEBHOOK_SECRET"),
            storage_base_url: storage_base_url.trim_end_matches('/').to_string(),
            storage_signing_secret,
            max_downloads,
            download_link_ttl_secs: parse_or(&get, "DOWNLOAD_LINK_TTL_SECS", 3600)?,
            access_validity_days: parse_opt(&get, "ACCESS_VALIDITY_DAYS")?,
            gateway_timeout: Duration::from_secs(parse_or(&get, "GATEWAY_TIMEOUT_SECS", 15)?),
            payment_callback_url: get("PAYMENT_CALLBACK_URL"),
            mvola: endpoint("MVOLA_API_URL", "MVOLA_API_KEY"),
            orange_money: endpoint("ORANGE_MONEY_API_URL", "ORANGE_MONEY_API_KEY"),
            auto_migrate: parse_or(&get, "AUTO_MIGRATE", false)?,
        })
    }
}

fn parse_opt<T, G>(get: &G, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(None),
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, name)?.unwrap_or(default))
}

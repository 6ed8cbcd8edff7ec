use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::utils::signature;

#[derive(Debug, Clone, PartialEq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_in: i64,
}

/// Stockage des fichiers de formation : émet des liens temporaires
pub trait ContentStore: Send + Sync {
    fn signed_url(&self, path: &str, now: DateTime<Utc>) -> Result<SignedUrl, String>;
}

/// Liens signés HMAC : `{base}/{path}?expires=<unix>&signature=<hmac>`
/// où la signature couvre `{path}:{expires}`
pub struct SignedUrlIssuer {
    base_url: String,
    secret: String,
    ttl_secs: i64,
}

impl SignedUrlIssuer {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            base_url: base_url.into(),
            secret: secret.into(),
            ttl_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.storage_base_url.clone(),
            config.storage_signing_secret.clone(),
            config.download_link_ttl_secs,
        )
    }
}

impl ContentStore for SignedUrlIssuer {
    fn signed_url(&self, path: &str, now: DateTime<Utc>) -> Result<SignedUrl, String> {
        if self.base_url.is_empty() || self.secret.is_empty() {
            return Err("content storage is not configured".to_string());
        }

        let path = path.trim_start_matches('/');
        if path.is_empty() || path.split('/').any(|segment| segment == "..") {
            return Err(format!("invalid content path: {}", path));
        }

        let expires = now.timestamp() + self.ttl_secs;
        let signature = signature::sign_url_safe(&self.secret, format!("{}:{}", path, expires).as_bytes())?;

        Ok(SignedUrl {
            url: format!("{}/{}?expires={}&signature={}", self.base_url, path, expires, signature),
            expires_in: self.ttl_secs,
        })
    }
}

use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims des tokens émis par le fournisseur d'identité
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,               // id utilisateur = id du profil
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,                // expiration timestamp
}

/// Vérifie et décode un JWT token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    // les tokens Supabase portent aud = "authenticated", on ne le contraint pas
    validation.validate_aud = false;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid token: {}", e))
}

/// Génère un JWT token pour un utilisateur (utilisé par les tests)
#[cfg(test)]
pub fn generate_token(user_id: Uuid, email: &str, secret: &str) -> Result<String, String> {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: user_id,
        email: Some(email.to_string()),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
        .map_err(|e| format!("Failed to generate token: {}", e))
}

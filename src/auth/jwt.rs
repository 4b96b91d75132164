use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    expiry: Duration,
}

impl JwtService {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            expiry: Duration::minutes(config.jwt_expiry_minutes),
        })
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn generate_token(&self, user_id: Uuid, username: &str, role: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + self.expiry;
        let claims = Claims {
            sub: user_id,
            username: username.to_owned(),
            role: role.to_owned(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(&[self.audience.clone()]);
        validation.set_issuer(&[self.issuer.clone()]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: String,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::JwtService;
    use crate::config::AppConfig;

    fn config(secret: &str, audience: &str) -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/jobboard".to_string(),
            database_max_pool_size: 1,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: secret.to_string(),
            jwt_issuer: "jobboard".to_string(),
            jwt_audience: audience.to_string(),
            jwt_expiry_minutes: 5,
            session_cookie_secure: false,
            session_cookie_domain: None,
            default_site_id: None,
            cors_allowed_origin: None,
        }
    }

    #[test]
    fn issued_session_token_verifies() {
        let jwt = JwtService::from_config(&config("secret", "sessions")).unwrap();
        let user_id = Uuid::new_v4();
        let token = jwt.generate_token(user_id, "admin", "admin").unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn rejects_token_signed_with_another_secret() {
        let issuer = JwtService::from_config(&config("one", "sessions")).unwrap();
        let verifier = JwtService::from_config(&config("two", "sessions")).unwrap();
        let token = issuer.generate_token(Uuid::new_v4(), "bob", "user").unwrap();

        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn rejects_token_for_another_audience() {
        let issuer = JwtService::from_config(&config("secret", "elsewhere")).unwrap();
        let verifier = JwtService::from_config(&config("secret", "sessions")).unwrap();
        let token = issuer.generate_token(Uuid::new_v4(), "bob", "user").unwrap();

        assert!(verifier.verify_token(&token).is_err());
    }
}

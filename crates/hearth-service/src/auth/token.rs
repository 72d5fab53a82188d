//! JWT issuance and verification for the REST API.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use hearth_core::config::AuthConfig;
use hearth_db::db::enums::Role;

/// Claims stored in an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: uuid::Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// ## Summary
/// Issues and verifies HS256 access tokens.
///
/// Built once at startup from [`AuthConfig`] and shared through the depot.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: chrono::TimeDelta,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            ttl: chrono::TimeDelta::days(config.token_ttl_days),
        }
    }

    /// ## Summary
    /// Issues a signed token for a user.
    ///
    /// ## Errors
    /// Returns an error if token encoding fails.
    pub fn issue(&self, user: &hearth_db::model::user::User) -> ServiceResult<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::InvalidConfiguration(format!("Failed to sign token: {e}")))
    }

    /// ## Summary
    /// Verifies a token and returns its claims.
    ///
    /// ## Errors
    /// Returns `NotAuthenticated` if the token is invalid, expired, or issued
    /// by a different issuer.
    pub fn verify(&self, token: &str) -> ServiceResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::trace!("Token verification failed: {}", err);
                ServiceError::NotAuthenticated
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_db::model::user::User;

    fn test_service() -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: "test-secret-key".to_string(),
            jwt_issuer: "hearth".to_string(),
            token_ttl_days: 7,
        })
    }

    fn test_user(role: Role) -> User {
        let now = chrono::Utc::now();
        User {
            id: uuid::Uuid::now_v7(),
            name: "Test User".to_string(),
            email: "test@family-hub.test".to_string(),
            password_hash: String::new(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let svc = test_service();
        let user = test_user(Role::Admin);

        let token = svc.issue(&user).expect("issues token");
        let claims = svc.verify(&token).expect("verifies token");

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "hearth");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_rejects_garbage_token() {
        let svc = test_service();
        assert!(svc.verify("garbage").is_err());
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let svc = test_service();
        let other = TokenService::new(&AuthConfig {
            jwt_secret: "different-secret".to_string(),
            jwt_issuer: "hearth".to_string(),
            token_ttl_days: 7,
        });

        let token = svc.issue(&test_user(Role::Member)).expect("issues token");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_wrong_issuer() {
        let svc = test_service();
        let other = TokenService::new(&AuthConfig {
            jwt_secret: "test-secret-key".to_string(),
            jwt_issuer: "not-hearth".to_string(),
            token_ttl_days: 7,
        });

        let token = svc.issue(&test_user(Role::Member)).expect("issues token");
        assert!(other.verify(&token).is_err());
    }
}

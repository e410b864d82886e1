//! Token issuing, verification and revocation.
//!
//! Access tokens are verified from their signature and expiry alone. Refresh
//! tokens additionally need their id present in the [`TokenStore`], which is
//! the one awaited lookup on the verification path.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secflow_cache::TokenStore;
use secflow_config::JwtConfig;
use secflow_core::Role;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::claims::{Claims, TokenKind};
use crate::error::TokenError;
use crate::principal::Principal;

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("store", &self.store.backend())
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Builds the service from the signing configuration.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Misconfigured` if the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes, the algorithm is not an HMAC algorithm, or a
    /// lifetime is not positive.
    pub fn new(config: &JwtConfig, store: Arc<dyn TokenStore>) -> Result<Self, TokenError> {
        if config.secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::Misconfigured(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        let algorithm = Algorithm::from_str(&config.algorithm).map_err(|_| {
            TokenError::Misconfigured(format!("unknown algorithm {}", config.algorithm))
        })?;
        if !HMAC_ALGORITHMS.contains(&algorithm) {
            return Err(TokenError::Misconfigured(format!(
                "algorithm {:?} is not supported, use HS256, HS384 or HS512",
                algorithm
            )));
        }

        if config.access_token_expiry <= 0 || config.refresh_token_expiry <= 0 {
            return Err(TokenError::Misconfigured(
                "token lifetimes must be positive".to_string(),
            ));
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iat"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm,
            validation,
            access_ttl: Duration::from_secs(config.access_token_expiry as u64),
            refresh_ttl: Duration::from_secs(config.refresh_token_expiry as u64),
            store,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Signs arbitrary claims with the configured key.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    fn claims_for(&self, subject_id: &str, role: Role, kind: TokenKind, ttl: Duration) -> Claims {
        let now = Utc::now().timestamp();
        let permissions = match kind {
            TokenKind::Access => role.permissions().to_vec(),
            TokenKind::Refresh => Vec::new(),
        };

        Claims {
            sub: subject_id.to_string(),
            role,
            permissions,
            kind,
            iat: now,
            exp: now + ttl.as_secs() as i64,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Issues a stateless access token embedding the role's permissions.
    #[instrument(skip(self, role), fields(role = %role))]
    pub fn issue_access_token(
        &self,
        subject_id: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = self.claims_for(subject_id, role, TokenKind::Access, ttl);
        let token = self.sign(&claims)?;
        debug!(exp = claims.exp, "Access token issued");
        Ok(token)
    }

    /// Issues a refresh token and records its id in the store for `ttl`.
    #[instrument(skip(self, role), fields(role = %role))]
    pub async fn issue_refresh_token(
        &self,
        subject_id: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = self.claims_for(subject_id, role, TokenKind::Refresh, ttl);
        let token = self.sign(&claims)?;

        self.store
            .save_refresh_token(&claims.sub, &claims.jti, ttl)
            .await?;

        info!(exp = claims.exp, "Refresh token issued");
        Ok(token)
    }

    /// Checks signature and expiry, returning the claims.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// Verifies either token kind.
    ///
    /// Refresh tokens also go through the store lookup.
    pub async fn verify_token(&self, token: &str) -> Result<Principal, TokenError> {
        let claims = self.decode_claims(token)?;
        match claims.kind {
            TokenKind::Access => Ok(Principal::from(claims)),
            TokenKind::Refresh => self.check_not_revoked(claims).await,
        }
    }

    /// Verifies an access token without touching the store.
    pub fn verify_access_token(&self, token: &str) -> Result<Principal, TokenError> {
        let claims = self.decode_claims(token)?;
        expect_kind(&claims, TokenKind::Access)?;
        Ok(Principal::from(claims))
    }

    /// Verifies a refresh token, rejecting it if it has been revoked.
    #[instrument(skip_all)]
    pub async fn verify_refresh_token(&self, token: &str) -> Result<Principal, TokenError> {
        let claims = self.decode_claims(token)?;
        expect_kind(&claims, TokenKind::Refresh)?;
        self.check_not_revoked(claims).await
    }

    async fn check_not_revoked(&self, claims: Claims) -> Result<Principal, TokenError> {
        if !self
            .store
            .contains_refresh_token(&claims.sub, &claims.jti)
            .await?
        {
            warn!(subject = %claims.sub, "Revoked refresh token presented");
            return Err(TokenError::Revoked);
        }
        Ok(Principal::from(claims))
    }

    /// Revokes one refresh token. Returns whether it was still live.
    #[instrument(skip_all)]
    pub async fn revoke_refresh_token(&self, token: &str) -> Result<bool, TokenError> {
        let claims = self.decode_claims(token)?;
        expect_kind(&claims, TokenKind::Refresh)?;
        let removed = self
            .store
            .remove_refresh_token(&claims.sub, &claims.jti)
            .await?;
        info!(subject = %claims.sub, removed, "Refresh token revoked");
        Ok(removed)
    }

    /// Revokes every refresh token of `subject_id`.
    #[instrument(skip(self))]
    pub async fn revoke_all_for_subject(&self, subject_id: &str) -> Result<u64, TokenError> {
        let removed = self.store.remove_all_for_subject(subject_id).await?;
        info!(removed, "Refresh tokens revoked for subject");
        Ok(removed)
    }
}

fn expect_kind(claims: &Claims, expected: TokenKind) -> Result<(), TokenError> {
    if claims.kind == expected {
        Ok(())
    } else {
        Err(TokenError::WrongKind {
            expected,
            found: claims.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secflow_cache::MemoryTokenStore;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expiry: 1800,
            refresh_token_expiry: 604800,
        }
    }

    fn service() -> TokenService {
        TokenService::new(&get_test_jwt_config(), Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn test_new_rejects_short_secret() {
        let config = JwtConfig {
            secret: "short".to_string(),
            ..get_test_jwt_config()
        };
        let result = TokenService::new(&config, Arc::new(MemoryTokenStore::new()));
        assert!(matches!(result, Err(TokenError::Misconfigured(_))));
    }

    #[test]
    fn test_new_rejects_asymmetric_algorithm() {
        let config = JwtConfig {
            algorithm: "RS256".to_string(),
            ..get_test_jwt_config()
        };
        let result = TokenService::new(&config, Arc::new(MemoryTokenStore::new()));
        assert!(matches!(result, Err(TokenError::Misconfigured(_))));
    }

    #[test]
    fn test_new_rejects_unknown_algorithm() {
        let config = JwtConfig {
            algorithm: "none".to_string(),
            ..get_test_jwt_config()
        };
        assert!(TokenService::new(&config, Arc::new(MemoryTokenStore::new())).is_err());
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = service();
        let token = service
            .issue_access_token("user-1", Role::Editor, service.access_ttl())
            .unwrap();

        let principal = service.verify_access_token(&token).unwrap();
        assert_eq!(principal.subject_id, "user-1");
        assert_eq!(principal.role, Role::Editor);
        assert_eq!(principal.permissions, Role::Editor.permissions().to_vec());
        assert_eq!(principal.kind, TokenKind::Access);
        assert!(principal.expires_at > Utc::now());
    }

    #[test]
    fn test_each_token_gets_unique_id() {
        let service = service();
        let a = service.issue_access_token("u", Role::User, service.access_ttl()).unwrap();
        let b = service.issue_access_token("u", Role::User, service.access_ttl()).unwrap();
        assert_ne!(
            service.decode_claims(&a).unwrap().jti,
            service.decode_claims(&b).unwrap().jti
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = service();
        let now = Utc::now().timestamp();
        let token = service
            .sign(&Claims {
                sub: "user-1".to_string(),
                role: Role::User,
                permissions: vec![],
                kind: TokenKind::Access,
                iat: now - 120,
                exp: now - 60,
                jti: "j".to_string(),
            })
            .unwrap();

        assert!(matches!(
            service.verify_access_token(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = service();
        let token = service
            .issue_access_token("user-1", Role::User, service.access_ttl())
            .unwrap();

        let other = TokenService::new(
            &JwtConfig {
                secret: "different-secret-key-at-least-32-characters".to_string(),
                ..get_test_jwt_config()
            },
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap();

        assert!(matches!(
            other.verify_access_token(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            service().verify_access_token("not.a.token"),
            Err(TokenError::Invalid)
        ));
    }

    #[tokio::test]
    async fn test_refresh_token_verifies_while_stored() {
        let service = service();
        let token = service
            .issue_refresh_token("user-1", Role::User, service.refresh_ttl())
            .await
            .unwrap();

        let principal = service.verify_refresh_token(&token).await.unwrap();
        assert_eq!(principal.subject_id, "user-1");
        assert_eq!(principal.kind, TokenKind::Refresh);
        assert!(principal.permissions.is_empty());

        let via_dispatch = service.verify_token(&token).await.unwrap();
        assert_eq!(via_dispatch.kind, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_rejected() {
        let service = service();
        let token = service
            .issue_refresh_token("user-1", Role::User, service.refresh_ttl())
            .await
            .unwrap();

        assert!(service.revoke_refresh_token(&token).await.unwrap());
        assert!(matches!(
            service.verify_refresh_token(&token).await,
            Err(TokenError::Revoked)
        ));
        assert!(matches!(
            service.verify_token(&token).await,
            Err(TokenError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_revoke_all_for_subject() {
        let service = service();
        let first = service
            .issue_refresh_token("user-1", Role::User, service.refresh_ttl())
            .await
            .unwrap();
        let second = service
            .issue_refresh_token("user-1", Role::User, service.refresh_ttl())
            .await
            .unwrap();
        let other = service
            .issue_refresh_token("user-2", Role::User, service.refresh_ttl())
            .await
            .unwrap();

        assert_eq!(service.revoke_all_for_subject("user-1").await.unwrap(), 2);
        assert!(service.verify_refresh_token(&first).await.is_err());
        assert!(service.verify_refresh_token(&second).await.is_err());
        assert!(service.verify_refresh_token(&other).await.is_ok());
    }

    #[tokio::test]
    async fn test_kinds_are_not_interchangeable() {
        let service = service();
        let access = service
            .issue_access_token("user-1", Role::User, service.access_ttl())
            .unwrap();
        let refresh = service
            .issue_refresh_token("user-1", Role::User, service.refresh_ttl())
            .await
            .unwrap();

        assert!(matches!(
            service.verify_refresh_token(&access).await,
            Err(TokenError::WrongKind { .. })
        ));
        assert!(matches!(
            service.verify_access_token(&refresh),
            Err(TokenError::WrongKind { .. })
        ));
    }
}

//! Authentication middleware for JWT token validation

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use domain::models::User;
use domain::store::UserStore;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    state::{ApiStore, AppState},
};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// The authenticated, active user behind the current request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// RS256 token verifier built once at startup
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn from_pem(public_key: &str) -> anyhow::Result<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())?;
        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Validate an access token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                warn!("Failed to validate token: {}", e);
                ApiError::Unauthorized
            })?;

        if token_data.claims.token_type != TokenType::Access {
            warn!(user_id = %token_data.claims.sub, "Refresh token used for API access");
            return Err(ApiError::Unauthorized);
        }

        Ok(token_data.claims)
    }
}

/// Bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .ok_or(ApiError::Unauthorized)
}

/// Authentication middleware
///
/// Handlers read the authenticated account as `Extension<CurrentUser>`.
pub async fn auth_middleware<S: ApiStore>(
    State(state): State<AppState<S>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state.store, &state.jwt, req.headers()).await?;
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

/// Verify the bearer token, then load the user it names. Unknown and
/// inactive accounts are rejected even when the token is still valid.
pub async fn authenticate<S: UserStore>(
    store: &S,
    jwt: &JwtVerifier,
    headers: &HeaderMap,
) -> Result<User, ApiError> {
    let token = bearer_token(headers)?;
    let claims = jwt.verify(&token)?;

    let user = store
        .find_user(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to load user {}: {}", claims.sub, e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "Token subject does not exist");
            ApiError::Unauthorized
        })?;

    if !user.is_active() {
        warn!(user_id = %user.id, "Inactive user rejected");
        return Err(ApiError::Unauthorized);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::AUTHORIZATION};
    use domain::memory::MemoryStore;
    use domain::models::{LifecycleStatus, Role};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    const PRIVATE_KEY: &str = include_str!("testdata/test_private.pem");
    const PUBLIC_KEY: &str = include_str!("testdata/test_public.pem");

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn sign(claims: &Claims) -> String {
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&Header::new(jsonwebtoken::Algorithm::RS256), claims, &key).unwrap()
    }

    fn claims(sub: Uuid, exp: u64, token_type: TokenType) -> Claims {
        Claims {
            sub,
            iat: now(),
            exp,
            token_type,
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_verify_valid_access_token() {
        let verifier = JwtVerifier::from_pem(PUBLIC_KEY).unwrap();
        let sub = Uuid::new_v4();
        let token = sign(&claims(sub, now() + 900, TokenType::Access));

        let verified = verifier.verify(&token).unwrap();
        assert_eq!(verified.sub, sub);
        assert_eq!(verified.token_type, TokenType::Access);
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = JwtVerifier::from_pem(PUBLIC_KEY).unwrap();
        let token = sign(&claims(Uuid::new_v4(), now() - 3600, TokenType::Access));

        assert!(matches!(
            verifier.verify(&token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_verify_rejects_refresh_token() {
        let verifier = JwtVerifier::from_pem(PUBLIC_KEY).unwrap();
        let token = sign(&claims(Uuid::new_v4(), now() + 900, TokenType::Refresh));

        assert!(matches!(
            verifier.verify(&token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let verifier = JwtVerifier::from_pem(PUBLIC_KEY).unwrap();
        assert!(verifier.verify("invalid.token.here").is_err());
    }

    #[test]
    fn test_from_pem_rejects_invalid_key() {
        assert!(JwtVerifier::from_pem("not a key").is_err());
    }

    #[test]
    fn test_bearer_token_extraction() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(ApiError::Unauthorized)
        ));
    }

    fn bearer_for(sub: Uuid) -> HeaderMap {
        let token = sign(&claims(sub, now() + 900, TokenType::Access));
        headers_with(&format!("Bearer {}", token))
    }

    #[tokio::test]
    async fn test_authenticate_loads_active_user() {
        let store = Arc::new(MemoryStore::new());
        let rider = store.add_user("rider@haras.test", Role::Client, LifecycleStatus::Active);
        let verifier = JwtVerifier::from_pem(PUBLIC_KEY).unwrap();

        let user = authenticate(&store, &verifier, &bearer_for(rider.id))
            .await
            .unwrap();
        assert_eq!(user.id, rider.id);
        assert_eq!(user.role, Role::Client);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_inactive_user() {
        let store = Arc::new(MemoryStore::new());
        let gone = store.add_user("gone@haras.test", Role::Admin, LifecycleStatus::Inactive);
        let retired = store.add_user("old@haras.test", Role::Employee, LifecycleStatus::Retired);
        let verifier = JwtVerifier::from_pem(PUBLIC_KEY).unwrap();

        for user in [gone, retired] {
            assert!(matches!(
                authenticate(&store, &verifier, &bearer_for(user.id)).await,
                Err(ApiError::Unauthorized)
            ));
        }
    }

    #[tokio::test]
    async fn test_authenticate_rejects_unknown_subject() {
        let store = Arc::new(MemoryStore::new());
        let verifier = JwtVerifier::from_pem(PUBLIC_KEY).unwrap();

        assert!(matches!(
            authenticate(&store, &verifier, &bearer_for(Uuid::new_v4())).await,
            Err(ApiError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_requires_header() {
        let store = Arc::new(MemoryStore::new());
        let verifier = JwtVerifier::from_pem(PUBLIC_KEY).unwrap();

        assert!(matches!(
            authenticate(&store, &verifier, &HeaderMap::new()).await,
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert!(bearer_token(&headers).is_err());
    }
}

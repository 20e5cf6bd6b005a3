use crate::core::AppError;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use futures_util::future::LocalBoxFuture;
use sqlx::PgPool;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Paths reachable without an API key: probes, the public checkout surface,
/// and signature-verified webhooks.
fn is_public_path(path: &str) -> bool {
    path == "/"
        || path == "/health"
        || path == "/ready"
        || path.starts_with("/checkout")
        || path.starts_with("/webhooks")
}

/// API-key authentication middleware binding requests to an organizer
pub struct ApiKeyAuth {
    pool: PgPool,
}

impl ApiKeyAuth {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthMiddleware {
            service: Rc::new(service),
            pool: self.pool.clone(),
        }))
    }
}

pub struct ApiKeyAuthMiddleware<S> {
    service: Rc<S>,
    pool: PgPool,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let pool = self.pool.clone();

        Box::pin(async move {
            if is_public_path(req.path()) {
                return svc.call(req).await;
            }

            let api_key = req
                .headers()
                .get("X-API-Key")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| Error::from(AppError::unauthorized("Missing X-API-Key header")))?;

            let record = validate_api_key(&pool, api_key).await.map_err(Error::from)?;

            // Expose the organizer to handlers via the OrganizerId extractor
            req.extensions_mut().insert(OrganizerId(record.organizer_id.clone()));
            req.extensions_mut().insert(record);

            svc.call(req).await
        })
    }
}

/// The authenticated organizer's id, inserted by [`ApiKeyAuth`]
#[derive(Debug, Clone)]
pub struct OrganizerId(pub String);

impl FromRequest for OrganizerId {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let organizer_id = req.extensions().get::<OrganizerId>().cloned();

        ready(organizer_id.ok_or_else(|| {
            Error::from(AppError::unauthorized("Request is not authenticated"))
        }))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKeyRecord {
    pub id: String,
    pub organizer_id: String,
    pub key_hash: String,
    pub is_active: bool,
}

async fn validate_api_key(pool: &PgPool, api_key: &str) -> crate::core::Result<ApiKeyRecord> {
    // Keys are of the form gk_<key_id>_<secret>; the key_id locates the row
    // and the secret is verified against its argon2 hash.
    let key_id = api_key
        .strip_prefix("gk_")
        .and_then(|rest| rest.split('_').next())
        .ok_or_else(|| AppError::unauthorized("Malformed API key"))?;

    let record = sqlx::query_as::<_, ApiKeyRecord>(
        r#"
        SELECT id, organizer_id, key_hash, is_active
        FROM api_keys
        WHERE id = $1 AND is_active = TRUE
        LIMIT 1
        "#,
    )
    .bind(key_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::unauthorized("Invalid API key"))?;

    if !verify_api_key(api_key, &record.key_hash)? {
        return Err(AppError::unauthorized("Invalid API key"));
    }

    // Update last_used_at timestamp (fire and forget)
    let _ = sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
        .bind(&record.id)
        .execute(pool)
        .await;

    Ok(record)
}

/// Hash an API key with Argon2 for storage
pub fn hash_api_key(api_key: &str) -> crate::core::Result<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(api_key.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash API key: {}", e)))
}

/// Verify an API key against its stored Argon2 hash
pub fn verify_api_key(api_key: &str, hash: &str) -> crate::core::Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;

    let argon2 = Argon2::default();

    Ok(argon2
        .verify_password(api_key.as_bytes(), &parsed_hash)
        .is_ok())
}

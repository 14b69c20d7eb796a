use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::header::HeaderValue;
use http::Request as HttpRequest;
use http::Response as HttpResponse;
use http_body_util::combinators::UnsyncBoxBody;
use jsonwebtoken::{DecodingKey, Validation};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tonic::Status;
use tower::{Layer, Service};

use crate::services::auth_service::Claims;

/// Authenticated user info injected by the auth middleware into request extensions.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub org_id: String,
    pub session_id: String,
    pub role: String,
}

/// Public paths that do not require JWT authentication
const PUBLIC_PATHS: &[&str] = &[
    "/binventory.auth.AuthService/Register",
    "/binventory.auth.AuthService/Login",
    "/binventory.auth.AuthService/ValidateToken",
    "/binventory.organization.MemberService/AcceptInvitation",
    "/grpc.health.v1.Health/Check",
    "/grpc.health.v1.Health/Watch",
    "/grpc.reflection.v1.ServerReflection/ServerReflectionInfo",
    "/grpc.reflection.v1alpha.ServerReflection/ServerReflectionInfo",
];

/// x-organization-id metadata key
const ORG_HEADER: &str = "x-organization-id";

#[derive(Clone)]
pub struct AuthLayer {
    pool: PgPool,
    jwt_secret: String,
}

impl AuthLayer {
    pub fn new(pool: PgPool, jwt_secret: String) -> Self {
        Self { pool, jwt_secret }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            pool: self.pool.clone(),
            jwt_secret: self.jwt_secret.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    pool: PgPool,
    jwt_secret: String,
}

type BoxBody = UnsyncBoxBody<bytes::Bytes, Status>;

fn grpc_status_response(status: Status) -> HttpResponse<BoxBody> {
    let code = status.code() as i32;
    let message = status.message().to_string();

    let mut response = HttpResponse::new(UnsyncBoxBody::default());
    response.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("application/grpc"),
    );
    response.headers_mut().insert(
        "grpc-status",
        HeaderValue::from_str(&code.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("13")),
    );
    if !message.is_empty() {
        if let Ok(val) = HeaderValue::from_str(&message) {
            response.headers_mut().insert("grpc-message", val);
        }
    }
    response
}

impl<S, ReqBody> Service<HttpRequest<ReqBody>> for AuthMiddleware<S>
where
    S: Service<HttpRequest<ReqBody>, Response = HttpResponse<BoxBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = HttpResponse<BoxBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: HttpRequest<ReqBody>) -> Self::Future {
        let mut inner = self.inner.clone();
        std::mem::swap(&mut self.inner, &mut inner);

        let pool = self.pool.clone();
        let jwt_secret = self.jwt_secret.clone();

        Box::pin(async move {
            let path = req.uri().path().to_string();

            // Check if this is a public path
            if PUBLIC_PATHS.iter().any(|p| path == *p) {
                return inner.call(req).await;
            }

            // Extract Authorization header
            let token = match req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|s| s.to_string())
            {
                Some(token) => token,
                None => {
                    return Ok(grpc_status_response(Status::unauthenticated(
                        "Authentication required",
                    )))
                }
            };

            let claims = match jsonwebtoken::decode::<Claims>(
                &token,
                &DecodingKey::from_secret(jwt_secret.as_bytes()),
                &Validation::default(),
            ) {
                Ok(data) => data.claims,
                Err(_) => {
                    return Ok(grpc_status_response(Status::unauthenticated(
                        "Invalid or expired token",
                    )))
                }
            };

            // The session backing this JWT must still be live. Revoking a
            // session invalidates its tokens immediately.
            let token_hash = hex_sha256(&token);
            if verify_session(&pool, &claims.sid, &claims.sub, &token_hash)
                .await
                .is_err()
            {
                return Ok(grpc_status_response(Status::unauthenticated(
                    "Session revoked or expired",
                )));
            }

            // Determine effective org_id: an x-organization-id header may
            // select another organization the user is a member of.
            let requested_org = req
                .headers()
                .get(ORG_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());

            let effective_org_id = requested_org.unwrap_or_else(|| claims.org.clone());

            let role = match verify_membership(&pool, &claims.sub, &effective_org_id).await {
                Ok(role) => role,
                Err(_) => {
                    tracing::warn!(
                        "User {} not a member of org {}",
                        claims.sub,
                        effective_org_id
                    );
                    return Ok(grpc_status_response(Status::permission_denied(
                        "Not a member of the requested organization",
                    )));
                }
            };

            // Inject AuthenticatedUser into extensions
            req.extensions_mut().insert(AuthenticatedUser {
                user_id: claims.sub,
                org_id: effective_org_id.clone(),
                session_id: claims.sid,
                role,
            });

            // Also set x-organization-id header so services can read it
            if let Ok(value) = effective_org_id.parse() {
                req.headers_mut().insert(ORG_HEADER, value);
            }

            inner.call(req).await
        })
    }
}

fn hex_sha256(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

async fn verify_session(
    pool: &PgPool,
    session_id: &str,
    user_id: &str,
    token_hash: &str,
) -> Result<(), ()> {
    sqlx::query_scalar::<_, String>(
        "SELECT id::text FROM sessions
         WHERE id = $1::uuid AND user_id = $2::uuid AND token_hash = $3
           AND revoked_at IS NULL AND expires_at > NOW()",
    )
    .bind(session_id)
    .bind(user_id)
    .bind(token_hash)
    .fetch_optional(pool)
    .await
    .map_err(|_| ())?
    .ok_or(())?;
    Ok(())
}

async fn verify_membership(pool: &PgPool, user_id: &str, org_id: &str) -> Result<String, ()> {
    sqlx::query_scalar::<_, String>(
        "SELECT role FROM organization_members WHERE user_id = $1::uuid AND organization_id = $2::uuid",
    )
    .bind(user_id)
    .bind(org_id)
    .fetch_optional(pool)
    .await
    .map_err(|_| ())?
    .ok_or(())
}

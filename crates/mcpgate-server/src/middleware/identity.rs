//! Identity resolution middleware
//!
//! Runs the resolver once per request and stashes the outcome in request
//! extensions. Handlers decide whether an anonymous caller is acceptable;
//! the middleware itself never rejects for missing identity.

use crate::identity::IdentityResolver;
use axum::{
    http::Request,
    response::{IntoResponse, Response},
    Json,
};
use mcpgate_core::Identity;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer that resolves caller identity
#[derive(Clone)]
pub struct IdentityLayer {
    resolver: Arc<IdentityResolver>,
}

impl IdentityLayer {
    pub fn new(resolver: Arc<IdentityResolver>) -> Self {
        Self { resolver }
    }
}

impl<S> Layer<S> for IdentityLayer {
    type Service = IdentityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdentityService { inner, resolver: self.resolver.clone() }
    }
}

/// Service that resolves caller identity
#[derive(Clone)]
pub struct IdentityService<S> {
    inner: S,
    resolver: Arc<IdentityResolver>,
}

impl<S, B> Service<Request<B>> for IdentityService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let resolver = self.resolver.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let request_id = req
                .extensions()
                .get::<super::request_id::RequestId>()
                .map(|r| r.0.clone())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            match resolver.resolve(req.headers()).await {
                Ok(identity) => {
                    req.extensions_mut().insert(CallerIdentity(identity));
                    inner.call(req).await
                }
                Err(err) => {
                    tracing::error!(error = %err, "identity resolution failed");
                    let (status, Json(body)) = err.to_http_response(request_id);
                    Ok((status, Json(body)).into_response())
                }
            }
        })
    }
}

/// Resolved identity extractor; `None` means anonymous under a `Deny` policy.
#[derive(Clone)]
pub struct CallerIdentity(pub Option<Identity>);

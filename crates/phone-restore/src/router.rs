//! Exact-match request router.
//!
//! Requests are matched on `(method, path)` only: no path parameters, no
//! method fallbacks. Anything unmatched, including a known path with another
//! method, is a 404 naming the path.
//!
//! Handler contract: a handler owns the whole exchange and must return the
//! complete response on every path, success and validation failure alike.
//! Returning `Err` is the only other way out; the router turns it into a
//! response via [`IntoResponse`]. There is no path on which a handler can
//! leave the connection open.

use crate::error::AppError;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Flat string mapping for query and form parameters.
pub type Params = HashMap<String, String>;

/// Default cap on buffered request bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// A fully buffered request as seen by a handler.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    /// Parameters from the URL query string
    pub query: Params,
    /// Parameters from a URL-encoded request body
    pub form: Params,
}

/// A route handler.
///
/// Implemented for any `Fn(S, Exchange) -> impl Future<Output = Result<Response, AppError>>`,
/// so plain `async fn`s can be registered directly.
pub trait Handler<S>: Send + Sync + 'static {
    fn call(&self, state: S, exchange: Exchange) -> BoxFuture<'static, Result<Response, AppError>>;
}

impl<S, F, Fut> Handler<S> for F
where
    F: Fn(S, Exchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, AppError>> + Send + 'static,
{
    fn call(&self, state: S, exchange: Exchange) -> BoxFuture<'static, Result<Response, AppError>> {
        Box::pin(self(state, exchange))
    }
}

/// Routing table keyed by exact method and path.
pub struct Router<S> {
    routes: HashMap<(Method, String), Arc<dyn Handler<S>>>,
    max_body_bytes: usize,
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the largest request body that will be buffered.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Associate a handler with an exact method and path.
    ///
    /// Registering the same pair again replaces the earlier handler.
    pub fn register<H: Handler<S>>(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handler: H,
    ) -> &mut Self {
        let path = path.into();
        let handler: Arc<dyn Handler<S>> = Arc::new(handler);

        if self
            .routes
            .insert((method.clone(), path.clone()), handler)
            .is_some()
        {
            debug!(%method, %path, "Replaced route handler");
        }
        self
    }

    pub fn get<H: Handler<S>>(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.register(Method::GET, path, handler)
    }

    pub fn post<H: Handler<S>>(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.register(Method::POST, path, handler)
    }

    /// Route one request and produce its response.
    pub async fn dispatch(&self, state: S, request: Request<Body>) -> Response {
        match self.handle(state, request).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    async fn handle(&self, state: S, request: Request<Body>) -> Result<Response, AppError> {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();

        let handler = self
            .routes
            .get(&(parts.method.clone(), path.clone()))
            .cloned()
            .ok_or_else(|| AppError::RouteNotFound(path.clone()))?;

        let query = parts.uri.query().map(parse_urlencoded).unwrap_or_default();

        let bytes = to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|e| AppError::Body(e.to_string()))?;
        let form = if bytes.is_empty() {
            Params::new()
        } else {
            parse_urlencoded(&String::from_utf8_lossy(&bytes))
        };

        let exchange = Exchange {
            method: parts.method,
            path,
            headers: parts.headers,
            query,
            form,
        };

        handler.call(state, exchange).await
    }

    /// Mount the table as the catch-all service of an axum router.
    pub fn into_service(self, state: S) -> axum::Router {
        let router = Arc::new(self);

        axum::Router::new().fallback(move |request: Request<Body>| {
            let router = Arc::clone(&router);
            let state = state.clone();
            async move { router.dispatch(state, request).await }
        })
    }
}

/// Parse `application/x-www-form-urlencoded` text into a flat mapping.
///
/// `+` is a space, bad escapes are kept verbatim, invalid UTF-8 is replaced,
/// a bare key maps to `""`, and the last of repeated keys wins.
pub fn parse_urlencoded(input: &str) -> Params {
    let mut params = Params::new();

    for pair in input.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(decode_component(key), decode_component(value));
    }

    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    type Hits = Arc<AtomicUsize>;

    async fn counting(hits: Hits, _exchange: Exchange) -> Result<Response, AppError> {
        hits.fetch_add(1, Ordering::SeqCst);
        Ok("counted".into_response())
    }

    async fn echo_form(_hits: Hits, exchange: Exchange) -> Result<Response, AppError> {
        let mut pairs: Vec<_> = exchange
            .form
            .iter()
            .chain(exchange.query.iter())
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        pairs.sort();
        Ok(pairs.join(";").into_response())
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_unmatched_method_is_not_found() {
        let hits = Hits::default();
        let mut router = Router::new();
        router.post("/add", counting);
        let app = router.into_service(hits.clone());

        let response = app.oneshot(request(Method::GET, "/add", "")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Url path not found: /add");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unmatched_path_is_not_found() {
        let hits = Hits::default();
        let mut router = Router::new();
        router.post("/add", counting);
        let app = router.into_service(hits.clone());

        let response = app
            .oneshot(request(Method::POST, "/add/extra?x=1", ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Url path not found: /add/extra");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_matched_route_invokes_handler() {
        let hits = Hits::default();
        let mut router = Router::new();
        router.post("/add", counting);
        let app = router.into_service(hits.clone());

        let response = app.oneshot(request(Method::POST, "/add", "")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reregistering_replaces_handler() {
        let hits = Hits::default();
        let mut router = Router::new();
        router.post("/add", echo_form).post("/add", counting);
        let app = router.into_service(hits.clone());

        let response = app.oneshot(request(Method::POST, "/add", "a=1")).await.unwrap();

        assert_eq!(body_text(response).await, "counted");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_form_and_query_are_parsed() {
        let mut router = Router::new();
        router.post("/echo", echo_form);
        let app = router.into_service(Hits::default());

        let response = app
            .oneshot(request(
                Method::POST,
                "/echo?ref=home",
                "email=a%40x.com&phone=%2B1+555+0100",
            ))
            .await
            .unwrap();

        assert_eq!(
            body_text(response).await,
            "email=a@x.com;phone=+1 555 0100;ref=home"
        );
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let hits = Hits::default();
        let mut router = Router::new().max_body_bytes(8);
        router.post("/add", counting);
        let app = router.into_service(hits.clone());

        let response = app
            .oneshot(request(Method::POST, "/add", "email=someone@example.com"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parse_urlencoded() {
        let params = parse_urlencoded("a=1&b=two+words&c=%E2%98%8E&flag&a=3&&d=%zz");

        assert_eq!(params.get("a").map(String::as_str), Some("3"));
        assert_eq!(params.get("b").map(String::as_str), Some("two words"));
        assert_eq!(params.get("c").map(String::as_str), Some("☎"));
        assert_eq!(params.get("flag").map(String::as_str), Some(""));
        assert_eq!(params.get("d").map(String::as_str), Some("%zz"));
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn test_parse_urlencoded_empty() {
        assert!(parse_urlencoded("").is_empty());
    }
}

//! GraphQL over HTTP.

use super::{network_error, Transport};
use crate::channel::Channel;
use crate::config::{ConfigError, ProviderConfig};
use async_trait::async_trait;
use reconcile_core::{classify, GraphQlRequest, Operation, TransportError, Variables};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Transport that POSTs each operation to a GraphQL endpoint.
///
/// One instance is shared by every reconciler of a session; the underlying
/// reqwest client pools connections.
#[derive(Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
    channel: Channel,
}

impl HttpTransport {
    /// Create a transport from its parts.
    pub fn new(endpoint: impl Into<String>, channel: Channel, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            channel,
        }
    }

    /// Create a transport from a validated configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("pipefy-reconcile/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build http client: {e}")))?;
        let channel = Channel::new(config.credentials()?, http.clone());

        Ok(Self::new(config.endpoint.clone(), channel, http))
    }

    /// The endpoint operations are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        operation: Operation,
        variables: &Variables,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, TransportError> {
        if self.endpoint.trim().is_empty() {
            return Err(TransportError::Configuration(
                "graphql endpoint is not configured".into(),
            ));
        }

        let request = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&GraphQlRequest::new(operation, variables));
        let request = self.channel.authorize(request, cancel).await?;

        let exchange = async {
            let response = request.send().await.map_err(network_error)?;
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let body = response.bytes().await.map_err(network_error)?;
            Ok::<_, TransportError>((status, content_type, body))
        };

        let (status, content_type, body) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(operation = %operation, "graphql call cancelled");
                return Err(TransportError::Cancelled);
            }
            result = exchange => result?,
        };

        debug!(
            operation = %operation,
            status,
            bytes = body.len(),
            "graphql call completed"
        );
        if status == 401 {
            self.channel.reject().await;
        }
        classify(status, &content_type, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use crate::transport::testing::serve;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::time::Duration;

    fn transport(endpoint: String) -> HttpTransport {
        let http = reqwest::Client::new();
        HttpTransport::new(endpoint, Channel::Static(Secret::new("tok")), http)
    }

    async fn call(endpoint: String) -> Result<Option<Value>, TransportError> {
        transport(endpoint)
            .execute(Operation::ReadPipe, &Variables::new(), &CancellationToken::new())
            .await
    }

    // ===========================================
    // Classification over the wire
    // ===========================================

    #[tokio::test]
    async fn http_status_error_carries_body() {
        let router = Router::new().route(
            "/graphql",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/plain")],
                    "oops",
                )
            }),
        );
        let base = serve(router).await;

        let err = call(format!("{base}/graphql")).await.unwrap_err();

        assert_eq!(
            err,
            TransportError::HttpStatus {
                status: 500,
                content_type: "text/plain".into(),
                body: "oops".into(),
            }
        );
    }

    #[tokio::test]
    async fn invalid_json_is_a_decode_error_with_preview() {
        let router = Router::new().route("/graphql", post(|| async { "not json" }));
        let base = serve(router).await;

        match call(format!("{base}/graphql")).await.unwrap_err() {
            TransportError::Decode {
                status, preview, ..
            } => {
                assert_eq!(status, Some(200));
                assert_eq!(preview, "not json");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_graphql_error_wins() {
        let router = Router::new().route(
            "/graphql",
            post(|| async {
                Json(json!({"errors": [{"message": "boom"}, {"message": "second"}]}))
            }),
        );
        let base = serve(router).await;

        let err = call(format!("{base}/graphql")).await.unwrap_err();

        assert_eq!(
            err,
            TransportError::Application {
                message: "boom".into()
            }
        );
    }

    #[tokio::test]
    async fn null_data_is_none() {
        let router = Router::new().route("/graphql", post(|| async { Json(json!({"data": null})) }));
        let base = serve(router).await;

        assert_eq!(call(format!("{base}/graphql")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn sends_bearer_token_and_variables() {
        let router = Router::new().route(
            "/graphql",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth != "Bearer tok" {
                    return (StatusCode::UNAUTHORIZED, Json(json!({})));
                }
                let id = body["variables"]["id"].clone();
                let has_query = body["query"].as_str().is_some_and(|q| q.contains("pipe(id:$id)"));
                (
                    StatusCode::OK,
                    Json(json!({"data": {"pipe": {"id": id, "queried": has_query}}})),
                )
            }),
        );
        let base = serve(router).await;
        let mut vars = Variables::new();
        vars.insert("id".into(), json!("pipe_123"));

        let data = transport(format!("{base}/graphql"))
            .execute(Operation::ReadPipe, &vars, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(data["pipe"]["id"], "pipe_123");
        assert_eq!(data["pipe"]["queried"], true);
    }

    // ===========================================
    // Preconditions and failures
    // ===========================================

    #[tokio::test]
    async fn empty_endpoint_is_configuration_error() {
        let err = call(String::new()).await.unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = call(format!("http://{addr}/graphql")).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_call() {
        let router = Router::new().route(
            "/graphql",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Json(json!({"data": {}}))
            }),
        );
        let base = serve(router).await;
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let err = transport(format!("{base}/graphql"))
            .execute(Operation::ReadPipe, &Variables::new(), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, TransportError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn from_config_requires_credentials() {
        let config = ProviderConfig::default();
        assert!(matches!(
            HttpTransport::from_config(&config),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn from_config_uses_endpoint() {
        let config = ProviderConfig {
            endpoint: "http://127.0.0.1:9/graphql".into(),
            token: Some(Secret::new("t")),
            ..Default::default()
        };
        let transport = HttpTransport::from_config(&config).unwrap();
        assert_eq!(transport.endpoint(), "http://127.0.0.1:9/graphql");
    }

    // ===========================================
    // Token refresh
    // ===========================================

    #[tokio::test]
    async fn unauthorized_response_drops_cached_token() {
        use crate::config::{ClientCredentials, Credentials};
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new()
            .route(
                "/oauth/token",
                post(move || {
                    let counter = counter.clone();
                    async move {
                        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        Json(json!({"access_token": format!("tok-{n}"), "expires_in": 3600}))
                    }
                }),
            )
            .route(
                "/graphql",
                post(|headers: HeaderMap| async move {
                    let auth = headers
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    if auth == "Bearer tok-1" {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"errors": []})));
                    }
                    (StatusCode::OK, Json(json!({"data": {"auth": auth}})))
                }),
            );
        let base = serve(router).await;
        let http = reqwest::Client::new();
        let channel = Channel::new(
            Credentials::ClientCredentials(ClientCredentials {
                client_id: "id".into(),
                client_secret: Secret::new("secret"),
                token_url: format!("{base}/oauth/token"),
            }),
            http.clone(),
        );
        let transport = HttpTransport::new(format!("{base}/graphql"), channel, http);
        let cancel = CancellationToken::new();

        let err = transport
            .execute(Operation::ReadPipe, &Variables::new(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::HttpStatus { status: 401, .. }));

        let data = transport
            .execute(Operation::ReadPipe, &Variables::new(), &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(data["auth"], "Bearer tok-2");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unauthorized_static_token_is_kept() {
        let router = Router::new().route(
            "/graphql",
            post(|| async { (StatusCode::UNAUTHORIZED, "denied") }),
        );
        let base = serve(router).await;
        let transport = transport(format!("{base}/graphql"));
        let cancel = CancellationToken::new();

        for _ in 0..2 {
            let err = transport
                .execute(Operation::ReadPipe, &Variables::new(), &cancel)
                .await
                .unwrap_err();
            assert!(matches!(err, TransportError::HttpStatus { status: 401, .. }));
        }
    }
}

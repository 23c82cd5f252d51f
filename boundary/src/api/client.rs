use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tfplug::Context;

use super::common::{ApiErrorResponse, ApiQueryParams};
use super::error::ApiError;
use super::pool::{ConnectionPoolConfig, RequestCounters, RequestStats};

/// Boundary API client.
///
/// Cheap to clone. Clones share the HTTP connection pool; the token and the
/// default scope are per handle, so `with_token`/`with_scope` never affect
/// other holders of the client.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
    auth_header: Option<Arc<str>>,
    scope_id: Option<String>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    counters: RequestCounters,
}

#[derive(Debug, Serialize)]
struct AuthenticateRequest<'a> {
    command: &'static str,
    attributes: Credentials<'a>,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    login_name: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthenticateResponse {
    attributes: AuthToken,
}

#[derive(Debug, Deserialize)]
struct AuthToken {
    token: String,
}

impl Client {
    /// Create a new, unauthenticated API client with default pool settings
    pub fn new(addr: &str, insecure: bool) -> Result<Self, ApiError> {
        Self::with_config(addr, insecure, ConnectionPoolConfig::default())
    }

    pub fn with_config(
        addr: &str,
        insecure: bool,
        pool_config: ConnectionPoolConfig,
    ) -> Result<Self, ApiError> {
        let http_client = pool_config.build_client(insecure)?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: addr.trim_end_matches('/').to_string(),
                counters: RequestCounters::default(),
            }),
            auth_header: None,
            scope_id: None,
        })
    }

    /// A handle that sends `token` as its bearer credential
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            auth_header: Some(Arc::from(format!("Bearer {}", token))),
            scope_id: self.scope_id.clone(),
        }
    }

    /// A handle whose list calls default to `scope_id`
    pub fn with_scope(&self, scope_id: &str) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            auth_header: self.auth_header.clone(),
            scope_id: Some(scope_id.to_string()),
        }
    }

    pub fn scope_id(&self) -> Option<&str> {
        self.scope_id.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Exchange login name and password for a token.
    /// Returns the token; use `with_token` to get an authenticated handle.
    pub async fn authenticate(
        &self,
        auth_method_id: &str,
        login_name: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let path = format!(
            "/v1/auth-methods/{}:authenticate",
            urlencoding::encode(auth_method_id)
        );
        let body = AuthenticateRequest {
            command: "login",
            attributes: Credentials {
                login_name,
                password,
            },
        };

        tracing::debug!(auth_method_id, login_name, "authenticating with password");
        let response: AuthenticateResponse = self.post(&path, &body).await?;
        Ok(response.attributes.token)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, None::<&()>).await?;
        parse_success_response(response).await
    }

    /// Execute a GET request with query parameters
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<T, ApiError> {
        let full_path = format!("{}{}", path, params.to_query_string());
        self.get(&full_path).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.execute(Method::POST, path, Some(body)).await?;
        parse_success_response(response).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.execute(Method::PATCH, path, Some(body)).await?;
        parse_success_response(response).await
    }

    /// Execute a DELETE request; the response body is ignored
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    /// Request outcomes across every handle sharing this client
    pub fn request_stats(&self) -> RequestStats {
        self.inner.counters.snapshot()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, path);
        let builder = self.inner.http_client.request(method, &url);
        match &self.auth_header {
            Some(header) => builder.header(AUTHORIZATION, header.as_ref()),
            None => builder,
        }
    }

    /// Send one request. Boundary calls are not retried: a failed mutation
    /// may already have been applied, and version checks reject blind replays.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(%method, path, "Boundary API request");

        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                self.inner.counters.record_transport_error();
                return Err(ApiError::RequestError(e));
            }
        };

        let status = response.status();
        self.inner.counters.record_status(status);

        if status.is_success() {
            Ok(response)
        } else {
            Err(handle_error_response(response).await)
        }
    }

    /// Scopes API operations
    pub fn scopes(&self) -> super::Collection<'_, super::scopes::Scope> {
        super::Collection::new(self)
    }

    pub fn auth_methods(&self) -> super::Collection<'_, super::auth_methods::AuthMethod> {
        super::Collection::new(self)
    }

    pub fn accounts(&self) -> super::Collection<'_, super::accounts::Account> {
        super::Collection::new(self)
    }

    pub fn users(&self) -> super::Collection<'_, super::users::User> {
        super::Collection::new(self)
    }

    pub fn groups(&self) -> super::Collection<'_, super::groups::Group> {
        super::Collection::new(self)
    }

    pub fn roles(&self) -> super::Collection<'_, super::roles::Role> {
        super::Collection::new(self)
    }

    pub fn managed_groups(&self) -> super::Collection<'_, super::managed_groups::ManagedGroup> {
        super::Collection::new(self)
    }

    pub fn host_catalogs(&self) -> super::Collection<'_, super::host_catalogs::HostCatalog> {
        super::Collection::new(self)
    }

    pub fn hosts(&self) -> super::Collection<'_, super::hosts::Host> {
        super::Collection::new(self)
    }

    pub fn host_sets(&self) -> super::Collection<'_, super::host_sets::HostSet> {
        super::Collection::new(self)
    }

    pub fn credential_stores(
        &self,
    ) -> super::Collection<'_, super::credential_stores::CredentialStore> {
        super::Collection::new(self)
    }

    pub fn credential_libraries(
        &self,
    ) -> super::Collection<'_, super::credential_libraries::CredentialLibrary> {
        super::Collection::new(self)
    }

    pub fn credentials(&self) -> super::Collection<'_, super::credentials::Credential> {
        super::Collection::new(self)
    }

    pub fn targets(&self) -> super::Collection<'_, super::targets::Target> {
        super::Collection::new(self)
    }

    pub fn workers(&self) -> super::Collection<'_, super::workers::Worker> {
        super::Collection::new(self)
    }

    pub fn sessions(&self) -> super::Collection<'_, super::sessions::Session> {
        super::Collection::new(self)
    }

    pub fn storage_buckets(&self) -> super::Collection<'_, super::storage_buckets::StorageBucket> {
        super::Collection::new(self)
    }
}

/// Run an API call under `ctx`; cancellation surfaces as `ApiError::Cancelled`
pub async fn cancellable<T, F>(ctx: &Context, future: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    ctx.run_until_cancelled(future)
        .await
        .unwrap_or(Err(ApiError::Cancelled))
}

async fn parse_success_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let text = response.text().await?;
    tracing::trace!("API response body: {}", text);

    // Some mutations answer with an empty body
    let text = if text.trim().is_empty() { "{}" } else { &text };
    serde_json::from_str::<T>(text).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}", e);
        ApiError::ParseError(format!("Failed to parse response: {}", e))
    })
}

async fn handle_error_response(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let parsed = serde_json::from_str::<ApiErrorResponse>(&text).ok();
    let message = parsed
        .as_ref()
        .and_then(|p| p.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| text.clone());

    tracing::debug!(status = status.as_u16(), "Boundary API error: {}", message);

    match status {
        StatusCode::UNAUTHORIZED => ApiError::AuthError(message),
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => ApiError::Conflict(message),
        _ => {
            let (kind, details) = match parsed {
                Some(p) => (
                    p.kind.unwrap_or_else(|| "Unknown".to_string()),
                    p.details.map(Box::new),
                ),
                None => ("Unknown".to_string(), None),
            };
            ApiError::ApiError {
                status: status.as_u16(),
                kind,
                message,
                details,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn sends_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/scopes/global")
            .match_header("authorization", "Bearer at_secret")
            .with_body(r#"{"id":"global","version":1}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap().with_token("at_secret");
        let body: Value = client.get("/v1/scopes/global").await.unwrap();
        assert_eq!(body["id"], "global");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn strips_trailing_slash_from_addr() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/v1/users/u_1234567890")
            .with_status(204)
            .create_async()
            .await;

        let client = Client::new(&format!("{}/", server.url()), false).unwrap();
        client.delete("/v1/users/u_1234567890").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn maps_status_codes() {
        let mut server = Server::new_async().await;
        let cases = [
            (401, "/v1/a"),
            (403, "/v1/b"),
            (404, "/v1/c"),
            (409, "/v1/d"),
            (412, "/v1/e"),
        ];
        for (status, path) in cases {
            server
                .mock("GET", path)
                .with_status(status)
                .with_body(r#"{"status":0,"kind":"x","message":"boom"}"#)
                .create_async()
                .await;
        }

        let client = Client::new(&server.url(), false).unwrap();
        let get = |path: &'static str| {
            let client = client.clone();
            async move { client.get::<Value>(path).await.unwrap_err() }
        };

        assert!(matches!(get("/v1/a").await, ApiError::AuthError(m) if m == "boom"));
        assert!(matches!(get("/v1/b").await, ApiError::Forbidden(_)));
        assert!(get("/v1/c").await.is_not_found());
        assert!(matches!(get("/v1/d").await, ApiError::Conflict(_)));
        assert!(matches!(get("/v1/e").await, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn carries_request_field_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/hosts")
            .with_status(400)
            .with_body(
                json!({
                    "status": 400,
                    "kind": "InvalidArgument",
                    "message": "Error in provided request.",
                    "details": {"request_fields": [
                        {"name": "attributes.address", "description": "Invalid address."}
                    ]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let err = client
            .post::<Value, _>("/v1/hosts", &json!({}))
            .await
            .unwrap_err();

        match &err {
            ApiError::ApiError { status, kind, .. } => {
                assert_eq!(*status, 400);
                assert_eq!(kind, "InvalidArgument");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].name, "attributes.address");
    }

    #[tokio::test]
    async fn makes_a_single_attempt_on_server_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/targets/ttcp_1234567890")
            .with_status(503)
            .with_body("unavailable")
            .expect(1)
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let err = client
            .get::<Value>("/v1/targets/ttcp_1234567890")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ApiError { status: 503, .. }));

        mock.assert_async().await;
        let stats = client.request_stats();
        assert_eq!(stats.total(), 1);
        assert_eq!(stats.rejected, 1);
    }

    #[tokio::test]
    async fn authenticates_with_password() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/auth-methods/ampw_1234567890:authenticate")
            .match_body(Matcher::PartialJson(json!({
                "command": "login",
                "attributes": {"login_name": "admin", "password": "hunter22"}
            })))
            .with_body(r#"{"attributes":{"id":"at_1234567890","token":"at_1234567890_s3cr3t"}}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let token = client
            .authenticate("ampw_1234567890", "admin", "hunter22")
            .await
            .unwrap();
        assert_eq!(token, "at_1234567890_s3cr3t");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn scoped_handles_are_independent() {
        let client = Client::new("http://127.0.0.1:9200", false).unwrap();
        let org = client.with_scope("o_1234567890");
        let project = org.with_scope("p_1234567890");

        assert_eq!(client.scope_id(), None);
        assert_eq!(org.scope_id(), Some("o_1234567890"));
        assert_eq!(project.scope_id(), Some("p_1234567890"));
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits() {
        let ctx = Context::new();
        ctx.cancel();
        let result: Result<(), ApiError> = cancellable(&ctx, async { Ok(()) }).await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }
}

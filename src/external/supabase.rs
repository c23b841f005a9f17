use std::sync::RwLock;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::error::Error;

/// Shared connection details for the hosted backend: the REST data API and
/// the auth API live under one base URL and authenticate with the same keys.
///
/// The access token is held per client, not per HTTP caller. A server built
/// on one client acts for a single operator: once someone signs in, every
/// request it serves runs as that user until sign-out.
#[derive(Debug)]
pub struct HostedClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

impl HostedClient {
    pub fn new(base_url: &str, anon_key: &str, access_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: RwLock::new(access_token),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    /// Requests run as the signed-in user when there is one, otherwise with
    /// the anonymous key.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());

        self.http
            .request(method, self.url(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }
}

/// Maps an unsuccessful response onto the error taxonomy.
pub async fn check(res: Response) -> Result<Response, Error> {
    let status = res.status();

    if status.is_success() {
        return Ok(res);
    }

    let message = error_message(res).await;

    tracing::warn!("hosted backend returned {}: {}", status, message);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::AuthRequired,
        StatusCode::NOT_FOUND => Error::NotFound,
        _ => Error::Store(format!("{status}: {message}")),
    })
}

/// The backend's own explanation of a failed request, or the status text.
pub async fn error_message(res: Response) -> String {
    let status = res.status();

    res.json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message.or(body.msg).or(body.error_description))
        .unwrap_or_else(|| status.to_string())
}

#[test]
fn url_joins_without_double_slashes() {
    let client = HostedClient::new("https://abc.example.co/", "anon", None);

    assert_eq!(
        client.url("/rest/v1/rides"),
        "https://abc.example.co/rest/v1/rides"
    );
    assert_eq!(client.url("auth/v1/user"), "https://abc.example.co/auth/v1/user");
}

#[test]
fn access_token_can_be_replaced() {
    let client = HostedClient::new("https://abc.example.co", "anon", None);
    assert_eq!(client.access_token(), None);

    client.set_access_token(Some("jwt".into()));
    assert_eq!(client.access_token().as_deref(), Some("jwt"));

    client.set_access_token(None);
    assert_eq!(client.access_token(), None);
}

#[cfg(test)]
fn response(status: u16, body: &str) -> Response {
    axum::http::Response::builder()
        .status(status)
        .body(body.to_string())
        .unwrap()
        .into()
}

#[test]
fn check_maps_statuses_onto_errors() {
    use tokio_test::block_on;

    let ok = block_on(check(response(200, "[]"))).unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    for status in [401, 403] {
        let err = block_on(check(response(status, "{}"))).unwrap_err();
        assert!(matches!(err, Error::AuthRequired));
    }

    let err = block_on(check(response(404, "{}"))).unwrap_err();
    assert!(matches!(err, Error::NotFound));

    let err = block_on(check(response(503, r#"{"message":"upstream down"}"#))).unwrap_err();
    assert!(err.is_store_error());
    assert!(err.to_string().contains("upstream down"));
}

#[test]
fn error_message_falls_back_to_status() {
    use tokio_test::block_on;

    let message = block_on(error_message(response(422, r#"{"msg":"Password too short"}"#)));
    assert_eq!(message, "Password too short");

    let message = block_on(error_message(response(500, "not json")));
    assert_eq!(message, "500 Internal Server Error");
}

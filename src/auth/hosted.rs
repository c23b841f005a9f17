use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Identity, User};
use crate::error::Error;
use crate::external::supabase::{check, error_message, HostedClient};

/// Password sign-in against the hosted auth API. The access token it obtains
/// is stored on the shared client so data requests run as that user.
#[derive(Debug)]
pub struct HostedAuth {
    client: Arc<HostedClient>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: HostedUser,
}

/// Sign-up answers with a session when no email confirmation is pending,
/// otherwise with the bare user.
#[derive(Deserialize)]
struct SignUpResponse {
    access_token: Option<String>,
    user: Option<HostedUser>,
    id: Option<Uuid>,
    email: Option<String>,
}

/// A created account and whether it is already signed in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    pub user: User,
    pub signed_in: bool,
}

#[derive(Deserialize)]
struct HostedUser {
    id: Uuid,
    email: Option<String>,
}

impl From<HostedUser> for User {
    fn from(user: HostedUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

impl HostedAuth {
    pub fn new(client: Arc<HostedClient>) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, Error> {
        require_credentials(email, password)?;

        let res = self
            .client
            .request(Method::POST, "auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password })
            .send()
            .await?;

        if res.status() == StatusCode::BAD_REQUEST {
            return Err(Error::validation("credentials", "invalid email or password"));
        }

        let token: TokenResponse = check(res).await?.json().await?;
        self.client.set_access_token(Some(token.access_token));

        tracing::info!("signed in");

        Ok(token.user.into())
    }

    /// Creates an account. When the backend returns a session right away the
    /// new user is signed in, otherwise they must confirm their email first.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, Error> {
        require_credentials(email, password)?;

        let res = self
            .client
            .request(Method::POST, "auth/v1/signup")
            .json(&Credentials { email, password })
            .send()
            .await?;

        if matches!(res.status(), StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) {
            return Err(Error::validation("credentials", error_message(res).await));
        }

        let created: SignUpResponse = check(res).await?.json().await?;

        let user = match (created.user, created.id) {
            (Some(user), _) => User::from(user),
            (None, Some(id)) => User {
                id,
                email: created.email,
            },
            (None, None) => return Err(Error::Store("sign-up returned no user".into())),
        };

        let signed_in = created.access_token.is_some();
        if signed_in {
            self.client.set_access_token(created.access_token);
        }

        tracing::info!(signed_in, "account created");

        Ok(SignUp { user, signed_in })
    }

    pub fn sign_out(&self) {
        self.client.set_access_token(None);
    }
}

fn require_credentials(email: &str, password: &str) -> Result<(), Error> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(Error::validation("credentials", "email and password are required"));
    }

    Ok(())
}

#[async_trait]
impl Identity for HostedAuth {
    #[tracing::instrument(skip(self))]
    async fn current_actor(&self) -> Result<Option<User>, Error> {
        if self.client.access_token().is_none() {
            return Ok(None);
        }

        let res = self
            .client
            .request(Method::GET, "auth/v1/user")
            .send()
            .await?;

        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::info!("access token rejected, treating as signed out");
                Ok(None)
            }
            _ => {
                let user: HostedUser = check(res).await?.json().await?;
                Ok(Some(user.into()))
            }
        }
    }
}

#[test]
fn no_token_means_no_actor() {
    use tokio_test::block_on;

    let client = Arc::new(HostedClient::new("http://127.0.0.1:9", "anon", None));
    let auth = HostedAuth::new(client);

    assert_eq!(block_on(auth.current_actor()).unwrap(), None);
}

#[test]
fn blank_credentials_never_leave_the_process() {
    use tokio_test::block_on;

    let client = Arc::new(HostedClient::new("http://127.0.0.1:9", "anon", None));
    let auth = HostedAuth::new(client.clone());

    let err = block_on(auth.sign_in("", "secret")).unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(client.access_token(), None);
}

#[test]
fn sign_up_needs_both_credentials() {
    use tokio_test::block_on;

    let client = Arc::new(HostedClient::new("http://127.0.0.1:9", "anon", None));
    let auth = HostedAuth::new(client.clone());

    let err = block_on(auth.sign_up("driver@example.com", "")).unwrap_err();
    assert!(err.is_validation_error());

    let err = block_on(auth.sign_up("  ", "secret")).unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(client.access_token(), None);
}

#[test]
fn sign_up_response_shapes() {
    let confirmed: SignUpResponse = serde_json::from_str(
        r#"{"access_token":"jwt","user":{"id":"6f1f2c1e-8d53-4a56-9b5e-0e8a2f6c7d10","email":"a@b.c"}}"#,
    )
    .unwrap();
    assert_eq!(confirmed.access_token.as_deref(), Some("jwt"));
    assert!(confirmed.user.is_some());

    let pending: SignUpResponse = serde_json::from_str(
        r#"{"id":"6f1f2c1e-8d53-4a56-9b5e-0e8a2f6c7d10","email":"a@b.c","confirmation_sent_at":"2024-08-15T10:00:00Z"}"#,
    )
    .unwrap();
    assert!(pending.access_token.is_none());
    assert!(pending.user.is_none());
    assert!(pending.id.is_some());
}

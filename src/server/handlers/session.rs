use std::sync::Arc;

use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::auth::{HostedAuth, Identity, SignUp, User};
use crate::error::Error;

#[derive(Deserialize)]
pub struct SignInParams {
    email: String,
    password: String,
}

pub async fn current(Extension(auth): Extension<Arc<HostedAuth>>) -> Result<Json<Option<User>>, Error> {
    let user = auth.current_actor().await?;

    Ok(user.into())
}

pub async fn sign_in(
    Extension(auth): Extension<Arc<HostedAuth>>,
    Json(params): Json<SignInParams>,
) -> Result<Json<User>, Error> {
    let user = auth.sign_in(&params.email, &params.password).await?;

    Ok(user.into())
}

pub async fn sign_up(
    Extension(auth): Extension<Arc<HostedAuth>>,
    Json(params): Json<SignInParams>,
) -> Result<(StatusCode, Json<SignUp>), Error> {
    let created = auth.sign_up(&params.email, &params.password).await?;

    Ok((StatusCode::CREATED, created.into()))
}

pub async fn sign_out(Extension(auth): Extension<Arc<HostedAuth>>) -> StatusCode {
    auth.sign_out();

    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::supabase::HostedClient;
    use tokio_test::block_on;

    fn auth() -> Arc<HostedAuth> {
        let client = HostedClient::new("http://127.0.0.1:9", "anon", Some("stale".into()));
        Arc::new(HostedAuth::new(Arc::new(client)))
    }

    #[test]
    fn sign_out_forgets_the_token() {
        let auth = auth();

        assert_eq!(block_on(sign_out(Extension(auth.clone()))), StatusCode::NO_CONTENT);
        assert_eq!(block_on(current(Extension(auth))).unwrap().0, None);
    }

    #[test]
    fn blank_password_is_a_validation_error() {
        let params = SignInParams {
            email: "driver@example.com".into(),
            password: String::new(),
        };

        let err = block_on(sign_in(Extension(auth()), Json(params))).unwrap_err();

        assert!(err.is_validation_error());
    }

    #[test]
    fn sign_up_rejects_blank_email() {
        let params = SignInParams {
            email: " ".into(),
            password: "secret".into(),
        };

        let err = block_on(sign_up(Extension(auth()), Json(params))).unwrap_err();

        assert!(err.is_validation_error());
    }
}

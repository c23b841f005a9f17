mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};

use crate::api::DynAPI;
use crate::auth::HostedAuth;
use crate::error::Error;
use crate::server::handlers::{cities, rides, session};

/// The HTTP surface. Session routes exist only when a hosted auth service is
/// configured; that session is shared by every caller of this server.
pub fn router(api: DynAPI, auth: Option<Arc<HostedAuth>>) -> Router {
    let app = Router::new()
        .route("/rides", get(rides::list).post(rides::create))
        .route("/rides/refresh", post(rides::refresh))
        .route("/rides/:id/book", patch(rides::book))
        .route("/cities", get(cities::list));

    let app = match auth {
        Some(auth) => app
            .route(
                "/session",
                get(session::current)
                    .post(session::sign_in)
                    .delete(session::sign_out),
            )
            .route("/session/signup", post(session::sign_up))
            .layer(Extension(auth)),
        None => app,
    };

    app.layer(Extension(api))
}

pub async fn serve(api: DynAPI, auth: Option<Arc<HostedAuth>>, addr: SocketAddr) -> Result<(), Error> {
    let app = router(api, auth);

    tracing::info!("listening on {}", addr);

    axum::Server::try_bind(&addr)
        .map_err(|err| Error::Server(format!("cannot bind {addr}: {err}")))?
        .serve(app.into_make_service())
        .await
        .map_err(|err| Error::Server(err.to_string()))
}

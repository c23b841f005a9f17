use std::net::SocketAddr;
use std::sync::Arc;

use crate::auth::{HostedAuth, Session, User};
use crate::config::{Backend, Config};
use crate::error::Error;
use crate::external::supabase::HostedClient;
use crate::repository::{Mode, RideRepository};
use crate::store::{MemoryStore, PgStore, RestStore};

/// A repository wired to the configured backend, plus the sign-in service
/// when the backend provides one.
pub struct App {
    pub repository: Arc<RideRepository>,
    pub auth: Option<Arc<HostedAuth>>,
}

impl App {
    #[tracing::instrument(name = "App::open", skip_all)]
    pub async fn open(config: &Config) -> Result<Self, Error> {
        let rules = config.validation;

        match &config.backend {
            Backend::Local { seed_demo_rides } => {
                let rides = match seed_demo_rides {
                    true => crate::seed::demo_rides()?,
                    false => Vec::new(),
                };

                tracing::info!("no backend configured, keeping {} rides in memory", rides.len());

                let store = Arc::new(MemoryStore::with_rides(rides));
                let repository = RideRepository::connect(store, Mode::Local, rules).await;

                Ok(Self {
                    repository,
                    auth: None,
                })
            }
            Backend::Postgres {
                database_url,
                max_connections,
                actor_id,
            } => {
                let store = Arc::new(PgStore::new(database_url, *max_connections).await?);

                let session = match actor_id {
                    Some(id) => Session::signed_in(User::new(*id)),
                    None => {
                        tracing::warn!("HITCH_ACTOR_ID is not set, posting rides will be refused");
                        Session::anonymous()
                    }
                };

                let mode = Mode::Networked(Arc::new(session));
                let repository = RideRepository::connect(store, mode, rules).await;

                Ok(Self {
                    repository,
                    auth: None,
                })
            }
            Backend::Hosted {
                url,
                anon_key,
                access_token,
                poll_interval,
            } => {
                let client = Arc::new(HostedClient::new(url, anon_key, access_token.clone()));

                let store = match poll_interval {
                    Some(interval) => RestStore::new(client.clone()).with_poll_interval(*interval),
                    None => RestStore::new(client.clone()),
                };

                let auth = Arc::new(HostedAuth::new(client));
                let mode = Mode::Networked(auth.clone());
                let repository = RideRepository::connect(Arc::new(store), mode, rules).await;

                Ok(Self {
                    repository,
                    auth: Some(auth),
                })
            }
        }
    }

    pub async fn serve(self, addr: SocketAddr) -> Result<(), Error> {
        crate::server::serve(self.repository, self.auth, addr).await
    }
}

#[tokio::test]
async fn local_backend_is_seeded_and_open_to_anyone() {
    use crate::api::RideAPI;

    let config = Config::from_lookup(|_| None).unwrap();
    let app = App::open(&config).await.unwrap();

    assert!(app.repository.is_local());
    assert!(app.repository.is_subscribed());
    assert!(app.auth.is_none());
    assert_eq!(app.repository.list().rides.len(), 3);
}

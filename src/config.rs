use std::{env, net::SocketAddr, time::Duration};

use uuid::Uuid;

use crate::entities::ValidationRules;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    /// No backend: rides live in process memory.
    Local { seed_demo_rides: bool },
    Postgres {
        database_url: String,
        max_connections: u32,
        actor_id: Option<Uuid>,
    },
    Hosted {
        url: String,
        anon_key: String,
        access_token: Option<String>,
        poll_interval: Option<Duration>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub backend: Backend,
    pub validation: ValidationRules,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so it can be driven
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let listen_addr: SocketAddr = var("HITCH_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| Error::Config(format!("invalid HITCH_LISTEN_ADDR: {err}")))?;

        let backend = match (var("SUPABASE_URL"), var("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Backend::Hosted {
                url,
                anon_key,
                access_token: var("SUPABASE_ACCESS_TOKEN"),
                poll_interval: var("SUPABASE_POLL_SECONDS")
                    .map(|secs| parse::<u64>("SUPABASE_POLL_SECONDS", &secs))
                    .transpose()?
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            },
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::Config(
                    "SUPABASE_URL and SUPABASE_ANON_KEY must be set together".into(),
                ))
            }
            (None, None) => match var("DATABASE_URL") {
                Some(database_url) => Backend::Postgres {
                    database_url,
                    max_connections: var("DATABASE_MAX_CONNECTIONS")
                        .map(|n| parse("DATABASE_MAX_CONNECTIONS", &n))
                        .transpose()?
                        .unwrap_or(5),
                    actor_id: var("HITCH_ACTOR_ID")
                        .map(|id| parse("HITCH_ACTOR_ID", &id))
                        .transpose()?,
                },
                None => Backend::Local {
                    seed_demo_rides: var("HITCH_SEED_DEMO")
                        .map(|flag| parse_flag("HITCH_SEED_DEMO", &flag))
                        .transpose()?
                        .unwrap_or(true),
                },
            },
        };

        let validation = ValidationRules {
            require_distinct_endpoints: var("HITCH_REQUIRE_DISTINCT_ENDPOINTS")
                .map(|flag| parse_flag("HITCH_REQUIRE_DISTINCT_ENDPOINTS", &flag))
                .transpose()?
                .unwrap_or(false),
            require_future_departure: var("HITCH_REQUIRE_FUTURE_DEPARTURE")
                .map(|flag| parse_flag("HITCH_REQUIRE_FUTURE_DEPARTURE", &flag))
                .transpose()?
                .unwrap_or(false),
        };

        Ok(Self {
            listen_addr,
            backend,
            validation,
        })
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| Error::Config(format!("invalid {key}: {err}")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("invalid {key}: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_seeded_local_mode() {
        let config = config(&[]).unwrap();

        assert_eq!(config.backend, Backend::Local { seed_demo_rides: true });
        assert_eq!(config.listen_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.validation, ValidationRules::default());
    }

    #[test]
    fn hosted_backend_wins_over_database_url() {
        let config = config(&[
            ("SUPABASE_URL", "https://abc.example.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("SUPABASE_POLL_SECONDS", "15"),
            ("DATABASE_URL", "postgresql://localhost/hitch"),
        ])
        .unwrap();

        assert_eq!(
            config.backend,
            Backend::Hosted {
                url: "https://abc.example.co".into(),
                anon_key: "anon".into(),
                access_token: None,
                poll_interval: Some(Duration::from_secs(15)),
            }
        );
    }

    #[test]
    fn hosted_url_without_key_is_rejected() {
        let err = config(&[("SUPABASE_URL", "https://abc.example.co")]).unwrap_err();

        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn postgres_backend_and_rules() {
        let actor = Uuid::new_v4().to_string();
        let config = config(&[
            ("DATABASE_URL", "postgresql://localhost/hitch"),
            ("HITCH_ACTOR_ID", &actor),
            ("HITCH_REQUIRE_DISTINCT_ENDPOINTS", "yes"),
        ])
        .unwrap();

        assert_eq!(
            config.backend,
            Backend::Postgres {
                database_url: "postgresql://localhost/hitch".into(),
                max_connections: 5,
                actor_id: Some(actor.parse().unwrap()),
            }
        );
        assert!(config.validation.require_distinct_endpoints);
        assert!(!config.validation.require_future_departure);
    }

    #[test]
    fn malformed_values_are_config_errors() {
        assert!(config(&[("HITCH_LISTEN_ADDR", "nowhere")]).is_err());
        assert!(config(&[("HITCH_SEED_DEMO", "maybe")]).is_err());
        assert!(config(&[
            ("DATABASE_URL", "postgresql://localhost/hitch"),
            ("HITCH_ACTOR_ID", "bob"),
        ])
        .is_err());
    }
}

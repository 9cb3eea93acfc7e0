use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use dotenv::dotenv;

use crate::error::ConfigError;

/// Where payment webhook states are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStoreKind {
    Postgres,
    Memory,
}

/// Route layout of one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    /// Prefix for `/esim`, `/esim/last-events`, `/payment` and
    /// `/payment/last-events`. Empty mounts them at the root.
    pub api_prefix: String,
    /// Also serve `/globlinkesimwebhook`, `/last-events` and
    /// `/payssiongloblinkesimwebhhok`.
    pub legacy_routes: bool,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api/webhooks".to_string(),
            legacy_routes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub payment_store: PaymentStoreKind,
    pub database_url: Option<String>,
    pub database_pool_size: u32,
    pub auto_create_schema: bool,
    pub routes: RouteConfig,
    pub esim_buffer_capacity: Option<usize>,
}

impl Config {
    /// Reads `.env.local` and `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::from_filename(".env.local").ok();
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = parse_or(&var, "HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port = parse_or(&var, "PORT", 3000)?;
        let database_pool_size = parse_or(&var, "DATABASE_POOL_SIZE", 5)?;
        let auto_create_schema = parse_bool(&var, "DATABASE_AUTO_CREATE_SCHEMA", true)?;
        let legacy_routes = parse_bool(&var, "LEGACY_ROUTES", true)?;

        let payment_store = match var("PAYMENT_STORE").as_deref().map(str::trim) {
            None => PaymentStoreKind::Postgres,
            Some(v) if v.eq_ignore_ascii_case("postgres") => PaymentStoreKind::Postgres,
            Some(v) if v.eq_ignore_ascii_case("memory") => PaymentStoreKind::Memory,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    key: "PAYMENT_STORE",
                    value: v.to_string(),
                })
            }
        };

        let database_url = var("DATABASE_URL");
        if payment_store == PaymentStoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if database_pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_POOL_SIZE",
                value: "0".to_string(),
            });
        }

        let api_prefix = match lookup("WEBHOOK_ROUTE_PREFIX") {
            Some(prefix) => normalize_prefix(&prefix),
            None => RouteConfig::default().api_prefix,
        };

        let esim_buffer_capacity = match var("ESIM_BUFFER_CAPACITY") {
            Some(v) => match parse_value::<usize>("ESIM_BUFFER_CAPACITY", &v)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        key: "ESIM_BUFFER_CAPACITY",
                        value: v,
                    })
                }
                capacity => Some(capacity),
            },
            None => None,
        };

        Ok(Self {
            host,
            port,
            payment_store,
            database_url,
            database_pool_size,
            auto_create_schema,
            routes: RouteConfig {
                api_prefix,
                legacy_routes,
            },
            esim_buffer_capacity,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// `api/webhooks/` becomes `/api/webhooks`; `/` and blank become empty.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_bool<F>(var: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(v) = var(key) else {
        return Ok(default);
    };
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_with_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/webhooks")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.payment_store, PaymentStoreKind::Postgres);
        assert_eq!(config.database_pool_size, 5);
        assert!(config.auto_create_schema);
        assert_eq!(config.routes, RouteConfig::default());
        assert_eq!(config.esim_buffer_capacity, None);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn postgres_requires_database_url() {
        assert_eq!(load(&[]), Err(ConfigError::Missing("DATABASE_URL")));
        assert_eq!(
            load(&[("DATABASE_URL", "  ")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn memory_store_needs_no_database() {
        let config = load(&[("PAYMENT_STORE", "Memory"), ("PORT", "3002")]).unwrap();
        assert_eq!(config.payment_store, PaymentStoreKind::Memory);
        assert_eq!(config.database_url, None);
        assert_eq!(config.port, 3002);
    }

    #[test]
    fn route_prefix_is_normalized() {
        let prefix = |raw: &str| {
            load(&[("PAYMENT_STORE", "memory"), ("WEBHOOK_ROUTE_PREFIX", raw)])
                .unwrap()
                .routes
                .api_prefix
        };
        assert_eq!(prefix("api/hooks/"), "/api/hooks");
        assert_eq!(prefix("/"), "");
        assert_eq!(prefix(""), "");
    }

    #[test]
    fn invalid_values_are_reported() {
        assert_eq!(
            load(&[("PAYMENT_STORE", "memory"), ("PORT", "http")]),
            Err(ConfigError::Invalid {
                key: "PORT",
                value: "http".to_string()
            })
        );
        assert_eq!(
            load(&[("PAYMENT_STORE", "redis")]),
            Err(ConfigError::Invalid {
                key: "PAYMENT_STORE",
                value: "redis".to_string()
            })
        );
        assert!(load(&[("PAYMENT_STORE", "memory"), ("LEGACY_ROUTES", "maybe")]).is_err());
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("DATABASE_POOL_SIZE", "0")]).is_err());
        assert_eq!(
            load(&[("PAYMENT_STORE", "memory"), ("ESIM_BUFFER_CAPACITY", "0")]),
            Err(ConfigError::Invalid {
                key: "ESIM_BUFFER_CAPACITY",
                value: "0".to_string()
            })
        );
    }

    #[test]
    fn optional_settings() {
        let config = load(&[
            ("PAYMENT_STORE", "memory"),
            ("LEGACY_ROUTES", "false"),
            ("ESIM_BUFFER_CAPACITY", "500"),
            ("HOST", "127.0.0.1"),
        ])
        .unwrap();
        assert!(!config.routes.legacy_routes);
        assert_eq!(config.esim_buffer_capacity, Some(500));
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:3000");
    }
}

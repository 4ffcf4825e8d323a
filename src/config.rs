use std::env;
use std::time::Duration;

use crate::roles::RoleTaxonomy;

/// Default backend base URL for local development (the dev API gateway).
pub const LOCAL_API_GATEWAY_URL: &str = "http://localhost:5000/api";

/// ClientConfig
///
/// Holds the client core's entire configuration. Loaded once at startup and shared
/// immutably by the gateway, the resolver and the session guard.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    // Runtime environment marker. Controls logging format and fail-fast checks.
    pub env: Env,
    // Backend base URL every request path is joined onto.
    pub api_base_url: String,
    // Per-request timeout applied by the HTTP gateway.
    pub request_timeout: Duration,
    // Recognised role tags and role pinning rules. The backend's taxonomy was
    // still moving, so this is configuration rather than a constant.
    pub roles: RoleTaxonomy,
    // Redirect targets used by the session guard.
    pub paths: GuardPaths,
}

/// Env
///
/// Defines the runtime context. Local allows fallbacks for every setting,
/// Production demands explicit values for the backend location.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// GuardPaths
///
/// Where the session guard sends viewers it turns away.
#[derive(Clone, Debug, PartialEq)]
pub struct GuardPaths {
    /// Login/registration screen, used when no token is stored.
    pub auth: String,
    /// Public landing page, used when the role does not match the route.
    pub home: String,
}

impl Default for GuardPaths {
    fn default() -> Self {
        Self {
            auth: "/auth".to_string(),
            home: "/".to_string(),
        }
    }
}

impl Default for ClientConfig {
    /// default
    ///
    /// Non-panicking configuration for tests and examples: local environment,
    /// local gateway URL and the latest role taxonomy.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base_url: LOCAL_API_GATEWAY_URL.to_string(),
            request_timeout: Duration::from_secs(15),
            roles: RoleTaxonomy::latest(),
            paths: GuardPaths::default(),
        }
    }
}

impl ClientConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `API_GATEWAY_URL` is missing, so a
    /// deployed build never silently talks to the local development gateway.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = match env {
            Env::Production => env::var("API_GATEWAY_URL")
                .expect("FATAL: API_GATEWAY_URL must be set in production."),
            Env::Local => env::var("API_GATEWAY_URL")
                .unwrap_or_else(|_| LOCAL_API_GATEWAY_URL.to_string()),
        };

        let request_timeout = env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(15));

        let roles = match env::var("MOSPOLYJOB_ROLES") {
            Ok(list) if !list.trim().is_empty() => RoleTaxonomy::from_list(&list),
            _ => RoleTaxonomy::latest(),
        };
        // Without an explicit pin list the company owner stays confined.
        let roles = match env::var("MOSPOLYJOB_PINNED_ROLES") {
            Ok(pins) => roles.with_pins_from_list(&pins),
            Err(_) => roles.with_default_pins(),
        };

        Self {
            env,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            request_timeout,
            roles,
            paths: GuardPaths::default(),
        }
    }
}

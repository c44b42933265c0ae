//! Provider configuration and options.
//!
//! The backend origin is always passed in explicitly through [`ApiConfig`]; there is no
//! process-wide default. Deployments that differ only by origin or request options are
//! just different [`ApiConfig`] values.

use crate::notify::Notifier;
use std::{fmt, sync::Arc, time::Duration};
use url::Url;

/// Environment variable holding the backend origin.
pub const ENV_BASE_URL: &str = "AUTH_API_BASE_URL";
/// Environment variable holding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "AUTH_API_TIMEOUT_SECS";
/// Environment variable toggling credential-bearing requests.
pub const ENV_WITH_CREDENTIALS: &str = "AUTH_API_WITH_CREDENTIALS";

/// Errors raised while assembling an [`ApiConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable was not set.
    #[error("{0} is required")]
    Missing(&'static str),
    /// The base URL could not be parsed.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// A variable was set to a value that cannot be interpreted.
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Where and how the backend is reached.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct ApiConfig {
    /// Origin every endpoint path is resolved against.
    pub base_url: Url,
    /// Whether requests carry and store cookies. Defaults to `true`.
    #[builder(default = true)]
    pub with_credentials: bool,
    /// Total time allowed for a single request.
    pub timeout: Option<Duration>,
    /// Time allowed to establish a connection.
    pub connect_timeout: Option<Duration>,
}

impl ApiConfig {
    /// Creates a configuration for the given origin with default request options.
    pub fn new<T: AsRef<str>>(base_url: T) -> Result<Self, ConfigError> {
        Ok(Self::builder().base_url(Url::parse(base_url.as_ref())?).build())
    }

    /// Loads the configuration from the process environment.
    ///
    /// `AUTH_API_BASE_URL` is required. `AUTH_API_TIMEOUT_SECS` and
    /// `AUTH_API_WITH_CREDENTIALS` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL).ok_or(ConfigError::Missing(ENV_BASE_URL))?;
        let base_url = Url::parse(base_url.trim())?;

        let timeout = match lookup(ENV_TIMEOUT_SECS) {
            Some(value) => Some(Duration::from_secs(value.trim().parse().map_err(|_| {
                ConfigError::InvalidValue {
                    name: ENV_TIMEOUT_SECS,
                    value,
                }
            })?)),
            None => None,
        };

        let with_credentials = match lookup(ENV_WITH_CREDENTIALS) {
            Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidValue {
                name: ENV_WITH_CREDENTIALS,
                value,
            })?,
            None => true,
        };

        Ok(Self::builder()
            .base_url(base_url)
            .with_credentials(with_credentials)
            .maybe_timeout(timeout)
            .build())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Texts of the notifications the provider emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    /// Shown after a successful signup.
    pub signup_success: String,
    /// Shown when a signup fails and the server sent no message.
    pub signup_failed: String,
    /// Shown after a successful login.
    pub login_success: String,
    /// Shown when a login fails and the server sent no message.
    pub login_failed: String,
    /// Shown after a demo administrator signs in.
    pub admin_login_success: String,
    /// Shown after a logout.
    pub logout_success: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            signup_success: "Signup successful!".to_string(),
            signup_failed: "Signup failed".to_string(),
            login_success: "Login successful!".to_string(),
            login_failed: "Login failed".to_string(),
            admin_login_success: "Admin logged in!".to_string(),
            logout_success: "Logged out!".to_string(),
        }
    }
}

/// Options for creating an [`AuthProvider`](crate::AuthProvider).
#[derive(Clone, Default, bon::Builder)]
pub struct AuthProviderOptions {
    /// Notification texts. Defaults to [`Messages::default`].
    #[builder(default)]
    pub messages: Messages,
    /// Receiver of user-visible notifications. Defaults to [`TracingNotifier`](crate::notify::TracingNotifier).
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl fmt::Debug for AuthProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthProviderOptions")
            .field("messages", &self.messages)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

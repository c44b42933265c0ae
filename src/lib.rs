//! Authentication state for applications backed by a cookie-session REST API.
//!
//! [`AuthProvider`] tracks the signed-in user (or a demo administrator) and exposes
//! signup, login and logout actions that call the backend. The session itself lives in
//! an HTTP-only cookie held by the HTTP client, so nothing is persisted locally.
//!
//! ```no_run
//! use session_auth_client::{ApiConfig, AuthProvider, AuthProviderOptions, HttpTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiConfig::new("https://books.example.com")?;
//! let provider =
//!     AuthProvider::mount(HttpTransport::new(&config)?, AuthProviderOptions::default()).await;
//!
//! if !provider.is_authenticated() {
//!     provider.login("ann@example.com", "hunter2").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
mod auth_client;
pub mod notify;
pub mod option;
pub mod session;
pub mod transport;
mod util;

pub use auth_client::{AuthClientError, AuthProvider};
pub use option::{ApiConfig, AuthProviderOptions, ConfigError, Messages};
pub use session::{AuthState, Session};
pub use transport::{AuthTransport, HttpTransport, TransportError};
pub use util::callback;

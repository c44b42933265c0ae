//! User-visible notifications.

use crate::{option::Messages, session::Notice};
use std::fmt;
use tracing::{info, warn};

/// Severity of a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    /// The action succeeded.
    Success,
    /// The action failed.
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationLevel::Success => write!(f, "success"),
            NotificationLevel::Error => write!(f, "error"),
        }
    }
}

/// A transient message reporting the outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Whether the action succeeded.
    pub level: NotificationLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notification {
    /// Creates a success notification.
    pub fn success<T: Into<String>>(message: T) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    /// Creates an error notification.
    pub fn error<T: Into<String>>(message: T) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Renders a [`Notice`] with the configured texts.
    ///
    /// Failures prefer the server's message and fall back to the generic text.
    pub fn from_notice(notice: &Notice, messages: &Messages) -> Self {
        match notice {
            Notice::SignedUp => Self::success(&messages.signup_success),
            Notice::LoggedIn => Self::success(&messages.login_success),
            Notice::AdminLoggedIn => Self::success(&messages.admin_login_success),
            Notice::LoggedOut => Self::success(&messages.logout_success),
            Notice::SignupFailed(server) => {
                Self::error(server.as_deref().unwrap_or(&messages.signup_failed))
            }
            Notice::LoginFailed(server) => {
                Self::error(server.as_deref().unwrap_or(&messages.login_failed))
            }
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Receiver of notifications, typically a toast layer.
pub trait Notifier: Send + Sync {
    /// Shows `notification` to the user.
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the `tracing` log. Used when no notifier is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => {
                info!(target: "session_auth_client::notify", "{}", notification.message)
            }
            NotificationLevel::Error => {
                warn!(target: "session_auth_client::notify", "{}", notification.message)
            }
        }
    }
}

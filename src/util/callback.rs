//! Closure adapters for provider notifications.

use crate::notify::{Notification, Notifier};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

pub(crate) type OnNotifyInner = Box<dyn FnMut(Notification) + Send>;

/// A [`Notifier`] backed by a closure that takes [`Notification`] as an argument.
///
/// The closure is not reentrant. A notification raised while it is still running, for
/// example by calling back into the provider from inside it, is logged and dropped.
///
/// # Usage
/// ```
/// use session_auth_client::{callback::OnNotify, notify::Notification};
///
/// let on_notify = OnNotify::from(|_notification: Notification| {
///     // Show a toast
/// });
/// ```
#[derive(Clone)]
pub struct OnNotify(pub(crate) Arc<Mutex<OnNotifyInner>>);

impl<F> From<F> for OnNotify
where
    F: FnMut(Notification) + Send + 'static,
{
    fn from(f: F) -> Self {
        OnNotify(Arc::new(Mutex::new(Box::new(f))))
    }
}

impl Notifier for OnNotify {
    fn notify(&self, notification: Notification) {
        match self.0.try_lock() {
            Some(mut f) => f(notification),
            None => warn!("Dropping notification raised from inside its handler: {notification}"),
        }
    }
}

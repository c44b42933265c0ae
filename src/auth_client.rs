use crate::{
    api::{AdminProfile, AuthResponse, LoginRequest, SignupRequest, UserProfile},
    notify::{Notification, Notifier, TracingNotifier},
    option::{ApiConfig, AuthProviderOptions, Messages},
    session::{self, AuthState, Notice, SessionEvent},
    transport::{AuthTransport, HttpTransport, TransportError},
};
use parking_lot::Mutex;
use std::{fmt, future::Future, sync::Arc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// The error type for provider actions.
#[derive(Debug, thiserror::Error)]
pub enum AuthClientError {
    /// The backend call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A newer identity-affecting action started before this one resolved, so its
    /// result was discarded.
    #[error("Superseded by a newer authentication request")]
    Superseded,
}

impl AuthClientError {
    /// Returns the human readable message the backend attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AuthClientError::Transport(err) => err.server_message(),
            AuthClientError::Superseded => None,
        }
    }
}

struct Shared {
    state: AuthState,
    /// Token of the newest identity-affecting operation.
    generation: u64,
    /// Token of the newest operation other than a session check.
    action: u64,
    /// Token of the logout still waiting for the backend, if it is the newest action.
    logout: Option<u64>,
}

pub(crate) struct AuthProviderInner {
    transport: Arc<dyn AuthTransport>,
    messages: Messages,
    notifier: Arc<dyn Notifier>,
    shared: Mutex<Shared>,
    changes: watch::Sender<AuthState>,
}

impl fmt::Debug for AuthProviderInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("AuthProviderInner")
            .field("state", &shared.state)
            .field("generation", &shared.generation)
            .field("logout", &shared.logout)
            .field("messages", &self.messages)
            .finish()
    }
}

/// Holds the current user or demo admin and performs signup, login and logout against
/// the backend.
///
/// Clones share the same state. Every identity-affecting action takes a fresh
/// generation token and only applies its result if no newer action has started in
/// the meantime, so a slow response can never overwrite a newer one.
#[derive(Clone, Debug)]
pub struct AuthProvider(Arc<AuthProviderInner>);

impl AuthProvider {
    /// Creates a provider in its initial state: anonymous, with `loading` set.
    ///
    /// Nothing is sent until [`probe_session`](Self::probe_session) is called; use
    /// [`mount`](Self::mount) to do both.
    pub fn new<T>(transport: T, options: AuthProviderOptions) -> Self
    where
        T: AuthTransport + 'static,
    {
        Self::with_transport(Arc::new(transport), options)
    }

    /// Like [`new`](Self::new), for a transport that is already shared.
    pub fn with_transport(transport: Arc<dyn AuthTransport>, options: AuthProviderOptions) -> Self {
        let state = AuthState::new();
        let (changes, _) = watch::channel(state.clone());
        let notifier = options
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        Self(Arc::new(AuthProviderInner {
            transport,
            messages: options.messages,
            notifier,
            shared: Mutex::new(Shared {
                state,
                generation: 0,
                action: 0,
                logout: None,
            }),
            changes,
        }))
    }

    /// Creates a provider that talks HTTP to the configured backend.
    pub fn with_config(
        config: &ApiConfig,
        options: AuthProviderOptions,
    ) -> Result<Self, TransportError> {
        Ok(Self::new(HttpTransport::new(config)?, options))
    }

    /// Creates a provider and runs the session probe once.
    pub async fn mount<T>(transport: T, options: AuthProviderOptions) -> Self
    where
        T: AuthTransport + 'static,
    {
        let provider = Self::new(transport, options);
        provider.probe_session().await;
        provider
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.0.shared.lock().state.clone()
    }

    /// Returns a receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.0.changes.subscribe()
    }

    /// Returns the signed-in backend user, if any.
    pub fn user(&self) -> Option<UserProfile> {
        self.0.shared.lock().state.user().cloned()
    }

    /// Returns the signed-in demo administrator, if any.
    pub fn admin(&self) -> Option<AdminProfile> {
        self.0.shared.lock().state.admin().cloned()
    }

    /// Returns `true` while the session check, a signup or a login is outstanding.
    pub fn loading(&self) -> bool {
        self.0.shared.lock().state.loading()
    }

    /// Returns `true` if a user or a demo administrator is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.0.shared.lock().state.is_authenticated()
    }

    /// Returns `true` for a demo administrator or a user whose role is `"admin"`.
    pub fn is_admin(&self) -> bool {
        self.0.shared.lock().state.is_admin()
    }

    /// Asks the backend whether the session cookie still identifies a user.
    ///
    /// Any failure, including an unauthorized response, leaves the provider signed out.
    /// A check that overlaps a logout never signs the user back in.
    pub async fn probe_session(&self) {
        let (token, _) = self.begin(SessionEvent::ProbeStarted);
        let _pending = Pending::new(self, token);
        debug!("Probing session (generation {token})");

        let event = match self.0.transport.current_user().await {
            Ok(response) => SessionEvent::ProbeSucceeded(response.user),
            Err(err) => {
                debug!("Session probe failed: {err}");
                SessionEvent::ProbeFailed
            }
        };

        if self.commit(token, event).is_err() {
            warn!("Discarding superseded session probe (generation {token})");
        }
    }

    /// Runs the session probe again.
    pub async fn refresh(&self) {
        self.probe_session().await
    }

    /// Creates an account and signs it in.
    ///
    /// On failure an error notification is shown and the error is returned.
    pub async fn signup<N, E, P>(
        &self,
        name: N,
        email: E,
        password: P,
    ) -> Result<AuthResponse, AuthClientError>
    where
        N: Into<String>,
        E: Into<String>,
        P: Into<String>,
    {
        let request = SignupRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };
        self.authenticate(
            "signup",
            self.0.transport.signup(&request),
            SessionEvent::SignedUp,
            SessionEvent::SignupFailed,
        )
        .await
    }

    /// Signs a user in.
    ///
    /// On failure an error notification is shown and the error is returned.
    pub async fn login<E, P>(&self, email: E, password: P) -> Result<AuthResponse, AuthClientError>
    where
        E: Into<String>,
        P: Into<String>,
    {
        let request = LoginRequest {
            email: email.into(),
            password: password.into(),
        };
        self.authenticate(
            "login",
            self.0.transport.login(&request),
            SessionEvent::LoggedIn,
            SessionEvent::LoginFailed,
        )
        .await
    }

    /// Signs in a demo administrator without contacting the backend.
    ///
    /// The record is stored as given. A `null` record clears the user and signs nobody in.
    pub fn admin_login<A: Into<AdminProfile>>(&self, admin: A) {
        let (token, notice) = self.begin(SessionEvent::AdminLoggedIn(admin.into()));
        info!("Admin signed in (generation {token})");
        self.dispatch(notice);
    }

    /// Ends the session.
    ///
    /// The provider is signed out whatever the network outcome. Network failures are
    /// logged and never reported to the caller. Session checks started while the
    /// request is in flight are discarded.
    pub async fn logout(&self) {
        let (token, _) = self.begin(SessionEvent::LogoutStarted);
        let _pending = Pending::new(self, token);
        debug!("Logging out (generation {token})");

        if let Err(e) = self.0.transport.logout().await {
            error!("Logout request failed: {e}");
        }

        match self.commit(token, SessionEvent::LoggedOut) {
            Ok(notice) => {
                info!("Signed out");
                self.dispatch(notice);
            }
            Err(_) => warn!("Discarding superseded logout (generation {token})"),
        }
    }

    /// Abandons every outstanding action. Their results will not be applied.
    pub fn unmount(&self) {
        let (token, _) = self.begin(SessionEvent::Cancelled);
        debug!("Provider unmounted (generation {token})");
    }

    async fn authenticate<F>(
        &self,
        action: &'static str,
        request: F,
        on_success: fn(Option<UserProfile>) -> SessionEvent,
        on_failure: fn(Option<String>) -> SessionEvent,
    ) -> Result<AuthResponse, AuthClientError>
    where
        F: Future<Output = Result<AuthResponse, TransportError>>,
    {
        let (token, _) = self.begin(SessionEvent::RequestStarted);
        let _pending = Pending::new(self, token);
        debug!("Starting {action} (generation {token})");

        match request.await {
            Ok(response) => {
                let notice = self
                    .commit(token, on_success(response.user.clone()))
                    .inspect_err(|_| warn!("Discarding superseded {action} (generation {token})"))?;
                info!("{action} succeeded");
                self.dispatch(notice);
                Ok(response)
            }
            Err(err) => {
                let message = err.server_message().map(str::to_owned);
                match self.commit(token, on_failure(message)) {
                    Ok(notice) => self.dispatch(notice),
                    Err(_) => warn!("Discarding superseded {action} failure (generation {token})"),
                }
                Err(err.into())
            }
        }
    }

    /// Starts a new generation and applies `event` to it.
    fn begin(&self, event: SessionEvent) -> (u64, Option<Notice>) {
        let mut shared = self.0.shared.lock();
        shared.generation += 1;
        let token = shared.generation;
        match event {
            SessionEvent::ProbeStarted => {}
            SessionEvent::LogoutStarted => {
                shared.action = token;
                shared.logout = Some(token);
            }
            _ => {
                shared.action = token;
                shared.logout = None;
            }
        }
        let notice = session::apply(&mut shared.state, event);
        self.0.changes.send_replace(shared.state.clone());
        (token, notice)
    }

    /// Applies `event` if `token` is still the newest generation.
    ///
    /// A logout only yields to newer actions, never to session checks, and discards
    /// every check still outstanding when it lands. A check that resolves while a
    /// logout is in flight is discarded too.
    fn commit(&self, token: u64, event: SessionEvent) -> Result<Option<Notice>, AuthClientError> {
        let mut shared = self.0.shared.lock();
        match event {
            SessionEvent::LoggedOut if shared.action == token => {
                shared.generation += 1;
                shared.logout = None;
            }
            SessionEvent::LoggedOut => return Err(AuthClientError::Superseded),
            _ if shared.generation != token => return Err(AuthClientError::Superseded),
            _ if shared.logout.is_some() => {
                session::apply(&mut shared.state, SessionEvent::Cancelled);
                self.0.changes.send_replace(shared.state.clone());
                return Err(AuthClientError::Superseded);
            }
            _ => {}
        }
        let notice = session::apply(&mut shared.state, event);
        self.0.changes.send_replace(shared.state.clone());
        Ok(notice)
    }

    /// Settles an operation whose future went away before it resolved.
    fn abandon(&self, token: u64) {
        let mut shared = self.0.shared.lock();
        if shared.logout == Some(token) {
            shared.logout = None;
        }
        if shared.generation == token && shared.state.loading() {
            debug!("Operation dropped before it resolved (generation {token})");
            session::apply(&mut shared.state, SessionEvent::Cancelled);
            self.0.changes.send_replace(shared.state.clone());
        }
    }

    fn dispatch(&self, notice: Option<Notice>) {
        if let Some(notice) = notice {
            self.0
                .notifier
                .notify(Notification::from_notice(&notice, &self.0.messages));
        }
    }
}

/// Clears `loading` for its operation if the caller drops the future early.
///
/// Does nothing once the operation has been committed or superseded.
struct Pending<'a> {
    provider: &'a AuthProvider,
    token: u64,
}

impl<'a> Pending<'a> {
    fn new(provider: &'a AuthProvider, token: u64) -> Self {
        Self { provider, token }
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.provider.abandon(self.token);
    }
}

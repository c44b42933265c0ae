//! Session state and its transition function.
//!
//! [`apply`] is pure: it mutates an [`AuthState`] and reports which [`Notice`], if any,
//! the caller should surface. Dispatching the notice is left to the provider.

use crate::api::{AdminProfile, UserProfile};

/// The identity currently held by the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Session<'a> {
    /// Nobody is signed in.
    Anonymous,
    /// A backend user is signed in.
    User(&'a UserProfile),
    /// A demo administrator is signed in.
    Admin(&'a AdminProfile),
}

/// Snapshot of the authentication state.
///
/// `user` and `admin` are never both set.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    user: Option<UserProfile>,
    admin: Option<AdminProfile>,
    loading: bool,
}

impl AuthState {
    /// The state of a freshly mounted provider: anonymous, with the session probe pending.
    pub fn new() -> Self {
        Self {
            user: None,
            admin: None,
            loading: true,
        }
    }

    /// The signed-in backend user, if any.
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// The signed-in demo administrator, if any.
    pub fn admin(&self) -> Option<&AdminProfile> {
        self.admin.as_ref()
    }

    /// Returns `true` while the session probe, a signup or a login is outstanding.
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Returns `true` if either a user or an administrator is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() || self.admin.is_some()
    }

    /// Returns `true` for a demo administrator or a user whose role is `"admin"`.
    pub fn is_admin(&self) -> bool {
        self.admin.is_some() || self.user.as_ref().is_some_and(UserProfile::has_admin_role)
    }

    /// Returns the held identity as a single value.
    pub fn session(&self) -> Session<'_> {
        match (&self.user, &self.admin) {
            (Some(user), _) => Session::User(user),
            (None, Some(admin)) => Session::Admin(admin),
            (None, None) => Session::Anonymous,
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs to [`apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session probe was sent.
    ProbeStarted,
    /// The session probe answered, possibly without a user.
    ProbeSucceeded(Option<UserProfile>),
    /// The session probe failed for any reason.
    ProbeFailed,
    /// A signup or login request was sent.
    RequestStarted,
    /// The signup succeeded, possibly without a user in the payload.
    SignedUp(Option<UserProfile>),
    /// The signup failed, with the server's message if it sent one.
    SignupFailed(Option<String>),
    /// The login succeeded, possibly without a user in the payload.
    LoggedIn(Option<UserProfile>),
    /// The login failed, with the server's message if it sent one.
    LoginFailed(Option<String>),
    /// A demo administrator was signed in. A `null` record signs nobody in.
    AdminLoggedIn(AdminProfile),
    /// A logout request was sent.
    LogoutStarted,
    /// The logout finished, whatever the network outcome.
    LoggedOut,
    /// Every outstanding operation was abandoned.
    Cancelled,
}

/// An outcome worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An account was created.
    SignedUp,
    /// Carries the server's message, if it sent one.
    SignupFailed(Option<String>),
    /// A user signed in.
    LoggedIn,
    /// Carries the server's message, if it sent one.
    LoginFailed(Option<String>),
    /// A demo administrator was signed in.
    AdminLoggedIn,
    /// The session ended.
    LoggedOut,
}

/// Applies `event` to `state` and returns the notice it produces.
pub fn apply(state: &mut AuthState, event: SessionEvent) -> Option<Notice> {
    match event {
        SessionEvent::ProbeStarted | SessionEvent::RequestStarted => {
            state.loading = true;
            None
        }
        SessionEvent::ProbeSucceeded(user) => {
            state.user = user;
            if state.user.is_some() {
                state.admin = None;
            }
            state.loading = false;
            None
        }
        SessionEvent::ProbeFailed => {
            state.user = None;
            state.loading = false;
            None
        }
        SessionEvent::SignedUp(user) => {
            sign_in(state, user);
            Some(Notice::SignedUp)
        }
        SessionEvent::LoggedIn(user) => {
            sign_in(state, user);
            Some(Notice::LoggedIn)
        }
        SessionEvent::SignupFailed(message) => {
            state.loading = false;
            Some(Notice::SignupFailed(message))
        }
        SessionEvent::LoginFailed(message) => {
            state.loading = false;
            Some(Notice::LoginFailed(message))
        }
        SessionEvent::AdminLoggedIn(admin) => {
            state.admin = (!admin.as_value().is_null()).then_some(admin);
            state.user = None;
            state.loading = false;
            Some(Notice::AdminLoggedIn)
        }
        SessionEvent::LogoutStarted | SessionEvent::Cancelled => {
            state.loading = false;
            None
        }
        SessionEvent::LoggedOut => {
            state.user = None;
            state.admin = None;
            state.loading = false;
            Some(Notice::LoggedOut)
        }
    }
}

fn sign_in(state: &mut AuthState, user: Option<UserProfile>) {
    state.user = user;
    state.admin = None;
    state.loading = false;
}

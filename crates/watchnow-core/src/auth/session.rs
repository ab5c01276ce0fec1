use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, Credential};
use crate::forms::{LoginForm, RegisterForm, ValidationError};
use crate::models::{RegisteredUser, UserProfile};
use crate::nav::{Navigator, Route};

use super::broadcast::{AuthBroadcaster, AuthChange, AuthSubscription};
use super::storage::{Storage, NICKNAME_KEY, TOKEN_KEY};

/// Derived authentication status of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The first identity fetch has not completed yet.
    Uninitialized,
    Authenticated(UserProfile),
    Unauthenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Uninitialized)
    }

    pub fn identity(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Your session has expired. Please login again.")]
    SessionExpired,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Server(String),

    #[error("Storage unavailable: {0}")]
    Storage(String),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidCredentials => AuthError::InvalidCredentials,
            ApiError::Unauthorized => AuthError::SessionExpired,
            e if e.is_network() => AuthError::Network(e.detail()),
            e => AuthError::Server(e.detail()),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Storage(format!("{:#}", err))
    }
}

impl AuthError {
    /// Message for the form that triggered `action` ("Login", "Registration").
    pub fn user_message(&self, action: &str) -> String {
        match self {
            AuthError::InvalidCredentials | AuthError::Validation(_) => self.to_string(),
            other => format!("{} failed: {}", action, other),
        }
    }
}

/// Result of one identity fetch.
enum Fetch {
    Applied(UserProfile),
    Failed(ApiError),
    Superseded,
}

/// Owner of the credential and the signed-in identity.
///
/// Every identity fetch is tagged with a generation number. Logout and each
/// new auth operation advance the generation, and a fetch result is applied
/// only while its generation is still the latest one issued.
pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
    broadcaster: AuthBroadcaster,
    navigator: Navigator,
}

impl SessionStore {
    pub fn new(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            api: api.with_credential(None),
            storage,
            state,
            generation: AtomicU64::new(0),
            broadcaster: AuthBroadcaster::new(),
            navigator: Navigator::new(),
        }
    }

    // ===== Observation =====

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn identity(&self) -> Option<UserProfile> {
        self.state.borrow().identity().cloned()
    }

    pub fn subscribe(&self) -> AuthSubscription {
        self.broadcaster.subscribe()
    }

    /// For components that change the stored credential themselves; they
    /// emit `AuthChange::External` here.
    pub fn broadcaster(&self) -> &AuthBroadcaster {
        &self.broadcaster
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// An API client carrying the currently persisted credential.
    pub fn api(&self) -> ApiClient {
        self.api.with_credential(self.stored_credential())
    }

    // ===== Operations =====

    /// Resolve the persisted credential into a session. Never leaves the
    /// store `Uninitialized`.
    pub async fn initialize(&self) -> SessionState {
        info!("Initializing session");
        self.sync_from_storage().await
    }

    /// Re-fetch the identity with the persisted credential.
    pub async fn refresh_identity(&self) -> SessionState {
        self.sync_from_storage().await
    }

    /// Re-read the persisted credential and fetch the identity for it.
    pub async fn sync_from_storage(&self) -> SessionState {
        let generation = self.next_generation();
        let was_authenticated = self.state.borrow().is_authenticated();

        match self.stored_credential() {
            Some(credential) => {
                if let Fetch::Failed(e) = self.fetch_and_set(generation, credential).await {
                    warn!(error = %e, "Identity fetch failed, session cleared");
                }
            }
            None => {
                debug!("No stored credential");
                self.apply_if_current(generation, |state| {
                    self.clear_persisted();
                    *state = SessionState::Unauthenticated;
                });
            }
        }

        let state = self.state();
        match (was_authenticated, state.is_authenticated()) {
            (true, false) => {
                self.broadcaster.emit(AuthChange::SessionExpired);
            }
            (false, true) => {
                self.broadcaster.emit(AuthChange::LoggedIn);
            }
            _ => {}
        }
        state
    }

    /// Sign in. Returns `Ok(false)` when a newer auth operation took over
    /// before this one finished.
    pub async fn login(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        LoginForm::new(email, password).validate()?;
        let generation = self.next_generation();
        let was_authenticated = self.state.borrow().is_authenticated();
        info!("Logging in");

        let credential = match self.api.login(email.trim(), password).await {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Login rejected");
                self.apply_if_current(generation, |state| {
                    self.clear_persisted();
                    *state = SessionState::Unauthenticated;
                });
                self.announce_signed_out(was_authenticated);
                return Err(e.into());
            }
        };

        let persisted = self.apply_if_current(generation, |state| {
            let result = self.storage.set(TOKEN_KEY, &credential.to_stored());
            if result.is_err() {
                self.clear_persisted();
                *state = SessionState::Unauthenticated;
            }
            result
        });
        match persisted {
            None => return Ok(false),
            Some(Err(e)) => {
                warn!(error = %e, "Failed to persist credential");
                self.announce_signed_out(was_authenticated);
                return Err(e.into());
            }
            Some(Ok(())) => {}
        }

        match self.fetch_and_set(generation, credential).await {
            Fetch::Applied(profile) => {
                info!(user_id = %profile.id, "Logged in");
                self.broadcaster.emit(AuthChange::LoggedIn);
                Ok(true)
            }
            Fetch::Failed(e) => {
                warn!(error = %e, "Identity fetch after login failed");
                self.announce_signed_out(was_authenticated);
                Err(e.into())
            }
            Fetch::Superseded => Ok(false),
        }
    }

    /// Clear the session, show the login view and broadcast once.
    pub fn logout(&self) {
        self.next_generation();
        self.state.send_modify(|state| {
            self.clear_persisted();
            *state = SessionState::Unauthenticated;
        });
        info!("Logged out");
        self.navigator.go(Route::Login);
        self.broadcaster.emit(AuthChange::LoggedOut);
    }

    /// Validate and submit a registration. Does not sign the user in.
    pub async fn register(&self, form: &RegisterForm) -> Result<RegisteredUser, AuthError> {
        let registration = form.validate()?;
        let user = self.api.register(&registration).await.map_err(|e| {
            warn!(error = %e, "Registration failed");
            AuthError::from(e)
        })?;
        info!("Registered new account");
        Ok(user)
    }

    /// Pass an authenticated call's result through, expiring the session if
    /// the backend rejected the credential.
    pub fn observe<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(e) = &result {
            if e.is_session_rejection() && self.state.borrow().is_authenticated() {
                self.expire();
            }
        }
        result
    }

    /// Listen for `External` changes and re-sync from storage. Other events
    /// originate here and are ignored. The task ends with the store.
    pub fn spawn_external_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let store: Weak<SessionStore> = Arc::downgrade(self);
        let mut subscription = self.subscribe();
        tokio::spawn(async move {
            while let Some(change) = subscription.recv().await {
                if change != AuthChange::External {
                    continue;
                }
                let Some(store) = store.upgrade() else { break };
                debug!("External auth change, re-reading storage");
                store.sync_from_storage().await;
            }
        })
    }

    // ===== Internals =====

    fn expire(&self) {
        warn!("Credential rejected, expiring session");
        self.next_generation();
        self.state.send_modify(|state| {
            self.clear_persisted();
            *state = SessionState::Unauthenticated;
        });
        self.broadcaster.emit(AuthChange::SessionExpired);
    }

    /// A failed login clears any previous session; tell subscribers once.
    fn announce_signed_out(&self, was_authenticated: bool) {
        if was_authenticated && !self.state.borrow().is_authenticated() {
            self.broadcaster.emit(AuthChange::LoggedOut);
        }
    }

    async fn fetch_and_set(&self, generation: u64, credential: Credential) -> Fetch {
        let result = self
            .api
            .with_credential(Some(credential))
            .fetch_profile()
            .await;

        match result {
            Ok(profile) => {
                let applied = self.apply_if_current(generation, |state| {
                    if let Some(nickname) = profile.nickname.as_deref() {
                        if let Err(e) = self.storage.set(NICKNAME_KEY, nickname) {
                            warn!(error = %e, "Failed to cache nickname");
                        }
                    }
                    *state = SessionState::Authenticated(profile.clone());
                });
                match applied {
                    Some(()) => Fetch::Applied(profile),
                    None => {
                        debug!(generation, "Discarding superseded identity");
                        Fetch::Superseded
                    }
                }
            }
            Err(e) => {
                let applied = self.apply_if_current(generation, |state| {
                    self.clear_persisted();
                    *state = SessionState::Unauthenticated;
                });
                match applied {
                    Some(()) => Fetch::Failed(e),
                    None => Fetch::Superseded,
                }
            }
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run `apply` under the state lock if `generation` is still the latest.
    /// State watchers are woken only when `apply` actually changed the state.
    fn apply_if_current<R>(
        &self,
        generation: u64,
        apply: impl FnOnce(&mut SessionState) -> R,
    ) -> Option<R> {
        let mut output = None;
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            let before = state.clone();
            output = Some(apply(state));
            *state != before
        });
        output
    }

    fn stored_credential(&self) -> Option<Credential> {
        match self.storage.get(TOKEN_KEY) {
            Ok(raw) => raw.as_deref().and_then(Credential::from_stored),
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        }
    }

    fn clear_persisted(&self) {
        for key in [TOKEN_KEY, NICKNAME_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to clear stored value");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStorage;

    fn store() -> (SessionStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let api = ApiClient::new("http://127.0.0.1:1").unwrap();
        (SessionStore::new(api, storage.clone()), storage)
    }

    #[test]
    fn test_starts_uninitialized() {
        let (store, _) = store();
        assert!(store.is_loading());
        assert_eq!(store.identity(), None);
    }

    #[tokio::test]
    async fn test_initialize_without_credential() {
        let (store, storage) = store();
        storage.set(NICKNAME_KEY, "stale").unwrap();

        assert_eq!(store.initialize().await, SessionState::Unauthenticated);
        assert!(!store.is_loading());
        assert_eq!(storage.get(NICKNAME_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_validation_needs_no_network() {
        let (store, _) = store();
        let err = store.login("", "").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation(ValidationError::MissingCredentials)
        ));
        assert_eq!(err.user_message("Login"), "Email and password are required.");
    }

    #[test]
    fn test_logout_broadcasts_once_and_navigates() {
        let (store, storage) = store();
        storage.set(TOKEN_KEY, "bearer:t").unwrap();
        let mut sub = store.subscribe();

        store.logout();

        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert_eq!(store.navigator().current(), Route::Login);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(sub.try_recv(), Some(AuthChange::LoggedOut));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_observe_ignores_rejection_when_signed_out() {
        let (store, _) = store();
        let mut sub = store.subscribe();
        let result: Result<(), ApiError> = store.observe(Err(ApiError::Unauthorized));
        assert!(result.is_err());
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(
            AuthError::from(ApiError::InvalidCredentials).user_message("Login"),
            "Invalid email or password."
        );
        assert_eq!(
            AuthError::from(ApiError::BadRequest("Email already exists".into()))
                .user_message("Registration"),
            "Registration failed: Email already exists"
        );
        assert!(matches!(
            AuthError::from(ApiError::Unauthorized),
            AuthError::SessionExpired
        ));
    }

    #[tokio::test]
    async fn test_unchanged_state_does_not_wake_watchers() {
        let (store, _) = store();
        let mut watcher = store.subscribe_state();

        store.initialize().await;
        assert!(watcher.has_changed().unwrap());
        watcher.borrow_and_update();

        // Still no credential: Unauthenticated stays Unauthenticated
        store.sync_from_storage().await;
        assert!(!watcher.has_changed().unwrap());
    }

    #[test]
    fn test_stale_generation_is_not_applied() {
        let (store, _) = store();
        let old = store.next_generation();
        store.next_generation();
        assert_eq!(store.apply_if_current(old, |_| ()), None);
        assert!(store.is_loading());
    }
}

//! Navigation state shared by every view.
//!
//! Holds the current route and remembers where the user was headed when a
//! protected route bounced them to the login view.

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    MovieDetails(String),
    Profile,
}

impl Route {
    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Profile)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Movies",
            Route::Login => "Login",
            Route::Register => "Register",
            Route::MovieDetails(_) => "Movie",
            Route::Profile => "Profile",
        }
    }
}

pub struct Navigator {
    current: watch::Sender<Route>,
    return_to: Mutex<Option<Route>>,
}

impl Navigator {
    pub fn new() -> Self {
        let (current, _) = watch::channel(Route::Home);
        Self {
            current,
            return_to: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Route {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }

    /// Go to `route`, or to the login view if `route` needs a session the
    /// user does not have. Returns the route actually shown.
    pub fn navigate(&self, route: Route, authenticated: bool) -> Route {
        let target = if route.requires_auth() && !authenticated {
            debug!(?route, "Protected route, redirecting to login");
            *self.pending() = Some(route);
            Route::Login
        } else {
            route
        };
        self.current.send_replace(target.clone());
        target
    }

    /// Unconditional navigation, used by the session store itself.
    pub fn go(&self, route: Route) {
        self.current.send_replace(route);
    }

    /// Route to show after a successful login.
    pub fn take_return(&self) -> Route {
        self.pending().take().unwrap_or(Route::Home)
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, Option<Route>> {
        self.return_to.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_route_redirects_and_returns() {
        let nav = Navigator::new();
        assert_eq!(nav.current(), Route::Home);

        assert_eq!(nav.navigate(Route::Profile, false), Route::Login);
        assert_eq!(nav.current(), Route::Login);

        assert_eq!(nav.take_return(), Route::Profile);
        // Consumed
        assert_eq!(nav.take_return(), Route::Home);
    }

    #[test]
    fn test_authenticated_navigation() {
        let nav = Navigator::new();
        assert_eq!(nav.navigate(Route::Profile, true), Route::Profile);
        assert_eq!(
            nav.navigate(Route::MovieDetails("m1".to_string()), false),
            Route::MovieDetails("m1".to_string())
        );
        assert_eq!(nav.take_return(), Route::Home);
    }

    #[test]
    fn test_subscribers_see_changes() {
        let nav = Navigator::new();
        let mut rx = nav.subscribe();
        nav.go(Route::Register);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Route::Register);
    }
}

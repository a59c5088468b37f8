//! Access guard for protected views.
//!
//! Rendering through a guard is a two-phase affair. `render` decides what to
//! draw from the current session: the wrapped view when a token is present,
//! nothing otherwise. `commit` runs after the host has finished drawing and
//! issues the redirect to the entry route when the token is missing. The
//! redirect fires once per token value, so a denied view that is redrawn
//! repeatedly does not flood the navigator.

use tracing::{debug, info};

use super::session::{Session, SessionStore, SessionWatcher};

/// Navigation targets known to the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Public entry point (login)
    Entry,
    /// Protected purchase dashboard
    Dashboard,
}

/// Receives fire-and-forget navigation requests.
pub trait Navigator {
    fn navigate(&self, route: Route);
}

impl<N: Navigator + ?Sized> Navigator for &N {
    fn navigate(&self, route: Route) {
        (**self).navigate(route)
    }
}

impl Navigator for tokio::sync::mpsc::UnboundedSender<Route> {
    fn navigate(&self, route: Route) {
        // A closed receiver means the host is shutting down
        if self.send(route).is_err() {
            debug!(?route, "Navigation request dropped, host gone");
        }
    }
}

/// Something that can be drawn from props.
pub trait View<P: ?Sized> {
    type Output;

    fn render(&mut self, props: &P) -> Self::Output;
}

impl<P: ?Sized, O, F> View<P> for F
where
    F: FnMut(&P) -> O,
{
    type Output = O;

    fn render(&mut self, props: &P) -> O {
        self(props)
    }
}

/// Gates rendering behind presence of a bearer token.
pub struct AccessGuard<N: Navigator> {
    watcher: SessionWatcher,
    navigator: N,
    /// Token seen by the most recent render
    rendered_token: Option<String>,
    /// Token the last commit acted on; `None` until the first commit
    committed_token: Option<Option<String>>,
}

impl<N: Navigator> AccessGuard<N> {
    pub fn new(store: &SessionStore, navigator: N) -> Self {
        Self {
            watcher: store.subscribe(),
            navigator,
            rendered_token: None,
            committed_token: None,
        }
    }

    /// Render phase. Returns `None` (empty output) when no token is present.
    pub fn render<T>(&mut self, view: impl FnOnce(&Session) -> T) -> Option<T> {
        let session = self.watcher.latest();
        self.rendered_token = session.bearer_token().map(str::to_string);

        if self.rendered_token.is_some() {
            Some(view(&session))
        } else {
            None
        }
    }

    /// Post-render hook. Call once after each frame the guard took part in.
    pub fn commit(&mut self) {
        if self.committed_token.as_ref() == Some(&self.rendered_token) {
            return;
        }
        self.committed_token = Some(self.rendered_token.clone());

        if self.rendered_token.is_none() {
            info!("No session token, redirecting to entry");
            self.navigator.navigate(Route::Entry);
        }
    }

    /// True if the session changed since the last render
    pub fn needs_render(&self) -> bool {
        self.watcher.has_changed()
    }

    /// Forget prior commits, as if the guarded view had just been mounted
    pub fn remount(&mut self) {
        self.committed_token = None;
    }
}

/// A view wrapped in an access guard. Props pass through unchanged.
pub struct Guarded<V, N: Navigator> {
    view: V,
    guard: AccessGuard<N>,
}

impl<V, N: Navigator> Guarded<V, N> {
    pub fn new(view: V, store: &SessionStore, navigator: N) -> Self {
        Self {
            view,
            guard: AccessGuard::new(store, navigator),
        }
    }

    pub fn render<P: ?Sized>(&mut self, props: &P) -> Option<<V as View<P>>::Output>
    where
        V: View<P>,
    {
        let view = &mut self.view;
        self.guard.render(|_| view.render(props))
    }

    pub fn commit(&mut self) {
        self.guard.commit();
    }

    pub fn needs_render(&self) -> bool {
        self.guard.needs_render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingNavigator {
        routes: RefCell<Vec<Route>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, route: Route) {
            self.routes.borrow_mut().push(route);
        }
    }

    impl RecordingNavigator {
        fn routes(&self) -> Vec<Route> {
            self.routes.borrow().clone()
        }
    }

    fn greeting(name: &str) -> String {
        format!("hello {}", name)
    }

    #[test]
    fn test_guard_admits_with_token() {
        let store = SessionStore::new();
        store.set_credentials("a@b.com", "tok123");
        let nav = RecordingNavigator::default();

        let mut view = Guarded::new(greeting, &store, &nav);
        assert_eq!(view.render("world"), Some("hello world".to_string()));
        view.commit();

        assert!(nav.routes().is_empty());
    }

    #[test]
    fn test_guard_denies_without_token() {
        let store = SessionStore::new();
        let nav = RecordingNavigator::default();

        let mut view = Guarded::new(greeting, &store, &nav);
        assert_eq!(view.render("world"), None);
        // Redirect happens after the frame, not during render
        assert!(nav.routes().is_empty());

        view.commit();
        assert_eq!(nav.routes(), vec![Route::Entry]);
    }

    #[test]
    fn test_guard_redirects_once_per_token_value() {
        let store = SessionStore::new();
        let nav = RecordingNavigator::default();
        let mut guard = AccessGuard::new(&store, &nav);

        for _ in 0..3 {
            assert!(guard.render(|_| ()).is_none());
            guard.commit();
        }
        assert_eq!(nav.routes(), vec![Route::Entry]);
    }

    #[test]
    fn test_guard_logout_while_mounted() {
        let store = SessionStore::new();
        store.set_credentials("a@b.com", "tok123");
        let nav = RecordingNavigator::default();
        let mut guard = AccessGuard::new(&store, &nav);

        let email = guard.render(|s| s.email().map(str::to_string));
        assert_eq!(email, Some(Some("a@b.com".to_string())));
        guard.commit();
        assert!(!guard.needs_render());

        store.logout();
        assert!(guard.needs_render());

        assert!(guard.render(|_| ()).is_none());
        guard.commit();
        assert_eq!(nav.routes(), vec![Route::Entry]);
    }

    #[test]
    fn test_guard_empty_token_denies() {
        let store = SessionStore::new();
        store.set_credentials("a@b.com", "");
        let nav = RecordingNavigator::default();
        let mut guard = AccessGuard::new(&store, &nav);

        assert!(guard.render(|_| ()).is_none());
        guard.commit();
        assert_eq!(nav.routes(), vec![Route::Entry]);
    }

    #[test]
    fn test_guard_remount_redirects_again() {
        let store = SessionStore::new();
        let nav = RecordingNavigator::default();
        let mut guard = AccessGuard::new(&store, &nav);

        guard.render(|_| ());
        guard.commit();
        guard.remount();
        guard.render(|_| ());
        guard.commit();

        assert_eq!(nav.routes(), vec![Route::Entry, Route::Entry]);
    }

    #[test]
    fn test_guard_login_after_denial_admits() {
        let store = SessionStore::new();
        let nav = RecordingNavigator::default();
        let mut guard = AccessGuard::new(&store, &nav);

        guard.render(|_| ());
        guard.commit();

        store.set_credentials("a@b.com", "tok123");
        assert_eq!(guard.render(|s| s.is_authenticated()), Some(true));
        guard.commit();

        assert_eq!(nav.routes(), vec![Route::Entry]);
    }

    #[tokio::test]
    async fn test_channel_navigator_delivers_route() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let store = SessionStore::new();
        let mut guard = AccessGuard::new(&store, tx);

        guard.render(|_| ());
        guard.commit();

        assert_eq!(rx.recv().await, Some(Route::Entry));
    }
}

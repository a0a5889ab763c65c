// Page access decisions. Each route declares the role it needs; `resolve`
// turns a session and that requirement into an action for the caller.

use crate::models::{GuesthouseId, Role};
use crate::session_store::{Session, SessionStore};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    Guest,
    Host,
    // Any logged-in user
    Any,
}

impl RequiredRole {
    fn admits(&self, role: Role) -> bool {
        match self {
            RequiredRole::Any => true,
            RequiredRole::Guest => role == Role::Guest,
            RequiredRole::Host => role == Role::Host,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Allow,
    RedirectToLogin,
    // Role mismatch; carries the session's role
    RedirectToRoleHome(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Search,
    Login,
    Register,
    GuesthouseDetail(GuesthouseId),
    MyPage,
    WriteReview,
    HostDashboard,
    HostReservations(GuesthouseId),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Search => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::GuesthouseDetail(id) => format!("/detail/{}", id),
            Route::MyPage => "/mypage".to_string(),
            Route::WriteReview => "/review".to_string(),
            Route::HostDashboard => "/host".to_string(),
            Route::HostReservations(id) => format!("/host/{}/reservations", id),
        }
    }

    /// Maps a path back to its route. Query strings and trailing slashes are
    /// ignored; anything unknown lands on the search page.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Search,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["mypage"] => Route::MyPage,
            ["review"] => Route::WriteReview,
            ["host"] => Route::HostDashboard,
            ["detail", id] => id
                .parse()
                .map(Route::GuesthouseDetail)
                .unwrap_or(Route::Search),
            ["host", id, "reservations"] => id
                .parse()
                .map(Route::HostReservations)
                .unwrap_or(Route::Search),
            _ => Route::Search,
        }
    }

    // None for public pages
    pub fn required_role(&self) -> Option<RequiredRole> {
        match self {
            Route::Login | Route::Register => None,
            Route::Search | Route::MyPage => Some(RequiredRole::Any),
            Route::GuesthouseDetail(_) | Route::WriteReview => Some(RequiredRole::Guest),
            Route::HostDashboard | Route::HostReservations(_) => Some(RequiredRole::Host),
        }
    }

    pub fn home_of(role: Role) -> Route {
        match role {
            Role::Guest => Route::Search,
            Role::Host => Route::HostDashboard,
        }
    }
}

/// Decides whether `session` may see a page that needs `required`.
///
/// A session with an id but no readable role can only enter pages open to
/// any user; role-gated pages send it back to login.
pub fn resolve(session: &Session, required: RequiredRole) -> Action {
    if session.user_id.is_none() {
        return Action::RedirectToLogin;
    }
    match (required, session.role) {
        (RequiredRole::Any, _) => Action::Allow,
        (_, None) => Action::RedirectToLogin,
        (_, Some(role)) if required.admits(role) => Action::Allow,
        (_, Some(role)) => Action::RedirectToRoleHome(role),
    }
}

pub fn enter(store: &dyn SessionStore, route: Route) -> Action {
    let action = match route.required_role() {
        None => Action::Allow,
        Some(required) => resolve(&store.get(), required),
    };
    debug!(path = %route.path(), ?action, "Page access resolved");
    action
}

// Route the caller should navigate to for `action`, if any
pub fn redirect_target(action: Action) -> Option<Route> {
    match action {
        Action::Allow => None,
        Action::RedirectToLogin => Some(Route::Login),
        Action::RedirectToRoleHome(role) => Some(Route::home_of(role)),
    }
}

/// Clears the client-side session. There is no server call; the caller always
/// lands on the login page.
pub fn logout(store: &dyn SessionStore) -> Route {
    store.clear();
    debug!("Logged out");
    Route::Login
}

use shared::domain::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    Unknown,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/login" => Route::Login,
            "/home" => Route::Home,
            _ => Route::Unknown,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Home => "/home",
            Route::Unknown => "*",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    Redirect(Route),
}

impl RouteDecision {
    pub fn target(self) -> Route {
        match self {
            RouteDecision::Render(route) | RouteDecision::Redirect(route) => route,
        }
    }
}

/// `Home` needs an identity; `Login` bounces a signed-in user to `Home`;
/// anything else goes to `Login`.
pub fn guard(route: Route, identity: Option<&Identity>) -> RouteDecision {
    match (route, identity.is_some()) {
        (Route::Home, true) => RouteDecision::Render(Route::Home),
        (Route::Home, false) => RouteDecision::Redirect(Route::Login),
        (Route::Login, false) => RouteDecision::Render(Route::Login),
        (Route::Login, true) => RouteDecision::Redirect(Route::Home),
        (Route::Unknown, _) => RouteDecision::Redirect(Route::Login),
    }
}

/// Follows redirects until a route renders.
pub fn resolve(route: Route, identity: Option<&Identity>) -> Route {
    let mut current = route;
    loop {
        match guard(current, identity) {
            RouteDecision::Render(route) => return route,
            RouteDecision::Redirect(next) => current = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::UserId;
    use uuid::Uuid;

    use super::*;

    fn someone() -> Identity {
        Identity {
            id: UserId(Uuid::new_v4()),
            email: Some("u1@example.com".into()),
            username: Some("u1".into()),
        }
    }

    #[test]
    fn home_requires_identity() {
        assert_eq!(guard(Route::Home, None), RouteDecision::Redirect(Route::Login));
        let user = someone();
        assert_eq!(
            guard(Route::Home, Some(&user)),
            RouteDecision::Render(Route::Home)
        );
    }

    #[test]
    fn login_redirects_signed_in_users_home() {
        let user = someone();
        assert_eq!(
            guard(Route::Login, Some(&user)),
            RouteDecision::Redirect(Route::Home)
        );
        assert_eq!(guard(Route::Login, None), RouteDecision::Render(Route::Login));
    }

    #[test]
    fn unknown_paths_resolve_through_login() {
        assert_eq!(Route::parse("/nowhere"), Route::Unknown);
        assert_eq!(Route::parse("/home/"), Route::Home);
        assert_eq!(resolve(Route::Unknown, None), Route::Login);
        let user = someone();
        assert_eq!(resolve(Route::Unknown, Some(&user)), Route::Home);
    }
}

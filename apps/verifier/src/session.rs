//! Login session and screen navigation.
//!
//! The session is a plain value handed to whatever needs it. There is no
//! credential check; the login form only screens the username.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::errors::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Student,
    Admin,
}

impl UserType {
    pub fn badge(self) -> &'static str {
        match self {
            UserType::Student => "Student",
            UserType::Admin => "Admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    user_type: UserType,
    username: String,
}

impl Session {
    pub fn login(user_type: UserType, username: &str) -> Result<Self, SessionError> {
        if username.trim().is_empty() {
            return Err(SessionError::MissingUsername);
        }
        if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SessionError::InvalidUsername);
        }
        info!("{} '{}' logged in", user_type.badge(), username);
        Ok(Self {
            user_type,
            username: username.to_string(),
        })
    }

    pub fn user_type(&self) -> UserType {
        self.user_type
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Ends the session; the caller lands on the login screen.
    pub fn logout(self) -> Route {
        info!("'{}' logged out", self.username);
        Route::Login
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Route {
    Login,
    Home,
    Upload,
    MyCertificates,
    Records,
    RecordDetail(i64),
}

impl Route {
    /// Unknown paths resolve to `None`; `/` is the home (upload) screen.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim();
        let trimmed = trimmed.trim_end_matches('/');
        match trimmed {
            "" => Some(Route::Home),
            "/login" => Some(Route::Login),
            "/upload" => Some(Route::Upload),
            "/my-certificates" => Some(Route::MyCertificates),
            "/records" => Some(Route::Records),
            other => other
                .strip_prefix("/records/")
                .and_then(|id| id.parse::<i64>().ok())
                .map(Route::RecordDetail),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Home => "/".to_string(),
            Route::Upload => "/upload".to_string(),
            Route::MyCertificates => "/my-certificates".to_string(),
            Route::Records => "/records".to_string(),
            Route::RecordDetail(id) => format!("/records/{id}"),
        }
    }

    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Where a navigation to `route` actually lands.
pub fn guard(route: Route, session: Option<&Session>) -> Route {
    if route.requires_session() && session.is_none() {
        Route::Login
    } else {
        route
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavBar {
    pub links: Vec<NavLink>,
    pub badge: &'static str,
}

pub fn nav_links(session: &Session) -> NavBar {
    NavBar {
        links: vec![
            NavLink {
                label: "AI Certificate Verifier",
                route: Route::Home,
            },
            NavLink {
                label: "Upload",
                route: Route::Upload,
            },
            NavLink {
                label: "My Certificates",
                route: Route::MyCertificates,
            },
            NavLink {
                label: "All Records",
                route: Route::Records,
            },
        ],
        badge: session.user_type().badge(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_checks_username() {
        assert_eq!(
            Session::login(UserType::Student, "").unwrap_err(),
            SessionError::MissingUsername
        );
        assert_eq!(
            Session::login(UserType::Student, "   ").unwrap_err().to_string(),
            "Please enter a username"
        );
        assert_eq!(
            Session::login(UserType::Admin, "jane doe").unwrap_err().to_string(),
            "Username must be alphanumeric only"
        );
        assert_eq!(
            Session::login(UserType::Admin, "jané").unwrap_err(),
            SessionError::InvalidUsername
        );

        let session = Session::login(UserType::Admin, "Admin01").unwrap();
        assert_eq!(session.username(), "Admin01");
        assert_eq!(session.user_type(), UserType::Admin);
    }

    #[test]
    fn test_route_parse_and_path() {
        for route in [
            Route::Login,
            Route::Home,
            Route::Upload,
            Route::MyCertificates,
            Route::Records,
            Route::RecordDetail(42),
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
        assert_eq!(Route::parse("/records/"), Some(Route::Records));
        assert_eq!(Route::parse("/records/abc"), None);
        assert_eq!(Route::parse("/admin"), None);
    }

    #[test]
    fn test_guard_redirects_without_session() {
        assert_eq!(guard(Route::Records, None), Route::Login);
        assert_eq!(guard(Route::RecordDetail(3), None), Route::Login);
        assert_eq!(guard(Route::Login, None), Route::Login);

        let session = Session::login(UserType::Student, "s1").unwrap();
        assert_eq!(guard(Route::RecordDetail(3), Some(&session)), Route::RecordDetail(3));
        assert_eq!(session.logout(), Route::Login);
    }

    #[test]
    fn test_nav_links() {
        let student = Session::login(UserType::Student, "s1").unwrap();
        let nav = nav_links(&student);
        assert_eq!(nav.badge, "Student");
        let routes: Vec<Route> = nav.links.iter().map(|l| l.route).collect();
        assert_eq!(
            routes,
            vec![Route::Home, Route::Upload, Route::MyCertificates, Route::Records]
        );

        let admin = Session::login(UserType::Admin, "a1").unwrap();
        assert_eq!(nav_links(&admin).badge, "Admin");
    }
}

//! Page paths and the redirect rules shared by the server's route guard and the
//! client-side auth store.

use reqwest::Url;

/// Pages that need a signed in user.
pub const PROTECTED_ROUTES: &[&str] = &["/settings", "/dashboard"];
/// Pages a signed in user has no business on.
pub const AUTH_ROUTES: &[&str] = &["/login", "/signup", "/forgot-password"];

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const AUTH_CALLBACK_ERROR: &str = "/?error=auth_callback_error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Continue,
    Redirect(String),
}

/// Decides what happens to a page request. `signed_in` is `None` for an
/// anonymous visitor, otherwise the signed in user's username (if any).
pub fn guard(path: &str, signed_in: Option<Option<&str>>) -> RouteDecision {
    let is_protected = PROTECTED_ROUTES.iter().any(|r| path.starts_with(r));
    let is_auth = AUTH_ROUTES.iter().any(|r| path.starts_with(r));

    match signed_in {
        None if is_protected => RouteDecision::Redirect(with_query(LOGIN, &[("redirect", path)])),
        Some(username) if is_auth => RouteDecision::Redirect(home_for(username)),
        _ => RouteDecision::Continue,
    }
}

/// Public page of a user.
pub fn profile_path(username: &str) -> String {
    format!("/{username}")
}

/// Where a signed in user lands: their profile, or home without a username.
pub fn home_for(username: Option<&str>) -> String {
    match username {
        Some(u) if !u.is_empty() => profile_path(u),
        _ => HOME.to_string(),
    }
}

/// Login page telling the user to confirm their email first.
pub fn check_email_path(email: &str) -> String {
    with_query(LOGIN, &[("message", "check-email"), ("email", email)])
}

/// Appends url-encoded query pairs to a site-relative path.
pub fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    let Ok(mut url) = Url::parse("http://localhost") else {
        return path.to_string();
    };
    url.set_path(path);
    url.query_pairs_mut().extend_pairs(pairs.iter().copied());

    match url.query() {
        Some(q) if !q.is_empty() => format!("{}?{}", url.path(), q),
        _ => url.path().to_string(),
    }
}

/// Appends query pairs to a link that is either absolute or site-relative.
pub fn append_query(link: &str, pairs: &[(&str, &str)]) -> String {
    match Url::parse(link) {
        Ok(mut url) => {
            url.query_pairs_mut().extend_pairs(pairs.iter().copied());
            url.into()
        }
        Err(_) => with_query(link, pairs),
    }
}

/// Post-login target from a `next` parameter. Only site-relative paths are
/// honoured, anything else falls back to `/`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") => n,
        _ => HOME,
    }
}

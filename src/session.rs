use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

use crate::repositories::SessionScope;

pub const SESSION_COOKIE_NAME: &str = "session";
pub const ADMIN_SESSION_COOKIE_NAME: &str = "admin_session";

pub fn cookie_name(scope: SessionScope) -> &'static str {
    match scope {
        SessionScope::Member => SESSION_COOKIE_NAME,
        SessionScope::Admin => ADMIN_SESSION_COOKIE_NAME,
    }
}

pub fn create_session_cookie(scope: SessionScope, token: &str) -> Cookie<'static> {
    Cookie::build((cookie_name(scope), token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(7))
        .build()
}

pub fn get_session_token(jar: &CookieJar, scope: SessionScope) -> Option<String> {
    jar.get(cookie_name(scope))
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

pub fn remove_session_cookie(scope: SessionScope) -> Cookie<'static> {
    Cookie::build((cookie_name(scope), ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_use_distinct_cookies() {
        let member = create_session_cookie(SessionScope::Member, "abc");
        let admin = create_session_cookie(SessionScope::Admin, "abc");
        assert_eq!(member.name(), "session");
        assert_eq!(admin.name(), "admin_session");
        assert_eq!(member.http_only(), Some(true));
    }

    #[test]
    fn test_get_session_token_ignores_other_scope() {
        let jar = CookieJar::new().add(create_session_cookie(SessionScope::Admin, "tok"));
        assert_eq!(
            get_session_token(&jar, SessionScope::Admin).as_deref(),
            Some("tok")
        );
        assert!(get_session_token(&jar, SessionScope::Member).is_none());
    }
}

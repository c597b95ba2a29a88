use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use axum_extra::extract::CookieJar;

use crate::models::AdminRole;
use crate::repositories::{AdminUserRepository, SessionRepository, SessionScope};
use crate::session::get_session_token;

/// Signed-in member. Pages taking this redirect to the login page otherwise.
#[derive(Clone, Debug)]
pub struct MemberUser {
    pub id: String,
}

/// Signed-in back-office account.
#[derive(Clone, Debug)]
pub struct AdminUser {
    pub id: String,
    pub username: String,
    pub role: AdminRole,
}

/// Redirect to `/login`, remembering where the member was heading.
pub struct LoginRedirect {
    return_url: String,
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&format!("/login?returnUrl={}", self.return_url)).into_response()
    }
}

pub struct AdminLoginRedirect;

impl IntoResponse for AdminLoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/admin/login").into_response()
    }
}

async fn session_user(parts: &mut Parts, scope: SessionScope) -> Option<String> {
    let Extension(session_repo) = Extension::<SessionRepository>::from_request_parts(parts, &())
        .await
        .ok()?;
    let jar = CookieJar::from_headers(&parts.headers);
    let token = get_session_token(&jar, scope)?;

    match session_repo.find_valid(&token, scope).await {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            None
        }
    }
}

impl<S> FromRequestParts<S> for MemberUser
where
    S: Send + Sync,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_user(parts, SessionScope::Member).await {
            Some(id) => Ok(MemberUser { id }),
            None => Err(LoginRedirect {
                return_url: parts.uri.path().to_string(),
            }),
        }
    }
}

/// Member if signed in; never rejects.
pub struct OptionalMember(pub Option<MemberUser>);

impl<S> FromRequestParts<S> for OptionalMember
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let member = session_user(parts, SessionScope::Member)
            .await
            .map(|id| MemberUser { id });
        Ok(OptionalMember(member))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AdminLoginRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = session_user(parts, SessionScope::Admin)
            .await
            .ok_or(AdminLoginRedirect)?;
        let Extension(admin_repo) =
            Extension::<AdminUserRepository>::from_request_parts(parts, &())
                .await
                .map_err(|_| AdminLoginRedirect)?;

        match admin_repo.find_by_id(&user_id).await {
            Ok(Some(account)) => Ok(AdminUser {
                id: account.id,
                username: account.username,
                role: account.role,
            }),
            Ok(None) => Err(AdminLoginRedirect),
            Err(e) => {
                tracing::error!("Admin lookup failed: {}", e);
                Err(AdminLoginRedirect)
            }
        }
    }
}

/// Admin if signed in; never rejects.
pub struct OptionalAdmin(pub Option<AdminUser>);

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAdmin(
            AdminUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::{render, safe_return_url};
use crate::error::{AppError, Result};
use crate::identity::IdentityService;
use crate::middleware::{OptionalAdmin, OptionalMember};
use crate::models::{AdminCredentials, AdminRole, CreateMember};
use crate::repositories::{AdminUserRepository, SessionRepository, SessionScope};
use crate::session::{create_session_cookie, get_session_token, remove_session_cookie};

#[derive(Clone)]
pub struct AuthState {
    pub identity: IdentityService,
    pub admin_repo: AdminUserRepository,
    pub session_repo: SessionRepository,
}

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    email: String,
    return_url: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/admin_login.html")]
struct AdminLoginTemplate {
    username: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/admin_setup.html")]
struct AdminSetupTemplate {
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminSetupForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

async fn sign_in(
    state: &AuthState,
    jar: CookieJar,
    scope: SessionScope,
    user_id: &str,
) -> Result<CookieJar> {
    let token = state.session_repo.create(user_id, scope).await?;
    Ok(jar.add(create_session_cookie(scope, &token)))
}

async fn sign_out(state: &AuthState, jar: CookieJar, scope: SessionScope) -> Result<CookieJar> {
    if let Some(token) = get_session_token(&jar, scope) {
        state.session_repo.delete(&token).await?;
    }
    Ok(jar.add(remove_session_cookie(scope)))
}

pub async fn login_page(
    OptionalMember(member): OptionalMember,
    Query(query): Query<LoginQuery>,
) -> Result<Response> {
    let return_url = safe_return_url(query.return_url.as_deref()).unwrap_or("/profile");
    if member.is_some() {
        return Ok(Redirect::to(return_url).into_response());
    }

    let template = LoginTemplate {
        email: String::new(),
        return_url: return_url.to_string(),
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn login_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let return_url = safe_return_url(form.return_url.as_deref())
        .unwrap_or("/profile")
        .to_string();

    match state
        .identity
        .verify_credentials(&form.email, &form.password)
        .await?
    {
        Some(profile) => {
            tracing::info!("Member {} signed in", profile.id);
            let jar = sign_in(&state, jar, SessionScope::Member, &profile.id).await?;
            Ok((jar, Redirect::to(&return_url)).into_response())
        }
        None => {
            let template = LoginTemplate {
                email: form.email,
                return_url,
                error: Some("Invalid email or password".to_string()),
            };
            Ok(render(&template)?.into_response())
        }
    }
}

pub async fn register_page(OptionalMember(member): OptionalMember) -> Result<Response> {
    if member.is_some() {
        return Ok(Redirect::to("/profile").into_response());
    }
    let template = RegisterTemplate {
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        phone: String::new(),
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn register_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<CreateMember>,
) -> Result<Response> {
    match state.identity.create_user(&form).await {
        Ok(profile) => {
            tracing::info!("Registered member {}", profile.id);
            let jar = sign_in(&state, jar, SessionScope::Member, &profile.id).await?;
            Ok((jar, Redirect::to("/profile")).into_response())
        }
        Err(AppError::Validation(message)) => {
            let template = RegisterTemplate {
                first_name: form.first_name,
                last_name: form.last_name,
                email: form.email,
                phone: form.phone.unwrap_or_default(),
                error: Some(message),
            };
            Ok(render(&template)?.into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> Result<Response> {
    let jar = sign_out(&state, jar, SessionScope::Member).await?;
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn admin_login_page(
    State(state): State<AuthState>,
    OptionalAdmin(admin): OptionalAdmin,
) -> Result<Response> {
    if admin.is_some() {
        return Ok(Redirect::to("/admin").into_response());
    }
    if state.admin_repo.count().await? == 0 {
        return Ok(Redirect::to("/admin/setup").into_response());
    }

    let template = AdminLoginTemplate {
        username: String::new(),
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn admin_login_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(credentials): Form<AdminCredentials>,
) -> Result<Response> {
    match state
        .admin_repo
        .verify_password(&credentials.username, &credentials.password)
        .await?
    {
        Some(account) => {
            tracing::info!("Admin {} signed in", account.username);
            let jar = sign_in(&state, jar, SessionScope::Admin, &account.id).await?;
            Ok((jar, Redirect::to("/admin")).into_response())
        }
        None => {
            let template = AdminLoginTemplate {
                username: credentials.username,
                error: Some("Invalid username or password".to_string()),
            };
            Ok(render(&template)?.into_response())
        }
    }
}

pub async fn admin_setup_page(State(state): State<AuthState>) -> Result<Response> {
    if state.admin_repo.count().await? > 0 {
        return Ok(Redirect::to("/admin/login").into_response());
    }
    Ok(render(&AdminSetupTemplate { error: None })?.into_response())
}

pub async fn admin_setup_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<AdminSetupForm>,
) -> Result<Response> {
    if state.admin_repo.count().await? > 0 {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    let error = if form.username.trim().is_empty() {
        Some("Username is required")
    } else if form.password.len() < 8 {
        Some("Password must be at least 8 characters")
    } else if form.password != form.confirm_password {
        Some("Passwords do not match")
    } else {
        None
    };
    if let Some(error) = error {
        let template = AdminSetupTemplate {
            error: Some(error.to_string()),
        };
        return Ok(render(&template)?.into_response());
    }

    let account = state
        .admin_repo
        .create(&form.username, &form.password, AdminRole::Owner)
        .await?;
    tracing::info!("Created owner account {}", account.username);

    let jar = sign_in(&state, jar, SessionScope::Admin, &account.id).await?;
    Ok((jar, Redirect::to("/admin")).into_response())
}

pub async fn admin_logout(State(state): State<AuthState>, jar: CookieJar) -> Result<Response> {
    let jar = sign_out(&state, jar, SessionScope::Admin).await?;
    Ok((jar, Redirect::to("/admin/login")).into_response())
}

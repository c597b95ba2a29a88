pub mod admin;
pub mod auth;
pub mod functions;
pub mod health;
pub mod pages;

use askama::Template;
use axum::response::Html;

use crate::error::{AppError, Result};

pub(crate) fn render<T: Template>(template: &T) -> Result<Html<String>> {
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

/// Only same-site absolute paths are followed after login.
pub(crate) fn safe_return_url(url: Option<&str>) -> Option<&str> {
    url.filter(|u| u.starts_with('/') && !u.starts_with("//") && !u.contains('\\'))
}

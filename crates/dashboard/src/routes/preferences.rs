//! Per-session display preferences.

use axum::{Form, response::Redirect};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::auth::CurrentSession;
use crate::models::{Theme, session_keys};

#[derive(Debug, Default, Deserialize)]
pub struct ThemeForm {
    /// Explicit choice; absent means toggle.
    pub theme: Option<String>,
    /// Page to return to.
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

/// Switch between light and dark.
pub async fn theme(current: CurrentSession, Form(form): Form<ThemeForm>) -> Result<Redirect> {
    let theme = form
        .theme
        .as_deref()
        .and_then(Theme::parse)
        .unwrap_or_else(|| current.state.theme.toggled());
    current.session.insert(session_keys::THEME, theme).await?;
    Ok(Redirect::to(safe_next(form.next.as_deref())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_must_be_local() {
        assert_eq!(safe_next(Some("/dashboard?days=7")), "/dashboard?days=7");
        assert_eq!(safe_next(Some("//evil.test/")), "/");
        assert_eq!(safe_next(Some("https://evil.test/")), "/");
        assert_eq!(safe_next(Some("/\\evil.test")), "/");
        assert_eq!(safe_next(None), "/");
    }
}

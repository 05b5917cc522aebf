//! Admin session
//!
//! The token itself lives in [`HttpClient`]; a 401 from any admin call
//! clears it there. This module only decides whether a login is needed.

use crate::{ClientError, ClientResult, HttpClient};

/// Admin credentials for unattended screens
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// From `MENU_ADMIN_USERNAME` / `MENU_ADMIN_PASSWORD`
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("MENU_ADMIN_USERNAME").ok().filter(|u| !u.is_empty())?;
        let password = std::env::var("MENU_ADMIN_PASSWORD").ok()?;
        Some(Self::new(username, password))
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Keep a restored token, otherwise log in with `credentials`
pub async fn ensure_login(
    http: &HttpClient,
    credentials: Option<&AdminCredentials>,
) -> ClientResult<()> {
    if http.is_authenticated() {
        tracing::debug!("Using stored admin token");
        return Ok(());
    }
    let Some(credentials) = credentials else {
        tracing::warn!("No admin token and no credentials configured");
        return Err(ClientError::Unauthorized);
    };
    http.login(&credentials.username, &credentials.password)
        .await
        .map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientConfig;

    #[test]
    fn test_debug_hides_password() {
        let credentials = AdminCredentials::new("bep", "secret");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("bep"));
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_stored_token_skips_login() {
        let http = HttpClient::new(&ClientConfig::new("http://127.0.0.1:9"))
            .unwrap()
            .with_token("restored");
        ensure_login(&http, None).await.unwrap();
        assert_eq!(http.token().as_deref(), Some("restored"));
    }

    #[tokio::test]
    async fn test_no_token_no_credentials() {
        let http = HttpClient::new(&ClientConfig::new("http://127.0.0.1:9")).unwrap();
        let result = ensure_login(&http, None).await;
        assert!(matches!(result, Err(ClientError::Unauthorized)));
    }
}

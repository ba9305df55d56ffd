use anyhow::{anyhow, Result};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

/// Session against the backend's auth endpoint (`/auth/v1`).
///
/// Cloning shares the session, so a refresh through one handle is seen by all.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
    user: AuthUser,
    refresh_token: Arc<Mutex<String>>,
    cached_token: Arc<Mutex<Option<CachedToken>>>,
}

async fn auth_error(resp: Response, what: &str) -> anyhow::Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    anyhow!("{} failed: {} - {}", what, status, body)
}

impl SupabaseAuth {
    fn from_token_response(
        client: Client,
        base_url: &str,
        anon_key: &str,
        token: TokenResponse,
    ) -> Self {
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(token.expires_in);
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            user: token.user,
            refresh_token: Arc::new(Mutex::new(token.refresh_token)),
            cached_token: Arc::new(Mutex::new(Some(CachedToken {
                access_token: token.access_token,
                expires_at,
            }))),
        }
    }

    /// Sign in with email and password.
    #[instrument(skip(anon_key, password))]
    pub async fn sign_in_with_password(
        base_url: &str,
        anon_key: &str,
        email: &str,
        password: &str,
    ) -> Result<Self> {
        let client = Client::new();
        let url = format!(
            "{}/auth/v1/token?grant_type=password",
            base_url.trim_end_matches('/')
        );

        let resp = client
            .post(&url)
            .header("apikey", anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(auth_error(resp, "Sign-in").await);
        }

        let token: TokenResponse = resp.json().await?;
        debug!(user_id = %token.user.id, "signed in");
        Ok(Self::from_token_response(client, base_url, anon_key, token))
    }

    /// Create an account. The username is stored in the user's metadata.
    ///
    /// Projects that require email confirmation return no session; that case
    /// is reported as an error and the caller should sign in after confirming.
    #[instrument(skip(anon_key, password))]
    pub async fn sign_up(
        base_url: &str,
        anon_key: &str,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<Self> {
        let client = Client::new();
        let url = format!("{}/auth/v1/signup", base_url.trim_end_matches('/'));

        let resp = client
            .post(&url)
            .header("apikey", anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "username": username },
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(auth_error(resp, "Sign-up").await);
        }

        let body: serde_json::Value = resp.json().await?;
        if body.get("access_token").is_none() {
            return Err(anyhow!(
                "Sign-up for {} returned no session; confirm the email address and sign in",
                email
            ));
        }
        let token: TokenResponse = serde_json::from_value(body)?;
        Ok(Self::from_token_response(client, base_url, anon_key, token))
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub async fn get_access_token(&self) -> Result<String> {
        // Reuse the cached token while it has more than 60s left
        {
            let cached = self.cached_token.lock().await;
            if let Some(ref token) = *cached {
                if token.expires_at > chrono::Utc::now() + chrono::Duration::seconds(60) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        self.refresh_session().await
    }

    pub async fn refresh_session(&self) -> Result<String> {
        let refresh_token = self.refresh_token.lock().await.clone();
        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.base_url);

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(auth_error(resp, "Token refresh").await);
        }

        let token: TokenResponse = resp.json().await?;
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(token.expires_in);

        // Refresh tokens rotate on every use
        *self.refresh_token.lock().await = token.refresh_token;

        let access_token = token.access_token.clone();
        *self.cached_token.lock().await = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });

        debug!(user_id = %self.user.id, "session refreshed");
        Ok(access_token)
    }

    pub async fn sign_out(&self) -> Result<()> {
        let token = self.get_access_token().await?;
        let url = format!("{}/auth/v1/logout", self.base_url);

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(auth_error(resp, "Sign-out").await);
        }

        *self.cached_token.lock().await = None;
        Ok(())
    }
}

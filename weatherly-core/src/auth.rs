//! Sign-in, sign-up and sign-out against the backend's auth REST surface,
//! plus on-disk persistence of the resulting session.

use anyhow::Context;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::{config::BackendEndpoint, error::AuthError};

/// An authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: Option<String>,
}

impl Session {
    /// Restore a previously saved session. `Ok(None)` when there is none.
    pub fn load_from(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        let session = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse session file: {}", path.display()))?;

        Ok(Some(session))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create session directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize session")?;
        fs::write(path, toml)
            .with_context(|| format!("Failed to write session file: {}", path.display()))?;

        Ok(())
    }

    /// Forget the saved session. Missing files are fine.
    pub fn clear(path: &Path) -> anyhow::Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session file: {}", path.display())),
        }
    }
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

/// Sign-up answers with a session when the project auto-confirms accounts
/// and with the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

/// Result of [`AuthClient::sign_up`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    /// The account exists but must be confirmed by email before signing in.
    ConfirmationPending,
}

#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    endpoint: BackendEndpoint,
    http: Client,
}

impl AuthClient {
    pub fn new(endpoint: BackendEndpoint) -> Self {
        Self {
            endpoint,
            http: Client::new(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let creds = validate(email, password)?;
        let url = format!("{}/auth/v1/token", self.endpoint.url);

        let res = self
            .http
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.endpoint.anon_key)
            .json(&creds)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let body = success_body(res).await?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        tracing::info!(user_id = %token.user.id, "Signed in");

        Ok(token.into())
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let creds = validate(email, password)?;
        let url = format!("{}/auth/v1/signup", self.endpoint.url);

        let res = self
            .http
            .post(&url)
            .header("apikey", &self.endpoint.anon_key)
            .json(&creds)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let body = success_body(res).await?;
        match serde_json::from_str::<SignUpResponse>(&body)? {
            SignUpResponse::Session(token) => {
                tracing::info!(user_id = %token.user.id, "Signed up");
                Ok(SignUpOutcome::SignedIn(token.into()))
            }
            SignUpResponse::User(user) => {
                tracing::info!(user_id = %user.id, "Signed up, confirmation pending");
                Ok(SignUpOutcome::ConfirmationPending)
            }
        }
    }

    /// Revoke the session server-side.
    pub async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/logout", self.endpoint.url);

        let res = self
            .http
            .post(&url)
            .header("apikey", &self.endpoint.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        success_body(res).await?;
        tracing::info!(user_id = %session.user_id, "Signed out");
        Ok(())
    }
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            user_id: token.user.id,
            email: token.user.email,
        }
    }
}

fn validate<'a>(email: &'a str, password: &'a str) -> Result<Credentials<'a>, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(Credentials { email, password })
}

async fn success_body(res: Response) -> Result<String, AuthError> {
    let status = res.status();
    let body = res.text().await.map_err(AuthError::Transport)?;

    if status.is_success() {
        return Ok(body);
    }

    let parsed: AuthErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    tracing::debug!(%status, %message, "Auth request rejected");
    Err(AuthError::Rejected { status, message })
}

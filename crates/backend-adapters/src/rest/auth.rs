//! Auth-endpoint implementation: password grants, account lifecycle and
//! session-change notification.

use async_trait::async_trait;
use domains::error::{AppError, Result};
use domains::models::{Session, SessionEvent, SignUpData};
use domains::ports::AuthProvider;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{expect_success, read_json, transport, RestBackend};

#[derive(Deserialize)]
struct AuthUser {
    id: Uuid,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    user: AuthUser,
}

/// Sign-up answers either a full token pair or, with e-mail confirmation
/// turned on, just the created user.
#[derive(Deserialize)]
struct SignUpResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    #[allow(dead_code)]
    user: Option<AuthUser>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
        }
    }
}

#[async_trait]
impl AuthProvider for RestBackend {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.stored_session())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let resp = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.anon_key.expose_secret())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport)?;
        let token: TokenResponse = read_json(resp).await.map_err(reject_credentials)?;
        let session = token.into_session();
        self.store_session(Some(session.clone()));
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, data: &SignUpData) -> Result<Option<Session>> {
        let resp = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", self.anon_key.expose_secret())
            .json(&json!({
                "email": data.email,
                "password": data.password,
                // Rides into the profile row the backend creates on signup.
                "data": { "name": data.name, "username": data.username },
            }))
            .send()
            .await
            .map_err(transport)?;
        let created: SignUpResponse = read_json(resp).await?;
        match created {
            SignUpResponse {
                access_token: Some(access_token),
                refresh_token,
                user: Some(user),
            } => {
                let session = Session {
                    access_token,
                    refresh_token,
                    user_id: user.id,
                };
                self.store_session(Some(session.clone()));
                self.emit(SessionEvent::SignedIn(session.clone()));
                Ok(Some(session))
            }
            // Verification e-mail pending; no session yet.
            _ => Ok(None),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        let resp = self
            .authed(self.http.post(self.auth_url("logout")))
            .send()
            .await;
        // The local session dies regardless: a failed revoke must not trap
        // the user in a signed-in shell.
        match resp {
            Ok(resp) => {
                if let Err(err) = expect_success(resp).await {
                    tracing::warn!(error = %err, "remote sign-out failed; clearing session anyway");
                }
            }
            Err(err) => {
                tracing::warn!(error = %transport(err), "remote sign-out unreachable; clearing session anyway");
            }
        }
        self.store_session(None);
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.auth_url("recover"))
            .header("apikey", self.anon_key.expose_secret())
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(transport)?;
        expect_success(resp).await
    }

    async fn resend_verification(&self, email: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.auth_url("resend"))
            .header("apikey", self.anon_key.expose_secret())
            .json(&json!({ "type": "signup", "email": email }))
            .send()
            .await
            .map_err(transport)?;
        expect_success(resp).await
    }

    async fn update_password(&self, new_password: &str) -> Result<()> {
        if self.stored_session().is_none() {
            return Err(AppError::unauthorized("password change requires a session"));
        }
        let resp = self
            .authed(self.http.put(self.auth_url("user")))
            .json(&json!({ "password": new_password }))
            .send()
            .await
            .map_err(transport)?;
        expect_success(resp).await
    }
}

/// The token endpoint answers 400 for wrong credentials; surface that as
/// an auth failure instead of a generic backend error.
fn reject_credentials(err: AppError) -> AppError {
    match err {
        AppError::Backend { status: 400, message } => AppError::Unauthorized(message),
        other => other,
    }
}

// Auth endpoints
//
// Token-based: login returns a bearer token which the caller arms via
// `ApiClient::set_token`. The client never persists credentials itself;
// that is the session-store collaborator's job.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::SessionDto;

impl ApiClient {
    /// Authenticate with email + password.
    ///
    /// `POST /api/auth/login`
    ///
    /// Returns the session token and cached user profile. Does NOT arm the
    /// token on this client -- the engine decides what to store and arm.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<SessionDto, Error> {
        debug!(%email, "logging in");

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let session: SessionDto = match self.post("api/auth/login", &body).await {
            Ok(session) => session,
            // A 401 here is bad credentials, not an expired session.
            Err(Error::SessionExpired) => {
                return Err(Error::Authentication {
                    message: "invalid email or password".into(),
                });
            }
            Err(e) => return Err(e),
        };

        debug!("login successful");
        Ok(session)
    }

    /// Create a new account.
    ///
    /// `POST /api/auth/signup`
    pub async fn signup(
        &self,
        email: &str,
        password: &SecretString,
        name: Option<&str>,
    ) -> Result<SessionDto, Error> {
        debug!(%email, "signing up");

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
            "name": name,
        });

        self.post("api/auth/signup", &body).await
    }

    /// Request a password-reset email.
    ///
    /// `POST /api/auth/forgot-password`
    pub async fn forgot_password(&self, email: &str) -> Result<(), Error> {
        debug!(%email, "requesting password reset");
        self.post_empty("api/auth/forgot-password", &json!({ "email": email }))
            .await
    }
}

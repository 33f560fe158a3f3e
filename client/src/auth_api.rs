use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use portal_auth::{Authenticator, CredentialToken, Credentials, Grant};
use portal_core::{PortalError, PortalResult, Principal};

use crate::http::ApiClient;

/// `Authenticator` backed by the portal API's login endpoint
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    api: ApiClient,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    user: Principal,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: Principal,
}

impl HttpAuthenticator {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> PortalResult<Grant> {
        let request = self
            .api
            .request(Method::POST, "/auth/login")
            .json(&LoginRequest {
                email: &credentials.email,
                password: &credentials.password,
            });

        match self.api.send::<LoginResponse>(request).await {
            Ok(body) => Ok(Grant {
                token: CredentialToken::new(body.access_token),
                principal: body.user,
            }),
            // Missing fields (400) and wrong credentials (401) look the same to the caller
            Err(PortalError::Unauthorized(message)) | Err(PortalError::Validation(message)) => {
                debug!(%message, "Login rejected");
                Err(PortalError::InvalidCredentials)
            }
            Err(e) => Err(e),
        }
    }

    async fn confirm(
        &self,
        token: &CredentialToken,
        principal: &Principal,
    ) -> PortalResult<Principal> {
        let request = self
            .api
            .request(Method::GET, &format!("/users/{}", principal.id))
            .bearer_auth(token.expose());

        let body: UserEnvelope = self.api.send(request).await?;
        Ok(body.user)
    }
}

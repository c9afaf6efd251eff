//! Credential lifecycle: dynamic client registration, password-grant token
//! issuance, and token revocation.
//!
//! Registration and token failures are fatal to a run; nothing downstream
//! can proceed without credentials. Revocation is best-effort cleanup and
//! the orchestrator only logs its failures.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{HttpFailure, MigrateError, Result};
use crate::http::Gateway;

pub const REGISTER_PATH: &str = "/client-registration/v0.17/register";
pub const TOKEN_PATH: &str = "/oauth2/token";
pub const REVOKE_PATH: &str = "/oauth2/revoke";

/// The dynamically registered OAuth client identifying this tool.
/// Lives for one run and is never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRegistration {
    #[serde(rename = "clientId")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

/// Bearer credential used by every export/import/mapping call.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    pub token: String,
}

#[derive(Serialize)]
struct RegistrationRequest<'a> {
    #[serde(rename = "callbackUrl")]
    callback_url: &'a str,
    #[serde(rename = "clientName")]
    client_name: &'a str,
    owner: &'a str,
    #[serde(rename = "grantType")]
    grant_type: &'a str,
    #[serde(rename = "saasApp")]
    saas_app: bool,
}

pub struct AuthManager<'a> {
    gateway: &'a Gateway,
    config: &'a Config,
}

impl<'a> AuthManager<'a> {
    pub fn new(gateway: &'a Gateway, config: &'a Config) -> Self {
        Self { gateway, config }
    }

    /// Register a dynamic client with the platform, authenticating as the
    /// configured operator.
    pub async fn register(&self) -> Result<ClientRegistration> {
        tracing::info!("registering a dynamic client");
        let registration = self
            .try_register()
            .await
            .map_err(|source| MigrateError::Registration { source })?;
        tracing::info!(client_id = %registration.client_id, "dynamic client registered");
        Ok(registration)
    }

    async fn try_register(&self) -> std::result::Result<ClientRegistration, HttpFailure> {
        let dcr = &self.config.dynamic_client_registration;
        let request = RegistrationRequest {
            callback_url: &dcr.callback_url,
            client_name: &dcr.client_name,
            owner: &dcr.owner,
            grant_type: &dcr.grant_types,
            saas_app: dcr.saas_app,
        };

        let response = self
            .gateway
            .request(Method::POST, REGISTER_PATH)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&request)
            .send()
            .await?;
        self.gateway.read_json(response).await
    }

    /// Exchange the operator credentials and the dynamic client for a
    /// bearer token via the password grant.
    pub async fn token(&self, client: &ClientRegistration) -> Result<AccessToken> {
        tracing::info!("requesting an access token");
        let token = self
            .try_token(client)
            .await
            .map_err(|source| MigrateError::Token { source })?;
        tracing::info!("access token issued");
        Ok(token)
    }

    async fn try_token(
        &self,
        client: &ClientRegistration,
    ) -> std::result::Result<AccessToken, HttpFailure> {
        let form = [
            ("grant_type", "password"),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
            ("scope", self.config.scopes.as_str()),
        ];

        let response = self
            .gateway
            .request(Method::POST, TOKEN_PATH)
            .basic_auth(&client.client_id, Some(&client.client_secret))
            .form(&form)
            .send()
            .await?;
        self.gateway.read_json(response).await
    }

    /// Revoke the access token. The caller treats failures as non-fatal;
    /// by this point the run has already done its work.
    pub async fn revoke(&self, token: &AccessToken, client: &ClientRegistration) -> Result<()> {
        tracing::info!("revoking the access token");
        self.try_revoke(token, client)
            .await
            .map_err(|source| MigrateError::Revoke { source })?;
        tracing::info!("access token revoked");
        Ok(())
    }

    async fn try_revoke(
        &self,
        token: &AccessToken,
        client: &ClientRegistration,
    ) -> std::result::Result<(), HttpFailure> {
        let form = [("token", token.token.as_str())];

        let response = self
            .gateway
            .request(Method::POST, REVOKE_PATH)
            .basic_auth(&client.client_id, Some(&client.client_secret))
            .form(&form)
            .send()
            .await?;
        // The revoke endpoint returns an empty body on success.
        let _: Vec<u8> = self.gateway.read_bytes(response).await?;
        Ok(())
    }
}

//! Application import: replay archives onto the target environment and
//! re-establish OAuth key-manager bindings.
//!
//! Each archive runs its full sequence — metadata read, import call, all key
//! mappings — before the next archive starts. A failure anywhere in one
//! archive's sequence is counted and never aborts the batch; a failed
//! mapping likewise never suppresses the remaining (stage, key manager)
//! combinations for the same application.

use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::archive::{self, ApplicationMetadata, KeyStage, OAuthApp};
use crate::auth::AccessToken;
use crate::config::Config;
use crate::error::{HttpFailure, MappingFailure, MigrateError, Result};
use crate::http::Gateway;
use crate::throttle::Throttle;

pub const IMPORT_PATH: &str = "/api/am/admin/v1/import/applications";

/// Path of the map-keys endpoint for an imported application.
pub fn map_keys_path(application_id: &str) -> String {
    format!("/api/am/store/v1/applications/{application_id}/map-keys")
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    #[serde(rename = "applicationId")]
    application_id: String,
}

#[derive(Serialize)]
struct MapKeysRequest<'a> {
    #[serde(rename = "consumerKey")]
    consumer_key: &'a str,
    #[serde(rename = "consumerSecret")]
    consumer_secret: &'a str,
    #[serde(rename = "keyManager")]
    key_manager: &'a str,
    #[serde(rename = "keyType")]
    key_type: &'a str,
}

/// Per-item outcome of an import run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: usize,
    pub keys_mapped: usize,
    pub mappings_failed: usize,
}

pub struct Importer<'a> {
    gateway: &'a Gateway,
    config: &'a Config,
    throttle: &'a Throttle,
}

impl<'a> Importer<'a> {
    pub fn new(gateway: &'a Gateway, config: &'a Config, throttle: &'a Throttle) -> Self {
        Self {
            gateway,
            config,
            throttle,
        }
    }

    /// Discover archives in the configured directory and replay each one.
    pub async fn import_all(&self, token: &AccessToken) -> Result<ImportReport> {
        let dir = self.config.archive_dir();
        let mut report = ImportReport::default();

        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "archive directory does not exist; nothing to import");
            return Ok(report);
        }

        let mut archives = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "zip") {
                archives.push(path);
            }
        }
        tracing::info!("discovered {} archive(s) in {}", archives.len(), dir.display());

        for path in &archives {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            match archive::parse_archive_file_name(file_name) {
                Ok((owner, name)) => {
                    self.import_archive(token, path, &owner, &name, &mut report)
                        .await;
                }
                Err(e) => {
                    tracing::error!("skipping archive: {e}");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Run the full sequence for one archive: parse metadata, import, remap
    /// keys for every (stage, key manager) pair present in the metadata.
    async fn import_archive(
        &self,
        token: &AccessToken,
        path: &Path,
        owner: &str,
        name: &str,
        report: &mut ImportReport,
    ) {
        let metadata = match archive::read_metadata(path, name) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!("{e}");
                report.failed += 1;
                return;
            }
        };
        if self.config.log.debug {
            tracing::debug!(%owner, %name, ?metadata, "archive metadata");
        }

        let application_id = match self.import_one(token, path, owner, name).await {
            Ok(id) => {
                report.imported += 1;
                id
            }
            Err(e) => {
                tracing::error!("{e}");
                report.failed += 1;
                return;
            }
        };

        for key_manager in &self.config.keymanagers {
            for stage in KeyStage::ALL {
                let Some(oauth_app) = metadata.binding(stage, key_manager) else {
                    continue;
                };
                match self
                    .map_keys(token, &application_id, key_manager, stage, oauth_app)
                    .await
                {
                    Ok(()) => report.keys_mapped += 1,
                    Err(e) => {
                        tracing::error!("{e}");
                        report.mappings_failed += 1;
                    }
                }
            }
        }
    }

    /// Upload one archive to the import endpoint. Returns the application id
    /// assigned by the target environment.
    pub async fn import_one(
        &self,
        token: &AccessToken,
        path: &Path,
        owner: &str,
        name: &str,
    ) -> Result<String> {
        tracing::info!(%owner, %name, "importing application");

        let payload = archive::read_payload(path)?;
        let application_id = self
            .try_import(token, payload, owner)
            .await
            .map_err(|source| MigrateError::Import {
                owner: owner.to_string(),
                name: name.to_string(),
                source,
            })?;

        tracing::info!(%owner, %name, %application_id, "application imported");
        Ok(application_id)
    }

    async fn try_import(
        &self,
        token: &AccessToken,
        payload: Vec<u8>,
        owner: &str,
    ) -> std::result::Result<String, HttpFailure> {
        let import = &self.config.import;
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(payload));

        let response = self
            .gateway
            .request(Method::POST, IMPORT_PATH)
            .query(&[
                ("preserveOwner", import.preserve_owner.to_string()),
                ("skipSubscriptions", import.skip_subscriptions.to_string()),
                ("appOwner", owner.to_string()),
                ("skipApplicationKeys", import.skip_application_keys.to_string()),
                ("update", import.update.to_string()),
            ])
            .bearer_auth(&token.token)
            .multipart(form)
            .send()
            .await?;
        let imported: ImportResponse = self.gateway.read_json(response).await?;
        Ok(imported.application_id)
    }

    /// Bind one key manager's OAuth credentials to an imported application.
    /// The stored client secret is base64-decoded before it goes on the wire.
    pub async fn map_keys(
        &self,
        token: &AccessToken,
        application_id: &str,
        key_manager: &str,
        stage: KeyStage,
        oauth_app: &OAuthApp,
    ) -> Result<()> {
        self.throttle.wait().await;
        tracing::info!(%application_id, %key_manager, %stage, "mapping oauth keys");

        let mapping_error = |source: MappingFailure| MigrateError::Mapping {
            application_id: application_id.to_string(),
            key_manager: key_manager.to_string(),
            stage,
            source,
        };

        let consumer_secret = decode_client_secret(&oauth_app.client_secret)
            .map_err(|e| mapping_error(MappingFailure::Secret(e)))?;

        if self.config.log.debug {
            tracing::debug!(%application_id, consumer_key = %oauth_app.client_id, %key_manager, %stage, "map-keys request");
        }

        let request = MapKeysRequest {
            consumer_key: &oauth_app.client_id,
            consumer_secret: &consumer_secret,
            key_manager,
            key_type: stage.as_str(),
        };
        self.try_map_keys(token, application_id, &request)
            .await
            .map_err(|source| mapping_error(source.into()))?;

        tracing::info!(%application_id, %key_manager, %stage, "keys mapped");
        Ok(())
    }

    async fn try_map_keys(
        &self,
        token: &AccessToken,
        application_id: &str,
        request: &MapKeysRequest<'_>,
    ) -> std::result::Result<(), HttpFailure> {
        let response = self
            .gateway
            .request(Method::POST, &map_keys_path(application_id))
            .bearer_auth(&token.token)
            .json(request)
            .send()
            .await?;
        let _: Vec<u8> = self.gateway.read_bytes(response).await?;
        Ok(())
    }
}

/// Decode the base64 client secret stored in archive metadata.
fn decode_client_secret(encoded: &str) -> std::result::Result<String, String> {
    let bytes = BASE64.decode(encoded).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

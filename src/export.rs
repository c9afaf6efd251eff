//! Application export: enumerate the source environment and write one
//! archive per application.
//!
//! A failed export for one application is logged and counted; the loop
//! always moves on to the next application.

use std::fs;
use std::path::PathBuf;

use reqwest::Method;
use serde::Deserialize;

use crate::archive;
use crate::auth::AccessToken;
use crate::config::Config;
use crate::error::{HttpFailure, MigrateError, Result};
use crate::http::Gateway;
use crate::throttle::Throttle;

pub const LIST_PATH: &str = "/api/am/admin/v1/applications";
pub const EXPORT_PATH: &str = "/api/am/admin/v1/export/applications";

/// One application known to the source environment.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSummary {
    pub name: String,
    pub owner: String,
}

#[derive(Debug, Deserialize)]
struct ApplicationList {
    list: Vec<ApplicationSummary>,
}

/// Per-item outcome of an export run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub exported: usize,
    pub failed: usize,
}

pub struct Exporter<'a> {
    gateway: &'a Gateway,
    config: &'a Config,
    throttle: &'a Throttle,
}

impl<'a> Exporter<'a> {
    pub fn new(gateway: &'a Gateway, config: &'a Config, throttle: &'a Throttle) -> Self {
        Self {
            gateway,
            config,
            throttle,
        }
    }

    /// List all applications on the source environment.
    pub async fn list_applications(&self, token: &AccessToken) -> Result<Vec<ApplicationSummary>> {
        tracing::info!("listing applications");
        let applications = self
            .try_list(token)
            .await
            .map_err(|source| MigrateError::List { source })?;
        tracing::info!("found {} application(s)", applications.len());
        Ok(applications)
    }

    async fn try_list(
        &self,
        token: &AccessToken,
    ) -> std::result::Result<Vec<ApplicationSummary>, HttpFailure> {
        let response = self
            .gateway
            .request(Method::GET, LIST_PATH)
            .bearer_auth(&token.token)
            .send()
            .await?;
        let list: ApplicationList = self.gateway.read_json(response).await?;
        Ok(list.list)
    }

    /// Export a single application and persist it under the canonical
    /// archive file name. The throttle runs before every export call.
    pub async fn export_one(
        &self,
        token: &AccessToken,
        name: &str,
        owner: &str,
    ) -> Result<PathBuf> {
        let file_name = archive::archive_file_name(owner, name)?;

        self.throttle.wait().await;
        tracing::info!(%owner, %name, "exporting application");

        let payload = self
            .try_export(token, name, owner)
            .await
            .map_err(|source| MigrateError::Export {
                owner: owner.to_string(),
                name: name.to_string(),
                source,
            })?;

        let dir = self.config.archive_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        fs::write(&path, &payload)?;

        tracing::info!(%owner, %name, path = %path.display(), "application exported");
        Ok(path)
    }

    async fn try_export(
        &self,
        token: &AccessToken,
        name: &str,
        owner: &str,
    ) -> std::result::Result<Vec<u8>, HttpFailure> {
        let response = self
            .gateway
            .request(Method::GET, EXPORT_PATH)
            .query(&[
                ("appName", name),
                ("appOwner", owner),
                ("withKeys", &self.config.export.with_keys.to_string()),
            ])
            .bearer_auth(&token.token)
            .send()
            .await?;
        self.gateway.read_bytes(response).await
    }

    /// Export every listed application, isolating per-application failures.
    pub async fn export_all(&self, token: &AccessToken) -> Result<ExportReport> {
        let applications = self.list_applications(token).await?;

        let mut report = ExportReport::default();
        for application in &applications {
            match self
                .export_one(token, &application.name, &application.owner)
                .await
            {
                Ok(_) => report.exported += 1,
                Err(e) => {
                    tracing::error!(
                        owner = %application.owner,
                        name = %application.name,
                        "export failed: {e}"
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

//! End-to-end orchestration of a migration run.
//!
//! The sequence is linear: register a dynamic client, obtain a token, run
//! the requested export and/or import branch, then revoke the token. The
//! revocation is attempted exactly once whenever a token was issued, even
//! when a branch failed — a run must not leak a live credential.

use std::fmt;

use crate::auth::AuthManager;
use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::export::Exporter;
use crate::http::Gateway;
use crate::import::Importer;
use crate::throttle::Throttle;

/// Which branches a run executes. Neither flag set is a valid no-op run
/// that performs no network activity at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    pub export: bool,
    pub import: bool,
}

impl RunMode {
    pub fn is_noop(&self) -> bool {
        !self.export && !self.import
    }
}

/// Per-item counts reported at the end of a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub exported: usize,
    pub export_failed: usize,
    pub imported: usize,
    pub import_failed: usize,
    pub keys_mapped: usize,
    pub mappings_failed: usize,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        self.export_failed + self.import_failed + self.mappings_failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "exported {} ({} failed), imported {} ({} failed), keys mapped {} ({} failed)",
            self.exported,
            self.export_failed,
            self.imported,
            self.import_failed,
            self.keys_mapped,
            self.mappings_failed
        )
    }
}

/// Execute a migration run.
///
/// Registration and token failures abort immediately. Branch-level failures
/// (an unreachable list endpoint, an unreadable archive directory) are
/// deferred until after revocation and then surfaced to the caller;
/// per-item failures only show up in the summary counts.
pub async fn run(config: &Config, mode: RunMode) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    if mode.is_noop() {
        return Ok(summary);
    }

    let gateway = Gateway::new(config)?;
    let throttle = Throttle::new(config.throttle_interval());
    let auth = AuthManager::new(&gateway, config);

    let registration = auth.register().await?;
    let token = auth.token(&registration).await?;

    let mut branch_error: Option<MigrateError> = None;

    if mode.export {
        let exporter = Exporter::new(&gateway, config, &throttle);
        match exporter.export_all(&token).await {
            Ok(report) => {
                summary.exported = report.exported;
                summary.export_failed = report.failed;
            }
            Err(e) => {
                tracing::error!("export branch failed: {e}");
                branch_error = Some(e);
            }
        }
    }

    if mode.import {
        let importer = Importer::new(&gateway, config, &throttle);
        match importer.import_all(&token).await {
            Ok(report) => {
                summary.imported = report.imported;
                summary.import_failed = report.failed;
                summary.keys_mapped = report.keys_mapped;
                summary.mappings_failed = report.mappings_failed;
            }
            Err(e) => {
                tracing::error!("import branch failed: {e}");
                branch_error.get_or_insert(e);
            }
        }
    }

    // Best-effort cleanup: never a condition for the run's success.
    if let Err(e) = auth.revoke(&token, &registration).await {
        tracing::warn!("{e}");
    }

    match branch_error {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}

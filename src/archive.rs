//! Application archive handling.
//!
//! An exported application is a zip file named `{owner}_{name}.zip` whose
//! top-level entry `{name}/{name}.json` describes the application, including
//! its per-key-manager OAuth credentials. The file-name convention is the
//! interchange format between export and import runs, so both directions go
//! through the same encode/decode pair here.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{MigrateError, Result};

const SEPARATOR: char = '_';
const SUFFIX: &str = ".zip";

/// Deployment stage a set of OAuth keys belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStage {
    Production,
    Sandbox,
}

impl KeyStage {
    /// Both stages, in the order the platform documents them.
    pub const ALL: [KeyStage; 2] = [KeyStage::Production, KeyStage::Sandbox];

    /// The stage identifier as it appears in archive metadata and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStage::Production => "PRODUCTION",
            KeyStage::Sandbox => "SANDBOX",
        }
    }
}

impl fmt::Display for KeyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One key manager's OAuth application as stored in archive metadata.
/// The client secret is base64-encoded at rest.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthApp {
    #[serde(rename = "clientId")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

/// The JSON metadata entry embedded in an application archive.
///
/// Only the key-manager bindings are of interest here; the rest of the
/// document is replayed untouched as part of the raw archive payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationMetadata {
    #[serde(rename = "keyManagerWiseOAuthApp", default)]
    pub key_manager_wise_oauth_app: Option<HashMap<String, HashMap<String, OAuthApp>>>,
}

impl ApplicationMetadata {
    /// Look up the OAuth app for a (stage, key manager) pair. Absence at any
    /// level means there is nothing to map, which is not an error.
    pub fn binding(&self, stage: KeyStage, key_manager: &str) -> Option<&OAuthApp> {
        self.key_manager_wise_oauth_app
            .as_ref()?
            .get(stage.as_str())?
            .get(key_manager)
    }
}

/// Build the canonical archive file name `{owner}_{name}.zip`.
///
/// Rejects owners containing the separator and names containing the
/// separator or a dot, since either would make the name ambiguous to decode.
pub fn archive_file_name(owner: &str, name: &str) -> Result<String> {
    if owner.is_empty() || name.is_empty() {
        return Err(MigrateError::config(format!(
            "cannot name archive for empty owner or application name ({owner:?}, {name:?})"
        )));
    }
    if owner.contains(SEPARATOR) {
        return Err(MigrateError::config(format!(
            "application owner {owner:?} contains '{SEPARATOR}', which is reserved in archive names"
        )));
    }
    if name.contains(SEPARATOR) || name.contains('.') {
        return Err(MigrateError::config(format!(
            "application name {name:?} contains '{SEPARATOR}' or '.', which are reserved in archive names"
        )));
    }
    Ok(format!("{owner}{SEPARATOR}{name}{SUFFIX}"))
}

/// Decode an archive file name back into `(owner, name)`.
///
/// This is the single place the `{owner}_{name}.zip` convention is parsed;
/// malformed names fail explicitly instead of being split ad hoc.
pub fn parse_archive_file_name(file_name: &str) -> Result<(String, String)> {
    let malformed = |reason: &str| MigrateError::archive(file_name, reason);

    let stem = file_name
        .strip_suffix(SUFFIX)
        .ok_or_else(|| malformed("missing .zip suffix"))?;
    let (owner, name) = stem
        .split_once(SEPARATOR)
        .ok_or_else(|| malformed("expected {owner}_{name}.zip"))?;
    if owner.is_empty() || name.is_empty() {
        return Err(malformed("empty owner or application name"));
    }
    if name.contains(SEPARATOR) || name.contains('.') {
        return Err(malformed("application name contains reserved characters"));
    }
    Ok((owner.to_string(), name.to_string()))
}

/// Read the metadata entry `{name}/{name}.json` out of an archive without
/// extracting anything else.
pub fn read_metadata(path: &Path, name: &str) -> Result<ApplicationMetadata> {
    let file = File::open(path).map_err(|e| MigrateError::archive(path, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| MigrateError::archive(path, e))?;

    let entry_name = format!("{name}/{name}.json");
    let mut entry = zip
        .by_name(&entry_name)
        .map_err(|e| MigrateError::archive(path, format!("entry {entry_name}: {e}")))?;

    let mut body = String::new();
    entry
        .read_to_string(&mut body)
        .map_err(|e| MigrateError::archive(path, format!("entry {entry_name}: {e}")))?;

    serde_json::from_str(&body)
        .map_err(|e| MigrateError::archive(path, format!("entry {entry_name}: {e}")))
}

/// Read the whole archive payload for re-upload. The import endpoint expects
/// the complete container, not individual entries.
pub fn read_payload(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| MigrateError::archive(path, e))
}

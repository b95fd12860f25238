use std::{fmt, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

use crate::common;

/// Hex SHA-256 of the JSON serialization of `data`.
pub(crate) fn fingerprint_of<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    let bytes = serde_json::to_vec(data).context("[cache] failed to serialize fingerprint input")?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Pipeline stages whose outputs are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Results,
    Compare,
    Popularity,
    Values,
    Combined,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Results => "results",
            Stage::Compare => "compare",
            Stage::Popularity => "popularity",
            Stage::Values => "values",
            Stage::Combined => "combined",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Identity of one stage output: the stage, the elections involved, and a
/// fingerprint of every input that determines it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StageKey {
    pub stage: Stage,
    pub source: Option<String>,
    pub target: Option<String>,
    pub fingerprint: String,
}

impl StageKey {
    pub fn new(stage: Stage, source: Option<&str>, target: Option<&str>, fingerprint: String) -> Self {
        Self {
            stage,
            source: source.map(str::to_string),
            target: target.map(str::to_string),
            fingerprint,
        }
    }

    /// File name of the artifact: readable prefix plus a short key digest.
    pub fn file_name(&self) -> Result<String> {
        let digest = fingerprint_of(self)?;
        let mut name = self.stage.as_str().to_string();
        if let Some(source) = &self.source { name.push('_'); name.push_str(source) }
        if let Some(target) = &self.target { name.push_str("_for_"); name.push_str(target) }
        Ok(format!("{name}.{}.json", &digest[..12]))
    }
}

/// Directory of persisted stage outputs, addressed by [`StageKey`].
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    dir: PathBuf,
}

impl ArtifactCache {
    pub fn new(dir: &Path) -> Result<Self> {
        common::ensure_dir_exists(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    #[inline] pub fn dir(&self) -> &Path { &self.dir }

    /// Path of the artifact for `key`.
    pub fn path(&self, key: &StageKey) -> Result<PathBuf> {
        Ok(self.dir.join(key.file_name()?))
    }

    /// Load the artifact for `key`, if present and readable.
    pub fn load<T: DeserializeOwned>(&self, key: &StageKey) -> Result<Option<T>> {
        let path = self.path(key)?;
        if !path.exists() { return Ok(None) }

        match common::read_json(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unreadable cache artifact, recomputing");
                Ok(None)
            }
        }
    }

    /// Persist the artifact for `key` at full precision, so a later hit
    /// reads back exactly what was computed.
    pub fn store<T: Serialize>(&self, key: &StageKey, data: &T) -> Result<PathBuf> {
        let path = self.path(key)?;
        common::write_json(&path, data)?;
        Ok(path)
    }

    /// Return the cached artifact for `key`, or compute and persist it.
    /// `force` skips the lookup.
    pub fn get_or_compute<T, F>(&self, key: &StageKey, force: bool, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if !force {
            if let Some(data) = self.load(key)? {
                tracing::debug!(stage = %key.stage, source = ?key.source, target = ?key.target, "cache hit");
                return Ok(data);
            }
        }

        let data = compute()
            .with_context(|| format!("[cache] stage {} failed", key.stage))?;
        let path = self.store(key, &data)?;
        tracing::debug!(stage = %key.stage, path = %path.display(), "artifact written");
        Ok(data)
    }
}

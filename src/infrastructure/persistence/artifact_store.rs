use crate::application::ml::{ModelArtifact, ScalerArtifact, TokenArtifacts};
use crate::domain::errors::ArtifactError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const MODEL_FILE: &str = "model.json";
const SCALER_FILE: &str = "scaler.json";

/// Filesystem layout `<root>/<external_id>/{model,scaler}.json`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn token_dir(&self, token_id: &str) -> PathBuf {
        // Provider ids are slugs; strip anything that could escape the root.
        let safe: String = token_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        self.root.join(safe)
    }

    pub fn model_path(&self, token_id: &str) -> PathBuf {
        self.token_dir(token_id).join(MODEL_FILE)
    }

    pub fn scaler_path(&self, token_id: &str) -> PathBuf {
        self.token_dir(token_id).join(SCALER_FILE)
    }

    /// Loads the model/scaler pair for `token_id`.
    ///
    /// Absent files are `NotFound`. Unreadable JSON or a model whose layers
    /// do not chain together is `Corrupt`, and a pair from two different
    /// training runs is `Mismatch`.
    pub fn load(&self, token_id: &str) -> Result<TokenArtifacts, ArtifactError> {
        let model_path = self.model_path(token_id);
        let scaler_path = self.scaler_path(token_id);
        info!(
            "ArtifactStore: Looking for model at {:?}, scaler at {:?}",
            model_path, scaler_path
        );

        for path in [&model_path, &scaler_path] {
            if !path.exists() {
                warn!("ArtifactStore: Artifact not found at {:?}", path);
                return Err(ArtifactError::NotFound { path: path.clone() });
            }
        }

        let model: ModelArtifact = read_json(&model_path)?;
        let scaler: ScalerArtifact = read_json(&scaler_path)?;

        if let Err(e) = model.model.validate() {
            error!("ArtifactStore: Rejecting model at {:?}: {}", model_path, e);
            return Err(ArtifactError::Corrupt {
                path: model_path,
                reason: e.to_string(),
            });
        }

        for (path, owner) in [(&model_path, &model.token_id), (&scaler_path, &scaler.token_id)] {
            if owner != token_id {
                error!(
                    "ArtifactStore: {:?} belongs to {}, expected {}",
                    path, owner, token_id
                );
                return Err(ArtifactError::Corrupt {
                    path: path.clone(),
                    reason: format!("artifact belongs to token {}", owner),
                });
            }
        }

        if model.run_id != scaler.run_id {
            error!(
                "ArtifactStore: Model run {} does not match scaler run {} for {}",
                model.run_id, scaler.run_id, token_id
            );
            return Err(ArtifactError::Mismatch {
                token_id: token_id.to_string(),
                model_run: model.run_id.to_string(),
                scaler_run: scaler.run_id.to_string(),
            });
        }

        info!(
            "ArtifactStore: Loaded model and scaler for {} (run {})",
            token_id, model.run_id
        );
        Ok(TokenArtifacts { model, scaler })
    }

    /// Writes both artifacts, replacing any previous pair.
    pub fn save(&self, artifacts: &TokenArtifacts) -> Result<(), ArtifactError> {
        let token_id = &artifacts.model.token_id;
        let dir = self.token_dir(token_id);
        fs::create_dir_all(&dir).map_err(|source| ArtifactError::Io {
            path: dir.clone(),
            source,
        })?;

        write_json(&self.scaler_path(token_id), &artifacts.scaler)?;
        write_json(&self.model_path(token_id), &artifacts.model)?;

        info!(
            "ArtifactStore: Saved model and scaler for {} to {:?} (run {})",
            token_id,
            dir,
            artifacts.run_id()
        );
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| {
        error!("ArtifactStore: Failed to parse {:?}: {}", path, e);
        ArtifactError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };
    let content = serde_json::to_string(value).map_err(|e| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    // Atomic write: write to temp file then rename
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(io_err)?;
    fs::rename(&temp_path, path).map_err(io_err)?;
    Ok(())
}

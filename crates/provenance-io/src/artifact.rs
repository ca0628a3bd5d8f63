//! Directory artifact holding a trained profile and its metadata.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use provenance_model::{ProfileAnalyzer, ProfileMetadata};
use provenance_text::AnalyzerPool;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Artifact layout version written by this build.
pub const FORMAT_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";
const METADATA_FILE: &str = "profile.json";
const MODEL_FILE: &str = "model.bin";

/// Summary written next to the model so tools can check it without decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Artifact layout version.
    pub format_version: u32,
    /// Profile name.
    pub name: String,
    /// When the profile was trained.
    pub created: DateTime<Utc>,
}

/// Versioned wrapper around the serialized analyzer in `model.bin`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileEnvelope<A> {
    /// Artifact layout version.
    pub format_version: u32,
    /// The trained profile.
    pub analyzer: A,
}

/// A trained profile together with its metadata.
///
/// Stored as a directory named after the profile:
///
/// | File | Content |
/// |---|---|
/// | `manifest.json` | [`Manifest`] |
/// | `profile.json` | [`ProfileMetadata`] |
/// | `model.bin` | bincode [`ProfileEnvelope`] |
/// | `{encoding,language,script}.arff` | training matrices, when kept |
#[derive(Debug)]
pub struct ProfileArtifact {
    /// The trained analyzer.
    pub analyzer: ProfileAnalyzer,
    /// Training provenance.
    pub metadata: ProfileMetadata,
}

impl ProfileArtifact {
    /// Bundle a profile with its metadata.
    #[must_use]
    pub fn new(analyzer: ProfileAnalyzer, metadata: ProfileMetadata) -> Self {
        Self { analyzer, metadata }
    }

    /// Write the artifact to `{output_dir}/{name}/` and return that directory.
    ///
    /// An existing artifact of the same name is overwritten file by file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::InvalidProfileName`] | Name is not a safe directory name |
    /// | [`IoError::OutputDirCreate`] | Directory cannot be created |
    /// | [`IoError::Json`] | Manifest or metadata cannot be serialized |
    /// | [`IoError::Bincode`] | Model cannot be serialized |
    /// | [`IoError::WriteFile`] | A file cannot be written |
    #[instrument(skip_all, fields(dir = %output_dir.display(), profile = %self.metadata.name))]
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf, IoError> {
        let name = self.analyzer.name();
        validate_name(&name)?;
        let dir = output_dir.join(&name);
        fs::create_dir_all(&dir).map_err(|e| IoError::OutputDirCreate {
            path: dir.clone(),
            source: e,
        })?;

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            name,
            created: self.metadata.created,
        };
        write_json(&dir.join(MANIFEST_FILE), &manifest)?;
        write_json(&dir.join(METADATA_FILE), &self.metadata)?;

        let model_path = dir.join(MODEL_FILE);
        let envelope = ProfileEnvelope {
            format_version: FORMAT_VERSION,
            analyzer: &self.analyzer,
        };
        let bytes = bincode::serialize(&envelope).map_err(|e| IoError::Bincode {
            path: model_path.clone(),
            source: e,
        })?;
        write_file(&model_path, &bytes)?;
        debug!(bytes = bytes.len(), "model written");

        let arffs = [
            ("encoding", self.analyzer.encoding_forest().to_arff("encoding")),
            ("language", self.analyzer.language_forest().to_arff("language")),
            ("script", self.analyzer.script_forest().to_arff("script")),
        ];
        for (attribute, arff) in arffs {
            let Some(arff) = arff else { continue };
            write_file(&dir.join(format!("{attribute}.arff")), arff.as_bytes())?;
        }

        info!(path = %dir.display(), "profile artifact written");
        Ok(dir)
    }

    /// Load an artifact directory and bind its analyzer to `pool`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::FileNotFound`] | A required file is missing |
    /// | [`IoError::ReadFile`] | A file cannot be read |
    /// | [`IoError::Json`] | Manifest or metadata is malformed |
    /// | [`IoError::IncompatibleVersion`] | Written by another format version |
    /// | [`IoError::Bincode`] | Model is malformed |
    /// | [`IoError::MissingAnalyzer`] | A required analyzer is not in `pool` |
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load(dir: &Path, pool: Arc<AnalyzerPool>) -> Result<Self, IoError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest: Manifest = read_json(&manifest_path)?;
        check_version(&manifest_path, manifest.format_version)?;
        let metadata: ProfileMetadata = read_json(&dir.join(METADATA_FILE))?;

        let model_path = dir.join(MODEL_FILE);
        let bytes = read_file(&model_path)?;
        let envelope: ProfileEnvelope<ProfileAnalyzer> =
            bincode::deserialize(&bytes).map_err(|e| IoError::Bincode {
                path: model_path.clone(),
                source: e,
            })?;
        check_version(&model_path, envelope.format_version)?;

        let mut analyzer = envelope.analyzer;
        if let Some(missing) = analyzer.required().iter().find(|id| !pool.contains(id)) {
            return Err(IoError::MissingAnalyzer {
                id: missing.to_string(),
            });
        }
        analyzer.bind(pool)?;

        info!(profile = %metadata.name, "profile artifact loaded");
        Ok(Self { analyzer, metadata })
    }
}

fn validate_name(name: &str) -> Result<(), IoError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.');
    if valid {
        Ok(())
    } else {
        Err(IoError::InvalidProfileName {
            name: name.to_string(),
        })
    }
}

fn check_version(path: &Path, found: u32) -> Result<(), IoError> {
    if found == FORMAT_VERSION {
        Ok(())
    } else {
        Err(IoError::IncompatibleVersion {
            path: path.to_path_buf(),
            found,
            expected: FORMAT_VERSION,
        })
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, IoError> {
    fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
                source: e,
            }
        } else {
            IoError::ReadFile {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, IoError> {
    let bytes = read_file(path)?;
    serde_json::from_slice(&bytes).map_err(|e| IoError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<(), IoError> {
    fs::write(path, contents).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| IoError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_file(path, json.as_bytes())
}

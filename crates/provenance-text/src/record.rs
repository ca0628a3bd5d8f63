use std::path::{Path, PathBuf};

use crate::analysis::TextInfo;
use crate::encoding;
use crate::iso::{Language, Script};

/// One labeled corpus sample: raw bytes plus their declared attributes.
#[derive(Debug, Clone)]
pub struct LabeledRecord {
    path: PathBuf,
    bytes: Vec<u8>,
    encoding: String,
    language: Language,
    script: Script,
}

impl LabeledRecord {
    /// Create a record. The encoding is trimmed and lowercased.
    pub fn new(
        path: PathBuf,
        bytes: Vec<u8>,
        encoding: &str,
        language: Language,
        script: Script,
    ) -> Self {
        Self {
            path,
            bytes,
            encoding: encoding.trim().to_lowercase(),
            language,
            script,
        }
    }

    /// Return the sample's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the file name for display, or the full path if there is none.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Return the raw bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Return the declared encoding.
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Return the declared language.
    #[must_use]
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Return the declared script.
    #[must_use]
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Decode the bytes with the declared encoding.
    #[must_use]
    pub fn decode(&self) -> Option<String> {
        encoding::decode(&self.bytes, &self.encoding)
    }

    /// Return the ground truth as a [`TextInfo`].
    #[must_use]
    pub fn text_info(&self) -> TextInfo {
        TextInfo {
            size: Some(self.bytes.len()),
            encoding: Some(self.encoding.clone()),
            language: Some(self.language.clone()),
            script: Some(self.script.clone()),
        }
    }
}

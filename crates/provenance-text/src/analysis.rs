use crate::iso::{Language, Script};

/// Lowercase and trim an encoding name; blank names become `None`.
fn clean_encoding(encoding: &str) -> Option<String> {
    let trimmed = encoding.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// One ranked answer from an analyzer.
///
/// Any attribute may be absent; an analyzer only fills what it produces.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Analysis {
    encoding: Option<String>,
    language: Option<Language>,
    script: Option<Script>,
    score: Option<f64>,
}

impl Analysis {
    /// Create an empty analysis.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the encoding (trimmed and lowercased).
    #[must_use]
    pub fn with_encoding(mut self, encoding: &str) -> Self {
        self.encoding = clean_encoding(encoding);
        self
    }

    /// Set the language.
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Set the script.
    #[must_use]
    pub fn with_script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    /// Set the confidence score.
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Return the encoding, if produced.
    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Return the language, if produced.
    #[must_use]
    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    /// Return the script, if produced.
    #[must_use]
    pub fn script(&self) -> Option<&Script> {
        self.script.as_ref()
    }

    /// Return the score, if produced.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.score
    }
}

/// What is known about a sample while it is being analyzed or labeled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInfo {
    /// Length of the raw bytes.
    pub size: Option<usize>,
    /// Encoding, trimmed and lowercase.
    pub encoding: Option<String>,
    /// Language.
    pub language: Option<Language>,
    /// Script.
    pub script: Option<Script>,
}

impl TextInfo {
    /// Replace the encoding, trimming and lowercasing it.
    pub fn set_encoding(&mut self, encoding: &str) {
        self.encoding = clean_encoding(encoding);
    }

    /// Return the working state as a single analysis.
    #[must_use]
    pub fn to_analysis(&self) -> Analysis {
        Analysis {
            encoding: self.encoding.clone(),
            language: self.language.clone(),
            script: self.script.clone(),
            score: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Analysis, TextInfo};
    use crate::iso::Script;

    #[test]
    fn encoding_is_normalized_on_set() {
        let a = Analysis::new().with_encoding("  UTF-8 ");
        assert_eq!(a.encoding(), Some("utf-8"));
        assert_eq!(Analysis::new().with_encoding("   ").encoding(), None);
    }

    #[test]
    fn text_info_round_trips_to_analysis() {
        let mut info = TextInfo {
            size: Some(4),
            script: Some(Script::new("Latn", "Latin")),
            ..TextInfo::default()
        };
        info.set_encoding("US-ASCII");
        let analysis = info.to_analysis();
        assert_eq!(analysis.encoding(), Some("us-ascii"));
        assert_eq!(analysis.script().unwrap().code(), "Latn");
        assert!(analysis.language().is_none());
        assert!(analysis.score().is_none());
    }
}

//! Immutable ISO 639 language and ISO 15924 script registry.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// An ISO 639 language.
///
/// Ordered by name, like the report tables list them. Displays as its
/// lowercase preferred code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Language {
    code: String,
    alpha3: String,
    name: String,
}

impl Language {
    /// Create a language from its preferred code, ISO 639-3 code and English name.
    pub fn new(code: &str, alpha3: &str, name: &str) -> Self {
        Self {
            code: code.trim().to_ascii_lowercase(),
            alpha3: alpha3.trim().to_ascii_lowercase(),
            name: name.trim().to_string(),
        }
    }

    /// Return the preferred code (ISO 639-1 when one exists).
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Return the ISO 639-3 code.
    #[must_use]
    pub fn alpha3(&self) -> &str {
        &self.alpha3
    }

    /// Return the English name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Ord for Language {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.code.cmp(&other.code))
            .then_with(|| self.alpha3.cmp(&other.alpha3))
    }
}

impl PartialOrd for Language {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// An ISO 15924 script. Ordered by name; displays as its lowercase code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Script {
    code: String,
    name: String,
}

impl Script {
    /// Create a script from its four-letter code and English name.
    pub fn new(code: &str, name: &str) -> Self {
        let code = code.trim();
        let mut canonical = String::with_capacity(code.len());
        for (i, c) in code.chars().enumerate() {
            if i == 0 {
                canonical.extend(c.to_uppercase());
            } else {
                canonical.extend(c.to_lowercase());
            }
        }
        Self {
            code: canonical,
            name: name.trim().to_string(),
        }
    }

    /// Return the title-case code, e.g. `Latn`.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Return the English name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Ord for Script {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.code.cmp(&other.code))
    }
}

impl PartialOrd for Script {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code.to_ascii_lowercase())
    }
}

const LANGUAGES: &[(&str, &str, &str)] = &[
    ("am", "amh", "Amharic"),
    ("ar", "ara", "Arabic"),
    ("bn", "ben", "Bengali"),
    ("cs", "ces", "Czech"),
    ("de", "deu", "German"),
    ("el", "ell", "Greek"),
    ("en", "eng", "English"),
    ("es", "spa", "Spanish"),
    ("fa", "fas", "Persian"),
    ("fr", "fra", "French"),
    ("he", "heb", "Hebrew"),
    ("hi", "hin", "Hindi"),
    ("hy", "hye", "Armenian"),
    ("id", "ind", "Indonesian"),
    ("it", "ita", "Italian"),
    ("ja", "jpn", "Japanese"),
    ("ka", "kat", "Georgian"),
    ("ko", "kor", "Korean"),
    ("ku", "kur", "Kurdish"),
    ("nl", "nld", "Dutch"),
    ("pl", "pol", "Polish"),
    ("ps", "pus", "Pashto"),
    ("pt", "por", "Portuguese"),
    ("ru", "rus", "Russian"),
    ("so", "som", "Somali"),
    ("sw", "swa", "Swahili"),
    ("ta", "tam", "Tamil"),
    ("th", "tha", "Thai"),
    ("tl", "tgl", "Tagalog"),
    ("tr", "tur", "Turkish"),
    ("uk", "ukr", "Ukrainian"),
    ("ur", "urd", "Urdu"),
    ("vi", "vie", "Vietnamese"),
    ("zh", "zho", "Chinese"),
];

const SCRIPTS: &[(&str, &str)] = &[
    ("Arab", "Arabic"),
    ("Armn", "Armenian"),
    ("Beng", "Bengali"),
    ("Cyrl", "Cyrillic"),
    ("Deva", "Devanagari"),
    ("Ethi", "Ethiopic"),
    ("Geor", "Georgian"),
    ("Grek", "Greek"),
    ("Hang", "Hangul"),
    ("Hani", "Han"),
    ("Hans", "Han (Simplified)"),
    ("Hant", "Han (Traditional)"),
    ("Hebr", "Hebrew"),
    ("Hira", "Hiragana"),
    ("Jpan", "Japanese"),
    ("Kana", "Katakana"),
    ("Kore", "Korean"),
    ("Latn", "Latin"),
    ("Taml", "Tamil"),
    ("Thai", "Thai"),
    ("Zyyy", "Common"),
    ("Zzzz", "Unknown"),
];

/// Lookup tables for languages and scripts.
///
/// Built once and shared by reference; lookups accept any code or the
/// English name, case-insensitively.
#[derive(Debug, Clone)]
pub struct IsoRegistry {
    languages: Vec<Language>,
    scripts: Vec<Script>,
    language_keys: HashMap<String, usize>,
    script_keys: HashMap<String, usize>,
}

impl IsoRegistry {
    /// Build a registry from explicit tables. Later entries never shadow
    /// keys claimed by earlier ones.
    pub fn new(languages: Vec<Language>, scripts: Vec<Script>) -> Self {
        let mut language_keys = HashMap::new();
        for (i, lang) in languages.iter().enumerate() {
            for key in [lang.code(), lang.alpha3(), lang.name()] {
                language_keys.entry(key.to_lowercase()).or_insert(i);
            }
        }
        let mut script_keys = HashMap::new();
        for (i, script) in scripts.iter().enumerate() {
            for key in [script.code(), script.name()] {
                script_keys.entry(key.to_lowercase()).or_insert(i);
            }
        }
        Self {
            languages,
            scripts,
            language_keys,
            script_keys,
        }
    }

    /// Build the registry from the built-in tables.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            LANGUAGES
                .iter()
                .map(|&(code, alpha3, name)| Language::new(code, alpha3, name))
                .collect(),
            SCRIPTS
                .iter()
                .map(|&(code, name)| Script::new(code, name))
                .collect(),
        )
    }

    /// Find a language by ISO 639-1 code, ISO 639-3 code, or name.
    #[must_use]
    pub fn language(&self, text: &str) -> Option<&Language> {
        self.language_keys
            .get(&text.trim().to_lowercase())
            .map(|&i| &self.languages[i])
    }

    /// Find a script by ISO 15924 code or name.
    #[must_use]
    pub fn script(&self, text: &str) -> Option<&Script> {
        self.script_keys
            .get(&text.trim().to_lowercase())
            .map(|&i| &self.scripts[i])
    }

    /// Return all languages in table order.
    #[must_use]
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Return all scripts in table order.
    #[must_use]
    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }
}

#[cfg(test)]
mod tests {
    use super::{IsoRegistry, Language, Script};

    #[test]
    fn language_lookup_by_any_key() {
        let iso = IsoRegistry::builtin();
        let by_code = iso.language("EN").unwrap();
        assert_eq!(by_code.code(), "en");
        assert_eq!(iso.language("eng"), Some(by_code));
        assert_eq!(iso.language(" english "), Some(by_code));
        assert!(iso.language("klingon").is_none());
    }

    #[test]
    fn script_lookup_and_display() {
        let iso = IsoRegistry::builtin();
        let latn = iso.script("latn").unwrap();
        assert_eq!(latn.code(), "Latn");
        assert_eq!(latn.to_string(), "latn");
        assert_eq!(iso.script("Cyrillic").unwrap().code(), "Cyrl");
    }

    #[test]
    fn ordering_is_by_name() {
        let arabic = Language::new("ar", "ara", "Arabic");
        let english = Language::new("en", "eng", "English");
        assert!(arabic < english);
        let han = Script::new("hani", "Han");
        let latin = Script::new("LATN", "Latin");
        assert_eq!(latin.code(), "Latn");
        assert!(han < latin);
    }

    #[test]
    fn first_entry_keeps_shared_key() {
        let iso = IsoRegistry::new(
            vec![
                Language::new("xx", "xxx", "Shared"),
                Language::new("yy", "yyy", "Shared"),
            ],
            Vec::new(),
        );
        assert_eq!(iso.language("shared").unwrap().code(), "xx");
    }
}

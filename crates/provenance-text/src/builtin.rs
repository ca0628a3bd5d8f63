//! Small reference analyzers that ship with the pool.
//!
//! They are deliberately simple signal sources so that training and testing
//! can run end to end without external detectors.

use std::sync::Arc;

use crate::analysis::Analysis;
use crate::analyzer::{Analyzer, AnalyzerId};
use crate::attribute::{Attribute, Input, InputKind};
use crate::error::TextError;
use crate::iso::IsoRegistry;

/// Guesses an encoding from byte-order marks and byte-range checks.
#[derive(Debug, Clone)]
pub struct BomSniffer {
    id: AnalyzerId,
}

impl BomSniffer {
    /// Create the `bom` analyzer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AnalyzerId::builtin("bom"),
        }
    }
}

impl Default for BomSniffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for BomSniffer {
    fn id(&self) -> &AnalyzerId {
        &self.id
    }

    fn accepts(&self, kind: InputKind) -> bool {
        kind == InputKind::Bytes
    }

    fn produces(&self, attribute: Attribute) -> bool {
        attribute == Attribute::Encoding
    }

    fn produces_rankings(&self) -> bool {
        true
    }

    fn produces_scores(&self) -> bool {
        true
    }

    fn analyze(&self, input: Input<'_>) -> Result<Vec<Analysis>, TextError> {
        let Input::Bytes(bytes) = input else {
            return Err(TextError::AnalysisFailed {
                id: self.id.to_string(),
                reason: "text input is not supported".to_string(),
            });
        };
        let ranked: &[(&str, f64)] = match bytes {
            [] => &[],
            [0xEF, 0xBB, 0xBF, ..] => &[("utf-8", 1.0)],
            [0xFF, 0xFE, ..] => &[("utf-16le", 1.0)],
            [0xFE, 0xFF, ..] => &[("utf-16be", 1.0)],
            _ if bytes.is_ascii() => &[("us-ascii", 0.6), ("utf-8", 0.4)],
            _ if std::str::from_utf8(bytes).is_ok() => &[("utf-8", 0.9), ("windows-1252", 0.1)],
            _ => &[("windows-1252", 0.7), ("iso-8859-1", 0.3)],
        };
        Ok(ranked
            .iter()
            .map(|&(encoding, score)| Analysis::new().with_encoding(encoding).with_score(score))
            .collect())
    }
}

/// Code point ranges per ISO 15924 script code.
const SCRIPT_RANGES: &[(&str, &[(u32, u32)])] = &[
    ("Latn", &[(0x41, 0x5A), (0x61, 0x7A), (0xC0, 0x24F), (0x1E00, 0x1EFF)]),
    ("Grek", &[(0x370, 0x3FF), (0x1F00, 0x1FFF)]),
    ("Cyrl", &[(0x400, 0x52F)]),
    ("Armn", &[(0x530, 0x58F)]),
    ("Hebr", &[(0x590, 0x5FF)]),
    ("Arab", &[(0x600, 0x6FF), (0x750, 0x77F), (0xFB50, 0xFDFF), (0xFE70, 0xFEFF)]),
    ("Deva", &[(0x900, 0x97F)]),
    ("Beng", &[(0x980, 0x9FF)]),
    ("Taml", &[(0xB80, 0xBFF)]),
    ("Thai", &[(0xE00, 0xE7F)]),
    ("Geor", &[(0x10A0, 0x10FF)]),
    ("Hang", &[(0x1100, 0x11FF), (0x3130, 0x318F), (0xAC00, 0xD7AF)]),
    ("Ethi", &[(0x1200, 0x137F)]),
    ("Hira", &[(0x3040, 0x309F)]),
    ("Kana", &[(0x30A0, 0x30FF)]),
    ("Hani", &[(0x3400, 0x4DBF), (0x4E00, 0x9FFF)]),
];

/// Ranks scripts by the share of letters falling in each script's blocks.
#[derive(Debug, Clone)]
pub struct UnicodeScriptProfiler {
    id: AnalyzerId,
    registry: Arc<IsoRegistry>,
}

impl UnicodeScriptProfiler {
    /// Maximum number of ranked results.
    pub const MAX_RESULTS: usize = 3;

    /// Create the `unicode` analyzer.
    #[must_use]
    pub fn new(registry: Arc<IsoRegistry>) -> Self {
        Self {
            id: AnalyzerId::builtin("unicode"),
            registry,
        }
    }
}

impl Analyzer for UnicodeScriptProfiler {
    fn id(&self) -> &AnalyzerId {
        &self.id
    }

    fn accepts(&self, kind: InputKind) -> bool {
        kind == InputKind::Text
    }

    fn produces(&self, attribute: Attribute) -> bool {
        attribute == Attribute::Script
    }

    fn produces_rankings(&self) -> bool {
        true
    }

    fn produces_scores(&self) -> bool {
        true
    }

    fn analyze(&self, input: Input<'_>) -> Result<Vec<Analysis>, TextError> {
        let Input::Text(text) = input else {
            return Err(TextError::AnalysisFailed {
                id: self.id.to_string(),
                reason: "byte input is not supported".to_string(),
            });
        };
        let mut counts = vec![0usize; SCRIPT_RANGES.len()];
        let mut letters = 0usize;
        for c in text.chars().filter(|c| c.is_alphabetic()) {
            letters += 1;
            let cp = u32::from(c);
            if let Some(slot) = SCRIPT_RANGES
                .iter()
                .position(|(_, ranges)| ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp)))
            {
                counts[slot] += 1;
            }
        }
        if letters == 0 {
            return Ok(Vec::new());
        }
        let mut ranked: Vec<(usize, usize)> = counts
            .into_iter()
            .enumerate()
            .filter(|&(_, n)| n > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(ranked
            .into_iter()
            .filter_map(|(slot, n)| {
                let script = self.registry.script(SCRIPT_RANGES[slot].0)?;
                Some(
                    Analysis::new()
                        .with_script(script.clone())
                        .with_score(n as f64 / letters as f64),
                )
            })
            .take(Self::MAX_RESULTS)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{BomSniffer, UnicodeScriptProfiler};
    use crate::analyzer::Analyzer;
    use crate::attribute::Input;
    use crate::iso::IsoRegistry;

    fn encodings(bytes: &[u8]) -> Vec<String> {
        BomSniffer::new()
            .analyze(Input::Bytes(bytes))
            .unwrap()
            .iter()
            .map(|a| a.encoding().unwrap().to_string())
            .collect()
    }

    #[test]
    fn bom_sniffer_ranks_by_byte_shape() {
        assert_eq!(encodings(b"hello"), ["us-ascii", "utf-8"]);
        assert_eq!(encodings("h\u{e9}llo".as_bytes()), ["utf-8", "windows-1252"]);
        assert_eq!(encodings(&[0x68, 0xE9, 0x6C]), ["windows-1252", "iso-8859-1"]);
        assert_eq!(encodings(&[0xFF, 0xFE, 0x41, 0x00]), ["utf-16le"]);
        assert!(encodings(b"").is_empty());
    }

    #[test]
    fn bom_sniffer_rejects_text() {
        assert!(BomSniffer::new().analyze(Input::Text("x")).is_err());
    }

    #[test]
    fn unicode_profiler_ranks_majority_script() {
        let profiler = UnicodeScriptProfiler::new(Arc::new(IsoRegistry::builtin()));
        let results = profiler.analyze(Input::Text("Привет мир, hi!")).unwrap();
        let codes: Vec<&str> = results.iter().map(|a| a.script().unwrap().code()).collect();
        assert_eq!(codes, ["Cyrl", "Latn"]);
        let score = results[0].score().unwrap();
        assert!((score - 9.0 / 11.0).abs() < 1e-10);
    }

    #[test]
    fn unicode_profiler_ignores_symbols() {
        let profiler = UnicodeScriptProfiler::new(Arc::new(IsoRegistry::builtin()));
        assert!(profiler.analyze(Input::Text("123 !? ..")).unwrap().is_empty());
    }
}

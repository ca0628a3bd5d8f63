//! Strict charset decoding and lenient encoding-name comparison.
//!
//! Decoding never substitutes replacement characters: a byte sequence that is
//! malformed under the named charset decodes to `None`. Labels are resolved
//! through the WHATWG registry in `encoding_rs`, except for US-ASCII,
//! ISO-8859-1 and BOM-sniffing UTF-16, which WHATWG folds into other
//! encodings and which are handled here directly.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};

const ASCII_LABELS: &[&str] = &[
    "usascii", "ascii", "ansix3.41968", "iso646us", "646", "cp367", "ibm367", "us",
];
const LATIN1_LABELS: &[&str] = &["iso88591", "latin1", "l1", "cp819", "ibm819"];
const UTF16_LABELS: &[&str] = &["utf16", "ucs2", "unicode"];

#[derive(Debug, Clone, Copy)]
enum Charset {
    Ascii,
    Latin1,
    Utf16,
    Whatwg(&'static Encoding),
}

impl Charset {
    fn name(self) -> String {
        match self {
            Charset::Ascii => "us-ascii".to_string(),
            Charset::Latin1 => "iso-8859-1".to_string(),
            Charset::Utf16 => "utf-16".to_string(),
            Charset::Whatwg(encoding) => encoding.name().to_lowercase(),
        }
    }

    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Charset::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| char::from(b)).collect()),
            Charset::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            Charset::Utf16 => {
                let (encoding, body) = match bytes {
                    [0xFF, 0xFE, rest @ ..] => (UTF_16LE, rest),
                    [0xFE, 0xFF, rest @ ..] => (UTF_16BE, rest),
                    _ => (UTF_16BE, bytes),
                };
                strict(encoding, body)
            }
            Charset::Whatwg(encoding) => strict(encoding, bytes),
        }
    }
}

fn strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(std::borrow::Cow::into_owned)
}

/// Lowercase and drop whitespace, `-` and `_`.
fn compact(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Re-insert the separators WHATWG labels expect into a compact label.
fn expand(compact: &str) -> Option<String> {
    let expanded = match compact {
        "utf8" => "utf-8".to_string(),
        "utf16le" => "utf-16le".to_string(),
        "utf16be" => "utf-16be".to_string(),
        "shiftjis" => "shift_jis".to_string(),
        _ => {
            let prefix = ["iso8859", "windows", "koi8", "euc"]
                .into_iter()
                .find(|p| compact.starts_with(p) && compact.len() > p.len())?;
            let rest = &compact[prefix.len()..];
            match prefix {
                "iso8859" => format!("iso-8859-{rest}"),
                _ => format!("{prefix}-{rest}"),
            }
        }
    };
    Some(expanded)
}

fn lookup(label: &str) -> Option<Charset> {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }
    let short = compact(&label);
    if ASCII_LABELS.contains(&short.as_str()) {
        return Some(Charset::Ascii);
    }
    if LATIN1_LABELS.contains(&short.as_str()) {
        return Some(Charset::Latin1);
    }
    if UTF16_LABELS.contains(&short.as_str()) {
        return Some(Charset::Utf16);
    }
    Encoding::for_label(label.as_bytes())
        .or_else(|| Encoding::for_label(short.as_bytes()))
        .or_else(|| expand(&short).and_then(|e| Encoding::for_label(e.as_bytes())))
        .map(Charset::Whatwg)
}

/// Return the canonical lowercase name for a charset label, if known.
#[must_use]
pub fn canonical_name(label: &str) -> Option<String> {
    lookup(label).map(Charset::name)
}

/// Decode `bytes` strictly under the charset named by `label`.
///
/// Returns `None` for unknown labels and for malformed input.
#[must_use]
pub fn decode(bytes: &[u8], label: &str) -> Option<String> {
    lookup(label)?.decode(bytes)
}

/// Reduce an encoding label to a comparable form.
///
/// The label is lowercased, stripped of whitespace, `-` and `_`, loses a
/// trailing `be`, and has a leading `ucs2` rewritten to `utf16`. The result is
/// the canonical charset name when the reduced label is known, otherwise the
/// reduced label itself. Blank input gives an empty string.
#[must_use]
pub fn normalize_encoding(label: &str) -> String {
    let mut short = compact(label);
    if let Some(stripped) = short.strip_suffix("be") {
        short = stripped.to_string();
    }
    if let Some(rest) = short.strip_prefix("ucs2") {
        short = format!("utf16{rest}");
    }
    if short.is_empty() {
        return short;
    }
    canonical_name(&short).unwrap_or(short)
}

/// Return `true` if `detected` names the same encoding as `truth`, or decodes
/// `bytes` to the same text.
///
/// Decode failures under either name mean "not equivalent".
#[must_use]
pub fn lenient_equivalent(bytes: &[u8], truth: &str, detected: Option<&str>) -> bool {
    let Some(detected) = detected else {
        return false;
    };
    if normalize_encoding(truth) == normalize_encoding(detected) {
        return true;
    }
    match decode(bytes, truth) {
        Some(text) => decode(bytes, detected).is_some_and(|other| other == text),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{canonical_name, decode, lenient_equivalent, normalize_encoding};

    #[test]
    fn labels_resolve_to_canonical_names() {
        assert_eq!(canonical_name("UTF8").as_deref(), Some("utf-8"));
        assert_eq!(canonical_name("ISO_8859-1").as_deref(), Some("iso-8859-1"));
        assert_eq!(canonical_name("iso88592").as_deref(), Some("iso-8859-2"));
        assert_eq!(canonical_name("cp1252").as_deref(), Some("windows-1252"));
        assert_eq!(canonical_name("ascii").as_deref(), Some("us-ascii"));
        assert_eq!(canonical_name("no-such-charset"), None);
    }

    #[test]
    fn normalization_folds_variants() {
        assert_eq!(normalize_encoding("UTF-16BE"), "utf-16");
        assert_eq!(normalize_encoding("ucs-2"), "utf-16");
        assert_eq!(normalize_encoding(" Windows_1251 "), "windows-1251");
        assert_eq!(normalize_encoding("x-made-up"), "xmadeup");
        assert_eq!(normalize_encoding("  "), "");
    }

    #[test]
    fn strict_decoding_rejects_malformed_input() {
        assert_eq!(decode(b"abc", "us-ascii").as_deref(), Some("abc"));
        assert_eq!(decode(&[0x61, 0xE9], "us-ascii"), None);
        assert_eq!(decode(&[0xC3, 0x28], "utf-8"), None);
        assert_eq!(decode(&[0xE9], "iso-8859-1").as_deref(), Some("\u{e9}"));
        assert_eq!(decode(&[0xFF, 0xFE, 0x41, 0x00], "utf-16").as_deref(), Some("A"));
        assert_eq!(decode(&[0x00, 0x41], "utf-16").as_deref(), Some("A"));
    }

    #[test]
    fn ascii_and_utf8_agree_only_on_ascii_bytes() {
        assert!(lenient_equivalent(b"plain text", "us-ascii", Some("utf-8")));
        let high = "caf\u{e9}".as_bytes();
        assert!(!lenient_equivalent(high, "us-ascii", Some("utf-8")));
        assert!(!lenient_equivalent(high, "utf-8", Some("us-ascii")));
    }

    #[test]
    fn single_byte_charsets_differ_on_high_bytes() {
        let bytes = [0x48, 0xE9, 0x6C];
        assert!(!lenient_equivalent(&bytes, "windows-1252", Some("iso-8859-5")));
        assert!(lenient_equivalent(&bytes, "windows-1252", Some("iso-8859-1")));
    }

    #[test]
    fn missing_answer_is_never_equivalent() {
        assert!(!lenient_equivalent(b"abc", "utf-8", None));
        assert!(lenient_equivalent(b"abc", "UTF-8", Some("utf8")));
    }
}

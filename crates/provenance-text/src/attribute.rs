use std::fmt;

/// One of the three classified properties of a text sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Attribute {
    /// Character encoding of the raw bytes.
    Encoding,
    /// Natural language of the decoded text.
    Language,
    /// Writing system of the decoded text.
    Script,
}

impl Attribute {
    /// All attributes in reporting order.
    pub const ALL: [Attribute; 3] = [Attribute::Encoding, Attribute::Language, Attribute::Script];

    /// Return the lowercase attribute name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Encoding => "encoding",
            Attribute::Language => "language",
            Attribute::Script => "script",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of input an analyzer can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Raw, undecoded bytes.
    Bytes,
    /// Decoded text.
    Text,
}

/// A borrowed analyzer input.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    /// Raw bytes.
    Bytes(&'a [u8]),
    /// Decoded text.
    Text(&'a str),
}

impl Input<'_> {
    /// Return the kind of this input.
    #[must_use]
    pub fn kind(&self) -> InputKind {
        match self {
            Input::Bytes(_) => InputKind::Bytes,
            Input::Text(_) => InputKind::Text,
        }
    }

    /// Return `true` for zero bytes or blank text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Input::Bytes(b) => b.is_empty(),
            Input::Text(t) => t.trim().is_empty(),
        }
    }
}

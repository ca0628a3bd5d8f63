//! Typed, validated feature definitions.

use std::collections::HashMap;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A feature value as stored in [`FeatureData`](crate::FeatureData).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    /// A number.
    Numeric(f64),
    /// A category, compared by its trimmed lowercase text.
    Nominal(String),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(v) => write!(f, "{v}"),
            FeatureValue::Nominal(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Default)]
struct DomainState {
    values: Vec<String>,
    index: HashMap<String, usize>,
    closed: bool,
}

impl DomainState {
    fn insert(&mut self, value: &str) -> usize {
        if let Some(&i) = self.index.get(value) {
            return i;
        }
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), self.values.len() - 1);
        self.values.len() - 1
    }
}

#[derive(Serialize, Deserialize)]
struct DomainSnapshot {
    values: Vec<String>,
    closed: bool,
}

/// The set of categories an enumerated feature accepts.
///
/// While open, checking an unseen value registers it. Once closed, unseen
/// values are rejected. Values keep their first-seen order.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(from = "DomainSnapshot", into = "DomainSnapshot")]
pub struct ValueDomain {
    state: RwLock<DomainState>,
}

impl ValueDomain {
    /// Create an open, empty domain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, DomainState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, DomainState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the index of `value`, registering it if the domain is open.
    pub(crate) fn admit(&self, value: &str) -> Option<usize> {
        if let Some(&i) = self.read().index.get(value) {
            return Some(i);
        }
        let mut state = self.write();
        if let Some(&i) = state.index.get(value) {
            return Some(i);
        }
        (!state.closed).then(|| state.insert(value))
    }

    /// Return the index of a registered value.
    #[must_use]
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.read().index.get(value).copied()
    }

    /// Return a copy of the values in registration order.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        self.read().values.clone()
    }

    /// Return the number of registered values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().values.len()
    }

    /// Return `true` if no value is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting new values.
    pub fn close(&self) {
        self.write().closed = true;
    }

    /// Return `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.read().closed
    }
}

impl Clone for ValueDomain {
    fn clone(&self) -> Self {
        let state = self.read();
        Self {
            state: RwLock::new(DomainState {
                values: state.values.clone(),
                index: state.index.clone(),
                closed: state.closed,
            }),
        }
    }
}

impl From<DomainSnapshot> for ValueDomain {
    fn from(snapshot: DomainSnapshot) -> Self {
        let mut state = DomainState::default();
        for value in &snapshot.values {
            state.insert(value);
        }
        state.closed = snapshot.closed;
        Self {
            state: RwLock::new(state),
        }
    }
}

impl From<ValueDomain> for DomainSnapshot {
    fn from(domain: ValueDomain) -> Self {
        let state = domain.state.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            values: state.values,
            closed: state.closed,
        }
    }
}

/// What values a feature accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FeatureKind {
    /// A number, optionally bounded (inclusive) and optionally whole.
    Numeric {
        /// Lower bound.
        min: Option<f64>,
        /// Upper bound.
        max: Option<f64>,
        /// Whether the value must have no fractional part.
        integral: bool,
    },
    /// One of a growing-then-closed set of categories.
    Enumerated(ValueDomain),
}

/// A named slot in a feature model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFeature {
    name: String,
    kind: FeatureKind,
}

impl ModelFeature {
    /// Create a feature of any kind.
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a non-negative whole-number feature.
    pub fn count(name: impl Into<String>) -> Self {
        Self::new(
            name,
            FeatureKind::Numeric {
                min: Some(0.0),
                max: None,
                integral: true,
            },
        )
    }

    /// Create an unbounded real-valued feature.
    pub fn real(name: impl Into<String>) -> Self {
        Self::new(
            name,
            FeatureKind::Numeric {
                min: None,
                max: None,
                integral: false,
            },
        )
    }

    /// Create an open enumerated feature.
    pub fn enumerated(name: impl Into<String>) -> Self {
        Self::new(name, FeatureKind::Enumerated(ValueDomain::new()))
    }

    /// Return the feature name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the feature kind.
    #[must_use]
    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    /// Return `true` for numeric features.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, FeatureKind::Numeric { .. })
    }

    /// Return the value domain of an enumerated feature.
    #[must_use]
    pub fn domain(&self) -> Option<&ValueDomain> {
        match &self.kind {
            FeatureKind::Enumerated(domain) => Some(domain),
            FeatureKind::Numeric { .. } => None,
        }
    }

    /// Canonical text of a value: trimmed lowercase for categories.
    #[must_use]
    pub fn as_text(&self, value: &FeatureValue) -> String {
        match value {
            FeatureValue::Numeric(v) => v.to_string(),
            FeatureValue::Nominal(s) => s.trim().to_lowercase(),
        }
    }

    /// Check a value against this feature.
    ///
    /// For an open enumerated feature a new category is registered as a side
    /// effect.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::InvalidValue`] | wrong value type, out of range, not whole, blank, or unseen in a closed domain |
    pub fn validate(&self, value: &FeatureValue) -> Result<(), ModelError> {
        let reject = |reason: &str| ModelError::InvalidValue {
            feature: self.name.clone(),
            value: value.to_string(),
            reason: reason.to_string(),
        };
        match (&self.kind, value) {
            (FeatureKind::Numeric { min, max, integral }, FeatureValue::Numeric(v)) => {
                if !v.is_finite() {
                    return Err(reject("not finite"));
                }
                if min.is_some_and(|m| *v < m) || max.is_some_and(|m| *v > m) {
                    return Err(reject("out of range"));
                }
                if *integral && v.fract() != 0.0 {
                    return Err(reject("not a whole number"));
                }
                Ok(())
            }
            (FeatureKind::Enumerated(domain), FeatureValue::Nominal(_)) => {
                let text = self.as_text(value);
                if text.is_empty() {
                    return Err(reject("blank"));
                }
                domain
                    .admit(&text)
                    .map(|_| ())
                    .ok_or_else(|| reject("not in closed domain"))
            }
            (FeatureKind::Numeric { .. }, FeatureValue::Nominal(_)) => Err(reject("expected a number")),
            (FeatureKind::Enumerated(_), FeatureValue::Numeric(_)) => Err(reject("expected a category")),
        }
    }

    /// Close the domain of an enumerated feature; numeric features are unaffected.
    pub fn close(&self) {
        if let Some(domain) = self.domain() {
            domain.close();
        }
    }
}

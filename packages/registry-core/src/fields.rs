//! Log fields attached to an [`ExecutionContext`](crate::ExecutionContext).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Immutable string key/value mapping carried as log attachments.
///
/// Cloning is cheap: the entries live behind an `Arc` and are never mutated
/// after construction. Keys are kept ordered so that rendered output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogFields(Arc<BTreeMap<String, String>>);

impl LogFields {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a new set holding `self` overlaid with `overrides`.
    ///
    /// Keys present in both take the value from `overrides`. When either side
    /// is empty the other is returned as-is without copying.
    #[must_use]
    pub fn merged(&self, overrides: &LogFields) -> LogFields {
        if overrides.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return overrides.clone();
        }
        let mut map = (*self.0).clone();
        for (k, v) in overrides.0.iter() {
            map.insert(k.clone(), v.clone());
        }
        LogFields(Arc::new(map))
    }
}

impl<K, V> FromIterator<(K, V)> for LogFields
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        LogFields(Arc::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }
}

impl From<HashMap<String, String>> for LogFields {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<BTreeMap<String, String>> for LogFields {
    fn from(map: BTreeMap<String, String>) -> Self {
        LogFields(Arc::new(map))
    }
}

/// Renders as `k1=v1 k2=v2`, the form used when the fields are recorded on a span.
impl fmt::Display for LogFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.0.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}

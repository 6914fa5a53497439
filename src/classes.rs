use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNKNOWN_CLASS: &str = "unknown";

/// Class id to human readable name lookup, fixed for one run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct ClassMap(BTreeMap<i32, String>);

impl ClassMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with_class<S: Into<String>>(mut self, id: i32, name: S) -> Self {
        self.0.insert(id, name.into());
        self
    }

    #[inline]
    pub fn resolve(&self, class_id: i32) -> &str {
        self.0
            .get(&class_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_CLASS)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// COCO vehicles the default deployment reports on.
impl Default for ClassMap {
    fn default() -> Self {
        Self::new().with_class(2, "car")
    }
}

impl<S: Into<String>> FromIterator<(i32, S)> for ClassMap {
    fn from_iter<I: IntoIterator<Item = (i32, S)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

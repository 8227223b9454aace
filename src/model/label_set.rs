use std::collections::HashMap;

/// A set of strings compared case-insensitively that keeps the casing of
/// whichever value was inserted first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseInsensitiveSet {
    entries: HashMap<String, String>,
}

impl CaseInsensitiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value`. Returns false when an equal value (ignoring case) is
    /// already stored; the stored casing is left untouched.
    pub fn add(&mut self, value: &str) -> bool {
        let key = value.to_lowercase();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value.to_string());
        true
    }

    /// Remove the entry matching `value` ignoring case. Missing values are not an error.
    pub fn remove(&mut self, value: &str) -> bool {
        self.entries.remove(&value.to_lowercase()).is_some()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.entries.contains_key(&value.to_lowercase())
    }

    /// The stored casing of `value`, if present.
    pub fn get(&self, value: &str) -> Option<&str> {
        self.entries.get(&value.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// Stored values sorted, for stable output and API payloads.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut values: Vec<String> = self.entries.values().cloned().collect();
        values.sort();
        values
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<S: AsRef<str>> FromIterator<S> for CaseInsensitiveSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.add(value.as_ref());
        }
        set
    }
}

/// Labels, components or CCs of an issue, with tracking of what changed
/// since the issue was last saved.
#[derive(Debug, Clone, Default)]
pub struct LabelStore {
    values: CaseInsensitiveSet,
    added: CaseInsensitiveSet,
    removed: CaseInsensitiveSet,
}

impl LabelStore {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            values: values.into_iter().collect(),
            added: CaseInsensitiveSet::new(),
            removed: CaseInsensitiveSet::new(),
        }
    }

    pub fn add(&mut self, value: &str) {
        if !self.removed.remove(value) && !self.values.contains(value) {
            self.added.add(value);
        }
        self.values.add(value);
    }

    pub fn remove(&mut self, value: &str) {
        if !self.added.remove(value) {
            if let Some(stored) = self.values.get(value).map(String::from) {
                self.removed.add(&stored);
            }
        }
        self.values.remove(value);
    }

    /// Remove every value starting with `prefix`, ignoring case.
    pub fn remove_by_prefix(&mut self, prefix: &str) {
        let prefix = prefix.to_lowercase();
        let matching: Vec<String> = self
            .values
            .iter()
            .filter(|v| v.to_lowercase().starts_with(&prefix))
            .map(String::from)
            .collect();
        for value in matching {
            self.remove(&value);
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter()
    }

    pub fn to_sorted_vec(&self) -> Vec<String> {
        self.values.to_sorted_vec()
    }

    /// Values added since the last call to [`LabelStore::reset_tracking`].
    pub fn added(&self) -> &CaseInsensitiveSet {
        &self.added
    }

    /// Values removed since the last call to [`LabelStore::reset_tracking`].
    pub fn removed(&self) -> &CaseInsensitiveSet {
        &self.removed
    }

    pub fn reset_tracking(&mut self) {
        self.added.clear();
        self.removed.clear();
    }
}

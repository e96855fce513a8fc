use std::collections::BTreeMap;

use super::attribute::Attribute;

/// Attribute name to [`Attribute`] mapping describing one entity.
///
/// Immutable once built: combining specifications always produces a new one.
#[derive(Debug, Clone, Default)]
pub struct Specification {
    attributes: BTreeMap<String, Attribute>,
}

impl Specification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `name` set to `attribute`.
    pub fn with(mut self, name: impl Into<String>, attribute: impl Into<Attribute>) -> Self {
        self.attributes.insert(name.into(), attribute.into());
        self
    }

    /// Returns `self` overlaid with `overrides`; overrides win.
    pub fn merged(&self, overrides: &Specification) -> Specification {
        let mut attributes = self.attributes.clone();
        for (name, attribute) in &overrides.attributes {
            attributes.insert(name.clone(), attribute.clone());
        }
        Specification { attributes }
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Specification
where
    K: Into<String>,
    V: Into<Attribute>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Specification {
            attributes: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

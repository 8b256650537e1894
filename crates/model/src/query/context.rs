use std::collections::HashMap;

/// Maps logical field names used by the caller onto physical, optionally
/// table-qualified, column names (`"author" -> "users.name"`).
///
/// Lookups are case-insensitive on the logical side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformContext {
    field_map: HashMap<String, String>,
}

impl TransformContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, logical: &str, physical: &str) -> Self {
        self.add_field(logical, physical);
        self
    }

    pub fn add_field(&mut self, logical: &str, physical: &str) {
        self.field_map
            .insert(logical.to_ascii_lowercase(), physical.to_string());
    }

    /// Returns the physical name for `field`, or `field` itself when unmapped.
    pub fn resolve<'a>(&'a self, field: &'a str) -> &'a str {
        self.field_map
            .get(&field.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(field)
    }

    pub fn is_empty(&self) -> bool {
        self.field_map.is_empty()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for TransformContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut context = TransformContext::new();
        for (logical, physical) in iter {
            context.add_field(logical.as_ref(), physical.as_ref());
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_mapped_and_unmapped_fields() {
        let context: TransformContext = [("author", "users.name")].into_iter().collect();
        assert_eq!(context.resolve("Author"), "users.name");
        assert_eq!(context.resolve("title"), "title");
    }
}

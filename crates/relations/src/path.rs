use crate::error::RelationError;
use indexmap::IndexMap;

/// Relation paths merged by prefix, so `comments` and `comments.author`
/// load `comments` once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationTree {
    children: IndexMap<String, RelationTree>,
}

impl RelationTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dotted path such as `comments.author.profile`.
    pub fn insert(&mut self, segments: &[&str]) {
        if let Some((first, rest)) = segments.split_first() {
            self.children
                .entry(first.to_string())
                .or_default()
                .insert(rest);
        }
    }

    pub fn children(&self) -> impl Iterator<Item = (&String, &RelationTree)> {
        self.children.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.children
            .values()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Splits a dotted path, rejecting empty segments (`a..b`, `.a`, ``).
pub fn split_path(path: &str) -> Result<Vec<&str>, RelationError> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(RelationError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_prefixes_merge() {
        let mut tree = RelationTree::new();
        tree.insert(&["comments"]);
        tree.insert(&["comments", "author"]);
        tree.insert(&["tags"]);

        let names: Vec<_> = tree.children().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["comments", "tags"]);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_empty_segments_are_rejected() {
        assert!(split_path("comments..author").is_err());
        assert!(split_path("").is_err());
        assert_eq!(split_path("a.b").unwrap(), vec!["a", "b"]);
    }
}

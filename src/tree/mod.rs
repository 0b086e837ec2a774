pub mod arena;

use self::arena::{CanvasTree, NodeId};

/// Split a slash-delimited relative path into non-empty segments.
fn segments(relative: &str) -> impl Iterator<Item = &str> {
    relative.split('/').filter(|s| !s.is_empty())
}

impl CanvasTree {
    /// Walk child-by-name from the root. `None` when any segment is
    /// absent, which callers treat as "not tracked", never as an error.
    /// The empty path resolves to the root itself.
    pub fn resolve_path(&self, relative: &str) -> Option<NodeId> {
        let mut current = self.root;
        for segment in segments(relative) {
            current = self.child_by_name(current, segment)?;
        }
        Some(current)
    }

    /// As [`resolve_path`](Self::resolve_path), creating missing segments.
    /// Idempotent: repeated calls return the same node and never create
    /// duplicate siblings.
    pub fn ensure_path(&mut self, relative: &str) -> NodeId {
        let mut current = self.root;
        for segment in segments(relative) {
            current = match self.child_by_name(current, segment) {
                Some(existing) => existing,
                None => {
                    tracing::trace!(segment, "creating tree node");
                    self.add_child(current, segment)
                }
            };
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::arena::CanvasTree;

    #[test]
    fn resolve_of_untracked_path_is_none() {
        let mut tree = CanvasTree::new("root");
        tree.ensure_path("docs/reports");
        assert!(tree.resolve_path("docs/reports").is_some());
        assert!(tree.resolve_path("docs/missing").is_none());
        assert!(tree.resolve_path("other").is_none());
    }

    #[test]
    fn empty_path_resolves_to_root() {
        let tree = CanvasTree::new("root");
        assert_eq!(tree.resolve_path(""), Some(tree.root));
    }

    #[test]
    fn ensure_path_is_idempotent() {
        let mut tree = CanvasTree::new("root");
        let first = tree.ensure_path("a/b/c");
        let count = tree.len();
        let second = tree.ensure_path("a/b/c");
        assert_eq!(first, second);
        assert_eq!(tree.len(), count);
    }

    #[test]
    fn ensure_path_creates_intermediates() {
        let mut tree = CanvasTree::new("root");
        tree.ensure_path("a/b");
        let a = tree.resolve_path("a").unwrap();
        let b = tree.resolve_path("a/b").unwrap();
        assert_eq!(tree.get(b).parent, Some(a));
        assert_eq!(tree.get(b).depth, 2);
    }

    #[test]
    fn redundant_separators_are_ignored() {
        let mut tree = CanvasTree::new("root");
        let a = tree.ensure_path("a//b/");
        assert_eq!(tree.resolve_path("a/b"), Some(a));
    }
}

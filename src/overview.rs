use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use crate::channel::SessionHandler;
use crate::layout::{LayoutEngine, SimulationConfig};
use crate::scanner::types::{ScanEvent, ScanRequest};
use crate::tree::arena::CanvasTree;

/// Process-wide session id counter. Randomly seeded so ids are not
/// guessable across runs, strictly increasing within one run.
static NEXT_SESSION_ID: LazyLock<AtomicU64> =
    LazyLock::new(|| AtomicU64::new(rand::random::<u32>() as u64));

fn next_session_id() -> u64 {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Binds one watched filesystem root to one tree and one layout engine:
/// the unit the canvas places and the scan channel feeds.
pub struct OverviewEntry {
    session_id: u64,
    root_path: PathBuf,
    max_depth: u32,
    origin: (f32, f32),
    pub tree: CanvasTree,
    pub engine: LayoutEngine,
}

impl OverviewEntry {
    pub fn new(root_path: &Path, max_depth: u32) -> Self {
        Self::with_config(root_path, max_depth, SimulationConfig::default())
    }

    pub fn with_config(root_path: &Path, max_depth: u32, config: SimulationConfig) -> Self {
        let root_name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root_path.to_string_lossy().to_string());

        let mut tree = CanvasTree::new(&root_name);
        tree.get_mut(tree.root).fixed = Some((0.0, 0.0));

        Self {
            session_id: next_session_id(),
            root_path: root_path.to_path_buf(),
            max_depth,
            origin: (0.0, 0.0),
            tree,
            engine: LayoutEngine::new(config),
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn origin(&self) -> (f32, f32) {
        self.origin
    }

    /// The request this entry submits to the sync channel.
    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            session_id: self.session_id,
            root_path: self.root_path.clone(),
            max_depth: self.max_depth,
        }
    }

    /// Move the whole tree rigidly by re-pinning the root. The same
    /// vertical baseline is propagated to every descendant; vertical
    /// spread then re-emerges from the simulation relative to it.
    pub fn set_coordinates(&mut self, x: f32, y: f32) {
        self.origin = (x, y);
        let root = self.tree.root;
        self.tree.get_mut(root).fixed = Some((x, y));
        self.tree.get_mut(root).x = x;
        self.tree.get_mut(root).y = y;
        for id in self.tree.descendants(root, false) {
            let node = self.tree.get_mut(id);
            node.y = y;
            node.vy = 0.0;
        }
        self.engine.reheat();
    }

    /// Track a path relative to the entry root, creating missing
    /// segments. Returns whether the tree shape changed; the simulation
    /// is only reseeded when it did, so idempotent re-adds stay cheap.
    pub fn add_entry_path(&mut self, relative: &str) -> bool {
        let before = self.tree.len();
        self.tree.ensure_path(relative);
        let changed = self.tree.len() != before;
        if changed {
            self.engine.mark_dirty();
        }
        changed
    }

    /// Stop tracking a path. Untracked paths and the root itself are a
    /// no-op `false`.
    pub fn remove_entry_path(&mut self, relative: &str) -> bool {
        let Some(node) = self.tree.resolve_path(relative) else {
            return false;
        };
        let Some(parent) = self.tree.get(node).parent else {
            return false;
        };
        let removed = self.tree.remove_child(parent, node);
        if removed {
            self.engine.mark_dirty();
        }
        removed
    }

    pub fn start(&mut self) {
        self.engine.start();
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    /// One frame step. Returns whether node positions may have changed.
    pub fn tick(&mut self) -> bool {
        self.engine.tick(&mut self.tree)
    }

    /// Express an absolute scan path relative to the entry root, with
    /// slash separators. `None` for paths outside the root's subtree.
    fn relative_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root_path).ok()?;
        let mut out = String::new();
        for component in rel.components() {
            if let Component::Normal(part) = component {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str(&part.to_string_lossy());
            }
        }
        Some(out)
    }
}

impl SessionHandler for OverviewEntry {
    fn id(&self) -> u64 {
        self.session_id
    }

    fn path(&self) -> &Path {
        &self.root_path
    }

    fn depth(&self) -> u32 {
        self.max_depth
    }

    fn on_event(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::FolderEntered { path, .. } => {
                match self.relative_path(path) {
                    Some(rel) if rel.is_empty() => {} // the root is always present
                    Some(rel) => {
                        self.add_entry_path(&rel);
                    }
                    None => {
                        tracing::trace!(path = %path.display(), "event outside entry root");
                    }
                }
            }
            ScanEvent::FolderStats { path, stats, .. } => {
                let Some(rel) = self.relative_path(path) else {
                    tracing::trace!(path = %path.display(), "event outside entry root");
                    return;
                };
                let node = if rel.is_empty() {
                    self.tree.root
                } else {
                    // Stats may arrive ahead of the entered event after
                    // coalescing; ensure the node exists either way.
                    let before = self.tree.len();
                    let node = self.tree.ensure_path(&rel);
                    if self.tree.len() != before {
                        self.engine.mark_dirty();
                    }
                    node
                };
                self.tree.get_mut(node).stats = Some(stats.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::FolderStats;

    #[test]
    fn session_ids_are_monotonic() {
        let a = OverviewEntry::new(Path::new("/tmp/a"), 0);
        let b = OverviewEntry::new(Path::new("/tmp/b"), 0);
        assert!(b.session_id() > a.session_id());
    }

    #[test]
    fn set_coordinates_moves_tree_rigidly() {
        let mut entry = OverviewEntry::new(Path::new("/tmp/root"), 0);
        entry.add_entry_path("a/b");
        entry.set_coordinates(300.0, 120.0);

        let root = entry.tree.root;
        assert_eq!(entry.tree.get(root).fixed, Some((300.0, 120.0)));
        for id in entry.tree.descendants(root, true) {
            assert_eq!(entry.tree.get(id).y, 120.0);
        }
    }

    #[test]
    fn add_entry_path_reports_shape_change_once() {
        let mut entry = OverviewEntry::new(Path::new("/tmp/root"), 0);
        assert!(entry.add_entry_path("a/b"));
        assert!(!entry.add_entry_path("a/b"));
        assert!(!entry.add_entry_path("a"));
        assert!(entry.add_entry_path("a/c"));
    }

    #[test]
    fn remove_entry_path_cascades_and_reports() {
        let mut entry = OverviewEntry::new(Path::new("/tmp/root"), 0);
        entry.add_entry_path("a/b/c");
        assert!(entry.remove_entry_path("a/b"));
        assert!(entry.tree.resolve_path("a/b/c").is_none());
        assert!(entry.tree.resolve_path("a").is_some());
        assert!(!entry.remove_entry_path("a/b"));
        assert!(!entry.remove_entry_path("untracked"));
        assert!(!entry.remove_entry_path(""));
    }

    #[test]
    fn events_build_tree_and_attach_stats() {
        let mut entry = OverviewEntry::new(Path::new("/watch/docs"), 0);
        let id = entry.session_id();

        entry.on_event(&ScanEvent::FolderEntered {
            session_id: id,
            path: PathBuf::from("/watch/docs"),
        });
        entry.on_event(&ScanEvent::FolderEntered {
            session_id: id,
            path: PathBuf::from("/watch/docs/reports"),
        });
        entry.on_event(&ScanEvent::FolderStats {
            session_id: id,
            path: PathBuf::from("/watch/docs/reports"),
            stats: FolderStats::from_files(PathBuf::from("/watch/docs/reports"), &[]),
        });

        let node = entry.tree.resolve_path("reports").expect("node created");
        assert!(entry.tree.get(node).stats.is_some());
        // The entry root itself never gains a duplicate node.
        assert_eq!(entry.tree.len(), 2);
    }

    #[test]
    fn events_outside_root_are_ignored() {
        let mut entry = OverviewEntry::new(Path::new("/watch/docs"), 0);
        entry.on_event(&ScanEvent::FolderEntered {
            session_id: entry.session_id(),
            path: PathBuf::from("/elsewhere/thing"),
        });
        assert_eq!(entry.tree.len(), 1);
    }
}

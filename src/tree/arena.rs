use compact_str::CompactString;

use crate::stats::FolderStats;

/// Index into the arena `Vec<CanvasNode>`. u32 keeps the node struct small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One parent→child edge, regenerated for the simulation on every reseed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
}

/// Vertical gap used when seeding a new child below its siblings. An
/// initial-placement heuristic to cut simulation settling time, not a
/// layout guarantee.
pub const CHILD_DROP: f32 = 24.0;

/// A node on the overview canvas, stored in a flat arena with sibling-list
/// links. Position and velocity are owned by the interactive context; the
/// scan context only ever produces event values.
#[derive(Debug, Clone)]
pub struct CanvasNode {
    /// Path segment name (not the full path)
    pub name: CompactString,
    /// Parent node index (None for root)
    pub parent: Option<NodeId>,
    /// First child node index
    pub first_child: Option<NodeId>,
    /// Next sibling node index (None if last child)
    pub next_sibling: Option<NodeId>,
    /// Depth in the tree (root = 0), refreshed on structural change
    pub depth: u16,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Pinned position override; pinned nodes ignore simulation forces
    pub fixed: Option<(f32, f32)>,
    /// Latest folder statistics delivered for this node's path
    pub stats: Option<FolderStats>,
    /// Cleared when the node's subtree is removed; dead slots stay in the
    /// arena but are unreachable from the root
    pub alive: bool,
}

impl CanvasNode {
    fn new(name: &str) -> Self {
        CanvasNode {
            name: CompactString::new(name),
            parent: None,
            first_child: None,
            next_sibling: None,
            depth: 0,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            fixed: None,
            stats: None,
            alive: true,
        }
    }
}

/// The overview tree stored as a flat arena of nodes.
pub struct CanvasTree {
    pub nodes: Vec<CanvasNode>,
    pub root: NodeId,
    live: usize,
}

impl CanvasTree {
    /// Create a tree holding only a root node.
    pub fn new(root_name: &str) -> Self {
        CanvasTree {
            nodes: vec![CanvasNode::new(root_name)],
            root: NodeId(0),
            live: 1,
        }
    }

    pub fn get(&self, id: NodeId) -> &CanvasNode {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut CanvasNode {
        &mut self.nodes[id.index()]
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the tree holds only the root.
    pub fn is_empty(&self) -> bool {
        self.live <= 1
    }

    /// Append a child under `parent`, keeping sibling order. The new node
    /// starts just below the parent's lowest-positioned existing child, or
    /// at the parent's own position when it is the first child.
    pub fn add_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let new_id = NodeId(self.nodes.len() as u32);

        let (px, py, depth) = {
            let p = self.get(parent);
            (p.x, p.y, p.depth + 1)
        };
        let lowest_y = self
            .children(parent)
            .map(|c| self.get(c).y)
            .fold(None::<f32>, |acc, y| Some(acc.map_or(y, |a| a.max(y))));

        let mut node = CanvasNode::new(name);
        node.parent = Some(parent);
        node.depth = depth;
        node.x = px;
        node.y = lowest_y.map_or(py, |y| y + CHILD_DROP);

        // Append to the tail of the sibling list so children stay ordered.
        match self.last_child(parent) {
            Some(last) => self.nodes[last.index()].next_sibling = Some(new_id),
            None => self.nodes[parent.index()].first_child = Some(new_id),
        }

        self.nodes.push(node);
        self.live += 1;
        new_id
    }

    /// Detach `child` from `parent` and mark its whole subtree dead.
    /// Returns false when `child` is not a live child of `parent`. The
    /// caller is responsible for reseeding the simulation.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.get(child).alive || self.get(child).parent != Some(parent) {
            return false;
        }

        // Unlink from the sibling chain.
        let mut prev: Option<NodeId> = None;
        let mut cur = self.nodes[parent.index()].first_child;
        while let Some(id) = cur {
            if id == child {
                let next = self.nodes[id.index()].next_sibling;
                match prev {
                    Some(p) => self.nodes[p.index()].next_sibling = next,
                    None => self.nodes[parent.index()].first_child = next,
                }
                break;
            }
            prev = cur;
            cur = self.nodes[id.index()].next_sibling;
        }

        // Cascade: mark the detached subtree dead.
        for id in self.descendants(child, true) {
            self.nodes[id.index()].alive = false;
            self.live -= 1;
        }
        self.nodes[child.index()].parent = None;
        true
    }

    /// Iterate the children of a node in insertion order.
    pub fn children(&self, parent: NodeId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            current: self.nodes[parent.index()].first_child,
        }
    }

    fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        let mut last = None;
        let mut cur = self.nodes[parent.index()].first_child;
        while let Some(id) = cur {
            last = Some(id);
            cur = self.nodes[id.index()].next_sibling;
        }
        last
    }

    /// Find a direct child by segment name.
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .find(|&c| self.get(c).name.as_str() == name)
    }

    /// Pre-order traversal of the subtree under `from`.
    pub fn descendants(&self, from: NodeId, include_self: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut kids: Vec<NodeId> = self.children(id).collect();
            kids.reverse();
            stack.extend(kids);
        }
        if !include_self {
            out.remove(0);
        }
        out
    }

    /// One link per parent→child edge, collected pre-order.
    pub fn links(&self, from: NodeId) -> Vec<Link> {
        let mut out = Vec::new();
        for id in self.descendants(from, true) {
            for child in self.children(id) {
                out.push(Link { source: id, target: child });
            }
        }
        out
    }

    /// Recompute every live node's depth from its ancestry. Invoked by the
    /// layout engine on reseed so depth never goes stale after structural
    /// changes.
    pub fn refresh_depths(&mut self) {
        let order = self.descendants(self.root, true);
        for id in order {
            let depth = match self.get(id).parent {
                Some(p) => self.get(p).depth + 1,
                None => 0,
            };
            self.nodes[id.index()].depth = depth;
        }
    }
}

/// Iterator over the children of a node.
pub struct ChildIter<'a> {
    tree: &'a CanvasTree,
    current: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.tree.nodes[id.index()].next_sibling;
        Some(id)
    }
}

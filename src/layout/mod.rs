pub mod forces;

use crate::tree::arena::{CanvasTree, Link, NodeId};

/// Tuning constants for the tick-driven force solver.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Horizontal distance between depth columns (px). Horizontal layout
    /// is columnar and derived, never simulated.
    pub column_width: f32,
    /// Minimum vertical distance between two nodes in the same column (px)
    pub node_spacing: f32,
    /// Strength of the parent-follow vertical constraint
    pub parent_pull: f32,
    /// Strength of the collision push within a column
    pub collision_push: f32,
    /// Per-tick velocity retention factor (damping)
    pub velocity_decay: f32,
    /// Per-tick clamp on vertical velocity magnitude (px/tick)
    pub max_vertical_velocity: f32,
    /// Per-tick energy decay factor
    pub alpha_decay: f32,
    /// Energy floor below which a tick becomes a no-op
    pub alpha_min: f32,
    /// Energy restored by a reheat
    pub reheat_alpha: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            column_width: 160.0,
            node_spacing: 26.0,
            parent_pull: 0.08,
            collision_push: 0.5,
            velocity_decay: 0.6,
            max_vertical_velocity: 4.0,
            alpha_decay: 0.02,
            alpha_min: 0.005,
            reheat_alpha: 0.9,
        }
    }
}

/// Iterative force simulation over one overview tree. Node and link arrays
/// are snapshots of the tree shape, recaptured on every reseed.
pub struct Simulation {
    pub config: SimulationConfig,
    nodes: Vec<NodeId>,
    links: Vec<Link>,
    alpha: f32,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            links: Vec::new(),
            alpha: 0.0,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Recapture the node/link arrays from the tree. Depths are refreshed
    /// first so column assignment never works from stale values.
    pub fn reseed(&mut self, tree: &mut CanvasTree) {
        tree.refresh_depths();
        self.nodes = tree.descendants(tree.root, true);
        self.links = tree.links(tree.root);
        tracing::debug!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            "simulation reseeded"
        );
    }

    /// Restore simulation energy so a modified node set is re-laid-out
    /// rather than frozen.
    pub fn reheat(&mut self) {
        self.alpha = self.config.reheat_alpha;
    }

    /// Advance the simulation by one frame. Returns false once the
    /// simulation has cooled below the energy floor.
    pub fn tick(&mut self, tree: &mut CanvasTree) -> bool {
        if self.alpha < self.config.alpha_min {
            return false;
        }
        self.alpha *= 1.0 - self.config.alpha_decay;

        forces::parent_follow(tree, &self.nodes, self.config.parent_pull, self.alpha);
        forces::branch_collision(
            tree,
            &self.nodes,
            self.config.node_spacing,
            self.config.collision_push,
        );

        // Integrate: damp, clamp, then move. Only the vertical coordinate
        // is simulated.
        let clamp = self.config.max_vertical_velocity;
        for &id in &self.nodes {
            let node = tree.get_mut(id);
            node.vy = (node.vy * self.config.velocity_decay).clamp(-clamp, clamp);
            node.y += node.vy;
            node.vx = 0.0;
        }

        // Horizontal placement is columnar, anchored at the root's x.
        let root_x = tree.get(tree.root).fixed.map_or(tree.get(tree.root).x, |(x, _)| x);
        for &id in &self.nodes {
            let depth = tree.get(id).depth;
            if id != tree.root {
                tree.get_mut(id).x = root_x + depth as f32 * self.config.column_width;
            }
        }

        // Re-assert pins last so fixed nodes ignore every force.
        for &id in &self.nodes {
            let node = tree.get_mut(id);
            if let Some((fx, fy)) = node.fixed {
                node.x = fx;
                node.y = fy;
                node.vy = 0.0;
            }
        }

        true
    }
}

/// Lifecycle wrapper binding one simulation to a host frame callback.
/// `Idle -> Active -> Idle`; ticks are no-ops while idle, and structural
/// changes are picked up lazily on the next active tick.
pub struct LayoutEngine {
    sim: Simulation,
    active: bool,
    dirty: bool,
}

impl LayoutEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            sim: Simulation::new(config),
            active: false,
            dirty: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Begin ticking. Reheats so a stale layout starts moving again.
    pub fn start(&mut self) {
        if !self.active {
            self.active = true;
            self.sim.reheat();
            tracing::debug!("layout engine started");
        }
    }

    /// Stop ticking. Idempotent; positions are left where they are.
    pub fn stop(&mut self) {
        if self.active {
            self.active = false;
            tracing::debug!("layout engine stopped");
        }
    }

    /// Record a structural change; the next active tick reseeds and
    /// reheats before stepping.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Restore energy without reseeding, for position-only changes such as
    /// re-pinning the root.
    pub fn reheat(&mut self) {
        self.sim.reheat();
    }

    /// One frame step, driven by the host's frame callback. Never blocks.
    /// Returns whether node positions may have changed.
    pub fn tick(&mut self, tree: &mut CanvasTree) -> bool {
        if !self.active {
            return false;
        }
        if self.dirty {
            self.sim.reseed(tree);
            self.sim.reheat();
            self.dirty = false;
        }
        self.sim.tick(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::arena::CanvasTree;

    fn ticked_engine(tree: &mut CanvasTree, ticks: usize) -> LayoutEngine {
        let mut engine = LayoutEngine::new(SimulationConfig::default());
        engine.start();
        for _ in 0..ticks {
            engine.tick(tree);
        }
        engine
    }

    #[test]
    fn overlapping_siblings_converge_to_spacing() {
        let mut tree = CanvasTree::new("root");
        tree.get_mut(tree.root).fixed = Some((0.0, 0.0));
        let a = tree.add_child(tree.root, "a");
        let b = tree.add_child(tree.root, "b");
        tree.get_mut(a).y = 0.0;
        tree.get_mut(b).y = 1.0;

        ticked_engine(&mut tree, 300);

        let gap = (tree.get(a).y - tree.get(b).y).abs();
        let spacing = SimulationConfig::default().node_spacing;
        assert!(
            gap >= spacing * 0.8,
            "siblings should separate, gap = {gap}"
        );
        // Order must settle, not flicker: a started above b and stays there.
        assert!(tree.get(a).y < tree.get(b).y);
    }

    #[test]
    fn horizontal_placement_is_columnar() {
        let mut tree = CanvasTree::new("root");
        tree.get_mut(tree.root).fixed = Some((40.0, 10.0));
        tree.ensure_path("a/b/c");

        ticked_engine(&mut tree, 5);

        let config = SimulationConfig::default();
        for id in tree.descendants(tree.root, false) {
            let node = tree.get(id);
            assert_eq!(node.x, 40.0 + node.depth as f32 * config.column_width);
        }
    }

    #[test]
    fn root_stays_pinned() {
        let mut tree = CanvasTree::new("root");
        tree.get_mut(tree.root).fixed = Some((7.0, 13.0));
        tree.ensure_path("a");
        tree.ensure_path("b");

        ticked_engine(&mut tree, 50);

        assert_eq!(tree.get(tree.root).x, 7.0);
        assert_eq!(tree.get(tree.root).y, 13.0);
    }

    #[test]
    fn vertical_velocity_is_clamped() {
        let mut tree = CanvasTree::new("root");
        tree.get_mut(tree.root).fixed = Some((0.0, 0.0));
        let a = tree.add_child(tree.root, "a");
        tree.get_mut(a).y = 100_000.0;

        let config = SimulationConfig::default();
        let mut engine = LayoutEngine::new(config.clone());
        engine.start();
        let before = tree.get(a).y;
        engine.tick(&mut tree);
        let moved = (tree.get(a).y - before).abs();
        assert!(moved <= config.max_vertical_velocity + 1e-3);
    }

    #[test]
    fn stopped_engine_freezes_positions() {
        let mut tree = CanvasTree::new("root");
        tree.get_mut(tree.root).fixed = Some((0.0, 0.0));
        let a = tree.add_child(tree.root, "a");
        let b = tree.add_child(tree.root, "b");
        tree.get_mut(a).y = 0.0;
        tree.get_mut(b).y = 1.0;

        let mut engine = LayoutEngine::new(SimulationConfig::default());
        engine.start();
        engine.tick(&mut tree);
        engine.stop();
        engine.stop(); // idempotent

        let ya = tree.get(a).y;
        assert!(!engine.tick(&mut tree));
        assert_eq!(tree.get(a).y, ya);
    }

    #[test]
    fn simulation_cools_to_rest() {
        let mut tree = CanvasTree::new("root");
        tree.get_mut(tree.root).fixed = Some((0.0, 0.0));
        tree.ensure_path("a");

        let mut engine = LayoutEngine::new(SimulationConfig::default());
        engine.start();
        let mut active_ticks = 0;
        for _ in 0..10_000 {
            if !engine.tick(&mut tree) {
                break;
            }
            active_ticks += 1;
        }
        assert!(active_ticks < 10_000, "damped simulation must cool down");
    }

    #[test]
    fn crossing_branches_untangle() {
        let mut tree = CanvasTree::new("root");
        tree.get_mut(tree.root).fixed = Some((0.0, 100.0));
        let pa = tree.ensure_path("pa");
        let pb = tree.ensure_path("pb");
        let ca = tree.ensure_path("pa/ca");
        let cb = tree.ensure_path("pb/cb");

        tree.get_mut(pa).y = 160.0;
        tree.get_mut(pb).y = 40.0;
        // Children overlap and contradict the parents' order.
        tree.get_mut(ca).y = 90.0;
        tree.get_mut(cb).y = 95.0;

        ticked_engine(&mut tree, 300);

        // After settling, the children's order agrees with the parents'.
        let parents_order = tree.get(pa).y > tree.get(pb).y;
        let children_order = tree.get(ca).y > tree.get(cb).y;
        assert_eq!(parents_order, children_order);
    }
}

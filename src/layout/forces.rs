use std::collections::HashMap;

use crate::tree::arena::{CanvasTree, NodeId};

/// Pull each non-root node's vertical coordinate toward its parent's, with
/// a small constant strength scaled by the simulation energy. Keeps
/// branches drifting together instead of fragmenting vertically.
pub fn parent_follow(tree: &mut CanvasTree, nodes: &[NodeId], strength: f32, alpha: f32) {
    for &id in nodes {
        let Some(parent) = tree.get(id).parent else {
            continue;
        };
        let parent_y = tree.get(parent).y;
        let node = tree.get_mut(id);
        node.vy += (parent_y - node.y) * strength * alpha;
    }
}

/// Branch-aware collision pass, replacing generic pairwise circle
/// collision. Nodes are grouped into depth columns and each column is
/// swept in vertical order; only adjacent pairs can collide.
///
/// Same-parent collisions push apart symmetrically. Cross-branch
/// collisions first check the parents' vertical order: when the nodes'
/// order already agrees with it, the push is the same symmetric repulsion;
/// when it contradicts it (a crossing), the pair is nudged toward the
/// parents' order so sibling groups never interleave with cousin groups.
pub fn branch_collision(tree: &mut CanvasTree, nodes: &[NodeId], spacing: f32, push: f32) {
    let mut columns: HashMap<u16, Vec<NodeId>> = HashMap::new();
    for &id in nodes {
        columns.entry(tree.get(id).depth).or_default().push(id);
    }

    for column in columns.values_mut() {
        column.sort_by(|&a, &b| {
            tree.get(a)
                .y
                .partial_cmp(&tree.get(b).y)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for pair in column.windows(2) {
            let (upper, lower) = (pair[0], pair[1]);
            let dy = tree.get(lower).y - tree.get(upper).y;
            if dy >= spacing {
                continue;
            }

            let pa = tree.get(upper).parent;
            let pb = tree.get(lower).parent;
            let crossing = match (pa, pb) {
                (Some(pa), Some(pb)) if pa != pb => tree.get(pa).y > tree.get(pb).y,
                _ => false,
            };

            if crossing {
                // Order-preserving correction: move the pair toward the
                // parents' relative order instead of repelling in place.
                let correction = (spacing + dy) * 0.5 * push;
                tree.get_mut(upper).vy += correction;
                tree.get_mut(lower).vy -= correction;
            } else {
                let half = (spacing - dy) * 0.5 * push;
                tree.get_mut(upper).vy -= half;
                tree.get_mut(lower).vy += half;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::arena::CanvasTree;

    #[test]
    fn parent_follow_pulls_toward_parent() {
        let mut tree = CanvasTree::new("root");
        let child = tree.add_child(tree.root, "child");
        tree.get_mut(tree.root).y = 0.0;
        tree.get_mut(child).y = 100.0;

        let nodes = tree.descendants(tree.root, true);
        parent_follow(&mut tree, &nodes, 0.1, 1.0);

        assert!(tree.get(child).vy < 0.0, "child pulled up toward parent");
        assert_eq!(tree.get(tree.root).vy, 0.0, "root has no parent to follow");
    }

    #[test]
    fn same_parent_overlap_pushes_apart() {
        let mut tree = CanvasTree::new("root");
        let a = tree.add_child(tree.root, "a");
        let b = tree.add_child(tree.root, "b");
        tree.get_mut(a).y = 10.0;
        tree.get_mut(b).y = 12.0;

        let nodes = tree.descendants(tree.root, true);
        branch_collision(&mut tree, &nodes, 22.0, 0.5);

        assert!(tree.get(a).vy < 0.0);
        assert!(tree.get(b).vy > 0.0);
    }

    #[test]
    fn separated_nodes_are_untouched() {
        let mut tree = CanvasTree::new("root");
        let a = tree.add_child(tree.root, "a");
        let b = tree.add_child(tree.root, "b");
        tree.get_mut(a).y = 0.0;
        tree.get_mut(b).y = 100.0;

        let nodes = tree.descendants(tree.root, true);
        branch_collision(&mut tree, &nodes, 22.0, 0.5);

        assert_eq!(tree.get(a).vy, 0.0);
        assert_eq!(tree.get(b).vy, 0.0);
    }

    #[test]
    fn crossing_pair_is_nudged_toward_parent_order() {
        let mut tree = CanvasTree::new("root");
        let pa = tree.add_child(tree.root, "pa");
        let pb = tree.add_child(tree.root, "pb");
        let ca = tree.add_child(pa, "ca");
        let cb = tree.add_child(pb, "cb");

        // Parent a sits below parent b, but child a sits above child b:
        // the children contradict the parents' order.
        tree.get_mut(pa).y = 200.0;
        tree.get_mut(pb).y = 0.0;
        tree.get_mut(ca).y = 50.0;
        tree.get_mut(cb).y = 55.0;

        let nodes = tree.descendants(tree.root, true);
        branch_collision(&mut tree, &nodes, 22.0, 0.5);

        // ca must move down (toward its low parent), cb up.
        assert!(tree.get(ca).vy > 0.0);
        assert!(tree.get(cb).vy < 0.0);
    }

    #[test]
    fn consistent_cross_branch_overlap_repels_symmetrically() {
        let mut tree = CanvasTree::new("root");
        let pa = tree.add_child(tree.root, "pa");
        let pb = tree.add_child(tree.root, "pb");
        let ca = tree.add_child(pa, "ca");
        let cb = tree.add_child(pb, "cb");

        tree.get_mut(pa).y = 0.0;
        tree.get_mut(pb).y = 200.0;
        tree.get_mut(ca).y = 50.0;
        tree.get_mut(cb).y = 55.0;

        let nodes = tree.descendants(tree.root, true);
        branch_collision(&mut tree, &nodes, 22.0, 0.5);

        assert!(tree.get(ca).vy < 0.0);
        assert!(tree.get(cb).vy > 0.0);
    }
}

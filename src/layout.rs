use crate::types::TreeNode;
use serde::Serialize;
use std::collections::BTreeMap;

/// 2D position of one tree node, in container pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

/// Compute node positions for a tree snapshot.
///
/// Pure function of the tree shape and the anchor parameters: the root
/// sits at (center_x, top_y), children one level down at ±spread, and
/// the spread halves per level. AVL balance keeps depth, and with it
/// the shrink, logarithmic; there is no minimum-spacing clamp, so a
/// degenerate (non-AVL) input can produce overlapping nodes.
///
/// Keyed by elo in a BTreeMap so iteration and serialization order are
/// deterministic: identical trees at identical anchors always produce
/// bit-identical output.
pub fn layout(
    root: Option<&TreeNode>,
    center_x: f64,
    top_y: f64,
    initial_spread: f64,
    level_height: f64,
) -> BTreeMap<i32, NodePosition> {
    let mut positions = BTreeMap::new();
    if let Some(node) = root {
        place(node, center_x, top_y, initial_spread, level_height, &mut positions);
    }
    positions
}

fn place(
    node: &TreeNode,
    x: f64,
    y: f64,
    spread: f64,
    level_height: f64,
    positions: &mut BTreeMap<i32, NodePosition>,
) {
    positions.insert(node.elo, NodePosition { x, y });
    if let Some(left) = node.left.as_deref() {
        place(left, x - spread, y + level_height, spread / 2.0, level_height, positions);
    }
    if let Some(right) = node.right.as_deref() {
        place(right, x + spread, y + level_height, spread / 2.0, level_height, positions);
    }
}

/// Parent-to-child key pairs, for edge drawing.
pub fn edges(root: Option<&TreeNode>) -> Vec<(i32, i32)> {
    let mut out = Vec::new();
    collect_edges(root, &mut out);
    out
}

fn collect_edges(node: Option<&TreeNode>, out: &mut Vec<(i32, i32)>) {
    if let Some(node) = node {
        if let Some(left) = node.left.as_deref() {
            out.push((node.elo, left.elo));
            collect_edges(Some(left), out);
        }
        if let Some(right) = node.right.as_deref() {
            out.push((node.elo, right.elo));
            collect_edges(Some(right), out);
        }
    }
}

/// Result of checking a tree snapshot against its at-rest invariants.
///
/// Diagnostic only: the balancing itself is server-side, so violations
/// are reported for display and never repaired client-side.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TreeDiagnostics {
    pub node_count: usize,
    pub depth: usize,
    pub bst_valid: bool,
    pub avl_valid: bool,
    pub violations: Vec<String>,
}

/// Verify BST ordering and the AVL rest invariant on a snapshot.
///
/// Checks strict key ordering (duplicate elos are not representable as
/// distinct nodes), that every recomputed balance factor lies in
/// [-1, 1], and that the reported factor matches
/// height(right) - height(left).
pub fn verify(root: Option<&TreeNode>) -> TreeDiagnostics {
    let mut diag = TreeDiagnostics {
        bst_valid: true,
        avl_valid: true,
        ..TreeDiagnostics::default()
    };
    if let Some(node) = root {
        diag.node_count = node.count();
        let depth = check(node, i64::MIN, i64::MAX, &mut diag);
        diag.depth = depth;
    }
    diag
}

/// Returns the recomputed height of the subtree.
fn check(node: &TreeNode, min: i64, max: i64, diag: &mut TreeDiagnostics) -> usize {
    let key = node.elo as i64;
    if key <= min || key >= max {
        diag.bst_valid = false;
        diag.violations
            .push(format!("node {} breaks search ordering", node.elo));
    }

    let left_height = node
        .left
        .as_deref()
        .map_or(0, |n| check(n, min, key, diag));
    let right_height = node
        .right
        .as_deref()
        .map_or(0, |n| check(n, key, max, diag));

    let balance = right_height as i64 - left_height as i64;
    if balance.abs() > 1 {
        diag.avl_valid = false;
        diag.violations
            .push(format!("node {} balance factor {} at rest", node.elo, balance));
    }
    if balance != node.balance_factor as i64 {
        diag.violations.push(format!(
            "node {} reports balance {} but children give {}",
            node.elo, node.balance_factor, balance
        ));
    }

    1 + left_height.max(right_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Player;

    fn node(elo: i32, balance_factor: i32, left: Option<TreeNode>, right: Option<TreeNode>) -> TreeNode {
        TreeNode {
            elo,
            player: Player {
                id: format!("P{}", elo),
                name: format!("Player{}", elo),
                elo,
                ping: 25,
                in_queue: true,
                join_time: Some(0.0),
            },
            balance_factor,
            height: 1,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }

    fn balanced_three() -> TreeNode {
        node(
            1500,
            0,
            Some(node(1400, 0, None, None)),
            Some(node(1600, 0, None, None)),
        )
    }

    #[test]
    fn test_layout_places_root_and_children() {
        let tree = balanced_three();
        let positions = layout(Some(&tree), 400.0, 50.0, 200.0, 80.0);

        assert_eq!(positions.len(), 3);
        assert_eq!(positions[&1500], NodePosition { x: 400.0, y: 50.0 });
        assert_eq!(positions[&1400], NodePosition { x: 200.0, y: 130.0 });
        assert_eq!(positions[&1600], NodePosition { x: 600.0, y: 130.0 });
    }

    #[test]
    fn test_layout_spread_halves_per_level() {
        let tree = node(
            1500,
            -1,
            Some(node(
                1400,
                0,
                Some(node(1350, 0, None, None)),
                Some(node(1450, 0, None, None)),
            )),
            Some(node(1600, 0, None, None)),
        );
        let positions = layout(Some(&tree), 400.0, 50.0, 200.0, 80.0);

        // grandchildren sit ±100 around their parent at 200
        assert_eq!(positions[&1350], NodePosition { x: 100.0, y: 210.0 });
        assert_eq!(positions[&1450], NodePosition { x: 300.0, y: 210.0 });
    }

    #[test]
    fn test_layout_deterministic_bit_identical() {
        let tree = balanced_three();
        let a = layout(Some(&tree), 512.0, 50.0, 128.0, 80.0);
        let b = layout(Some(&tree), 512.0, 50.0, 128.0, 80.0);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_layout_empty_tree() {
        assert!(layout(None, 400.0, 50.0, 200.0, 80.0).is_empty());
        assert!(edges(None).is_empty());
    }

    #[test]
    fn test_edges_parent_child_pairs() {
        let tree = balanced_three();
        let edges = edges(Some(&tree));
        assert_eq!(edges, vec![(1500, 1400), (1500, 1600)]);
    }

    #[test]
    fn test_verify_accepts_valid_avl() {
        let tree = balanced_three();
        let diag = verify(Some(&tree));
        assert!(diag.bst_valid);
        assert!(diag.avl_valid);
        assert!(diag.violations.is_empty());
        assert_eq!(diag.node_count, 3);
        assert_eq!(diag.depth, 2);
    }

    #[test]
    fn test_verify_flags_ordering_violation() {
        // right child smaller than its parent
        let tree = node(1500, 0, None, Some(node(1200, 0, None, None)));
        let diag = verify(Some(&tree));
        assert!(!diag.bst_valid);
        assert!(diag.violations.iter().any(|v| v.contains("1200")));
    }

    #[test]
    fn test_verify_flags_rest_imbalance() {
        // a left-left chain no AVL tree would hold at rest
        let tree = node(
            1500,
            -2,
            Some(node(1400, -1, Some(node(1300, 0, None, None)), None)),
            None,
        );
        let diag = verify(Some(&tree));
        assert!(diag.bst_valid);
        assert!(!diag.avl_valid);
    }

    #[test]
    fn test_verify_flags_balance_factor_mismatch() {
        let mut tree = balanced_three();
        tree.balance_factor = 1;
        let diag = verify(Some(&tree));
        // shape is still a legal AVL; only the reported factor is off
        assert!(diag.avl_valid);
        assert!(diag
            .violations
            .iter()
            .any(|v| v.contains("reports balance")));
    }

    #[test]
    fn test_verify_empty_tree() {
        let diag = verify(None);
        assert!(diag.bst_valid);
        assert!(diag.avl_valid);
        assert_eq!(diag.node_count, 0);
        assert_eq!(diag.depth, 0);
    }
}

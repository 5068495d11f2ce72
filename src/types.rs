use serde::{Deserialize, Serialize};

/// A player as mirrored from the server.
///
/// `elo` doubles as the search-tree key and never changes in place: the
/// server models a rating change as delete + reinsert, so a given `elo`
/// value identifies at most one live tree node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Opaque stable identifier.
    pub id: String,
    pub name: String,
    /// Integer rating, the tree's ordering key.
    pub elo: i32,
    /// Ping in milliseconds.
    pub ping: i32,
    pub in_queue: bool,
    /// Epoch seconds; present while the player waits in queue.
    #[serde(default)]
    pub join_time: Option<f64>,
}

/// One node of the server's balanced search tree, keyed by `elo`.
///
/// Children are owned subtrees; `player` is a snapshot copy, not an
/// ownership edge. Keys are unique across the live tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub elo: i32,
    pub player: Player,
    /// height(right) - height(left); in [-1, 1] at rest.
    pub balance_factor: i32,
    /// Subtree height as reported by the server.
    #[serde(default)]
    pub height: i32,
    pub left: Option<Box<TreeNode>>,
    pub right: Option<Box<TreeNode>>,
}

impl TreeNode {
    /// Number of nodes in this subtree.
    pub fn count(&self) -> usize {
        1 + self.left.as_deref().map_or(0, TreeNode::count)
            + self.right.as_deref().map_or(0, TreeNode::count)
    }
}

/// A formed match, received fully built and immutable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Monotonic, unique.
    pub match_id: u64,
    pub team_a: Vec<Player>,
    pub team_b: Vec<Player>,
    pub team_a_total: i64,
    pub team_b_total: i64,
    /// 0-100, higher is better.
    pub balance_score: f64,
    /// |team_a_total - team_b_total|
    pub gap: i64,
    /// Average queue wait of the matched players, seconds.
    pub avg_wait: f64,
    /// Server-formatted clock time (HH:MM:SS).
    pub timestamp: String,
}

impl Match {
    /// Ids of every player on either team.
    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.team_a
            .iter()
            .chain(self.team_b.iter())
            .map(|p| p.id.as_str())
    }
}

/// Aggregate server statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub queue_size: usize,
    pub total_matches: u64,
    pub avg_balance: f64,
    pub avg_wait: f64,
}

/// Rebalancing rotation cases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationKind {
    LL,
    LR,
    RL,
    RR,
}

/// One rebalancing event that occurred during a server-side insert or
/// delete, anchored at the tree key it pivoted around.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(rename = "type")]
    pub kind: RotationKind,
    pub node: i32,
}

/// A rotation scheduled for display. Carries no state-mutating effect;
/// the tree snapshot already reflects the post-rotation shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationAnnotation {
    pub rotation: Rotation,
    /// Milliseconds after the triggering event at which to show it.
    pub delay_ms: u32,
}

/// Client tuning knobs, overridable from the host as JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Wait time at which the queue progress bar saturates (seconds).
    pub wait_saturation_secs: f64,
    /// Match history ring capacity.
    pub history_capacity: usize,
    /// Delay between successive rotation annotations (ms).
    pub rotation_stagger_ms: u32,
    /// How long a formed match stays on display (seconds).
    pub match_display_secs: f64,
    /// Vertical distance between tree levels (px).
    pub level_height: f64,
    /// Y coordinate of the tree root (px).
    pub top_margin: f64,
    /// Initial horizontal spread = container width / this divisor.
    pub spread_divisor: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            wait_saturation_secs: 30.0,
            history_capacity: 10,
            rotation_stagger_ms: 500,
            match_display_secs: 5.0,
            level_height: 80.0,
            top_margin: 50.0,
            spread_divisor: 4.0,
        }
    }
}

use crate::types::Player;
use serde::Serialize;
use std::collections::HashMap;

/// One queue row as shown to the user, derived on demand.
///
/// Wait time is never stored: it is recomputed from `join_time` against
/// the clock on each display tick, so it keeps advancing between
/// channel events.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueueEntry {
    pub player: Player,
    /// Whole seconds waited so far.
    pub wait_secs: f64,
    /// Fraction of the saturation window elapsed, capped at 1.0.
    pub wait_fraction: f64,
}

/// Project the queue view from the player map.
///
/// Entries cover every `in_queue` player, in arrival order (`join_time`
/// ascending, id as tie-break so the ordering is total).
pub fn queue_projection(
    players: &HashMap<String, Player>,
    now: f64,
    saturation_secs: f64,
) -> Vec<QueueEntry> {
    let mut entries: Vec<QueueEntry> = players
        .values()
        .filter(|p| p.in_queue)
        .map(|p| {
            let wait_secs = p
                .join_time
                .map_or(0.0, |joined| (now - joined).max(0.0).floor());
            QueueEntry {
                wait_fraction: (wait_secs / saturation_secs).min(1.0),
                wait_secs,
                player: p.clone(),
            }
        })
        .collect();
    entries.sort_by(|a, b| {
        a.player
            .join_time
            .unwrap_or(0.0)
            .total_cmp(&b.player.join_time.unwrap_or(0.0))
            .then_with(|| a.player.id.cmp(&b.player.id))
    });
    entries
}

/// Number of players currently in queue.
pub fn queue_size(players: &HashMap<String, Player>) -> usize {
    players.values().filter(|p| p.in_queue).count()
}

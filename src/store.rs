use crate::channel::ChannelEvent;
use crate::types::*;
use std::collections::{HashMap, VecDeque};

/// The single source of truth for the UI.
///
/// Constructed empty at session start, populated by the initial
/// snapshot fetches, and thereafter mutated only through the apply_*
/// methods below. Each method is one atomic transition; the host event
/// loop runs at most one of them at a time. Readers must treat every
/// field as possibly stale between ticks.
pub struct ViewModelStore {
    /// Exactly one record per player id.
    pub players: HashMap<String, Player>,
    /// Most-recent-first, bounded by `config.history_capacity`.
    pub match_history: VecDeque<Match>,
    pub current_match: Option<Match>,
    pub tree: Option<TreeNode>,
    pub stats: Stats,
    config: ClientConfig,
    /// Bumped on every applied transition; the renderer's change signal.
    revision: u64,
    /// Epoch seconds at which `current_match` went on display.
    current_match_since: Option<f64>,
    /// Rotation display schedule awaiting pickup by the renderer.
    pending_annotations: Vec<RotationAnnotation>,
}

impl ViewModelStore {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            players: HashMap::new(),
            match_history: VecDeque::new(),
            current_match: None,
            tree: None,
            stats: Stats::default(),
            config,
            revision: 0,
            current_match_since: None,
            pending_annotations: Vec::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply one inbound channel event as an atomic transition.
    ///
    /// The embedded tree snapshot always replaces `tree` wholesale;
    /// incremental tree patching is never attempted client-side because
    /// the server already computed the canonical post-rotation shape.
    pub fn apply_event(&mut self, event: ChannelEvent, now: f64) {
        match event {
            ChannelEvent::PlayerJoined {
                player,
                rotations,
                tree,
            } => {
                #[cfg(feature = "debug")]
                eprintln!("store: player_joined {} (elo {})", player.id, player.elo);
                self.players.insert(player.id.clone(), player);
                self.schedule_rotations(rotations);
                self.tree = tree;
            }
            ChannelEvent::MatchFormed { game, stats, tree } => {
                #[cfg(feature = "debug")]
                eprintln!("store: match_formed #{}", game.match_id);
                for id in game.player_ids().map(str::to_owned).collect::<Vec<_>>() {
                    self.players.remove(&id);
                }
                self.match_history.push_front((*game).clone());
                self.match_history.truncate(self.config.history_capacity);
                self.current_match = Some(*game);
                self.current_match_since = Some(now);
                self.stats = stats;
                self.tree = tree;
            }
            ChannelEvent::PlayerDeleted { player_id, tree } => {
                #[cfg(feature = "debug")]
                eprintln!("store: player_deleted {}", player_id);
                self.players.remove(&player_id);
                self.tree = tree;
            }
        }
        self.revision += 1;
    }

    /// Overwrite the player map from a full snapshot fetch.
    ///
    /// Last fetch wins: no merge with events applied while the request
    /// was in flight, so a stale response can resurrect players removed
    /// by a faster-arriving push event. That gap is accepted; the next
    /// snapshot refresh converges.
    pub fn apply_players_snapshot(&mut self, players: Vec<Player>) {
        self.players = players.into_iter().map(|p| (p.id.clone(), p)).collect();
        self.revision += 1;
    }

    /// Overwrite the tree from a full snapshot fetch. Applying the same
    /// snapshot twice yields an identical store.
    pub fn apply_tree_snapshot(&mut self, tree: Option<TreeNode>) {
        self.tree = tree;
        self.revision += 1;
    }

    /// Overwrite the aggregate stats from a full snapshot fetch.
    pub fn apply_stats_snapshot(&mut self, stats: Stats) {
        self.stats = stats;
        self.revision += 1;
    }

    /// 1 Hz housekeeping: retire the current match once its display
    /// window has elapsed.
    pub fn tick(&mut self, now: f64) {
        if let Some(since) = self.current_match_since {
            if now - since >= self.config.match_display_secs {
                self.current_match = None;
                self.current_match_since = None;
                self.revision += 1;
            }
        }
    }

    /// Hand the queued rotation display schedule to the renderer.
    pub fn take_rotation_annotations(&mut self) -> Vec<RotationAnnotation> {
        std::mem::take(&mut self.pending_annotations)
    }

    fn schedule_rotations(&mut self, rotations: Vec<Rotation>) {
        let stagger = self.config.rotation_stagger_ms;
        self.pending_annotations
            .extend(rotations.into_iter().enumerate().map(|(i, rotation)| {
                RotationAnnotation {
                    rotation,
                    delay_ms: i as u32 * stagger,
                }
            }));
    }
}

impl Default for ViewModelStore {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

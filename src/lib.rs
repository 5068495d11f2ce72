mod channel;
mod fetch;
mod layout;
mod projection;
mod roster;
mod store;
mod types;

use channel::EventChannel;
use fetch::{ApiRequest, Snapshot, SnapshotFetcher};
use rand::rngs::StdRng;
use rand::SeedableRng;
use store::ViewModelStore;
use types::*;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn now_secs() -> f64 {
    js_sys::Date::now() / 1000.0
}

/// WASM-exposed client engine.
///
/// The JS host owns the actual transports (push channel, fetch, the
/// 1 Hz timer) and the rendering; this engine owns the mirrored state
/// and every decision about it. All payloads cross the boundary as
/// JSON strings.
#[wasm_bindgen]
pub struct ClientEngine {
    store: ViewModelStore,
    channel: EventChannel,
    fetcher: SnapshotFetcher,
    rng: StdRng,
    on_change: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl ClientEngine {
    /// Create an empty client; the initial snapshot fetches populate it.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> ClientEngine {
        ClientEngine {
            store: ViewModelStore::new(ClientConfig::default()),
            channel: EventChannel::new(),
            fetcher: SnapshotFetcher::new(),
            rng: StdRng::seed_from_u64(seed),
            on_change: None,
        }
    }

    /// Create with custom config
    pub fn new_with_config(seed: u64, config_json: &str) -> Result<ClientEngine, JsValue> {
        let config: ClientConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Config parse error: {}", e)))?;
        Ok(ClientEngine {
            store: ViewModelStore::new(config),
            channel: EventChannel::new(),
            fetcher: SnapshotFetcher::new(),
            rng: StdRng::seed_from_u64(seed),
            on_change: None,
        })
    }

    /// Register the view-model change listener; called with the new
    /// revision after every applied transition.
    pub fn set_on_change(&mut self, callback: js_sys::Function) {
        self.on_change = Some(callback);
    }

    // ── push channel ──

    /// The push channel connected. On a reconnect the incremental view
    /// is no longer trustworthy, so all snapshots are re-armed.
    pub fn channel_opened(&mut self) {
        if self.channel.on_open() {
            web_sys::console::log_1(&"channel reconnected, re-fetching snapshots".into());
            self.fetcher.mark_all_due();
        }
    }

    /// The push channel dropped. Events emitted during the gap are lost
    /// server-side; `channel_opened` will trigger the re-snapshot.
    pub fn channel_closed(&mut self) {
        web_sys::console::warn_1(&"channel disconnected".into());
        self.channel.on_close();
    }

    /// Deliver one raw channel message (event name + JSON payload) and
    /// reconcile everything queued so far into the store.
    pub fn deliver_event(&mut self, kind: &str, payload_json: &str) -> Result<(), JsValue> {
        self.channel
            .push_raw(kind, payload_json)
            .map_err(|e| JsValue::from_str(&e))?;
        let now = now_secs();
        for event in self.channel.drain() {
            self.store.apply_event(event, now);
            self.notify_change();
        }
        Ok(())
    }

    // ── snapshot fetches ──

    /// Snapshot GETs the host should issue now, as JSON
    /// `[{"snapshot":..,"path":..}, ..]`.
    pub fn due_fetches(&mut self) -> String {
        let due: Vec<_> = self
            .fetcher
            .take_due()
            .into_iter()
            .map(|s| serde_json::json!({ "snapshot": s, "path": s.path() }))
            .collect();
        serde_json::to_string(&due).unwrap_or_default()
    }

    /// Report a transport-level fetch failure; the endpoint is retried
    /// on the next tick.
    pub fn fetch_failed(&mut self, snapshot: &str) -> Result<(), JsValue> {
        self.fetcher.fail(parse_snapshot(snapshot)?);
        Ok(())
    }

    /// Apply a GET /api/players response. Unconditional overwrite:
    /// whichever response lands last wins, even if push events applied
    /// meanwhile were newer.
    pub fn apply_players_snapshot(&mut self, players_json: &str) -> Result<(), JsValue> {
        let players: Vec<Player> = serde_json::from_str(players_json)
            .map_err(|e| JsValue::from_str(&format!("Players parse error: {}", e)))?;
        self.fetcher.complete(Snapshot::Players);
        self.store.apply_players_snapshot(players);
        self.notify_change();
        Ok(())
    }

    /// Apply a GET /api/tree response (the body may be `null`).
    pub fn apply_tree_snapshot(&mut self, tree_json: &str) -> Result<(), JsValue> {
        let tree: Option<TreeNode> = serde_json::from_str(tree_json)
            .map_err(|e| JsValue::from_str(&format!("Tree parse error: {}", e)))?;
        self.fetcher.complete(Snapshot::Tree);
        self.store.apply_tree_snapshot(tree);
        self.notify_change();
        Ok(())
    }

    /// Apply a GET /api/stats response.
    pub fn apply_stats_snapshot(&mut self, stats_json: &str) -> Result<(), JsValue> {
        let stats: Stats = serde_json::from_str(stats_json)
            .map_err(|e| JsValue::from_str(&format!("Stats parse error: {}", e)))?;
        self.fetcher.complete(Snapshot::Stats);
        self.store.apply_stats_snapshot(stats);
        self.notify_change();
        Ok(())
    }

    // ── display tick ──

    /// 1 Hz tick: expires the match display window and returns the
    /// freshly projected queue as JSON.
    pub fn tick(&mut self) -> String {
        let now = now_secs();
        let before = self.store.revision();
        self.store.tick(now);
        if self.store.revision() != before {
            self.notify_change();
        }
        let entries = projection::queue_projection(
            &self.store.players,
            now,
            self.store.config().wait_saturation_secs,
        );
        serde_json::to_string(&entries).unwrap_or_default()
    }

    // ── tree view ──

    /// Lay out the current tree for a container of the given width, as
    /// JSON `{elo: {x, y}, ..}`. Call again on resize.
    pub fn layout(&self, width: f64) -> String {
        let config = self.store.config();
        let positions = layout::layout(
            self.store.tree.as_ref(),
            width / 2.0,
            config.top_margin,
            width / config.spread_divisor,
            config.level_height,
        );
        serde_json::to_string(&positions).unwrap_or_default()
    }

    /// Parent-to-child elo pairs for edge drawing.
    pub fn tree_edges(&self) -> String {
        serde_json::to_string(&layout::edges(self.store.tree.as_ref())).unwrap_or_default()
    }

    /// Check the mirrored tree against its at-rest invariants.
    pub fn tree_diagnostics(&self) -> String {
        serde_json::to_string(&layout::verify(self.store.tree.as_ref())).unwrap_or_default()
    }

    /// Drain the rotation display schedule queued by recent inserts.
    pub fn take_rotation_annotations(&mut self) -> String {
        serde_json::to_string(&self.store.take_rotation_annotations()).unwrap_or_default()
    }

    // ── state getters ──

    /// All known players as JSON, ordered by id.
    pub fn get_players(&self) -> String {
        let mut players: Vec<&Player> = self.store.players.values().collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));
        serde_json::to_string(&players).unwrap_or_default()
    }

    pub fn get_match_history(&self) -> String {
        serde_json::to_string(&self.store.match_history).unwrap_or_default()
    }

    /// The match currently on display, or JSON `null`.
    pub fn get_current_match(&self) -> String {
        serde_json::to_string(&self.store.current_match).unwrap_or_default()
    }

    pub fn get_stats(&self) -> String {
        serde_json::to_string(&self.store.stats).unwrap_or_default()
    }

    pub fn get_tree(&self) -> String {
        serde_json::to_string(&self.store.tree).unwrap_or_default()
    }

    pub fn queue_size(&self) -> usize {
        projection::queue_size(&self.store.players)
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn is_channel_connected(&self) -> bool {
        self.channel.is_connected()
    }

    // ── management actions ──

    /// Prefill for the add-player form as JSON `{name, elo, ping}`.
    pub fn random_player(&mut self) -> String {
        serde_json::to_string(&roster::random_player(&mut self.rng)).unwrap_or_default()
    }

    pub fn add_player_request(&self, name: &str, elo: i32, ping: i32) -> String {
        serde_json::to_string(&ApiRequest::add_player(name, elo, ping)).unwrap_or_default()
    }

    pub fn delete_player_request(&self, player_id: &str) -> String {
        serde_json::to_string(&ApiRequest::delete_player(player_id)).unwrap_or_default()
    }

    pub fn start_simulation_request(&self) -> String {
        serde_json::to_string(&ApiRequest::start_simulation()).unwrap_or_default()
    }

    pub fn stop_simulation_request(&self) -> String {
        serde_json::to_string(&ApiRequest::stop_simulation()).unwrap_or_default()
    }

    pub fn simulation_speed_request(&self, speed: f64) -> String {
        serde_json::to_string(&ApiRequest::set_simulation_speed(speed)).unwrap_or_default()
    }
}

impl ClientEngine {
    fn notify_change(&self) {
        if let Some(callback) = &self.on_change {
            let revision = JsValue::from_f64(self.store.revision() as f64);
            let _ = callback.call1(&JsValue::NULL, &revision);
        }
    }
}

fn parse_snapshot(name: &str) -> Result<Snapshot, JsValue> {
    match name {
        "players" => Ok(Snapshot::Players),
        "tree" => Ok(Snapshot::Tree),
        "stats" => Ok(Snapshot::Stats),
        other => Err(JsValue::from_str(&format!("unknown snapshot: {}", other))),
    }
}

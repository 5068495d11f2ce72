use serde::Serialize;
use serde_json::json;

/// The point-in-time snapshot endpoints the client mirrors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Snapshot {
    Players,
    Tree,
    Stats,
}

pub const ALL_SNAPSHOTS: [Snapshot; 3] = [Snapshot::Players, Snapshot::Tree, Snapshot::Stats];

impl Snapshot {
    pub fn path(&self) -> &'static str {
        match self {
            Snapshot::Players => "/api/players",
            Snapshot::Tree => "/api/tree",
            Snapshot::Stats => "/api/stats",
        }
    }
}

/// Bookkeeping for the host's snapshot requests.
///
/// The engine never performs I/O itself: the host asks which GETs are
/// due, issues them, and reports completion or failure. A failed fetch
/// is re-armed for the next tick rather than retried immediately, and
/// is never fatal. Responses are applied to the store in whatever order
/// they arrive; there is no sequencing of in-flight requests.
pub struct SnapshotFetcher {
    due: Vec<Snapshot>,
    in_flight: Vec<Snapshot>,
}

impl SnapshotFetcher {
    /// Starts with every snapshot due: the store is empty at session
    /// start and populated by the initial fetches.
    pub fn new() -> Self {
        Self {
            due: ALL_SNAPSHOTS.to_vec(),
            in_flight: Vec::new(),
        }
    }

    /// Snapshots the host should request now. Taken entries move to
    /// in-flight until completed or failed.
    pub fn take_due(&mut self) -> Vec<Snapshot> {
        let due = std::mem::take(&mut self.due);
        for s in &due {
            if !self.in_flight.contains(s) {
                self.in_flight.push(*s);
            }
        }
        due
    }

    /// A response arrived and was applied to the store.
    pub fn complete(&mut self, snapshot: Snapshot) {
        self.in_flight.retain(|s| *s != snapshot);
    }

    /// The request failed in transport; retry on the next tick.
    pub fn fail(&mut self, snapshot: Snapshot) {
        #[cfg(feature = "debug")]
        eprintln!("fetch: {} failed, retrying next tick", snapshot.path());
        self.in_flight.retain(|s| *s != snapshot);
        if !self.due.contains(&snapshot) {
            self.due.push(snapshot);
        }
    }

    /// Re-arm everything, e.g. after a channel reconnect invalidated
    /// the incremental view.
    pub fn mark_all_due(&mut self) {
        for s in ALL_SNAPSHOTS {
            if !self.due.contains(&s) {
                self.due.push(s);
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.due.is_empty() && self.in_flight.is_empty()
    }
}

impl Default for SnapshotFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// A REST call for the host to issue verbatim.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn add_player(name: &str, elo: i32, ping: i32) -> ApiRequest {
        ApiRequest {
            method: "POST",
            path: "/api/player/add".to_string(),
            body: Some(json!({ "name": name, "elo": elo, "ping": ping }).to_string()),
        }
    }

    pub fn delete_player(player_id: &str) -> ApiRequest {
        ApiRequest {
            method: "DELETE",
            path: format!("/api/player/delete/{}", player_id),
            body: None,
        }
    }

    pub fn start_simulation() -> ApiRequest {
        ApiRequest {
            method: "POST",
            path: "/api/simulation/start".to_string(),
            body: None,
        }
    }

    pub fn stop_simulation() -> ApiRequest {
        ApiRequest {
            method: "POST",
            path: "/api/simulation/stop".to_string(),
            body: None,
        }
    }

    pub fn set_simulation_speed(speed: f64) -> ApiRequest {
        ApiRequest {
            method: "POST",
            path: "/api/simulation/speed".to_string(),
            body: Some(json!({ "speed": speed }).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_snapshots_due_at_start() {
        let mut fetcher = SnapshotFetcher::new();
        let due = fetcher.take_due();
        assert_eq!(due, ALL_SNAPSHOTS.to_vec());
        // nothing more to issue until something completes or fails
        assert!(fetcher.take_due().is_empty());
        assert!(!fetcher.is_idle());
    }

    #[test]
    fn test_complete_clears_in_flight() {
        let mut fetcher = SnapshotFetcher::new();
        fetcher.take_due();
        for s in ALL_SNAPSHOTS {
            fetcher.complete(s);
        }
        assert!(fetcher.is_idle());
    }

    #[test]
    fn test_failure_rearms_for_next_tick() {
        let mut fetcher = SnapshotFetcher::new();
        fetcher.take_due();
        fetcher.complete(Snapshot::Players);
        fetcher.complete(Snapshot::Stats);
        fetcher.fail(Snapshot::Tree);

        let due = fetcher.take_due();
        assert_eq!(due, vec![Snapshot::Tree]);
    }

    #[test]
    fn test_mark_all_due_after_reconnect() {
        let mut fetcher = SnapshotFetcher::new();
        fetcher.take_due();
        for s in ALL_SNAPSHOTS {
            fetcher.complete(s);
        }
        assert!(fetcher.is_idle());

        fetcher.mark_all_due();
        assert_eq!(fetcher.take_due().len(), 3);
    }

    #[test]
    fn test_snapshot_paths() {
        assert_eq!(Snapshot::Players.path(), "/api/players");
        assert_eq!(Snapshot::Tree.path(), "/api/tree");
        assert_eq!(Snapshot::Stats.path(), "/api/stats");
    }

    #[test]
    fn test_add_player_request_body() {
        let req = ApiRequest::add_player("NovaKnight77", 1650, 42);
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/api/player/add");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "NovaKnight77");
        assert_eq!(body["elo"], 1650);
        assert_eq!(body["ping"], 42);
    }

    #[test]
    fn test_delete_and_simulation_requests() {
        assert_eq!(
            ApiRequest::delete_player("P1234").path,
            "/api/player/delete/P1234"
        );
        assert_eq!(ApiRequest::start_simulation().path, "/api/simulation/start");
        assert_eq!(ApiRequest::stop_simulation().path, "/api/simulation/stop");

        let speed = ApiRequest::set_simulation_speed(2.5);
        let body: serde_json::Value = serde_json::from_str(speed.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["speed"], 2.5);
    }
}

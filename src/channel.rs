use crate::types::*;
use serde::Deserialize;
use std::collections::VecDeque;

/// An incremental state-change notification pushed by the server.
///
/// Structural events carry a fresh authoritative tree snapshot rather
/// than a diff: rotation chains can touch arbitrarily many ancestors, so
/// the server always re-sends the whole tree.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    PlayerJoined {
        player: Player,
        rotations: Vec<Rotation>,
        tree: Option<TreeNode>,
    },
    MatchFormed {
        game: Box<Match>,
        stats: Stats,
        tree: Option<TreeNode>,
    },
    PlayerDeleted {
        player_id: String,
        tree: Option<TreeNode>,
    },
}

#[derive(Deserialize)]
struct PlayerJoinedPayload {
    player: Player,
    #[serde(default)]
    rotations: Vec<Rotation>,
    tree: Option<TreeNode>,
}

#[derive(Deserialize)]
struct MatchFormedPayload {
    #[serde(rename = "match")]
    game: Match,
    stats: Stats,
    tree: Option<TreeNode>,
}

#[derive(Deserialize)]
struct PlayerDeletedPayload {
    player_id: String,
    tree: Option<TreeNode>,
}

impl ChannelEvent {
    /// Parse a raw channel message into its tagged variant.
    ///
    /// An unknown kind or a payload missing expected fields is a
    /// contract violation and surfaces as an error; it is never
    /// silently dropped.
    pub fn parse(kind: &str, payload_json: &str) -> Result<ChannelEvent, String> {
        match kind {
            "player_joined" => {
                let p: PlayerJoinedPayload = serde_json::from_str(payload_json)
                    .map_err(|e| format!("player_joined payload: {}", e))?;
                Ok(ChannelEvent::PlayerJoined {
                    player: p.player,
                    rotations: p.rotations,
                    tree: p.tree,
                })
            }
            "match_formed" => {
                let p: MatchFormedPayload = serde_json::from_str(payload_json)
                    .map_err(|e| format!("match_formed payload: {}", e))?;
                Ok(ChannelEvent::MatchFormed {
                    game: Box::new(p.game),
                    stats: p.stats,
                    tree: p.tree,
                })
            }
            "player_deleted" => {
                let p: PlayerDeletedPayload = serde_json::from_str(payload_json)
                    .map_err(|e| format!("player_deleted payload: {}", e))?;
                Ok(ChannelEvent::PlayerDeleted {
                    player_id: p.player_id,
                    tree: p.tree,
                })
            }
            other => Err(format!("unknown channel event kind: {}", other)),
        }
    }
}

/// Single-consumer ingress for the push channel.
///
/// Messages are parsed on arrival and queued in delivery order; the
/// reconciler drains them one at a time. Events buffered server-side
/// during a disconnect are lost, so a reconnect requires a full
/// re-snapshot instead of incremental resume.
pub struct EventChannel {
    pending: VecDeque<ChannelEvent>,
    connected: bool,
    ever_connected: bool,
}

impl EventChannel {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            connected: false,
            ever_connected: false,
        }
    }

    /// Parse and enqueue a raw message.
    pub fn push_raw(&mut self, kind: &str, payload_json: &str) -> Result<(), String> {
        let event = ChannelEvent::parse(kind, payload_json)?;
        #[cfg(feature = "debug")]
        eprintln!("channel: queued {} ({} pending)", kind, self.pending.len() + 1);
        self.pending.push_back(event);
        Ok(())
    }

    /// Take all queued events in delivery order.
    pub fn drain(&mut self) -> Vec<ChannelEvent> {
        self.pending.drain(..).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Record the channel opening. Returns true when this is a
    /// reconnect after a gap, i.e. the caller must re-fetch full
    /// snapshots before trusting further incremental events.
    pub fn on_open(&mut self) -> bool {
        self.connected = true;
        let reconnect = self.ever_connected;
        self.ever_connected = true;
        reconnect
    }

    /// Record the channel closing. Already-delivered events stay
    /// queued; anything emitted server-side from now on is lost.
    pub fn on_close(&mut self) {
        self.connected = false;
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued_player_json(id: &str, elo: i32) -> String {
        format!(
            r#"{{"id":"{}","name":"Tester","elo":{},"ping":30,"in_queue":true,"join_time":100.0}}"#,
            id, elo
        )
    }

    #[test]
    fn test_parse_player_joined() {
        let payload = format!(
            r#"{{"player":{},"rotations":[{{"type":"LR","node":40}}],"tree":null}}"#,
            queued_player_json("P1", 1500)
        );
        let event = ChannelEvent::parse("player_joined", &payload).unwrap();
        match event {
            ChannelEvent::PlayerJoined {
                player, rotations, ..
            } => {
                assert_eq!(player.id, "P1");
                assert_eq!(rotations.len(), 1);
                assert_eq!(rotations[0].kind, RotationKind::LR);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_parse_player_deleted() {
        let event =
            ChannelEvent::parse("player_deleted", r#"{"player_id":"P9","tree":null}"#).unwrap();
        assert_eq!(
            event,
            ChannelEvent::PlayerDeleted {
                player_id: "P9".to_string(),
                tree: None,
            }
        );
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let result = ChannelEvent::parse("server_restarted", "{}");
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_payload_propagates() {
        // player_joined without its player field must not be swallowed
        let result = ChannelEvent::parse("player_joined", r#"{"rotations":[],"tree":null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_drain_preserves_delivery_order() {
        let mut channel = EventChannel::new();
        channel.on_open();
        channel
            .push_raw("player_deleted", r#"{"player_id":"P1","tree":null}"#)
            .unwrap();
        channel
            .push_raw("player_deleted", r#"{"player_id":"P2","tree":null}"#)
            .unwrap();

        let events = channel.drain();
        let ids: Vec<_> = events
            .iter()
            .map(|e| match e {
                ChannelEvent::PlayerDeleted { player_id, .. } => player_id.clone(),
                other => panic!("wrong variant: {:?}", other),
            })
            .collect();
        assert_eq!(ids, vec!["P1", "P2"]);
        assert_eq!(channel.pending_len(), 0);
    }

    #[test]
    fn test_reconnect_requires_resnapshot() {
        let mut channel = EventChannel::new();
        // first connect of the session is not a reconnect
        assert!(!channel.on_open());
        channel.on_close();
        assert!(!channel.is_connected());
        // events for the gap are gone; incremental resume is not allowed
        assert!(channel.on_open());
    }
}

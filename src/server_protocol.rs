use serde::Serialize;
use serde_json::Value;

use crate::game_store::{Room, RoomKey, SYSTEM_OWNER};
use crate::scenario::Query;
use crate::server_utils::{parse_seed_value, sanitize_name};
use crate::types::{GameMode, InitialClue, LogEntry, LogKind};

#[derive(Debug, PartialEq, Eq)]
pub struct InvestigateRequest {
    pub player: String,
    pub query: Query,
}

/// `{"player", "kind": "location", "location", "time"}` or
/// `{"player", "kind": "actor", "actor", "location"}`.
pub fn parse_investigate_request(value: &Value) -> Option<InvestigateRequest> {
    let object = value.as_object()?;
    let player = sanitize_name(object.get("player")?.as_str()?);
    let location = object.get("location")?.as_str()?.to_string();

    let query = match object.get("kind")?.as_str()? {
        "location" => {
            let time = object.get("time")?.as_u64()?;
            Query::Location {
                location,
                time: u8::try_from(time).ok()?,
            }
        }
        "actor" => Query::Actor {
            actor: object.get("actor")?.as_str()?.to_string(),
            location,
        },
        _ => return None,
    };
    Some(InvestigateRequest { player, query })
}

pub fn parse_player(value: &Value) -> Option<String> {
    Some(sanitize_name(value.as_object()?.get("player")?.as_str()?))
}

/// Body of a new-game request. An absent body or seed means "any seed".
pub fn parse_new_game_seed(value: &Value) -> Result<Option<u32>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Object(object) => parse_seed_value(object.get("seed")),
        _ => Err("request body must be a JSON object".to_string()),
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryView {
    pub time: String,
    pub player: String,
    pub description: String,
    pub public_text: String,
    /// Only the owner sees the private half; system entries are for all.
    pub private_text: Option<String>,
    pub kind: LogKind,
    pub mine: bool,
}

impl LogEntryView {
    pub fn for_viewer(entry: &LogEntry, viewer: Option<&str>) -> Self {
        let mine = viewer.is_some_and(|viewer| viewer == entry.owner);
        let visible = mine || entry.owner == SYSTEM_OWNER;
        Self {
            time: entry.time.clone(),
            player: entry.player.clone(),
            description: entry.description.clone(),
            public_text: entry.public_text.clone(),
            private_text: visible.then(|| entry.private_text.clone()),
            kind: entry.kind,
            mine,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room: String,
    pub mode: GameMode,
    pub version: u64,
    pub log_revision: u64,
    pub goal: &'static str,
    pub actors: Vec<String>,
    pub locations: Vec<String>,
    pub location_query_times: Vec<u8>,
    pub initial_clues: Vec<InitialClue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paces: Vec<String>,
    pub degraded: bool,
    pub logs: Vec<LogEntryView>,
}

pub fn build_room_view(key: &RoomKey, room: &Room, viewer: Option<&str>) -> RoomView {
    let scenario = room.scenario();
    let config = scenario.config();
    let (first, last) = config.location_query_times();
    RoomView {
        room: key.room.clone(),
        mode: key.mode,
        version: room.version(),
        log_revision: room.log_revision(),
        goal: key.mode.goal(),
        actors: config.actors().to_vec(),
        locations: config.locations().to_vec(),
        location_query_times: (first..=last).collect(),
        initial_clues: scenario.initial_clues().to_vec(),
        paces: if key.mode.is_ritual() {
            scenario.pace_labels()
        } else {
            Vec::new()
        },
        degraded: scenario.is_degraded(),
        logs: room
            .logs()
            .iter()
            .map(|entry| LogEntryView::for_viewer(entry, viewer))
            .collect(),
    }
}

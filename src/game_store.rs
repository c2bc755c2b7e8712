use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Local;

use crate::error::{ConfigError, StoreError};
use crate::scenario::{short_name, Query, Scenario};
use crate::types::{AnswerSheet, GameMode, LogEntry, LogKind, QueryResolution};

pub const SYSTEM_OWNER: &str = "SYSTEM";
const SYSTEM_PLAYER: &str = "系统";
const SYSTEM_TIME: &str = "00:00";
const VISIBLE_TO_ALL: &str = "所有玩家可见";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomKey {
    pub room: String,
    pub mode: GameMode,
}

impl RoomKey {
    pub fn new(room: impl Into<String>, mode: GameMode) -> Self {
        Self {
            room: room.into(),
            mode,
        }
    }
}

/// One table: the live scenario plus its shared action log.
#[derive(Debug)]
pub struct Room {
    scenario: Scenario,
    logs: VecDeque<LogEntry>,
    version: u64,
    log_revision: u64,
}

impl Room {
    fn new(scenario: Scenario, version: u64) -> Self {
        let mut room = Self {
            scenario,
            logs: VecDeque::new(),
            version,
            log_revision: 0,
        };
        room.push_opening_entries();
        room
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Newest entry first.
    pub fn logs(&self) -> &VecDeque<LogEntry> {
        &self.logs
    }

    /// Changes only when the scenario is replaced.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Changes whenever the log does.
    pub fn log_revision(&self) -> u64 {
        self.log_revision
    }

    fn touch_log(&mut self) -> u64 {
        self.log_revision += 1;
        self.log_revision
    }

    fn push_opening_entries(&mut self) {
        let clues = self
            .scenario
            .initial_clues()
            .iter()
            .map(|clue| format!("**{}** 在 {}", short_name(&clue.actor), clue.location))
            .collect::<Vec<_>>()
            .join(" | ");
        self.logs.push_back(system_entry(
            "发布初始信息 (T1)",
            format!("📍 {clues}"),
        ));

        if self.scenario.mode().is_ritual() {
            let paces = self.scenario.pace_labels().join(" , ");
            self.logs
                .push_back(system_entry("发布舞步信息 (Pace)", format!("👣 {paces}")));
        }
    }
}

fn system_entry(description: &str, public_text: String) -> LogEntry {
    LogEntry {
        time: SYSTEM_TIME.to_string(),
        player: SYSTEM_PLAYER.to_string(),
        description: description.to_string(),
        public_text,
        private_text: VISIBLE_TO_ALL.to_string(),
        owner: SYSTEM_OWNER.to_string(),
        kind: LogKind::Warning,
    }
}

pub type RoomHandle = Arc<Mutex<Room>>;

/// Rooms keyed by (room code, mode). Each room has its own lock, so
/// tables never wait on each other once they exist.
#[derive(Debug, Default)]
pub struct GameStore {
    rooms: Mutex<HashMap<RoomKey, RoomHandle>>,
    next_version: AtomicU64,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing room, or generates one. `seed` only matters on
    /// creation; the wall clock is used when it is absent.
    pub fn get_or_create(&self, key: &RoomKey, seed: Option<u32>) -> Result<RoomHandle, ConfigError> {
        let mut rooms = lock(&self.rooms);
        if let Some(handle) = rooms.get(key) {
            return Ok(Arc::clone(handle));
        }
        let room = self.build_room(key, seed)?;
        let handle = Arc::new(Mutex::new(room));
        rooms.insert(key.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Replaces the room's game wholesale: new board, empty log, fresh cache.
    pub fn new_game(&self, key: &RoomKey, seed: Option<u32>) -> Result<RoomHandle, ConfigError> {
        let mut rooms = lock(&self.rooms);
        let room = self.build_room(key, seed)?;
        match rooms.get(key) {
            Some(handle) => {
                *lock(handle) = room;
                Ok(Arc::clone(handle))
            }
            None => {
                let handle = Arc::new(Mutex::new(room));
                rooms.insert(key.clone(), Arc::clone(&handle));
                Ok(handle)
            }
        }
    }

    /// Clears the log back to the opening entries. The scenario, its
    /// remembered answers and its version stay.
    pub fn reset_logs(&self, key: &RoomKey) -> Result<u64, StoreError> {
        let handle = self.room(key)?;
        let mut room = lock(&handle);
        room.logs.clear();
        room.push_opening_entries();
        Ok(room.touch_log())
    }

    pub fn append_log(&self, key: &RoomKey, entry: LogEntry) -> Result<u64, StoreError> {
        let handle = self.room(key)?;
        let mut room = lock(&handle);
        room.logs.push_front(entry);
        Ok(room.touch_log())
    }

    /// Scenario version; 0 when the room does not exist.
    pub fn version(&self, key: &RoomKey) -> u64 {
        match lock(&self.rooms).get(key) {
            Some(handle) => lock(handle).version,
            None => 0,
        }
    }

    /// 0 when the room does not exist.
    pub fn log_revision(&self, key: &RoomKey) -> u64 {
        match lock(&self.rooms).get(key) {
            Some(handle) => lock(handle).log_revision,
            None => 0,
        }
    }

    pub fn investigate(
        &self,
        key: &RoomKey,
        player: &str,
        query: &Query,
    ) -> Result<QueryResolution, StoreError> {
        let handle = self.room(key)?;
        let mut room = lock(&handle);
        let resolution = room.scenario.resolve_query(query)?;
        room.logs.push_front(LogEntry {
            time: clock_label(),
            player: player.to_string(),
            description: resolution.description.clone(),
            public_text: resolution.public_text.clone(),
            private_text: resolution.private_text.clone(),
            owner: player.to_string(),
            kind: LogKind::Normal,
        });
        room.touch_log();
        Ok(resolution)
    }

    /// Hands out the full answer and tells everyone at the table about it.
    pub fn reveal_answer(&self, key: &RoomKey, player: &str) -> Result<AnswerSheet, StoreError> {
        let handle = self.room(key)?;
        let mut room = lock(&handle);
        room.logs.push_front(LogEntry {
            time: clock_label(),
            player: player.to_string(),
            description: "查看了答案！游戏可能已结束。".to_string(),
            public_text: "注意：该玩家已知晓真相".to_string(),
            private_text: "N/A".to_string(),
            owner: player.to_string(),
            kind: LogKind::Warning,
        });
        room.touch_log();
        println!(
            "[game-store] answer revealed room={} mode={} player={player}",
            key.room,
            key.mode.as_str()
        );
        Ok(room.scenario.answer_sheet())
    }

    /// Runs `read` against the room under its lock.
    pub fn snapshot<T>(&self, key: &RoomKey, read: impl FnOnce(&Room) -> T) -> Result<T, StoreError> {
        let handle = self.room(key)?;
        let room = lock(&handle);
        Ok(read(&room))
    }

    pub fn room_count(&self) -> usize {
        lock(&self.rooms).len()
    }

    fn room(&self, key: &RoomKey) -> Result<RoomHandle, StoreError> {
        lock(&self.rooms)
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::RoomNotFound {
                room: key.room.clone(),
                mode: key.mode,
            })
    }

    fn build_room(&self, key: &RoomKey, seed: Option<u32>) -> Result<Room, ConfigError> {
        let seed = seed.unwrap_or_else(clock_seed);
        let scenario = Scenario::for_mode(key.mode, seed)?;
        println!(
            "[game-store] new game room={} mode={} seed={seed} attempts={}",
            key.room,
            key.mode.as_str(),
            scenario.attempts()
        );
        Ok(Room::new(scenario, self.bump_version()))
    }

    fn bump_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn clock_label() -> String {
    Local::now().format("%H:%M").to_string()
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    fn jewel_key() -> RoomKey {
        RoomKey::new("1234", GameMode::Jewel)
    }

    #[test]
    fn opening_log_lists_initial_clues() {
        let store = GameStore::new();
        let handle = store.get_or_create(&jewel_key(), Some(42)).expect("room");
        let room = lock(&handle);
        assert_eq!(room.logs().len(), 1);
        let entry = &room.logs()[0];
        assert_eq!(entry.owner, SYSTEM_OWNER);
        assert_eq!(entry.kind, LogKind::Warning);
        assert_eq!(entry.description, "发布初始信息 (T1)");
        assert!(entry.public_text.starts_with("📍 **("));
        assert_eq!(entry.public_text.matches(" | ").count(), 2);
    }

    #[test]
    fn ritual_rooms_also_announce_paces() {
        let store = GameStore::new();
        let key = RoomKey::new("r1", GameMode::RitualHard);
        let handle = store.get_or_create(&key, Some(9)).expect("room");
        let room = lock(&handle);
        let descriptions: Vec<&str> = room.logs().iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["发布初始信息 (T1)", "发布舞步信息 (Pace)"]);
        assert!(room.logs()[1].public_text.starts_with("👣 ["));
        assert_eq!(room.logs()[0].public_text.matches(" | ").count(), 5);
    }

    #[test]
    fn existing_room_ignores_new_seed() {
        let store = GameStore::new();
        let first = store.get_or_create(&jewel_key(), Some(1)).expect("room");
        let second = store.get_or_create(&jewel_key(), Some(2)).expect("room");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(lock(&second).scenario().seed(), 1);
        assert_eq!(store.room_count(), 1);
    }

    #[test]
    fn modes_get_separate_rooms() {
        let store = GameStore::new();
        store.get_or_create(&jewel_key(), Some(1)).expect("room");
        store
            .get_or_create(&RoomKey::new("1234", GameMode::RitualEasy), Some(1))
            .expect("room");
        assert_eq!(store.room_count(), 2);
    }

    #[test]
    fn version_only_moves_on_new_game() {
        let store = GameStore::new();
        assert_eq!(store.version(&jewel_key()), 0);
        store.get_or_create(&jewel_key(), Some(42)).expect("room");
        let created = store.version(&jewel_key());
        assert!(created > 0);

        let query = Query::Location {
            location: "舞蹈".to_string(),
            time: 3,
        };
        store.investigate(&jewel_key(), "alice", &query).expect("query");
        store.reveal_answer(&jewel_key(), "alice").expect("answer");
        store.reset_logs(&jewel_key()).expect("reset");
        store
            .append_log(&jewel_key(), system_entry("note", "hello".to_string()))
            .expect("append");
        assert_eq!(store.version(&jewel_key()), created);

        store.new_game(&jewel_key(), Some(43)).expect("new game");
        assert!(store.version(&jewel_key()) > created);
    }

    #[test]
    fn log_revision_tracks_log_changes() {
        let store = GameStore::new();
        assert_eq!(store.log_revision(&jewel_key()), 0);
        store.get_or_create(&jewel_key(), Some(42)).expect("room");
        let query = Query::Location {
            location: "舞蹈".to_string(),
            time: 3,
        };
        store.investigate(&jewel_key(), "alice", &query).expect("query");
        assert_eq!(store.log_revision(&jewel_key()), 1);
        store.reveal_answer(&jewel_key(), "alice").expect("answer");
        assert_eq!(store.log_revision(&jewel_key()), 2);
        assert_eq!(store.reset_logs(&jewel_key()).expect("reset"), 3);

        store.new_game(&jewel_key(), Some(43)).expect("new game");
        assert_eq!(store.log_revision(&jewel_key()), 0);
    }

    #[test]
    fn investigation_is_logged_newest_first() {
        let store = GameStore::new();
        store.get_or_create(&jewel_key(), Some(42)).expect("room");
        let query = Query::Actor {
            actor: "(D) Director".to_string(),
            location: "信号".to_string(),
        };
        let resolution = store.investigate(&jewel_key(), "bob", &query).expect("query");
        assert_eq!(resolution.description, "查看了 **(D) Director** 是否去过 **信号**");

        let logs = store
            .snapshot(&jewel_key(), |room| room.logs().clone())
            .expect("room");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].owner, "bob");
        assert_eq!(logs[0].kind, LogKind::Normal);
        assert_eq!(logs[0].private_text, resolution.private_text);
        assert_eq!(logs[1].owner, SYSTEM_OWNER);
    }

    #[test]
    fn reset_keeps_remembered_answers() {
        let store = GameStore::new();
        store.get_or_create(&jewel_key(), Some(42)).expect("room");
        let query = Query::Location {
            location: "舞蹈".to_string(),
            time: 1,
        };
        let before = store.investigate(&jewel_key(), "a", &query).expect("query");
        store.reset_logs(&jewel_key()).expect("reset");
        let logs = store
            .snapshot(&jewel_key(), |room| room.logs().len())
            .expect("room");
        assert_eq!(logs, 1);
        let after = store.investigate(&jewel_key(), "b", &query).expect("query");
        assert_eq!(before.private_text, after.private_text);
    }

    #[test]
    fn new_game_replaces_scenario_in_place() {
        let store = GameStore::new();
        let handle = store.get_or_create(&jewel_key(), Some(42)).expect("room");
        store
            .investigate(
                &jewel_key(),
                "a",
                &Query::Location {
                    location: "牌坊".to_string(),
                    time: 2,
                },
            )
            .expect("query");
        store.new_game(&jewel_key(), Some(7)).expect("new game");
        let room = lock(&handle);
        assert_eq!(room.scenario().seed(), 7);
        assert!(room.scenario().query_cache().is_empty());
        assert_eq!(room.logs().len(), 1);
    }

    #[test]
    fn missing_rooms_are_reported() {
        let store = GameStore::new();
        let query = Query::Location {
            location: "舞蹈".to_string(),
            time: 1,
        };
        assert_eq!(
            store.investigate(&jewel_key(), "a", &query),
            Err(StoreError::RoomNotFound {
                room: "1234".to_string(),
                mode: GameMode::Jewel
            })
        );
        assert!(store.reset_logs(&jewel_key()).is_err());
        assert!(store.reveal_answer(&jewel_key(), "a").is_err());
    }

    #[test]
    fn bad_queries_leave_the_log_alone() {
        let store = GameStore::new();
        store.get_or_create(&jewel_key(), Some(42)).expect("room");
        let revision = store.log_revision(&jewel_key());
        let err = store
            .investigate(
                &jewel_key(),
                "a",
                &Query::Location {
                    location: "月亮".to_string(),
                    time: 1,
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Query(QueryError::UnknownLocation("月亮".to_string()))
        );
        assert_eq!(store.log_revision(&jewel_key()), revision);
    }

    #[test]
    fn reveal_logs_a_warning_for_everyone() {
        let store = GameStore::new();
        store.get_or_create(&jewel_key(), Some(42)).expect("room");
        let sheet = store.reveal_answer(&jewel_key(), "carol").expect("answer");
        assert_eq!(sheet.seed, 42);
        assert_eq!(
            sheet.final_answer,
            "珠宝在 **(A) Accessoiriste** 手中，位于 **音乐**"
        );
        let top = store
            .snapshot(&jewel_key(), |room| room.logs()[0].clone())
            .expect("room");
        assert_eq!(top.kind, LogKind::Warning);
        assert_eq!(top.owner, "carol");
        assert_eq!(top.public_text, "注意：该玩家已知晓真相");
    }

    #[test]
    fn append_log_goes_to_the_top() {
        let store = GameStore::new();
        store.get_or_create(&jewel_key(), Some(42)).expect("room");
        let entry = LogEntry {
            time: "12:00".to_string(),
            player: "dave".to_string(),
            description: "note".to_string(),
            public_text: "hello".to_string(),
            private_text: "secret".to_string(),
            owner: "dave".to_string(),
            kind: LogKind::Normal,
        };
        store.append_log(&jewel_key(), entry.clone()).expect("append");
        let top = store
            .snapshot(&jewel_key(), |room| room.logs()[0].clone())
            .expect("room");
        assert_eq!(top, entry);
    }
}

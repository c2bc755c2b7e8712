use crate::types::GameMode;

pub const TIME_STEPS: usize = 6;
pub const TIMES: [u8; TIME_STEPS] = [1, 2, 3, 4, 5, 6];

pub const MAX_GENERATION_ATTEMPTS: usize = 1_000;

pub const ROOMS: [&str; 6] = ["牌坊", "信号", "鱿鱼", "面具", "音乐", "舞蹈"];
pub const TERRAIN_LOOP: [&str; 6] = ["山", "太阳", "星星", "台阶", "圆盘", "田"];

pub const CHARACTERS: [&str; 6] = [
    "(A) Accessoiriste",
    "(B) Baroness",
    "(C) Chauffeur",
    "(D) Director",
    "(J) Journalist",
    "(S) Soprano",
];

pub const SHAMANS: [&str; 6] = [
    "(A) Artisan",
    "(E) Educator",
    "(F) Farmer",
    "(M) Merchant",
    "(P) Priestess",
    "(S) Soldier",
];

pub const MAP_GRAPH: [(&str, &[&str]); 6] = [
    ("牌坊", &["信号", "鱿鱼"]),
    ("信号", &["鱿鱼", "牌坊"]),
    ("鱿鱼", &["面具", "信号", "牌坊"]),
    ("面具", &["鱿鱼", "音乐", "舞蹈"]),
    ("音乐", &["面具", "舞蹈"]),
    ("舞蹈", &["面具", "音乐"]),
];

pub const JEWEL_SPAWN_ROOM: &str = "舞蹈";
pub const JEWEL_LATEST_FIND: u8 = 3;
pub const JEWEL_INITIAL_CLUES: usize = 3;

pub const PACE_TIERS: [&[&[u8]]; 3] = [
    &[
        &[1, 1, 1],
        &[1, 1, 2],
        &[1, 1, 3],
        &[2, 2, 2],
        &[1, 2, 3],
        &[1, 3, 3],
        &[1, 2, 2],
        &[2, 2, 3],
        &[2, 3, 3],
        &[3, 3, 3],
    ],
    &[
        &[1, 1, 1, 2],
        &[1, 1, 1, 3],
        &[1, 1, 2, 3],
        &[1, 1, 3, 3],
        &[1, 1, 2, 2],
    ],
    &[
        &[1, 2, 2, 2],
        &[1, 2, 2, 3],
        &[1, 2, 3, 3],
        &[1, 3, 3, 3],
        &[2, 2, 2, 3],
        &[2, 2, 3, 3],
        &[2, 3, 3, 3],
    ],
];

/// Jewel mode walks the room graph and has no paces.
pub fn get_pace_tier_weights(mode: GameMode) -> Option<[u32; 3]> {
    match mode {
        GameMode::Jewel => None,
        GameMode::RitualEasy => Some([100, 0, 0]),
        GameMode::RitualHard => Some([66, 20, 14]),
    }
}

/// Location queries in ritual modes skip T1 (public) and T6 (the answer).
pub fn get_location_query_times(mode: GameMode) -> (u8, u8) {
    match mode {
        GameMode::Jewel => (1, 6),
        GameMode::RitualEasy | GameMode::RitualHard => (2, 5),
    }
}

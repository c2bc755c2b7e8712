use std::collections::HashMap;

use crate::board::Board;
use crate::rng::Rng;
use crate::solution::Solution;
use crate::types::{InitialClue, QueryResolution};

pub const EMPTY_ROOM_TEXT: &str = "你看到：**空无一人**，可再进行一次调查";
pub const NEVER_VISITED_TEXT: &str = "线索：**从未去过**，可再进行一次调查";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitialClueRule {
    /// Reveal `count` random actors, never the one who found the jewel at T1.
    Sample { count: usize },
    Everyone,
}

pub fn initial_clues(
    board: &Board,
    rule: InitialClueRule,
    solution: &Solution,
    rng: &mut Rng,
) -> Vec<InitialClue> {
    let actors: Vec<usize> = match rule {
        InitialClueRule::Sample { count } => {
            let excluded = solution.first_step_finder();
            let candidates: Vec<usize> = (0..board.actors().len())
                .filter(|actor| Some(*actor) != excluded)
                .collect();
            rng.sample(&candidates, count)
        }
        InitialClueRule::Everyone => (0..board.actors().len()).collect(),
    };
    actors
        .into_iter()
        .map(|actor| InitialClue {
            actor: board.actor_name(actor).to_string(),
            location: board.location_name(board.location_at(actor, 1)).to_string(),
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Location { location: usize, time: u8 },
    Actor { actor: usize, location: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedClue {
    pub text: String,
    pub known: bool,
}

/// First answer per key, kept for the scenario's whole life.
#[derive(Clone, Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CachedClue>,
}

impl QueryCache {
    pub fn get(&self, key: &QueryKey) -> Option<&CachedClue> {
        self.entries.get(key)
    }

    /// Stores `clue` unless the key is already answered; returns the kept one.
    pub fn remember(&mut self, key: QueryKey, clue: CachedClue) -> &CachedClue {
        self.entries.entry(key).or_insert(clue)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Candidate classes. Higher classes are revealed first, so a query gives
/// away a pinpointing fact only when nothing vaguer answers it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Score {
    AlreadyKnown = 0,
    Pinpointing = 1,
    Ambiguous = 2,
}

/// Uniform shuffle, then stable sort by score descending: ties are broken at
/// random while the score order stays fixed.
pub fn rank_candidates<T>(mut candidates: Vec<(T, Score)>, rng: &mut Rng) -> Vec<(T, Score)> {
    rng.shuffle(&mut candidates);
    candidates.sort_by(|a, b| b.1.cmp(&a.1));
    candidates
}

fn is_initial_clue(
    board: &Board,
    initial_clues: &[InitialClue],
    actor: usize,
    location: usize,
) -> bool {
    initial_clues.iter().any(|clue| {
        clue.actor == board.actor_name(actor) && clue.location == board.location_name(location)
    })
}

pub fn resolve_query(
    board: &Board,
    initial_clues: &[InitialClue],
    cache: &mut QueryCache,
    rng: &mut Rng,
    key: QueryKey,
) -> QueryResolution {
    match key {
        QueryKey::Location { location, time } => {
            resolve_location(board, initial_clues, cache, rng, key, location, time)
        }
        QueryKey::Actor { actor, location } => {
            resolve_actor(board, initial_clues, cache, rng, key, actor, location)
        }
    }
}

fn resolve_location(
    board: &Board,
    initial_clues: &[InitialClue],
    cache: &mut QueryCache,
    rng: &mut Rng,
    key: QueryKey,
    location: usize,
    time: u8,
) -> QueryResolution {
    let occupants = board.occupants(location, time);
    let description = format!(
        "查看了 **{}** @ **T{}**",
        board.location_name(location),
        time
    );
    let public_text = format!("该房间共有 **{} 人**。", occupants.len());

    let clue = if let Some(cached) = cache.get(&key) {
        cached.clone()
    } else if occupants.is_empty() {
        CachedClue {
            text: EMPTY_ROOM_TEXT.to_string(),
            known: false,
        }
    } else {
        let scored = occupants
            .iter()
            .map(|actor| {
                let score = if time == 1 && is_initial_clue(board, initial_clues, *actor, location)
                {
                    Score::AlreadyKnown
                } else if board.visits(*actor, location).len() == 1 {
                    Score::Pinpointing
                } else {
                    Score::Ambiguous
                };
                (*actor, score)
            })
            .collect();
        let ranked = rank_candidates(scored, rng);
        let (best, best_score) = ranked[0];
        let fresh = if best_score == Score::AlreadyKnown {
            let names: Vec<&str> = ranked
                .iter()
                .map(|(actor, _)| board.actor_name(*actor))
                .collect();
            CachedClue {
                text: format!(
                    "⚠️ **已知信息**：初始线索已告知 **{}** 在 **T1** 位于此处, 可再调查一次。",
                    names.join("、")
                ),
                known: true,
            }
        } else if occupants.len() == 1 {
            CachedClue {
                text: format!("你看到了 **{}** 独处一室", board.actor_name(best)),
                known: false,
            }
        } else {
            CachedClue {
                text: format!("透过缝隙认出了其中的 **{}**", board.actor_name(best)),
                known: false,
            }
        };
        cache.remember(key, fresh).clone()
    };

    QueryResolution {
        description,
        public_text,
        private_text: clue.text,
        known: clue.known,
    }
}

fn resolve_actor(
    board: &Board,
    initial_clues: &[InitialClue],
    cache: &mut QueryCache,
    rng: &mut Rng,
    key: QueryKey,
    actor: usize,
    location: usize,
) -> QueryResolution {
    let visits = board.visits(actor, location);
    let actor_name = board.actor_name(actor);
    let location_name = board.location_name(location);
    let description = format!("查看了 **{actor_name}** 是否去过 **{location_name}**");
    let public_text = format!("去过此处 **{} 次**。", visits.len());

    let clue = if let Some(cached) = cache.get(&key) {
        cached.clone()
    } else if visits.is_empty() {
        CachedClue {
            text: NEVER_VISITED_TEXT.to_string(),
            known: false,
        }
    } else {
        let scored = visits
            .iter()
            .map(|time| {
                let score = if *time == 1 && is_initial_clue(board, initial_clues, actor, location)
                {
                    Score::AlreadyKnown
                } else if board.occupants(location, *time).len() == 1 {
                    Score::Pinpointing
                } else {
                    Score::Ambiguous
                };
                (*time, score)
            })
            .collect();
        let ranked = rank_candidates(scored, rng);
        let (best, best_score) = ranked[0];
        let fresh = if best_score == Score::AlreadyKnown {
            CachedClue {
                text: format!(
                    "⚠️ **已知信息**：初始线索已告知 **{actor_name}** 在 **T1** 位于 **{location_name}**, 可再调查一次。"
                ),
                known: true,
            }
        } else if visits.len() == 1 {
            CachedClue {
                text: format!("发现时间：**T{best}**"),
                known: false,
            }
        } else {
            CachedClue {
                text: format!("发现其中一次是在 **T{best}**"),
                known: false,
            }
        };
        cache.remember(key, fresh).clone()
    };

    QueryResolution {
        description,
        public_text,
        private_text: clue.text,
        known: clue.known,
    }
}

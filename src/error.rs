use thiserror::Error;

use crate::types::GameMode;

/// Rejected scenario configuration. Raised at construction, never mid-game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("scenario needs at least one actor")]
    NoActors,
    #[error("duplicate actor name {0}")]
    DuplicateActor(String),
    #[error("movement model has no locations")]
    NoLocations,
    #[error("duplicate location name {0}")]
    DuplicateLocation(String),
    #[error("location {0} has no outgoing moves")]
    DeadEnd(String),
    #[error("adjacency refers to unknown location {0}")]
    UnknownLocation(String),
    #[error("pace tier {tier} contains an empty pattern")]
    EmptyPattern { tier: usize },
    #[error("pace pattern {pattern:?} appears more than once")]
    DuplicatePattern { pattern: Vec<u8> },
    #[error("every pace tier has zero weight")]
    NoWeightedTier,
    #[error("{actors} actors need unique paces but only {available} weighted patterns exist")]
    NotEnoughPatterns { actors: usize, available: usize },
    #[error("spawn location {0} is not part of the map")]
    UnknownSpawn(String),
    #[error("{actors} actors cannot supply {clues} initial clues")]
    NotEnoughActorsForClues { actors: usize, clues: usize },
    #[error("time window T{first}..T{last} is outside T1..T6")]
    InvalidTimeWindow { first: u8, last: u8 },
    #[error("board has {rows} rows for {actors} actors")]
    RowCountMismatch { rows: usize, actors: usize },
    #[error("board row for {actor} points at location index {index}")]
    InvalidCell { actor: String, index: usize },
    #[error("mode {mode:?} needs a {expected} movement model")]
    ModelMismatch {
        mode: GameMode,
        expected: &'static str,
    },
}

/// Investigation that does not fit the active scenario's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown actor {0}")]
    UnknownActor(String),
    #[error("unknown location {0}")]
    UnknownLocation(String),
    #[error("time T{time} cannot be investigated here (allowed T{first}..T{last})")]
    TimeNotQueryable { time: u8, first: u8, last: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("room {room} has no {mode:?} game")]
    RoomNotFound { room: String, mode: GameMode },
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

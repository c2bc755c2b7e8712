pub mod board;
pub mod clues;
pub mod constants;
pub mod error;
pub mod game_store;
pub mod movement;
pub mod rng;
pub mod scenario;
pub mod server_protocol;
pub mod server_utils;
pub mod solution;
pub mod types;

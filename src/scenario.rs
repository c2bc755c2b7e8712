use std::collections::HashSet;

use crate::board::{generate_board, Board};
use crate::clues::{initial_clues, resolve_query, InitialClueRule, QueryCache, QueryKey};
use crate::constants::{
    get_location_query_times, get_pace_tier_weights, CHARACTERS, JEWEL_INITIAL_CLUES,
    JEWEL_LATEST_FIND, JEWEL_SPAWN_ROOM, MAP_GRAPH, MAX_GENERATION_ATTEMPTS, PACE_TIERS, SHAMANS,
    TERRAIN_LOOP, TIME_STEPS,
};
use crate::error::{ConfigError, QueryError};
use crate::movement::{CyclicOffset, GraphWalk, MovementModel, Pace, PaceTier};
use crate::rng::Rng;
use crate::solution::{derive_jewel, draw_truth, Solution};
use crate::types::{AnswerSheet, GameMode, InitialClue, PaceRow, QueryResolution};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolutionRule {
    /// Possession trace; boards where the jewel shows up after
    /// `latest_find` are regenerated.
    Jewel { spawn: String, latest_find: u8 },
    UniformTruth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deriver {
    Jewel { spawn: usize, latest_find: u8 },
    UniformTruth,
}

/// Everything a mode needs to build scenarios. Validated once, up front.
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    mode: GameMode,
    actors: Vec<String>,
    movement: MovementModel,
    deriver: Deriver,
    clue_rule: InitialClueRule,
    location_query_times: (u8, u8),
}

impl ScenarioConfig {
    pub fn new(
        mode: GameMode,
        actors: &[&str],
        movement: MovementModel,
        rule: SolutionRule,
    ) -> Result<Self, ConfigError> {
        if actors.is_empty() {
            return Err(ConfigError::NoActors);
        }
        let mut seen = HashSet::new();
        for actor in actors {
            if !seen.insert(*actor) {
                return Err(ConfigError::DuplicateActor(actor.to_string()));
            }
        }

        match (&movement, mode.is_ritual()) {
            (MovementModel::GraphWalk(_), true) => {
                return Err(ConfigError::ModelMismatch {
                    mode,
                    expected: "cyclic offset",
                })
            }
            (MovementModel::CyclicOffset(_), false) => {
                return Err(ConfigError::ModelMismatch {
                    mode,
                    expected: "graph walk",
                })
            }
            (MovementModel::CyclicOffset(ring), true) => {
                let available = ring.available_patterns();
                if actors.len() > available {
                    return Err(ConfigError::NotEnoughPatterns {
                        actors: actors.len(),
                        available,
                    });
                }
            }
            (MovementModel::GraphWalk(_), false) => {}
        }

        let (deriver, clue_rule) = match rule {
            SolutionRule::Jewel { spawn, latest_find } => {
                let spawn_idx = movement
                    .locations()
                    .iter()
                    .position(|location| *location == spawn)
                    .ok_or(ConfigError::UnknownSpawn(spawn))?;
                // The T1 finder may be excluded from the draw.
                if actors.len() <= JEWEL_INITIAL_CLUES {
                    return Err(ConfigError::NotEnoughActorsForClues {
                        actors: actors.len(),
                        clues: JEWEL_INITIAL_CLUES,
                    });
                }
                (
                    Deriver::Jewel {
                        spawn: spawn_idx,
                        latest_find,
                    },
                    InitialClueRule::Sample {
                        count: JEWEL_INITIAL_CLUES,
                    },
                )
            }
            SolutionRule::UniformTruth => (Deriver::UniformTruth, InitialClueRule::Everyone),
        };

        let config = Self {
            mode,
            actors: actors.iter().map(|actor| actor.to_string()).collect(),
            movement,
            deriver,
            clue_rule,
            location_query_times: (1, TIME_STEPS as u8),
        };
        let (first, last) = get_location_query_times(mode);
        config.with_location_query_times(first, last)
    }

    pub fn with_location_query_times(mut self, first: u8, last: u8) -> Result<Self, ConfigError> {
        if first == 0 || first > last || last as usize > TIME_STEPS {
            return Err(ConfigError::InvalidTimeWindow { first, last });
        }
        self.location_query_times = (first, last);
        Ok(self)
    }

    pub fn for_mode(mode: GameMode) -> Result<Self, ConfigError> {
        match mode {
            GameMode::Jewel => Self::new(
                mode,
                &CHARACTERS,
                MovementModel::GraphWalk(GraphWalk::new(&MAP_GRAPH)?),
                SolutionRule::Jewel {
                    spawn: JEWEL_SPAWN_ROOM.to_string(),
                    latest_find: JEWEL_LATEST_FIND,
                },
            ),
            GameMode::RitualEasy | GameMode::RitualHard => {
                let tiers = get_pace_tier_weights(mode)
                    .ok_or(ConfigError::NoWeightedTier)?
                    .iter()
                    .zip(PACE_TIERS.iter())
                    .map(|(weight, patterns)| PaceTier::new(*weight, patterns))
                    .collect();
                Self::new(
                    mode,
                    &SHAMANS,
                    MovementModel::CyclicOffset(CyclicOffset::new(&TERRAIN_LOOP, tiers)?),
                    SolutionRule::UniformTruth,
                )
            }
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn actors(&self) -> &[String] {
        &self.actors
    }

    pub fn locations(&self) -> &[String] {
        self.movement.locations()
    }

    pub fn location_query_times(&self) -> (u8, u8) {
        self.location_query_times
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    Location { location: String, time: u8 },
    Actor { actor: String, location: String },
}

/// One generated puzzle plus the memo of every answer handed out so far.
#[derive(Clone, Debug)]
pub struct Scenario {
    config: ScenarioConfig,
    seed: u32,
    attempts: usize,
    board: Board,
    paces: Vec<Pace>,
    solution: Solution,
    initial_clues: Vec<InitialClue>,
    query_cache: QueryCache,
    rng: Rng,
}

impl Scenario {
    pub fn generate(config: ScenarioConfig, seed: u32) -> Result<Self, ConfigError> {
        let mut rng = Rng::new(seed);
        let mut attempts = 0;

        let (generated, solution) = loop {
            attempts += 1;
            let generated = generate_board(&config.actors, &config.movement, &mut rng)?;
            let solution = match config.deriver {
                Deriver::Jewel { spawn, latest_find } => {
                    Solution::Jewel(derive_jewel(&generated.board, spawn, latest_find))
                }
                Deriver::UniformTruth => Solution::Ritual(
                    draw_truth(&generated.board, &mut rng).ok_or(ConfigError::NoActors)?,
                ),
            };
            if solution.is_valid() || attempts >= MAX_GENERATION_ATTEMPTS {
                break (generated, solution);
            }
        };

        // Exhaustion keeps the last board; `is_degraded` reports it.
        if !solution.is_valid() {
            eprintln!(
                "[scenario] mode={} seed={seed} produced no valid board in {attempts} attempts; keeping the last one",
                config.mode.as_str()
            );
        }

        let initial_clues = initial_clues(&generated.board, config.clue_rule, &solution, &mut rng);
        Ok(Self {
            config,
            seed,
            attempts,
            board: generated.board,
            paces: generated.paces,
            solution,
            initial_clues,
            query_cache: QueryCache::default(),
            rng,
        })
    }

    pub fn for_mode(mode: GameMode, seed: u32) -> Result<Self, ConfigError> {
        Self::generate(ScenarioConfig::for_mode(mode)?, seed)
    }

    pub fn mode(&self) -> GameMode {
        self.config.mode
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn paces(&self) -> &[Pace] {
        &self.paces
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn initial_clues(&self) -> &[InitialClue] {
        &self.initial_clues
    }

    pub fn query_cache(&self) -> &QueryCache {
        &self.query_cache
    }

    /// True when the retry loop gave up and the puzzle may be unsolvable.
    pub fn is_degraded(&self) -> bool {
        !self.solution.is_valid()
    }

    /// Public pace announcement: every assigned pattern, shortest first.
    pub fn pace_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.paces.iter().map(Pace::label).collect();
        labels.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        labels
    }

    pub fn query_key(&self, query: &Query) -> Result<QueryKey, QueryError> {
        match query {
            Query::Location { location, time } => {
                let location = self.location_index(location)?;
                let (first, last) = self.config.location_query_times;
                if *time < first || *time > last {
                    return Err(QueryError::TimeNotQueryable {
                        time: *time,
                        first,
                        last,
                    });
                }
                Ok(QueryKey::Location {
                    location,
                    time: *time,
                })
            }
            Query::Actor { actor, location } => {
                let actor_idx = self
                    .board
                    .actor_index(actor)
                    .ok_or_else(|| QueryError::UnknownActor(actor.clone()))?;
                Ok(QueryKey::Actor {
                    actor: actor_idx,
                    location: self.location_index(location)?,
                })
            }
        }
    }

    fn location_index(&self, name: &str) -> Result<usize, QueryError> {
        self.board
            .location_index(name)
            .ok_or_else(|| QueryError::UnknownLocation(name.to_string()))
    }

    pub fn resolve_query(&mut self, query: &Query) -> Result<QueryResolution, QueryError> {
        let key = self.query_key(query)?;
        Ok(resolve_query(
            &self.board,
            &self.initial_clues,
            &mut self.query_cache,
            &mut self.rng,
            key,
        ))
    }

    pub fn answer_sheet(&self) -> AnswerSheet {
        let mut sheet = AnswerSheet {
            mode: self.config.mode,
            seed: self.seed,
            final_answer: String::new(),
            board: self.board.rows(),
            jewel_trace: Vec::new(),
            truth: None,
            paces: Vec::new(),
        };

        match &self.solution {
            Solution::Jewel(trace) => {
                if let Some(last) = trace.final_record() {
                    sheet.final_answer = format!(
                        "珠宝在 **{}** 手中，位于 **{}**",
                        last.holder_label(),
                        last.location
                    );
                }
                sheet.jewel_trace = trace.records.clone();
            }
            Solution::Ritual(truth) => {
                let last_time = TIME_STEPS as u8;
                let mut finals: Vec<(&str, &str)> = (0..self.board.actors().len())
                    .map(|actor| {
                        (
                            self.board.actor_name(actor),
                            self.board
                                .location_name(self.board.location_at(actor, last_time)),
                        )
                    })
                    .collect();
                finals.sort();
                sheet.final_answer = finals
                    .iter()
                    .map(|(actor, location)| format!("**{}**: {location}", short_name(actor)))
                    .collect::<Vec<_>>()
                    .join(" | ");
                sheet.truth = Some(truth.clone());

                let mut rows: Vec<PaceRow> = self
                    .paces
                    .iter()
                    .enumerate()
                    .map(|(actor, pace)| PaceRow {
                        actor: self.board.actor_name(actor).to_string(),
                        start_location: self.board.location_name(pace.start_location).to_string(),
                        pattern: pace.pattern.clone(),
                        start_offset: pace.start_offset,
                        executed: pace.executed(),
                    })
                    .collect();
                rows.sort_by(|a, b| {
                    a.executed
                        .len()
                        .cmp(&b.executed.len())
                        .then_with(|| a.executed.cmp(&b.executed))
                });
                sheet.paces = rows;
            }
        }
        sheet
    }
}

/// "(A) Artisan" -> "(A)".
pub fn short_name(actor: &str) -> String {
    match actor.split_once(')') {
        Some((head, _)) => format!("{head})"),
        None => actor.to_string(),
    }
}

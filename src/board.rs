use crate::constants::{TIMES, TIME_STEPS};
use crate::error::ConfigError;
use crate::movement::{MovementModel, Pace};
use crate::rng::Rng;
use crate::types::BoardRow;

/// Actor x time step -> location. Times are 1-based (`1..=TIME_STEPS`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    actors: Vec<String>,
    locations: Vec<String>,
    cells: Vec<[usize; TIME_STEPS]>,
}

impl Board {
    pub fn from_rows(
        actors: Vec<String>,
        locations: Vec<String>,
        cells: Vec<[usize; TIME_STEPS]>,
    ) -> Result<Self, ConfigError> {
        if cells.len() != actors.len() {
            return Err(ConfigError::RowCountMismatch {
                rows: cells.len(),
                actors: actors.len(),
            });
        }
        for (actor, row) in actors.iter().zip(&cells) {
            if let Some(bad) = row.iter().find(|idx| **idx >= locations.len()) {
                return Err(ConfigError::InvalidCell {
                    actor: actor.clone(),
                    index: *bad,
                });
            }
        }
        Ok(Self {
            actors,
            locations,
            cells,
        })
    }

    pub fn actors(&self) -> &[String] {
        &self.actors
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn actor_index(&self, name: &str) -> Option<usize> {
        self.actors.iter().position(|actor| actor == name)
    }

    pub fn location_index(&self, name: &str) -> Option<usize> {
        self.locations.iter().position(|location| location == name)
    }

    pub fn actor_name(&self, actor: usize) -> &str {
        &self.actors[actor]
    }

    pub fn location_name(&self, location: usize) -> &str {
        &self.locations[location]
    }

    pub fn location_at(&self, actor: usize, time: u8) -> usize {
        self.cells[actor][column(time)]
    }

    /// Actors at `location` during `time`, in actor order.
    pub fn occupants(&self, location: usize, time: u8) -> Vec<usize> {
        let col = column(time);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, row)| row[col] == location)
            .map(|(actor, _)| actor)
            .collect()
    }

    /// Time steps at which `actor` stands on `location`, ascending.
    pub fn visits(&self, actor: usize, location: usize) -> Vec<u8> {
        TIMES
            .iter()
            .copied()
            .filter(|time| self.location_at(actor, *time) == location)
            .collect()
    }

    pub fn rows(&self) -> Vec<BoardRow> {
        self.cells
            .iter()
            .enumerate()
            .map(|(actor, row)| BoardRow {
                actor: self.actors[actor].clone(),
                locations: row
                    .iter()
                    .map(|idx| self.locations[*idx].clone())
                    .collect(),
            })
            .collect()
    }
}

fn column(time: u8) -> usize {
    debug_assert!((1..=TIME_STEPS as u8).contains(&time));
    time as usize - 1
}

#[derive(Clone, Debug)]
pub struct GeneratedBoard {
    pub board: Board,
    /// One entry per actor for the cyclic model, empty for graph walks.
    pub paces: Vec<Pace>,
}

pub fn generate_board(
    actors: &[String],
    model: &MovementModel,
    rng: &mut Rng,
) -> Result<GeneratedBoard, ConfigError> {
    let mut cells = Vec::with_capacity(actors.len());
    let mut paces: Vec<Pace> = Vec::new();

    match model {
        MovementModel::GraphWalk(walk) => {
            for _ in actors {
                let mut row = [0usize; TIME_STEPS];
                let mut current = walk.start(rng);
                row[0] = current;
                for cell in row.iter_mut().skip(1) {
                    current = walk.step(current, rng);
                    *cell = current;
                }
                cells.push(row);
            }
        }
        MovementModel::CyclicOffset(ring) => {
            let mut taken: Vec<Vec<u8>> = Vec::with_capacity(actors.len());
            for _ in actors {
                let start_location = ring.start(rng);
                let pattern =
                    ring.draw_pattern(&taken, rng)
                        .ok_or(ConfigError::NotEnoughPatterns {
                            actors: actors.len(),
                            available: ring.available_patterns(),
                        })?;
                let start_offset = rng.pick_index(pattern.len());
                taken.push(pattern.clone());
                let pace = Pace {
                    pattern,
                    start_offset,
                    start_location,
                };

                let mut row = [0usize; TIME_STEPS];
                let mut current = start_location;
                row[0] = current;
                for (i, cell) in row.iter_mut().enumerate().skip(1) {
                    current = ring.advance(current, pace.step(i - 1));
                    *cell = current;
                }
                cells.push(row);
                paces.push(pace);
            }
        }
    }

    let board = Board::from_rows(actors.to_vec(), model.locations().to_vec(), cells)?;
    Ok(GeneratedBoard { board, paces })
}

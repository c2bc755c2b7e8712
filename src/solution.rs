use crate::board::Board;
use crate::constants::TIMES;
use crate::rng::Rng;
use crate::types::{JewelEvent, JewelRecord, Truth};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HolderState {
    Dormant,
    Held(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JewelTrace {
    pub records: Vec<JewelRecord>,
    /// Actor index and time step of the first pickup.
    pub found: Option<(usize, u8)>,
    pub valid: bool,
}

impl JewelTrace {
    pub fn final_record(&self) -> Option<&JewelRecord> {
        self.records.last()
    }
}

/// Replays jewel possession over the whole board. The jewel appears when
/// exactly one actor stands on `spawn`; afterwards it changes hands whenever
/// its holder shares a location with exactly one other actor.
pub fn derive_jewel(board: &Board, spawn: usize, latest_find: u8) -> JewelTrace {
    let mut state = HolderState::Dormant;
    let mut found = None;
    let mut records = Vec::with_capacity(TIMES.len());

    for time in TIMES {
        match state {
            HolderState::Dormant => {
                let in_spawn = board.occupants(spawn, time);
                if let [finder] = in_spawn.as_slice() {
                    state = HolderState::Held(*finder);
                    found = Some((*finder, time));
                    records.push(JewelRecord {
                        time,
                        holder: Some(board.actor_name(*finder).to_string()),
                        location: board.location_name(spawn).to_string(),
                        event: JewelEvent::Found,
                    });
                } else {
                    records.push(JewelRecord {
                        time,
                        holder: None,
                        location: board.location_name(spawn).to_string(),
                        event: JewelEvent::NotFound,
                    });
                }
            }
            HolderState::Held(holder) => {
                let location = board.location_at(holder, time);
                let present = board.occupants(location, time);
                let (next, event) = match present.as_slice() {
                    [_] => (holder, JewelEvent::Solo),
                    [a, b] => {
                        let other = if *a == holder { *b } else { *a };
                        (
                            other,
                            JewelEvent::Swap {
                                to: board.actor_name(other).to_string(),
                            },
                        )
                    }
                    _ => (holder, JewelEvent::Crowded),
                };
                records.push(JewelRecord {
                    time,
                    holder: Some(board.actor_name(next).to_string()),
                    location: board.location_name(location).to_string(),
                    event,
                });
                state = HolderState::Held(next);
            }
        }
    }

    let valid = found.is_some_and(|(_, time)| time <= latest_find);
    JewelTrace {
        records,
        found,
        valid,
    }
}

/// Uniform pick among every occupied (time, location, actor) triple,
/// enumerated by time, then location, then actor.
pub fn draw_truth(board: &Board, rng: &mut Rng) -> Option<Truth> {
    let mut options = Vec::new();
    for time in TIMES {
        for location in 0..board.locations().len() {
            for actor in board.occupants(location, time) {
                options.push((time, location, actor));
            }
        }
    }
    if options.is_empty() {
        return None;
    }
    let (time, location, actor) = options[rng.pick_index(options.len())];
    Some(Truth {
        time,
        location: board.location_name(location).to_string(),
        actor: board.actor_name(actor).to_string(),
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Solution {
    Jewel(JewelTrace),
    Ritual(Truth),
}

impl Solution {
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Jewel(trace) => trace.valid,
            Self::Ritual(_) => true,
        }
    }

    /// Actor who picked the jewel up at T1, if any.
    pub fn first_step_finder(&self) -> Option<usize> {
        match self {
            Self::Jewel(JewelTrace {
                found: Some((actor, 1)),
                ..
            }) => Some(*actor),
            _ => None,
        }
    }
}

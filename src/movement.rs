use std::collections::HashSet;

use crate::error::ConfigError;
use crate::rng::Rng;

/// How actors travel between locations from one time step to the next.
#[derive(Clone, Debug)]
pub enum MovementModel {
    GraphWalk(GraphWalk),
    CyclicOffset(CyclicOffset),
}

impl MovementModel {
    pub fn locations(&self) -> &[String] {
        match self {
            Self::GraphWalk(walk) => &walk.locations,
            Self::CyclicOffset(ring) => &ring.ring,
        }
    }
}

/// Uniform random neighbour walk over a directed adjacency table.
#[derive(Clone, Debug)]
pub struct GraphWalk {
    locations: Vec<String>,
    adjacency: Vec<Vec<usize>>,
}

impl GraphWalk {
    /// `graph` lists every location once, in the order used for uniform
    /// start draws, together with the locations reachable from it.
    pub fn new(graph: &[(&str, &[&str])]) -> Result<Self, ConfigError> {
        if graph.is_empty() {
            return Err(ConfigError::NoLocations);
        }
        let locations: Vec<String> = graph.iter().map(|(name, _)| name.to_string()).collect();
        ensure_unique_locations(&locations)?;

        let mut adjacency = Vec::with_capacity(graph.len());
        for (name, moves) in graph {
            if moves.is_empty() {
                return Err(ConfigError::DeadEnd(name.to_string()));
            }
            let mut targets = Vec::with_capacity(moves.len());
            for target in moves.iter() {
                let idx = locations
                    .iter()
                    .position(|location| location == target)
                    .ok_or_else(|| ConfigError::UnknownLocation(target.to_string()))?;
                targets.push(idx);
            }
            adjacency.push(targets);
        }
        Ok(Self {
            locations,
            adjacency,
        })
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn neighbours(&self, location: usize) -> &[usize] {
        &self.adjacency[location]
    }

    pub(crate) fn start(&self, rng: &mut Rng) -> usize {
        rng.pick_index(self.locations.len())
    }

    pub(crate) fn step(&self, current: usize, rng: &mut Rng) -> usize {
        let moves = &self.adjacency[current];
        moves[rng.pick_index(moves.len())]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaceTier {
    pub weight: u32,
    pub patterns: Vec<Vec<u8>>,
}

impl PaceTier {
    pub fn new(weight: u32, patterns: &[&[u8]]) -> Self {
        Self {
            weight,
            patterns: patterns.iter().map(|pattern| pattern.to_vec()).collect(),
        }
    }
}

/// Ring of locations walked with a repeating step pattern per actor.
#[derive(Clone, Debug)]
pub struct CyclicOffset {
    ring: Vec<String>,
    tiers: Vec<PaceTier>,
}

impl CyclicOffset {
    pub fn new(ring: &[&str], tiers: Vec<PaceTier>) -> Result<Self, ConfigError> {
        if ring.is_empty() {
            return Err(ConfigError::NoLocations);
        }
        let ring: Vec<String> = ring.iter().map(|name| name.to_string()).collect();
        ensure_unique_locations(&ring)?;

        let mut seen = HashSet::new();
        for (tier_idx, tier) in tiers.iter().enumerate() {
            for pattern in &tier.patterns {
                if pattern.is_empty() {
                    return Err(ConfigError::EmptyPattern { tier: tier_idx });
                }
                if !seen.insert(pattern.clone()) {
                    return Err(ConfigError::DuplicatePattern {
                        pattern: pattern.clone(),
                    });
                }
            }
        }
        if tiers
            .iter()
            .all(|tier| tier.weight == 0 || tier.patterns.is_empty())
        {
            return Err(ConfigError::NoWeightedTier);
        }
        Ok(Self { ring, tiers })
    }

    pub fn ring(&self) -> &[String] {
        &self.ring
    }

    pub fn tiers(&self) -> &[PaceTier] {
        &self.tiers
    }

    /// Patterns that can ever be drawn, i.e. those in tiers with weight.
    pub fn available_patterns(&self) -> usize {
        self.tiers
            .iter()
            .filter(|tier| tier.weight > 0)
            .map(|tier| tier.patterns.len())
            .sum()
    }

    pub(crate) fn start(&self, rng: &mut Rng) -> usize {
        rng.pick_index(self.ring.len())
    }

    pub(crate) fn advance(&self, index: usize, steps: u8) -> usize {
        (index + steps as usize) % self.ring.len()
    }

    /// Draws a pattern nobody holds yet. Each free pattern weighs
    /// `tier weight / tier size`, which is the distribution of "pick a tier,
    /// pick a pattern, redraw if taken" without the unbounded redraw.
    /// Returns `None` once every weighted pattern is taken.
    pub(crate) fn draw_pattern(&self, taken: &[Vec<u8>], rng: &mut Rng) -> Option<Vec<u8>> {
        let scale = self
            .tiers
            .iter()
            .filter(|tier| !tier.patterns.is_empty())
            .fold(1u64, |acc, tier| lcm(acc, tier.patterns.len() as u64));

        let mut candidates: Vec<&Vec<u8>> = Vec::new();
        let mut weights: Vec<u64> = Vec::new();
        for tier in &self.tiers {
            if tier.weight == 0 || tier.patterns.is_empty() {
                continue;
            }
            let per_pattern = tier.weight as u64 * (scale / tier.patterns.len() as u64);
            for pattern in &tier.patterns {
                if taken.contains(pattern) {
                    continue;
                }
                candidates.push(pattern);
                weights.push(per_pattern);
            }
        }
        let picked = rng.pick_weighted(&weights)?;
        Some(candidates[picked].clone())
    }
}

/// Per-actor state of the cyclic model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pace {
    pub pattern: Vec<u8>,
    pub start_offset: usize,
    pub start_location: usize,
}

impl Pace {
    /// Ring steps taken to move from step `i + 1` to step `i + 2`.
    pub fn step(&self, i: usize) -> u8 {
        self.pattern[(self.start_offset + i) % self.pattern.len()]
    }

    /// The pattern as it is actually walked, rotated to the start offset.
    pub fn executed(&self) -> Vec<u8> {
        let mut rotated = self.pattern.clone();
        rotated.rotate_left(self.start_offset % self.pattern.len().max(1));
        rotated
    }

    pub fn label(&self) -> String {
        format!("{:?}", self.pattern)
    }
}

fn ensure_unique_locations(locations: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for location in locations {
        if !seen.insert(location.as_str()) {
            return Err(ConfigError::DuplicateLocation(location.clone()));
        }
    }
    Ok(())
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: u64, b: u64) -> u64 {
    a / gcd(a, b) * b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAP_GRAPH, PACE_TIERS, TERRAIN_LOOP};

    fn tiers(weights: [u32; 3]) -> Vec<PaceTier> {
        weights
            .iter()
            .zip(PACE_TIERS.iter())
            .map(|(weight, patterns)| PaceTier::new(*weight, patterns))
            .collect()
    }

    #[test]
    fn graph_walk_keeps_listed_order() {
        let walk = GraphWalk::new(&MAP_GRAPH).expect("map graph is valid");
        assert_eq!(walk.locations()[0], "牌坊");
        assert_eq!(walk.locations()[5], "舞蹈");
        let squid = walk.locations().iter().position(|l| l == "鱿鱼").expect("squid");
        let names: Vec<&str> = walk
            .neighbours(squid)
            .iter()
            .map(|idx| walk.locations()[*idx].as_str())
            .collect();
        assert_eq!(names, vec!["面具", "信号", "牌坊"]);
    }

    #[test]
    fn graph_walk_rejects_malformed_graphs() {
        assert_eq!(GraphWalk::new(&[]).unwrap_err(), ConfigError::NoLocations);
        assert_eq!(
            GraphWalk::new(&[("a", &[])]).unwrap_err(),
            ConfigError::DeadEnd("a".to_string())
        );
        assert_eq!(
            GraphWalk::new(&[("a", &["b"])]).unwrap_err(),
            ConfigError::UnknownLocation("b".to_string())
        );
        assert_eq!(
            GraphWalk::new(&[("a", &["a"]), ("a", &["a"])]).unwrap_err(),
            ConfigError::DuplicateLocation("a".to_string())
        );
    }

    #[test]
    fn graph_walk_only_steps_to_neighbours() {
        let walk = GraphWalk::new(&MAP_GRAPH).expect("map graph is valid");
        let mut rng = Rng::new(17);
        for start in 0..walk.locations().len() {
            for _ in 0..50 {
                let next = walk.step(start, &mut rng);
                assert!(walk.neighbours(start).contains(&next));
            }
        }
    }

    #[test]
    fn cyclic_offset_rejects_unweighted_catalog() {
        let err = CyclicOffset::new(&TERRAIN_LOOP, tiers([0, 0, 0])).unwrap_err();
        assert_eq!(err, ConfigError::NoWeightedTier);
        let err = CyclicOffset::new(&TERRAIN_LOOP, vec![PaceTier::new(1, &[&[]])]).unwrap_err();
        assert_eq!(err, ConfigError::EmptyPattern { tier: 0 });
        let err = CyclicOffset::new(&TERRAIN_LOOP, vec![PaceTier::new(1, &[&[1, 2], &[1, 2]])])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicatePattern {
                pattern: vec![1, 2]
            }
        );
    }

    #[test]
    fn zero_weight_tiers_are_never_drawn() {
        let ring = CyclicOffset::new(&TERRAIN_LOOP, tiers([100, 0, 0])).expect("valid");
        assert_eq!(ring.available_patterns(), 10);
        let mut rng = Rng::new(8);
        for _ in 0..500 {
            let pattern = ring.draw_pattern(&[], &mut rng).expect("free pattern");
            assert_eq!(pattern.len(), 3);
        }
    }

    #[test]
    fn draw_skips_taken_patterns_and_reports_exhaustion() {
        let ring = CyclicOffset::new(&TERRAIN_LOOP, tiers([100, 0, 0])).expect("valid");
        let mut rng = Rng::new(21);
        let mut taken = Vec::new();
        for _ in 0..10 {
            let pattern = ring.draw_pattern(&taken, &mut rng).expect("free pattern");
            assert!(!taken.contains(&pattern));
            taken.push(pattern);
        }
        assert_eq!(ring.draw_pattern(&taken, &mut rng), None);
    }

    #[test]
    fn hard_weights_favour_short_patterns() {
        let ring = CyclicOffset::new(&TERRAIN_LOOP, tiers([66, 20, 14])).expect("valid");
        let mut rng = Rng::new(1234);
        let mut short = 0;
        let total = 5_000;
        for _ in 0..total {
            if ring.draw_pattern(&[], &mut rng).expect("free").len() == 3 {
                short += 1;
            }
        }
        let ratio = short as f64 / total as f64;
        assert!((0.60..0.72).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn ring_advance_wraps() {
        let ring = CyclicOffset::new(&TERRAIN_LOOP, tiers([100, 0, 0])).expect("valid");
        assert_eq!(ring.advance(5, 1), 0);
        assert_eq!(ring.advance(4, 3), 1);
    }

    #[test]
    fn pace_steps_cycle_from_offset() {
        let pace = Pace {
            pattern: vec![1, 2, 3],
            start_offset: 2,
            start_location: 0,
        };
        let steps: Vec<u8> = (0..5).map(|i| pace.step(i)).collect();
        assert_eq!(steps, vec![3, 1, 2, 3, 1]);
        assert_eq!(pace.executed(), vec![3, 1, 2]);
        assert_eq!(pace.label(), "[1, 2, 3]");
    }
}

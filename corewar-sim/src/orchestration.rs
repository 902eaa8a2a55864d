//! Warrior placement, the round loop, and result tallying — the layer
//! above a single [`crate::Simulator`] match that the CLI drives.

use rand::Rng;
use redcode::{FieldValue, WarriorData};

use crate::config::SimulatorConfig;
use crate::report::Reporter;
use crate::simulator::{MatchOutcome, Simulator};

/// Wins/ties/losses accumulated for one warrior across every round of a
/// battle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Standings {
    /// Rounds this warrior was the sole survivor.
    pub wins: u32,
    /// Rounds that ended with more than one warrior alive at `max_cycles`.
    pub ties: u32,
    /// Rounds this warrior died while at least one opponent survived.
    pub losses: u32,
}

impl Standings {
    fn record(&mut self, outcome: MatchOutcome, index: usize) {
        match outcome {
            MatchOutcome::Survivor(winner) if winner == index => self.wins += 1,
            MatchOutcome::Tie => self.ties += 1,
            MatchOutcome::Survivor(_) | MatchOutcome::AllDead => self.losses += 1,
        }
    }
}

/// Choose placement offsets for `warriors`, keeping every pairwise gap (in
/// either direction around the circular core) at least `min_distance`.
///
/// The first warrior is placed at address `0`; each following warrior is
/// retried at a uniformly random offset until one clears `min_distance` from
/// every warrior already placed. Grounded in pMARS's placement algorithm,
/// which plants warrior 0 at the origin and scatters the rest.
fn place_warriors(
    rng: &mut impl Rng,
    core_size: FieldValue,
    min_distance: FieldValue,
    warriors: &[WarriorData],
) -> Vec<FieldValue> {
    let mut placements: Vec<FieldValue> = Vec::with_capacity(warriors.len());
    for (index, warrior) in warriors.iter().enumerate() {
        if index == 0 {
            placements.push(0);
            continue;
        }
        let offset = loop {
            let candidate = rng.gen_range(0..core_size);
            let clears_all = placements.iter().zip(warriors.iter()).all(|(&placed, other)| {
                clears_min_distance(candidate, placed, other.code.len(), warrior.code.len(), core_size, min_distance)
            });
            if clears_all {
                break candidate;
            }
        };
        placements.push(offset);
    }
    placements
}

/// Whether placing a warrior of `len_a` instructions at `a` leaves at least
/// `min_distance` of clearance, in both directions around the core, from a
/// warrior of `len_b` instructions already placed at `b`.
fn clears_min_distance(
    a: FieldValue,
    b: FieldValue,
    len_a: usize,
    len_b: usize,
    core_size: FieldValue,
    min_distance: FieldValue,
) -> bool {
    let gap = redcode::address::sub(a, b, core_size);
    let forward = i64::from(gap);
    let backward = i64::from(core_size) - forward;
    let required_forward = i64::try_from(len_b).unwrap_or(i64::MAX) + i64::from(min_distance);
    let required_backward = i64::try_from(len_a).unwrap_or(i64::MAX) + i64::from(min_distance);
    forward >= required_forward && backward >= required_backward
}

/// Run one round: place every warrior, spawn it, and run the match to
/// conclusion. Returns the outcome and, for inspection, the placements used.
pub fn run_round(
    config: SimulatorConfig,
    warriors: &[WarriorData],
    rng: &mut impl Rng,
    reporters: impl IntoIterator<Item = Box<dyn Reporter>>,
) -> (MatchOutcome, Simulator) {
    let mut sim = Simulator::new(config);
    for reporter in reporters {
        sim.add_reporter(reporter);
    }
    let placements = place_warriors(rng, config.core_size, config.min_distance, warriors);
    let indices: Vec<usize> = warriors
        .iter()
        .cloned()
        .map(|warrior| sim.add_warrior(warrior))
        .collect();
    for (&index, &origin) in indices.iter().zip(placements.iter()) {
        sim.spawn_warrior(index, origin);
    }
    let outcome = sim.run();
    (outcome, sim)
}

/// Run `rounds` independent matches of the same warriors, accumulating
/// [`Standings`] for each. A fresh [`Simulator`] (and, by extension, a fresh
/// placement) is built for every round.
#[must_use]
pub fn run_rounds(
    config: SimulatorConfig,
    warriors: &[WarriorData],
    rounds: u32,
    rng: &mut impl Rng,
) -> Vec<Standings> {
    let mut standings = vec![Standings::default(); warriors.len()];
    for _ in 0..rounds {
        let (outcome, _) = run_round(config, warriors, rng, std::iter::empty());
        for (index, entry) in standings.iter_mut().enumerate() {
            entry.record(outcome, index);
        }
    }
    standings
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use redcode::{AddrMode, CompleteInstruction, Instruction, Modifier, Opcode};

    use super::*;

    fn config(core_size: u32, min_distance: u32) -> SimulatorConfig {
        SimulatorConfig {
            standard: redcode::Standard::Icws94,
            core_size,
            max_processes: 64,
            max_cycles: 500,
            max_length: core_size,
            min_distance,
            read_limit: core_size,
            write_limit: core_size,
            legacy_fold: false,
        }
    }

    fn dat() -> WarriorData {
        WarriorData {
            code: vec![CompleteInstruction {
                instr: Instruction {
                    opcode: Opcode::Dat,
                    modifier: Modifier::F,
                    a_addr_mode: AddrMode::Direct,
                    b_addr_mode: AddrMode::Direct,
                },
                a_field: 0,
                b_field: 0,
            }],
            ..WarriorData::default()
        }
    }

    fn imp() -> WarriorData {
        WarriorData {
            code: vec![CompleteInstruction {
                instr: Instruction {
                    opcode: Opcode::Mov,
                    modifier: Modifier::I,
                    a_addr_mode: AddrMode::Direct,
                    b_addr_mode: AddrMode::Direct,
                },
                a_field: 0,
                b_field: 1,
            }],
            ..WarriorData::default()
        }
    }

    #[test]
    fn placements_always_clear_min_distance() {
        let mut rng = StdRng::seed_from_u64(7);
        let warriors = vec![dat(), dat(), dat()];
        for _ in 0..50 {
            let placements = place_warriors(&mut rng, 100, 10, &warriors);
            for i in 0..placements.len() {
                for j in (i + 1)..placements.len() {
                    assert!(clears_min_distance(
                        placements[i],
                        placements[j],
                        1,
                        1,
                        100,
                        10
                    ));
                }
            }
        }
    }

    #[test]
    fn solo_round_tallies_a_loss_for_a_dat() {
        let mut rng = StdRng::seed_from_u64(1);
        let standings = run_rounds(config(8, 0), &[dat()], 3, &mut rng);
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].losses, 3);
        assert_eq!(standings[0].wins, 0);
    }

    #[test]
    fn imp_against_dat_always_wins() {
        let mut rng = StdRng::seed_from_u64(3);
        let standings = run_rounds(config(40, 5), &[imp(), dat()], 5, &mut rng);
        assert_eq!(standings[0].wins, 5);
        assert_eq!(standings[1].losses, 5);
    }
}

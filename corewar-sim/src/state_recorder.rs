//! A reporter that projects the event stream into a per-address `(state,
//! warrior)` snapshot, grounded in `pkg/mars/staterecorder.go`'s
//! most-recent-event-wins semantics.

use crate::report::{Report, ReportKind, Reporter};

/// The most recent kind of effect observed at a core address.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AddressState {
    /// No event has touched this address since the last reset.
    Empty,
    /// The address was popped off a process queue and executed.
    Executed,
    /// The address was overwritten.
    Written,
    /// The address's field was incremented (post-increment addressing).
    Incremented,
    /// The address's field was decremented (pre-decrement addressing).
    Decremented,
    /// The address was read as an operand (only recorded when opted in).
    Read,
    /// The task at this address terminated (`DAT`, or a division/modulus by
    /// zero).
    Terminated,
}

/// No warrior owns this address's most recent event.
const NO_WARRIOR: i64 = -1;

/// A [`Reporter`] that maintains `(state, warrior_index)` for every core
/// address, letting an external observer reconstruct the full core display
/// without polling the simulator or replaying the event stream itself.
#[derive(Clone, Debug)]
pub struct StateRecorder {
    /// `(state, warrior index or -1)` per address.
    slots: Vec<(AddressState, i64)>,
    /// Whether [`ReportKind::WarriorRead`] events are recorded. Off by
    /// default, since most observers only care about writes/execution and
    /// reads are by far the most frequent event.
    record_reads: bool,
}

impl StateRecorder {
    /// Build a recorder for a core of `core_size` addresses, all initially
    /// `(Empty, -1)`.
    #[must_use]
    pub fn new(core_size: u32, record_reads: bool) -> Self {
        Self {
            slots: vec![(AddressState::Empty, NO_WARRIOR); core_size as usize],
            record_reads,
        }
    }

    /// The current `(state, warrior_index)` at `address`, where
    /// `warrior_index` is `None` if no warrior owns the most recent event.
    #[must_use]
    pub fn get(&self, address: u32) -> (AddressState, Option<usize>) {
        let (state, warrior) = self.slots[address as usize];
        let warrior = usize::try_from(warrior).ok();
        (state, warrior)
    }

    /// Iterate over every address's current `(state, warrior_index)`.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (AddressState, Option<usize>)> + '_ {
        self.slots
            .iter()
            .map(|&(state, warrior)| (state, usize::try_from(warrior).ok()))
    }

    /// Paint `address` with `state`, attributed to `warrior_index`.
    fn paint(&mut self, address: usize, state: AddressState, warrior: Option<usize>) {
        if let Some(slot) = self.slots.get_mut(address) {
            #[allow(
                clippy::cast_possible_wrap,
                reason = "warrior indices never approach i64::MAX"
            )]
            let warrior = warrior.map_or(NO_WARRIOR, |w| w as i64);
            *slot = (state, warrior);
        }
    }
}

impl Reporter for StateRecorder {
    fn report(&mut self, event: &Report) {
        let Some(address) = event.address else {
            if event.kind == ReportKind::SimReset {
                self.slots.fill((AddressState::Empty, NO_WARRIOR));
            }
            return;
        };
        let address = address as usize;
        match event.kind {
            ReportKind::WarriorSpawn => {
                self.paint(address, AddressState::Written, event.warrior_index);
            }
            ReportKind::WarriorTaskPop => {
                self.paint(address, AddressState::Executed, event.warrior_index);
            }
            ReportKind::WarriorTaskTerminate => {
                self.paint(address, AddressState::Terminated, event.warrior_index);
            }
            ReportKind::WarriorWrite => {
                self.paint(address, AddressState::Written, event.warrior_index);
            }
            ReportKind::WarriorIncrement => {
                self.paint(address, AddressState::Incremented, event.warrior_index);
            }
            ReportKind::WarriorDecrement => {
                self.paint(address, AddressState::Decremented, event.warrior_index);
            }
            ReportKind::WarriorRead if self.record_reads => {
                self.paint(address, AddressState::Read, event.warrior_index);
            }
            ReportKind::WarriorRead
            | ReportKind::CycleStart
            | ReportKind::CycleEnd
            | ReportKind::WarriorTaskPush
            | ReportKind::WarriorTerminate
            | ReportKind::SimReset => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::*;

    #[test]
    fn fresh_recorder_is_all_empty() {
        let recorder = StateRecorder::new(8, false);
        assert_eq!(recorder.get(0), (AddressState::Empty, None));
        assert_eq!(recorder.iter().count(), 8);
    }

    #[test]
    fn most_recent_event_wins() {
        let mut recorder = StateRecorder::new(8, false);
        recorder.report(&Report {
            kind: ReportKind::WarriorWrite,
            cycle: 0,
            warrior_index: Some(0),
            address: Some(3),
        });
        assert_eq!(recorder.get(3), (AddressState::Written, Some(0)));
        recorder.report(&Report {
            kind: ReportKind::WarriorDecrement,
            cycle: 1,
            warrior_index: Some(1),
            address: Some(3),
        });
        assert_eq!(recorder.get(3), (AddressState::Decremented, Some(1)));
    }

    #[test]
    fn reads_are_ignored_unless_opted_in() {
        let mut recorder = StateRecorder::new(8, false);
        recorder.report(&Report {
            kind: ReportKind::WarriorRead,
            cycle: 0,
            warrior_index: Some(0),
            address: Some(2),
        });
        assert_eq!(recorder.get(2), (AddressState::Empty, None));

        let mut recording = StateRecorder::new(8, true);
        recording.report(&Report {
            kind: ReportKind::WarriorRead,
            cycle: 0,
            warrior_index: Some(0),
            address: Some(2),
        });
        assert_eq!(recording.get(2), (AddressState::Read, Some(0)));
    }

    #[test]
    fn sim_reset_restores_every_slot_to_empty() {
        let mut recorder = StateRecorder::new(4, false);
        recorder.report(&Report {
            kind: ReportKind::WarriorWrite,
            cycle: 0,
            warrior_index: Some(0),
            address: Some(1),
        });
        recorder.report(&Report {
            kind: ReportKind::SimReset,
            cycle: 0,
            warrior_index: None,
            address: None,
        });
        for state in recorder.iter() {
            assert_eq!(state, (AddressState::Empty, None));
        }
    }
}

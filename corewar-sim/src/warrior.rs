//! A warrior's runtime state inside a running [`crate::Simulator`], distinct
//! from its compiled [`WarriorData`].

use redcode::process_queue::ProcessQueue;
use redcode::{FieldValue, WarriorData};

/// Where a warrior stands in the current match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum WarriorState {
    /// Registered with the simulator but not yet written into core.
    Added,
    /// Loaded into core with at least one task queued.
    Alive,
    /// Its process queue emptied; it no longer executes.
    Dead,
}

/// A warrior's compiled code paired with its runtime state: where it lives in
/// core (once spawned), its process queue, and whether it is still alive.
#[derive(Clone, Debug)]
pub struct Warrior {
    /// The compiled program this warrior runs.
    pub data: WarriorData,
    /// This warrior's index into the simulator's warrior list; also the value
    /// painted into [`crate::Report::warrior_index`] for its events.
    pub index: usize,
    /// The core address its code was loaded at, set by [`Warrior::spawn`].
    pub origin: Option<FieldValue>,
    /// Current lifecycle state.
    pub state: WarriorState,
    /// Queued program counters awaiting execution, oldest first.
    pub process_queue: ProcessQueue,
}

impl Warrior {
    /// Build a warrior in the [`WarriorState::Added`] state: registered with
    /// the simulator but not yet written into core. `max_processes` bounds
    /// its process queue's capacity.
    #[must_use]
    pub fn new(data: WarriorData, index: usize, max_processes: u32) -> Self {
        Self {
            data,
            index,
            origin: None,
            state: WarriorState::Added,
            process_queue: ProcessQueue::new(max_processes as usize),
        }
    }

    /// Record where this warrior's code was loaded, queue its entry point,
    /// and transition to [`WarriorState::Alive`]. Does not itself write to
    /// core memory; [`crate::Simulator::spawn_warrior`] does that and calls
    /// this afterwards.
    pub fn spawn(&mut self, origin: FieldValue, core_size: FieldValue) {
        let entry =
            redcode::address::offset(origin, i64::from(self.data.start), core_size);
        self.origin = Some(origin);
        self.process_queue.push_back(entry);
        self.state = WarriorState::Alive;
    }

    /// Whether this warrior still has queued tasks.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        matches!(self.state, WarriorState::Alive)
    }

    /// Mark the warrior dead. Called once its process queue is observed
    /// empty after a task pop.
    pub fn terminate(&mut self) {
        self.state = WarriorState::Dead;
    }

    /// Return to the [`WarriorState::Added`] state: forget the origin,
    /// clear the process queue. Used by [`crate::Simulator::reset`].
    pub fn reset(&mut self) {
        self.origin = None;
        self.process_queue.clear();
        self.state = WarriorState::Added;
    }
}

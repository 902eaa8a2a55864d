//! The event stream a running [`crate::Simulator`] emits.
//!
//! Reporters are a capability the simulator consumes, not a back-channel
//! into it: [`Reporter::report`] receives an immutable [`Report`] and may
//! not reach back into simulator state.

/// The kind of event a [`Report`] describes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ReportKind {
    /// A new cycle is about to begin.
    CycleStart,
    /// The current cycle has finished; `cycle_count` has been incremented.
    CycleEnd,
    /// A warrior's code was written into core and its first process queued.
    WarriorSpawn,
    /// A program counter was popped off a warrior's process queue for
    /// execution.
    WarriorTaskPop,
    /// A program counter was pushed onto a warrior's process queue.
    WarriorTaskPush,
    /// The executing task terminated without being re-queued (`DAT`, or a
    /// division/modulus by zero).
    WarriorTaskTerminate,
    /// A warrior's process queue emptied; the warrior transitioned to
    /// `Dead`.
    WarriorTerminate,
    /// A core address was read as an operand.
    WarriorRead,
    /// A core address was overwritten.
    WarriorWrite,
    /// A core address's field was incremented (post-increment addressing).
    WarriorIncrement,
    /// A core address's field was decremented (pre-decrement addressing).
    WarriorDecrement,
    /// The simulator was reset: memory zeroed, all warriors returned to
    /// `Added`.
    SimReset,
}

/// A single simulator event.
///
/// `warrior_index` and `address` are `None` when a report kind has no
/// natural warrior or address association (e.g. [`ReportKind::SimReset`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Report {
    /// What happened.
    pub kind: ReportKind,
    /// The cycle count at the time of the event.
    pub cycle: u64,
    /// The warrior this event is attributed to, if any.
    pub warrior_index: Option<usize>,
    /// The core address this event concerns, if any.
    pub address: Option<u32>,
}

/// A single-method capability consumed by the simulator to fan events out to
/// external observers (debug loggers, visualizers, [`crate::StateRecorder`]).
///
/// Reporters are called synchronously, in registration order, and must not
/// mutate simulator state.
pub trait Reporter {
    /// Handle one simulator event.
    fn report(&mut self, event: &Report);
}

/// A reporter that emits every event through the `log` facade at
/// [`log::Level::Trace`], so a CLI user can opt into cycle-by-cycle tracing
/// with `RUST_LOG=trace` instead of a bespoke flag.
///
/// Grounded in the original implementation's `debugReporter`
/// (`pkg/mars/reporter.go`), re-expressed through `log` instead of direct
/// stderr writes.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, event: &Report) {
        log::trace!(
            "cycle {} {:?} warrior={:?} address={:?}",
            event.cycle,
            event.kind,
            event.warrior_index,
            event.address
        );
    }
}

//! The MARS execution engine: memory, warriors, scheduling, and the
//! reporter fan-out, per §4.7.

use redcode::{CompleteInstruction, FieldValue, WarriorData};

use crate::config::SimulatorConfig;
use crate::dispatch::{self, DispatchContext, Outcome};
use crate::operand_fetch::{self, FetchContext};
use crate::report::{Report, ReportKind, Reporter};
use crate::warrior::{Warrior, WarriorState};

/// How a completed match ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MatchOutcome {
    /// `cycle_count` reached `max_cycles` with more than one warrior alive
    /// (or, in a solo match, the warrior survived the full run).
    Tie,
    /// Exactly one warrior remains alive; carries its index.
    Survivor(usize),
    /// Every warrior died (possible in a solo match, or a mutual kill).
    AllDead,
}

/// A running Core War match: the shared core, every warrior's runtime
/// state, and the registered reporters.
pub struct Simulator {
    config: SimulatorConfig,
    mem: Vec<CompleteInstruction>,
    warriors: Vec<Warrior>,
    /// Index into `warriors` of the next warrior due for a task step.
    next_warrior: usize,
    cycle_count: u64,
    reporters: Vec<Box<dyn Reporter>>,
}

impl Simulator {
    /// Build a simulator over a freshly zeroed core, with no warriors
    /// loaded yet.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            mem: vec![CompleteInstruction::default(); config.core_size as usize],
            config,
            warriors: Vec::new(),
            next_warrior: 0,
            cycle_count: 0,
            reporters: Vec::new(),
        }
    }

    /// Register a reporter. Reporters are called synchronously, in
    /// registration order, for every emitted event.
    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    /// The configuration this simulator was built from.
    #[must_use]
    pub const fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// The number of task steps executed so far.
    #[must_use]
    pub const fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Read-only access to core memory.
    #[must_use]
    pub fn core(&self) -> &[CompleteInstruction] {
        &self.mem
    }

    /// Read-only access to the loaded warriors, in load order.
    #[must_use]
    pub fn warriors(&self) -> &[Warrior] {
        &self.warriors
    }

    /// Register a warrior in the [`crate::warrior::WarriorState::Added`]
    /// state. Its code is not written into core until
    /// [`Self::spawn_warrior`] is called with a placement offset.
    pub fn add_warrior(&mut self, data: WarriorData) -> usize {
        let index = self.warriors.len();
        self.warriors
            .push(Warrior::new(data, index, self.config.max_processes));
        index
    }

    /// Write an added warrior's code into `mem` starting at `origin`
    /// (wrapping modulo `core_size`), queue its entry point, and transition
    /// it to `Alive`. Emits a `WarriorSpawn` report for every address
    /// written.
    pub fn spawn_warrior(&mut self, index: usize, origin: FieldValue) {
        let core_size = self.config.core_size;
        let code_len = self.warriors[index].data.code.len();
        for offset in 0..code_len {
            let addr = redcode::address::offset(
                origin,
                i64::try_from(offset).unwrap_or(i64::MAX),
                core_size,
            );
            self.mem[addr as usize] = self.warriors[index].data.code[offset];
            self.emit(ReportKind::WarriorSpawn, Some(index), addr);
        }
        self.warriors[index].spawn(origin, core_size);
    }

    /// Zero core memory and return every warrior to the `Added` state
    /// (clearing process queues and forgetting placements), and reset the
    /// cycle counter. Re-spawn with [`Self::spawn_warrior`] to run again.
    pub fn reset(&mut self) {
        self.mem
            .iter_mut()
            .for_each(|slot| *slot = CompleteInstruction::default());
        for warrior in &mut self.warriors {
            warrior.reset();
        }
        self.next_warrior = 0;
        self.cycle_count = 0;
        self.emit(ReportKind::SimReset, None, 0);
    }

    fn emit(&mut self, kind: ReportKind, warrior_index: Option<usize>, address: FieldValue) {
        let report = Report {
            kind,
            cycle: self.cycle_count,
            warrior_index,
            address: Some(address),
        };
        for reporter in &mut self.reporters {
            reporter.report(&report);
        }
    }

    fn emit_unaddressed(&mut self, kind: ReportKind, warrior_index: Option<usize>) {
        let report = Report {
            kind,
            cycle: self.cycle_count,
            warrior_index,
            address: None,
        };
        for reporter in &mut self.reporters {
            reporter.report(&report);
        }
    }

    /// The number of warriors still alive.
    fn alive_count(&self) -> usize {
        self.warriors.iter().filter(|w| w.is_alive()).count()
    }

    /// Find the next alive warrior with a nonempty process queue, starting
    /// from `next_warrior` and wrapping around at most once.
    fn next_runnable(&self) -> Option<usize> {
        let count = self.warriors.len();
        if count == 0 {
            return None;
        }
        (0..count)
            .map(|offset| (self.next_warrior + offset) % count)
            .find(|&index| self.warriors[index].is_alive())
    }

    /// Execute exactly one task step: pop a program counter from the next
    /// runnable warrior's queue, evaluate its operands, dispatch the
    /// instruction, and requeue per the outcome. Advances `next_warrior` and
    /// increments `cycle_count` by one.
    ///
    /// Returns `false` if no warrior was runnable (the match has already
    /// concluded).
    pub fn run_cycle(&mut self) -> bool {
        let Some(index) = self.next_runnable() else {
            return false;
        };
        let core_size = self.config.core_size;

        let Some(pc) = self.warriors[index].process_queue.pop_front() else {
            return false;
        };
        self.emit_unaddressed(ReportKind::CycleStart, None);
        self.emit(ReportKind::WarriorTaskPop, Some(index), pc);

        let current = self.mem[pc as usize];
        let read_ctx = FetchContext {
            pc,
            core_size,
            read_limit: self.config.read_limit,
            write_limit: self.config.write_limit,
            legacy_fold: self.config.legacy_fold,
            warrior_index: index,
            cycle: self.cycle_count,
        };
        let ira = operand_fetch::evaluate(
            &mut self.mem,
            current.instr.a_addr_mode,
            current.a_field,
            &read_ctx,
            &mut self.reporters,
        );
        let irb = operand_fetch::evaluate(
            &mut self.mem,
            current.instr.b_addr_mode,
            current.b_field,
            &read_ctx,
            &mut self.reporters,
        );

        let rab = redcode::address::offset(pc, i64::from(ira.rp), core_size);
        let wab = redcode::address::offset(pc, i64::from(irb.wp), core_size);
        let mut dispatch_ctx = DispatchContext {
            rab,
            wab,
            pc,
            core_size,
            warrior_index: index,
            cycle: self.cycle_count,
            reporters: &mut self.reporters,
        };
        let outcome = dispatch::execute(
            &mut self.mem,
            current.instr.opcode,
            current.instr.modifier,
            ira,
            irb,
            &mut dispatch_ctx,
        );

        match outcome {
            Outcome::Terminate => {}
            Outcome::Queue(next) => self.queue(index, next),
            Outcome::QueueTwo(first, second) => {
                self.queue(index, first);
                self.queue(index, second);
            }
        }

        if self.warriors[index].process_queue.is_empty() {
            self.warriors[index].terminate();
            self.emit_unaddressed(ReportKind::WarriorTerminate, Some(index));
        }

        self.next_warrior = (index + 1) % self.warriors.len().max(1);
        self.cycle_count = self.cycle_count.saturating_add(1);
        self.emit_unaddressed(ReportKind::CycleEnd, None);
        true
    }

    fn queue(&mut self, warrior_index: usize, pc: FieldValue) {
        self.warriors[warrior_index].process_queue.push_back(pc);
        self.emit(ReportKind::WarriorTaskPush, Some(warrior_index), pc);
    }

    /// Run until the match concludes: `max_cycles` is reached (a tie), one
    /// warrior remains alive (that warrior's index), or every warrior has
    /// died.
    pub fn run(&mut self) -> MatchOutcome {
        while self.cycle_count < self.config.max_cycles {
            let multi_warrior_done =
                self.warriors.len() > 1 && self.alive_count() <= 1;
            let solo_done = self.warriors.len() == 1 && self.alive_count() == 0;
            if multi_warrior_done || solo_done {
                break;
            }
            if !self.run_cycle() {
                break;
            }
        }
        self.conclude()
    }

    fn conclude(&self) -> MatchOutcome {
        let alive: Vec<usize> = self
            .warriors
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_alive())
            .map(|(i, _)| i)
            .collect();
        match alive.as_slice() {
            [] => MatchOutcome::AllDead,
            [only] => MatchOutcome::Survivor(*only),
            _ => MatchOutcome::Tie,
        }
    }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;
    use redcode::{AddrMode, Instruction, Modifier, Opcode};

    use super::*;

    fn config(core_size: u32) -> SimulatorConfig {
        SimulatorConfig {
            standard: redcode::Standard::Icws94,
            core_size,
            max_processes: 64,
            max_cycles: 1000,
            max_length: core_size,
            min_distance: 0,
            read_limit: core_size,
            write_limit: core_size,
            legacy_fold: false,
        }
    }

    fn instr(
        opcode: Opcode,
        modifier: Modifier,
        a_mode: AddrMode,
        a_field: FieldValue,
        b_mode: AddrMode,
        b_field: FieldValue,
    ) -> CompleteInstruction {
        CompleteInstruction {
            instr: Instruction {
                opcode,
                modifier,
                a_addr_mode: a_mode,
                b_addr_mode: b_mode,
            },
            a_field,
            b_field,
        }
    }

    /// `IMP`: `MOV 0, 1` repeated forever, advancing one address per cycle.
    #[test]
    fn imp_copies_itself_forward_every_cycle() {
        let mut sim = Simulator::new(config(8));
        let imp = WarriorData {
            code: vec![instr(
                Opcode::Mov,
                Modifier::I,
                AddrMode::Direct,
                0,
                AddrMode::Direct,
                1,
            )],
            ..WarriorData::default()
        };
        let index = sim.add_warrior(imp);
        sim.spawn_warrior(index, 0);
        for _ in 0..4 {
            assert!(sim.run_cycle());
        }
        // after 4 steps the MOV instruction should have propagated to
        // address 4.
        assert_eq!(sim.core()[4].instr.opcode, Opcode::Mov);
    }

    /// The dwarf from spec: `ADD #4, $3 / MOV $2, @2 / JMP $-2, $0 / DAT
    /// #0, #0`, placed at address 0 in a 16-address core (large enough that
    /// `mem[3].b_field == 8` doesn't collide with the modulus). After four
    /// executions, `mem[3].b_field == 8` and `mem[7].b_field == 4`.
    #[test]
    fn dwarf_bombs_every_fourth_cell() {
        let mut sim = Simulator::new(config(16));
        let dwarf = WarriorData {
            code: vec![
                instr(Opcode::Add, Modifier::AB, AddrMode::Immediate, 4, AddrMode::Direct, 3),
                instr(Opcode::Mov, Modifier::I, AddrMode::Direct, 2, AddrMode::IndirectB, 2),
                // field 14 represents -2 mod 16, i.e. `JMP $-2, $0`.
                instr(Opcode::Jmp, Modifier::B, AddrMode::Direct, 14, AddrMode::Direct, 0),
                instr(Opcode::Dat, Modifier::F, AddrMode::Immediate, 0, AddrMode::Immediate, 0),
            ],
            ..WarriorData::default()
        };
        let index = sim.add_warrior(dwarf);
        sim.spawn_warrior(index, 0);
        for _ in 0..4 {
            assert!(sim.run_cycle());
        }
        assert_eq!(sim.core()[3].b_field, 8);
        assert_eq!(sim.core()[7].b_field, 4);
    }

    #[test]
    fn solo_warrior_that_dats_dies_and_reports_all_dead() {
        let mut sim = Simulator::new(config(8));
        let suicide = WarriorData {
            code: vec![instr(Opcode::Dat, Modifier::F, AddrMode::Direct, 0, AddrMode::Direct, 0)],
            ..WarriorData::default()
        };
        let index = sim.add_warrior(suicide);
        sim.spawn_warrior(index, 0);
        assert_eq!(sim.run(), MatchOutcome::AllDead);
    }

    #[test]
    fn two_warriors_one_dat_one_nop_leaves_a_survivor() {
        let mut sim = Simulator::new(config(8));
        let suicide = WarriorData {
            code: vec![instr(Opcode::Dat, Modifier::F, AddrMode::Direct, 0, AddrMode::Direct, 0)],
            ..WarriorData::default()
        };
        let survivor = WarriorData {
            code: vec![instr(Opcode::Nop, Modifier::F, AddrMode::Direct, 0, AddrMode::Direct, 0)],
            ..WarriorData::default()
        };
        let suicide_index = sim.add_warrior(suicide);
        sim.spawn_warrior(suicide_index, 0);
        let survivor_index = sim.add_warrior(survivor);
        sim.spawn_warrior(survivor_index, 4);
        assert_eq!(sim.run(), MatchOutcome::Survivor(1));
    }
}

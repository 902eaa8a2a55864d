//! Opcode dispatch: §4.7.3. Each op combines the fetched A/B operands,
//! writes into the destination address `WAB`, and decides which program
//! counter(s) to requeue.

use redcode::{CompleteInstruction, FieldValue, Modifier, Opcode};

use crate::operand_fetch::FetchedOperand;
use crate::report::{Report, ReportKind, Reporter};

/// What a dispatched instruction leaves on its warrior's process queue.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The task terminates; nothing is requeued.
    Terminate,
    /// Requeue a single program counter.
    Queue(FieldValue),
    /// Requeue two program counters in order (`SPL`: next instruction, then
    /// the split target), subject to the process queue's own capacity.
    QueueTwo(FieldValue, FieldValue),
}

/// Which field(s) a modifier routes from the A-instruction into the
/// B-instruction (source, destination) pairs, per the ICWS'94 modifier
/// matrix. `I` on a non-`MOV` opcode is treated identically to `F`, since
/// "the whole instruction" has no meaning for an arithmetic/compare op.
const fn field_pairs(modifier: Modifier) -> &'static [(Selector, Selector)] {
    match modifier {
        Modifier::A => &[(Selector::A, Selector::A)],
        Modifier::B => &[(Selector::B, Selector::B)],
        Modifier::AB => &[(Selector::A, Selector::B)],
        Modifier::BA => &[(Selector::B, Selector::A)],
        Modifier::F | Modifier::I => {
            &[(Selector::A, Selector::A), (Selector::B, Selector::B)]
        }
        Modifier::X => {
            &[(Selector::A, Selector::B), (Selector::B, Selector::A)]
        }
    }
}

/// An instruction field, A or B.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Selector {
    A,
    B,
}

impl Selector {
    const fn get(self, instr: &CompleteInstruction) -> FieldValue {
        match self {
            Self::A => instr.a_field,
            Self::B => instr.b_field,
        }
    }

    fn set(self, instr: &mut CompleteInstruction, value: FieldValue) {
        match self {
            Self::A => instr.a_field = value,
            Self::B => instr.b_field = value,
        }
    }
}

/// Everything [`execute`] needs beyond the already-fetched operands.
pub struct DispatchContext<'reporters> {
    /// `(PC + RPA) mod M`: the A-jump target.
    pub rab: FieldValue,
    /// `(PC + WPB) mod M`: the write destination.
    pub wab: FieldValue,
    /// The program counter of the instruction being dispatched.
    pub pc: FieldValue,
    /// Core size / modulus.
    pub core_size: FieldValue,
    /// The warrior executing this cycle, attributed to emitted reports.
    pub warrior_index: usize,
    /// The current cycle count, attributed to emitted reports.
    pub cycle: u64,
    /// Registered reporters, called in order for every effect.
    pub reporters: &'reporters mut [Box<dyn Reporter>],
}

impl DispatchContext<'_> {
    fn emit(&mut self, kind: ReportKind, address: FieldValue) {
        let report = Report {
            kind,
            cycle: self.cycle,
            warrior_index: Some(self.warrior_index),
            address: Some(address),
        };
        for reporter in &mut *self.reporters {
            reporter.report(&report);
        }
    }

    const fn pc_plus_one(&self) -> FieldValue {
        // PC is already < core_size, and wrapping here reproduces the
        // modular "next instruction" address.
        if self.pc.wrapping_add(1) >= self.core_size {
            0
        } else {
            self.pc.wrapping_add(1)
        }
    }

    const fn pc_plus_two(&self) -> FieldValue {
        let one = self.pc_plus_one();
        if one.wrapping_add(1) >= self.core_size {
            0
        } else {
            one.wrapping_add(1)
        }
    }
}

/// Execute one instruction given its already-fetched A/B operands, mutating
/// `mem` at the write destination and returning what to requeue.
pub fn execute(
    mem: &mut [CompleteInstruction],
    opcode: Opcode,
    modifier: Modifier,
    ira: FetchedOperand,
    irb: FetchedOperand,
    ctx: &mut DispatchContext<'_>,
) -> Outcome {
    match opcode {
        Opcode::Dat => {
            ctx.emit(ReportKind::WarriorTaskTerminate, ctx.pc);
            Outcome::Terminate
        }
        Opcode::Mov => {
            mov(mem, modifier, &ira.ir, ctx);
            Outcome::Queue(ctx.pc_plus_one())
        }
        Opcode::Add => {
            let core_size = ctx.core_size;
            arithmetic(mem, modifier, &ira.ir, ctx, |b, a| {
                redcode::address::offset(b, i64::from(a), core_size)
            });
            Outcome::Queue(ctx.pc_plus_one())
        }
        Opcode::Sub => {
            let core_size = ctx.core_size;
            arithmetic(mem, modifier, &ira.ir, ctx, |b, a| {
                redcode::address::sub(b, a, core_size)
            });
            Outcome::Queue(ctx.pc_plus_one())
        }
        Opcode::Mul => {
            let core_size = ctx.core_size;
            arithmetic(mem, modifier, &ira.ir, ctx, |b, a| {
                let product = u64::from(b) * u64::from(a);
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "product reduced mod core_size before truncation"
                )]
                let reduced = (product % u64::from(core_size)) as FieldValue;
                reduced
            });
            Outcome::Queue(ctx.pc_plus_one())
        }
        Opcode::Div | Opcode::Mod => {
            if divide(mem, opcode, modifier, &ira.ir, ctx) {
                Outcome::Queue(ctx.pc_plus_one())
            } else {
                Outcome::Terminate
            }
        }
        Opcode::Jmp => Outcome::Queue(ctx.rab),
        Opcode::Jmz => branch_if(irb.ir, modifier, ctx, |v| v == 0),
        Opcode::Jmn => branch_if(irb.ir, modifier, ctx, |v| v != 0),
        Opcode::Djn => djn(mem, modifier, ctx),
        Opcode::Cmp | Opcode::Seq => {
            compare_two(&ira.ir, &irb.ir, modifier, ctx, |a, b| a == b)
        }
        Opcode::Sne => compare_two(&ira.ir, &irb.ir, modifier, ctx, |a, b| a != b),
        Opcode::Slt => {
            // `I` has no whole-instruction meaning for a numeric
            // less-than; ICWS'94 falls back to `F` here.
            let modifier = if matches!(modifier, Modifier::I) {
                Modifier::F
            } else {
                modifier
            };
            compare_two(&ira.ir, &irb.ir, modifier, ctx, |a, b| a < b)
        }
        Opcode::Spl => {
            let queue_cap_respecting = ctx.rab;
            Outcome::QueueTwo(ctx.pc_plus_one(), queue_cap_respecting)
        }
        Opcode::Nop => Outcome::Queue(ctx.pc_plus_one()),
    }
}

fn mov(
    mem: &mut [CompleteInstruction],
    modifier: Modifier,
    ira: &CompleteInstruction,
    ctx: &mut DispatchContext<'_>,
) {
    let dest = ctx.wab as usize;
    if matches!(modifier, Modifier::I) {
        mem[dest] = *ira;
    } else {
        for &(src, dst) in field_pairs(modifier) {
            let value = src.get(ira);
            dst.set(&mut mem[dest], value);
        }
    }
    ctx.emit(ReportKind::WarriorWrite, ctx.wab);
}

/// Combine corresponding fields of `ira` and the destination instruction per
/// `modifier`, writing each result back into `mem[wab]`. `combine(b, a)`
/// folds the destination's current field value with the source field value.
fn arithmetic(
    mem: &mut [CompleteInstruction],
    modifier: Modifier,
    ira: &CompleteInstruction,
    ctx: &mut DispatchContext<'_>,
    combine: impl Fn(FieldValue, FieldValue) -> FieldValue,
) {
    let dest = ctx.wab as usize;
    for &(src, dst) in field_pairs(modifier) {
        let a_value = src.get(ira);
        let b_value = dst.get(&mem[dest]);
        let result = combine(b_value, a_value);
        dst.set(&mut mem[dest], result);
    }
    ctx.emit(ReportKind::WarriorWrite, ctx.wab);
}

/// `DIV`/`MOD`: returns `false` (task terminates) if any participating
/// divisor field is zero. Per §4.7.3, fields whose divisor is nonzero are
/// still written even when the task as a whole terminates.
fn divide(
    mem: &mut [CompleteInstruction],
    opcode: Opcode,
    modifier: Modifier,
    ira: &CompleteInstruction,
    ctx: &mut DispatchContext<'_>,
) -> bool {
    let dest = ctx.wab as usize;
    let mut divided_by_zero = false;
    let mut wrote_any = false;
    for &(src, dst) in field_pairs(modifier) {
        let divisor = src.get(ira);
        if divisor == 0 {
            divided_by_zero = true;
            continue;
        }
        let dividend = dst.get(&mem[dest]);
        let result = if opcode == Opcode::Div {
            dividend / divisor
        } else {
            dividend % divisor
        };
        dst.set(&mut mem[dest], result);
        wrote_any = true;
    }
    if wrote_any {
        ctx.emit(ReportKind::WarriorWrite, ctx.wab);
    }
    !divided_by_zero
}

fn branch_if(
    irb: CompleteInstruction,
    modifier: Modifier,
    ctx: &mut DispatchContext<'_>,
    predicate: impl Fn(FieldValue) -> bool,
) -> Outcome {
    let all_match = field_pairs(modifier)
        .iter()
        .all(|&(_, dst)| predicate(dst.get(&irb)));
    if all_match {
        Outcome::Queue(ctx.rab)
    } else {
        Outcome::Queue(ctx.pc_plus_one())
    }
}

fn djn(
    mem: &mut [CompleteInstruction],
    modifier: Modifier,
    ctx: &mut DispatchContext<'_>,
) -> Outcome {
    let dest = ctx.wab as usize;
    let mut any_nonzero = false;
    for &(_, dst) in field_pairs(modifier) {
        let decremented =
            redcode::address::sub(dst.get(&mem[dest]), 1, ctx.core_size);
        dst.set(&mut mem[dest], decremented);
        any_nonzero |= decremented != 0;
    }
    ctx.emit(ReportKind::WarriorWrite, ctx.wab);
    if any_nonzero {
        Outcome::Queue(ctx.rab)
    } else {
        Outcome::Queue(ctx.pc_plus_one())
    }
}

fn compare_two(
    ira: &CompleteInstruction,
    irb: &CompleteInstruction,
    modifier: Modifier,
    ctx: &mut DispatchContext<'_>,
    predicate: impl Fn(FieldValue, FieldValue) -> bool,
) -> Outcome {
    let matches_all = if matches!(modifier, Modifier::I) {
        ira.instr == irb.instr
            && predicate(ira.a_field, irb.a_field)
            && predicate(ira.b_field, irb.b_field)
    } else {
        field_pairs(modifier)
            .iter()
            .all(|&(src, dst)| predicate(src.get(ira), dst.get(irb)))
    };
    if matches_all {
        Outcome::Queue(ctx.pc_plus_two())
    } else {
        Outcome::Queue(ctx.pc_plus_one())
    }
}

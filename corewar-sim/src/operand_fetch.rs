//! Operand evaluation: the read/write pointer fold, indirection rechasing,
//! and pre-decrement/post-increment side effects of §4.7.2.

use redcode::{AddrMode, CompleteInstruction, FieldValue};

use crate::report::{Report, ReportKind, Reporter};

/// Which field of a secondary instruction an indirect addressing mode
/// dereferences through: the A-number for `* { }`, the B-number for
/// `@ < >`.
#[derive(Copy, Clone)]
enum FieldSelector {
    A,
    B,
}

impl FieldSelector {
    const fn of(mode: AddrMode) -> Option<Self> {
        match mode {
            AddrMode::IndirectA | AddrMode::PredecA | AddrMode::PostincA => {
                Some(Self::A)
            }
            AddrMode::IndirectB | AddrMode::PredecB | AddrMode::PostincB => {
                Some(Self::B)
            }
            _ => None,
        }
    }

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

/// The result of resolving one operand: its read/write pointers (offsets
/// from `PC`, already folded into their respective windows) and the
/// instruction fetched through the read pointer.
#[derive(Copy, Clone, Debug)]
pub struct FetchedOperand {
    /// Offset from `PC` the operand's value was read through.
    pub rp: FieldValue,
    /// Offset from `PC` the operand's side effects and write target use.
    pub wp: FieldValue,
    /// The instruction fetched at `(PC + rp) mod M`.
    pub ir: CompleteInstruction,
}

/// Parameters shared by every operand evaluation in a cycle; grouped to keep
/// [`evaluate`]'s signature from sprawling across a dozen positional
/// arguments.
#[derive(Copy, Clone)]
pub struct FetchContext {
    /// The program counter the operand is relative to.
    pub pc: FieldValue,
    /// Core size / modulus.
    pub core_size: FieldValue,
    /// Window size operand reads are folded into.
    pub read_limit: FieldValue,
    /// Window size operand writes are folded into.
    pub write_limit: FieldValue,
    /// Whether the fold comparison is the historic `<` branch.
    pub legacy_fold: bool,
    /// The warrior executing this cycle, attributed to emitted reports.
    pub warrior_index: usize,
    /// The current cycle count, attributed to emitted reports.
    pub cycle: u64,
}

fn emit(
    reporters: &mut [Box<dyn Reporter>],
    kind: ReportKind,
    ctx: &FetchContext,
    address: FieldValue,
) {
    let report = Report {
        kind,
        cycle: ctx.cycle,
        warrior_index: Some(ctx.warrior_index),
        address: Some(address),
    };
    for reporter in reporters {
        reporter.report(&report);
    }
}

/// Evaluate one operand (`field`, tagged by its `mode`) against `mem`,
/// applying any pre-decrement/post-increment side effect and reporting every
/// read/write/increment/decrement along the way.
pub fn evaluate(
    mem: &mut [CompleteInstruction],
    mode: AddrMode,
    field: FieldValue,
    ctx: &FetchContext,
    reporters: &mut [Box<dyn Reporter>],
) -> FetchedOperand {
    if mode == AddrMode::Immediate {
        // Per ICWS'94 (and the '88 sources, which resolve to the same
        // pointers): an immediate operand never leaves PC, so IRA is simply
        // the current instruction.
        return FetchedOperand {
            rp: 0,
            wp: 0,
            ir: mem[ctx.pc as usize],
        };
    }

    let mut rp =
        redcode::address::fold(field, ctx.read_limit, ctx.core_size, ctx.legacy_fold);
    let mut wp =
        redcode::address::fold(field, ctx.write_limit, ctx.core_size, ctx.legacy_fold);

    let mut pending_increment = None;
    if let Some(selector) = FieldSelector::of(mode) {
        let wp_addr = redcode::address::offset(ctx.pc, i64::from(wp), ctx.core_size);
        match mode {
            AddrMode::PredecA | AddrMode::PredecB => {
                let current = selector.get(&mem[wp_addr as usize]);
                let decremented =
                    redcode::address::sub(current, 1, ctx.core_size);
                selector.set(&mut mem[wp_addr as usize], decremented);
                emit(reporters, ReportKind::WarriorDecrement, ctx, wp_addr);
            }
            AddrMode::PostincA | AddrMode::PostincB => {
                pending_increment = Some((wp_addr, selector));
            }
            _ => {}
        }

        // Both pointers dereference through the same secondary offset, each
        // read from its own intermediate cell and re-folded by its own
        // window; they coincide whenever read_limit == write_limit.
        let rp_addr = redcode::address::offset(ctx.pc, i64::from(rp), ctx.core_size);
        let rp_secondary = selector.get(&mem[rp_addr as usize]);
        rp = redcode::address::fold(
            rp.wrapping_add(rp_secondary),
            ctx.read_limit,
            ctx.core_size,
            ctx.legacy_fold,
        );

        let wp_secondary = selector.get(&mem[wp_addr as usize]);
        wp = redcode::address::fold(
            wp.wrapping_add(wp_secondary),
            ctx.write_limit,
            ctx.core_size,
            ctx.legacy_fold,
        );
    }

    let ir_addr = redcode::address::offset(ctx.pc, i64::from(rp), ctx.core_size);
    let ir = mem[ir_addr as usize];
    emit(reporters, ReportKind::WarriorRead, ctx, ir_addr);

    if let Some((target, selector)) = pending_increment {
        let current = selector.get(&mem[target as usize]);
        let incremented = redcode::address::offset(current, 1, ctx.core_size);
        selector.set(&mut mem[target as usize], incremented);
        emit(reporters, ReportKind::WarriorIncrement, ctx, target);
    }

    FetchedOperand { rp, wp, ir }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;
    use redcode::{Instruction, Modifier, Opcode};

    use super::*;

    fn instr(a_field: FieldValue, b_field: FieldValue) -> CompleteInstruction {
        CompleteInstruction {
            instr: Instruction {
                opcode: Opcode::Dat,
                modifier: Modifier::F,
                a_addr_mode: AddrMode::Direct,
                b_addr_mode: AddrMode::Direct,
            },
            a_field,
            b_field,
        }
    }

    fn ctx(pc: FieldValue, core_size: FieldValue) -> FetchContext {
        FetchContext {
            pc,
            core_size,
            read_limit: core_size,
            write_limit: core_size,
            legacy_fold: false,
            warrior_index: 0,
            cycle: 0,
        }
    }

    #[test]
    fn immediate_resolves_to_the_current_instruction() {
        let mut mem = vec![instr(0, 0); 8];
        mem[2] = instr(7, 9);
        let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
        let result =
            evaluate(&mut mem, AddrMode::Immediate, 99, &ctx(2, 8), &mut reporters);
        assert_eq!(result.rp, 0);
        assert_eq!(result.wp, 0);
        assert_eq!(result.ir, mem[2]);
    }

    #[test]
    fn direct_mode_folds_without_indirection() {
        let mut mem = vec![instr(0, 0); 8];
        mem[3] = instr(11, 22);
        let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
        let result =
            evaluate(&mut mem, AddrMode::Direct, 3, &ctx(0, 8), &mut reporters);
        assert_eq!(result.rp, 3);
        assert_eq!(result.ir, mem[3]);
    }

    #[test]
    fn predecrement_b_mutates_before_the_read() {
        let mut mem = vec![instr(0, 0); 8];
        // PC=0, field=2 -> target address 2, B-number predecremented first.
        mem[2] = instr(0, 5);
        let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
        evaluate(&mut mem, AddrMode::PredecB, 2, &ctx(0, 8), &mut reporters);
        assert_eq!(mem[2].b_field, 4);
    }

    #[test]
    fn postincrement_b_rechases_before_incrementing_the_pointer_cell() {
        let mut mem = vec![instr(0, 0); 8];
        // PC=0, field=2 -> intermediate cell at address 2 holds B-number 5,
        // so the read dereferences on to address 7.
        mem[2] = instr(0, 5);
        mem[7] = instr(9, 9);
        let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
        let result =
            evaluate(&mut mem, AddrMode::PostincB, 2, &ctx(0, 8), &mut reporters);
        assert_eq!(result.ir, mem[7]);
        // The pointer cell's B-number increments only after the read.
        assert_eq!(mem[2].b_field, 6);
    }

    #[test]
    fn indirect_b_rechases_through_the_secondary_offset() {
        let mut mem = vec![instr(0, 0); 8];
        // PC=0, field=1 -> mem[1] holds B-number 2, so the final read
        // address is folded from 1 + 2 = 3.
        mem[1] = instr(0, 2);
        mem[3] = instr(42, 42);
        let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
        let result =
            evaluate(&mut mem, AddrMode::IndirectB, 1, &ctx(0, 8), &mut reporters);
        assert_eq!(result.rp, 3);
        assert_eq!(result.ir, mem[3]);
    }

    #[test]
    fn reads_and_decrements_are_reported() {
        use std::cell::RefCell;
        use std::rc::Rc;

        struct Counting {
            kinds: Rc<RefCell<Vec<ReportKind>>>,
        }
        impl Reporter for Counting {
            fn report(&mut self, event: &Report) {
                self.kinds.borrow_mut().push(event.kind);
            }
        }

        let mut mem = vec![instr(0, 0); 8];
        mem[2] = instr(0, 5);
        let kinds = Rc::new(RefCell::new(Vec::new()));
        let mut reporters: Vec<Box<dyn Reporter>> =
            vec![Box::new(Counting { kinds: kinds.clone() })];
        evaluate(&mut mem, AddrMode::PredecB, 2, &ctx(0, 8), &mut reporters);

        let kinds = kinds.borrow();
        assert!(kinds.contains(&ReportKind::WarriorDecrement));
        assert!(kinds.contains(&ReportKind::WarriorRead));
    }
}

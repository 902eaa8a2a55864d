//! End-to-end scenarios spanning `redcode`, `redcode-parser`, and
//! `corewar-sim` together, plus the cross-crate properties none of those
//! crates can state as a unit test on their own (round-trip, symbol-table
//! idempotence, cycle detection).
//!
//! Mirrors the teacher's own `redcode_algebra`/`imp_test` split: crate-local
//! invariants stay in `#[cfg(test)]` modules, and whole-pipeline behavior
//! lives here.

use coverage_helper::test;
use corewar_sim::config::SimulatorConfig;
use corewar_sim::simulator::{MatchOutcome, Simulator};
use redcode::address;
use redcode::{AddrMode, CompleteInstruction, Instruction, Modifier, Opcode, Standard, WarriorData};
use redcode_parser::{compile, CompileConfig, ParseOptions};

fn config(standard: Standard, core_size: u32, max_length: u32, min_distance: u32) -> CompileConfig {
    CompileConfig {
        standard,
        core_size,
        max_length,
        max_processes: core_size,
        min_distance,
    }
}

/// Scenario 1: the one-instruction Imp under ICWS'94, run to completion in
/// an 8000-word core.
#[test]
fn imp_fills_the_core() {
    let source = "MOV.I #0, $1\n";
    let warrior = compile(source, &config(Standard::Icws94, 8000, 100, 100)).unwrap();
    assert_eq!(warrior.code.len(), 1);
    assert_eq!(
        warrior.code[0],
        CompleteInstruction {
            instr: Instruction {
                opcode: Opcode::Mov,
                modifier: Modifier::I,
                a_addr_mode: AddrMode::Immediate,
                b_addr_mode: AddrMode::Direct,
            },
            a_field: 0,
            b_field: 1,
        }
    );

    let sim_config = SimulatorConfig {
        standard: Standard::Icws94,
        core_size: 8000,
        max_processes: 8000,
        max_cycles: 8000,
        max_length: 100,
        min_distance: 100,
        read_limit: 8000,
        write_limit: 8000,
        legacy_fold: false,
    };
    let mut sim = Simulator::new(sim_config);
    let index = sim.add_warrior(warrior.clone());
    sim.spawn_warrior(index, 0);
    for _ in 0..8000 {
        sim.run_cycle();
    }
    for addr in 0..8000 {
        assert_eq!(sim.core()[addr as usize], warrior.code[0], "address {addr} was not overwritten by the imp");
    }
}

/// Scenario 2: the literal Dwarf from the spec, run for exactly 4
/// executions by its single warrior.
#[test]
fn dwarf_bombs_every_fourth_address() {
    let source = "\
ADD #4, $3
MOV $2, @2
JMP $-2, $0
DAT #0, #0
";
    let warrior = compile(source, &config(Standard::Icws88, 8000, 100, 100)).unwrap();
    assert_eq!(warrior.code.len(), 4);

    let sim_config = SimulatorConfig {
        standard: Standard::Icws88,
        core_size: 8000,
        max_processes: 8000,
        max_cycles: 80_000,
        max_length: 100,
        min_distance: 100,
        read_limit: 8000,
        write_limit: 8000,
        legacy_fold: true,
    };
    let mut sim = Simulator::new(sim_config);
    let index = sim.add_warrior(warrior);
    sim.spawn_warrior(index, 0);

    for _ in 0..4 {
        sim.run_cycle();
    }
    assert_eq!(sim.core()[3].b_field, 8);
    assert_eq!(sim.core()[7].b_field, 4);
}

/// Scenario 3: a single `for` loop expands to the literal instruction
/// sequence from the spec, including the negative offsets folding modulo
/// the core size.
#[test]
fn single_for_loop_expands_to_three_iterations() {
    let source = "\
dat 123, 123
i j for 3
dat i, j
rof
dat 123, 123
";
    let warrior = compile(source, &config(Standard::Icws94, 8000, 100, 100)).unwrap();
    let fields: Vec<(u32, u32)> = warrior.code.iter().map(|c| (c.a_field, c.b_field)).collect();
    assert_eq!(
        fields,
        vec![(123, 123), (0, 1), (7999, 2), (7998, 3), (123, 123)]
    );
}

/// Scenario 4: an assertion that holds compiles successfully.
#[test]
fn passing_assert_compiles() {
    let source = ";assert CORESIZE == 8000\ndat.f $123, $123\n";
    let warrior = compile(source, &config(Standard::Icws94, 8000, 100, 100)).unwrap();
    assert_eq!(
        warrior.code,
        vec![CompleteInstruction {
            instr: Instruction {
                opcode: Opcode::Dat,
                modifier: Modifier::F,
                a_addr_mode: AddrMode::Direct,
                b_addr_mode: AddrMode::Direct,
            },
            a_field: 123,
            b_field: 123,
        }]
    );
}

/// Scenario 5: the same source fails to compile against a core size that
/// does not satisfy the assertion.
#[test]
fn failing_assert_is_rejected() {
    let source = ";assert CORESIZE == 8192\ndat.f $123, $123\n";
    assert!(compile(source, &config(Standard::Icws94, 8000, 100, 100)).is_err());
}

/// Scenario 6: a three-entry `equ` table with a cycle through `a`, `b`, and
/// `c` is reported as cyclic, naming the offending key in the error message.
#[test]
fn cyclic_equ_table_reports_the_cycle_key() {
    let source = "a equ b\nb equ c\nc equ b\ndat #a, #0\n";
    let err = compile(source, &config(Standard::Icws94, 8000, 100, 100)).unwrap_err();
    assert!(err.message.contains('b'), "expected the cycle key 'b' in: {}", err.message);
}

/// Round-trip: compiling a warrior, rendering each instruction as '94
/// loadfile text, and re-parsing that text yields an equal `code` sequence.
#[test]
fn compile_assemble_parse_round_trips() {
    let source = "\
ADD #4, $3
MOV $2, @2
JMP $-2, $0
DAT #0, #0
";
    let warrior = compile(source, &config(Standard::Icws88, 8000, 100, 100)).unwrap();
    let rendered: String = warrior
        .code
        .iter()
        .map(|instr| format!("{instr}\n"))
        .collect();
    let parsed = redcode_parser::parse(&rendered, ParseOptions::DEFAULT_OPTIONS).unwrap();
    let normalized: WarriorData = parsed.normalize(8000_u32);
    assert_eq!(normalized.code, warrior.code);
}

/// A `DAT.F <0, $0` self-executed on an otherwise empty core decrements and
/// reads its own B-field, leaving `mem[M-1].B = M-1`, and terminates the
/// warrior (a `DAT` always does).
#[test]
fn dat_with_predecrement_b_reads_its_own_decremented_field() {
    let core_size: u32 = 80;
    let sim_config = SimulatorConfig::preset("nopnano").unwrap();
    let mut sim = Simulator::new(sim_config);
    let warrior = WarriorData {
        code: vec![CompleteInstruction {
            instr: Instruction {
                opcode: Opcode::Dat,
                modifier: Modifier::F,
                a_addr_mode: AddrMode::PredecB,
                b_addr_mode: AddrMode::Direct,
            },
            a_field: 0,
            b_field: 0,
        }],
        ..WarriorData::default()
    };
    let index = sim.add_warrior(warrior);
    sim.spawn_warrior(index, core_size - 1);
    sim.run_cycle();
    let last = usize::try_from(core_size - 1).unwrap();
    assert_eq!(sim.core()[last].b_field, core_size - 1);
    assert!(!sim.warriors()[index].is_alive());
}

/// The mirror case: the predecrement is on the B-field instead of the
/// A-field, with the same resulting core state.
#[test]
fn dat_with_predecrement_b_on_b_field_reads_its_own_decremented_field() {
    let core_size: u32 = 80;
    let sim_config = SimulatorConfig::preset("nopnano").unwrap();
    let mut sim = Simulator::new(sim_config);
    let warrior = WarriorData {
        code: vec![CompleteInstruction {
            instr: Instruction {
                opcode: Opcode::Dat,
                modifier: Modifier::F,
                a_addr_mode: AddrMode::Direct,
                b_addr_mode: AddrMode::PredecB,
            },
            a_field: 0,
            b_field: 0,
        }],
        ..WarriorData::default()
    };
    let index = sim.add_warrior(warrior);
    sim.spawn_warrior(index, core_size - 1);
    sim.run_cycle();
    let last = usize::try_from(core_size - 1).unwrap();
    assert_eq!(sim.core()[last].b_field, core_size - 1);
}

/// `address::fold` never produces a value outside `[0, limit)`, across a
/// sweep of representative offsets and both fold-direction branches.
#[test]
fn fold_result_always_stays_within_limit() {
    let core_size = 8000_u32;
    let limit = 200_u32;
    for raw in [0_u32, 1, 99, 100, 101, 7998, 7999] {
        for legacy in [false, true] {
            let folded = address::fold(raw, limit, core_size, legacy);
            assert!(folded < limit, "fold({raw}, legacy={legacy}) = {folded} exceeded limit {limit}");
        }
    }
}

/// Two-character lexer operators are each a single token.
#[test]
fn two_character_operators_lex_as_one_token() {
    let tokens = redcode_parser::lex("a == b && c || d <= e >= f").unwrap();
    let symbols: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == redcode_parser::TokenKind::Symbol)
        .map(|t| t.lexeme.as_str())
        .collect();
    assert_eq!(symbols, vec!["==", "&&", "||", "<=", ">="]);
}

/// `1--1 == 2`: subtracting a negative literal adds, exercised through the
/// `;assert` expression evaluator.
#[test]
fn double_negative_subtraction_adds() {
    let source = ";assert 1--1 == 2\ndat #0, #0\n";
    assert!(compile(source, &config(Standard::Icws94, 8000, 100, 100)).is_ok());
}

/// For every input, `lex` either fails outright (a malformed two-character
/// operator) or produces a stream ending in exactly one `Eof` token.
#[test]
fn lex_always_terminates_cleanly_or_errors() {
    let inputs = [
        "",
        "dat #0, #0\n",
        "mov.i $0, $1 ; a comment\n",
        "a = b",
        "a = = b",
        "equ foo 1 + (2 * 3)\n",
        "^invalid byte^\n",
    ];
    for input in inputs {
        match redcode_parser::lex(input) {
            Ok(tokens) => {
                let eofs = tokens
                    .iter()
                    .filter(|t| t.kind == redcode_parser::TokenKind::Eof)
                    .count();
                assert_eq!(eofs, 1, "input {input:?} did not end in exactly one Eof");
                assert_eq!(tokens.last().unwrap().kind, redcode_parser::TokenKind::Eof);
            }
            Err(_) => {}
        }
    }
}

/// A warrior that never spawns never reports itself alive, and a two-warrior
/// match where one is a sole survivor reports that warrior's index.
#[test]
fn imp_defeats_a_lone_dat() {
    let imp = compile("MOV.I #0, $1\n", &config(Standard::Icws94, 80, 10, 5)).unwrap();
    let dat = compile("DAT.F #0, #0\n", &config(Standard::Icws94, 80, 10, 5)).unwrap();

    let sim_config = SimulatorConfig::preset("nopnano").unwrap();
    let mut sim = Simulator::new(sim_config);
    let imp_index = sim.add_warrior(imp);
    let dat_index = sim.add_warrior(dat);
    sim.spawn_warrior(imp_index, 0);
    sim.spawn_warrior(dat_index, 10);

    assert_eq!(sim.run(), MatchOutcome::Survivor(imp_index));
    assert!(!sim.warriors()[dat_index].is_alive());
}

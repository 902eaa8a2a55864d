// Make clippy as annoying as possible
#![deny(
    // All typically enabled warnings are converted into errors
    // includes correctness, suspicious, style, complexity, and perf
    clippy::all,
    // Error on cargo lints
    clippy::cargo,
)]
#![warn(
    // Warn on pedantic and in-development nursery lints
    clippy::pedantic,
    clippy::nursery,
    // Lints from "restriction" group - enforce a consistent if arbitrary style
    clippy::alloc_instead_of_core,
    clippy::arithmetic_side_effects,
    clippy::unnecessary_cast,
    clippy::as_underscore,
    clippy::assertions_on_result_states,
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::dbg_macro,
    clippy::decimal_literal_representation,
    clippy::default_numeric_fallback,
    clippy::deref_by_slicing,
    clippy::empty_drop,
    clippy::empty_structs_with_brackets,
    clippy::exit,
    clippy::expect_used,
    clippy::filetype_is_file,
    clippy::float_arithmetic,
    clippy::fn_to_numeric_cast_any,
    clippy::format_push_string,
    clippy::get_unwrap,
    clippy::if_then_some_else_none,
    clippy::indexing_slicing,
    clippy::large_include_file,
    clippy::let_underscore_must_use,
    clippy::lossy_float_literal,
    clippy::map_err_ignore,
    clippy::mem_forget,
    clippy::missing_docs_in_private_items,
    clippy::missing_enforced_import_renames,
    clippy::mixed_read_write_in_expression,
    clippy::mod_module_files,
    clippy::multiple_inherent_impl,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::partial_pub_fields,
    clippy::pattern_type_mismatch,
    clippy::print_stderr,
    clippy::print_stdout,
    clippy::rc_buffer,
    clippy::rc_mutex,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_name_method,
    clippy::unseparated_literal_suffix,
    clippy::shadow_unrelated,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::str_to_string,
    clippy::string_slice,
    clippy::string_to_string,
    clippy::suspicious_xor_used_as_pow,
    clippy::todo,
    clippy::try_err,
    clippy::undocumented_unsafe_blocks,
    clippy::unimplemented,
    clippy::unnecessary_safety_comment,
    clippy::unnecessary_safety_doc,
    clippy::unnecessary_self_imports,
    clippy::unneeded_field_pattern,
    clippy::unreachable,
    clippy::unwrap_in_result,
    clippy::unwrap_used,
    clippy::use_debug,
    clippy::verbose_file_reads,
)]
#![allow(
    clippy::needless_pass_by_value,
    reason = "Internal Compiler Error bug workaround: https://github.com/rust-lang/rust-clippy/issues/10344"
)]

//! The MARS execution engine for CoreWar redcode warriors.
//!
//! Where [`marzipan_core`](../marzipan_core/index.html) provides a low-level,
//! per-instruction bytecode interface meant to be embedded in a faster or more
//! specialized emulator, `corewar-sim` is the full match runner: a core with
//! independent read/write fold limits, a reporter fan-out, a state-recording
//! reporter, and the warrior-placement/round-loop layer a CLI or tournament
//! driver needs. It operates directly on [`redcode::CompleteInstruction`]
//! values rather than an opaque bytecode, since the read/write limit split
//! and the historic fold-direction branch (§9 of the design notes) need to
//! reach all the way down to operand evaluation.
//!
//! ```rust
//! use corewar_sim::config::SimulatorConfig;
//! use corewar_sim::simulator::{MatchOutcome, Simulator};
//! use redcode::{AddrMode, CompleteInstruction, Instruction, Modifier, Opcode, WarriorData};
//!
//! let config = SimulatorConfig::preset("nopnano").unwrap();
//! let mut sim = Simulator::new(config);
//! let imp = WarriorData {
//!     code: vec![CompleteInstruction {
//!         instr: Instruction {
//!             opcode: Opcode::Mov,
//!             modifier: Modifier::I,
//!             a_addr_mode: AddrMode::Direct,
//!             b_addr_mode: AddrMode::Direct,
//!         },
//!         a_field: 0,
//!         b_field: 1,
//!     }],
//!     ..WarriorData::default()
//! };
//! let index = sim.add_warrior(imp);
//! sim.spawn_warrior(index, 0);
//! assert_eq!(sim.run(), MatchOutcome::Tie);
//! ```

/// Simulator configuration: the §6.3 presets, validation, and the resolved
/// `legacy_fold`/standard behavior branches.
pub mod config;

/// The event stream a running [`simulator::Simulator`] emits, and the
/// [`report::Reporter`] capability external observers implement.
pub mod report;

/// A warrior's runtime state inside a running match: placement, process
/// queue, and lifecycle.
pub mod warrior;

/// Operand evaluation: the read/write pointer fold, indirection rechasing,
/// and pre-decrement/post-increment side effects.
pub mod operand_fetch;

/// Opcode dispatch: combining operands, writing the destination, and
/// choosing what to requeue.
pub mod dispatch;

/// The memory array, warrior registry, round-robin scheduler, and public
/// match-running API.
pub mod simulator;

/// A reporter that projects the event stream into a per-address
/// `(state, warrior)` snapshot, for debug displays and visualizers.
pub mod state_recorder;

/// Warrior placement, the round loop, and win/tie/loss tallying.
pub mod orchestration;

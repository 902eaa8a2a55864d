//! Top-level compilation entry point: lex, scan, for-expand, parse, resolve,
//! and assemble a complete [`WarriorData`].

use std::collections::HashMap;

use redcode::{
    address::reduce, default_modifiers, AddrMode, CompleteInstruction, Instruction, Modifier,
    Opcode, Standard, WarriorData,
};

use crate::error::CompileError;
use crate::expr::{self, evaluate, substitute_symbols};
use crate::lexer::lex;
use crate::parser::{parse_lines, SourceLineKind};
use crate::symbol_scanner::scan_symbols;
use crate::token::{split_lines, Token, TokenKind};
use crate::for_expander::expand_for_loops;

/// Above this many scan/expand rounds, a `for` block is assumed to be
/// expanding forever rather than converging (e.g. a loop whose body
/// introduces a new, larger `for` block on every round).
const MAX_FOR_ROUNDS: u32 = 12;

/// The preset values a warrior is compiled against. Distinct from
/// `corewar-sim::SimulatorConfig` so this crate never depends on the
/// simulator crate — only the four constants a source file can reference by
/// name are needed here.
#[derive(Copy, Clone, Debug)]
pub struct CompileConfig {
    /// Which standard's opcode/addressing-mode set and default operand
    /// modes apply.
    pub standard: Standard,
    /// The `CORESIZE` constant, and the modulus every field is reduced by.
    pub core_size: u32,
    /// The `MAXLENGTH` constant: the maximum number of instructions a
    /// warrior's code may contain.
    pub max_length: u32,
    /// The `MAXPROCESSES` constant.
    pub max_processes: u32,
    /// The `MINDISTANCE` constant.
    pub min_distance: u32,
}

/// Compile Redcode source into a [`WarriorData`].
///
/// Runs the full pipeline: lexing, a symbol-scan/for-expansion loop (capped
/// at [`MAX_FOR_ROUNDS`] rounds), token-stream parsing, label and constant
/// resolution, opmode inference, and `;assert` evaluation.
///
/// # Errors
///
/// Fails with a single [`CompileError`] on the first problem found: a
/// lexical error, an unmatched `for`/`rof`, a redefined or undefined symbol,
/// a `for` nesting that never stabilizes, an unsupported opcode or
/// addressing mode for `config.standard`, a warrior longer than
/// `config.max_length`, or a failed `;assert`.
pub fn compile(source: &str, config: &CompileConfig) -> Result<WarriorData, CompileError> {
    let tokens = lex(source)?;
    let mut lines = split_lines(&tokens);

    let symbols = {
        let mut round = 0;
        loop {
            let symbols = scan_symbols(&lines)?;
            if !symbols.saw_for {
                break symbols;
            }
            round += 1;
            if round > MAX_FOR_ROUNDS {
                return Err(CompileError::new(
                    0,
                    "'for' expansion did not converge within the maximum nesting depth",
                ));
            }
            lines = expand_for_loops(&lines, &symbols)?;
        }
    };

    let parsed = parse_lines(&lines)?;
    let equs = expr::expand_symbols(&symbols.equs)?;

    if parsed.code_line_count > config.max_length as usize {
        return Err(CompileError::new(
            0,
            format!(
                "warrior has {} instructions, exceeding the maximum of {}",
                parsed.code_line_count, config.max_length
            ),
        ));
    }

    let mut code = Vec::with_capacity(parsed.code_line_count);
    for line in &parsed.lines {
        if line.kind != SourceLineKind::Instruction {
            continue;
        }
        let code_line = line.code_line.expect("instruction lines carry a code_line");
        let op_tok = line.op.as_ref().expect("instruction lines carry an op token");
        let (opcode, explicit_modifier) = parse_op(op_tok, line.line_number)?;
        if !config.standard.supports_opcode(opcode) {
            return Err(CompileError::new(
                line.line_number,
                format!("opcode '{opcode}' is not supported under {:?}", config.standard),
            ));
        }
        if explicit_modifier.is_some() && matches!(config.standard, Standard::Icws88) {
            return Err(CompileError::new(
                line.line_number,
                "explicit '.modifier' suffixes are not supported under Icws88",
            ));
        }

        let a_mode = resolve_mode(line.a_mode, config.standard, line.line_number)?;
        let b_mode = resolve_mode(line.b_mode, config.standard, line.line_number)?;

        let a_field = resolve_expr(
            &line.a_tokens,
            &equs,
            &parsed.label_lines,
            Some(code_line),
            config,
            line.line_number,
        )?;
        let b_field = resolve_expr(
            &line.b_tokens,
            &equs,
            &parsed.label_lines,
            Some(code_line),
            config,
            line.line_number,
        )?;

        let modifier = explicit_modifier.unwrap_or_else(|| default_modifiers(opcode, a_mode, b_mode));

        code.push(CompleteInstruction {
            instr: Instruction {
                opcode,
                modifier,
                a_addr_mode: a_mode,
                b_addr_mode: b_mode,
            },
            a_field: reduce(a_field, config.core_size),
            b_field: reduce(b_field, config.core_size),
        });
    }

    for (line_number, tokens) in &parsed.asserts {
        let value = resolve_expr(tokens, &equs, &parsed.label_lines, None, config, *line_number)?;
        if value == 0 {
            return Err(CompileError::new(*line_number, "assertion failed"));
        }
    }

    let start = match &parsed.end_expr {
        Some(tokens) => {
            let line_number = tokens.first().map_or(0, |t| t.line);
            resolve_expr(tokens, &equs, &parsed.label_lines, None, config, line_number)?
        }
        None => match &parsed.org {
            Some(tokens) => {
                let line_number = tokens.first().map_or(0, |t| t.line);
                resolve_expr(tokens, &equs, &parsed.label_lines, None, config, line_number)?
            }
            None => 0,
        },
    };

    if code.is_empty() {
        return Err(CompileError::new(0, "warrior has no instructions"));
    }

    Ok(WarriorData {
        name: parsed.name,
        author: parsed.author,
        strategy: parsed.strategy,
        code,
        start: reduce(start, config.core_size),
    })
}

/// Split an op token's lexeme into its opcode and an explicit modifier, if
/// one was given as a `.suffix`.
fn parse_op(tok: &Token, line: usize) -> Result<(Opcode, Option<Modifier>), CompileError> {
    let upper = tok.lexeme.to_ascii_uppercase();
    let (mnemonic, suffix) = upper.split_once('.').map_or((upper.as_str(), None), |(m, s)| (m, Some(s)));
    let opcode = match mnemonic {
        "DAT" => Opcode::Dat,
        "MOV" => Opcode::Mov,
        "ADD" => Opcode::Add,
        "SUB" => Opcode::Sub,
        "MUL" => Opcode::Mul,
        "DIV" => Opcode::Div,
        "MOD" => Opcode::Mod,
        "JMP" => Opcode::Jmp,
        "JMZ" => Opcode::Jmz,
        "JMN" => Opcode::Jmn,
        "DJN" => Opcode::Djn,
        "SPL" => Opcode::Spl,
        "SLT" => Opcode::Slt,
        "CMP" => Opcode::Cmp,
        "SEQ" => Opcode::Seq,
        "SNE" => Opcode::Sne,
        "NOP" => Opcode::Nop,
        other => return Err(CompileError::new(line, format!("unrecognized opcode '{other}'"))),
    };
    let modifier = match suffix {
        None => None,
        Some("A") => Some(Modifier::A),
        Some("B") => Some(Modifier::B),
        Some("AB") => Some(Modifier::AB),
        Some("BA") => Some(Modifier::BA),
        Some("F") => Some(Modifier::F),
        Some("X") => Some(Modifier::X),
        Some("I") => Some(Modifier::I),
        Some(other) => {
            return Err(CompileError::new(line, format!("unrecognized modifier '.{other}'")))
        }
    };
    Ok((opcode, modifier))
}

/// Resolve an operand's address-mode marker, falling back to the standard's
/// default when none was given.
fn resolve_mode(
    mode: Option<char>,
    standard: Standard,
    line: usize,
) -> Result<AddrMode, CompileError> {
    let resolved = match mode {
        None => standard.default_operand_mode(),
        Some('#') => AddrMode::Immediate,
        Some('$') => AddrMode::Direct,
        Some('*') => AddrMode::IndirectA,
        Some('@') => AddrMode::IndirectB,
        Some('{') => AddrMode::PredecA,
        Some('<') => AddrMode::PredecB,
        Some('}') => AddrMode::PostincA,
        Some('>') => AddrMode::PostincB,
        Some(other) => {
            return Err(CompileError::new(line, format!("unrecognized addressing mode '{other}'")))
        }
    };
    if !standard.supports_addr_mode(resolved) {
        return Err(CompileError::new(
            line,
            format!("addressing mode '{resolved}' is not supported under {standard:?}"),
        ));
    }
    Ok(resolved)
}

/// The named preset constants a source file may reference directly.
fn preset_constant(name: &str, config: &CompileConfig) -> Option<i64> {
    match name.to_ascii_uppercase().as_str() {
        "CORESIZE" => Some(i64::from(config.core_size)),
        "MAXLENGTH" => Some(i64::from(config.max_length)),
        "MAXPROCESSES" => Some(i64::from(config.max_processes)),
        "MINDISTANCE" => Some(i64::from(config.min_distance)),
        _ => None,
    }
}

/// Substitute equs, preset constants, and label references into `tokens`,
/// then evaluate to an integer.
///
/// A label substitutes to the signed distance from `current_code_line` (the
/// form instructions reference each other in), or its absolute code line
/// when `current_code_line` is `None` (the form `org`/`end`/`;assert` use).
fn resolve_expr(
    tokens: &[Token],
    equs: &HashMap<String, Vec<Token>>,
    labels: &HashMap<String, usize>,
    current_code_line: Option<usize>,
    config: &CompileConfig,
    line: usize,
) -> Result<i64, CompileError> {
    let substituted = substitute_symbols(tokens, equs);
    let mut resolved = Vec::with_capacity(substituted.len());
    for tok in substituted {
        if tok.kind != TokenKind::Text {
            resolved.push(tok);
            continue;
        }
        if let Some(value) = preset_constant(&tok.lexeme, config) {
            resolved.push(Token::new(TokenKind::Number, value.to_string(), tok.line));
            continue;
        }
        let Some(&label_line) = labels.get(&tok.lexeme) else {
            return Err(CompileError::new(
                tok.line,
                format!("undefined symbol '{}'", tok.lexeme),
            ));
        };
        #[allow(clippy::cast_possible_wrap, reason = "code lines never approach i64::MAX")]
        let delta = match current_code_line {
            Some(cur) => label_line as i64 - cur as i64,
            None => label_line as i64,
        };
        if delta.is_negative() {
            resolved.push(Token::new(TokenKind::Symbol, "-", tok.line));
            resolved.push(Token::new(TokenKind::Number, (-delta).to_string(), tok.line));
        } else {
            resolved.push(Token::new(TokenKind::Number, delta.to_string(), tok.line));
        }
    }
    evaluate(&resolved, line)
}

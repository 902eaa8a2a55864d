//! First compiler pass: collect `equ` definitions.
//!
//! Runs once before for-expansion and again after each expansion round (see
//! `compile::compile`), since a `for` block can itself contain `equ`
//! definitions that only become top-level once expanded.

use std::collections::HashMap;

use crate::error::CompileError;
use crate::token::{Token, TokenKind};

/// The raw (unexpanded) symbol table produced by a scanning pass, plus a
/// flag recording whether any `for` pseudo-op was seen — the signal the
/// for-expander uses to decide whether a round did anything.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    /// Label name to its unexpanded value token sequence.
    pub equs: HashMap<String, Vec<Token>>,
    /// Whether a `for` pseudo-op was encountered anywhere in this pass.
    pub saw_for: bool,
}

/// Scan `lines` (as produced by [`crate::token::split_lines`]) for `equ`
/// definitions.
///
/// Labels defined inside a `for ... rof` block are skipped — the expander
/// resolves those fresh on every iteration, so binding them here would wire
/// every iteration to the first one's value.
///
/// # Errors
///
/// Fails with `symbol redefined` if the same top-level label is assigned
/// more than once.
pub fn scan_symbols(lines: &[Vec<Token>]) -> Result<SymbolTable, CompileError> {
    let mut table = SymbolTable::default();
    let mut label_buffer: Vec<String> = Vec::new();
    let mut for_level: u32 = 0;

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let mut idx = 0;
        while idx < line.len()
            && line[idx].kind == TokenKind::Text
            && !line[idx].is_op()
            && !line[idx].is_pseudo_op()
        {
            label_buffer.push(line[idx].lexeme.clone());
            idx += 1;
        }
        let Some(op_tok) = line.get(idx) else {
            // Label-only line: keep accumulating.
            continue;
        };
        if op_tok.kind == TokenKind::Comment {
            continue;
        }

        if op_tok.is_pseudo_op() {
            match op_tok.lexeme.to_ascii_uppercase().as_str() {
                "FOR" => {
                    table.saw_for = true;
                    for_level = for_level.saturating_add(1);
                    label_buffer.clear();
                }
                "ROF" => {
                    for_level = for_level.saturating_sub(1);
                    label_buffer.clear();
                }
                "END" if for_level == 0 => break,
                "EQU" => {
                    let mut value = Vec::new();
                    for tok in &line[idx.saturating_add(1)..] {
                        if tok.kind == TokenKind::Comment {
                            break;
                        }
                        value.push(tok.clone());
                    }
                    if for_level == 0 {
                        for label in &label_buffer {
                            if table.equs.contains_key(label) {
                                return Err(CompileError::new(
                                    op_tok.line,
                                    format!("symbol '{label}' redefined"),
                                ));
                            }
                            table.equs.insert(label.clone(), value.clone());
                        }
                    }
                    label_buffer.clear();
                }
                _ => label_buffer.clear(),
            }
        } else {
            label_buffer.clear();
        }
    }

    Ok(table)
}

//! Second-to-last compiler pass: turn a (for-expanded) token stream into
//! [`SourceLine`]s plus the warrior metadata carried in `;name`/`;author`/
//! `;strategy`/`;assert` comments.
//!
//! Runs after symbol scanning and for-expansion, on the same line-grouped
//! token buffer those passes consume. `equ` lines are recognized here (so
//! they don't get mistaken for instructions) but produce no [`SourceLine`];
//! their values were already captured by [`crate::symbol_scanner`].

use std::collections::HashMap;

use crate::error::CompileError;
use crate::lexer::lex;
use crate::token::{Token, TokenKind};

/// Coarse classification of a parsed source line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SourceLineKind {
    /// A blank line, or one holding only labels awaiting a later op.
    Empty,
    /// A line that emits one instruction.
    Instruction,
    /// `equ`, `org`, `end`, `for`, `rof`.
    PseudoOp,
    /// A line containing only a comment.
    Comment,
}

/// One parsed line of Redcode source.
#[derive(Clone, Debug)]
pub struct SourceLine {
    /// 1-based line number in the (possibly for-expanded) token stream.
    pub line_number: usize,
    /// 0-based index into the final emitted code, if this line emits one.
    pub code_line: Option<usize>,
    /// What kind of line this is.
    pub kind: SourceLineKind,
    /// Labels bound to this line (including any carried over from preceding
    /// label-only lines).
    pub labels: Vec<String>,
    /// The op or pseudo-op token, if any.
    pub op: Option<Token>,
    /// The A-operand's address-mode marker, if explicit.
    pub a_mode: Option<char>,
    /// The A-operand's (unevaluated) expression tokens.
    pub a_tokens: Vec<Token>,
    /// The B-operand's address-mode marker, if explicit.
    pub b_mode: Option<char>,
    /// The B-operand's (unevaluated) expression tokens.
    pub b_tokens: Vec<Token>,
    /// The comment text on this line, if any (without the leading `;`).
    pub comment: Option<String>,
}

/// The lines plus metadata and held directives produced by a parsing pass.
#[derive(Clone, Debug, Default)]
pub struct ParsedSource {
    /// Every line, in source order.
    pub lines: Vec<SourceLine>,
    /// Label name to the 0-based `code_line` it resolves to, including
    /// labels bound to a trailing `end` (which resolve to `code_line_count`).
    pub label_lines: HashMap<String, usize>,
    /// The number of `Instruction` lines (the length of the emitted code).
    pub code_line_count: usize,
    /// Set by `;name`.
    pub name: String,
    /// Set by `;author`.
    pub author: String,
    /// Accumulated (with trailing newlines) by `;strategy`.
    pub strategy: String,
    /// `(line_number, expr_tokens)` for every `;assert` comment encountered.
    pub asserts: Vec<(usize, Vec<Token>)>,
    /// The most recently seen `org <expr>` expression, if any.
    pub org: Option<Vec<Token>>,
    /// The `end [<expr>]` expression, if `end` provided one.
    pub end_expr: Option<Vec<Token>>,
}

/// Collect the leading label run of a line, returning the index of the
/// first non-label token.
fn leading_labels(line: &[Token]) -> (Vec<String>, usize) {
    let mut labels = Vec::new();
    let mut idx = 0;
    while idx < line.len()
        && line[idx].kind == TokenKind::Text
        && !line[idx].is_op()
        && !line[idx].is_pseudo_op()
    {
        labels.push(line[idx].lexeme.clone());
        idx += 1;
    }
    (labels, idx)
}

/// Split an operand's tokens into an optional leading address-mode marker
/// and the remaining expression tokens.
fn split_operand(tokens: &[Token]) -> (Option<char>, Vec<Token>) {
    match tokens.first() {
        Some(tok) if tok.is_address_mode() => (
            tok.lexeme.chars().next(),
            tokens.get(1..).unwrap_or_default().to_vec(),
        ),
        _ => (None, tokens.to_vec()),
    }
}

/// A directive recognized inside a `;`-comment body.
enum Metadata {
    /// `;name <text>`
    Name(String),
    /// `;author <text>`
    Author(String),
    /// `;strategy <text>`
    Strategy(String),
    /// `;assert <expr>`, already re-lexed into expression tokens.
    Assert(Vec<Token>),
    /// Any other comment; carries no metadata.
    None,
}

/// Parse a metadata comment's body (text after `;`, before any trailing
/// newline) into a directive, if it is one of `name`/`author`/`strategy`/
/// `assert`.
fn classify_comment(body: &str, line: usize) -> Result<Metadata, CompileError> {
    let trimmed = body.strip_prefix(';').unwrap_or(body).trim_start();
    let (head, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let rest = rest.trim();
    match head.to_ascii_lowercase().as_str() {
        "name" => Ok(Metadata::Name(rest.to_owned())),
        "author" => Ok(Metadata::Author(rest.to_owned())),
        "strategy" => Ok(Metadata::Strategy(rest.to_owned())),
        "assert" => {
            let mut tokens = lex(rest)?;
            tokens.retain(|t| {
                !matches!(t.kind, TokenKind::Newline | TokenKind::Eof)
            });
            for tok in &mut tokens {
                tok.line = line;
            }
            Ok(Metadata::Assert(tokens))
        }
        _ => Ok(Metadata::None),
    }
}

/// Parse `lines` (for-expanded, as produced by [`crate::token::split_lines`])
/// into [`ParsedSource`].
///
/// # Errors
///
/// Fails if an instruction line is missing its A-operand, or if a pseudo-op
/// other than the recognized set appears where an op was expected.
pub fn parse_lines(lines: &[Vec<Token>]) -> Result<ParsedSource, CompileError> {
    let mut out = ParsedSource::default();
    let mut label_buffer: Vec<String> = Vec::new();
    let mut for_level: u32 = 0;

    for line in lines {
        let line_number = line.first().map_or(0, |t| t.line);
        if line.is_empty() {
            out.lines.push(SourceLine {
                line_number,
                code_line: None,
                kind: SourceLineKind::Empty,
                labels: Vec::new(),
                op: None,
                a_mode: None,
                a_tokens: Vec::new(),
                b_mode: None,
                b_tokens: Vec::new(),
                comment: None,
            });
            continue;
        }

        let (mut labels, idx) = leading_labels(line);
        let Some(op_tok) = line.get(idx) else {
            // Label-only line: carry the labels forward to the next op.
            label_buffer.extend(labels);
            continue;
        };

        if op_tok.kind == TokenKind::Comment {
            if let Metadata::Assert(tokens) = classify_comment(&op_tok.lexeme, line_number)? {
                out.asserts.push((line_number, tokens));
            } else {
                match classify_comment(&op_tok.lexeme, line_number)? {
                    Metadata::Name(n) => out.name = n,
                    Metadata::Author(a) => out.author = a,
                    Metadata::Strategy(s) => {
                        out.strategy.push_str(&s);
                        out.strategy.push('\n');
                    }
                    Metadata::Assert(_) | Metadata::None => {}
                }
            }
            out.lines.push(SourceLine {
                line_number,
                code_line: None,
                kind: SourceLineKind::Comment,
                labels: std::mem::take(&mut label_buffer),
                op: None,
                a_mode: None,
                a_tokens: Vec::new(),
                b_mode: None,
                b_tokens: Vec::new(),
                comment: Some(op_tok.lexeme.clone()),
            });
            continue;
        }

        labels = {
            let mut carried = std::mem::take(&mut label_buffer);
            carried.extend(labels);
            carried
        };

        if op_tok.is_pseudo_op() {
            let mnemonic = op_tok.lexeme.to_ascii_uppercase();
            let rest: Vec<Token> = line
                .get(idx.saturating_add(1)..)
                .unwrap_or_default()
                .iter()
                .filter(|t| t.kind != TokenKind::Comment)
                .cloned()
                .collect();
            match mnemonic.as_str() {
                "FOR" => for_level = for_level.saturating_add(1),
                "ROF" => for_level = for_level.saturating_sub(1),
                "EQU" => {}
                "ORG" => out.org = Some(rest),
                "END" if for_level == 0 => {
                    for label in &labels {
                        out.label_lines
                            .entry(label.clone())
                            .or_insert(out.code_line_count);
                    }
                    if !rest.is_empty() {
                        out.end_expr = Some(rest);
                    }
                    out.lines.push(SourceLine {
                        line_number,
                        code_line: None,
                        kind: SourceLineKind::PseudoOp,
                        labels,
                        op: Some(op_tok.clone()),
                        a_mode: None,
                        a_tokens: Vec::new(),
                        b_mode: None,
                        b_tokens: Vec::new(),
                        comment: None,
                    });
                    break;
                }
                _ => {}
            }
            out.lines.push(SourceLine {
                line_number,
                code_line: None,
                kind: SourceLineKind::PseudoOp,
                labels,
                op: Some(op_tok.clone()),
                a_mode: None,
                a_tokens: Vec::new(),
                b_mode: None,
                b_tokens: Vec::new(),
                comment: None,
            });
            continue;
        }

        // An instruction line.
        for label in &labels {
            out.label_lines
                .entry(label.clone())
                .or_insert(out.code_line_count);
        }

        let rest = line.get(idx.saturating_add(1)..).unwrap_or_default();
        let comma_pos = rest.iter().position(|t| t.kind == TokenKind::Comma);
        let (a_raw, b_raw) = comma_pos.map_or_else(
            || (rest, &rest[0..0]),
            |pos| (&rest[..pos], &rest[pos.saturating_add(1)..]),
        );
        let a_raw: Vec<Token> = a_raw
            .iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .cloned()
            .collect();
        let b_raw: Vec<Token> = b_raw
            .iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .cloned()
            .collect();
        if a_raw.is_empty() {
            return Err(CompileError::new(
                line_number,
                "instruction is missing its A-operand",
            ));
        }

        let is_dat = op_tok.lexeme.to_ascii_uppercase().starts_with("DAT");
        let ((a_mode, a_tokens), (b_mode, b_tokens)) = if b_raw.is_empty() && is_dat {
            (
                (Some('#'), vec![Token::new(TokenKind::Number, "0", line_number)]),
                split_operand(&a_raw),
            )
        } else if b_raw.is_empty() {
            (
                split_operand(&a_raw),
                (None, vec![Token::new(TokenKind::Number, "0", line_number)]),
            )
        } else {
            (split_operand(&a_raw), split_operand(&b_raw))
        };

        out.lines.push(SourceLine {
            line_number,
            code_line: Some(out.code_line_count),
            kind: SourceLineKind::Instruction,
            labels,
            op: Some(op_tok.clone()),
            a_mode,
            a_tokens,
            b_mode,
            b_tokens,
            comment: None,
        });
        out.code_line_count = out.code_line_count.saturating_add(1);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::*;
    use crate::lexer::lex;
    use crate::token::split_lines;

    fn parse(src: &str) -> ParsedSource {
        let tokens = lex(src).unwrap();
        parse_lines(&split_lines(&tokens)).unwrap()
    }

    #[test]
    fn dat_with_single_operand_migrates_to_b_field() {
        let parsed = parse("dat #4\n");
        let line = &parsed.lines[0];
        assert_eq!(line.kind, SourceLineKind::Instruction);
        assert_eq!(line.a_mode, Some('#'));
        assert_eq!(line.a_tokens[0].lexeme, "0");
        assert_eq!(line.b_mode, Some('#'));
        assert_eq!(line.b_tokens[0].lexeme, "4");
    }

    #[test]
    fn label_binds_to_the_following_instruction() {
        let parsed = parse("loop mov $0, $1\njmp loop\n");
        assert_eq!(parsed.label_lines["loop"], 0);
    }

    #[test]
    fn end_label_binds_to_the_code_line_count() {
        let parsed = parse("dat #0, #0\ndone end\n");
        assert_eq!(parsed.label_lines["done"], 1);
    }

    #[test]
    fn metadata_comments_are_captured() {
        let parsed = parse(";name Imp\n;author mice\n;strategy eats\n;strategy more\ndat #0, #0\n");
        assert_eq!(parsed.name, "Imp");
        assert_eq!(parsed.author, "mice");
        assert_eq!(parsed.strategy, "eats\nmore\n");
    }

    #[test]
    fn assert_comment_is_held_as_tokens() {
        let parsed = parse(";assert CORESIZE == 8000\ndat #0, #0\n");
        assert_eq!(parsed.asserts.len(), 1);
        assert_eq!(parsed.asserts[0].1[0].lexeme, "CORESIZE");
    }

    #[test]
    fn missing_a_operand_is_an_error() {
        let tokens = lex("mov\n").unwrap();
        assert!(parse_lines(&split_lines(&tokens)).is_err());
    }
}

//! Macro-expansion of `[labels] for <expr> ... rof` blocks.

use std::collections::HashSet;

use crate::error::CompileError;
use crate::expr::{self, substitute_symbols};
use crate::symbol_scanner::SymbolTable;
use crate::token::{Token, TokenKind};

/// Expand every top-level `for`/`rof` block in `lines` once.
///
/// Nested `for`/`rof` pairs are tracked by depth: an inner `for` increments
/// depth, an inner `rof` decrements it, and only the `rof` that returns depth
/// to zero closes the block being expanded here. Callers (`compile::compile`)
/// re-run a fresh symbol scan and another expansion pass afterward, since
/// expanding one level can reveal further `for` blocks that were themselves
/// inside an `equ` value or a nested loop body.
///
/// # Errors
///
/// Fails on an unmatched `for` (no closing `rof` before end of input), an
/// unmatched `rof` (no enclosing `for`), or a loop count that fails to
/// evaluate to a non-negative integer.
pub fn expand_for_loops(
    lines: &[Vec<Token>],
    symbols: &SymbolTable,
) -> Result<Vec<Vec<Token>>, CompileError> {
    let expanded_equs = expr::expand_symbols(&symbols.equs)?;
    let mut output = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        if let Some(header) = detect_for_line(line) {
            let mut depth: i32 = 1;
            let mut j = i + 1;
            while j < lines.len() && depth > 0 {
                if is_for_line(&lines[j]) {
                    depth += 1;
                } else if is_rof_line(&lines[j]) {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                j += 1;
            }
            if depth != 0 {
                return Err(CompileError::new(header.tok.line, "unmatched 'for'"));
            }
            let body = &lines[i.saturating_add(1)..j];

            let count_tokens = substitute_symbols(&header.count_expr, &expanded_equs);
            let count = expr::evaluate(&count_tokens, header.tok.line)?;
            if count < 0 {
                return Err(CompileError::new(
                    header.tok.line,
                    "'for' count must not be negative",
                ));
            }

            let counter_label = header.labels.last().cloned();
            let per_iteration_labels: Vec<String> = header
                .labels
                .iter()
                .rev()
                .skip(1)
                .cloned()
                .collect();

            // Every mangled per-iteration label needs exactly one definition
            // (a leading label on the first iteration-1 line that mentions
            // it), since the original `for`-header line that carried the
            // unmangled label is discarded and never reaches `parser.rs`.
            let mut labels_awaiting_definition: HashSet<String> = per_iteration_labels
                .iter()
                .map(|label| mangle_label(counter_label.as_deref(), label))
                .collect();

            #[allow(
                clippy::cast_sign_loss,
                reason = "count was just checked to be non-negative"
            )]
            for iteration in 1..=(count as u64) {
                for body_line in body {
                    let rewritten = rewrite_iteration(
                        body_line,
                        counter_label.as_deref(),
                        &per_iteration_labels,
                        iteration,
                    );
                    let rewritten = if iteration == 1 {
                        bind_pending_labels(rewritten, &mut labels_awaiting_definition)
                    } else {
                        rewritten
                    };
                    output.push(rewritten);
                }
            }
            i = j.saturating_add(1);
            continue;
        }
        if is_rof_line(line) {
            return Err(CompileError::new(
                line.first().map_or(0, |t| t.line),
                "unmatched 'rof'",
            ));
        }
        output.push(line.clone());
        i += 1;
    }

    Ok(output)
}

/// The parsed header of a `for` line.
struct ForHeader {
    /// Labels on the `for` line itself, in source order. The last is the
    /// counter label; any before it are per-iteration labels.
    labels: Vec<String>,
    /// The (unsubstituted) loop-count expression tokens.
    count_expr: Vec<Token>,
    /// The `for` token itself, kept for its line number.
    tok: Token,
}

/// Collect the leading label run of a line, returning the index of the
/// first non-label token (which may be past the end of the line).
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

fn detect_for_line(line: &[Token]) -> Option<ForHeader> {
    let (labels, idx) = leading_labels(line);
    let tok = line.get(idx)?;
    if tok.kind == TokenKind::Text && tok.lexeme.eq_ignore_ascii_case("for") {
        let mut count_expr = Vec::new();
        for t in &line[idx.saturating_add(1)..] {
            if t.kind == TokenKind::Comment {
                break;
            }
            count_expr.push(t.clone());
        }
        Some(ForHeader {
            labels,
            count_expr,
            tok: tok.clone(),
        })
    } else {
        None
    }
}

fn is_for_line(line: &[Token]) -> bool {
    detect_for_line(line).is_some()
}

fn is_rof_line(line: &[Token]) -> bool {
    let (_, idx) = leading_labels(line);
    line.get(idx)
        .is_some_and(|t| t.kind == TokenKind::Text && t.lexeme.eq_ignore_ascii_case("rof"))
}

/// The mangled, iteration-independent name a per-iteration label's
/// references are rewritten to.
fn mangle_label(counter_label: Option<&str>, label: &str) -> String {
    format!("__for_{}_{}", counter_label.unwrap_or("anon"), label)
}

/// Rewrite one body line for a single iteration: substitute the counter
/// label with the (1-based) iteration number, and rename any reference to a
/// per-iteration label to the mangled `__for_<counter>_<label>` form.
fn rewrite_iteration(
    line: &[Token],
    counter_label: Option<&str>,
    per_iteration_labels: &[String],
    iteration: u64,
) -> Vec<Token> {
    line.iter()
        .map(|tok| {
            if tok.kind != TokenKind::Text {
                return tok.clone();
            }
            if counter_label == Some(tok.lexeme.as_str()) {
                return Token::new(TokenKind::Number, iteration.to_string(), tok.line);
            }
            if per_iteration_labels.iter().any(|l| l == &tok.lexeme) {
                let mangled = mangle_label(counter_label, &tok.lexeme);
                return Token::new(TokenKind::Text, mangled, tok.line);
            }
            tok.clone()
        })
        .collect()
}

/// On the first iteration-1 line that mentions a still-undefined mangled
/// per-iteration label, prepend a leading-label token for it, so
/// `parser.rs`'s `leading_labels` binds it to that line's `code_line` the
/// same way an ordinary source label would bind. Each mangled name is
/// defined at most once, at its first occurrence in source order.
fn bind_pending_labels(line: Vec<Token>, pending: &mut HashSet<String>) -> Vec<Token> {
    if pending.is_empty() {
        return line;
    }
    let line_number = line.first().map_or(0, |tok| tok.line);
    let mut to_define = Vec::new();
    for tok in &line {
        if tok.kind == TokenKind::Text && pending.remove(&tok.lexeme) {
            to_define.push(tok.lexeme.clone());
        }
    }
    if to_define.is_empty() {
        return line;
    }
    let mut out = Vec::with_capacity(line.len().saturating_add(to_define.len()));
    out.extend(
        to_define
            .into_iter()
            .map(|name| Token::new(TokenKind::Text, name, line_number)),
    );
    out.extend(line);
    out
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::*;
    use crate::lexer::lex;
    use crate::symbol_scanner::scan_symbols;
    use crate::token::split_lines;

    fn expand(src: &str) -> Vec<Vec<Token>> {
        let tokens = lex(src).unwrap();
        let lines = split_lines(&tokens);
        let symbols = scan_symbols(&lines).unwrap();
        expand_for_loops(&lines, &symbols).unwrap()
    }

    #[test]
    fn zero_iteration_for_is_elided() {
        let lines = expand("i for 0\ndat #0, #0\nrof\ndat #1, #1\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0][0].lexeme, "dat");
        assert_eq!(lines[0][2].lexeme, "1");
    }

    #[test]
    fn counter_label_binds_to_one_based_index() {
        let lines = expand("i for 3\ndat i, i\nrof\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0][1].lexeme, "1");
        assert_eq!(lines[1][1].lexeme, "2");
        assert_eq!(lines[2][1].lexeme, "3");
    }

    #[test]
    fn per_iteration_label_is_defined_once_at_its_first_use() {
        let lines = expand("i j for 3\ndat i, j\nrof\n");
        assert_eq!(lines.len(), 3);

        // Iteration 1's line gains a leading-label definition for the
        // mangled name, since the original `for`-header line carrying `i`
        // never reaches the parser.
        assert_eq!(lines[0][0].lexeme, "__for_j_i");
        assert_eq!(lines[0][1].lexeme, "dat");
        assert_eq!(lines[0][2].lexeme, "__for_j_i");
        assert_eq!(lines[0][4].lexeme, "1");

        // Later iterations only reference the mangled name; they must not
        // redefine it.
        assert_eq!(lines[1][0].lexeme, "dat");
        assert_eq!(lines[1][1].lexeme, "__for_j_i");
        assert_eq!(lines[1][3].lexeme, "2");
        assert_eq!(lines[2][0].lexeme, "dat");
        assert_eq!(lines[2][1].lexeme, "__for_j_i");
        assert_eq!(lines[2][3].lexeme, "3");
    }

    #[test]
    fn unmatched_for_is_an_error() {
        let tokens = lex("i for 3\ndat #0, #0\n").unwrap();
        let lines = split_lines(&tokens);
        let symbols = scan_symbols(&lines).unwrap();
        assert!(expand_for_loops(&lines, &symbols).is_err());
    }

    #[test]
    fn unmatched_rof_is_an_error() {
        let tokens = lex("rof\ndat #0, #0\n").unwrap();
        let lines = split_lines(&tokens);
        let symbols = scan_symbols(&lines).unwrap();
        assert!(expand_for_loops(&lines, &symbols).is_err());
    }

    #[test]
    fn nested_for_loops_track_depth() {
        // A single expansion pass unrolls only the outer loop; the inner
        // `for`/`rof` survives untouched in each of the 2 copies of the
        // 3-line body, ready for the next scan+expand round to unroll it.
        let lines = expand("i for 2\nj for 2\ndat i, j\nrof\nrof\n");
        assert_eq!(lines.len(), 6);
    }
}

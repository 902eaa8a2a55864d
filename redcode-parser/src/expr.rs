//! Symbol expansion and arithmetic/logical expression evaluation.

use std::collections::{HashMap, HashSet};

use crate::error::CompileError;
use crate::token::{Token, TokenKind};

/// Build the reference graph of an `equ` table: for each key, the set of
/// other keys its value mentions.
#[must_use]
pub fn reference_graph(
    equs: &HashMap<String, Vec<Token>>,
) -> HashMap<String, HashSet<String>> {
    equs.iter()
        .map(|(key, value)| {
            let refs = value
                .iter()
                .filter(|tok| tok.kind == TokenKind::Text && equs.contains_key(&tok.lexeme))
                .map(|tok| tok.lexeme.clone())
                .collect();
            (key.clone(), refs)
        })
        .collect()
}

/// Three-color DFS cycle detection. Returns the key at which a cycle was
/// closed, if any.
#[must_use]
pub fn detect_cycle(graph: &HashMap<String, HashSet<String>>) -> Option<String> {
    #[derive(Clone, Copy, Eq, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    fn visit(
        node: &str,
        graph: &HashMap<String, HashSet<String>>,
        colors: &mut HashMap<String, Color>,
    ) -> Option<String> {
        match colors.get(node) {
            Some(Color::Gray) => return Some(node.to_owned()),
            Some(Color::Black) => return None,
            _ => {}
        }
        colors.insert(node.to_owned(), Color::Gray);
        if let Some(neighbors) = graph.get(node) {
            for neighbor in neighbors {
                if let Some(cycle_key) = visit(neighbor, graph, colors) {
                    return Some(cycle_key);
                }
            }
        }
        colors.insert(node.to_owned(), Color::Black);
        None
    }

    let mut colors: HashMap<String, Color> =
        graph.keys().map(|k| (k.clone(), Color::White)).collect();
    // Iterate in a deterministic (sorted) order so which key a cycle is
    // reported at does not depend on hash-map iteration order.
    let mut keys: Vec<&String> = graph.keys().collect();
    keys.sort();
    for key in keys {
        if colors.get(key) == Some(&Color::White) {
            if let Some(cycle_key) = visit(key, graph, &mut colors) {
                return Some(cycle_key);
            }
        }
    }
    None
}

/// Recursively substitute every `Text` token that names a symbol with that
/// symbol's own fully-expanded value. A `Text` token that is not a key of
/// `equs` (presumed to be an instruction label, resolved later by the
/// assembler) is left untouched.
///
/// # Errors
///
/// Fails if the symbol table contains a reference cycle.
pub fn expand_symbols(
    equs: &HashMap<String, Vec<Token>>,
) -> Result<HashMap<String, Vec<Token>>, CompileError> {
    let graph = reference_graph(equs);
    if let Some(cycle_key) = detect_cycle(&graph) {
        return Err(CompileError::new(
            0,
            format!("cyclic symbol reference at '{cycle_key}'"),
        ));
    }

    fn expand_one(
        key: &str,
        equs: &HashMap<String, Vec<Token>>,
        expanded: &mut HashMap<String, Vec<Token>>,
    ) -> Vec<Token> {
        if let Some(done) = expanded.get(key) {
            return done.clone();
        }
        let raw = equs.get(key).cloned().unwrap_or_default();
        let mut result = Vec::with_capacity(raw.len());
        for tok in raw {
            if tok.kind == TokenKind::Text && tok.lexeme != key && equs.contains_key(&tok.lexeme) {
                result.extend(expand_one(&tok.lexeme, equs, expanded));
            } else {
                result.push(tok);
            }
        }
        expanded.insert(key.to_owned(), result.clone());
        result
    }

    let mut expanded = HashMap::new();
    for key in equs.keys() {
        expand_one(key, equs, &mut expanded);
    }
    Ok(expanded)
}

/// Replace every `Text` token naming a (fully-expanded) symbol with that
/// symbol's value. Used both by the for-expander (to resolve a loop count)
/// and by the assembler (to resolve preset constants and instruction
/// labels) before final evaluation. A `Text` token with no entry in `equs`
/// (an unresolved label) is left untouched.
#[must_use]
pub fn substitute_symbols(
    tokens: &[Token],
    equs: &HashMap<String, Vec<Token>>,
) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for tok in tokens {
        if tok.kind == TokenKind::Text {
            if let Some(val) = equs.get(&tok.lexeme) {
                out.extend(val.iter().cloned());
                continue;
            }
        }
        out.push(tok.clone());
    }
    out
}

/// A hand-written recursive-descent / precedence-climbing evaluator over a
/// fully-substituted token slice (every symbol and label reference already
/// replaced by a literal number).
struct Cursor<'a> {
    /// Remaining tokens to parse.
    tokens: &'a [Token],
    /// Index of the next unconsumed token.
    pos: usize,
    /// Line number reported on a parse failure.
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token], line: usize) -> Self {
        Self { tokens, pos: 0, line }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_symbol(&self) -> Option<&str> {
        self.peek()
            .filter(|t| t.kind == TokenKind::Symbol)
            .map(|t| t.lexeme.as_str())
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn fail(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(self.line, message)
    }
}

/// Evaluate a fully-substituted expression token slice to an integer.
///
/// Boolean sub-results coerce to `1`/`0`. Unary `+`/`-` fold naturally
/// through recursion: `--x` parses as `-(-x)` which evaluates to `x`.
///
/// # Errors
///
/// Fails on an empty expression, unmatched parentheses, a malformed
/// operator, or division/modulo by zero.
pub fn evaluate(tokens: &[Token], line: usize) -> Result<i64, CompileError> {
    let mut cursor = Cursor::new(tokens, line);
    let value = parse_or(&mut cursor)?;
    if cursor.peek().is_some() {
        return Err(cursor.fail("trailing tokens after expression"));
    }
    Ok(value)
}

fn bool_to_int(b: bool) -> i64 {
    i64::from(b)
}

fn parse_or(c: &mut Cursor<'_>) -> Result<i64, CompileError> {
    let mut lhs = parse_and(c)?;
    while c.peek_symbol() == Some("||") {
        c.advance();
        let rhs = parse_and(c)?;
        lhs = bool_to_int(lhs != 0 || rhs != 0);
    }
    Ok(lhs)
}

fn parse_and(c: &mut Cursor<'_>) -> Result<i64, CompileError> {
    let mut lhs = parse_eq(c)?;
    while c.peek_symbol() == Some("&&") {
        c.advance();
        let rhs = parse_eq(c)?;
        lhs = bool_to_int(lhs != 0 && rhs != 0);
    }
    Ok(lhs)
}

fn parse_eq(c: &mut Cursor<'_>) -> Result<i64, CompileError> {
    let mut lhs = parse_rel(c)?;
    loop {
        match c.peek_symbol() {
            Some("==") => {
                c.advance();
                let rhs = parse_rel(c)?;
                lhs = bool_to_int(lhs == rhs);
            }
            Some("!=") => {
                c.advance();
                let rhs = parse_rel(c)?;
                lhs = bool_to_int(lhs != rhs);
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn parse_rel(c: &mut Cursor<'_>) -> Result<i64, CompileError> {
    let mut lhs = parse_add(c)?;
    loop {
        match c.peek_symbol() {
            Some("<") => {
                c.advance();
                let rhs = parse_add(c)?;
                lhs = bool_to_int(lhs < rhs);
            }
            Some("<=") => {
                c.advance();
                let rhs = parse_add(c)?;
                lhs = bool_to_int(lhs <= rhs);
            }
            Some(">") => {
                c.advance();
                let rhs = parse_add(c)?;
                lhs = bool_to_int(lhs > rhs);
            }
            Some(">=") => {
                c.advance();
                let rhs = parse_add(c)?;
                lhs = bool_to_int(lhs >= rhs);
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn parse_add(c: &mut Cursor<'_>) -> Result<i64, CompileError> {
    let mut lhs = parse_mul(c)?;
    loop {
        match c.peek_symbol() {
            Some("+") => {
                c.advance();
                lhs += parse_mul(c)?;
            }
            Some("-") => {
                c.advance();
                lhs -= parse_mul(c)?;
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn parse_mul(c: &mut Cursor<'_>) -> Result<i64, CompileError> {
    let mut lhs = parse_unary(c)?;
    loop {
        match c.peek_symbol() {
            Some("*") => {
                c.advance();
                lhs *= parse_unary(c)?;
            }
            Some("/") => {
                c.advance();
                let rhs = parse_unary(c)?;
                if rhs == 0 {
                    return Err(c.fail("division by zero in constant expression"));
                }
                lhs /= rhs;
            }
            Some("%") => {
                c.advance();
                let rhs = parse_unary(c)?;
                if rhs == 0 {
                    return Err(c.fail("modulo by zero in constant expression"));
                }
                lhs %= rhs;
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn parse_unary(c: &mut Cursor<'_>) -> Result<i64, CompileError> {
    match c.peek_symbol() {
        Some("-") => {
            c.advance();
            Ok(-parse_unary(c)?)
        }
        Some("+") => {
            c.advance();
            parse_unary(c)
        }
        _ => parse_primary(c),
    }
}

fn parse_primary(c: &mut Cursor<'_>) -> Result<i64, CompileError> {
    match c.advance() {
        Some(tok) if tok.kind == TokenKind::Number => tok
            .lexeme
            .parse::<i64>()
            .map_err(|_| c.fail(format!("malformed numeric literal '{}'", tok.lexeme))),
        Some(tok) if tok.kind == TokenKind::ParenL => {
            let value = parse_or(c)?;
            match c.advance() {
                Some(close) if close.kind == TokenKind::ParenR => Ok(value),
                _ => Err(c.fail("unmatched '('")),
            }
        }
        Some(tok) => Err(c.fail(format!("unexpected token '{}' in expression", tok.lexeme))),
        None => Err(c.fail("unexpected end of expression")),
    }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::*;
    use crate::lexer::lex;

    fn eval_str(src: &str) -> i64 {
        let tokens = lex(src).unwrap();
        let exprs: Vec<Token> = tokens
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Eof))
            .collect();
        evaluate(&exprs, 1).unwrap()
    }

    #[test]
    fn precedence_respects_standard_arithmetic() {
        assert_eq!(eval_str("2 + 3 * 4"), 14);
        assert_eq!(eval_str("(2 + 3) * 4"), 20);
    }

    #[test]
    fn double_minus_folds_to_a_plus() {
        assert_eq!(eval_str("1--1"), 2);
    }

    #[test]
    fn plus_minus_folds_to_minus() {
        assert_eq!(eval_str("1+-1"), 0);
    }

    #[test]
    fn boolean_operators_coerce_to_zero_or_one() {
        assert_eq!(eval_str("3 < 4"), 1);
        assert_eq!(eval_str("3 > 4"), 0);
        assert_eq!(eval_str("1 == 1 && 2 != 3"), 1);
        assert_eq!(eval_str("0 || 0"), 0);
    }

    #[test]
    fn division_by_zero_fails() {
        let tokens = lex("1 / 0").unwrap();
        assert!(evaluate(&tokens[..tokens.len() - 1], 1).is_err());
    }

    #[test]
    fn symbol_expansion_substitutes_recursively() {
        let mut equs = HashMap::new();
        equs.insert("a".to_owned(), vec![Token::new(TokenKind::Number, "1", 1)]);
        equs.insert(
            "b".to_owned(),
            vec![
                Token::new(TokenKind::Text, "a", 1),
                Token::new(TokenKind::Symbol, "+", 1),
                Token::new(TokenKind::Number, "1", 1),
            ],
        );
        let expanded = expand_symbols(&equs).unwrap();
        assert_eq!(evaluate(&expanded["b"], 1).unwrap(), 2);
    }

    #[test]
    fn cyclic_symbols_are_rejected_at_the_offending_key() {
        let mut equs = HashMap::new();
        equs.insert("a".to_owned(), vec![Token::new(TokenKind::Text, "b", 1)]);
        equs.insert("b".to_owned(), vec![Token::new(TokenKind::Text, "c", 1)]);
        equs.insert("c".to_owned(), vec![Token::new(TokenKind::Text, "b", 1)]);
        let err = expand_symbols(&equs).unwrap_err();
        assert!(err.message.contains('b'));
    }
}

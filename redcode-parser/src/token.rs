//! The token model shared by the lexer, symbol scanner, for-expander, and
//! parser.

/// A lexical token: a classification tag and the source text it came from.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The exact source text this token was lexed from.
    pub lexeme: String,
    /// 1-based line number this token appeared on.
    pub line: usize,
}

/// The closed set of lexical categories a byte of Redcode source can fall
/// into.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TokenKind {
    /// A lexical error was detected while scanning this token.
    Error,
    /// An identifier: a mnemonic, pseudo-op, or label.
    Text,
    /// A numeric literal.
    Number,
    /// An operator or address-mode marker (`+ - * / % # $ @ {{ }} < > <= >= == != && ||`).
    Symbol,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `(`
    ParenL,
    /// `)`
    ParenR,
    /// A `;`-prefixed comment, extending to (not including) the newline.
    Comment,
    /// A line terminator.
    Newline,
    /// The single token terminating a well-formed stream.
    Eof,
    /// A byte that matches no lexical rule.
    Invalid,
}

/// Opcode mnemonics recognized across both supported standards. Address-mode
/// suffixes (`.F`, `.AB`, ...) are stripped before comparison.
const OPCODE_MNEMONICS: [&str; 17] = [
    "DAT", "MOV", "ADD", "SUB", "MUL", "DIV", "MOD", "JMP", "JMZ", "JMN",
    "DJN", "SPL", "SLT", "CMP", "SEQ", "SNE", "NOP",
];

/// Pseudo-op mnemonics.
const PSEUDO_OPS: [&str; 5] = ["EQU", "ORG", "END", "FOR", "ROF"];

impl Token {
    /// Build a new token.
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// The mnemonic this token would be classified under, uppercased and
    /// with any `.modifier` suffix stripped.
    fn mnemonic(&self) -> String {
        let upper = self.lexeme.to_ascii_uppercase();
        match upper.split_once('.') {
            Some((mnemonic, _)) => mnemonic.to_owned(),
            None => upper,
        }
    }

    /// Whether this token is an opcode mnemonic, with or without a
    /// `.modifier` suffix.
    #[must_use]
    pub fn is_op(&self) -> bool {
        self.kind == TokenKind::Text
            && OPCODE_MNEMONICS.contains(&self.mnemonic().as_str())
    }

    /// Whether this token is one of `equ`, `org`, `end`, `for`, `rof`.
    #[must_use]
    pub fn is_pseudo_op(&self) -> bool {
        self.kind == TokenKind::Text
            && PSEUDO_OPS.contains(&self.lexeme.to_ascii_uppercase().as_str())
    }

    /// Whether this token is a one-character address-mode marker.
    #[must_use]
    pub fn is_address_mode(&self) -> bool {
        self.kind == TokenKind::Symbol
            && matches!(
                self.lexeme.as_str(),
                "#" | "$" | "*" | "@" | "{" | "}" | "<" | ">"
            )
    }

    /// Whether this token can begin (or continue) an expression: a text
    /// symbol, a number, a parenthesis, or a unary sign.
    #[must_use]
    pub fn is_expression_term(&self) -> bool {
        matches!(self.kind, TokenKind::Text | TokenKind::Number | TokenKind::ParenL)
            || (self.kind == TokenKind::Symbol
                && matches!(self.lexeme.as_str(), "+" | "-"))
    }
}

/// Group a flat token stream into logical lines, splitting on [`TokenKind::Newline`]
/// and dropping the newline markers themselves. The final, possibly-empty
/// line preceding `Eof` is dropped if it has no tokens.
#[must_use]
pub fn split_lines(tokens: &[Token]) -> Vec<Vec<Token>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for tok in tokens {
        match tok.kind {
            TokenKind::Newline => {
                lines.push(std::mem::take(&mut current));
            }
            TokenKind::Eof => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(tok.clone()),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::*;

    #[test]
    fn op_classification_strips_modifier_suffix() {
        let tok = Token::new(TokenKind::Text, "mov.ab", 1);
        assert!(tok.is_op());
        assert!(!tok.is_pseudo_op());
    }

    #[test]
    fn pseudo_op_classification_is_case_insensitive() {
        assert!(Token::new(TokenKind::Text, "EQU", 1).is_pseudo_op());
        assert!(Token::new(TokenKind::Text, "for", 1).is_pseudo_op());
        assert!(!Token::new(TokenKind::Text, "label", 1).is_pseudo_op());
    }

    #[test]
    fn address_mode_tokens_are_recognized() {
        for marker in ["#", "$", "*", "@", "{", "}", "<", ">"] {
            assert!(Token::new(TokenKind::Symbol, marker, 1).is_address_mode());
        }
        assert!(!Token::new(TokenKind::Symbol, "+", 1).is_address_mode());
    }

    #[test]
    fn split_lines_drops_newline_markers() {
        let tokens = vec![
            Token::new(TokenKind::Text, "mov", 1),
            Token::new(TokenKind::Newline, "\n", 1),
            Token::new(TokenKind::Text, "dat", 2),
            Token::new(TokenKind::Eof, "", 2),
        ];
        let lines = split_lines(&tokens);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][0].lexeme, "mov");
        assert_eq!(lines[1][0].lexeme, "dat");
    }

    #[test]
    fn split_lines_skips_trailing_empty_line() {
        let tokens = vec![
            Token::new(TokenKind::Text, "dat", 1),
            Token::new(TokenKind::Newline, "\n", 1),
            Token::new(TokenKind::Eof, "", 2),
        ];
        assert_eq!(split_lines(&tokens).len(), 1);
    }
}

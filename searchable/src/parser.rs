//! Query text to predicate tree
//!
//! ```text
//! searchable := '' | expr
//! expr       := term | '(' expr ' AND ' expr ')' | '(' expr ' OR ' expr ')'
//! term       := '!'? predicate
//! predicate  := name '|' code ':' valuepart?
//! valuepart  := '"' text '"'
//! ```
//!
//! Every AND/OR group is parenthesized, so there is no precedence to resolve.
//! Nesting is tracked with an explicit stack of frames rather than recursion.

use crate::errors::{Result, SearchError};
use crate::operator::{self, Arity};
use crate::predicate::{is_name_char, Predicate, Searchable};
use crate::serialize::{ESCAPE, QUOTE, SEPARATOR};
use log::{debug, trace};
use std::str::FromStr;

pub const DEFAULT_MAX_QUERY_LENGTH: usize = 4096;
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Limits applied before and during parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Longest accepted query, in characters
    pub max_query_length: usize,
    /// Deepest accepted parenthesis nesting
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Not,
    And,
    Or,
    /// Bare word that is neither a keyword nor a term
    Word(String),
    /// `name|code:` with the raw (still escaped) literal, if any
    Term {
        name: String,
        code: String,
        literal: Option<String>,
    },
}

struct Tokenizer<'a> {
    input: &'a [char],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a [char]) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_while<F>(&mut self, predicate: F) -> String
    where
        F: Fn(char) -> bool,
    {
        let mut result = String::new();
        while let Some(ch) = self.peek() {
            if predicate(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn error(&self, position: usize, reason: impl Into<String>) -> SearchError {
        SearchError::parse(self.input, position, reason)
    }

    fn tokenize(&mut self) -> Result<Vec<(usize, Token)>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let start = self.pos;
            let ch = match self.peek() {
                Some(c) => c,
                None => break,
            };

            let token = match ch {
                '(' => {
                    self.advance();
                    Token::LParen
                }
                ')' => {
                    self.advance();
                    Token::RParen
                }
                '!' => {
                    self.advance();
                    Token::Not
                }
                QUOTE => return Err(self.error(start, "quoted value without an attribute")),
                _ => {
                    let word = self.read_while(|c| {
                        !c.is_whitespace() && !matches!(c, '(' | ')' | '|' | ':' | '!' | QUOTE)
                    });
                    match self.peek() {
                        Some('|') if !word.is_empty() => self.read_term(start, word)?,
                        Some('|') => return Err(self.error(start, "missing attribute name")),
                        Some(':') if !word.is_empty() => {
                            return Err(self.error(
                                self.pos,
                                format!("missing operator code, expected '{}|<code>:'", word),
                            ))
                        }
                        _ if word.is_empty() => {
                            return Err(self.error(start, format!("unexpected character '{}'", ch)))
                        }
                        _ if word.eq_ignore_ascii_case("AND") => Token::And,
                        _ if word.eq_ignore_ascii_case("OR") => Token::Or,
                        _ => Token::Word(word),
                    }
                }
            };
            trace!("token {:?} at {}", token, start);
            tokens.push((start, token));
        }

        Ok(tokens)
    }

    /// Reads `|code:` and the optional quoted literal following an attribute name.
    fn read_term(&mut self, start: usize, name: String) -> Result<Token> {
        if let Some(offset) = name.chars().position(|c| !is_name_char(c)) {
            return Err(self.error(start + offset, "invalid character in attribute name"));
        }

        // Consume '|'
        self.advance();
        let code_start = self.pos;
        let code = self.read_while(|c| c.is_ascii_alphanumeric());
        if code.is_empty() {
            return Err(self.error(code_start, format!("missing operator code for '{}'", name)));
        }
        if self.peek() != Some(':') {
            return Err(self.error(self.pos, format!("expected ':' after '{}|{}'", name, code)));
        }
        self.advance();

        let literal = if self.peek() == Some(QUOTE) {
            Some(self.read_literal()?)
        } else {
            None
        };

        match self.peek() {
            None | Some(')') => {}
            Some(c) if c.is_whitespace() => {}
            Some(_) => {
                return Err(self.error(
                    self.pos,
                    format!("value of '{}' must be enclosed in double quotes", name),
                ))
            }
        }

        Ok(Token::Term {
            name,
            code,
            literal,
        })
    }

    /// Reads a quoted literal. Escapes are kept so commas can be told apart later.
    fn read_literal(&mut self) -> Result<String> {
        let open = self.pos;
        self.advance();
        let mut raw = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error(open, "unterminated quoted value")),
                Some(ESCAPE) => match self.advance() {
                    None => return Err(self.error(open, "unterminated quoted value")),
                    Some(c) => {
                        raw.push(ESCAPE);
                        raw.push(c);
                    }
                },
                Some(QUOTE) => return Ok(raw),
                Some(c) => raw.push(c),
            }
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == ESCAPE {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(ch);
        }
    }
    result
}

/// Splits a raw literal on unescaped separators, unescaping each element.
fn split_values(raw: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        match ch {
            ESCAPE => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            SEPARATOR => values.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    values.push(current);
    values
}

fn build_predicate(name: String, code: &str, literal: Option<String>) -> Result<Predicate> {
    let operator = operator::lookup(code)?;
    match (operator.arity(), literal) {
        (Arity::None, None) => Predicate::no_value(name, operator),
        (Arity::None, Some(_)) => Err(SearchError::invalid_predicate(format!(
            "operator '{}' on '{}' takes no value",
            operator, name
        ))),
        (Arity::Single, Some(raw)) => Predicate::single_value(name, operator, unescape(&raw)),
        (Arity::Multiple, Some(raw)) if raw.is_empty() => {
            Predicate::multiple_values(name, operator, Vec::<String>::new())
        }
        (Arity::Multiple, Some(raw)) => Predicate::multiple_values(name, operator, split_values(&raw)),
        (Arity::Single | Arity::Multiple, None) => Err(SearchError::invalid_predicate(format!(
            "operator '{}' on '{}' requires a value",
            operator, name
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Join {
    And,
    Or,
}

impl Join {
    fn keyword(&self) -> &'static str {
        match self {
            Join::And => "AND",
            Join::Or => "OR",
        }
    }
}

/// One level of nesting. The bottom frame is the whole query and has no parentheses.
#[derive(Debug)]
struct Frame {
    open: Option<usize>,
    /// '!' written before this frame's '('
    negations: usize,
    /// '!' waiting for the next operand inside this frame
    pending_not: usize,
    left: Option<Predicate>,
    join: Option<Join>,
    right: Option<Predicate>,
}

impl Frame {
    fn root() -> Self {
        Self::new(None, 0)
    }

    fn group(open: usize, negations: usize) -> Self {
        Self::new(Some(open), negations)
    }

    fn new(open: Option<usize>, negations: usize) -> Self {
        Self {
            open,
            negations,
            pending_not: 0,
            left: None,
            join: None,
            right: None,
        }
    }

    fn expects_operand(&self) -> bool {
        self.left.is_none() || (self.join.is_some() && self.right.is_none())
    }

    /// Explains why this frame cannot take another operand right now.
    fn operand_error(&self, input: &[char], position: usize) -> SearchError {
        let reason = match (self.open, &self.join) {
            (None, _) => "unexpected input after a complete expression; join with (… AND …) or (… OR …)",
            (Some(_), None) => "missing AND or OR between expressions",
            (Some(_), Some(_)) => "a group holds exactly two expressions; add parentheses",
        };
        SearchError::parse(input, position, reason)
    }

    fn push_operand(&mut self, operand: Predicate) {
        let operand = negate(operand, std::mem::take(&mut self.pending_not));
        if self.left.is_none() {
            self.left = Some(operand);
        } else {
            self.right = Some(operand);
        }
    }
}

fn negate(predicate: Predicate, count: usize) -> Predicate {
    (0..count).fold(predicate, |p, _| Predicate::not(p))
}

/// Parses query text with the given limits.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn parse(&self, text: &str) -> Result<Searchable> {
        let input: Vec<char> = text.chars().collect();
        if input.len() > self.config.max_query_length {
            return Err(SearchError::parse(
                &input,
                self.config.max_query_length,
                format!(
                    "query is longer than {} characters",
                    self.config.max_query_length
                ),
            ));
        }
        if text.trim().is_empty() {
            return Ok(Searchable::Empty);
        }

        let tokens = Tokenizer::new(&input).tokenize()?;
        let predicate = self.assemble(&input, tokens)?;
        debug!("parsed search query: {}", predicate);
        Ok(Searchable::Predicate(predicate))
    }

    fn assemble(&self, input: &[char], tokens: Vec<(usize, Token)>) -> Result<Predicate> {
        let error = |position: usize, reason: String| SearchError::parse(input, position, reason);
        let mut stack = vec![Frame::root()];

        for (pos, token) in tokens {
            let depth = stack.len();
            let Some(frame) = stack.last_mut() else {
                return Err(error(pos, "unbalanced ')'".to_string()));
            };

            match token {
                Token::Not => {
                    if !frame.expects_operand() {
                        return Err(frame.operand_error(input, pos));
                    }
                    frame.pending_not += 1;
                }
                Token::LParen => {
                    if !frame.expects_operand() {
                        return Err(frame.operand_error(input, pos));
                    }
                    if depth > self.config.max_depth {
                        return Err(error(
                            pos,
                            format!("nesting is deeper than {} levels", self.config.max_depth),
                        ));
                    }
                    let negations = std::mem::take(&mut frame.pending_not);
                    trace!("open group at {} (depth {})", pos, depth);
                    stack.push(Frame::group(pos, negations));
                }
                Token::Term {
                    name,
                    code,
                    literal,
                } => {
                    if !frame.expects_operand() {
                        return Err(frame.operand_error(input, pos));
                    }
                    frame.push_operand(build_predicate(name, &code, literal)?);
                }
                Token::And | Token::Or => {
                    let join = if token == Token::And { Join::And } else { Join::Or };
                    if frame.open.is_none() {
                        return Err(error(
                            pos,
                            format!("'{}' must be enclosed in parentheses", join.keyword()),
                        ));
                    }
                    if frame.left.is_none() || frame.pending_not > 0 {
                        return Err(error(
                            pos,
                            format!("missing expression before '{}'", join.keyword()),
                        ));
                    }
                    if frame.join.is_some() {
                        return Err(frame.operand_error(input, pos));
                    }
                    frame.join = Some(join);
                }
                Token::Word(word) => {
                    let reason = if frame.open.is_some() && frame.left.is_some() && frame.join.is_none()
                    {
                        format!("unknown join keyword '{}'", word)
                    } else {
                        format!("unexpected token '{}'", word)
                    };
                    return Err(error(pos, reason));
                }
                Token::RParen => {
                    if frame.open.is_none() {
                        return Err(error(pos, "unbalanced ')'".to_string()));
                    }
                    if frame.pending_not > 0 {
                        return Err(error(pos, "'!' must be followed by an expression".to_string()));
                    }
                    let group = match stack.pop() {
                        Some(group) => group,
                        None => return Err(error(pos, "unbalanced ')'".to_string())),
                    };
                    let combined = match (group.left, group.join, group.right) {
                        (Some(left), Some(Join::And), Some(right)) => Predicate::and(left, right),
                        (Some(left), Some(Join::Or), Some(right)) => Predicate::or(left, right),
                        (Some(_), Some(join), None) => {
                            return Err(error(
                                pos,
                                format!("missing expression after '{}'", join.keyword()),
                            ))
                        }
                        (Some(_), None, _) => {
                            return Err(error(
                                pos,
                                "a group must join two expressions with AND or OR".to_string(),
                            ))
                        }
                        (None, _, _) => return Err(error(pos, "empty group".to_string())),
                    };
                    let combined = negate(combined, group.negations);
                    match stack.last_mut() {
                        Some(parent) => parent.push_operand(combined),
                        None => return Err(error(pos, "unbalanced ')'".to_string())),
                    }
                }
            }
        }

        let mut root = match stack.pop() {
            Some(frame) if frame.open.is_none() => frame,
            Some(frame) => {
                return Err(error(
                    frame.open.unwrap_or_default(),
                    "unbalanced '(' is never closed".to_string(),
                ))
            }
            None => return Err(error(0, "empty query".to_string())),
        };
        if root.pending_not > 0 {
            return Err(error(
                input.len(),
                "'!' must be followed by an expression".to_string(),
            ));
        }
        root.left
            .take()
            .ok_or_else(|| error(0, "empty query".to_string()))
    }
}

/// Parses query text with the default limits.
pub fn parse(text: &str) -> Result<Searchable> {
    Parser::default().parse(text)
}

impl FromStr for Searchable {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

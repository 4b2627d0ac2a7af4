//! Reading a document back into a forest.
//!
//! A small lexer turns the body (everything after `return [`) into tokens
//! and a recursive-descent parser walks the blocks. Both nested and plain
//! layouts are accepted; plain documents are rebuilt into a hierarchy from
//! the child ids each block lists.

use std::collections::{HashMap, HashSet};

use routekit::v1::{Attributes, EntityNode, Forest, Schema, Value};

use crate::error::{Error, Result};
use crate::literal::attribute_name;
use crate::serialize::split_header;
use crate::signature::FALLBACK_MAKER;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Int(i64),
    Float(f64),
    Ident(String),
    DoubleColon,
    Arrow,
    FatArrow,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Str(s) => format!("string '{s}'"),
            Token::Int(i) => format!("number {i}"),
            Token::Float(f) => format!("number {f}"),
            Token::Ident(name) => format!("`{name}`"),
            Token::DoubleColon => "`::`".into(),
            Token::Arrow => "`->`".into(),
            Token::FatArrow => "`=>`".into(),
            Token::LParen => "`(`".into(),
            Token::RParen => "`)`".into(),
            Token::LBracket => "`[`".into(),
            Token::RBracket => "`]`".into(),
            Token::Comma => "`,`".into(),
            Token::Semicolon => "`;`".into(),
        }
    }
}

// ── Lexer ────────────────────────────────────────────────────────────────

struct Lexer<'t> {
    text: &'t str,
    pos: usize,
    /// Offset of `text` within the whole document, for error positions.
    base: usize,
}

impl<'t> Lexer<'t> {
    fn new(text: &'t str, base: usize) -> Self {
        Self { text, pos: 0, base }
    }

    fn error(&self, at: usize, message: impl Into<String>) -> Error {
        Error::Parse {
            offset: self.base + at,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn tokenize(mut self) -> Result<Vec<(usize, Token)>> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek_char() {
            let start = self.pos;
            let rest = self.rest();
            if c.is_whitespace() {
                self.bump();
            } else if rest.starts_with("//") || c == '#' {
                self.pos += rest.find('\n').unwrap_or(rest.len());
            } else if rest.starts_with("/*") {
                let close = rest
                    .find("*/")
                    .ok_or_else(|| self.error(start, "unterminated comment"))?;
                self.pos += close + 2;
            } else if rest.starts_with("::") {
                self.pos += 2;
                tokens.push((self.base + start, Token::DoubleColon));
            } else if rest.starts_with("->") {
                self.pos += 2;
                tokens.push((self.base + start, Token::Arrow));
            } else if rest.starts_with("=>") {
                self.pos += 2;
                tokens.push((self.base + start, Token::FatArrow));
            } else if c == '\'' || c == '"' {
                self.bump();
                let s = self.string(c, start)?;
                tokens.push((self.base + start, Token::Str(s)));
            } else if c.is_ascii_digit() || (c == '-' && rest[1..].starts_with(|n: char| n.is_ascii_digit())) {
                let token = self.number(start)?;
                tokens.push((self.base + start, token));
            } else if c.is_alphabetic() || c == '_' || c == '\\' {
                let len = rest
                    .find(|n: char| !(n.is_alphanumeric() || n == '_' || n == '\\'))
                    .unwrap_or(rest.len());
                self.pos += len;
                tokens.push((self.base + start, Token::Ident(rest[..len].to_string())));
            } else {
                let token = match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    ',' => Token::Comma,
                    ';' => Token::Semicolon,
                    other => return Err(self.error(start, format!("unexpected character `{other}`"))),
                };
                self.bump();
                tokens.push((self.base + start, token));
            }
        }
        Ok(tokens)
    }

    /// String body after the opening quote. Single quotes only unescape
    /// `\'` and `\\`.
    fn string(&mut self, quote: char, start: usize) -> Result<String> {
        let mut out = String::new();
        loop {
            let c = self
                .bump()
                .ok_or_else(|| self.error(start, "unterminated string"))?;
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            match (quote, self.peek_char()) {
                (_, Some(next)) if next == quote || next == '\\' => {
                    self.bump();
                    out.push(next);
                }
                ('"', Some('n')) => {
                    self.bump();
                    out.push('\n');
                }
                ('"', Some('t')) => {
                    self.bump();
                    out.push('\t');
                }
                ('"', Some('r')) => {
                    self.bump();
                    out.push('\r');
                }
                ('"', Some('$')) => {
                    self.bump();
                    out.push('$');
                }
                _ => out.push('\\'),
            }
        }
    }

    fn number(&mut self, start: usize) -> Result<Token> {
        let rest = self.rest();
        let sign = usize::from(rest.starts_with('-'));
        let len = sign
            + rest[sign..]
                .find(|n: char| !(n.is_ascii_digit() || n == '.' || n == '_'))
                .unwrap_or(rest.len() - sign);
        let raw = rest[..len].replace('_', "");
        self.pos += len;
        let token = if raw.contains('.') {
            raw.parse().map(Token::Float).ok()
        } else {
            raw.parse().map(Token::Int).ok()
        };
        token.ok_or_else(|| self.error(start, format!("invalid number `{raw}`")))
    }
}

// ── Parser ───────────────────────────────────────────────────────────────

/// A parsed block and the child ids it lists in a plain layout.
struct ParsedBlock {
    node: EntityNode,
    refs: Vec<String>,
}

struct Parser<'s> {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
    schema: &'s Schema,
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(at, _)| *at)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        match self.peek() {
            Some(found) => self.error(format!("expected {expected}, found {}", found.describe())),
            None => self.error(format!("expected {expected}, found end of input")),
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&token.describe()))
        }
    }

    fn ident(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Blocks up to the closing `];`.
    fn body(&mut self) -> Result<Vec<ParsedBlock>> {
        let mut blocks = Vec::new();
        loop {
            if self.eat(&Token::RBracket) {
                break;
            }
            blocks.push(self.block()?);
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBracket)?;
                break;
            }
        }
        self.eat(&Token::Semicolon);
        if self.peek().is_some() {
            return Err(self.unexpected("end of document"));
        }
        Ok(blocks)
    }

    fn block(&mut self) -> Result<ParsedBlock> {
        let start = self.offset();
        let class = self.ident("class name")?;
        if last_segment(&class) != last_segment(&self.schema.class) {
            return Err(Error::Parse {
                offset: start,
                message: format!("expected `{}`, found `{class}`", self.schema.class),
            });
        }
        self.expect(&Token::DoubleColon)?;
        let maker = self.schema.maker.as_deref().unwrap_or(FALLBACK_MAKER);
        if self.ident("maker method")? != maker {
            self.pos -= 1;
            return Err(self.unexpected(&format!("`{maker}`")));
        }
        self.expect(&Token::LParen)?;
        let args = self.arguments()?;

        let mut attributes = Attributes::new();
        let mut call_id = None;
        if self.schema.maker.is_none() {
            call_id = args.first().and_then(|v| v.as_str()).map(str::to_string);
        } else {
            for (param, arg) in self.schema.constructor_params().iter().zip(args) {
                if param.name == "id" {
                    call_id = arg.as_str().map(str::to_string);
                } else if !arg.is_null() {
                    attributes.set(param.name.clone(), arg);
                }
            }
        }

        let mut end_id = None;
        let mut children = Vec::new();
        let mut refs = Vec::new();
        while self.eat(&Token::Arrow) {
            let method = self.ident("method name")?;
            self.expect(&Token::LParen)?;
            match method.as_str() {
                "setItems" => (children, refs) = self.items()?,
                "setEndBlock" => match self.literal()? {
                    Value::String(id) => end_id = Some(id),
                    _ => return Err(self.error("end marker must be a string")),
                },
                other => {
                    let name = attribute_name(other)
                        .ok_or_else(|| self.error(format!("unknown method `{other}`")))?;
                    let value = self.literal()?;
                    if !value.is_null() {
                        attributes.set(name, value);
                    }
                }
            }
            self.expect(&Token::RParen)?;
        }

        let id = end_id.or(call_id).ok_or(Error::Parse {
            offset: start,
            message: "block has no id".into(),
        })?;
        Ok(ParsedBlock {
            node: EntityNode {
                id,
                attributes,
                children,
            },
            refs,
        })
    }

    /// Maker-call arguments after `(`, through `)`.
    fn arguments(&mut self) -> Result<Vec<Value>> {
        let mut args = Vec::new();
        loop {
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            args.push(self.literal()?);
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RParen)?;
                return Ok(args);
            }
        }
    }

    /// `setItems` content: nested blocks, or child ids in a plain layout.
    fn items(&mut self) -> Result<(Vec<EntityNode>, Vec<String>)> {
        self.expect(&Token::LBracket)?;
        let mut children = Vec::new();
        let mut refs = Vec::new();
        loop {
            if self.eat(&Token::RBracket) {
                break;
            }
            let opens_block = matches!(self.peek(), Some(Token::Ident(_)))
                && self.peek_at(1) == Some(&Token::DoubleColon);
            if opens_block {
                let child = self.block()?;
                if !child.refs.is_empty() {
                    log::debug!("{}: nested block lists child ids, ignored", child.node.id);
                }
                children.push(child.node);
            } else {
                match self.literal()? {
                    Value::String(id) => refs.push(id),
                    Value::Int(i) => refs.push(i.to_string()),
                    _ => return Err(self.error("child reference must be an id")),
                }
            }
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBracket)?;
                break;
            }
        }
        Ok((children, refs))
    }

    fn literal(&mut self) -> Result<Value> {
        let value = match self.peek() {
            Some(Token::Str(s)) => Value::String(s.clone()),
            Some(Token::Int(i)) => Value::Int(*i),
            Some(Token::Float(f)) => Value::Float(*f),
            Some(Token::Ident(name)) => match name.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                _ => return Err(self.unexpected("a literal")),
            },
            Some(Token::LBracket) => {
                self.pos += 1;
                return self.array();
            }
            _ => return Err(self.unexpected("a literal")),
        };
        self.pos += 1;
        Ok(value)
    }

    /// Array literal after `[`: a list, or a map when entries use `=>`.
    fn array(&mut self) -> Result<Value> {
        let mut list = Vec::new();
        let mut map = Vec::new();
        loop {
            if self.eat(&Token::RBracket) {
                break;
            }
            let first = self.literal()?;
            if self.eat(&Token::FatArrow) {
                if !list.is_empty() {
                    return Err(self.error("array mixes list and keyed entries"));
                }
                let key = match first {
                    Value::String(s) => s,
                    Value::Int(i) => i.to_string(),
                    _ => return Err(self.error("array key must be a string or integer")),
                };
                map.push((key, self.literal()?));
            } else {
                if !map.is_empty() {
                    return Err(self.error("array mixes list and keyed entries"));
                }
                list.push(first);
            }
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBracket)?;
                break;
            }
        }
        Ok(if map.is_empty() {
            Value::List(list)
        } else {
            Value::Map(map)
        })
    }
}

fn last_segment(class: &str) -> &str {
    class.rsplit('\\').next().unwrap_or(class)
}

/// Rebuild a plain layout's hierarchy from child-id references. Blocks
/// nobody references become roots, in document order.
fn assemble(blocks: Vec<ParsedBlock>) -> Vec<EntityNode> {
    if blocks.iter().all(|b| b.refs.is_empty()) {
        return blocks.into_iter().map(|b| b.node).collect();
    }

    let referenced: HashSet<String> = blocks.iter().flat_map(|b| b.refs.clone()).collect();
    let order: Vec<String> = blocks.iter().map(|b| b.node.id.clone()).collect();
    let mut pending: HashMap<String, ParsedBlock> = HashMap::new();
    for block in blocks {
        if let Some(previous) = pending.insert(block.node.id.clone(), block) {
            log::debug!("{}: duplicate block, keeping the last", previous.node.id);
        }
    }

    let mut roots = Vec::new();
    for id in order.iter().filter(|id| !referenced.contains(*id)) {
        if let Some(node) = take(&mut pending, id) {
            roots.push(node);
        }
    }
    // Blocks only reachable through a reference cycle
    for id in &order {
        if let Some(node) = take(&mut pending, id) {
            roots.push(node);
        }
    }
    roots
}

fn take(pending: &mut HashMap<String, ParsedBlock>, id: &str) -> Option<EntityNode> {
    let block = pending.remove(id)?;
    let mut node = block.node;
    for child_id in &block.refs {
        match take(pending, child_id) {
            Some(child) => node.children.push(child),
            None => log::debug!("{}: child {} not found", node.id, child_id),
        }
    }
    Some(node)
}

/// Parse a document written in either layout.
///
/// Constructor arguments map positionally onto the schema's parameters and
/// come first in each node's attributes; `null` values are not stored. The
/// end marker is authoritative for the id.
///
/// ```
/// use routekit::v1::{Schema, Value};
/// use routekit_source::parse_document;
///
/// let schema = Schema::new("Route")
///     .with_maker("make")
///     .with_param("id", None)
///     .with_param("title", None);
/// let text = "<?php\n\nreturn [\n    Route::make('home', 'Home')\n        ->setUrl('/')\n        ->setItems([])->setEndBlock('home')\n];\n";
///
/// let forest = parse_document(text, &schema).unwrap();
/// assert_eq!(forest.roots[0].id, "home");
/// assert_eq!(forest.roots[0].get("url"), Some(&Value::from("/")));
/// ```
pub fn parse_document(text: &str, schema: &Schema) -> Result<Forest> {
    let (header, body) = split_header(text)?;
    let tokens = Lexer::new(body, header.len()).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: text.len(),
        schema,
    };
    let blocks = parser.body()?;
    Ok(Forest::from_roots(assemble(blocks)))
}

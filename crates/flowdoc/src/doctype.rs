//! JSDoc/Closure type expressions
//!
//! This module provides `DocType`, the structured ("semantic") form of the
//! text found between the braces of a tag such as `@param {number=} a`,
//! together with the parser that produces it.
//!
//! Supported syntax:
//! - names and dotted paths (`number`, `ns.Thing`)
//! - wildcard `*` and unknown `?`
//! - unions (`a|b`, `(a|b)`)
//! - type applications (`Array.<T>`, `Object<K, V>`) and array suffixes (`T[]`)
//! - nullable `?T` / `T?`, non-nullable `!T`, optional `T=`, rest `...T`
//! - function types (`function(this:T, name:Type, Type=): Result`)
//! - record types (`{a: number, b}`) and tuples (`[a, b]`)
//! - string, number and boolean literals, `null`, `undefined`, `void`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A structured JSDoc type expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DocType {
    /// `*`
    All,
    /// `?` on its own
    Unknown,
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `void`
    Void,
    /// A plain or dotted name (`number`, `Object`, `ns.Thing`)
    Name { name: String },
    /// String, number or boolean literal, kept as written
    Literal { value: String },
    /// `?T`
    Nullable { inner: Box<DocType> },
    /// `!T`
    NonNullable { inner: Box<DocType> },
    /// `T=`
    Optional { inner: Box<DocType> },
    /// `...T`
    Rest { inner: Box<DocType> },
    /// `A|B|C`
    Union { members: Vec<DocType> },
    /// `Base.<A, B>`, `Base<A>` and `T[]` (as `Array.<T>`)
    Application { base: Box<DocType>, args: Vec<DocType> },
    /// `function(...): R`
    Function(Box<FunctionType>),
    /// `{a: T, b}`
    Record { fields: Vec<RecordField> },
    /// `[A, B]`
    Tuple { elements: Vec<DocType> },
}

/// A documented function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionType {
    /// Declared parameters, in order
    pub params: Vec<FunctionParam>,
    /// `this:T` binding
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub this: Option<DocType>,
    /// `new:T` constructor result
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub new: Option<DocType>,
    /// Result type after `:`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<DocType>,
}

/// One parameter of a function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionParam {
    /// Name, when written as `name:Type`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Parameter type
    pub ty: DocType,
}

/// One field of a record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordField {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ty: Option<DocType>,
}

/// Failure to parse a type expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type expression `{source_text}` at offset {offset}: {message}")]
pub struct TypeParseError {
    pub source_text: String,
    pub offset: usize,
    pub message: String,
}

impl DocType {
    /// Create a name type
    pub fn name(name: impl Into<String>) -> Self {
        DocType::Name { name: name.into() }
    }

    /// Create `Array.<element>`
    pub fn array(element: DocType) -> Self {
        DocType::Application {
            base: Box::new(DocType::name("Array")),
            args: vec![element],
        }
    }

    /// Create a union type
    pub fn union(members: Vec<DocType>) -> Self {
        DocType::Union { members }
    }

    /// Wrap in `T=`
    pub fn optional(inner: DocType) -> Self {
        DocType::Optional {
            inner: Box::new(inner),
        }
    }

    /// Wrap in `?T`
    pub fn nullable(inner: DocType) -> Self {
        DocType::Nullable {
            inner: Box::new(inner),
        }
    }

    /// Parse a type expression (the text between the braces of a tag)
    pub fn parse(text: &str) -> Result<Self, TypeParseError> {
        TypeParser::new(text)?.parse_top()
    }

    /// Whether the expression carries the trailing `=` optional marker
    pub fn is_optional(&self) -> bool {
        matches!(self, DocType::Optional { .. })
    }

    /// The expression without a trailing `=` marker
    pub fn without_optional(&self) -> &DocType {
        match self {
            DocType::Optional { inner } => inner,
            other => other,
        }
    }

    /// Whether this is the `object` keyword (lowercase), which carries no shape
    pub fn is_object_keyword(&self) -> bool {
        matches!(self, DocType::Name { name } if name == "object")
    }

    /// Whether this is `Array.<T>` / `T[]`
    pub fn is_array(&self) -> bool {
        matches!(self, DocType::Application { base, .. }
            if matches!(base.as_ref(), DocType::Name { name } if name == "Array"))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Lt,
    DotLt,
    Gt,
    Comma,
    Colon,
    Pipe,
    Star,
    Question,
    Bang,
    Equal,
    Ellipsis,
    Name(String),
    Str(String),
    Number(String),
    Eof,
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_name_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, TypeParseError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let error = |offset: usize, message: &str| TypeParseError {
        source_text: text.to_string(),
        offset,
        message: message.to_string(),
    };

    while i < chars.len() {
        let (offset, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, c)| *c);
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '<' => Token::Lt,
            '>' => Token::Gt,
            ',' => Token::Comma,
            ':' => Token::Colon,
            '|' => Token::Pipe,
            '*' => Token::Star,
            '?' => Token::Question,
            '!' => Token::Bang,
            '=' => Token::Equal,
            '.' if next == Some('<') => {
                i += 2;
                tokens.push((Token::DotLt, offset));
                continue;
            }
            '.' if next == Some('.') && chars.get(i + 2).map(|(_, c)| *c) == Some('.') => {
                i += 3;
                tokens.push((Token::Ellipsis, offset));
                continue;
            }
            '"' | '\'' => {
                let quote = c;
                let mut value = String::new();
                value.push(quote);
                i += 1;
                let mut closed = false;
                while i < chars.len() {
                    let (_, ch) = chars[i];
                    value.push(ch);
                    i += 1;
                    if ch == '\\' {
                        if let Some((_, escaped)) = chars.get(i) {
                            value.push(*escaped);
                            i += 1;
                        }
                    } else if ch == quote {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(error(offset, "unterminated string literal"));
                }
                tokens.push((Token::Str(value), offset));
                continue;
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() {
                    let ch = chars[i].1;
                    if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let value: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                tokens.push((Token::Number(value), offset));
                continue;
            }
            c if is_name_start(c) => {
                let start = i;
                i += 1;
                while i < chars.len() {
                    let ch = chars[i].1;
                    let following = chars.get(i + 1).map(|(_, c)| *c);
                    if is_name_part(ch) {
                        i += 1;
                    } else if ch == '.' && following.is_some_and(is_name_start) {
                        // dotted path, but `.<` stays a separate token
                        i += 1;
                    } else {
                        break;
                    }
                }
                let value: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                tokens.push((Token::Name(value), offset));
                continue;
            }
            _ => return Err(error(offset, &format!("unexpected character `{}`", c))),
        };
        tokens.push((token, offset));
        i += 1;
    }

    tokens.push((Token::Eof, text.len()));
    Ok(tokens)
}

/// Recursive-descent parser over the token stream
struct TypeParser<'a> {
    text: &'a str,
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn new(text: &'a str) -> Result<Self, TypeParseError> {
        Ok(Self {
            text,
            tokens: tokenize(text)?,
            pos: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].0
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        &self.tokens[(self.pos + ahead).min(self.tokens.len() - 1)].0
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].1
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), TypeParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", what)))
        }
    }

    fn error(&self, message: &str) -> TypeParseError {
        TypeParseError {
            source_text: self.text.to_string(),
            offset: self.offset(),
            message: message.to_string(),
        }
    }

    /// `Union [=]` followed by end of input
    fn parse_top(&mut self) -> Result<DocType, TypeParseError> {
        if self.peek() == &Token::Eof {
            return Err(self.error("empty type expression"));
        }
        let mut ty = self.parse_union()?;
        if self.eat(&Token::Equal) {
            ty = DocType::optional(ty);
        }
        if self.peek() != &Token::Eof {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(ty)
    }

    fn parse_union(&mut self) -> Result<DocType, TypeParseError> {
        let first = self.parse_type()?;
        if self.peek() != &Token::Pipe {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(&Token::Pipe) {
            members.push(self.parse_type()?);
        }
        Ok(DocType::union(members))
    }

    /// Whether the current token can begin a type (used to tell `?` from `?T`)
    fn starts_type(&self) -> bool {
        matches!(
            self.peek(),
            Token::Name(_)
                | Token::Str(_)
                | Token::Number(_)
                | Token::LParen
                | Token::LBrace
                | Token::LBracket
                | Token::Star
                | Token::Bang
        )
    }

    fn parse_type(&mut self) -> Result<DocType, TypeParseError> {
        let mut ty = self.parse_prefixed()?;

        loop {
            match self.peek() {
                Token::LBracket if self.peek_at(1) == &Token::RBracket => {
                    self.advance();
                    self.advance();
                    ty = DocType::array(ty);
                }
                Token::Question => {
                    self.advance();
                    ty = DocType::nullable(ty);
                }
                Token::Bang => {
                    self.advance();
                    ty = DocType::NonNullable { inner: Box::new(ty) };
                }
                _ => break,
            }
        }

        Ok(ty)
    }

    fn parse_prefixed(&mut self) -> Result<DocType, TypeParseError> {
        match self.peek().clone() {
            Token::Star => {
                self.advance();
                Ok(DocType::All)
            }
            Token::Question => {
                self.advance();
                if self.starts_type() {
                    Ok(DocType::nullable(self.parse_type()?))
                } else {
                    Ok(DocType::Unknown)
                }
            }
            Token::Bang => {
                self.advance();
                Ok(DocType::NonNullable {
                    inner: Box::new(self.parse_type()?),
                })
            }
            Token::Ellipsis => {
                self.advance();
                Ok(DocType::Rest {
                    inner: Box::new(self.parse_type()?),
                })
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_union()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::LBrace => self.parse_record(),
            Token::LBracket => self.parse_tuple(),
            Token::Str(value) | Token::Number(value) => {
                self.advance();
                Ok(DocType::Literal { value })
            }
            Token::Name(name) => {
                if name == "function" && self.peek_at(1) == &Token::LParen {
                    return self.parse_function();
                }
                self.advance();
                match name.as_str() {
                    "null" => Ok(DocType::Null),
                    "undefined" => Ok(DocType::Undefined),
                    "void" => Ok(DocType::Void),
                    "true" | "false" => Ok(DocType::Literal { value: name }),
                    _ => self.parse_application(DocType::Name { name }),
                }
            }
            _ => Err(self.error("expected a type")),
        }
    }

    fn parse_application(&mut self, base: DocType) -> Result<DocType, TypeParseError> {
        if !matches!(self.peek(), Token::Lt | Token::DotLt) {
            return Ok(base);
        }
        self.advance();
        let mut args = vec![self.parse_union()?];
        while self.eat(&Token::Comma) {
            args.push(self.parse_union()?);
        }
        self.expect(&Token::Gt, "`>`")?;
        Ok(DocType::Application {
            base: Box::new(base),
            args,
        })
    }

    fn parse_function(&mut self) -> Result<DocType, TypeParseError> {
        // `function`
        self.advance();
        self.expect(&Token::LParen, "`(`")?;

        let mut function = FunctionType {
            params: Vec::new(),
            this: None,
            new: None,
            result: None,
        };

        if !self.eat(&Token::RParen) {
            loop {
                let named = match (self.peek().clone(), self.peek_at(1)) {
                    (Token::Name(name), Token::Colon) => Some(name),
                    _ => None,
                };

                if let Some(name) = named {
                    self.advance();
                    self.advance();
                    let ty = self.parse_param_type()?;
                    match name.as_str() {
                        "this" => function.this = Some(ty),
                        "new" => function.new = Some(ty),
                        _ => function.params.push(FunctionParam {
                            name: Some(name),
                            ty,
                        }),
                    }
                } else {
                    let ty = self.parse_param_type()?;
                    function.params.push(FunctionParam { name: None, ty });
                }

                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma, "`,` or `)`")?;
            }
        }

        if self.eat(&Token::Colon) {
            function.result = Some(self.parse_type()?);
        }

        Ok(DocType::Function(Box::new(function)))
    }

    fn parse_param_type(&mut self) -> Result<DocType, TypeParseError> {
        let ty = self.parse_union()?;
        if self.eat(&Token::Equal) {
            Ok(DocType::optional(ty))
        } else {
            Ok(ty)
        }
    }

    fn parse_record(&mut self) -> Result<DocType, TypeParseError> {
        self.expect(&Token::LBrace, "`{`")?;
        let mut fields = Vec::new();

        if !self.eat(&Token::RBrace) {
            loop {
                let key = match self.advance() {
                    Token::Name(key) | Token::Str(key) | Token::Number(key) => key,
                    _ => return Err(self.error("expected a record key")),
                };
                let ty = if self.eat(&Token::Colon) {
                    Some(self.parse_param_type()?)
                } else {
                    None
                };
                fields.push(RecordField { key, ty });

                if self.eat(&Token::RBrace) {
                    break;
                }
                self.expect(&Token::Comma, "`,` or `}`")?;
            }
        }

        Ok(DocType::Record { fields })
    }

    fn parse_tuple(&mut self) -> Result<DocType, TypeParseError> {
        self.expect(&Token::LBracket, "`[`")?;
        let mut elements = Vec::new();

        if !self.eat(&Token::RBracket) {
            loop {
                elements.push(self.parse_param_type()?);
                if self.eat(&Token::RBracket) {
                    break;
                }
                self.expect(&Token::Comma, "`,` or `]`")?;
            }
        }

        Ok(DocType::Tuple { elements })
    }
}

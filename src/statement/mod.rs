//! Statement templates: parsing placeholder-annotated SQL and binding parameters into final text.
//!
//! Placeholder syntax understood by the default [`BraceParser`]:
//!
//! | Form | Meaning |
//! |---|---|
//! | `{}` | next positional parameter |
//! | `{2}` | second parameter (1-based) |
//! | `{:s}` / `{2:i}` | same, checked against a [`ValueKind`] |
//! | `{{` | a literal `{` |
//!
//! Braces inside quoted literals and comments are left alone. Whether `\'` ends a
//! literal depends on the dialect the parser was built for (see [`BraceParser::standard`]).

use std::fmt;
use std::sync::Arc;

use crate::error::{FormatError, ParseError};
use crate::types::RowValues;

mod cache;
mod formatter;
mod parser;
mod scanner;

pub use cache::StatementCache;
pub use formatter::LiteralFormatter;
pub use parser::BraceParser;

/// Character whose presence routes statement text through the parser.
pub const PLACEHOLDER_MARKER: char = '{';

/// Expected kind of a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Float,
    Text,
    Blob,
    Timestamp,
    Json,
}

impl ValueKind {
    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "i" => Some(ValueKind::Int),
            "f" => Some(ValueKind::Float),
            "s" => Some(ValueKind::Text),
            "b" => Some(ValueKind::Blob),
            "t" => Some(ValueKind::Timestamp),
            "j" => Some(ValueKind::Json),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Blob => "blob",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Json => "json",
        })
    }
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder {
        /// 0-based parameter index.
        index: usize,
        kind: Option<ValueKind>,
    },
}

/// Parsed form of statement text containing placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl StatementTemplate {
    #[must_use]
    pub fn new(source: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            source: source.into(),
            segments,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of parameters the template references (highest index + 1).
    #[must_use]
    pub fn arity(&self) -> usize {
        self.segments
            .iter()
            .filter_map(|seg| match seg {
                Segment::Placeholder { index, .. } => Some(index + 1),
                Segment::Literal(_) => None,
            })
            .max()
            .unwrap_or(0)
    }
}

/// A prepared statement: plain text, or a shared parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Plain(Arc<str>),
    Template(Arc<StatementTemplate>),
}

impl Statement {
    #[must_use]
    pub fn plain(text: &str) -> Self {
        Statement::Plain(Arc::from(text))
    }

    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Statement::Plain(text) => text,
            Statement::Template(tpl) => tpl.source(),
        }
    }

    /// True when both handles refer to the same cached template.
    #[must_use]
    pub fn ptr_eq(&self, other: &Statement) -> bool {
        match (self, other) {
            (Statement::Template(a), Statement::Template(b)) => Arc::ptr_eq(a, b),
            (Statement::Plain(a), Statement::Plain(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Final SQL text with all parameters substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltStatement(String);

impl BuiltStatement {
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BuiltStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything a connection accepts as a statement.
#[derive(Debug, Clone, Copy)]
pub enum Sql<'a> {
    /// Raw text; prepared (and cached) on use.
    Text(&'a str),
    /// Previously prepared statement.
    Prepared(&'a Statement),
    /// Already-built text, sent as-is.
    Built(&'a BuiltStatement),
}

impl<'a> From<&'a str> for Sql<'a> {
    fn from(value: &'a str) -> Self {
        Sql::Text(value)
    }
}

impl<'a> From<&'a String> for Sql<'a> {
    fn from(value: &'a String) -> Self {
        Sql::Text(value)
    }
}

impl<'a> From<&'a Statement> for Sql<'a> {
    fn from(value: &'a Statement) -> Self {
        Sql::Prepared(value)
    }
}

impl<'a> From<&'a BuiltStatement> for Sql<'a> {
    fn from(value: &'a BuiltStatement) -> Self {
        Sql::Built(value)
    }
}

/// Turns placeholder-annotated text into a template.
pub trait TemplateParser {
    /// # Errors
    /// Returns `ParseError` on malformed placeholder syntax.
    fn parse(&self, sql: &str) -> Result<StatementTemplate, ParseError>;
}

/// Binds parameters into a template, producing final SQL text.
pub trait TemplateFormatter {
    /// # Errors
    /// Returns `FormatError` when parameters do not fit the template's placeholders.
    fn format(
        &self,
        template: &StatementTemplate,
        params: &[RowValues],
        escape: &dyn Fn(&str) -> String,
    ) -> Result<String, FormatError>;
}

//! Routing errors.
//!
//! Registration-time failures (`TemplateSyntaxError`, `RouteError::DuplicateRoute`)
//! are fatal to startup. `RouteError::NotFound` is per-request and recoverable.

use std::fmt;
use std::panic::Location;

use axum::http::Method;
use thiserror::Error;

/// Why a declared template was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxReason {
    /// Template does not begin with `/`.
    MissingLeadingSlash,
    /// Two consecutive `/` separators.
    EmptySegment,
    /// `{` not immediately after a `/`.
    MisplacedBrace,
    /// Variable name empty, not starting with a letter, or outside `[A-Za-z0-9_]`.
    InvalidVariableName,
    /// `{` never closed before the end of the template.
    UnterminatedVariable,
    /// Literal segment not starting with a letter, or outside `[A-Za-z0-9_]`.
    InvalidLiteral,
    /// A literal segment declared after a variable segment.
    LiteralAfterVariable,
    /// Characters after a closing `}` that are not a `/`.
    TrailingCharacters,
}

impl fmt::Display for SyntaxReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SyntaxReason::MissingLeadingSlash => "template must start with '/'",
            SyntaxReason::EmptySegment => "empty segment between '/' separators",
            SyntaxReason::MisplacedBrace => "'{' is only allowed directly after '/'",
            SyntaxReason::InvalidVariableName => "variable names must match [A-Za-z][A-Za-z0-9_]*",
            SyntaxReason::UnterminatedVariable => "missing '}' in variable segment",
            SyntaxReason::InvalidLiteral => "literal segments must match [A-Za-z][A-Za-z0-9_]*",
            SyntaxReason::LiteralAfterVariable => "literal segments are not allowed after variables",
            SyntaxReason::TrailingCharacters => "unexpected characters after '}'",
        };
        f.write_str(text)
    }
}

/// A declared route template that could not be decomposed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "invalid route template `{template}` at byte {position}: {reason}{}",
    declared_suffix(.declared_at)
)]
pub struct TemplateSyntaxError {
    /// The offending template, verbatim.
    pub template: String,
    /// Byte offset where decomposition stopped.
    pub position: usize,
    pub reason: SyntaxReason,
    /// Source location of the declaring call, when it came through the registry.
    pub declared_at: Option<&'static Location<'static>>,
}

fn declared_suffix(declared_at: &Option<&'static Location<'static>>) -> String {
    declared_at
        .map(|location| format!(" (declared at {location})"))
        .unwrap_or_default()
}

/// Errors raised by the route registry and matcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error(transparent)]
    Syntax(#[from] TemplateSyntaxError),

    #[error("route already declared: {method} {key} (declared at {declared_at})")]
    DuplicateRoute {
        method: Method,
        key: String,
        declared_at: &'static Location<'static>,
    },

    #[error("no route matches {method} {path}")]
    NotFound { method: Method, path: String },
}

impl RouteError {
    /// True for the request-time "no route" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RouteError::NotFound { .. })
    }
}

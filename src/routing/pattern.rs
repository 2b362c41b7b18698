//! Route template decomposition.
//!
//! # Responsibilities
//! - Parse a declared template such as `/api/v1/user/fetchbyid/{id}`
//! - Split it into ordered literal segments and ordered variable names
//! - Reject malformed templates at registration time
//!
//! # Design Decisions
//! - Variables may only trail literals (`/a/{x}/b` is rejected)
//! - One variable per segment, written as `{name}`
//! - Byte-oriented scan; anything outside ASCII fails validation
//! - Only declared templates are validated, never request paths

use crate::routing::error::{SyntaxReason, TemplateSyntaxError};

/// Decomposed form of a declared path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTemplate {
    /// Literal segments in path order.
    pub literals: Vec<String>,
    /// Variable names in path order.
    pub variables: Vec<String>,
}

impl RouteTemplate {
    /// The `/`-joined literal prefix used as the lookup key.
    pub fn literal_key(&self) -> String {
        format!("/{}", self.literals.join("/"))
    }
}

/// Decompose a declared route template.
pub fn decompose(template: &str) -> Result<RouteTemplate, TemplateSyntaxError> {
    let fail = |position: usize, reason: SyntaxReason| TemplateSyntaxError {
        template: template.to_string(),
        position,
        reason,
        declared_at: None,
    };

    let bytes = template.as_bytes();
    if bytes.first() != Some(&b'/') {
        return Err(fail(0, SyntaxReason::MissingLeadingSlash));
    }

    let mut decomposed = RouteTemplate::default();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' => {
                i += 1;
                match bytes.get(i) {
                    // A single trailing slash is tolerated.
                    None => break,
                    Some(b'/') => return Err(fail(i, SyntaxReason::EmptySegment)),
                    Some(b'{') => {
                        let (name, next) = scan_variable(bytes, i + 1).map_err(|(p, r)| fail(p, r))?;
                        decomposed.variables.push(name);
                        i = next;
                    }
                    Some(_) => {
                        if !decomposed.variables.is_empty() {
                            return Err(fail(i, SyntaxReason::LiteralAfterVariable));
                        }
                        let (literal, next) = scan_literal(bytes, i).map_err(|(p, r)| fail(p, r))?;
                        decomposed.literals.push(literal);
                        i = next;
                    }
                }
            }
            b'{' => return Err(fail(i, SyntaxReason::MisplacedBrace)),
            _ => return Err(fail(i, SyntaxReason::TrailingCharacters)),
        }
    }

    Ok(decomposed)
}

type Scan = Result<(String, usize), (usize, SyntaxReason)>;

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scan a literal starting at `start`; stops at `/`, `{` or end of input.
fn scan_literal(bytes: &[u8], start: usize) -> Scan {
    if !bytes[start].is_ascii_alphabetic() {
        return Err((start, SyntaxReason::InvalidLiteral));
    }
    let mut end = start;
    while let Some(&b) = bytes.get(end) {
        if b == b'/' || b == b'{' {
            break;
        }
        if !is_word_byte(b) {
            return Err((end, SyntaxReason::InvalidLiteral));
        }
        end += 1;
    }
    Ok((ascii(&bytes[start..end]), end))
}

/// Scan a variable name starting just after `{`; returns the index after `}`.
fn scan_variable(bytes: &[u8], start: usize) -> Scan {
    match bytes.get(start) {
        None => return Err((start, SyntaxReason::UnterminatedVariable)),
        Some(b) if !b.is_ascii_alphabetic() => return Err((start, SyntaxReason::InvalidVariableName)),
        Some(_) => {}
    }
    let mut end = start;
    loop {
        match bytes.get(end) {
            None => return Err((end, SyntaxReason::UnterminatedVariable)),
            Some(b'}') => return Ok((ascii(&bytes[start..end]), end + 1)),
            Some(&b) if is_word_byte(b) => end += 1,
            Some(_) => return Err((end, SyntaxReason::InvalidVariableName)),
        }
    }
}

// Callers only pass ranges already checked to be ASCII word bytes.
fn ascii(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

//! Structured resource identifiers
//!
//! Remote resources are addressed by slash separated paths made of fixed keywords and
//! user supplied values. A type describes its layout as a list of [`Segment`]s and gets
//! parsing and formatting from [`parse_segments`] and [`format_segments`]. Parsing a
//! formatted identifier always yields the same identifier.

use crate::error::{Result, SdkError};
use std::fmt;

/// A typed identifier of one remote resource instance.
pub trait ResourceId: Sized + Clone + fmt::Debug + fmt::Display + Send + Sync {
    /// Human readable name of the identifier type, e.g. "DNS Resolver ID".
    fn kind() -> &'static str;

    fn parse(input: &str) -> Result<Self>;

    fn id(&self) -> String {
        self.to_string()
    }
}

/// One slash separated part of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// A fixed keyword such as `resourceGroups`.
    Static(&'static str),
    /// A user supplied value, named for error messages.
    User(&'static str),
    /// A parent identifier of any shape. Only valid as the first segment.
    Scope(&'static str),
}

/// Parses `input` against `segments` and returns the user supplied values in order.
/// A leading scope is returned first, with its leading slash.
///
/// With `insensitively` set, fixed keywords match regardless of case.
pub fn parse_segments(
    kind: &str,
    input: &str,
    segments: &[Segment],
    insensitively: bool,
) -> Result<Vec<String>> {
    let invalid = |reason: String| SdkError::InvalidId {
        kind: kind.to_string(),
        input: input.to_string(),
        reason,
    };

    let Some(rest) = input.strip_prefix('/') else {
        return Err(invalid("expected the ID to start with '/'".to_string()));
    };
    let parts: Vec<&str> = rest.split('/').collect();

    let (scope, fixed) = match segments.split_first() {
        Some((Segment::Scope(_), fixed)) => (true, fixed),
        _ => (false, segments),
    };

    let mut values = Vec::new();
    let parts = if scope {
        if parts.len() <= fixed.len() {
            return Err(invalid(format!(
                "expected a scope followed by {} segments but got {} segments",
                fixed.len(),
                parts.len()
            )));
        }
        let (scope_parts, rest) = parts.split_at(parts.len() - fixed.len());
        if scope_parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("the scope contained an empty segment".to_string()));
        }
        values.push(format!("/{}", scope_parts.join("/")));
        rest
    } else {
        if parts.len() != fixed.len() {
            return Err(invalid(format!(
                "expected {} segments but got {} segments",
                fixed.len(),
                parts.len()
            )));
        }
        &parts[..]
    };

    for (segment, part) in fixed.iter().zip(parts) {
        match segment {
            Segment::Static(keyword) => {
                let matches = if insensitively {
                    keyword.eq_ignore_ascii_case(part)
                } else {
                    keyword == part
                };
                if !matches {
                    return Err(invalid(format!(
                        "expected the segment {:?} but got {:?}",
                        keyword, part
                    )));
                }
            }
            Segment::User(name) => {
                if part.is_empty() {
                    return Err(invalid(format!("the segment {:?} was empty", name)));
                }
                values.push(part.to_string());
            }
            Segment::Scope(name) => {
                return Err(invalid(format!(
                    "the scope {:?} must be the first segment",
                    name
                )));
            }
        }
    }

    Ok(values)
}

/// Formats user supplied `values` (in the order [`parse_segments`] returns them) into an identifier.
pub fn format_segments(segments: &[Segment], values: &[&str]) -> String {
    let mut out = String::new();
    let mut values = values.iter();

    for segment in segments {
        match segment {
            Segment::Static(keyword) => {
                out.push('/');
                out.push_str(keyword);
            }
            Segment::User(_) | Segment::Scope(_) => {
                out.push('/');
                if let Some(value) = values.next() {
                    out.push_str(value.trim_start_matches('/'));
                }
            }
        }
    }

    out
}

//! Path and query composition.
//!
//! # Responsibilities
//! - Join the target's base path with each inbound request path
//! - Keep the decoded and escaped forms of the joined path in agreement
//! - Merge the target's fixed query with the inbound query
//!
//! # Design Decisions
//! - A path carries its escaped form only when that form is distinct from the
//!   default encoding of the decoded path (e.g. a literal `%2F` segment)
//! - The seam between the two paths always gets exactly one slash
//! - Escaped input is never decoded and re-encoded on the way out

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes left untouched when encoding a path: RFC 3986 `pchar` plus `/`.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@')
    .remove(b'/');

/// A URL path in decoded form, plus its escaped form when that differs from
/// the default encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlPath {
    path: String,
    raw_path: String,
}

impl UrlPath {
    /// Build from the wire (escaped) form of a path.
    pub fn from_escaped(escaped: &str) -> Self {
        let path = percent_decode_str(escaped).decode_utf8_lossy().into_owned();
        Self::with_raw(path, escaped.to_string())
    }

    /// Build from a decoded path with no distinct escaped form.
    pub fn from_decoded(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw_path: String::new(),
        }
    }

    fn with_raw(path: String, raw_path: String) -> Self {
        let raw_path = if encode_path(&path) == raw_path {
            String::new()
        } else {
            raw_path
        };
        Self { path, raw_path }
    }

    /// The decoded path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The distinct escaped form, or empty when the default encoding applies.
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn has_distinct_escaping(&self) -> bool {
        !self.raw_path.is_empty()
    }

    /// The path as it goes on the wire.
    pub fn escaped(&self) -> Cow<'_, str> {
        if self.has_distinct_escaping() {
            Cow::Borrowed(&self.raw_path)
        } else {
            encode_path(&self.path)
        }
    }
}

fn encode_path(path: &str) -> Cow<'_, str> {
    utf8_percent_encode(path, PATH_ENCODE_SET).into()
}

/// Where the seam between two paths needs work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seam {
    /// Both sides carry a slash; drop the leading one of the right side.
    Doubled,
    /// Neither side carries a slash; insert one.
    Missing,
    /// Exactly one slash already, or one side is empty.
    Single,
}

fn seam(left: &str, right: &str) -> Seam {
    if left.is_empty() || right.is_empty() {
        return Seam::Single;
    }
    match (left.ends_with('/'), right.starts_with('/')) {
        (true, true) => Seam::Doubled,
        (false, false) => Seam::Missing,
        _ => Seam::Single,
    }
}

fn join_at(left: &str, right: &str, seam: Seam) -> String {
    match seam {
        Seam::Doubled => format!("{}{}", left, right.strip_prefix('/').unwrap_or(right)),
        Seam::Missing => format!("{}/{}", left, right),
        Seam::Single => format!("{}{}", left, right),
    }
}

/// Join two plain paths with exactly one slash at the seam.
pub fn single_joining_slash(left: &str, right: &str) -> String {
    join_at(left, right, seam(left, right))
}

/// Join the target path with a request path.
///
/// When either side has a distinct escaped form, the seam is decided on the
/// escaped forms and the same cut is applied to both representations.
pub fn join_url_path(target: &UrlPath, request: &UrlPath) -> UrlPath {
    if !target.has_distinct_escaping() && !request.has_distinct_escaping() {
        return UrlPath::from_decoded(single_joining_slash(&target.path, &request.path));
    }

    let target_escaped = target.escaped();
    let request_escaped = request.escaped();
    let seam = seam(&target_escaped, &request_escaped);

    UrlPath::with_raw(
        join_at(&target.path, &request.path, seam),
        join_at(&target_escaped, &request_escaped, seam),
    )
}

/// Whether any segment of an escaped path is `.` or `..`, literally or
/// percent-encoded in any case. URL parsing resolves such segments, so they
/// could lift a request out of the target's base path.
pub fn has_dot_segment(escaped: &str) -> bool {
    escaped.split(['/', '\\']).any(|segment| {
        let decoded: Vec<u8> = percent_decode_str(segment).collect();
        decoded == b"." || decoded == b".."
    })
}

/// Merge the target's raw query with the request's raw query.
///
/// The target query, when present, always comes first.
pub fn merge_query(target: &str, request: &str) -> String {
    if target.is_empty() || request.is_empty() {
        format!("{}{}", target, request)
    } else {
        format!("{}&{}", target, request)
    }
}

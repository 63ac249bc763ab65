//! Position descriptors and their wire format.
//!
//! A descriptor is persisted as one URL-like string:
//!
//! ```text
//! <baseURL>?xpath=(startnode=<path>,startoffset=<int>,endnode=<path>,endoffset=<int>)
//! ```
//!
//! The format is stored by the highlight backend and must round-trip
//! exactly, so `Display` and `FromStr` are each other's inverse.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use pagemark_dom::Document;
use regex::Regex;

use crate::anchoring::encoder::text_between;
use crate::anchoring::normalize::{NormalizedPoint, Point, compare_normalized, to_stable_container};
use crate::anchoring::path::{StructuralPath, point_in_text_run, resolve_path};
use crate::error::AnchorError;
use crate::marker::MarkerStyle;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionDescriptor {
    pub base_url: String,
    pub start_path: StructuralPath,
    pub start_offset: usize,
    pub end_path: StructuralPath,
    pub end_offset: usize,
}

impl fmt::Display for PositionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}?xpath=(startnode={},startoffset={},endnode={},endoffset={})",
            self.base_url, self.start_path, self.start_offset, self.end_path, self.end_offset
        )
    }
}

fn descriptor_regex() -> &'static Regex {
    static DESCRIPTOR_REGEX: OnceLock<Regex> = OnceLock::new();
    DESCRIPTOR_REGEX.get_or_init(|| {
        Regex::new(concat!(
            r"^(?P<base>.*)\?xpath=\(",
            r"startnode=(?P<start_path>.*?),startoffset=(?P<start_offset>[^,]*),",
            r"endnode=(?P<end_path>.*?),endoffset=(?P<end_offset>[^)]*)\)$",
        ))
        .expect("Invalid descriptor regex")
    })
}

/// Parse a descriptor string.
pub fn decode(descriptor: &str) -> Result<PositionDescriptor, AnchorError> {
    let malformed = |reason: String| AnchorError::MalformedDescriptor {
        descriptor: descriptor.to_string(),
        reason,
    };

    let caps = descriptor_regex()
        .captures(descriptor)
        .ok_or_else(|| malformed("does not match the xpath descriptor grammar".to_string()))?;

    let offset = |name: &str| {
        let raw = &caps[name];
        raw.parse::<usize>()
            .map_err(|_| malformed(format!("{name} {raw:?} is not a non-negative integer")))
    };
    let path = |name: &str| {
        caps[name]
            .parse::<StructuralPath>()
            .map_err(|err| malformed(err.to_string()))
    };

    Ok(PositionDescriptor {
        base_url: caps["base"].to_string(),
        start_path: path("start_path")?,
        start_offset: offset("start_offset")?,
        end_path: path("end_path")?,
        end_offset: offset("end_offset")?,
    })
}

impl FromStr for PositionDescriptor {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// A descriptor relocated against a live document.
///
/// Both points are normalized and `start` never follows `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: NormalizedPoint,
    pub end: NormalizedPoint,
}

impl ResolvedRange {
    /// The text the range currently covers.
    pub fn text(&self, doc: &Document) -> String {
        text_between(doc, self.start, self.end)
    }

    pub fn is_collapsed(&self, doc: &Document) -> bool {
        compare_normalized(doc, self.start, self.end) == Ordering::Equal
    }
}

fn relocate(
    doc: &Document,
    style: &MarkerStyle,
    path: &StructuralPath,
    offset: usize,
) -> Result<NormalizedPoint, AnchorError> {
    let node = resolve_path(doc, style, path)
        .ok_or_else(|| AnchorError::AnchorNotFound(format!("no node at {path}")))?;
    // A hand-written path may name a text run that painting has split;
    // normalizing brings it back to a stable container either way.
    let point = if doc[node].is_text() {
        point_in_text_run(doc, style, node, offset)
    } else {
        Point::new(node, offset)
    };
    to_stable_container(doc, style, point)
        .map_err(|err| AnchorError::AnchorNotFound(format!("{path}: {err}")))
}

/// Resolve both paths of `descriptor` in `doc`.
///
/// `AnchorNotFound` means the document no longer matches the descriptor;
/// callers painting a batch should skip this highlight and continue.
pub fn resolve(
    doc: &Document,
    style: &MarkerStyle,
    descriptor: &PositionDescriptor,
) -> Result<ResolvedRange, AnchorError> {
    let start = relocate(doc, style, &descriptor.start_path, descriptor.start_offset)?;
    let end = relocate(doc, style, &descriptor.end_path, descriptor.end_offset)?;
    let range = match compare_normalized(doc, start, end) {
        Ordering::Greater => ResolvedRange {
            start: end,
            end: start,
        },
        Ordering::Less | Ordering::Equal => ResolvedRange { start, end },
    };
    Ok(range)
}

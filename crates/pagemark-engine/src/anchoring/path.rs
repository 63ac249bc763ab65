//! Structural paths: XPath-like locators from the document root to a node.
//!
//! A path is a list of steps, one per tree level below the root. Each step
//! names the node's tag and its 1-based position among same-tag element
//! siblings, so `/div[1]/p[2]` is the second `<p>` inside the first `<div>`.
//! Text nodes use `text()[n]`, counting runs of adjacent text. The root
//! itself is `/`. Highlight markers never count: paths describe the page
//! as it is without any highlights painted.
//!
//! Positions are computed against the current tree shape. Inserting or
//! removing same-tag siblings anywhere above an anchored node changes its
//! path, and an old path may then resolve to a different node. That is a
//! known limitation of sibling-index paths and is not corrected here.

use std::fmt;
use std::str::FromStr;

use pagemark_dom::{Document, NodeData, NodeId};
use thiserror::Error;

use crate::anchoring::normalize::Point;
use crate::marker::MarkerStyle;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Element { tag: String, position: usize },
    Text { position: usize },
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Element { tag, position } => write!(f, "{tag}[{position}]"),
            PathStep::Text { position } => write!(f, "text()[{position}]"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid structural path {path:?}: {reason}")]
pub struct PathSyntaxError {
    pub path: String,
    pub reason: &'static str,
}

/// A parsed structural path. `Display` and `FromStr` round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StructuralPath {
    steps: Vec<PathStep>,
}

impl StructuralPath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("/");
        }
        for step in &self.steps {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

impl FromStr for StructuralPath {
    type Err = PathSyntaxError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let err = |reason| PathSyntaxError {
            path: path.to_string(),
            reason,
        };

        let rest = path.strip_prefix('/').ok_or_else(|| err("must start with '/'"))?;
        if rest.is_empty() {
            return Ok(Self::default());
        }

        let mut steps = Vec::new();
        for segment in rest.split('/') {
            let (name, index) = segment
                .strip_suffix(']')
                .and_then(|s| s.split_once('['))
                .ok_or_else(|| err("step must look like name[n]"))?;
            let position: usize = index
                .parse()
                .map_err(|_| err("step index must be a positive integer"))?;
            if position == 0 {
                return Err(err("step index is 1-based"));
            }
            let step = if name == "text()" {
                PathStep::Text { position }
            } else if !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':')
            {
                PathStep::Element {
                    tag: name.to_ascii_lowercase(),
                    position,
                }
            } else {
                return Err(err("step name must be a tag name or text()"));
            };
            steps.push(step);
        }
        Ok(Self { steps })
    }
}

/// Children of `parent` as they would be with every marker unwrapped.
fn unmarked_children(doc: &Document, style: &MarkerStyle, parent: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    for &child in doc.children(parent) {
        if style.is_marker(doc, child) {
            out.extend(unmarked_children(doc, style, child));
        } else {
            out.push(child);
        }
    }
    out
}

/// Nearest ancestor of `node` that is not a marker.
fn unmarked_parent(doc: &Document, style: &MarkerStyle, node: NodeId) -> Option<NodeId> {
    doc.ancestors(node)
        .find(|ancestor| !style.is_marker(doc, *ancestor))
}

/// Start of each run of adjacent text nodes in `siblings`.
fn text_run_starts(doc: &Document, siblings: &[NodeId]) -> Vec<NodeId> {
    let mut starts = Vec::new();
    let mut previous_is_text = false;
    for &sibling in siblings {
        let is_text = doc[sibling].is_text();
        if is_text && !previous_is_text {
            starts.push(sibling);
        }
        previous_is_text = is_text;
    }
    starts
}

/// Step from `parent` down to `child`, or `None` for the document root.
fn step_for(
    doc: &Document,
    style: &MarkerStyle,
    parent: NodeId,
    child: NodeId,
) -> Option<PathStep> {
    let siblings = unmarked_children(doc, style, parent);
    let index = siblings.iter().position(|sibling| *sibling == child)?;
    let preceding = &siblings[..index];

    match &doc[child].data {
        NodeData::Document => None,
        NodeData::Element(element) => {
            let same_tag = preceding
                .iter()
                .filter(|sibling| doc[**sibling].tag_name() == Some(element.name.as_str()))
                .count();
            Some(PathStep::Element {
                tag: element.name.clone(),
                position: same_tag + 1,
            })
        }
        NodeData::Text(_) => {
            let runs = text_run_starts(doc, &siblings[..=index]).len();
            Some(PathStep::Text { position: runs })
        }
    }
}

/// Compute the path of `node` from the top of its tree.
///
/// Markers are transparent: steps are counted as if every marker had been
/// unwrapped, so painting never changes the path of page content. A marker
/// has no step of its own and gets the path of its enclosing container.
/// Text steps count runs of adjacent text, which painting splits and
/// unpainting merges back.
///
/// For a connected node the path starts at the document root. A detached
/// node gets a path relative to its detached subtree, which will not resolve.
pub fn compute_path(doc: &Document, style: &MarkerStyle, node: NodeId) -> StructuralPath {
    let mut steps = Vec::new();
    let mut current = node;
    if style.is_marker(doc, current) {
        current = unmarked_parent(doc, style, current).unwrap_or(current);
    }
    while let Some(parent) = unmarked_parent(doc, style, current) {
        steps.extend(step_for(doc, style, parent, current));
        current = parent;
    }
    steps.reverse();
    StructuralPath { steps }
}

/// Walk `path` from the document root. `None` means some step has no match,
/// usually because the document changed since the path was computed.
///
/// A text step resolves to the first node of its run.
pub fn resolve_path(doc: &Document, style: &MarkerStyle, path: &StructuralPath) -> Option<NodeId> {
    let mut current = doc.root();
    for step in &path.steps {
        let children = unmarked_children(doc, style, current);
        current = match step {
            PathStep::Element { tag, position } => children
                .into_iter()
                .filter(|child| doc[*child].tag_name() == Some(tag.as_str()))
                .nth(position.checked_sub(1)?)?,
            PathStep::Text { position } => text_run_starts(doc, &children)
                .into_iter()
                .nth(position.checked_sub(1)?)?,
        };
    }
    Some(current)
}

/// Re-express `offset` into the text run starting at `first` as a point in
/// the run's node that holds it.
///
/// An offset past the end of the run lands on its last node, where
/// normalization reports it as out of range.
pub(crate) fn point_in_text_run(
    doc: &Document,
    style: &MarkerStyle,
    first: NodeId,
    offset: usize,
) -> Point {
    let siblings = unmarked_parent(doc, style, first)
        .map(|parent| unmarked_children(doc, style, parent))
        .unwrap_or_else(|| vec![first]);
    let run = siblings
        .into_iter()
        .skip_while(|sibling| *sibling != first)
        .take_while(|sibling| doc[*sibling].is_text());

    let mut remaining = offset;
    let mut last = first;
    for node in run {
        let len = doc.text_len(node);
        if remaining <= len {
            return Point::new(node, remaining);
        }
        remaining -= len;
        last = node;
    }
    Point::new(last, remaining)
}

//! # Anchoring
//!
//! Turns a live selection into a [`PositionDescriptor`] and back again.
//!
//! ## Pipeline
//!
//! 1. **`normalize`**: a raw point inside a text node or a marker climbs to
//!    its nearest stable container, with the offset re-expressed as an
//!    absolute char count into that container's text.
//! 2. **`path`**: each container is located by an XPath-like structural path
//!    (`/div[1]/p[2]`), 1-based among same-tag siblings. Highlight markers
//!    are transparent to paths.
//! 3. **`encoder`**: both endpoints are normalized, put in document order and
//!    written as one descriptor string.
//! 4. **`descriptor`**: the string is decoded and both paths are resolved
//!    against the current document.
//!
//! Paths are computed from sibling indices, so unrelated changes to the page
//! between capture and restore can make a descriptor resolve to a different
//! node, or to none at all.

pub mod descriptor;
pub mod encoder;
pub mod normalize;
pub mod path;

pub use descriptor::{PositionDescriptor, ResolvedRange, decode, resolve};
pub use encoder::{Selection, encode, ordered_endpoints, selected_text};
pub use normalize::{
    NormalizeError, NormalizedPoint, Point, compare, compare_normalized, to_stable_container,
};
pub use path::{PathStep, PathSyntaxError, StructuralPath, compute_path, resolve_path};

//! Painting resolved ranges into the document and removing them again.
//!
//! Markers are created around text runs only, never around elements, so a
//! highlight spanning several inline elements becomes one marker per text
//! fragment.

pub mod leaf;
pub mod paint;
pub mod unpaint;

pub use leaf::{Affinity, Leaf, locate_leaf};
pub use paint::{PaintReport, paint};
pub use unpaint::{UnpaintReport, unpaint};

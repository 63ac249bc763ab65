//! Durable highlights over an HTML document.
//!
//! A user's selection is anchored as a [`PositionDescriptor`] string that can
//! be stored anywhere. Later the descriptor is relocated against the page,
//! which may have changed in the meantime, and painted as marker elements.
//! Removing a highlight unwraps its markers and merges the text back.
//!
//! ```
//! use pagemark_dom::parse_html;
//! use pagemark_engine::{MarkerStyle, MemoryStore, Point, Selection, capture_selection, load_page};
//!
//! let style = MarkerStyle::default();
//! let mut store = MemoryStore::default();
//!
//! let mut doc = parse_html("<p>Hello world</p>");
//! let text = doc.children(doc.children(doc.root())[0])[0];
//! let selection = Selection::new(Point::new(text, 6), Point::new(text, 11));
//! capture_selection(&mut doc, &style, &mut store, &selection, "https://example.com/a").unwrap();
//!
//! // A fresh copy of the page picks the highlight up from the store.
//! let mut reloaded = parse_html("<p>Hello world</p>");
//! let report = load_page(&mut reloaded, &style, &store, "https://example.com/a");
//! assert_eq!(report.painted.len(), 1);
//! assert_eq!(reloaded.to_html(), doc.to_html());
//! ```

pub mod anchoring;
pub mod error;
pub mod interaction;
pub mod io;
pub mod marker;
pub mod page;
pub mod painting;
pub mod records;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use anchoring::*;
pub use error::*;
pub use interaction::{
    ActiveHighlight, HoverTarget, InteractionController, InteractionTiming, TimerSlot, Transition,
};
pub use io::FileStore;
pub use marker::*;
pub use page::*;
pub use painting::*;
pub use records::*;

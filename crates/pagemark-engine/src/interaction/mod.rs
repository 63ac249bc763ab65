//! Hover and delete behaviour over painted markers.
//!
//! The controller keeps no state that could not be rebuilt from the
//! document: the active highlight is whatever the last hover resolved to,
//! and visual state lives in the marker attributes. Delays are handled by
//! one [`TimerSlot`]; the host feeds it the current time through `tick`.

pub mod timer;

use std::time::{Duration, Instant};

use pagemark_dom::{Document, NodeId};

use crate::error::HighlightError;
use crate::marker::{HighlightId, MarkerStyle};
use crate::page::delete_highlight;
use crate::painting::UnpaintReport;
use crate::records::HighlightStore;

pub use timer::TimerSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionTiming {
    /// Delay before a hovered highlight becomes active.
    pub hover_debounce: Duration,
    /// Delay before leaving a highlight clears it.
    pub leave_grace: Duration,
}

impl Default for InteractionTiming {
    fn default() -> Self {
        Self {
            hover_debounce: Duration::from_millis(50),
            leave_grace: Duration::from_millis(150),
        }
    }
}

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    /// A node of the document, marker or not.
    Node(NodeId),
    /// The floating delete control shown for the active highlight.
    DeleteAffordance,
    /// Anywhere outside the document.
    Outside,
}

/// The highlight currently shown as active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveHighlight {
    pub id: HighlightId,
    /// Every marker carrying the id, in document order.
    pub fragments: Vec<NodeId>,
    /// Where the delete affordance is positioned: the first fragment.
    pub affordance_anchor: NodeId,
}

/// A change of active state produced by [`InteractionController::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Activated(HighlightId),
    Cleared(HighlightId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Activate(HighlightId),
    Clear,
}

#[derive(Debug, Default)]
pub struct InteractionController {
    timing: InteractionTiming,
    timer: TimerSlot<Pending>,
    active: Option<ActiveHighlight>,
}

impl InteractionController {
    pub fn new(timing: InteractionTiming) -> Self {
        Self {
            timing,
            timer: TimerSlot::new(),
            active: None,
        }
    }

    pub fn active(&self) -> Option<&ActiveHighlight> {
        self.active.as_ref()
    }

    /// When the host should call [`tick`](Self::tick) next, if anything is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn pointer_enter(
        &mut self,
        doc: &Document,
        style: &MarkerStyle,
        target: HoverTarget,
        now: Instant,
    ) {
        let node = match target {
            HoverTarget::DeleteAffordance => {
                self.cancel_clear();
                return;
            }
            HoverTarget::Outside => return,
            HoverTarget::Node(node) => node,
        };
        let Some(id) = style
            .marker_for(doc, node)
            .and_then(|marker| style.ids(doc, marker).topmost().cloned())
        else {
            return;
        };

        if self.active.as_ref().is_some_and(|active| active.id == id) {
            // Moving between fragments of the active highlight.
            self.timer.cancel();
            return;
        }
        self.timer
            .schedule(now + self.timing.hover_debounce, Pending::Activate(id));
    }

    /// The pointer left whatever it was over, heading for `related`.
    pub fn pointer_leave(
        &mut self,
        doc: &Document,
        style: &MarkerStyle,
        related: HoverTarget,
        now: Instant,
    ) {
        match related {
            HoverTarget::DeleteAffordance => return,
            HoverTarget::Node(node) if style.marker_for(doc, node).is_some() => return,
            HoverTarget::Node(_) | HoverTarget::Outside => {}
        }
        if self.active.is_some() || self.timer.is_pending() {
            self.timer
                .schedule(now + self.timing.leave_grace, Pending::Clear);
        }
    }

    /// Run the pending action if it is due.
    pub fn tick(
        &mut self,
        doc: &mut Document,
        style: &MarkerStyle,
        now: Instant,
    ) -> Option<Transition> {
        match self.timer.take_due(now)? {
            Pending::Activate(id) => {
                self.deactivate(doc, style);
                let fragments = style.markers_for(doc, &id);
                let affordance_anchor = *fragments.first()?;
                for fragment in &fragments {
                    let _ = doc.set_attr(*fragment, &style.active_attribute, "true");
                }
                log::debug!("highlight {id} active on {} fragments", fragments.len());
                self.active = Some(ActiveHighlight {
                    id: id.clone(),
                    fragments,
                    affordance_anchor,
                });
                Some(Transition::Activated(id))
            }
            Pending::Clear => self.deactivate(doc, style).map(Transition::Cleared),
        }
    }

    /// Delete the active highlight.
    ///
    /// The markers are removed first; the store is asked afterwards and a
    /// store failure does not bring them back.
    pub fn activate_delete(
        &mut self,
        doc: &mut Document,
        style: &MarkerStyle,
        store: &mut dyn HighlightStore,
    ) -> Result<Option<UnpaintReport>, HighlightError> {
        self.timer.cancel();
        let Some(id) = self.deactivate(doc, style) else {
            return Ok(None);
        };
        delete_highlight(doc, style, store, &id).map(Some)
    }

    fn cancel_clear(&mut self) {
        if self.timer.pending() == Some(&Pending::Clear) {
            self.timer.cancel();
        }
    }

    fn deactivate(&mut self, doc: &mut Document, style: &MarkerStyle) -> Option<HighlightId> {
        let active = self.active.take()?;
        // Fragments may have been unwrapped since, and their slots reused.
        for fragment in active.fragments {
            if style.ids(doc, fragment).contains(&active.id) {
                doc.remove_attr(fragment, &style.active_attribute);
            }
        }
        Some(active.id)
    }
}

//! One page session: restoring saved highlights, capturing new ones and
//! deleting them.

use pagemark_dom::Document;

use crate::anchoring::{ResolvedRange, Selection, encode, ordered_endpoints, resolve, selected_text};
use crate::error::{AnchorError, HighlightError};
use crate::marker::{HighlightId, MarkerStyle};
use crate::painting::{PaintReport, UnpaintReport, paint, unpaint};
use crate::records::{HighlightRecord, HighlightStore, NewHighlight};

/// Result of painting a batch of saved highlights.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Highlights now visible, in paint order.
    pub painted: Vec<HighlightId>,
    /// Highlights that could not be shown, with the reason.
    pub skipped: Vec<(HighlightId, AnchorError)>,
}

fn restore_one(
    doc: &mut Document,
    style: &MarkerStyle,
    record: &HighlightRecord,
) -> Result<PaintReport, AnchorError> {
    let descriptor = record.descriptor()?;
    let range = resolve(doc, style, &descriptor)?;
    let current = range.text(doc);
    if current != record.text {
        log::warn!(
            "highlight {} now covers {current:?} instead of {:?}",
            record.id,
            record.text
        );
    }
    paint(doc, style, &range, &record.id)
}

/// Paint every record, in order.
///
/// A record that fails to decode, resolve or paint is logged and skipped;
/// it never stops the rest of the batch.
pub fn restore_highlights(
    doc: &mut Document,
    style: &MarkerStyle,
    records: &[HighlightRecord],
) -> BatchReport {
    let mut report = BatchReport::default();
    for record in records {
        let outcome = restore_one(doc, style, record).and_then(|painted| {
            if painted.is_painted() {
                Ok(())
            } else {
                Err(painted.skipped.into_iter().next().unwrap_or_else(|| {
                    AnchorError::AnchorNotFound("range covers no text".to_string())
                }))
            }
        });
        match outcome {
            Ok(()) => report.painted.push(record.id.clone()),
            Err(err) => {
                log::warn!("skipping highlight {}: {err}", record.id);
                report.skipped.push((record.id.clone(), err));
            }
        }
    }
    log::info!(
        "restored {} highlights, skipped {}",
        report.painted.len(),
        report.skipped.len()
    );
    report
}

/// Fetch the highlights saved for `page_url` and paint them.
///
/// If the store cannot be reached the page simply shows no highlights.
pub fn load_page(
    doc: &mut Document,
    style: &MarkerStyle,
    store: &dyn HighlightStore,
    page_url: &str,
) -> BatchReport {
    match store.fetch(page_url) {
        Ok(records) => restore_highlights(doc, style, &records),
        Err(err) => {
            log::warn!("could not fetch highlights for {page_url}: {err}");
            BatchReport::default()
        }
    }
}

/// Anchor `selection`, save it and paint it under the id the store returns.
pub fn capture_selection(
    doc: &mut Document,
    style: &MarkerStyle,
    store: &mut dyn HighlightStore,
    selection: &Selection,
    page_url: &str,
) -> Result<HighlightRecord, HighlightError> {
    let descriptor = encode(doc, style, selection, page_url)?;
    let text = selected_text(doc, style, selection)?;
    let (start, end) = ordered_endpoints(doc, style, selection)?;

    let record = store.save(NewHighlight {
        text,
        position: descriptor.to_string(),
    })?;

    // The record is saved; a paint failure only costs the visual.
    if let Err(err) = paint(doc, style, &ResolvedRange { start, end }, &record.id) {
        log::warn!("saved highlight {} could not be painted: {err}", record.id);
    }
    Ok(record)
}

/// Remove highlight `id` from the page, then from the store.
///
/// The markers stay removed even if the store reports a failure.
pub fn delete_highlight(
    doc: &mut Document,
    style: &MarkerStyle,
    store: &mut dyn HighlightStore,
    id: &HighlightId,
) -> Result<UnpaintReport, HighlightError> {
    let report = unpaint(doc, style, id);
    store.delete(id).inspect_err(|err| {
        log::warn!("highlight {id} was removed from the page but not from the store: {err}");
    })?;
    Ok(report)
}

//! "Showing X of Y products" progress bar.
use std::sync::LazyLock;

use html::dom_utils::collapsed_text;
use html::select::select_first;
use html::{Document, Matcher};

use regex::Regex;

use crate::config::Markup;

pub const PROGRESS_ATTR: &str = "data-products-progress";
pub const PROGRESS_BAR_ATTR: &str = "data-products-progress-bar";
pub const PRODUCT_CARD_TAG: &str = "product-card";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub shown: u64,
    pub total: u64,
    pub percent: f64,
}

static SHOWN_OF_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:di|of)\s*(\d+)").expect("shown-of-total regex"));

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("integer regex"));

/// Reads `shown`/`total` from count text like "12 of 15 products" or "12 di 15 prodotti",
/// falling back to the first two integers in the text.
pub fn parse_shown_total(text: &str) -> Option<(u64, u64)> {
    if let Some(caps) = SHOWN_OF_TOTAL.captures(text) {
        let shown = caps[1].parse().ok()?;
        let total = caps[2].parse().ok()?;
        return Some((shown, total));
    }
    let mut numbers = INTEGER
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u64>().ok());
    Some((numbers.next()?, numbers.next()?))
}

/// Recomputes the progress bar from the rendered count. No-op when the page has no
/// progress element or no total can be determined.
pub fn update_products_shown_progress(doc: &mut Document, markup: &Markup) -> Option<Progress> {
    let progress = doc.find(&Matcher::has_attr(PROGRESS_ATTR))?;
    let progress_id = progress.id();
    let data_total: u64 = progress
        .attr("data-total")
        .and_then(|t| t.trim().parse().ok())
        .unwrap_or(0);
    let bar = select_first(progress, &Matcher::has_attr(PROGRESS_BAR_ATTR))?.id();

    let (mut shown, mut total) = doc
        .element_by_id(&markup.product_count_id)
        .and_then(|count| parse_shown_total(&collapsed_text(count)))
        .unwrap_or((0, 0));
    if total == 0 {
        total = data_total;
    }
    if shown == 0 {
        shown = doc
            .element_by_id(&markup.section_element_id)
            .map(|grid| {
                grid.descendants()
                    .filter(|n| n.is_element_named(PRODUCT_CARD_TAG))
                    .count() as u64
            })
            .unwrap_or(0);
    }
    if total == 0 {
        return None;
    }

    let percent = (shown as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
    let rounded = (percent * 100.0).round() / 100.0;
    doc.update(bar, |n| n.set_attr("style", &format!("width: {rounded}%")));
    doc.update(progress_id, |n| {
        n.set_attr("aria-valuemin", "0");
        n.set_attr("aria-valuemax", &total.to_string());
        n.set_attr("aria-valuenow", &shown.to_string());
    });
    Some(Progress {
        shown,
        total,
        percent: rounded,
    })
}

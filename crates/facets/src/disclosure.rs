//! Open/closed state of filter blocks and the filter drawer.
use html::dom_utils::collapsed_text;
use html::select::select_first;
use html::{Document, Id, Matcher, Node};

use crate::config::Markup;

pub const PRICE_RANGE_TAG: &str = "price-range";
const PRICE_KEY_PREFIX: &str = "filter.v.price";
const PRICE_LABELS: [&str; 2] = ["price", "prezzo"];

fn set_open(node: &mut Node, open: bool) {
    if node.is_element_named("details") {
        if open {
            node.set_attr("open", "");
        } else {
            node.remove_attr("open");
        }
    } else if node.has_attr("aria-expanded") {
        node.set_attr("aria-expanded", if open { "true" } else { "false" });
    } else {
        node.toggle_class("is-open", open);
    }
}

pub fn is_open(node: &Node) -> bool {
    if node.is_element_named("details") {
        return node.has_attr("open");
    }
    if let Some(expanded) = node.attr("aria-expanded") {
        return expanded == "true";
    }
    node.has_class("is-open")
}

fn holds_price_controls(block: &Node) -> bool {
    block.descendants().any(|n| {
        n.is_element_named(PRICE_RANGE_TAG)
            || (n.is_element_named("input")
                && n.attr("name").is_some_and(|name| name.starts_with(PRICE_KEY_PREFIX)))
    })
}

fn has_price_summary(block: &Node, markup: &Markup) -> bool {
    let summary = if block.is_element_named("summary") {
        Some(block)
    } else {
        select_first(block, &Matcher::tag("summary"))
            .or_else(|| select_first(block, &Matcher::class(&markup.summary_class)))
    };
    summary.is_some_and(|s| {
        let text = collapsed_text(s).to_lowercase();
        PRICE_LABELS.iter().any(|label| text.contains(label))
    })
}

/// Opens the first filter block holding price controls (or, failing that, the first one
/// whose summary reads as a price label) and closes every other block. Returns the opened
/// block, or `None` (leaving everything as is) when there is no price block.
pub fn open_only_price_filter(doc: &mut Document, markup: &Markup) -> Option<Id> {
    let blocks = doc.ids_matching(&Matcher::class(&markup.filter_block_class));
    let find = |pred: &dyn Fn(&Node) -> bool| {
        blocks
            .iter()
            .copied()
            .find(|id| doc.get(*id).is_some_and(pred))
    };
    let price = find(&holds_price_controls)
        .or_else(|| find(&|n: &Node| has_price_summary(n, markup)))?;
    for id in blocks {
        doc.update(id, |n| set_open(n, id == price));
    }
    Some(price)
}

/// Flips the first `<details>` inside the drawer element. `None` when the drawer has no
/// disclosure to toggle.
pub fn toggle_drawer(doc: &mut Document, drawer: Id) -> Option<bool> {
    let details = doc.find_in(drawer, &Matcher::tag("details"))?.id();
    let mut now_open = false;
    doc.update(details, |n| {
        now_open = !is_open(n);
        set_open(n, now_open);
    });
    Some(now_open)
}

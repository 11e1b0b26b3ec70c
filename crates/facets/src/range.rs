//! Dual-handle price slider bound to the two price text inputs.
//!
//! The text inputs are the source of truth the query builder reads. Slider motion is
//! mirrored into them and reported back to the caller as [`Signal`]s so the engine can
//! treat it exactly like typed input.
use html::select::select_first;
use html::{Document, Id, Matcher, Node};

use crate::page::Page;
use crate::query::parse_decimal;

pub const HOST_TAG: &str = "price-range";
const INPUT_ATTR: &str = "data-price-input";
const SLIDER_MIN_ATTR: &str = "data-price-slider-min";
const SLIDER_MAX_ATTR: &str = "data-price-slider-max";
const RANGE_BAR_ATTR: &str = "data-price-slider-range";
const MIN_LABEL_ATTR: &str = "data-price-slider-min-label";
const MAX_LABEL_ATTR: &str = "data-price-slider-max-label";
const CURRENCY_ATTR: &str = "data-currency-symbol";

const ALLOWED_KEYS: [&str; 9] = [
    "Backspace",
    "Tab",
    "Enter",
    "ArrowUp",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "Delete",
    "Escape",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    Min,
    Max,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalKind {
    Change,
    Input,
}

/// An event the adapter raises on one of its text inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signal {
    pub target: Id,
    pub kind: SignalKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PriceRange {
    host: Id,
    min_input: Id,
    max_input: Id,
    slider_min: Option<Id>,
    slider_max: Option<Id>,
    range_bar: Option<Id>,
    min_label: Option<Id>,
    max_label: Option<Id>,
    currency_symbol: String,
}

/// Lenient numeric read: missing, blank, or malformed values count as zero.
pub fn parse_num(raw: Option<&str>) -> f64 {
    raw.and_then(parse_decimal).unwrap_or(0.0)
}

/// Keys a price text input accepts.
pub fn key_allowed(key: &str) -> bool {
    if ALLOWED_KEYS.contains(&key) {
        return true;
    }
    let mut chars = key.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_digit() || c == '.' || c == ',')
}

fn format_num(n: f64) -> String {
    format!("{n}")
}

impl PriceRange {
    /// Binds to a `price-range` element. `None` unless both text inputs are present.
    pub fn bind(doc: &Document, host: Id) -> Option<Self> {
        let host_node = doc.get(host)?;
        let find = |m: Matcher| select_first(host_node, &m).map(Node::id);
        let min_input = find(Matcher::tag("input").and(Matcher::attr_eq(INPUT_ATTR, "min")))?;
        let max_input = find(Matcher::tag("input").and(Matcher::attr_eq(INPUT_ATTR, "max")))?;
        Some(Self {
            host,
            min_input,
            max_input,
            slider_min: find(Matcher::has_attr(SLIDER_MIN_ATTR)),
            slider_max: find(Matcher::has_attr(SLIDER_MAX_ATTR)),
            range_bar: find(Matcher::has_attr(RANGE_BAR_ATTR)),
            min_label: find(Matcher::has_attr(MIN_LABEL_ATTR)),
            max_label: find(Matcher::has_attr(MAX_LABEL_ATTR)),
            currency_symbol: host_node.attr(CURRENCY_ATTR).unwrap_or("").to_string(),
        })
    }

    pub fn bind_all(doc: &Document) -> Vec<Self> {
        doc.ids_matching(&Matcher::tag(HOST_TAG))
            .into_iter()
            .filter_map(|host| {
                let bound = Self::bind(doc, host);
                if bound.is_none() {
                    log::debug!(target: "facets::range", "{HOST_TAG} {host:?} has no min/max inputs");
                }
                bound
            })
            .collect()
    }

    /// Initial sync after binding.
    pub fn init(&self, page: &mut Page) {
        self.set_min_and_max_values(page);
        self.sync_from_inputs_to_slider(page);
    }

    pub fn host(&self) -> Id {
        self.host
    }

    pub fn input(&self, handle: Handle) -> Id {
        match handle {
            Handle::Min => self.min_input,
            Handle::Max => self.max_input,
        }
    }

    /// Which text input `id` is, if it belongs to this range.
    pub fn input_handle(&self, id: Id) -> Option<Handle> {
        if id == self.min_input {
            Some(Handle::Min)
        } else if id == self.max_input {
            Some(Handle::Max)
        } else {
            None
        }
    }

    /// Which slider `id` is. Sliders only count when both are present.
    pub fn slider_handle(&self, id: Id) -> Option<Handle> {
        let (min, max) = (self.slider_min?, self.slider_max?);
        if id == min {
            Some(Handle::Min)
        } else if id == max {
            Some(Handle::Max)
        } else {
            None
        }
    }

    /// A slider handle moved: keep low ≤ high, copy both slider values into the text
    /// inputs, and return the `change` then `input` signals for both inputs.
    pub fn on_slider_input(&self, page: &mut Page, which: Handle) -> Vec<Signal> {
        let (Some(slider_min), Some(slider_max)) = (self.slider_min, self.slider_max) else {
            return Vec::new();
        };
        let min = parse_num(page.value(slider_min));
        let max = parse_num(page.value(slider_max));
        match which {
            Handle::Min if min > max => {
                page.set_value(slider_min, &format_num(max));
            }
            Handle::Max if max < min => {
                page.set_value(slider_max, &format_num(min));
            }
            _ => {}
        }

        let low = page.value(slider_min).unwrap_or("").to_string();
        let high = page.value(slider_max).unwrap_or("").to_string();
        page.set_value(self.min_input, &low);
        page.set_value(self.max_input, &high);

        self.sync_slider_ui(page);

        let mut signals = Vec::with_capacity(4);
        for kind in [SignalKind::Change, SignalKind::Input] {
            for target in [self.min_input, self.max_input] {
                signals.push(Signal { target, kind });
            }
        }
        signals
    }

    /// A text input committed a value: clamp it, refresh the cross-bounds, resync sliders.
    pub fn on_range_change(&self, page: &mut Page, input: Id) {
        self.adjust_to_valid_values(page, input);
        self.set_min_and_max_values(page);
        self.sync_from_inputs_to_slider(page);
    }

    /// Each input records the other's current value (or declared bound) as `data-min` /
    /// `data-max`.
    pub fn set_min_and_max_values(&self, page: &mut Page) {
        let doc = page.doc_mut();
        let bound = |doc: &Document, id: Id, fallback_attr: &str| -> Option<String> {
            let node = doc.get(id)?;
            node.attr("value")
                .filter(|v| !v.is_empty())
                .or_else(|| node.attr(fallback_attr))
                .map(str::to_string)
        };
        let upper = bound(&*doc, self.max_input, "max");
        let lower = bound(&*doc, self.min_input, "min");
        set_or_clear(doc, self.min_input, "data-max", upper.as_deref());
        set_or_clear(doc, self.max_input, "data-min", lower.as_deref());
    }

    /// Clamps `input` to its declared `min` (default 0) and `max`. A missing `max` leaves
    /// the upper side unclamped.
    pub fn adjust_to_valid_values(&self, page: &mut Page, input: Id) {
        let Some(node) = page.doc().get(input) else {
            return;
        };
        let value = parse_num(node.attr("value"));
        let min = parse_num(node.attr("min"));
        let max = node.attr("max").map(|m| parse_num(Some(m)));

        if value < min {
            page.set_value(input, &format_num(min));
        }
        if let Some(max) = max
            && value > max
        {
            page.set_value(input, &format_num(max));
        }
    }

    pub fn sync_from_inputs_to_slider(&self, page: &mut Page) {
        let (Some(slider_min), Some(slider_max)) = (self.slider_min, self.slider_max) else {
            return;
        };
        let non_empty = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);
        let doc = page.doc();
        let min = non_empty(page.value(self.min_input))
            .or_else(|| non_empty(doc.get(slider_min).and_then(|n| n.attr("min"))))
            .unwrap_or_else(|| "0".to_string());
        let max = non_empty(page.value(self.max_input))
            .or_else(|| non_empty(doc.get(slider_max).and_then(|n| n.attr("max"))));

        page.set_value(slider_min, &min);
        if let Some(max) = max {
            page.set_value(slider_max, &max);
        }
        if parse_num(page.value(slider_min)) > parse_num(page.value(slider_max)) {
            let high = page.value(slider_max).unwrap_or("").to_string();
            page.set_value(slider_min, &high);
        }
        self.sync_slider_ui(page);
    }

    /// Positions the range bar and rewrites the handle labels.
    pub fn sync_slider_ui(&self, page: &mut Page) {
        let (Some(slider_min), Some(slider_max)) = (self.slider_min, self.slider_max) else {
            return;
        };
        let doc = page.doc();
        let low = parse_num(page.value(slider_min));
        let high = parse_num(page.value(slider_max));
        let floor = parse_num(doc.get(slider_min).and_then(|n| n.attr("min")));
        let ceiling = parse_num(doc.get(slider_max).and_then(|n| n.attr("max")));
        let span = match ceiling - floor {
            s if s == 0.0 => 1.0,
            s => s,
        };
        let left = ((low - floor) / span * 100.0).clamp(0.0, 100.0);
        let right = ((ceiling - high) / span * 100.0).clamp(0.0, 100.0);

        let doc = page.doc_mut();
        if let Some(bar) = self.range_bar {
            doc.update(bar, |n| n.set_attr("style", &format!("left: {left}%; right: {right}%")));
        }
        for (label, value) in [(self.min_label, low), (self.max_label, high)] {
            if let Some(label) = label {
                let text = format!("{}{}", self.currency_symbol, format_num(value));
                doc.replace_children(label, &[Node::text(&text)]);
            }
        }
    }
}

fn set_or_clear(doc: &mut Document, id: Id, attr: &str, value: Option<&str>) {
    doc.update(id, |n| match value {
        Some(v) => n.set_attr(attr, v),
        None => {
            n.remove_attr(attr);
        }
    });
}

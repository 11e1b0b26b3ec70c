//! Reading filter controls out of the live document into a canonical [`Query`].
use html::{Document, Id, Matcher, Node};

use crate::config::Markup;
use crate::query::{Query, normalize_decimal, parse_decimal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKind {
    Text,
    Checkbox,
    Radio,
    Range,
    Other,
}

/// Kind of an `<input>`; `None` for every other node.
pub fn control_kind(node: &Node) -> Option<ControlKind> {
    if !node.is_element_named("input") {
        return None;
    }
    let ty = node.attr("type").map(str::trim).filter(|s| !s.is_empty());
    Some(match ty {
        None => ControlKind::Text, // missing type defaults to text
        Some(t) if t.eq_ignore_ascii_case("text") => ControlKind::Text,
        Some(t) if t.eq_ignore_ascii_case("checkbox") => ControlKind::Checkbox,
        Some(t) if t.eq_ignore_ascii_case("radio") => ControlKind::Radio,
        Some(t) if t.eq_ignore_ascii_case("range") => ControlKind::Range,
        _ => ControlKind::Other,
    })
}

pub fn is_checked(node: &Node) -> bool {
    node.has_attr("checked")
}

/// Builds the query for the given filter forms.
///
/// `sort_by` is carried over from `current_search`; every other key is rebuilt from the
/// controls. Within each form, checked checkboxes are appended first (DOM order), then the
/// remaining named inputs are `set`. Every checked box is appended, so a pair checked in
/// both the desktop and the drawer form appears twice.
pub fn build_query(doc: &Document, forms: &[Id], current_search: &str, markup: &Markup) -> Query {
    let mut query = Query::new();
    if let Some(sort) = Query::parse(current_search)
        .get(&markup.sort_key)
        .filter(|s| !s.is_empty())
    {
        query.set(&markup.sort_key, sort);
    }

    let named_input = Matcher::tag("input").and(Matcher::has_attr("name"));
    for &form in forms {
        let controls: Vec<(&Node, &str, ControlKind)> = doc
            .find_all_in(form, &named_input)
            .into_iter()
            .filter_map(|n| {
                let name = n.attr("name").filter(|s| !s.is_empty())?;
                Some((n, name, control_kind(n)?))
            })
            .collect();

        for (node, name, _) in controls
            .iter()
            .filter(|(_, _, kind)| *kind == ControlKind::Checkbox)
        {
            if !is_checked(node) {
                continue;
            }
            let value = node.attr("value").unwrap_or("on");
            query.append(name, value);
        }

        for (node, name, kind) in &controls {
            match kind {
                ControlKind::Checkbox | ControlKind::Range => continue,
                ControlKind::Radio if !is_checked(node) => continue,
                _ => {}
            }
            let value = node.attr("value").unwrap_or("");
            if value.is_empty() {
                continue;
            }
            if let Some(value) = filter_value(name, value, node.attr("max"), markup) {
                query.set(name, &value);
            }
        }
    }
    query
}

/// Applies the price-bound rules; other values pass through unchanged.
fn filter_value(name: &str, value: &str, max_attr: Option<&str>, markup: &Markup) -> Option<String> {
    if name == markup.price_min_key {
        // The implicit minimum is zero.
        return parse_decimal(value)
            .filter(|v| *v > 0.0)
            .map(|_| normalize_decimal(value));
    }
    if name == markup.price_max_key {
        let Some(v) = parse_decimal(value) else {
            return Some(value.to_string());
        };
        // At or above the declared max means "no cap".
        if max_attr.and_then(parse_decimal).is_some_and(|max| v >= max) {
            return None;
        }
        return Some(normalize_decimal(value));
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forms(doc: &Document) -> Vec<Id> {
        doc.ids_matching(&Matcher::tag("form"))
    }

    fn query_for(page: &str, search: &str) -> String {
        let doc = Document::parse(page);
        build_query(&doc, &forms(&doc), search, &Markup::default()).to_string()
    }

    #[test]
    fn control_kind_defaults_to_text() {
        let doc = Document::parse(r#"<input name="q"><input type="RANGE"><select></select>"#);
        let kinds: Vec<Option<ControlKind>> =
            doc.root().children().iter().map(control_kind).collect();
        assert_eq!(
            kinds,
            vec![Some(ControlKind::Text), Some(ControlKind::Range), None]
        );
    }

    #[test]
    fn worked_example_drops_upper_bound_at_max() {
        let page = r#"<form>
            <input type="checkbox" name="filter.v.option.color" value="Red" checked>
            <input type="checkbox" name="filter.v.option.color" value="Green">
            <input type="checkbox" name="filter.v.option.color" value="Blue" checked>
            <input type="text" name="filter.v.price.lte" value="50" max="50">
        </form>"#;
        assert_eq!(
            query_for(page, "?sort_by=best-selling"),
            "sort_by=best-selling&filter.v.option.color=Red&filter.v.option.color=Blue"
        );
    }

    #[test]
    fn price_lower_bound_needs_a_positive_number() {
        let page = |v: &str| {
            format!(r#"<form><input type="text" name="filter.v.price.gte" value="{v}"></form>"#)
        };
        assert_eq!(query_for(&page("0"), ""), "");
        assert_eq!(query_for(&page("-3"), ""), "");
        assert_eq!(query_for(&page("abc"), ""), "");
        assert_eq!(query_for(&page("12,5"), ""), "filter.v.price.gte=12.5");
    }

    #[test]
    fn price_upper_bound_below_max_is_kept() {
        let page = r#"<form><input type="text" name="filter.v.price.lte" value="49,99" max="50"></form>"#;
        assert_eq!(query_for(page, ""), "filter.v.price.lte=49.99");
        let page = r#"<form><input type="text" name="filter.v.price.lte" value="60" max="50"></form>"#;
        assert_eq!(query_for(page, ""), "");
    }

    #[test]
    fn checked_boxes_are_appended_from_every_form() {
        let page = r#"
            <form id="FacetFiltersForm">
              <input type="checkbox" name="filter.v.option.size" value="M" checked>
              <input type="text" name="q" value="shirt">
            </form>
            <form id="FacetFiltersFormMobile">
              <input type="checkbox" name="filter.v.option.size" value="M" checked>
              <input type="checkbox" name="filter.v.option.size" value="L" checked>
              <input type="text" name="q" value="shirts">
            </form>"#;
        assert_eq!(
            query_for(page, ""),
            "filter.v.option.size=M&q=shirts&filter.v.option.size=M&filter.v.option.size=L"
        );
    }

    #[test]
    fn ranges_empty_values_and_unchecked_radios_are_skipped() {
        let page = r#"<form>
            <input type="range" name="filter.v.price.gte" value="10">
            <input type="text" name="q" value="">
            <input type="radio" name="availability" value="1">
            <input type="radio" name="availability" value="0" checked>
            <input type="hidden" name="collection" value="shoes">
            <input value="nameless">
        </form>"#;
        assert_eq!(query_for(page, ""), "availability=0&collection=shoes");
    }

    #[test]
    fn only_sort_is_carried_from_the_current_search() {
        let page = r#"<form><input type="checkbox" name="filter.v.option.color" value="Red"></form>"#;
        assert_eq!(
            query_for(page, "sort_by=price-ascending&filter.v.option.color=Blue&page=2"),
            "sort_by=price-ascending"
        );
        assert_eq!(query_for(page, "filter.v.option.color=Blue"), "");
    }
}

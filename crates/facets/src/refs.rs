use std::fmt;

use html::{Document, Id, Matcher};

use crate::config::Markup;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefError {
    pub missing: Vec<String>,
}

impl fmt::Display for RefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page is missing required elements: {}", self.missing.join(", "))
    }
}

impl std::error::Error for RefError {}

/// Elements the engine patches, resolved once against the initial page.
///
/// These containers survive every render (only their content is replaced), so their ids
/// stay valid. Elements that do get replaced, such as the section element inside the grid
/// container, are looked up by name at use time instead.
#[derive(Clone, Debug, Default)]
pub struct PageRefs {
    /// Every form inside a facets element: desktop and drawer variants.
    pub filter_forms: Vec<Id>,
    /// `form#FacetFiltersForm`, else the first filter form.
    pub primary_form: Option<Id>,
    pub grid_container: Option<Id>,
    pub product_count: Option<Id>,
    pub product_count_desktop: Option<Id>,
    pub active_facets: Option<Id>,
}

impl PageRefs {
    /// Resolves every reference. In strict mode a missing required element is an error;
    /// otherwise it is logged and the dependent steps are skipped at render time.
    pub fn resolve(doc: &Document, markup: &Markup, strict: bool) -> Result<Self, RefError> {
        let mut filter_forms = Vec::new();
        for host in doc.find_all(&Matcher::tag(&markup.facets_element)) {
            for form in html::select::select_all(host, &Matcher::tag("form")) {
                if !filter_forms.contains(&form.id()) {
                    filter_forms.push(form.id());
                }
            }
        }
        let primary_form = doc
            .find(&Matcher::tag("form").and(Matcher::id(&markup.facets_form_id)))
            .map(|n| n.id())
            .or_else(|| filter_forms.first().copied());
        let by_id = |id: &str| doc.element_by_id(id).map(|n| n.id());

        let refs = Self {
            primary_form,
            grid_container: by_id(&markup.grid_container_id),
            product_count: by_id(&markup.product_count_id),
            product_count_desktop: by_id(&markup.product_count_desktop_id),
            active_facets: doc
                .find(&Matcher::class(&markup.active_facets_class))
                .map(|n| n.id()),
            filter_forms,
        };

        let mut missing = Vec::new();
        if refs.filter_forms.is_empty() {
            missing.push(format!("{} form", markup.facets_element));
        }
        if refs.grid_container.is_none() {
            missing.push(format!("#{}", markup.grid_container_id));
        }
        if refs.product_count.is_none() {
            missing.push(format!("#{}", markup.product_count_id));
        }
        if doc.element_by_id(&markup.section_element_id).is_none() {
            missing.push(format!("#{}", markup.section_element_id));
        }

        if !missing.is_empty() {
            let err = RefError { missing };
            if strict {
                return Err(err);
            }
            log::warn!(target: "facets", "{err}; affected regions will not update");
        }
        Ok(refs)
    }

    /// `cached` if it is still attached, else a fresh lookup.
    pub fn live(doc: &Document, cached: Option<Id>, fallback: &Matcher) -> Option<Id> {
        match cached {
            Some(id) if doc.get(id).is_some() => Some(id),
            _ => doc.find(fallback).map(|n| n.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <facet-filters-form><form id="FacetFiltersForm"></form></facet-filters-form>
        <menu-drawer><facet-filters-form><form id="FacetFiltersFormMobile"></form></facet-filters-form></menu-drawer>
        <div class="active-facets"></div>
        <div id="ProductCount"></div>
        <div id="ProductGridContainer"><ul id="product-grid" data-id="template--1__main"></ul></div>"#;

    #[test]
    fn resolves_forms_and_containers() {
        let doc = Document::parse(PAGE);
        let refs = PageRefs::resolve(&doc, &Markup::default(), true).unwrap();
        assert_eq!(refs.filter_forms.len(), 2);
        let primary = doc.get(refs.primary_form.unwrap()).unwrap();
        assert_eq!(primary.html_id(), Some("FacetFiltersForm"));
        assert!(refs.grid_container.is_some());
        assert!(refs.product_count_desktop.is_none());
        assert!(refs.active_facets.is_some());
    }

    #[test]
    fn strict_mode_reports_every_missing_element() {
        let doc = Document::parse("<div></div>");
        let err = PageRefs::resolve(&doc, &Markup::default(), true).unwrap_err();
        assert_eq!(err.missing.len(), 4);
        assert!(err.to_string().contains("#ProductGridContainer"));
    }

    #[test]
    fn lenient_mode_degrades() {
        let doc = Document::parse("<div id=\"ProductCount\"></div>");
        let refs = PageRefs::resolve(&doc, &Markup::default(), false).unwrap();
        assert!(refs.product_count.is_some());
        assert!(refs.grid_container.is_none());
        assert!(refs.primary_form.is_none());
    }
}

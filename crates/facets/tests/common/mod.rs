#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use bus::RequestId;
use facets::{
    Collaborators, FacetConfig, FacetFilters, Fetcher, Location, SessionHistory,
    ThemeCollaborators,
};
use html::{Document, Id};

pub const PAGE_URL: &str = "/collections/shoes?sort_by=best-selling";
pub const SECTION: &str = "template--7__product-grid";

#[derive(Debug, Default)]
pub struct MockFetcher {
    pub requests: Vec<(RequestId, String)>,
    pub offline: bool,
}

impl Fetcher for MockFetcher {
    fn fetch(&mut self, request_id: RequestId, url: &str) -> Result<(), String> {
        if self.offline {
            return Err("offline".to_string());
        }
        self.requests.push((request_id, url.to_string()));
        Ok(())
    }
}

pub type Engine = FacetFilters<MockFetcher, SessionHistory>;

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read fixture {path:?}: {err}"))
}

pub fn engine_with(config: FacetConfig) -> Engine {
    let collab = ThemeCollaborators {
        markup: config.markup.clone(),
        open_price_filter: false,
    };
    engine_with_collab(config, Box::new(collab))
}

pub fn engine_with_collab(config: FacetConfig, collab: Box<dyn Collaborators>) -> Engine {
    FacetFilters::new(
        Document::parse(&fixture("collection.html")),
        Location::parse(PAGE_URL),
        SessionHistory::new(PAGE_URL),
        MockFetcher::default(),
        collab,
        config,
    )
    .expect("fixture page resolves")
}

pub fn engine() -> Engine {
    engine_with(FacetConfig {
        strict_refs: true,
        ..FacetConfig::default()
    })
}

pub fn section_url(search: &str) -> String {
    format!("/collections/shoes?section_id={SECTION}&{search}")
}

/// Minimal server response carrying only a product count and grid.
pub fn count_fragment(count: &str) -> String {
    format!(
        r#"<div id="ProductCount">{count}</div>
<div id="ProductGridContainer"><div class="collection-grid-container"><ul id="product-grid" data-id="{SECTION}"></ul></div></div>"#
    )
}

pub fn el(engine: &Engine, html_id: &str) -> Id {
    engine
        .page()
        .doc()
        .element_by_id(html_id)
        .unwrap_or_else(|| panic!("no #{html_id} in page"))
        .id()
}

pub fn text_of(engine: &Engine, html_id: &str) -> String {
    let id = el(engine, html_id);
    html::dom_utils::collapsed_text(engine.page().doc().get(id).unwrap())
}

pub fn has_class(engine: &Engine, html_id: &str, class: &str) -> bool {
    let id = el(engine, html_id);
    engine.page().doc().get(id).is_some_and(|n| n.has_class(class))
}

pub fn last_request(engine: &Engine) -> (RequestId, String) {
    engine
        .fetcher()
        .requests
        .last()
        .cloned()
        .expect("a request was issued")
}

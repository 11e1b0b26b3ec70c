mod common;

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use bus::{Bus, CoreCommand, CoreEvent};
use common::*;
use facets::{
    CollaboratorError, Collaborators, FacetConfig, FacetEvent, FacetFilters, HistoryState,
    Location, NoCollaborators, Page, PopState, SessionHistory,
};
use html::{Document, Id, Matcher, Node};

const RED: &str = "sort_by=best-selling&filter.v.option.color=Red";

#[test]
fn debounced_input_commits_once_after_quiet_period() {
    let mut engine = engine();
    let red = el(&engine, "color-red");
    let blue = el(&engine, "color-blue");
    let t0 = Instant::now();

    engine.page_mut().set_checked(red, true);
    engine.handle(FacetEvent::Input { target: red }, t0);
    engine.page_mut().set_checked(blue, true);
    engine.handle(FacetEvent::Input { target: blue }, t0 + Duration::from_millis(400));
    engine.page_mut().set_checked(blue, false);
    engine.handle(FacetEvent::Input { target: blue }, t0 + Duration::from_millis(500));

    assert!(!engine.tick(t0 + Duration::from_millis(900)));
    assert!(engine.fetcher().requests.is_empty());
    assert_eq!(engine.next_deadline(), Some(t0 + Duration::from_millis(1300)));

    assert!(engine.tick(t0 + Duration::from_millis(1300)));
    assert!(!engine.tick(t0 + Duration::from_millis(5000)));
    assert_eq!(engine.fetcher().requests.len(), 1);
    assert_eq!(last_request(&engine).1, section_url(RED));
}

#[test]
fn committed_input_patches_page_and_pushes_history() {
    let mut engine = engine();
    let red = el(&engine, "color-red");
    let t0 = Instant::now();
    engine.page_mut().set_checked(red, true);
    engine.handle(FacetEvent::Input { target: red }, t0);
    engine.tick(t0 + Duration::from_millis(800));

    assert!(has_class(&engine, "ProductCount", "loading"));
    assert!(has_class(&engine, "ProductCountDesktop", "loading"));
    assert_eq!(engine.history().current_url(), format!("/collections/shoes?{RED}"));
    assert_eq!(engine.location().search, RED);
    assert_eq!(engine.history().len(), 2);

    let (request_id, _) = last_request(&engine);
    assert!(engine.on_fetch_done(request_id, Ok(fixture("fragment_red.html"))));

    assert_eq!(text_of(&engine, "ProductCount"), "1 of 1 product");
    assert_eq!(text_of(&engine, "ProductCountDesktop"), "1 of 1 product");
    assert!(!has_class(&engine, "ProductCount", "loading"));
    assert_eq!(text_of(&engine, "product-grid"), "Red runner");

    let doc = engine.page().doc();
    let blocks: Vec<&str> = doc
        .find_all(&Matcher::class("js-filter"))
        .into_iter()
        .filter_map(Node::html_id)
        .collect();
    assert_eq!(blocks, vec!["Filter-color", "Filter-price", "Filter-size"]);

    let focused = engine.page().focused().expect("summary focused");
    assert_eq!(doc.get(focused).unwrap().text_content(), "Color (1)");

    let progress = doc.find(&Matcher::has_attr("data-products-progress")).unwrap();
    assert_eq!(progress.attr("aria-valuemax"), Some("1"));
    let bar = doc.find(&Matcher::has_attr("data-products-progress-bar")).unwrap();
    assert_eq!(bar.attr("style"), Some("width: 100%"));

    // the replaced price block is bound again
    assert_eq!(engine.ranges().len(), 1);
}

#[test]
fn repeated_query_is_served_from_cache() {
    let mut engine = engine();
    engine.render_page(RED, None, true);
    let (request_id, _) = last_request(&engine);
    engine.on_fetch_done(request_id, Ok(fixture("fragment_red.html")));
    assert_eq!(text_of(&engine, "ProductCount"), "1 of 1 product");

    let count = el(&engine, "ProductCount");
    engine
        .page_mut()
        .doc_mut()
        .replace_children(count, &[Node::text("stale")]);

    engine.render_page(RED, None, true);
    assert_eq!(engine.fetcher().requests.len(), 1);
    assert_eq!(engine.cache().len(), 1);
    assert_eq!(text_of(&engine, "ProductCount"), "1 of 1 product");
    assert!(!has_class(&engine, "ProductCount", "loading"));
}

#[test]
fn concurrent_misses_share_one_request() {
    let mut engine = engine();
    engine.render_page(RED, None, true);
    engine.render_page(RED, None, true);
    assert_eq!(engine.fetcher().requests.len(), 1);
    assert_eq!(engine.pending_requests(), 1);

    let (request_id, _) = last_request(&engine);
    assert!(engine.on_fetch_done(request_id, Ok(fixture("fragment_red.html"))));
    assert_eq!(engine.pending_requests(), 0);
    assert_eq!(engine.cache().urls().collect::<Vec<_>>(), vec![section_url(RED)]);
}

#[test]
fn chip_removal_disables_chips_until_fragment_applies() {
    let mut engine = engine();
    let chip = el(&engine, "chip-clear");
    let outcome = engine.handle(FacetEvent::RemoveChip { target: chip }, Instant::now());
    assert!(outcome.default_prevented);
    assert!(has_class(&engine, "chip-clear", "disabled"));

    let (request_id, url) = last_request(&engine);
    assert_eq!(url, section_url("sort_by=best-selling"));

    engine.on_fetch_done(request_id, Ok(fixture("fragment_red.html")));
    assert!(engine.page().doc().element_by_id("chip-clear").is_none());
    assert!(!has_class(&engine, "chip-red", "disabled"));
}

#[test]
fn chip_keyup_removes_only_on_space() {
    let mut engine = engine();
    let chip = el(&engine, "chip-clear");
    let now = Instant::now();

    let outcome = engine.handle(
        FacetEvent::ChipKeyUp {
            target: chip,
            code: "Enter".to_string(),
        },
        now,
    );
    assert!(outcome.default_prevented);
    assert!(engine.fetcher().requests.is_empty());
    assert!(!has_class(&engine, "chip-clear", "disabled"));

    engine.handle(
        FacetEvent::ChipKeyUp {
            target: chip,
            code: "Space".to_string(),
        },
        now,
    );
    assert_eq!(engine.fetcher().requests.len(), 1);
}

#[test]
fn back_navigation_replays_initial_query_without_pushing() {
    let mut engine = engine();
    engine.render_page(RED, None, true);
    assert_eq!(engine.history().len(), 2);

    assert!(engine.go_back());
    assert_eq!(engine.fetcher().requests.len(), 2);
    assert_eq!(last_request(&engine).1, section_url("sort_by=best-selling"));
    assert_eq!(engine.history().len(), 2);
    assert_eq!(engine.location().search, "sort_by=best-selling");
    assert_eq!(engine.search_params_prev(), "sort_by=best-selling");

    // the red request is still in flight, so going forward joins it
    assert!(engine.go_forward());
    assert_eq!(engine.fetcher().requests.len(), 2);
    assert!(!engine.go_forward());
}

#[test]
fn popstate_with_current_query_is_ignored() {
    let mut engine = engine();
    engine.render_page(RED, None, true);

    engine.handle(
        FacetEvent::PopState(PopState {
            state: Some(HistoryState {
                search_params: RED.to_string(),
            }),
            url: format!("/collections/shoes?{RED}"),
        }),
        Instant::now(),
    );
    assert_eq!(engine.fetcher().requests.len(), 1);
}

#[test]
fn last_response_wins_by_default() {
    let mut engine = engine();
    engine.render_page("q=a", None, false);
    engine.render_page("q=b", None, false);
    let ids: Vec<_> = engine.fetcher().requests.iter().map(|(id, _)| *id).collect();

    assert!(engine.on_fetch_done(ids[1], Ok(count_fragment("2 of 9"))));
    assert!(engine.on_fetch_done(ids[0], Ok(count_fragment("5 of 9"))));
    assert_eq!(text_of(&engine, "ProductCount"), "5 of 9");
}

#[test]
fn stale_responses_are_dropped_when_enabled() {
    let mut engine = engine_with(FacetConfig {
        discard_stale_responses: true,
        ..FacetConfig::default()
    });
    engine.render_page("q=a", None, false);
    engine.render_page("q=b", None, false);
    let ids: Vec<_> = engine.fetcher().requests.iter().map(|(id, _)| *id).collect();

    assert!(engine.on_fetch_done(ids[1], Ok(count_fragment("2 of 9"))));
    assert!(!engine.on_fetch_done(ids[0], Ok(count_fragment("5 of 9"))));
    assert_eq!(text_of(&engine, "ProductCount"), "2 of 9");
    // the late response is still cached
    assert_eq!(engine.cache().len(), 2);
}

#[test]
fn apply_renders_drawer_form_and_closes_drawer() {
    let mut engine = engine();
    let red = el(&engine, "m-color-red");
    let apply = el(&engine, "apply");
    engine.page_mut().set_checked(red, true);

    engine.handle(FacetEvent::Apply { target: apply }, Instant::now());

    assert_eq!(engine.fetcher().requests.len(), 1);
    assert_eq!(last_request(&engine).1, section_url(RED));
    assert_eq!(engine.next_deadline(), None);
    let drawer = engine.page().doc().element_by_id("FilterDrawer").unwrap();
    assert!(!drawer.has_attr("open"));
}

/// A drawer that refuses to close.
struct StuckDrawer {
    attempts: Rc<Cell<usize>>,
}

impl Collaborators for StuckDrawer {
    fn toggle_drawer(&mut self, _page: &mut Page, drawer: Id) -> Result<(), CollaboratorError> {
        self.attempts.set(self.attempts.get() + 1);
        Err(CollaboratorError::DrawerNotToggleable(drawer))
    }
}

#[test]
fn apply_survives_a_drawer_that_cannot_close() {
    let attempts = Rc::new(Cell::new(0));
    let collab = StuckDrawer {
        attempts: Rc::clone(&attempts),
    };
    let mut engine = engine_with_collab(FacetConfig::default(), Box::new(collab));
    let red = el(&engine, "m-color-red");
    let apply = el(&engine, "apply");
    engine.page_mut().set_checked(red, true);

    engine.handle(FacetEvent::Apply { target: apply }, Instant::now());

    assert_eq!(attempts.get(), 1);
    assert_eq!(last_request(&engine).1, section_url(RED));
    assert_eq!(engine.history().len(), 2);
    assert_eq!(engine.history().current_url(), format!("/collections/shoes?{RED}"));
    let drawer = engine.page().doc().element_by_id("FilterDrawer").unwrap();
    assert!(drawer.has_attr("open"));
}

#[test]
fn progress_bar_reflects_the_initial_count() {
    let engine = engine();
    let doc = engine.page().doc();
    let bar = doc.find(&Matcher::has_attr("data-products-progress-bar")).unwrap();
    assert_eq!(bar.attr("style"), Some("width: 100%"));
    let progress = doc.find(&Matcher::has_attr("data-products-progress")).unwrap();
    assert_eq!(progress.attr("aria-valuenow"), Some("3"));
    assert_eq!(progress.attr("aria-valuemax"), Some("3"));
}

#[test]
fn failed_fetch_leaves_loading_state() {
    let mut engine = engine();
    engine.render_page("q=x", None, true);
    let (request_id, _) = last_request(&engine);

    assert!(!engine.on_fetch_done(request_id, Err("HTTP 503".to_string())));
    assert!(has_class(&engine, "ProductCount", "loading"));
    assert_eq!(engine.pending_requests(), 0);
    assert!(engine.cache().is_empty());
    assert!(!engine.on_fetch_done(request_id, Ok(String::new())));
}

#[test]
fn price_keydown_filter_applies_to_price_inputs_only() {
    let mut engine = engine();
    let price = el(&engine, "price-min");
    let color = el(&engine, "color-red");
    let now = Instant::now();
    let keydown = |target, key: &str| FacetEvent::KeyDown {
        target,
        key: key.to_string(),
    };

    assert!(engine.handle(keydown(price, "a"), now).default_prevented);
    assert!(!engine.handle(keydown(price, "5"), now).default_prevented);
    assert!(!engine.handle(keydown(price, "Backspace"), now).default_prevented);
    assert!(!engine.handle(keydown(color, "a"), now).default_prevented);
}

#[test]
fn slider_motion_feeds_the_query() {
    let mut engine = engine();
    let slider = el(&engine, "slider-max");
    let t0 = Instant::now();
    engine.page_mut().set_value(slider, "30");

    engine.handle(FacetEvent::Input { target: slider }, t0);
    let page = engine.page();
    assert_eq!(page.value(el(&engine, "price-max")), Some("30"));
    assert_eq!(page.value(el(&engine, "price-min")), Some("0"));

    assert!(engine.tick(t0 + Duration::from_millis(800)));
    assert_eq!(
        last_request(&engine).1,
        section_url("sort_by=best-selling&filter.v.price.lte=30")
    );
}

#[test]
fn typed_price_is_clamped_on_change() {
    let mut engine = engine();
    let max = el(&engine, "price-max");
    engine.page_mut().set_value(max, "80");
    engine.handle(FacetEvent::Change { target: max }, Instant::now());
    assert_eq!(engine.page().value(max), Some("50"));
}

#[test]
fn bus_round_trip() {
    let (bus, cmd_rx) = Bus::new();
    let mut engine = FacetFilters::new(
        Document::parse(&fixture("collection.html")),
        Location::parse(PAGE_URL),
        SessionHistory::new(PAGE_URL),
        bus.cmd_tx.clone(),
        Box::new(NoCollaborators),
        FacetConfig::default(),
    )
    .expect("fixture page resolves");

    engine.render_page("sort_by=best-selling", None, false);
    let Ok(CoreCommand::FetchSection { request_id, url }) = cmd_rx.try_recv() else {
        panic!("expected a fetch command");
    };
    assert_eq!(url, section_url("sort_by=best-selling"));

    bus.evt_tx
        .send(CoreEvent::FetchDone {
            request_id,
            url,
            body: fixture("fragment_red.html"),
        })
        .unwrap();
    let event = bus.evt_rx.recv().unwrap();
    assert!(engine.on_core_event(event));
    assert_eq!(text_of_doc(engine.page().doc(), "ProductCount"), "1 of 1 product");
}

#[test]
fn strict_refs_reject_incomplete_page() {
    let result = FacetFilters::new(
        Document::parse("<main></main>"),
        Location::parse(PAGE_URL),
        SessionHistory::new(PAGE_URL),
        MockFetcher::default(),
        Box::new(NoCollaborators),
        FacetConfig {
            strict_refs: true,
            ..FacetConfig::default()
        },
    );
    let Err(err) = result else {
        panic!("incomplete page accepted");
    };
    assert!(err.missing.contains(&"#ProductGridContainer".to_string()));
}

fn text_of_doc(doc: &Document, html_id: &str) -> String {
    html::dom_utils::collapsed_text(doc.element_by_id(html_id).unwrap())
}

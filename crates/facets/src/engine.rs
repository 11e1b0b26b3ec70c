//! The filter controller: turns page events into renders, and renders into fetches,
//! cache hits, patches, and history entries.
use std::rc::Rc;
use std::time::Instant;

use bus::{CoreEvent, RequestId};
use html::{Document, Id, Matcher, Node};

use crate::cache::FragmentCache;
use crate::collab::Collaborators;
use crate::config::{FacetConfig, Markup};
use crate::debounce::Debouncer;
use crate::fetch::Fetcher;
use crate::form::build_query;
use crate::history::{History, HistoryState, Location, PopState, with_search};
use crate::page::Page;
use crate::range::{PriceRange, SignalKind, key_allowed};
use crate::refs::{PageRefs, RefError};
use crate::render::{self, RenderTrigger};

/// Page events the controller consumes. `target` is the element the event was dispatched
/// to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FacetEvent {
    /// `input` on a control; also covers price slider motion.
    Input { target: Id },
    Change { target: Id },
    KeyDown { target: Id, key: String },
    /// Click on the drawer's apply button.
    Apply { target: Id },
    /// Click on an active-filter chip.
    RemoveChip { target: Id },
    ChipKeyUp { target: Id, code: String },
    PopState(PopState),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub default_prevented: bool,
}

impl EventOutcome {
    fn prevented() -> Self {
        Self {
            default_prevented: true,
        }
    }
}

/// A region the server can re-render on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionDescriptor {
    pub id: String,
}

#[derive(Debug)]
struct Waiter {
    seq: u64,
    trigger: Option<RenderTrigger>,
}

#[derive(Debug)]
struct InFlight {
    request_id: RequestId,
    url: String,
    waiters: Vec<Waiter>,
}

pub struct FacetFilters<F: Fetcher, H: History> {
    page: Page,
    refs: PageRefs,
    ranges: Vec<PriceRange>,
    location: Location,
    history: H,
    fetcher: F,
    collab: Box<dyn Collaborators>,
    config: FacetConfig,
    cache: FragmentCache,
    debounce: Debouncer<Id>,
    in_flight: Vec<InFlight>,
    next_request_id: RequestId,
    search_params_initial: String,
    search_params_prev: String,
    render_seq: u64,
    last_applied_seq: u64,
}

impl<F: Fetcher, H: History> FacetFilters<F, H> {
    pub fn new(
        doc: Document,
        location: Location,
        history: H,
        fetcher: F,
        mut collab: Box<dyn Collaborators>,
        config: FacetConfig,
    ) -> Result<Self, RefError> {
        let refs = PageRefs::resolve(&doc, &config.markup, config.strict_refs)?;
        let mut page = Page::new(doc);
        let ranges = PriceRange::bind_all(page.doc());
        for range in &ranges {
            range.init(&mut page);
        }
        collab.products_shown_changed(&mut page);
        log::debug!(
            target: "facets",
            "bound {} filter form(s), {} price range(s) on {}",
            refs.filter_forms.len(),
            ranges.len(),
            location.href()
        );
        Ok(Self {
            page,
            refs,
            ranges,
            history,
            fetcher,
            collab,
            cache: FragmentCache::new(&config.cache),
            debounce: Debouncer::new(config.debounce),
            in_flight: Vec::new(),
            next_request_id: 1,
            search_params_initial: location.search.clone(),
            search_params_prev: location.search.clone(),
            location,
            config,
            render_seq: 0,
            last_applied_seq: 0,
        })
    }

    pub fn handle(&mut self, event: FacetEvent, now: Instant) -> EventOutcome {
        log::trace!(target: "facets", "event {event:?}");
        match event {
            FacetEvent::Input { target } => {
                self.on_input(target, now);
                EventOutcome::default()
            }
            FacetEvent::Change { target } => {
                if let Some(range) = self.range_for_input(target).cloned() {
                    range.on_range_change(&mut self.page, target);
                }
                EventOutcome::default()
            }
            FacetEvent::KeyDown { target, key } => {
                let filtered = self.range_for_input(target).is_some();
                EventOutcome {
                    default_prevented: filtered && !key_allowed(&key),
                }
            }
            FacetEvent::Apply { target } => {
                self.on_apply(target);
                EventOutcome::default()
            }
            FacetEvent::RemoveChip { target } => {
                self.on_remove_chip(target);
                EventOutcome::prevented()
            }
            FacetEvent::ChipKeyUp { target, code } => {
                if code.eq_ignore_ascii_case("space") {
                    self.on_remove_chip(target);
                }
                EventOutcome::prevented()
            }
            FacetEvent::PopState(pop) => {
                self.on_popstate(pop);
                EventOutcome::default()
            }
        }
    }

    /// Commits a debounced submission whose deadline has passed. Returns whether one did.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(target) = self.debounce.poll(now) else {
            return false;
        };
        self.commit(target);
        true
    }

    /// When the host should call [`tick`](Self::tick) next.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    fn on_input(&mut self, target: Id, now: Instant) {
        let slider = self
            .ranges
            .iter()
            .find_map(|r| r.slider_handle(target).map(|h| (r.clone(), h)));
        if let Some((range, handle)) = slider {
            for signal in range.on_slider_input(&mut self.page, handle) {
                match signal.kind {
                    SignalKind::Change => range.on_range_change(&mut self.page, signal.target),
                    SignalKind::Input => self.on_input(signal.target, now),
                }
            }
        }
        let doc = self.page.doc();
        if self.refs.filter_forms.iter().any(|form| doc.contains(*form, target)) {
            self.debounce.schedule(now, target);
        }
    }

    fn commit(&mut self, target: Id) {
        let markup = &self.config.markup;
        let doc = self.page.doc();
        let trigger = RenderTrigger::capture(doc, target, markup);
        let query = build_query(doc, &self.refs.filter_forms, &self.location.search, markup);
        self.render_page(&query.to_string(), trigger, true);
    }

    fn on_apply(&mut self, target: Id) {
        let markup = &self.config.markup;
        let doc = self.page.doc();
        let form = doc
            .closest(target, &Matcher::tag(&markup.facets_element))
            .and_then(|host| {
                let host = host.id();
                doc.find_in(host, &Matcher::tag("form").and(Matcher::id(&markup.facets_form_id)))
                    .or_else(|| doc.find_in(host, &Matcher::tag("form")))
            })
            .map(Node::id)
            .or(self.refs.primary_form);
        let forms: Vec<Id> = form.into_iter().collect();
        let query = build_query(doc, &forms, &self.location.search, markup);
        let drawer = doc
            .closest(target, &Matcher::tag(&markup.drawer_element))
            .map(Node::id);
        self.render_page(&query.to_string(), None, true);

        if let Some(drawer) = drawer
            && let Err(err) = self.collab.toggle_drawer(&mut self.page, drawer)
        {
            log::debug!(target: "facets", "drawer not closed after apply: {err}");
        }
    }

    fn on_remove_chip(&mut self, target: Id) {
        let markup = &self.config.markup;
        let doc = self.page.doc_mut();
        doc.update_all(&Matcher::class(&markup.chip_class), |n| {
            n.add_class(&markup.chip_disabled_class);
        });
        let search = doc
            .closest(target, &Matcher::has_attr("href"))
            .and_then(|link| link.attr("href"))
            .map(|href| Location::parse(href).search)
            .unwrap_or_default();
        self.render_page(&search, None, true);
    }

    fn on_popstate(&mut self, pop: PopState) {
        self.location = Location::parse(&pop.url);
        let search = match pop.state {
            Some(state) => state.search_params,
            None => self.search_params_initial.clone(),
        };
        if search == self.search_params_prev {
            log::trace!(target: "facets", "popstate to current query; nothing to render");
            return;
        }
        self.render_page(&search, None, false);
    }

    /// Steps back through session history, replaying the entry's query.
    pub fn go_back(&mut self) -> bool {
        match self.history.back() {
            Some(pop) => {
                self.on_popstate(pop);
                true
            }
            None => false,
        }
    }

    pub fn go_forward(&mut self) -> bool {
        match self.history.forward() {
            Some(pop) => {
                self.on_popstate(pop);
                true
            }
            None => false,
        }
    }

    /// Sections named by the live page; today only the product grid.
    pub fn sections(&self) -> Vec<SectionDescriptor> {
        let markup = &self.config.markup;
        self.page
            .doc()
            .element_by_id(&markup.section_element_id)
            .and_then(|grid| grid.attr(&markup.section_id_attr))
            .map(|id| SectionDescriptor { id: id.to_string() })
            .into_iter()
            .collect()
    }

    pub fn section_url(&self, section: &SectionDescriptor, search: &str) -> String {
        format!("{}?section_id={}&{}", self.location.path, section.id, search)
    }

    /// Renders every section for `search`: from cache when the exact URL was seen before,
    /// otherwise through the fetcher. `update_url_hash` pushes a history entry.
    pub fn render_page(&mut self, search: &str, trigger: Option<RenderTrigger>, update_url_hash: bool) {
        self.search_params_prev = search.to_string();
        render::mark_loading(self.page.doc_mut(), &self.refs, &self.config.markup);

        let sections = self.sections();
        if sections.is_empty() {
            log::warn!(
                target: "facets",
                "no #{}[{}] on the page; nothing to render",
                self.config.markup.section_element_id,
                self.config.markup.section_id_attr
            );
        }
        self.render_seq += 1;
        let seq = self.render_seq;
        for section in &sections {
            let url = self.section_url(section, search);
            if let Some(fragment) = self.cache.get(&url) {
                log::debug!(target: "facets::cache", "hit {url}");
                self.apply_fragment(seq, &fragment, trigger.as_ref());
            } else {
                self.request(url, Waiter {
                    seq,
                    trigger: trigger.clone(),
                });
            }
        }

        if update_url_hash {
            let url = with_search(&self.location.path, search);
            self.history.push_state(
                HistoryState {
                    search_params: search.to_string(),
                },
                &url,
            );
            self.location.search = search.to_string();
        }
    }

    fn request(&mut self, url: String, waiter: Waiter) {
        if let Some(pending) = self.in_flight.iter_mut().find(|p| p.url == url) {
            log::debug!(target: "facets::cache", "joining in-flight request {} for {url}", pending.request_id);
            pending.waiters.push(waiter);
            return;
        }
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        log::debug!(target: "facets::cache", "miss {url}; fetching as request {request_id}");
        match self.fetcher.fetch(request_id, &url) {
            Ok(()) => self.in_flight.push(InFlight {
                request_id,
                url,
                waiters: vec![waiter],
            }),
            Err(err) => log::warn!(target: "facets", "could not request {url}: {err}"),
        }
    }

    /// Completes a fetch started by [`render_page`](Self::render_page). Returns whether any
    /// patch was applied.
    pub fn on_fetch_done(&mut self, request_id: RequestId, result: Result<String, String>) -> bool {
        let Some(index) = self.in_flight.iter().position(|p| p.request_id == request_id) else {
            log::debug!(target: "facets", "response for unknown request {request_id}");
            return false;
        };
        let InFlight { url, waiters, .. } = self.in_flight.remove(index);
        let body = match result {
            Ok(body) => body,
            Err(err) => {
                log::warn!(target: "facets", "fetching {url} failed: {err}");
                return false;
            }
        };
        let fragment = self.cache.insert(url, Document::parse(&body));
        let mut applied = false;
        for waiter in waiters {
            applied |= self.apply_fragment(waiter.seq, &fragment, waiter.trigger.as_ref());
        }
        applied
    }

    /// Feeds a network runtime event back in.
    pub fn on_core_event(&mut self, event: CoreEvent) -> bool {
        match event {
            CoreEvent::FetchDone { request_id, body, .. } => self.on_fetch_done(request_id, Ok(body)),
            CoreEvent::FetchError { request_id, error, .. } => self.on_fetch_done(request_id, Err(error)),
        }
    }

    fn apply_fragment(&mut self, seq: u64, fragment: &Rc<Document>, trigger: Option<&RenderTrigger>) -> bool {
        if self.config.discard_stale_responses && seq < self.last_applied_seq {
            log::debug!(
                target: "facets",
                "dropping render {seq}; render {} already applied",
                self.last_applied_seq
            );
            return false;
        }
        self.last_applied_seq = self.last_applied_seq.max(seq);
        render::render_fragment(
            &mut self.page,
            fragment,
            trigger,
            &self.refs,
            &self.config.markup,
            self.collab.as_mut(),
        );
        // patched blocks carry fresh price inputs
        self.ranges = PriceRange::bind_all(self.page.doc());
        for range in &self.ranges {
            range.init(&mut self.page);
        }
        true
    }

    fn range_for_input(&self, target: Id) -> Option<&PriceRange> {
        self.ranges.iter().find(|r| r.input_handle(target).is_some())
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn markup(&self) -> &Markup {
        &self.config.markup
    }

    pub fn refs(&self) -> &PageRefs {
        &self.refs
    }

    pub fn ranges(&self) -> &[PriceRange] {
        &self.ranges
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cache(&self) -> &FragmentCache {
        &self.cache
    }

    pub fn search_params_prev(&self) -> &str {
        &self.search_params_prev
    }

    pub fn search_params_initial(&self) -> &str {
        &self.search_params_initial
    }

    /// Requests still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.in_flight.len()
    }
}

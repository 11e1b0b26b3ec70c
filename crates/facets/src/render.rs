//! Patches the live page from a fetched section fragment.
//!
//! The pipeline runs in a fixed order: filter blocks (including the active-filter chips and
//! the counts of the block the user was interacting with), the product grid, the product
//! count, then the collaborator hooks. Each region is independent: a lookup that misses on
//! either side skips that region only.
use html::select::{for_each_match_mut, select_all, select_first};
use html::{Document, Id, Matcher, Node};

use crate::collab::Collaborators;
use crate::config::Markup;
use crate::page::Page;
use crate::refs::PageRefs;

/// What the user touched when a debounced submission was committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderTrigger {
    pub target: Id,
    /// `type="text"` controls keep focus while the user is typing.
    pub target_is_text_input: bool,
    /// `id` attribute of the filter block enclosing the target, if any. May be empty.
    pub filter_block: Option<String>,
}

impl RenderTrigger {
    /// Captures the trigger from the live document. `None` if the target is gone.
    pub fn capture(doc: &Document, target: Id, markup: &Markup) -> Option<Self> {
        let node = doc.get(target)?;
        let target_is_text_input = node.attr("type") == Some("text");
        let filter_block = doc
            .closest(target, &Matcher::class(&markup.filter_block_class))
            .map(|block| block.attr("id").unwrap_or("").to_string());
        Some(Self {
            target,
            target_is_text_input,
            filter_block,
        })
    }

    fn block_id(&self) -> Option<&str> {
        self.filter_block.as_deref()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub removed_blocks: usize,
    pub replaced_blocks: usize,
    pub inserted_blocks: usize,
    pub counts_patched: bool,
    pub focused: Option<Id>,
    pub grid_patched: bool,
    pub count_patched: bool,
}

/// Flags the regions that are about to be replaced.
pub fn mark_loading(doc: &mut Document, refs: &PageRefs, markup: &Markup) {
    let grid_container = PageRefs::live(doc, refs.grid_container, &Matcher::id(&markup.grid_container_id));
    if let Some(container) = grid_container {
        doc.update_all_in(container, &Matcher::class(&markup.grid_loading_class), |n| {
            n.add_class(&markup.loading_class);
        });
    }
    for target in count_targets(doc, refs, markup) {
        doc.update(target, |n| {
            n.add_class(&markup.loading_class);
        });
    }
}

pub fn render_fragment(
    page: &mut Page,
    fragment: &Document,
    trigger: Option<&RenderTrigger>,
    refs: &PageRefs,
    markup: &Markup,
    collab: &mut dyn Collaborators,
) -> RenderSummary {
    let mut summary = RenderSummary::default();
    render_filters(page, fragment, trigger, refs, markup, &mut summary);
    summary.grid_patched = render_product_grid(page, fragment, refs, markup, collab);
    summary.count_patched = render_product_count(page, fragment, refs, markup, collab);
    collab.scroll_animations_inserted(page);
    collab.after_render(page);
    log::debug!(target: "facets::render", "{summary:?}");
    summary
}

struct FragmentBlock<'a> {
    id: &'a str,
    class: &'a str,
    node: &'a Node,
}

fn render_filters(
    page: &mut Page,
    fragment: &Document,
    trigger: Option<&RenderTrigger>,
    refs: &PageRefs,
    markup: &Markup,
    summary: &mut RenderSummary,
) {
    let block_matcher = Matcher::class(&markup.filter_block_class);
    let Some(fragment_form) = fragment.element_by_id(&markup.facets_form_id) else {
        log::debug!(target: "facets::render", "fragment has no #{}; filters left as is", markup.facets_form_id);
        render_active_facets(page.doc_mut(), fragment, refs, markup);
        return;
    };
    let fragment_blocks: Vec<FragmentBlock<'_>> = select_all(fragment_form, &block_matcher)
        .into_iter()
        .map(|node| FragmentBlock {
            id: node.attr("id").unwrap_or(""),
            class: node.attr("class").unwrap_or(""),
            node,
        })
        .collect();

    let doc = page.doc_mut();
    if let Some(live_form) = doc.element_by_id(&markup.facets_form_id).map(Node::id) {
        let stale: Vec<Id> = doc
            .find_all_in(live_form, &block_matcher)
            .into_iter()
            .filter(|live| {
                let id = live.attr("id").unwrap_or("");
                !fragment_blocks.iter().any(|b| b.id == id)
            })
            .map(Node::id)
            .collect();
        for id in stale {
            if doc.remove(id).is_some() {
                summary.removed_blocks += 1;
            }
        }
    }

    let is_trigger_block = |b: &FragmentBlock<'_>| trigger.and_then(RenderTrigger::block_id) == Some(b.id);
    let to_render: Vec<&FragmentBlock<'_>> =
        fragment_blocks.iter().filter(|b| !is_trigger_block(b)).collect();

    for (index, block) in to_render.iter().enumerate() {
        if let Some(live) = doc.element_by_id(block.id).map(Node::id) {
            if doc.replace_children(live, block.node.children()) {
                summary.replaced_blocks += 1;
            }
            continue;
        }
        let Some(previous) = index.checked_sub(1).map(|i| to_render[i]) else {
            continue;
        };
        if block.class != previous.class {
            continue;
        }
        let anchor = doc.element_by_id(previous.id).map(Node::id);
        if anchor.and_then(|a| doc.insert_after(a, block.node)).is_some() {
            summary.inserted_blocks += 1;
        }
    }

    render_active_facets(doc, fragment, refs, markup);

    let Some(trigger) = trigger else { return };
    let Some(block_id) = trigger.block_id().filter(|id| !id.is_empty()) else {
        return;
    };
    let Some(source) = fragment_blocks.iter().find(|b| b.id == block_id) else {
        return;
    };
    let Some(live) = doc.element_by_id(block_id).map(Node::id) else {
        return;
    };
    render_counts(doc, source.node, live, markup);
    summary.counts_patched = true;

    let summary_el = doc
        .element_by_id(block_id)
        .and_then(|block| select_first(block, &Matcher::class(&markup.summary_class)))
        .map(Node::id);
    if let Some(summary_el) = summary_el
        && !trigger.target_is_text_input
        && page.focus(summary_el)
    {
        summary.focused = Some(summary_el);
    }
}

/// Replaces the chip list, then re-enables every chip.
fn render_active_facets(doc: &mut Document, fragment: &Document, refs: &PageRefs, markup: &Markup) {
    let matcher = Matcher::class(&markup.active_facets_class);
    if let Some(source) = fragment.find(&matcher)
        && let Some(target) = PageRefs::live(doc, refs.active_facets, &matcher)
    {
        doc.replace_children(target, source.children());
    }
    doc.update_all(&Matcher::class(&markup.chip_class), |n| {
        n.remove_class(&markup.chip_disabled_class);
    });
}

/// Re-renders the summary, header, and options wrap of the block the user is working in,
/// keeping an expanded "show more" list expanded.
fn render_counts(doc: &mut Document, source: &Node, live: Id, markup: &Markup) {
    for class in [&markup.summary_class, &markup.header_class] {
        let matcher = Matcher::class(class);
        if let (Some(from), Some(to)) = (select_first(source, &matcher), doc.find_in(live, &matcher)) {
            let to = to.id();
            doc.replace_node(to, from);
        }
    }

    let wrap = Matcher::class(&markup.wrap_class);
    let (Some(from), Some(to)) = (select_first(source, &wrap), doc.find_in(live, &wrap).map(Node::id)) else {
        return;
    };
    let label_collapsed = Matcher::class(&markup.show_more_label_class).and(Matcher::class(&markup.hidden_class));
    let showing_more = doc
        .find_all_in(live, &Matcher::tag(&markup.show_more_element))
        .into_iter()
        .any(|button| select_first(button, &label_collapsed).is_some());

    if showing_more {
        let mut expanded = from.clone();
        let hidden_items = Matcher::class(&markup.item_class).and(Matcher::class(&markup.hidden_class));
        for_each_match_mut(&mut expanded, &hidden_items, &mut |n: &mut Node| {
            n.replace_class(&markup.hidden_class, &markup.show_more_item_class);
        });
        doc.replace_node(to, &expanded);
    } else {
        doc.replace_node(to, from);
    }
}

fn render_product_grid(
    page: &mut Page,
    fragment: &Document,
    refs: &PageRefs,
    markup: &Markup,
    collab: &mut dyn Collaborators,
) -> bool {
    let doc = page.doc_mut();
    let Some(source) = fragment.element_by_id(&markup.grid_container_id) else {
        return false;
    };
    let Some(target) = PageRefs::live(doc, refs.grid_container, &Matcher::id(&markup.grid_container_id)) else {
        return false;
    };
    if !doc.replace_children(target, source.children()) {
        return false;
    }
    doc.update_all_in(target, &Matcher::class(&markup.scroll_trigger_class), |n| {
        n.add_class(&markup.scroll_trigger_cancel_class);
    });
    collab.products_shown_changed(page);
    true
}

fn render_product_count(
    page: &mut Page,
    fragment: &Document,
    refs: &PageRefs,
    markup: &Markup,
    collab: &mut dyn Collaborators,
) -> bool {
    let Some(source) = fragment.element_by_id(&markup.product_count_id) else {
        return false;
    };
    let doc = page.doc_mut();
    let targets = count_targets(doc, refs, markup);
    if targets.is_empty() {
        return false;
    }
    for target in targets {
        doc.replace_children(target, source.children());
        doc.update(target, |n| {
            n.remove_class(&markup.loading_class);
        });
    }
    collab.products_shown_changed(page);
    true
}

/// `#ProductCount` and, when present, `#ProductCountDesktop`.
fn count_targets(doc: &Document, refs: &PageRefs, markup: &Markup) -> Vec<Id> {
    [
        PageRefs::live(doc, refs.product_count, &Matcher::id(&markup.product_count_id)),
        PageRefs::live(doc, refs.product_count_desktop, &Matcher::id(&markup.product_count_desktop_id)),
    ]
    .into_iter()
    .flatten()
    .collect()
}

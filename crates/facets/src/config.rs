use std::time::Duration;

/// Names the engine relies on in the page and fragment markup.
///
/// Defaults follow the collection template the server renders; every name can be
/// overridden for themes that rename them.
#[derive(Clone, Debug)]
pub struct Markup {
    /// Custom element wrapping each filter form (desktop and drawer variants).
    pub facets_element: String,
    /// Id of the primary filter form; blocks are diffed inside it.
    pub facets_form_id: String,
    pub filter_block_class: String,
    pub active_facets_class: String,
    pub chip_class: String,
    pub chip_disabled_class: String,
    pub product_count_id: String,
    pub product_count_desktop_id: String,
    pub grid_container_id: String,
    pub grid_loading_class: String,
    pub loading_class: String,
    /// Element carrying the section id in `data-id`.
    pub section_element_id: String,
    pub section_id_attr: String,
    pub scroll_trigger_class: String,
    pub scroll_trigger_cancel_class: String,
    pub summary_class: String,
    pub header_class: String,
    pub wrap_class: String,
    pub item_class: String,
    pub hidden_class: String,
    pub show_more_item_class: String,
    pub show_more_element: String,
    pub show_more_label_class: String,
    pub drawer_element: String,
    pub apply_button_class: String,
    pub sort_key: String,
    pub price_min_key: String,
    pub price_max_key: String,
}

impl Default for Markup {
    fn default() -> Self {
        Self {
            facets_element: "facet-filters-form".to_string(),
            facets_form_id: "FacetFiltersForm".to_string(),
            filter_block_class: "js-filter".to_string(),
            active_facets_class: "active-facets".to_string(),
            chip_class: "js-facet-remove".to_string(),
            chip_disabled_class: "disabled".to_string(),
            product_count_id: "ProductCount".to_string(),
            product_count_desktop_id: "ProductCountDesktop".to_string(),
            grid_container_id: "ProductGridContainer".to_string(),
            grid_loading_class: "collection-grid-container".to_string(),
            loading_class: "loading".to_string(),
            section_element_id: "product-grid".to_string(),
            section_id_attr: "data-id".to_string(),
            scroll_trigger_class: "scroll-trigger".to_string(),
            scroll_trigger_cancel_class: "scroll-trigger--cancel".to_string(),
            summary_class: "facets__summary".to_string(),
            header_class: "facets__header".to_string(),
            wrap_class: "facets-wrap".to_string(),
            item_class: "facets__item".to_string(),
            hidden_class: "hidden".to_string(),
            show_more_item_class: "show-more-item".to_string(),
            show_more_element: "show-more-button".to_string(),
            show_more_label_class: "label-show-more".to_string(),
            drawer_element: "menu-drawer".to_string(),
            apply_button_class: "js-facets-apply".to_string(),
            sort_key: "sort_by".to_string(),
            price_min_key: "filter.v.price.gte".to_string(),
            price_max_key: "filter.v.price.lte".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CacheConfig {
    /// `None` keeps every fragment for the page view. `Some(n)` evicts the least recently
    /// used entry once `n` entries are held.
    pub max_entries: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct FacetConfig {
    pub debounce: Duration,
    pub markup: Markup,
    pub cache: CacheConfig,
    /// Skip patches from responses older than the last applied render.
    pub discard_stale_responses: bool,
    /// Reject pages missing required elements instead of degrading.
    pub strict_refs: bool,
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(800),
            markup: Markup::default(),
            cache: CacheConfig::default(),
            discard_stale_responses: false,
            strict_refs: cfg!(debug_assertions),
        }
    }
}

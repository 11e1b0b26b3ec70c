//! Keeps a collection page's filter forms, product grid, product count, and active-filter
//! chips in sync with each other and with session history, by fetching server-rendered
//! section fragments and patching them into the live document.
//!
//! The host owns the event loop: it forwards page events to [`FacetFilters::handle`],
//! calls [`FacetFilters::tick`] when [`FacetFilters::next_deadline`] passes, and feeds
//! fetch results back through [`FacetFilters::on_core_event`].

pub mod cache;
pub mod collab;
pub mod config;
pub mod debounce;
pub mod disclosure;
pub mod fetch;
pub mod form;
pub mod history;
pub mod page;
pub mod progress;
pub mod query;
pub mod range;
pub mod refs;
pub mod render;

mod engine;

pub use cache::FragmentCache;
pub use collab::{CollaboratorError, Collaborators, NoCollaborators, ThemeCollaborators};
pub use config::{CacheConfig, FacetConfig, Markup};
pub use engine::{EventOutcome, FacetEvent, FacetFilters, SectionDescriptor};
pub use fetch::Fetcher;
pub use history::{History, HistoryState, Location, PopState, SessionHistory};
pub use page::Page;
pub use query::Query;
pub use range::PriceRange;
pub use refs::{PageRefs, RefError};
pub use render::RenderTrigger;

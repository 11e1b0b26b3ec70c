use std::fmt;

use html::Id;

use crate::config::Markup;
use crate::disclosure;
use crate::page::Page;
use crate::progress;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The drawer element has nothing that can be opened or closed.
    DrawerNotToggleable(Id),
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollaboratorError::DrawerNotToggleable(id) => {
                write!(f, "drawer {id:?} has no disclosure to toggle")
            }
        }
    }
}

impl std::error::Error for CollaboratorError {}

/// Page-level widgets the engine notifies but does not own. Every hook is optional; the
/// defaults do nothing.
pub trait Collaborators {
    /// The shown/total product counts may have changed.
    fn products_shown_changed(&mut self, _page: &mut Page) {}

    /// Fresh grid content was inserted; entrance animations may need wiring.
    fn scroll_animations_inserted(&mut self, _page: &mut Page) {}

    /// Close (or open) the drawer that hosted an apply button.
    fn toggle_drawer(&mut self, _page: &mut Page, _drawer: Id) -> Result<(), CollaboratorError> {
        Ok(())
    }

    /// Runs after a fragment has been fully applied.
    fn after_render(&mut self, _page: &mut Page) {}
}

#[derive(Debug, Default)]
pub struct NoCollaborators;

impl Collaborators for NoCollaborators {}

/// The theme's own widgets: the products-shown progress bar, the filter drawer, and
/// optionally keeping only the price block expanded.
#[derive(Debug, Default)]
pub struct ThemeCollaborators {
    pub markup: Markup,
    pub open_price_filter: bool,
}

impl Collaborators for ThemeCollaborators {
    fn products_shown_changed(&mut self, page: &mut Page) {
        if let Some(p) = progress::update_products_shown_progress(page.doc_mut(), &self.markup) {
            log::trace!(target: "facets", "progress {}/{} ({}%)", p.shown, p.total, p.percent);
        }
    }

    fn toggle_drawer(&mut self, page: &mut Page, drawer: Id) -> Result<(), CollaboratorError> {
        disclosure::toggle_drawer(page.doc_mut(), drawer)
            .map(|_| ())
            .ok_or(CollaboratorError::DrawerNotToggleable(drawer))
    }

    fn after_render(&mut self, page: &mut Page) {
        if self.open_price_filter {
            disclosure::open_only_price_filter(page.doc_mut(), &self.markup);
        }
    }
}

use html::{Document, Id};

/// The live document plus the bits of browser state the engine touches: keyboard focus
/// and form control values (held as `value`/`checked` attributes).
#[derive(Debug)]
pub struct Page {
    doc: Document,
    focused: Option<Id>,
}

impl Page {
    pub fn new(doc: Document) -> Self {
        Self { doc, focused: None }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// The focused node, if it is still attached.
    pub fn focused(&self) -> Option<Id> {
        self.focused.filter(|id| self.doc.get(*id).is_some())
    }

    pub fn focus(&mut self, id: Id) -> bool {
        if self.doc.get(id).is_none() {
            return false;
        }
        self.focused = Some(id);
        true
    }

    pub fn value(&self, id: Id) -> Option<&str> {
        self.doc.get(id).map(|n| n.attr("value").unwrap_or(""))
    }

    pub fn set_value(&mut self, id: Id, value: &str) -> bool {
        self.doc.update(id, |n| n.set_attr("value", value))
    }

    pub fn set_checked(&mut self, id: Id, checked: bool) -> bool {
        self.doc.update(id, |n| {
            if checked {
                n.set_attr("checked", "");
            } else {
                n.remove_attr("checked");
            }
        })
    }

    pub fn is_checked(&self, id: Id) -> bool {
        self.doc.get(id).is_some_and(|n| n.has_attr("checked"))
    }
}

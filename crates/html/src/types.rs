pub type NodeId = u32;

/// Per-document node identity. `Id(0)` means "not yet assigned".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub NodeId);

impl Id {
    pub const UNASSIGNED: Id = Id(0);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Document {
        id: Id,
        doctype: Option<String>,
        children: Vec<Node>,
    },
    Element {
        id: Id,
        name: String,
        attributes: Vec<(String, Option<String>)>,
        children: Vec<Node>,
    },
    Text {
        id: Id,
        text: String,
    },
    Comment {
        id: Id,
        text: String,
    },
}

impl Node {
    pub fn element(name: &str, attributes: Vec<(String, Option<String>)>, children: Vec<Node>) -> Node {
        Node::Element {
            id: Id::UNASSIGNED,
            name: name.to_ascii_lowercase(),
            attributes,
            children,
        }
    }

    pub fn text(text: &str) -> Node {
        Node::Text {
            id: Id::UNASSIGNED,
            text: text.to_string(),
        }
    }

    pub fn id(&self) -> Id {
        match self {
            Node::Document { id, .. } => *id,
            Node::Element { id, .. } => *id,
            Node::Text { id, .. } => *id,
            Node::Comment { id, .. } => *id,
        }
    }

    pub fn set_id(&mut self, new_id: Id) {
        match self {
            Node::Document { id, .. } => *id = new_id,
            Node::Element { id, .. } => *id = new_id,
            Node::Text { id, .. } => *id = new_id,
            Node::Comment { id, .. } => *id = new_id,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children, .. } | Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { children, .. } => Some(children),
            Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Lowercase tag name for elements, `None` for every other node kind.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element_named(&self, tag: &str) -> bool {
        self.tag().is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    /// Attribute value; a present attribute without a value reads as `""`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        let Node::Element { attributes, .. } = self else {
            return None;
        };
        attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attr(key).is_some()
    }

    /// The `id` attribute, if present and non-empty.
    pub fn html_id(&self) -> Option<&str> {
        self.attr("id").filter(|v| !v.is_empty())
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        let Node::Element { attributes, .. } = self else {
            return;
        };
        if let Some(slot) = attributes.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            slot.1 = Some(value.to_string());
        } else {
            attributes.push((key.to_ascii_lowercase(), Some(value.to_string())));
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> bool {
        let Node::Element { attributes, .. } = self else {
            return false;
        };
        let before = attributes.len();
        attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        attributes.len() != before
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Adds or removes `class`; returns whether the class list changed.
    pub fn toggle_class(&mut self, class: &str, present: bool) -> bool {
        if self.has_class(class) == present || !matches!(self, Node::Element { .. }) {
            return false;
        }
        let mut list: Vec<String> = self.classes().map(str::to_string).collect();
        if present {
            list.push(class.to_string());
        } else {
            list.retain(|c| c != class);
        }
        self.set_attr("class", &list.join(" "));
        true
    }

    pub fn add_class(&mut self, class: &str) -> bool {
        self.toggle_class(class, true)
    }

    pub fn remove_class(&mut self, class: &str) -> bool {
        self.toggle_class(class, false)
    }

    /// Swaps `old` for `new` in place, keeping the class position. No-op if `old` is absent.
    pub fn replace_class(&mut self, old: &str, new: &str) -> bool {
        if !self.has_class(old) {
            return false;
        }
        let list: Vec<&str> = self
            .classes()
            .map(|c| if c == old { new } else { c })
            .collect();
        let joined = list.join(" ");
        self.set_attr("class", &joined);
        true
    }

    /// Concatenated descendant text, in document order.
    pub fn text_content(&self) -> String {
        fn walk(node: &Node, out: &mut String) {
            match node {
                Node::Text { text, .. } => out.push_str(text),
                Node::Comment { .. } => {}
                _ => {
                    for c in node.children() {
                        walk(c, out);
                    }
                }
            }
        }
        let mut out = String::new();
        walk(self, &mut out);
        out
    }

    /// Preorder walk, the node itself first.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

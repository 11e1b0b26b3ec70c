use crate::types::{Id, Node, Token};

/// Tags that implicitly close an open sibling of the same name (`<li>a<li>b`).
const SELF_NESTING_CLOSERS: &[&str] = &["li", "option", "p", "dt", "dd", "tr", "td", "th"];

/// Builds a document tree from a token stream. Ids are left unassigned.
///
/// Unmatched end tags are ignored; elements still open at the end of input are closed
/// implicitly.
pub fn build_dom(tokens: &[Token]) -> Node {
    let mut root = Node::Document {
        id: Id::UNASSIGNED,
        doctype: None,
        children: Vec::new(),
    };
    let mut open: Vec<Node> = Vec::new();

    for token in tokens {
        match token {
            Token::Doctype(s) => {
                if let Node::Document { doctype, .. } = &mut root {
                    *doctype = Some(s.clone());
                }
            }
            Token::Comment(c) => {
                append_child(
                    current(&mut root, &mut open),
                    Node::Comment {
                        id: Id::UNASSIGNED,
                        text: c.clone(),
                    },
                );
            }
            Token::Text(txt) => append_text(current(&mut root, &mut open), txt),
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if SELF_NESTING_CLOSERS.contains(&name.as_str())
                    && open.last().is_some_and(|top| top.is_element_named(name))
                {
                    close_top(&mut root, &mut open);
                }
                let element = Node::Element {
                    id: Id::UNASSIGNED,
                    name: name.clone(),
                    attributes: attributes.clone(),
                    children: Vec::new(),
                };
                if *self_closing {
                    append_child(current(&mut root, &mut open), element);
                } else {
                    open.push(element);
                }
            }
            Token::EndTag(name) => {
                if let Some(pos) = open.iter().rposition(|n| n.is_element_named(name)) {
                    while open.len() > pos {
                        close_top(&mut root, &mut open);
                    }
                } else {
                    log::trace!(target: "html", "ignoring unmatched </{name}>");
                }
            }
        }
    }

    while !open.is_empty() {
        close_top(&mut root, &mut open);
    }
    root
}

fn current<'a>(root: &'a mut Node, open: &'a mut [Node]) -> &'a mut Node {
    match open.last_mut() {
        Some(top) => top,
        None => root,
    }
}

fn close_top(root: &mut Node, open: &mut Vec<Node>) {
    if let Some(done) = open.pop() {
        append_child(current(root, open), done);
    }
}

fn append_child(parent: &mut Node, child: Node) {
    if let Some(children) = parent.children_mut() {
        children.push(child);
    }
}

fn append_text(parent: &mut Node, txt: &str) {
    if txt.is_empty() {
        return;
    }
    let Some(children) = parent.children_mut() else {
        return;
    };
    if let Some(Node::Text { text, .. }) = children.last_mut() {
        text.push_str(txt);
        return;
    }
    children.push(Node::Text {
        id: Id::UNASSIGNED,
        text: txt.to_string(),
    });
}

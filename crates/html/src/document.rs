use crate::dom_builder::build_dom;
use crate::select::{Matcher, for_each_match_mut, select_all, select_first};
use crate::serialize;
use crate::tokenizer::tokenize;
use crate::types::{Id, Node};

/// An owned document tree with stable per-node ids.
///
/// Ids are allocated monotonically for the lifetime of the document: nodes imported from
/// another tree always receive fresh ids, so an `Id` that disappears from the tree is never
/// reused for a different node.
#[derive(Clone, Debug)]
pub struct Document {
    root: Node,
    next_id: u32,
}

impl Document {
    pub fn parse(input: &str) -> Self {
        Self::from_node(build_dom(&tokenize(input)))
    }

    pub fn from_node(mut root: Node) -> Self {
        let mut next_id = 1;
        renumber(&mut root, &mut next_id);
        Self { root, next_id }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn get(&self, id: Id) -> Option<&Node> {
        self.root.descendants().find(|n| n.id() == id)
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut Node> {
        find_mut(&mut self.root, id)
    }

    /// First element whose `id` attribute equals `html_id`.
    pub fn element_by_id(&self, html_id: &str) -> Option<&Node> {
        self.find(&Matcher::id(html_id))
    }

    pub fn find(&self, matcher: &Matcher) -> Option<&Node> {
        select_first(&self.root, matcher)
    }

    pub fn find_all(&self, matcher: &Matcher) -> Vec<&Node> {
        select_all(&self.root, matcher)
    }

    pub fn find_in(&self, scope: Id, matcher: &Matcher) -> Option<&Node> {
        select_first(self.get(scope)?, matcher)
    }

    pub fn find_all_in(&self, scope: Id, matcher: &Matcher) -> Vec<&Node> {
        self.get(scope)
            .map(|s| select_all(s, matcher))
            .unwrap_or_default()
    }

    /// Ids of every match, for callers that go on to mutate the tree.
    pub fn ids_matching(&self, matcher: &Matcher) -> Vec<Id> {
        self.find_all(matcher).into_iter().map(Node::id).collect()
    }

    pub fn ids_matching_in(&self, scope: Id, matcher: &Matcher) -> Vec<Id> {
        self.find_all_in(scope, matcher)
            .into_iter()
            .map(Node::id)
            .collect()
    }

    /// Ancestors of `id`, nearest first. Empty if `id` is not in the tree.
    pub fn ancestors(&self, id: Id) -> Vec<&Node> {
        fn chain<'a>(node: &'a Node, id: Id, out: &mut Vec<&'a Node>) -> bool {
            if node.id() == id {
                return true;
            }
            for c in node.children() {
                if chain(c, id, out) {
                    out.push(node);
                    return true;
                }
            }
            false
        }
        let mut out = Vec::new();
        chain(&self.root, id, &mut out);
        out
    }

    /// `Element.closest`: the node itself or its nearest matching ancestor.
    pub fn closest(&self, id: Id, matcher: &Matcher) -> Option<&Node> {
        let node = self.get(id)?;
        if matcher.matches(node) {
            return Some(node);
        }
        self.ancestors(id).into_iter().find(|n| matcher.matches(n))
    }

    pub fn contains(&self, ancestor: Id, id: Id) -> bool {
        self.get(ancestor)
            .is_some_and(|a| a.descendants().any(|n| n.id() == id))
    }

    /// Applies `f` to one node. Returns false if the node is gone.
    pub fn update(&mut self, id: Id, f: impl FnOnce(&mut Node)) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                f(node);
                true
            }
            None => false,
        }
    }

    /// Applies `f` to every element matching `matcher`; returns the match count.
    pub fn update_all(&mut self, matcher: &Matcher, mut f: impl FnMut(&mut Node)) -> usize {
        let mut count = 0;
        for_each_match_mut(&mut self.root, matcher, &mut |n: &mut Node| {
            count += 1;
            f(n);
        });
        count
    }

    pub fn update_all_in(
        &mut self,
        scope: Id,
        matcher: &Matcher,
        mut f: impl FnMut(&mut Node),
    ) -> usize {
        let Some(scope) = self.get_mut(scope) else {
            return 0;
        };
        let mut count = 0;
        for_each_match_mut(scope, matcher, &mut |n: &mut Node| {
            count += 1;
            f(n);
        });
        count
    }

    /// `innerHTML = ...` with nodes from another tree. Returns false if `target` is gone or
    /// cannot hold children.
    pub fn replace_children(&mut self, target: Id, children: &[Node]) -> bool {
        let imported: Vec<Node> = children.iter().map(|c| self.import(c)).collect();
        match self.get_mut(target).and_then(Node::children_mut) {
            Some(slot) => {
                *slot = imported;
                true
            }
            None => false,
        }
    }

    /// `outerHTML = ...`; returns the id of the inserted copy.
    pub fn replace_node(&mut self, target: Id, replacement: &Node) -> Option<Id> {
        let imported = self.import(replacement);
        let new_id = imported.id();
        let (siblings, index) = locate_mut(&mut self.root, target)?;
        siblings[index] = imported;
        Some(new_id)
    }

    pub fn remove(&mut self, target: Id) -> Option<Node> {
        let (siblings, index) = locate_mut(&mut self.root, target)?;
        Some(siblings.remove(index))
    }

    /// `reference.after(node)`; returns the id of the inserted copy.
    pub fn insert_after(&mut self, reference: Id, node: &Node) -> Option<Id> {
        let imported = self.import(node);
        let new_id = imported.id();
        let (siblings, index) = locate_mut(&mut self.root, reference)?;
        siblings.insert(index + 1, imported);
        Some(new_id)
    }

    pub fn inner_html(&self, id: Id) -> Option<String> {
        self.get(id).map(serialize::inner_html)
    }

    pub fn outer_html(&self, id: Id) -> Option<String> {
        self.get(id).map(serialize::outer_html)
    }

    fn import(&mut self, node: &Node) -> Node {
        let mut copy = node.clone();
        renumber(&mut copy, &mut self.next_id);
        copy
    }
}

fn renumber(node: &mut Node, next: &mut u32) {
    node.set_id(Id(*next));
    *next = next.wrapping_add(1);
    if let Some(children) = node.children_mut() {
        for c in children {
            renumber(c, next);
        }
    }
}

fn find_mut(node: &mut Node, id: Id) -> Option<&mut Node> {
    if node.id() == id {
        return Some(node);
    }
    node.children_mut()?
        .iter_mut()
        .find_map(|c| find_mut(c, id))
}

/// The sibling list holding `id` and its index in that list.
fn locate_mut(node: &mut Node, id: Id) -> Option<(&mut Vec<Node>, usize)> {
    let children = node.children_mut()?;
    if let Some(index) = children.iter().position(|c| c.id() == id) {
        return Some((children, index));
    }
    children.iter_mut().find_map(|c| locate_mut(c, id))
}

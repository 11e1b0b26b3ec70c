use crate::types::Node;

/// A compound element matcher: the subset of selector syntax that section markup needs,
/// built explicitly instead of parsed from selector strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Matcher {
    Tag(String),
    Id(String),
    Class(String),
    HasAttr(String),
    AttrEq(String, String),
    All(Vec<Matcher>),
    Any(Vec<Matcher>),
    Not(Box<Matcher>),
}

impl Matcher {
    pub fn tag(name: &str) -> Self {
        Matcher::Tag(name.to_ascii_lowercase())
    }

    pub fn id(id: &str) -> Self {
        Matcher::Id(id.to_string())
    }

    pub fn class(class: &str) -> Self {
        Matcher::Class(class.to_string())
    }

    pub fn has_attr(name: &str) -> Self {
        Matcher::HasAttr(name.to_string())
    }

    pub fn attr_eq(name: &str, value: &str) -> Self {
        Matcher::AttrEq(name.to_string(), value.to_string())
    }

    pub fn and(self, other: Matcher) -> Self {
        match self {
            Matcher::All(mut parts) => {
                parts.push(other);
                Matcher::All(parts)
            }
            first => Matcher::All(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Matcher::Not(Box::new(self))
    }

    /// Only elements can match.
    pub fn matches(&self, node: &Node) -> bool {
        if !matches!(node, Node::Element { .. }) {
            return false;
        }
        match self {
            Matcher::Tag(name) => node.is_element_named(name),
            Matcher::Id(id) => node.html_id() == Some(id.as_str()),
            Matcher::Class(class) => node.has_class(class),
            Matcher::HasAttr(name) => node.has_attr(name),
            Matcher::AttrEq(name, value) => node.attr(name) == Some(value.as_str()),
            Matcher::All(parts) => parts.iter().all(|m| m.matches(node)),
            Matcher::Any(parts) => parts.iter().any(|m| m.matches(node)),
            Matcher::Not(inner) => !inner.matches(node),
        }
    }
}

/// First matching descendant of `scope`, excluding `scope` itself.
pub fn select_first<'a>(scope: &'a Node, matcher: &Matcher) -> Option<&'a Node> {
    scope.descendants().skip(1).find(|n| matcher.matches(n))
}

/// Every matching descendant of `scope` in document order, excluding `scope` itself.
pub fn select_all<'a>(scope: &'a Node, matcher: &Matcher) -> Vec<&'a Node> {
    scope
        .descendants()
        .skip(1)
        .filter(|n| matcher.matches(n))
        .collect()
}

/// Mutable counterpart of [`select_all`]; calls `f` on every match, outermost first.
pub fn for_each_match_mut(scope: &mut Node, matcher: &Matcher, f: &mut dyn FnMut(&mut Node)) {
    if let Some(children) = scope.children_mut() {
        for child in children.iter_mut() {
            if matcher.matches(child) {
                f(child);
            }
            for_each_match_mut(child, matcher, f);
        }
    }
}

use crate::Node;

/// Whitespace-collapsed visible text of a subtree, skipping `<script>` and `<style>`.
pub fn collapsed_text(node: &Node) -> String {
    fn walk(node: &Node, out: &mut String) {
        match node {
            Node::Text { text, .. } => {
                for word in text.split_whitespace() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(word);
                }
            }
            Node::Element { name, .. } if name == "script" || name == "style" => {}
            _ => {
                for c in node.children() {
                    walk(c, out);
                }
            }
        }
    }
    let mut out = String::new();
    walk(node, &mut out);
    out
}

/// Indented one-line-per-node outline of a subtree, capped at `cap` lines.
pub fn outline_from_dom(root: &Node, cap: usize) -> Vec<String> {
    fn walk(node: &Node, depth: usize, out: &mut Vec<String>, left: &mut usize) {
        if *left == 0 {
            return;
        }
        let indent = "  ".repeat(depth);
        let line = match node {
            Node::Document { .. } => Some(format!("{indent}#document")),
            Node::Element { name, .. } => {
                let mut line = format!("{indent}<{name}");
                if let Some(id) = node.html_id() {
                    line.push_str(&format!(r#" id="{id}""#));
                }
                if let Some(class) = node.attr("class").filter(|c| !c.is_empty()) {
                    line.push_str(&format!(r#" class="{class}""#));
                }
                line.push('>');
                Some(line)
            }
            Node::Text { text, .. } => {
                let t = text.split_whitespace().collect::<Vec<_>>().join(" ");
                (!t.is_empty()).then(|| {
                    let show: String = t.chars().take(40).collect();
                    if show.len() < t.len() {
                        format!("{indent}\"{show}…\"")
                    } else {
                        format!("{indent}\"{show}\"")
                    }
                })
            }
            Node::Comment { .. } => None,
        };
        if let Some(line) = line {
            *left -= 1;
            out.push(line);
        }
        for c in node.children() {
            walk(c, depth + 1, out, left);
        }
    }
    let mut out = Vec::new();
    let mut left = cap;
    walk(root, 0, &mut out, &mut left);
    out
}

use html::dom_utils::outline_from_dom;
use html::select::select_all;
use html::{Document, Matcher, Node};

const SECTION: &str = r#"<!doctype html>
<div id="ProductGridContainer">
  <div class="collection-grid-container">
    <ul id="product-grid" data-id="template--7__product-grid">
      <li class="grid__item scroll-trigger"><product-card data-handle="red-runner">Red runner &amp; laces</product-card>
      <li class="grid__item scroll-trigger"><product-card data-handle="blue-runner">Blue runner</product-card>
    </ul>
  </div>
</div>
<script>if (a < b) { init(); }</script>"#;

#[test]
fn grid_outline() {
    let doc = Document::parse(SECTION);
    let grid = doc.element_by_id("ProductGridContainer").unwrap();
    let outline = outline_from_dom(grid, 10);
    assert_eq!(
        outline,
        vec![
            r#"<div id="ProductGridContainer">"#,
            r#"  <div class="collection-grid-container">"#,
            r#"    <ul id="product-grid">"#,
            r#"      <li class="grid__item scroll-trigger">"#,
            r#"        <product-card>"#,
            r#"          "Red runner & laces""#,
            r#"      <li class="grid__item scroll-trigger">"#,
            r#"        <product-card>"#,
            r#"          "Blue runner""#,
        ]
    );
}

#[test]
fn serialized_section_reparses_to_the_same_tree() {
    let doc = Document::parse(SECTION);
    let grid = doc.element_by_id("product-grid").unwrap();
    let html = html::serialize::outer_html(grid);
    assert!(html.contains("Red runner &amp; laces"));

    let again = Document::parse(&html);
    let reparsed = again.element_by_id("product-grid").unwrap();
    let handles = |n: &Node| -> Vec<String> {
        select_all(n, &Matcher::tag("product-card"))
            .into_iter()
            .filter_map(|c| c.attr("data-handle").map(str::to_string))
            .collect()
    };
    assert_eq!(handles(grid), handles(reparsed));
    assert_eq!(grid.text_content(), reparsed.text_content());
}

#[test]
fn script_body_stays_raw() {
    let doc = Document::parse(SECTION);
    let script = doc.find(&Matcher::tag("script")).unwrap();
    assert_eq!(script.text_content(), "if (a < b) { init(); }");
    assert_eq!(
        html::serialize::inner_html(script),
        "if (a < b) { init(); }"
    );
}

#[test]
fn patching_a_region_keeps_ids_unique() {
    let mut doc = Document::parse(SECTION);
    let fresh = Document::parse(SECTION);
    let target = doc.element_by_id("ProductGridContainer").unwrap().id();
    let source = fresh.element_by_id("ProductGridContainer").unwrap();

    for _ in 0..3 {
        assert!(doc.replace_children(target, source.children()));
    }
    let mut ids: Vec<_> = doc.root().descendants().map(Node::id).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
    assert_eq!(doc.find_all(&Matcher::tag("product-card")).len(), 2);
}

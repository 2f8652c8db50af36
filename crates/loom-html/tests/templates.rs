//! Template parser tests
//!
//! Parsing realistic templates, recovery and fatal errors.

use loom_dom::{NodeKind, VNode};
use loom_html::{parse, ParseError, ParseWarning, TemplateCache};

#[test]
fn test_parse_empty_template() {
    let template = parse("").unwrap();
    assert!(template.tree().children(template.root()).is_empty());
    assert_eq!(template.tree().get(template.root()).map(VNode::kind), Some(NodeKind::Fragment));
}

#[test]
fn test_parse_text_only() {
    let template = parse("Hello {{ name }}").unwrap();
    let children = template.tree().children(template.root());
    assert_eq!(children.len(), 1);
    assert_eq!(
        template.tree().get(children[0]).and_then(VNode::text_content),
        Some("Hello {{ name }}")
    );
}

#[test]
fn test_directives_stored_verbatim() {
    let template = parse(r#"
        <ul class="list">
            <li *for="let item of this.items" [title]="item.label">{{ item.label }}</li>
            <li *if="!items.length">empty</li>
        </ul>
    "#)
    .unwrap();

    assert_eq!(
        template.tree().to_markup(template.root()),
        "<ul class=\"list\">\
         <li *for=\"let item of this.items\" [title]=\"item.label\">{{ item.label }}</li>\
         <li *if=\"!items.length\">empty</li>\
         </ul>"
    );
}

#[test]
fn test_nested_custom_elements() {
    let template = parse("<app-shell><x.panel><my_widget></my_widget></x.panel></app-shell>").unwrap();
    let tags: Vec<_> = template
        .tree()
        .descendants(template.root())
        .into_iter()
        .filter_map(|id| template.tree().get(id).and_then(VNode::tag).map(str::to_string))
        .collect();
    assert_eq!(tags, vec!["app-shell", "x.panel", "my_widget"]);
}

#[test]
fn test_single_quoted_values_keep_double_quotes() {
    let template = parse(r#"<a [title]='"q" + x'></a>"#).unwrap();
    let a = template.tree().children(template.root())[0];
    let attrs = template.tree().get(a).and_then(VNode::attributes).unwrap();
    assert_eq!(attrs.get("[title]"), Some("\"q\" + x"));
}

#[test]
fn test_mismatched_close_recovers_with_warning() {
    let template = parse("<a><b></a>").unwrap();
    assert_eq!(template.warnings(), &[ParseWarning::ImplicitlyClosed {
        tag: "b".into(),
        closed_by: "a".into(),
        line: 1,
        column: 7,
    }]);

    // Deterministic: same input, same outcome
    let again = parse("<a><b></a>").unwrap();
    assert_eq!(again.warnings(), template.warnings());
}

#[test]
fn test_recovery_closes_every_intermediate_element() {
    let template = parse("<div><p><em>x</div>").unwrap();
    assert_eq!(template.warnings().len(), 2);
    assert_eq!(template.tree().to_markup(template.root()), "<div><p><em>x</em></p></div>");
}

#[test]
fn test_unmatched_close_is_fatal() {
    let err = parse("<div>\n  </span>").unwrap_err();
    assert_eq!(err, ParseError::UnmatchedCloseTag { tag: "span".into(), line: 2, column: 3 });
    assert_eq!(err.position(), Some((2, 3)));
}

#[test]
fn test_unclosed_is_fatal() {
    let err = parse("<div><p>text</p>").unwrap_err();
    assert!(matches!(err, ParseError::UnclosedTag { ref tag, .. } if tag == "div"));
}

#[test]
fn test_cache_shares_templates() {
    let mut cache = TemplateCache::new();
    let first = cache.get_or_parse("<b>x</b>").unwrap();
    let second = cache.get_or_parse("<b>x</b>").unwrap();
    assert!(std::rc::Rc::ptr_eq(&first, &second));
    assert!(cache.contains("<b>x</b>"));
}

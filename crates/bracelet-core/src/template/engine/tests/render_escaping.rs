//! Escape sequence and HTML escaping tests for template engine

use super::fixtures::simple_context;
use super::*;
use serde_json::json;

#[test]
fn test_render_escape_sequences() {
    let context = simple_context();
    assert_eq!(
        render(r#"Literal: \{{title}}"#, &context).unwrap(),
        "Literal: {{title}}"
    );
    assert_eq!(
        render(r#"Literal: \{{ title }}"#, &context).unwrap(),
        "Literal: {{ title }}"
    );
    assert_eq!(
        render(r#"Literal: \{{{title}}}"#, &context).unwrap(),
        "Literal: {{{title}}}"
    );
}

#[test]
fn test_error_escaped_tag_unclosed() {
    let context = simple_context();
    let result = render(r#"Before \{{title after"#, &context);
    match result {
        Err(TemplateError::MalformedSyntax { message, .. }) => {
            assert!(message.contains("Unclosed"), "got: {}", message);
        }
        other => panic!("Expected MalformedSyntax error, got {:?}", other),
    }
}

#[test]
fn test_render_double_backslash_escape() {
    let context = simple_context();
    assert_eq!(
        render(r#"Backslash: \\{{title}}"#, &context).unwrap(),
        r#"Backslash: \My Title"#
    );
}

#[test]
fn test_render_triple_backslash_escape() {
    let context = simple_context();
    assert_eq!(
        render(r#"\\\{{title}}"#, &context).unwrap(),
        r#"\{{title}}"#
    );
}

#[test]
fn test_render_backslash_not_before_tag() {
    let context = simple_context();
    assert_eq!(
        render(r#"C:\path {{count}}"#, &context).unwrap(),
        r#"C:\path 42"#
    );
}

#[test]
fn test_double_stash_escapes_html() {
    let context = TemplateContext::new(json!({ "html": "<a href=\"x\">Tom & 'Jerry'</a> `=`" }));
    assert_eq!(
        render("{{html}}", &context).unwrap(),
        "&lt;a href&#x3D;&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt; &#x60;&#x3D;&#x60;"
    );
}

#[test]
fn test_triple_stash_is_raw() {
    let context = TemplateContext::new(json!({ "html": "<b>bold</b>" }));
    assert_eq!(render("{{{html}}}", &context).unwrap(), "<b>bold</b>");
}

#[test]
fn test_helper_output_is_escaped_unless_raw() {
    let context = TemplateContext::new(json!({ "items": ["a", "b"] }));
    assert_eq!(
        render(r#"{{join items " & "}}"#, &context).unwrap(),
        "a &amp; b"
    );
    assert_eq!(
        render(r#"{{{join items " & "}}}"#, &context).unwrap(),
        "a & b"
    );
}

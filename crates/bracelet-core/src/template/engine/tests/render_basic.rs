//! Basic rendering tests for template engine

use super::fixtures::{nested_context, simple_context};
use super::*;
use serde_json::json;

#[test]
fn test_render_plain_text() {
    let context = simple_context();
    let result = render("No tags, just text { and } braces", &context).unwrap();
    assert_eq!(result, "No tags, just text { and } braces");
}

#[test]
fn test_render_simple_expression() {
    let context = simple_context();
    assert_eq!(render("Title: {{title}}", &context).unwrap(), "Title: My Title");
    assert_eq!(render("Title: {{ title }}", &context).unwrap(), "Title: My Title");
    assert_eq!(render("Title: {{  title  }}", &context).unwrap(), "Title: My Title");
}

#[test]
fn test_render_scalar_values() {
    let context = simple_context();
    let result = render("{{count}} {{price}} {{enabled}} {{date}}", &context).unwrap();
    assert_eq!(result, "42 9.99 true 2026-01-15");
}

#[test]
fn test_render_nested_key() {
    let context = nested_context();
    assert_eq!(
        render("Paper: {{paper.title}}", &context).unwrap(),
        "Paper: Research Paper"
    );
    assert_eq!(
        render("First: {{paper.authors.0.name}}", &context).unwrap(),
        "First: John Doe"
    );
    assert_eq!(
        render("Second: {{paper/authors/1/name}}", &context).unwrap(),
        "Second: Jane Smith"
    );
}

#[test]
fn test_render_missing_values_render_nothing() {
    let context = nested_context();
    let result = render("[{{missing}}][{{paper.missing.deeper}}][{{paper.tags.9}}]", &context).unwrap();
    assert_eq!(result, "[][][]");

    let result = render("[{{nothing}}]", &simple_context()).unwrap();
    assert_eq!(result, "[]");
}

#[test]
fn test_render_this() {
    let context = TemplateContext::new(json!("scalar"));
    assert_eq!(render("{{this}}|{{.}}", &context).unwrap(), "scalar|scalar");
}

#[test]
fn test_render_array_joins_with_comma() {
    let context = nested_context();
    assert_eq!(render("{{paper.tags}}", &context).unwrap(), "rust,templates");
}

#[test]
fn test_render_comments_are_dropped() {
    let context = simple_context();
    let result = render("a{{! note }}b{{!-- longer note --}}c", &context).unwrap();
    assert_eq!(result, "abc");
}

#[test]
fn test_render_block_comment_hides_inner_tags() {
    let context = simple_context();
    let result = render("a{{!-- {{upper}} }} --}}b", &context).unwrap();
    assert_eq!(result, "ab");
}

#[test]
fn test_render_literal_heads() {
    let context = simple_context();
    assert_eq!(render(r#"{{"text"}} {{7}} {{true}}"#, &context).unwrap(), "text 7 true");
}

#[test]
fn test_render_multiline() {
    let context = simple_context();
    let template = "Line 1: {{title}}\nLine 2: {{count}}\n";
    assert_eq!(
        render(template, &context).unwrap(),
        "Line 1: My Title\nLine 2: 42\n"
    );
}

#[test]
fn test_parsed_template_renders_repeatedly() {
    let engine = TemplateEngine::new();
    let template = Template::parse("Hello {{name}}!").unwrap();
    for name in ["Ada", "Grace"] {
        let context = TemplateContext::new(json!({ "name": name }));
        assert_eq!(
            engine.render_template(&template, &context).unwrap(),
            format!("Hello {}!", name)
        );
    }
}

//! Timeout and large input tests for template engine

use super::tokenize::TokenStream;
use super::*;
use serde_json::json;

#[test]
fn test_tokenstream_terminates_on_large_input() {
    let mut large_input = String::with_capacity(8000);
    for i in 0..250 {
        large_input.push_str(&format!("Text before {{{{key{}}}}} text after. ", i));
    }

    // Step counter bound is 3x input length; all tokens must still come out
    let tokens: Vec<_> = TokenStream::new(&large_input).collect();
    assert_eq!(tokens.len(), 250);
    assert!(large_input.len() > 5000);
}

#[test]
fn test_render_large_template_completes() {
    let items: Vec<_> = (0..100).map(|i| json!(format!("Item{}", i))).collect();
    let context = TemplateContext::new(json!({ "items": items }));

    let template = (0..100)
        .map(|i| format!("{{{{upper items.{}}}}}\n", i))
        .collect::<String>();
    let result = render(&template, &context).unwrap();
    assert!(result.starts_with("ITEM0\nITEM1\n"));
    assert!(result.ends_with("ITEM99\n"));
}

#[test]
fn test_timeout_error_display() {
    let err = TemplateError::Timeout {
        max_duration: RENDER_TIMEOUT,
        elapsed: Duration::from_millis(10_500),
    };
    assert_eq!(
        err.to_string(),
        "Template rendering timed out after 10.50s (max: 10.00s)"
    );
    assert_eq!(err.line(), None);
}

#[test]
fn test_check_timeout_passes_for_fresh_start() {
    assert!(check_timeout(Instant::now()).is_ok());
}

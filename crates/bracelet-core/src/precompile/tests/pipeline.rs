use super::*;
use crate::config::Config;
use crate::error::BraceletError;
use bracelet_testkit::{temp_dir_in_workspace, write_templates};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn options(root: &Path, output: &Path) -> PrecompileOptions {
    PrecompileOptions::new(root, output)
}

#[test]
fn test_run_writes_bundle_in_discovery_order() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("b.hbs", "B"), ("a.hbs", "A {{name}}")]);
    let output = temp.path().join("dist/templates.js");

    let mut precompiler = Precompiler::new(options(&root, &output), echo);
    assert_eq!(precompiler.state(), &PipelineState::Configured);

    let report = precompiler.run().unwrap();
    assert_eq!(precompiler.state(), &PipelineState::Serialized);
    assert_eq!(report.templates, vec!["a", "b"]);
    assert_eq!(report.output, output);

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(report.bytes, text.len());
    let a = text.find("templates['a'] = template(function () { return \"A {{name}}\"; });").unwrap();
    let b = text.find("templates['b'] = template(function () { return \"B\"; });").unwrap();
    assert!(a < b);
}

#[test]
fn test_run_is_idempotent() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(
        &root,
        &[("x.hbs", "{{upper x}}"), ("y/z.hbs", "{{#each items}}{{this}}{{/each}}")],
    );
    let output = temp.path().join("templates.js");

    Precompiler::new(options(&root, &output), echo).run().unwrap();
    let first = std::fs::read(&output).unwrap();
    Precompiler::new(options(&root, &output), echo).run().unwrap();
    let second = std::fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_bundle_keys_match_discovery() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("one.hbs", "1"), ("two.hbs", "2"), ("skip.txt", "x")]);
    let output = temp.path().join("templates.js");

    let report = Precompiler::new(options(&root, &output), echo).run().unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    let keys: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("  templates['"))
        .filter_map(|rest| rest.split('\'').next())
        .collect();
    assert_eq!(keys, vec!["one", "two"]);
    assert_eq!(report.templates, keys);
}

#[test]
fn test_empty_template_set_writes_empty_bundle() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    std::fs::create_dir_all(&root).unwrap();
    let output = temp.path().join("templates.js");

    let report = Precompiler::new(options(&root, &output), echo).run().unwrap();
    assert!(report.templates.is_empty());
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        Bundle::new().render(&ModuleFormat::Plain)
    );
}

#[test]
fn test_amd_output() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("a.hbs", "A")]);
    let output = temp.path().join("templates.js");

    let mut opts = options(&root, &output);
    opts.format = ModuleFormat::amd("handlebars.runtime");
    Precompiler::new(opts, echo).run().unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("define(['handlebars.runtime'], function (Handlebars) {\n"));
    assert!(text.ends_with("  return templates;\n});\n"));
}

#[test]
fn test_compile_failure_keeps_previous_output() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("fine.hbs", "ok"), ("bad.hbs", "go boom")]);
    let output = temp.path().join("templates.js");
    std::fs::write(&output, "previous bundle").unwrap();

    let mut precompiler = Precompiler::new(options(&root, &output), reject_boom);
    let err = precompiler.run().unwrap_err();

    match &err {
        BraceletError::CompileError { name, diagnostic } => {
            assert_eq!(name, "bad");
            assert_eq!(diagnostic.offset, Some(3));
            assert!(diagnostic.message.contains("unexpected boom"));
        }
        other => panic!("Expected CompileError, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 3);
    assert!(matches!(precompiler.state(), PipelineState::Failed(reason) if reason.contains("bad")));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous bundle");
}

#[test]
fn test_compile_failure_writes_nothing_when_no_previous_output() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("bad.hbs", "boom")]);
    let output = temp.path().join("dist/templates.js");

    let result = Precompiler::new(options(&root, &output), reject_boom).run();
    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn test_malformed_template_is_compile_error() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("list.hbs", "<ul>\n{{#each items}}\n<li>{{name}}</li>\n")]);
    let output = temp.path().join("templates.js");

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let counting = move |source: &str| -> std::result::Result<String, Diagnostic> {
        seen.fetch_add(1, Ordering::SeqCst);
        echo(source)
    };

    let err = Precompiler::new(options(&root, &output), counting)
        .run()
        .unwrap_err();
    match err {
        BraceletError::CompileError { name, diagnostic } => {
            assert_eq!(name, "list");
            assert!(diagnostic.message.contains("Unclosed section {{#each}}"));
            assert_eq!(diagnostic.offset, Some(5));
        }
        other => panic!("Expected CompileError, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0, "compiler must not run");
}

#[test]
fn test_unclosed_tag_is_compile_error() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("cut.hbs", "Hello {{name")]);
    let output = temp.path().join("templates.js");

    let err = Precompiler::new(options(&root, &output), echo).run().unwrap_err();
    assert!(matches!(err, BraceletError::CompileError { ref name, .. } if name == "cut"));
}

#[test]
fn test_sections_and_partials_reach_the_compiler() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(
        &root,
        &[("page.hbs", "{{> header}}{{#if user}}{{user.name}}{{else}}guest{{/if}}")],
    );
    let output = temp.path().join("templates.js");

    let report = Precompiler::new(options(&root, &output), echo).run().unwrap();
    assert_eq!(report.templates, vec!["page"]);
}

#[test]
fn test_block_comment_with_tags_reaches_the_compiler() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    let source = "{{!-- {{#each items}}{{/each}} --}}hello";
    write_templates(&root, &[("note.hbs", source)]);
    let output = temp.path().join("templates.js");

    let report = Precompiler::new(options(&root, &output), echo).run().unwrap();
    assert_eq!(report.templates, vec!["note"]);
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains(&format!("template(function () {{ return {:?}; }})", source)));
}

#[test]
fn test_helper_names_pass_through_unchanged() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("t.hbs", "{{myCustomHelper x}}")]);
    let output = temp.path().join("templates.js");

    Precompiler::new(options(&root, &output), echo).run().unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("{{myCustomHelper x}}"));
}

#[test]
fn test_missing_listed_template() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("a.hbs", "A")]);
    let output = temp.path().join("templates.js");

    let mut opts = options(&root, &output);
    opts.templates = vec!["a".to_string(), "ghost".to_string()];
    let mut precompiler = Precompiler::new(opts, echo);
    let err = precompiler.run().unwrap_err();

    assert!(matches!(err, BraceletError::TemplateNotFound { ref name, .. } if name == "ghost"));
    assert_eq!(err.exit_code(), 2);
    assert!(matches!(precompiler.state(), PipelineState::Failed(_)));
    assert!(!output.exists());
}

#[test]
fn test_missing_root() {
    let temp = temp_dir_in_workspace();
    let output = temp.path().join("templates.js");

    let err = Precompiler::new(options(&temp.path().join("nope"), &output), echo)
        .run()
        .unwrap_err();
    assert!(matches!(err, BraceletError::TemplateRootNotFound(_)));
}

#[test]
fn test_output_path_is_directory() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("a.hbs", "A")]);
    let output = temp.path().join("occupied");
    std::fs::create_dir_all(output.join("child")).unwrap();

    let mut precompiler = Precompiler::new(options(&root, &output), echo);
    let err = precompiler.run().unwrap_err();

    match &err {
        BraceletError::OutputWriteError { path, .. } => assert_eq!(path, &output),
        other => panic!("Expected OutputWriteError, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 4);
    assert!(output.join("child").is_dir());
}

#[test]
fn test_output_inside_root_is_not_rediscovered() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("a.hbs", "A")]);
    let output = root.join("templates.js");

    Precompiler::new(options(&root, &output), echo).run().unwrap();
    let report = Precompiler::new(options(&root, &output), echo).run().unwrap();
    assert_eq!(report.templates, vec!["a"]);
}

#[test]
fn test_cancelled_before_run() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("a.hbs", "A")]);
    let output = temp.path().join("templates.js");

    let token = CancellationToken::new();
    token.cancel();
    let mut precompiler = Precompiler::new(options(&root, &output), echo).with_cancellation(token);
    let err = precompiler.run().unwrap_err();

    assert!(matches!(err, BraceletError::Cancelled(_)));
    assert_eq!(err.exit_code(), 5);
    assert!(matches!(precompiler.state(), PipelineState::Failed(reason) if reason.starts_with("CANCELLED")));
    assert!(!output.exists());
}

#[test]
fn test_cancelled_between_compilations() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("a.hbs", "A"), ("b.hbs", "B"), ("c.hbs", "C")]);
    let output = temp.path().join("templates.js");
    std::fs::write(&output, "previous bundle").unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let cancelling = move |source: &str| -> std::result::Result<String, Diagnostic> {
        seen.fetch_add(1, Ordering::SeqCst);
        trigger.cancel();
        echo(source)
    };

    let err = Precompiler::new(options(&root, &output), cancelling)
        .with_cancellation(token)
        .run()
        .unwrap_err();

    assert!(matches!(err, BraceletError::Cancelled(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous bundle");
}

#[test]
fn test_cancellation_token_handle_cancels_run() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("a.hbs", "A")]);
    let output = temp.path().join("templates.js");

    let mut precompiler = Precompiler::new(options(&root, &output), echo);
    precompiler.cancellation_token().cancel();

    assert!(matches!(precompiler.run(), Err(BraceletError::Cancelled(_))));
}

#[test]
fn test_deadline_exceeded() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("a.hbs", "A")]);
    let output = temp.path().join("templates.js");

    let mut opts = options(&root, &output);
    opts.timeout = Some(Duration::ZERO);
    let err = Precompiler::new(opts, echo).run().unwrap_err();

    match err {
        BraceletError::Cancelled(reason) => assert!(reason.contains("deadline")),
        other => panic!("Expected Cancelled, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn test_deadline_checked_before_writing() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("slow.hbs", "S")]);
    let output = temp.path().join("templates.js");

    let slow = |source: &str| -> std::result::Result<String, Diagnostic> {
        std::thread::sleep(Duration::from_millis(300));
        echo(source)
    };
    let mut opts = options(&root, &output);
    opts.timeout = Some(Duration::from_millis(100));

    let err = Precompiler::new(opts, slow).run().unwrap_err();
    assert!(matches!(err, BraceletError::Cancelled(ref reason) if reason.contains("writing")));
    assert!(!output.exists());
}

#[test]
fn test_parallel_keeps_discovery_order() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    let files: Vec<(String, String)> = (0..12)
        .map(|i| (format!("t{:02}.hbs", i), format!("{}", i)))
        .collect();
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(path, content)| (path.as_str(), content.as_str()))
        .collect();
    write_templates(&root, &refs);
    let output = temp.path().join("templates.js");

    // Early templates finish last
    let staggered = |source: &str| -> std::result::Result<String, Diagnostic> {
        let index: u64 = source.parse().unwrap_or(0);
        std::thread::sleep(Duration::from_millis(5 * (12 - index)));
        echo(source)
    };

    let mut parallel = options(&root, &output);
    parallel.parallel = true;
    let report = Precompiler::new(parallel, staggered).run().unwrap();
    let parallel_text = std::fs::read(&output).unwrap();

    let expected: Vec<String> = (0..12).map(|i| format!("t{:02}", i)).collect();
    assert_eq!(report.templates, expected);

    Precompiler::new(options(&root, &output), echo).run().unwrap();
    assert_eq!(std::fs::read(&output).unwrap(), parallel_text);
}

#[test]
fn test_parallel_failure_writes_nothing() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(
        &root,
        &[("a.hbs", "A"), ("b.hbs", "boom"), ("c.hbs", "C"), ("d.hbs", "D")],
    );
    let output = temp.path().join("templates.js");

    let mut opts = options(&root, &output);
    opts.parallel = true;
    let mut precompiler = Precompiler::new(opts, reject_boom);
    let err = precompiler.run().unwrap_err();

    assert!(matches!(err, BraceletError::CompileError { ref name, .. } if name == "b"));
    assert!(matches!(precompiler.state(), PipelineState::Failed(_)));
    assert!(!output.exists());
}

#[test]
fn test_parallel_cancelled() {
    let temp = temp_dir_in_workspace();
    let root = temp.path().join("templates");
    write_templates(&root, &[("a.hbs", "A"), ("b.hbs", "B")]);
    let output = temp.path().join("templates.js");

    let token = CancellationToken::new();
    token.cancel();
    let mut opts = options(&root, &output);
    opts.parallel = true;

    let err = Precompiler::new(opts, echo)
        .with_cancellation(token)
        .run()
        .unwrap_err();
    assert!(matches!(err, BraceletError::Cancelled(_)));
}

#[test]
fn test_options_from_config() {
    let config = Config::parse(
        r#"
[precompile]
root = "views"
suffix = ".handlebars"
output = "public/views.js"
templates = ["home"]
amd = true
runtime = "hbs"
parallel = false
timeout_secs = 30
"#,
    )
    .unwrap();

    let options = PrecompileOptions::from(&config.precompile);
    assert_eq!(options.root, Path::new("views"));
    assert_eq!(options.suffix, ".handlebars");
    assert_eq!(options.output, Path::new("public/views.js"));
    assert_eq!(options.templates, vec!["home"]);
    assert_eq!(options.format, ModuleFormat::amd("hbs"));
    assert!(!options.parallel);
    assert_eq!(options.timeout, Some(Duration::from_secs(30)));
}

#[test]
fn test_options_from_default_config_are_plain() {
    let options = PrecompileOptions::from(&Config::default().precompile);
    assert_eq!(options.format, ModuleFormat::Plain);
    assert_eq!(options.timeout, None);
}

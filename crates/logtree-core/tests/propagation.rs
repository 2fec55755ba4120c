//! Dispatch and propagation tests
//!
//! Each test builds its own registry and captures output with in-memory
//! writers so records can be compared exactly.

use std::fs;
use std::sync::Arc;

use logtree_core::{
    info, shared_writer, warning, Logger, MemoryWriter, RecordFormatter, Registry, RenderGate,
    Severity,
};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// Attach a capture writer and a private formatter with a fixed template.
fn capture(logger: &Logger, record_format: &str) -> MemoryWriter {
    let memory = MemoryWriter::new();
    logger.set_writer(shared_writer(memory.clone()));
    logger.set_formatter(Arc::new(RecordFormatter::new(record_format, "%Y", true)));
    memory
}

// ============================================================================
// Propagation
// ============================================================================

#[test]
fn test_record_reaches_every_ancestor_with_origin_name() {
    let registry = Registry::new();
    let root = registry.root();
    let a = registry.try_get("A").unwrap();
    let ab = registry.try_get("A.B").unwrap();
    root.set_level(Severity::Debug);

    let root_out = capture(&root, "root|%n|%l|%m");
    let a_out = capture(&a, "a|%n|%l|%m");
    let ab_out = capture(&ab, "ab|%n|%l|%m");

    ab.error(format_args!("disk {}", "full"));

    assert_eq!(ab_out.lines(), vec!["ab|A.B|error|disk full"]);
    assert_eq!(a_out.lines(), vec!["a|A.B|error|disk full"]);
    assert_eq!(root_out.lines(), vec!["root|A.B|error|disk full"]);
}

#[test]
fn test_propagation_stops_at_disabled_node() {
    let registry = Registry::new();
    let root = registry.root();
    let a = registry.try_get("A").unwrap();
    let ab = registry.try_get("A.B").unwrap();

    let root_out = capture(&root, "%n %m");
    let a_out = capture(&a, "%n %m");
    assert!(a.set_propagation(false));

    ab.critical(format_args!("stop here"));

    assert_eq!(a_out.lines(), vec!["A.B stop here"]);
    assert!(root_out.is_empty());
}

#[test]
fn test_root_does_not_propagate_further() {
    let registry = Registry::new();
    let root = registry.root();
    let out = capture(&root, "%m");
    root.warning(format_args!("once"));
    assert_eq!(out.lines(), vec!["once"]);
}

#[test]
fn test_nodes_without_sinks_are_skipped_but_walk_continues() {
    let registry = Registry::new();
    let root = registry.root();
    let leaf = registry.try_get("x.y.z").unwrap();
    let out = capture(&root, "%n:%m");

    leaf.error(format_args!("through silent parents"));

    assert_eq!(out.lines(), vec!["x.y.z:through silent parents"]);
}

// ============================================================================
// Thresholds
// ============================================================================

#[test]
fn test_threshold_gates_write_but_not_propagation() {
    let registry = Registry::new();
    let root = registry.root();
    let a = registry.try_get("A").unwrap();
    root.set_level(Severity::Debug);

    let root_out = capture(&root, "%l %m");
    let a_out = capture(&a, "%l %m");
    a.set_level(Severity::Warning);

    a.info(format_args!("chatty"));

    assert!(a_out.is_empty(), "A's threshold is warning");
    assert_eq!(root_out.lines(), vec!["info chatty"]);
}

#[test]
fn test_each_node_uses_its_own_effective_threshold() {
    let registry = Registry::new();
    let root = registry.root();
    let a = registry.try_get("A").unwrap();
    let ab = registry.try_get("A.B").unwrap();

    let root_out = capture(&root, "%m");
    let a_out = capture(&a, "%m");
    let ab_out = capture(&ab, "%m");
    a.set_level(Severity::Info);

    // A.B inherits info from A; root stays at warning.
    ab.info(format_args!("info event"));
    assert_eq!(ab_out.lines(), vec!["info event"]);
    assert_eq!(a_out.lines(), vec!["info event"]);
    assert!(root_out.is_empty());
}

#[test]
fn test_effective_level_follows_parent_changes() {
    let registry = Registry::new();
    let parent = registry.try_get("svc").unwrap();
    let child = registry.try_get("svc.worker").unwrap();

    parent.set_level(Severity::Warning);
    assert_eq!(child.level(), Severity::Unset);
    assert_eq!(child.effective_level(), Severity::Warning);

    parent.set_level(Severity::Debug);
    assert_eq!(child.effective_level(), Severity::Debug);

    parent.set_level(Severity::Unset);
    assert_eq!(child.effective_level(), Severity::Warning, "falls back to root");

    registry.root().set_level(Severity::Unset);
    assert_eq!(child.effective_level(), Severity::Warning, "fixed default");
}

#[test]
fn test_out_of_range_raw_level() {
    let registry = Registry::new();
    let root = registry.root();
    let out = capture(&root, "%l|%L|%m");

    root.log_raw(9, format_args!("odd"));
    root.log_raw(-3, format_args!("dropped"));

    assert_eq!(out.lines(), vec!["unknown|UNKNOWN|odd"]);
}

// ============================================================================
// Formatters
// ============================================================================

#[test]
fn test_shared_formatter_update_affects_all_nodes() {
    let registry = Registry::new();
    let a = registry.try_get("a").unwrap();
    let b = registry.try_get("b").unwrap();
    a.set_propagation(false);
    b.set_propagation(false);

    let shared = Arc::new(RecordFormatter::new("v1 %m", "%Y", true));
    let a_out = MemoryWriter::new();
    let b_out = MemoryWriter::new();
    a.set_writer(shared_writer(a_out.clone()));
    b.set_writer(shared_writer(b_out.clone()));
    a.set_formatter(shared.clone());
    b.set_formatter(shared.clone());

    shared.set_record_format("v2 %n %m");
    warning!(a, "from {}", "a");
    warning!(b, "from {}", "b");

    assert_eq!(a_out.lines(), vec!["v2 a from a"]);
    assert_eq!(b_out.lines(), vec!["v2 b from b"]);
}

#[test]
fn test_default_formatter_applies_until_cleared() {
    let registry = Registry::new();
    registry.default_formatter().set_record_format("default %m");
    let node = registry.try_get("n").unwrap();
    node.set_propagation(false);
    let out = MemoryWriter::new();
    node.set_writer(shared_writer(out.clone()));

    node.set_formatter(Arc::new(RecordFormatter::new("own %m", "%Y", true)));
    node.error(format_args!("1"));
    assert!(node.clear_formatter().is_some());
    node.error(format_args!("2"));

    assert_eq!(out.lines(), vec!["own 1", "default 2"]);
}

#[test]
fn test_trailing_newline_off_concatenates() {
    let registry = Registry::new();
    let root = registry.root();
    let out = MemoryWriter::new();
    root.set_writer(shared_writer(out.clone()));
    root.set_formatter(Arc::new(RecordFormatter::new("[%m]", "%Y", false)));

    root.error(format_args!("a"));
    root.error(format_args!("b"));

    assert_eq!(out.contents(), "[a][b]");
}

#[test]
fn test_render_gates_produce_identical_output() {
    let registry = Registry::new();
    let root = registry.root();
    let a = registry.try_get("A").unwrap();
    let root_out = capture(&root, "%n %l %m");
    let a_out = capture(&a, "%n %l %m");
    a.set_level(Severity::Error);

    for gate in [RenderGate::SinkOnly, RenderGate::SinkAndThreshold] {
        a.log_gated(Severity::Warning, gate, format_args!("gated"));
    }

    assert!(a_out.is_empty());
    assert_eq!(root_out.lines(), vec!["A warning gated", "A warning gated"]);
}

#[test]
fn test_macros_format_arguments() {
    let registry = Registry::new();
    let root = registry.root();
    root.set_level(Severity::Debug);
    let out = capture(&root, "%L %m");

    info!(root, "{} + {} = {}", 1, 2, 1 + 2);
    logtree_core::log!(root, Severity::Debug, "{:>4}", 7);

    assert_eq!(out.lines(), vec!["INFO 1 + 2 = 3", "DEBUG    7"]);
}

// ============================================================================
// File Sinks
// ============================================================================

#[test]
fn test_stream_and_file_both_receive_records() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("both.log");
    let registry = Registry::new();
    let root = registry.root();
    let out = capture(&root, "%l %m");

    root.set_logfile(&path).unwrap();
    root.error(format_args!("twice"));

    assert_eq!(out.lines(), vec!["error twice"]);
    assert_eq!(fs::read_to_string(&path).unwrap(), "error twice\n");
}

#[test]
fn test_empty_logfile_path_closes_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("closed.log");
    let registry = Registry::new();
    let root = registry.root();
    root.set_formatter(Arc::new(RecordFormatter::new("%m", "%Y", true)));

    root.set_logfile(&path).unwrap();
    root.error(format_args!("kept"));
    root.set_logfile("").unwrap();
    assert!(root.logfile().is_none());
    root.error(format_args!("not written"));

    assert_eq!(fs::read_to_string(&path).unwrap(), "kept\n");
}

#[test]
fn test_switching_files_closes_previous() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first.log");
    let second = temp.path().join("second.log");
    let registry = Registry::new();
    let root = registry.root();
    root.set_formatter(Arc::new(RecordFormatter::new("%m", "%Y", true)));

    root.set_logfile(&first).unwrap();
    root.error(format_args!("one"));
    root.set_logfile(&second).unwrap();
    root.error(format_args!("two"));

    assert_eq!(fs::read_to_string(&first).unwrap(), "one\n");
    assert_eq!(fs::read_to_string(&second).unwrap(), "two\n");
    assert_eq!(root.logfile().unwrap(), fs::canonicalize(&second).unwrap());
}

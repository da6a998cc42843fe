// ABOUTME: Tests for resource-limiter enforcement and host cancellation

use jyro::{CancellationToken, Engine, ExecutionOptions, MessageCode, Stage, Value};
use std::time::Duration;

fn empty_data() -> Value {
    Value::Object(indexmap::IndexMap::new())
}

fn engine_with(f: impl FnOnce(ExecutionOptions) -> ExecutionOptions) -> Engine {
    Engine::new().with_options(f(ExecutionOptions::default()))
}

#[test]
fn test_infinite_loop_hits_iteration_limit() {
    let engine = engine_with(|o| o.with_max_loop_iterations(50).with_max_statements(1_000_000));
    let result = engine.execute("while true do end", empty_data());
    assert!(!result.success);
    let error = result.errors().next().unwrap();
    assert_eq!(error.code, MessageCode::LoopLimitExceeded);
    assert_eq!(error.stage, Stage::Execution);
    assert_eq!(error.args, vec!["50".to_string()]);
    // Terminates within max_loop_iterations + 1.
    assert!(result.metadata.loop_iterations <= 51);
}

#[test]
fn test_statement_limit() {
    let engine = engine_with(|o| o.with_max_statements(10));
    let result = engine.execute(
        "var i = 0 while i < 100 do i = i + 1 end Data.i = i",
        empty_data(),
    );
    assert!(!result.success);
    assert_eq!(
        result.errors().next().unwrap().code,
        MessageCode::StatementLimitExceeded
    );
    assert_eq!(result.metadata.statements_executed, 11);
}

#[test]
fn test_wall_clock_limit_terminates_infinite_loop() {
    let engine = engine_with(|o| {
        o.with_max_wall_time(Duration::from_millis(50))
            .with_max_statements(u64::MAX)
            .with_max_loop_iterations(u64::MAX)
    });
    let result = engine.execute("var i = 0 while true do i = i + 1 end", empty_data());
    assert!(!result.success);
    assert_eq!(
        result.errors().next().unwrap().code,
        MessageCode::TimeLimitExceeded
    );
    // Generous bound: polled every iteration, so far under a second.
    assert!(result.metadata.elapsed < Duration::from_secs(2));
}

#[test]
fn test_call_depth_limit() {
    // Nesting through call arguments does not stack (arguments evaluate
    // before the bracket); recursion through CallScript does.
    let mut resolver = jyro::InMemoryScriptResolver::new();
    resolver.insert("recur", "CallScript(\"recur\")");
    let engine = engine_with(|o| o.with_max_call_depth(4).with_max_script_call_depth(100))
        .with_resolver(std::sync::Arc::new(resolver));
    let result = engine.execute("CallScript(\"recur\")", empty_data());
    assert!(!result.success);
    assert_eq!(
        result.errors().next().unwrap().code,
        MessageCode::CallDepthExceeded
    );
    assert_eq!(result.metadata.max_call_depth, 5);
}

#[test]
fn test_script_call_depth_limit() {
    let mut resolver = jyro::InMemoryScriptResolver::new();
    resolver.insert("recur", "CallScript(\"recur\")");
    let engine = engine_with(|o| o.with_max_script_call_depth(3).with_max_call_depth(100))
        .with_resolver(std::sync::Arc::new(resolver));
    let result = engine.execute("CallScript(\"recur\")", empty_data());
    assert!(!result.success);
    assert_eq!(
        result.errors().next().unwrap().code,
        MessageCode::ScriptCallDepthExceeded
    );
}

#[test]
fn test_cancellation_from_another_thread() {
    let engine = engine_with(|o| {
        o.with_max_wall_time(Duration::from_secs(30))
            .with_max_statements(u64::MAX)
            .with_max_loop_iterations(u64::MAX)
    });
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(30));
        trigger.cancel();
    });

    let result = engine.execute_with_cancellation(
        "Data.progress = 0 while true do Data.progress = Data.progress + 1 end",
        empty_data(),
        &cancel,
    );
    canceller.join().unwrap();

    assert!(!result.success);
    assert_eq!(
        result.errors().next().unwrap().code,
        MessageCode::CancelledByHost
    );
    // Partial mutations are preserved.
    let Value::Object(map) = &result.data else { panic!("root not object") };
    assert!(map.get("progress").is_some());
}

#[test]
fn test_limits_reset_between_executions() {
    let engine = engine_with(|o| o.with_max_statements(5));
    let source = "var a = 1 var b = 2 Data.c = a + b";
    let first = engine.execute(source, empty_data());
    let second = engine.execute(source, empty_data());
    assert!(first.success);
    assert!(second.success, "limiter state leaked across executions");
}

#[test]
fn test_foreach_counts_toward_loop_limit() {
    let engine = engine_with(|o| o.with_max_loop_iterations(4));
    let result = engine.execute(
        "foreach a in [1, 2, 3] do end foreach b in [1, 2, 3] do end",
        empty_data(),
    );
    assert!(!result.success);
    assert_eq!(
        result.errors().next().unwrap().code,
        MessageCode::LoopLimitExceeded
    );
}

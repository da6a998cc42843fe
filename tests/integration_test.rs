// ABOUTME: End-to-end tests driving the whole pipeline through the Engine

use jyro::{
    Engine, ExecError, FunctionContext, FunctionSignature, JyroFunction, MessageCode, Parameter,
    Severity, Stage, Value, ValueType,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn empty_data() -> Value {
    Value::Object(indexmap_new())
}

fn indexmap_new() -> indexmap::IndexMap<String, Value> {
    indexmap::IndexMap::new()
}

fn get(data: &Value, key: &str) -> Value {
    match data {
        Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
        other => panic!("expected object root, got {}", other.type_name()),
    }
}

fn number(n: f64) -> Value {
    Value::Number(n)
}

// ============================================================================
// Specification scenarios (all run with Data initially {})
// ============================================================================

#[test]
fn scenario_a_arithmetic_precedence() {
    let result = Engine::new().execute("Data.result = (5 + 3) * 2 - 4 / 2", empty_data());
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(get(&result.data, "result").equals(&number(14.0)));
}

#[test]
fn scenario_b_array_literal_and_index() {
    let result = Engine::new().execute(
        "var arr = [10, 20, 30]; Data.result = arr[1]",
        empty_data(),
    );
    assert!(result.success);
    assert!(get(&result.data, "result").equals(&number(20.0)));
}

#[test]
fn scenario_c_division_by_zero() {
    let result = Engine::new().execute("Data.result = 10 / 0", empty_data());
    assert!(!result.success);
    assert_eq!(result.data, empty_data());
    let errors: Vec<_> = result.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, MessageCode::DivisionByZero);
    assert_eq!(errors[0].stage, Stage::Execution);
}

#[test]
fn scenario_d_while_with_continue() {
    let source = "var i = 0; var s = 0; \
                  while i < 5 do \
                    if i == 3 then i = i + 1; continue end; \
                    s = s + i; i = i + 1 \
                  end; \
                  Data.result = s";
    let result = Engine::new().execute(source, empty_data());
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(get(&result.data, "result").equals(&number(7.0)));
}

#[test]
fn scenario_e_block_scoped_shadowing() {
    let source =
        "var x = 10; if true then var x = 20; Data.inner = x end; Data.outer = x";
    let result = Engine::new().execute(source, empty_data());
    assert!(result.success);
    assert!(get(&result.data, "inner").equals(&number(20.0)));
    assert!(get(&result.data, "outer").equals(&number(10.0)));
}

#[test]
fn scenario_f_switch_on_true() {
    let source = "switch true do \
                    case 75 >= 100 then Data.t = \"G\" \
                    case 75 >= 50 then Data.t = \"S\" \
                    default then Data.t = \"B\" \
                  end";
    let result = Engine::new().execute(source, empty_data());
    assert!(result.success);
    assert_eq!(get(&result.data, "t"), Value::String("S".into()));
}

// ============================================================================
// Quantified invariants
// ============================================================================

#[test]
fn test_determinism() {
    let source = "var total = 0 \
                  foreach n in [3, 1, 4, 1, 5] do total = total + n end \
                  Data.sum = total \
                  Data.label = \"n=\" + total";
    let engine = Engine::new();
    let a = engine.execute(source, empty_data());
    let b = engine.execute(source, empty_data());
    assert!(a.success && b.success);
    assert_eq!(a.data, b.data);
    assert_eq!(a.diagnostics.len(), b.diagnostics.len());
    assert_eq!(
        a.metadata.statements_executed,
        b.metadata.statements_executed
    );
    assert_eq!(a.metadata.loop_iterations, b.metadata.loop_iterations);
}

#[test]
fn test_scope_hygiene_is_a_validation_error() {
    let result = Engine::new().execute(
        "if true then var x = 1 end; Data.y = x",
        empty_data(),
    );
    assert!(!result.success);
    assert_eq!(result.diagnostics[0].stage, Stage::Validation);
    assert_eq!(result.diagnostics[0].code, MessageCode::UndeclaredVariable);
}

/// Host function that counts its invocations.
struct Bump {
    signature: FunctionSignature,
    calls: Arc<AtomicUsize>,
}

impl Bump {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        Bump {
            signature: FunctionSignature::new("Bump", vec![], Some(ValueType::Number)),
            calls,
        }
    }
}

impl JyroFunction for Bump {
    fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    fn execute(&self, _args: &[Value], _ctx: &mut FunctionContext<'_>) -> Result<Value, ExecError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Value::Number(n as f64))
    }
}

#[test]
fn test_short_circuit_skips_right_hand_side() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut engine = Engine::empty();
    engine.register_function(Arc::new(Bump::new(calls.clone())));

    let source = "Data.a = false and Bump() \
                  Data.b = true or Bump() \
                  Data.c = true and Bump() \
                  Data.d = false or Bump()";
    let result = engine.execute(source, empty_data());
    assert!(result.success, "{:?}", result.diagnostics);
    // Only the two non-short-circuited operands ran.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(get(&result.data, "a"), Value::Boolean(false));
    assert_eq!(get(&result.data, "b"), Value::Boolean(true));
    assert_eq!(get(&result.data, "c"), Value::Boolean(true));
    assert_eq!(get(&result.data, "d"), Value::Boolean(true));
}

#[test]
fn test_object_iteration_follows_source_order() {
    let source = "var order = [] \
                  foreach k in {zulu: 1, alpha: 2, mike: 3} do \
                    order = Append(order, k) \
                  end \
                  Data.order = order";
    let result = Engine::new().execute(source, empty_data());
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(get(&result.data, "order").equals(&Value::Array(vec![
        Value::String("zulu".into()),
        Value::String("alpha".into()),
        Value::String("mike".into()),
    ])));
}

#[test]
fn test_pure_script_is_idempotent() {
    let source = "Data.doubled = [] \
                  foreach n in Data.input do \
                    Data.doubled = Append(Data.doubled, n * 2) \
                  end";
    let initial = Value::from_json(&serde_json::json!({"input": [1, 2, 3]}));
    let engine = Engine::new();
    let first = engine.execute(source, initial.clone());
    let second = engine.execute(source, initial);
    assert!(first.success && second.success);
    assert_eq!(first.data, second.data);
}

// ============================================================================
// Stage diagnostics
// ============================================================================

#[test]
fn test_lexing_error_reports_position() {
    let result = Engine::new().execute("Data.x = 1\nData.y = @", empty_data());
    assert!(!result.success);
    let d = &result.diagnostics[0];
    assert_eq!(d.stage, Stage::Lexing);
    assert_eq!(d.code, MessageCode::UnexpectedCharacter);
    assert_eq!((d.line, d.column), (2, 10));
}

#[test]
fn test_parsing_error_is_fatal() {
    let result = Engine::new().execute("if Data.x then", empty_data());
    assert!(!result.success);
    assert_eq!(result.diagnostics[0].stage, Stage::Parsing);
    // Data untouched on front-end failure.
    assert_eq!(result.data, empty_data());
}

#[test]
fn test_undefined_function_is_a_linking_error() {
    let result = Engine::new().execute("Data.x = NoSuchFunction(1)", empty_data());
    assert!(!result.success);
    let errors: Vec<_> = result.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].stage, Stage::Linking);
    assert_eq!(errors[0].code, MessageCode::UndefinedFunction);
    assert_eq!(errors[0].args, vec!["NoSuchFunction".to_string()]);
}

#[test]
fn test_duplicate_function_registration_warns_last_wins() {
    struct Fixed(FunctionSignature, f64);
    impl JyroFunction for Fixed {
        fn signature(&self) -> &FunctionSignature {
            &self.0
        }
        fn execute(
            &self,
            _args: &[Value],
            _ctx: &mut FunctionContext<'_>,
        ) -> Result<Value, ExecError> {
            Ok(Value::Number(self.1))
        }
    }
    let sig = || FunctionSignature::new("Pick", vec![], Some(ValueType::Number));

    let mut engine = Engine::empty();
    engine.register_function(Arc::new(Fixed(sig(), 1.0)));
    engine.register_function(Arc::new(Fixed(sig(), 2.0)));

    let result = engine.execute("Data.x = Pick()", empty_data());
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(get(&result.data, "x").equals(&number(2.0)));
    let warning = result
        .diagnostics
        .iter()
        .find(|d| d.code == MessageCode::DuplicateFunction)
        .expect("duplicate warning");
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(warning.stage, Stage::Linking);
}

#[test]
fn test_break_outside_loop() {
    let result = Engine::new().execute("break", empty_data());
    assert!(!result.success);
    assert_eq!(result.diagnostics[0].code, MessageCode::BreakOutsideLoop);
}

#[test]
fn test_argument_type_checked_at_call_time() {
    let result = Engine::new().execute("Data.x = Upper(42)", empty_data());
    assert!(!result.success);
    let errors: Vec<_> = result.errors().collect();
    assert_eq!(errors[0].code, MessageCode::ArgumentType);
    assert_eq!(errors[0].stage, Stage::Execution);
}

#[test]
fn test_arity_checked_at_call_time() {
    let result = Engine::new().execute("Data.x = Upper()", empty_data());
    assert!(!result.success);
    assert_eq!(result.errors().next().unwrap().code, MessageCode::ArgumentCount);
}

// ============================================================================
// Runtime semantics
// ============================================================================

#[test]
fn test_string_concatenation() {
    let result = Engine::new().execute(
        "Data.s = \"total: \" + 3 + \", ok: \" + true",
        empty_data(),
    );
    assert!(result.success);
    assert_eq!(get(&result.data, "s"), Value::String("total: 3, ok: true".into()));
}

#[test]
fn test_relational_on_mixed_types_fails() {
    let result = Engine::new().execute("Data.x = 1 < \"2\"", empty_data());
    assert!(!result.success);
    assert_eq!(result.errors().next().unwrap().code, MessageCode::TypeMismatch);
}

#[test]
fn test_cross_variant_equality_is_false() {
    let result = Engine::new().execute(
        "Data.a = 1 == \"1\" Data.b = null == false Data.c = [1] == [1]",
        empty_data(),
    );
    assert!(result.success);
    assert_eq!(get(&result.data, "a"), Value::Boolean(false));
    assert_eq!(get(&result.data, "b"), Value::Boolean(false));
    assert_eq!(get(&result.data, "c"), Value::Boolean(true));
}

#[test]
fn test_null_property_access_fails_with_position() {
    let result = Engine::new().execute("var n = null\nData.x = n.field", empty_data());
    assert!(!result.success);
    let error = result.errors().next().unwrap();
    assert_eq!(error.code, MessageCode::NullAccess);
    assert_eq!(error.line, 2);
}

#[test]
fn test_out_of_range_read_fails() {
    let result = Engine::new().execute("var a = [1, 2] Data.x = a[5]", empty_data());
    assert!(!result.success);
    let error = result.errors().next().unwrap();
    assert_eq!(error.code, MessageCode::IndexOutOfRange);
    assert_eq!(error.args, vec!["5".to_string(), "2".to_string()]);
}

#[test]
fn test_foreach_over_scalar_fails() {
    let result = Engine::new().execute("foreach x in true do end", empty_data());
    assert!(!result.success);
    assert_eq!(result.errors().next().unwrap().code, MessageCode::NotIterable);
}

#[test]
fn test_partial_mutations_survive_runtime_errors() {
    let result = Engine::new().execute(
        "Data.step = 1 Data.step = 2 Data.boom = [1][9]",
        empty_data(),
    );
    assert!(!result.success);
    assert!(get(&result.data, "step").equals(&number(2.0)));
}

#[test]
fn test_empty_containers_are_truthy() {
    let result = Engine::new().execute(
        "Data.arr = [] ? \"t\" : \"f\" Data.obj = {} ? \"t\" : \"f\"",
        empty_data(),
    );
    assert!(result.success, "{:?}", result.diagnostics);
    assert_eq!(get(&result.data, "arr"), Value::String("t".into()));
    assert_eq!(get(&result.data, "obj"), Value::String("t".into()));
}

#[test]
fn test_elseif_chain_picks_first_truthy() {
    let source = "var score = 75 \
                  if score >= 90 then Data.grade = \"A\" \
                  elseif score >= 70 then Data.grade = \"B\" \
                  elseif score >= 50 then Data.grade = \"C\" \
                  else Data.grade = \"F\" end";
    let result = Engine::new().execute(source, empty_data());
    assert!(result.success);
    assert_eq!(get(&result.data, "grade"), Value::String("B".into()));
}

#[test]
fn test_switch_multi_value_case() {
    let source = "switch Data.code do \
                    case 1, 2, 3 then Data.bucket = \"low\" \
                    case 4, 5 then Data.bucket = \"mid\" \
                    default then Data.bucket = \"high\" \
                  end";
    let engine = Engine::new();
    let initial = Value::from_json(&serde_json::json!({"code": 2}));
    let result = engine.execute(source, initial);
    assert!(result.success);
    assert_eq!(get(&result.data, "bucket"), Value::String("low".into()));
}

#[test]
fn test_hex_and_binary_literals() {
    let result = Engine::new().execute("Data.h = 0xFF Data.b = 0b1010", empty_data());
    assert!(result.success);
    assert!(get(&result.data, "h").equals(&number(255.0)));
    assert!(get(&result.data, "b").equals(&number(10.0)));
}

#[test]
fn test_data_root_replacement_and_scalar_root() {
    // The root need not stay an object.
    let result = Engine::new().execute("Data = 41 Data = Data + 1", Value::Null);
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(result.data.equals(&number(42.0)));
}

#[test]
fn test_metadata_function_calls_and_depth() {
    let result = Engine::new().execute("Data.x = Abs(Min(-3, Abs(-9)))", empty_data());
    assert!(result.success);
    assert_eq!(result.metadata.function_calls, 3);
    assert_eq!(result.metadata.max_call_depth, 1);
    assert!(get(&result.data, "x").equals(&number(3.0)));
}

#[test]
fn test_registry_is_case_sensitive() {
    let result = Engine::new().execute("Data.x = upper(\"a\")", empty_data());
    assert!(!result.success);
    assert_eq!(result.errors().next().unwrap().code, MessageCode::UndefinedFunction);
}

#[test]
fn test_compile_once_run_many() {
    let engine = Engine::new();
    let linked = engine
        .compile("Data.n = Data.n + 1")
        .expect("compile");
    let cancel = jyro::CancellationToken::new();
    let mut data = Value::from_json(&serde_json::json!({"n": 0}));
    for _ in 0..3 {
        let result = engine.run(&linked, data, &cancel);
        assert!(result.success);
        data = result.data;
    }
    assert!(get(&data, "n").equals(&number(3.0)));
}

#[test]
fn test_registry_snapshot_not_affected_by_later_registration() {
    // A linked program's table is frozen; registering afterwards does not
    // change an existing LinkedProgram.
    let mut engine = Engine::empty();
    let calls = Arc::new(AtomicUsize::new(0));
    engine.register_function(Arc::new(Bump::new(calls)));
    let linked = engine.compile("Data.x = Bump()").expect("compile");
    let before = linked.functions.len();
    engine.register_function(Arc::new(Bump::new(Arc::new(AtomicUsize::new(0)))));
    assert_eq!(linked.functions.len(), before);
}

#[test]
fn test_validation_collects_multiple_errors() {
    let result = Engine::new().execute("Data.a = x; Data.b = y; break", empty_data());
    assert!(!result.success);
    let codes: Vec<MessageCode> = result.errors().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![
            MessageCode::UndeclaredVariable,
            MessageCode::UndeclaredVariable,
            MessageCode::BreakOutsideLoop,
        ]
    );
}

#[test]
fn test_typed_declaration_failure_is_runtime() {
    let result = Engine::new().execute("var n: number = [1, 2]", empty_data());
    assert!(!result.success);
    let error = result.errors().next().unwrap();
    assert_eq!(error.stage, Stage::Execution);
    assert_eq!(error.code, MessageCode::TypeMismatch);
}

#[test]
fn test_parameter_validation_helpers() {
    // Optional parameter may be omitted but not mistyped.
    let ok = Engine::new().execute("Data.a = Substring(\"hello\", 1)", empty_data());
    assert!(ok.success);
    assert_eq!(get(&ok.data, "a"), Value::String("ello".into()));

    let bad = Engine::new().execute("Data.a = Substring(\"hello\", 1, \"x\")", empty_data());
    assert!(!bad.success);
    assert_eq!(bad.errors().next().unwrap().code, MessageCode::ArgumentType);
}

#[test]
fn test_linked_program_shared_across_threads() {
    // A linked program is immutable; concurrent runs each own their scope
    // stack, limiter, and diagnostics.
    let engine = Arc::new(Engine::new());
    let linked = Arc::new(
        engine
            .compile("var n = 0 while n < 100 do n = n + 1 end Data.n = n")
            .expect("compile"),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let linked = Arc::clone(&linked);
            std::thread::spawn(move || {
                let result = engine.run(&linked, empty_data(), &jyro::CancellationToken::new());
                assert!(result.success, "{:?}", result.diagnostics);
                assert!(get(&result.data, "n").equals(&Value::Number(100.0)));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_signature_construction_order() {
    // Required-then-optional construction is accepted.
    let sig = FunctionSignature::new(
        "F",
        vec![
            Parameter::required_any("a"),
            Parameter::optional("b", ValueType::Number),
        ],
        None,
    );
    assert_eq!(sig.required_count(), 1);
}

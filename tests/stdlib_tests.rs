// ABOUTME: Tests for the bundled standard library through the full engine

use jyro::{Engine, MessageCode, Value};

fn run(source: &str) -> Value {
    let result = Engine::new().execute(source, Value::Object(indexmap::IndexMap::new()));
    assert!(result.success, "{:?}", result.diagnostics);
    result.data
}

fn run_err(source: &str) -> MessageCode {
    let result = Engine::new().execute(source, Value::Object(indexmap::IndexMap::new()));
    assert!(!result.success, "expected failure");
    let code = result.errors().next().unwrap().code;
    code
}

fn get(data: &Value, key: &str) -> Value {
    match data {
        Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
        other => panic!("expected object root, got {}", other.type_name()),
    }
}

fn assert_num(data: &Value, key: &str, expected: f64) {
    let value = get(data, key);
    assert!(
        value.equals(&Value::Number(expected)),
        "{} = {:?}, expected {}",
        key,
        value,
        expected
    );
}

fn assert_str(data: &Value, key: &str, expected: &str) {
    assert_eq!(get(data, key), Value::String(expected.into()), "{}", key);
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_functions() {
    let data = run(r#"
        Data.len = Length("héllo")
        Data.up = Upper("mixed Case")
        Data.low = Lower("MIXED Case")
        Data.trimmed = Trim("  pad  ")
        Data.replaced = Replace("a-b-c", "-", "+")
        Data.sub = Substring("abcdef", 2, 3)
        Data.tail = Substring("abcdef", 4)
    "#);
    assert_num(&data, "len", 5.0);
    assert_str(&data, "up", "MIXED CASE");
    assert_str(&data, "low", "mixed case");
    assert_str(&data, "trimmed", "pad");
    assert_str(&data, "replaced", "a+b+c");
    assert_str(&data, "sub", "cde");
    assert_str(&data, "tail", "ef");
}

#[test]
fn test_split_and_join() {
    let data = run(r#"
        Data.parts = Split("a,b,c", ",")
        Data.chars = Split("ab", "")
        Data.joined = Join([1, "x", true], "-")
    "#);
    assert!(get(&data, "parts").equals(&Value::Array(vec![
        Value::String("a".into()),
        Value::String("b".into()),
        Value::String("c".into()),
    ])));
    assert!(get(&data, "chars").equals(&Value::Array(vec![
        Value::String("a".into()),
        Value::String("b".into()),
    ])));
    assert_str(&data, "joined", "1-x-true");
}

#[test]
fn test_string_predicates() {
    let data = run(r#"
        Data.c1 = Contains("haystack", "stack")
        Data.c2 = Contains([1, 2], 2)
        Data.c3 = Contains({a: 1}, "a")
        Data.sw = StartsWith("prefix", "pre")
        Data.ew = EndsWith("suffix", "fix")
    "#);
    for key in ["c1", "c2", "c3", "sw", "ew"] {
        assert_eq!(get(&data, key), Value::Boolean(true), "{}", key);
    }
}

#[test]
fn test_length_of_containers() {
    let data = run("Data.a = Length([1, 2, 3]) Data.o = Length({x: 1})");
    assert_num(&data, "a", 3.0);
    assert_num(&data, "o", 1.0);
}

#[test]
fn test_length_of_scalar_fails() {
    assert_eq!(run_err("Data.x = Length(5)"), MessageCode::FunctionFailed);
}

// ============================================================================
// Math
// ============================================================================

#[test]
fn test_math_functions() {
    let data = run(r#"
        Data.abs = Abs(-3.5)
        Data.min = Min(2, -1)
        Data.max = Max(2, -1)
        Data.round = Round(2.567, 2)
        Data.round0 = Round(2.5)
        Data.floor = Floor(2.9)
        Data.ceil = Ceiling(2.1)
        Data.sqrt = Sqrt(16)
    "#);
    assert_num(&data, "abs", 3.5);
    assert_num(&data, "min", -1.0);
    assert_num(&data, "max", 2.0);
    assert_num(&data, "round", 2.57);
    assert_num(&data, "round0", 3.0);
    assert_num(&data, "floor", 2.0);
    assert_num(&data, "ceil", 3.0);
    assert_num(&data, "sqrt", 4.0);
}

#[test]
fn test_sqrt_of_negative_fails() {
    assert_eq!(run_err("Data.x = Sqrt(-1)"), MessageCode::FunctionFailed);
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn test_array_functions_return_new_values() {
    let data = run(r#"
        Data.items = [3, 1, 2]
        Data.appended = Append(Data.items, 4)
        Data.sorted = Sort(Data.items)
        Data.reversed = Reverse(Data.items)
        Data.inserted = Insert(Data.items, 1, 9)
        Data.removed = RemoveAt(Data.items, 0)
    "#);
    // The source array is untouched by any of the calls.
    assert!(get(&data, "items").equals(&Value::Array(vec![
        Value::Number(3.0),
        Value::Number(1.0),
        Value::Number(2.0),
    ])));
    assert!(get(&data, "appended").equals(&Value::Array(vec![
        Value::Number(3.0),
        Value::Number(1.0),
        Value::Number(2.0),
        Value::Number(4.0),
    ])));
    assert!(get(&data, "sorted").equals(&Value::Array(vec![
        Value::Number(1.0),
        Value::Number(2.0),
        Value::Number(3.0),
    ])));
    assert!(get(&data, "reversed").equals(&Value::Array(vec![
        Value::Number(2.0),
        Value::Number(1.0),
        Value::Number(3.0),
    ])));
    assert!(get(&data, "inserted").equals(&Value::Array(vec![
        Value::Number(3.0),
        Value::Number(9.0),
        Value::Number(1.0),
        Value::Number(2.0),
    ])));
    assert!(get(&data, "removed").equals(&Value::Array(vec![
        Value::Number(1.0),
        Value::Number(2.0),
    ])));
}

#[test]
fn test_sort_strings_and_mixed() {
    let data = run(r#"Data.s = Sort(["pear", "apple", "fig"])"#);
    assert!(get(&data, "s").equals(&Value::Array(vec![
        Value::String("apple".into()),
        Value::String("fig".into()),
        Value::String("pear".into()),
    ])));
    assert_eq!(
        run_err(r#"Data.x = Sort([1, "a"])"#),
        MessageCode::FunctionFailed
    );
}

#[test]
fn test_index_of_first_last() {
    let data = run(r#"
        Data.hit = IndexOf([10, 20, 30], 20)
        Data.miss = IndexOf([10], 99)
        Data.text = IndexOf("abcabc", "c")
        Data.first = First([7, 8])
        Data.last = Last([7, 8])
        Data.empty = First([])
    "#);
    assert_num(&data, "hit", 1.0);
    assert_num(&data, "miss", -1.0);
    assert_num(&data, "text", 2.0);
    assert_num(&data, "first", 7.0);
    assert_num(&data, "last", 8.0);
    assert_eq!(get(&data, "empty"), Value::Null);
}

#[test]
fn test_insert_out_of_range_fails() {
    assert_eq!(
        run_err("Data.x = Insert([1], 5, 0)"),
        MessageCode::FunctionFailed
    );
}

// ============================================================================
// Objects
// ============================================================================

#[test]
fn test_object_functions() {
    let data = run(r#"
        Data.src = {b: 1, a: 2}
        Data.keys = Keys(Data.src)
        Data.values = Values(Data.src)
        Data.has = HasKey(Data.src, "a")
        Data.lacks = HasKey(Data.src, "z")
        Data.removed = Remove(Data.src, "b")
        Data.merged = Merge(Data.src, {a: 9, c: 3})
    "#);
    assert!(get(&data, "keys").equals(&Value::Array(vec![
        Value::String("b".into()),
        Value::String("a".into()),
    ])));
    assert!(get(&data, "values").equals(&Value::Array(vec![
        Value::Number(1.0),
        Value::Number(2.0),
    ])));
    assert_eq!(get(&data, "has"), Value::Boolean(true));
    assert_eq!(get(&data, "lacks"), Value::Boolean(false));
    assert!(get(&data, "removed").equals(&Value::from_json(&serde_json::json!({"a": 2}))));
    assert!(get(&data, "merged")
        .equals(&Value::from_json(&serde_json::json!({"b": 1, "a": 9, "c": 3}))));
}

// ============================================================================
// Types & JSON
// ============================================================================

#[test]
fn test_type_inspection() {
    let data = run(r#"
        Data.t1 = TypeOf(null)
        Data.t2 = TypeOf(1.5)
        Data.t3 = TypeOf([])
        Data.p1 = IsNumber(1)
        Data.p2 = IsString(1)
        Data.p3 = IsNull(null)
        Data.p4 = IsArray([1])
        Data.p5 = IsObject({})
        Data.p6 = IsBoolean(false)
    "#);
    assert_str(&data, "t1", "null");
    assert_str(&data, "t2", "number");
    assert_str(&data, "t3", "array");
    assert_eq!(get(&data, "p1"), Value::Boolean(true));
    assert_eq!(get(&data, "p2"), Value::Boolean(false));
    assert_eq!(get(&data, "p3"), Value::Boolean(true));
    assert_eq!(get(&data, "p4"), Value::Boolean(true));
    assert_eq!(get(&data, "p5"), Value::Boolean(true));
    assert_eq!(get(&data, "p6"), Value::Boolean(true));
}

#[test]
fn test_conversions() {
    let data = run(r#"
        Data.n = ToNumber("42.5")
        Data.nb = ToNumber(true)
        Data.s = ToString(3.5)
        Data.sb = ToString(null)
        Data.b = ToBoolean("")
        Data.b2 = ToBoolean(7)
    "#);
    assert_num(&data, "n", 42.5);
    assert_num(&data, "nb", 1.0);
    assert_str(&data, "s", "3.5");
    assert_str(&data, "sb", "");
    assert_eq!(get(&data, "b"), Value::Boolean(false));
    assert_eq!(get(&data, "b2"), Value::Boolean(true));
}

#[test]
fn test_to_number_failure() {
    assert_eq!(
        run_err(r#"Data.x = ToNumber("not a number")"#),
        MessageCode::TypeMismatch
    );
}

#[test]
fn test_json_round_trip() {
    let data = run(r#"
        Data.parsed = ParseJson("{\"a\": [1, 2], \"b\": null}")
        Data.rendered = ToJson(Data.parsed.a)
    "#);
    assert!(get(&data, "parsed")
        .equals(&Value::from_json(&serde_json::json!({"a": [1, 2], "b": null}))));
    assert_str(&data, "rendered", "[1.0,2.0]");
}

#[test]
fn test_parse_json_failure() {
    assert_eq!(
        run_err(r#"Data.x = ParseJson("{oops")"#),
        MessageCode::FunctionFailed
    );
}

// ============================================================================
// Dates
// ============================================================================

#[test]
fn test_date_arithmetic() {
    let data = run(r#"
        Data.later = AddDays("2024-03-01", 2)
        Data.earlier = AddDays("2024-03-01", -1)
        Data.span = DiffDays("2024-03-10", "2024-03-01")
        Data.fmt = FormatDate("2024-03-01", "%d/%m/%Y")
        Data.parsed = ParseDate("01.03.2024", "%d.%m.%Y")
    "#);
    assert_str(&data, "later", "2024-03-03");
    assert_str(&data, "earlier", "2024-02-29");
    assert_num(&data, "span", 9.0);
    assert_str(&data, "fmt", "01/03/2024");
    assert_str(&data, "parsed", "2024-03-01");
}

#[test]
fn test_now_and_today_are_parseable() {
    let data = run("Data.now = Now() Data.today = Today()");
    let Value::String(now) = get(&data, "now") else { panic!("Now() not a string") };
    assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    let Value::String(today) = get(&data, "today") else { panic!("Today() not a string") };
    assert!(chrono::NaiveDate::parse_from_str(&today, "%Y-%m-%d").is_ok());
}

#[test]
fn test_bad_date_fails() {
    assert_eq!(
        run_err(r#"Data.x = AddDays("yesterday", 1)"#),
        MessageCode::FunctionFailed
    );
}

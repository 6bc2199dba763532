use std::collections::HashMap;
use std::sync::Arc;

use kaede::{
    CallSignature, Context, Dispatcher, DynamicMethod, FaultKind, Protocols, RuntimeError, Symbol,
    Value,
};

#[derive(Default)]
struct TestDispatcher {
    methods: HashMap<(String, Symbol), DynamicMethod>,
}

impl TestDispatcher {
    fn define<F>(&mut self, class: &str, name: &str, f: F)
    where
        F: Fn(&Context, &Value, &[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        self.methods
            .insert((class.to_string(), Symbol::intern(name)), Arc::new(f));
    }
}

impl Dispatcher for TestDispatcher {
    fn resolve(
        &self,
        receiver: &Value,
        name: Symbol,
        _sig: CallSignature,
    ) -> Option<DynamicMethod> {
        self.methods
            .get(&(receiver.class_name().to_string(), name))
            .cloned()
    }
}

/// A two-class numeric tower: Fixnum#coerce promotes both operands to
/// floats, and Float answers the retried operators.
fn numeric_dispatcher() -> TestDispatcher {
    let mut d = TestDispatcher::default();
    d.define("Fixnum", "coerce", |_, recv, args| {
        // Fixnum#coerce promotes both operands to floats.
        let Value::Int(n) = recv else { unreachable!() };
        match &args[0] {
            Value::Num(f) => Ok(Value::array(vec![
                Value::Num(*f),
                Value::Num(*n as f64),
            ])),
            _ => Err(RuntimeError::type_error("incompatible operand")),
        }
    });
    d.define("Float", "+", |_, recv, args| {
        let (Value::Num(a), Value::Num(b)) = (recv, &args[0]) else {
            return Err(RuntimeError::type_error("not a float"));
        };
        Ok(Value::Num(a + b))
    });
    d.define("Float", "<=>", |_, recv, args| {
        let (Value::Num(a), Value::Num(b)) = (recv, &args[0]) else {
            return Ok(Value::Nil);
        };
        match a.partial_cmp(b) {
            Some(ord) => Ok(Value::Int(ord as i64)),
            None => Ok(Value::Nil),
        }
    });
    d.define("Float", "<", |_, recv, args| {
        let (Value::Num(a), Value::Num(b)) = (recv, &args[0]) else {
            return Ok(Value::Bool(false));
        };
        Ok(Value::Bool(a < b))
    });
    d
}

fn protocols(d: TestDispatcher) -> (Protocols, Context) {
    (Protocols::new(Arc::new(d)), Context::new())
}

#[test]
fn coerce_and_apply_retries_on_the_coerced_pair() {
    let (p, ctx) = protocols(numeric_dispatcher());
    // 2.5 + 1: the Fixnum operand coerces both values up to floats.
    let sum = p
        .coerce_and_apply(&ctx, "+", &Value::Num(2.5), &Value::Int(1))
        .unwrap();
    assert_eq!(sum, Value::Num(3.5));
}

#[test]
fn coerce_and_apply_faults_when_the_operand_cannot_coerce() {
    let (p, ctx) = protocols(numeric_dispatcher());
    let err = p
        .coerce_and_apply(&ctx, "+", &Value::Int(1), &Value::Str("x".into()))
        .unwrap_err();
    assert_eq!(err.kind, FaultKind::Coercion);
    assert_eq!(err.message, "String can't be coerced into Fixnum");
}

#[test]
fn nil_operand_declines_without_dispatching() {
    let (p, ctx) = protocols(numeric_dispatcher());
    let err = p
        .coerce_and_apply(&ctx, "+", &Value::Int(1), &Value::Nil)
        .unwrap_err();
    assert_eq!(err.message, "NilClass can't be coerced into Fixnum");

    // The loose entry point maps the same decline to nil.
    let out = p
        .try_coerce_and_apply(&ctx, "<", &Value::Int(1), &Value::Nil)
        .unwrap();
    assert_eq!(out, Value::Nil);
}

#[test]
fn recoverable_coerce_faults_decline_fatal_ones_propagate() {
    let mut d = numeric_dispatcher();
    d.define("Touchy", "coerce", |_, _, _| {
        Err(RuntimeError::type_error("won't coerce"))
    });
    d.define("Doomed", "coerce", |_, _, _| {
        Err(RuntimeError::fatal("stack exhausted"))
    });
    let (p, ctx) = protocols(d);

    // A raise inside coerce counts as "cannot coerce", not an error.
    let err = p
        .coerce_and_apply(&ctx, "+", &Value::Int(1), &Value::make_instance("Touchy"))
        .unwrap_err();
    assert_eq!(err.kind, FaultKind::Coercion);
    assert_eq!(err.message, "Touchy can't be coerced into Fixnum");

    let err = p
        .coerce_and_apply(&ctx, "+", &Value::Int(1), &Value::make_instance("Doomed"))
        .unwrap_err();
    assert_eq!(err.kind, FaultKind::Fatal);
    assert_eq!(err.message, "stack exhausted");
}

#[test]
fn coerce_must_answer_a_two_element_pair() {
    let mut d = numeric_dispatcher();
    d.define("Triple", "coerce", |_, recv, args| {
        Ok(Value::array(vec![
            args[0].clone(),
            recv.clone(),
            Value::Nil,
        ]))
    });
    d.define("Scalar", "coerce", |_, _, _| Ok(Value::Int(0)));
    let (p, ctx) = protocols(d);

    for operand in [Value::make_instance("Triple"), Value::make_instance("Scalar")] {
        let err = p
            .coerce_and_apply(&ctx, "+", &Value::Int(1), &operand)
            .unwrap_err();
        assert_eq!(err.kind, FaultKind::Coercion);
    }
}

#[test]
fn coerce_ignores_the_method_missing_hook() {
    let mut d = numeric_dispatcher();
    // Ghost would happily fabricate a pair through method_missing, but
    // the coerce site never consults the hook.
    d.define("Ghost", "method_missing", |_, recv, args| {
        Ok(Value::array(vec![args[1].clone(), recv.clone()]))
    });
    let (p, ctx) = protocols(d);

    let err = p
        .coerce_and_apply(&ctx, "+", &Value::Int(1), &Value::make_instance("Ghost"))
        .unwrap_err();
    assert_eq!(err.message, "Ghost can't be coerced into Fixnum");
}

#[test]
fn operator_faults_after_a_successful_coercion_propagate() {
    let mut d = numeric_dispatcher();
    d.define("Float", "-", |_, _, _| {
        Err(RuntimeError::type_error("subtraction refused"))
    });
    let (p, ctx) = protocols(d);

    let err = p
        .coerce_and_apply(&ctx, "-", &Value::Num(2.0), &Value::Int(1))
        .unwrap_err();
    assert_eq!(err.message, "subtraction refused");
}

#[test]
fn coerce_and_compare_yields_raw_result_or_nil() {
    let (p, ctx) = protocols(numeric_dispatcher());
    let ord = p
        .coerce_and_compare(&ctx, &Value::Num(1.0), &Value::Int(2))
        .unwrap();
    assert_eq!(ord, Value::Int(-1));

    let declined = p
        .coerce_and_compare(&ctx, &Value::Num(1.0), &Value::Str("x".into()))
        .unwrap();
    assert_eq!(declined, Value::Nil);
}

#[test]
fn coerce_and_relate_reduces_to_truth_or_faults() {
    let (p, ctx) = protocols(numeric_dispatcher());
    assert!(p
        .coerce_and_relate(&ctx, "<", &Value::Num(1.0), &Value::Int(2))
        .unwrap());
    assert!(!p
        .coerce_and_relate(&ctx, "<", &Value::Num(3.0), &Value::Int(2))
        .unwrap());

    let err = p
        .coerce_and_relate(&ctx, "<", &Value::Num(1.0), &Value::Str("x".into()))
        .unwrap_err();
    assert_eq!(err.kind, FaultKind::Comparison);
    assert_eq!(err.message, "comparison of Float with String failed");
}

#[test]
fn try_coerce_and_apply_booleanizes_definite_answers() {
    let (p, ctx) = protocols(numeric_dispatcher());
    let out = p
        .try_coerce_and_apply(&ctx, "<", &Value::Num(1.0), &Value::Int(2))
        .unwrap();
    assert_eq!(out, Value::Bool(true));

    let out = p
        .try_coerce_and_apply(&ctx, "<", &Value::Num(1.0), &Value::Str("x".into()))
        .unwrap();
    assert_eq!(out, Value::Nil);
}

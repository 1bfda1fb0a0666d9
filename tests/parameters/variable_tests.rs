//! Integration tests for the Variable struct
//!
//! Randomized loops use a seeded generator so failures are reproducible.

use crate::test_helpers::{int_set, rng};
use libdsp_rs::parameters::{
    ConstructionError, Datatype, Range, Status, Value, ValueSet, Variable, VariableError,
};
use rand::Rng;

#[test]
fn test_variable_lifecycle() {
    let range = Range::float_with_default(0.0, 0.25, 4.0, 1.0).unwrap();
    let mut var = Variable::new(Datatype::Float, Status::Dynamic, Some(range), None).unwrap();

    assert_eq!(var.datatype(), Datatype::Float);
    assert_eq!(var.get(), Some(&Value::Float(1.0)));
    assert!(var.capabilities().is_none());

    var.set(2.6).unwrap();
    assert_eq!(var.get(), Some(&Value::Float(2.5)));

    var.set_status(Status::Constant);
    var.set(3.0).unwrap();
    assert_eq!(var.get(), Some(&Value::Float(2.5)));

    // Type errors are checked before the status
    assert!(matches!(var.set(3), Err(VariableError::TypeMismatch(_))));

    var.set_status(Status::Dynamic);
    var.reset();
    assert_eq!(var.get(), Some(&Value::Float(1.0)));
}

#[test]
fn test_variable_construction_rules() {
    assert!(Variable::new(Datatype::Boolean, Status::Dynamic, None, None).is_ok());
    assert_eq!(
        Variable::new(Datatype::Boolean, Status::Dynamic, None, Some(int_set(&[1]))).unwrap_err(),
        VariableError::Construction(ConstructionError::ConstraintOnBoolean)
    );
    assert_eq!(
        Variable::new(Datatype::String, Status::Dynamic, None, None).unwrap_err(),
        VariableError::Construction(ConstructionError::MissingConstraint {
            datatype: Datatype::String
        })
    );

    let strings = ValueSet::new(vec!["hann".into(), "blackman".into()]).unwrap();
    let var = Variable::new(Datatype::String, Status::Constant, None, Some(strings)).unwrap();
    assert_eq!(var.get(), Some(&Value::from("hann")));
    assert_eq!(var.status(), Status::Constant);

    assert_eq!(
        Variable::new(Datatype::Float, Status::Dynamic, None, Some(int_set(&[1, 2]))).unwrap_err(),
        VariableError::Construction(ConstructionError::BoundTypeMismatch {
            expected: Datatype::Float,
            found: Datatype::Integer
        })
    );
}

#[test]
fn test_float_range_writes_stay_on_grid() {
    let mut rng = rng();

    for _ in 0..200 {
        let min: f64 = rng.gen_range(-100.0..100.0);
        let step: f64 = rng.gen_range(0.01..5.0);
        let max: f64 = min + rng.gen_range(0.0..200.0);
        let mut var = Variable::ranged(Range::float(min, step, max).unwrap());

        for _ in 0..50 {
            let candidate: f64 = match rng.gen_range(0..10) {
                0 => f64::INFINITY,
                1 => f64::NEG_INFINITY,
                2 => rng.gen_range(-1e12..1e12),
                _ => rng.gen_range(min - 50.0..max + 50.0),
            };
            var.set(candidate).unwrap();

            let value = var.get().unwrap();
            assert_eq!(value.datatype(), Datatype::Float);
            let value = value.as_f64().unwrap();
            assert!(value >= min && value <= max, "{value} outside [{min}, {max}]");

            let k = (value - min) / step;
            assert!((k - k.round()).abs() < 1e-6, "{value} is not on the grid of step {step}");
        }
    }
}

#[test]
fn test_integer_range_writes_stay_on_grid() {
    let mut rng = rng();

    for _ in 0..200 {
        let min: i64 = rng.gen_range(-1000..1000);
        let step: i64 = rng.gen_range(1..50);
        let max: i64 = min + rng.gen_range(0..2000);
        let mut var = Variable::ranged(Range::integer(min, step, max).unwrap());

        for _ in 0..50 {
            let candidate: i64 = match rng.gen_range(0..10) {
                0 => i64::MAX,
                1 => i64::MIN,
                _ => rng.gen_range(min - 500..max + 500),
            };
            var.set(candidate).unwrap();

            let value = var.get().unwrap().as_i64().unwrap();
            assert!(value >= min && value <= max);
            assert_eq!((value - min) % step, 0);
        }
    }
}

#[test]
fn test_set_writes_keep_members() {
    let mut rng = rng();
    let members = [-4, 0, 3, 8, 15];
    let mut var = Variable::enumerated(int_set(&members));

    for _ in 0..1000 {
        let before = var.get().cloned();
        let candidate = rng.gen_range(-10..20_i64);
        var.set(candidate).unwrap();
        let after = var.get().cloned();

        let value = after.as_ref().and_then(Value::as_i64).unwrap();
        assert!(members.contains(&value));
        if members.contains(&candidate) {
            assert_eq!(value, candidate);
        } else {
            assert_eq!(before, after);
        }
    }
}

#[test]
fn test_set_of_get_is_idempotent() {
    let mut rng = rng();

    for _ in 0..200 {
        let min: f64 = rng.gen_range(-10.0..10.0);
        let step: f64 = rng.gen_range(0.001..1.0);
        let max: f64 = min + rng.gen_range(0.0..20.0);
        let mut var = Variable::ranged(Range::float(min, step, max).unwrap());

        var.set(rng.gen_range(min - 1.0..max + 1.0)).unwrap();
        let value = var.get().cloned().unwrap();
        var.set(value.clone()).unwrap();
        assert_eq!(var.get(), Some(&value));
    }

    let mut var = Variable::enumerated(ValueSet::new(vec![0.1.into(), 0.2.into()]).unwrap());
    var.set(0.2).unwrap();
    let value = var.get().cloned().unwrap();
    var.set(value.clone()).unwrap();
    assert_eq!(var.get(), Some(&value));
}

#[test]
fn test_string_variable() {
    let mut var =
        Variable::enumerated(ValueSet::new(vec!["hann".into(), "hamming".into()]).unwrap());
    var.set("hamming").unwrap();
    assert_eq!(var.get(), Some(&Value::from("hamming")));

    var.set("kaiser").unwrap();
    assert_eq!(var.get(), Some(&Value::from("hamming")));

    assert!(var.set(0.5).is_err());
}

//! Integration tests for link negotiation
//!
//! These tests verify capability negotiation, value mirroring between linked
//! parameters, link groups and unlinking.

use crate::test_helpers::{counter, float_range_param, int_set, int_set_param};
use libdsp_rs::parameters::{
    Constraint, Datatype, LinkOutcome, NegotiationFailure, Parameter, Range, Status, Value,
    ValueSet, Variable,
};

#[test]
fn test_link_sets_settle_on_first_common_value() {
    let a = int_set_param("a", &[1, 2, 5]);
    let b = int_set_param("b", &[0, 1, 2]);
    let a_count = counter(&a);
    let b_count = counter(&b);

    assert_eq!(a.link(&b).unwrap(), LinkOutcome::Linked);

    let expected = Constraint::Set(int_set(&[1, 2]));
    assert_eq!(a.constraint(), expected);
    assert_eq!(b.constraint(), expected);
    assert_eq!(a.get(), Some(Value::Integer(1)));
    assert_eq!(b.get(), Some(Value::Integer(1)));
    assert_eq!(a.status(), Status::Linked);
    assert_eq!(b.status(), Status::Linked);

    // Only b's value moved
    assert_eq!(a_count.get(), 0);
    assert_eq!(b_count.get(), 1);
}

#[test]
fn test_link_symmetry() {
    let a = int_set_param("a", &[1, 2, 5]);
    let b = int_set_param("b", &[0, 1, 2]);
    a.link(&b).unwrap();

    a.set(2).unwrap();
    assert_eq!(b.get(), Some(Value::Integer(2)));

    b.set(1).unwrap();
    assert_eq!(a.get(), Some(Value::Integer(1)));

    // Outside the intersection: rejected on both sides
    a.set(5).unwrap();
    assert_eq!(a.get(), Some(Value::Integer(1)));
    assert_eq!(b.get(), Some(Value::Integer(1)));
}

#[test]
fn test_initiator_value_wins() {
    let a = float_range_param("a", 0.0, 0.5, 10.0);
    let b = float_range_param("b", 2.0, 0.5, 20.0);
    a.set(7.0).unwrap();
    b.set(15.0).unwrap();

    assert!(b.link(&a).unwrap().is_linked());
    // b initiated: its 15.0 is clamped into [2, 10] and mirrored
    assert_eq!(b.get(), Some(Value::Float(10.0)));
    assert_eq!(a.get(), Some(Value::Float(10.0)));

    a.set(2.3).unwrap();
    assert_eq!(b.get(), Some(Value::Float(2.5)));
    a.set(0.0).unwrap();
    assert_eq!(b.get(), Some(Value::Float(2.0)));
}

#[test]
fn test_unlink_restores_independence() {
    let a = int_set_param("a", &[1, 2, 5]);
    let b = int_set_param("b", &[0, 1, 2]);
    a.link(&b).unwrap();
    a.set(2).unwrap();

    assert!(a.unlink(&b));
    assert!(!a.is_linked());
    assert!(!b.is_linked());
    assert_eq!(a.status(), Status::Dynamic);
    assert_eq!(b.status(), Status::Dynamic);
    assert_eq!(a.constraint(), Constraint::Set(int_set(&[1, 2, 5])));
    assert_eq!(b.constraint(), Constraint::Set(int_set(&[0, 1, 2])));
    assert!(a.capabilities().is_none());

    // Values are not reconciled back
    assert_eq!(a.get(), Some(Value::Integer(2)));
    assert_eq!(b.get(), Some(Value::Integer(2)));

    a.set(5).unwrap();
    assert_eq!(a.get(), Some(Value::Integer(5)));
    assert_eq!(b.get(), Some(Value::Integer(2)));

    b.set(0).unwrap();
    assert_eq!(a.get(), Some(Value::Integer(5)));

    // Unlinking twice is a no-op
    assert!(!b.unlink(&a));
}

#[test]
fn test_link_datatype_mismatch_leaves_both_untouched() {
    let ints = Parameter::new("ints", Variable::ranged(Range::integer(0, 1, 10).unwrap()));
    let floats = float_range_param("floats", 0.0, 1.0, 10.0);
    ints.set(3).unwrap();
    floats.set(4.0).unwrap();
    let ints_before = ints.variable();
    let floats_before = floats.variable();

    assert_eq!(
        ints.link(&floats).unwrap(),
        LinkOutcome::Rejected(NegotiationFailure::DatatypeMismatch {
            local: Datatype::Integer,
            peer: Datatype::Float
        })
    );
    assert_eq!(ints.variable(), ints_before);
    assert_eq!(floats.variable(), floats_before);
    assert!(!ints.is_linked());
    assert!(!floats.is_linked());
}

#[test]
fn test_link_empty_intersection() {
    let a = int_set_param("a", &[1, 2]);
    let b = int_set_param("b", &[3, 4]);
    assert_eq!(
        a.link(&b).unwrap(),
        LinkOutcome::Rejected(NegotiationFailure::EmptyIntersection)
    );
    assert_eq!(a.status(), Status::Dynamic);

    // Ranges on shifted grids do not negotiate either
    let c = float_range_param("c", 0.0, 0.1, 1.0);
    let d = float_range_param("d", 0.05, 0.1, 1.0);
    assert!(!c.link(&d).unwrap().is_linked());
    assert_eq!(c.negotiate(&d), Err(NegotiationFailure::EmptyIntersection));
}

#[test]
fn test_link_range_with_set() {
    let a = Parameter::new(
        "a",
        Variable::enumerated(ValueSet::new(vec![0.25.into(), 0.3.into(), 0.35.into()]).unwrap()),
    );
    let b = float_range_param("b", 0.0, 0.1, 1.0);

    assert_eq!(a.link(&b).unwrap(), LinkOutcome::Linked);
    assert_eq!(a.get(), Some(Value::Float(0.3)));
    assert_eq!(b.get(), Some(Value::Float(0.3)));
    assert_eq!(
        b.constraint(),
        Constraint::Set(ValueSet::new(vec![0.3.into()]).unwrap())
    );
    assert_eq!(
        b.capabilities(),
        Some(Constraint::Range(Range::float(0.0, 0.1, 1.0).unwrap()))
    );
}

#[test]
fn test_link_booleans_takes_peer_value_when_unset() {
    let a = Parameter::new("a", Variable::boolean());
    let b = Parameter::new("b", Variable::boolean());
    b.set(true).unwrap();
    let a_count = counter(&a);

    assert_eq!(a.link(&b).unwrap(), LinkOutcome::Linked);
    assert_eq!(a.get(), Some(Value::Boolean(true)));
    assert_eq!(a_count.get(), 1);

    b.set(false).unwrap();
    assert_eq!(a.get(), Some(Value::Boolean(false)));
}

#[test]
fn test_link_constant_rejected() {
    let a = int_set_param("a", &[1, 2]);
    let b = int_set_param("b", &[1, 2]);
    b.lock().unwrap();

    assert_eq!(
        a.link(&b).unwrap(),
        LinkOutcome::Rejected(NegotiationFailure::Locked)
    );
    assert_eq!(a.status(), Status::Dynamic);
    assert_eq!(b.status(), Status::Constant);
}

#[test]
fn test_link_already_linked_and_other_group() {
    let a = int_set_param("a", &[1, 2]);
    let b = int_set_param("b", &[1, 2]);
    let c = int_set_param("c", &[1, 2]);

    a.link(&b).unwrap();
    assert_eq!(a.link(&b).unwrap(), LinkOutcome::AlreadyLinked);
    assert_eq!(b.link(&a).unwrap(), LinkOutcome::AlreadyLinked);
    assert_eq!(a.linked_peers().len(), 1);

    // c cannot pull a into its own group
    assert_eq!(c.link(&a).unwrap(), LinkOutcome::PeerInOtherGroup);
    assert!(!c.is_linked());
}

#[test]
fn test_group_propagation_reaches_each_member_once() {
    let a = int_set_param("a", &[1, 2, 3, 4]);
    let b = int_set_param("b", &[2, 3, 4, 5]);
    let c = int_set_param("c", &[3, 4, 5, 6]);

    a.link(&b).unwrap();
    assert_eq!(a.get(), Some(Value::Integer(2)));

    // b's group grows: every member narrows to the new intersection
    assert_eq!(b.link(&c).unwrap(), LinkOutcome::Linked);
    let expected = Constraint::Set(int_set(&[3, 4]));
    for param in [&a, &b, &c] {
        assert_eq!(param.constraint(), expected);
        assert_eq!(param.get(), Some(Value::Integer(3)));
        assert_eq!(param.group().len(), 3);
    }

    // Same group, whatever the path
    assert_eq!(c.link(&a).unwrap(), LinkOutcome::AlreadyLinked);

    let counts = [counter(&a), counter(&b), counter(&c)];
    a.set(4).unwrap();
    for (param, count) in [&a, &b, &c].iter().zip(&counts) {
        assert_eq!(param.get(), Some(Value::Integer(4)));
        assert_eq!(count.get(), 1);
    }

    c.set(3).unwrap();
    for count in &counts {
        assert_eq!(count.get(), 2);
    }
}

#[test]
fn test_unlink_from_group_recomputes_constraint() {
    let a = int_set_param("a", &[1, 2, 3, 4]);
    let b = int_set_param("b", &[2, 3, 4, 5]);
    let c = int_set_param("c", &[3, 4, 5, 6]);
    a.link(&b).unwrap();
    b.link(&c).unwrap();

    assert!(b.unlink(&c));
    assert_eq!(c.status(), Status::Dynamic);
    assert_eq!(c.constraint(), Constraint::Set(int_set(&[3, 4, 5, 6])));

    // a and b are still linked and widen back to their own intersection
    assert_eq!(a.status(), Status::Linked);
    let widened = Constraint::Set(int_set(&[2, 3, 4]));
    assert_eq!(b.constraint(), widened);
    assert_eq!(a.constraint(), widened);

    c.set(6).unwrap();
    assert_eq!(a.get(), Some(Value::Integer(3)));
    assert_eq!(b.get(), Some(Value::Integer(3)));

    a.set(2).unwrap();
    assert_eq!(b.get(), Some(Value::Integer(2)));
}

#[test]
fn test_peer_callback_cannot_bounce_back() {
    let a = int_set_param("a", &[1, 2, 3]);
    let b = int_set_param("b", &[1, 2, 3]);
    a.link(&b).unwrap();

    let source = a.clone();
    b.push_callback(move || {
        source.set(1).unwrap();
    });
    let a_count = counter(&a);

    a.set(3).unwrap();
    assert_eq!(a.get(), Some(Value::Integer(3)));
    assert_eq!(b.get(), Some(Value::Integer(3)));
    assert_eq!(a_count.get(), 1);
}

#[test]
fn test_dropping_a_parameter_unlinks_it() {
    let a = int_set_param("a", &[1, 2, 5]);
    {
        let b = int_set_param("b", &[0, 1, 2]);
        a.link(&b).unwrap();
        assert!(a.is_linked());
    }

    assert!(!a.is_linked());
    assert_eq!(a.status(), Status::Dynamic);
    assert_eq!(a.constraint(), Constraint::Set(int_set(&[1, 2, 5])));

    a.set(5).unwrap();
    assert_eq!(a.get(), Some(Value::Integer(5)));
}

#[test]
fn test_unlink_all() {
    let hub = int_set_param("hub", &[1, 2]);
    let left = int_set_param("left", &[1, 2]);
    let right = int_set_param("right", &[1, 2]);
    hub.link(&left).unwrap();
    hub.link(&right).unwrap();
    assert_eq!(hub.linked_peers().len(), 2);

    hub.unlink_all();
    for param in [&hub, &left, &right] {
        assert!(!param.is_linked());
        assert_eq!(param.status(), Status::Dynamic);
    }
}

#[test]
fn test_unlink_keeps_domain_when_remaining_grids_differ() {
    let a = float_range_param("a", 0.0, 0.1, 1.0);
    let b = Parameter::new(
        "b",
        Variable::enumerated(ValueSet::new(vec![0.5.into(), 0.7.into()]).unwrap()),
    );
    let c = float_range_param("c", 0.0, 0.25, 1.0);

    a.link(&b).unwrap();
    assert_eq!(a.link(&c).unwrap(), LinkOutcome::Linked);
    let common = Constraint::Set(ValueSet::new(vec![0.5.into()]).unwrap());
    assert_eq!(a.constraint(), common);

    // a and c have no shared grid of their own: they keep the point they agreed on
    assert!(a.unlink(&b));
    assert_eq!(b.status(), Status::Dynamic);
    assert_eq!(
        b.constraint(),
        Constraint::Set(ValueSet::new(vec![0.5.into(), 0.7.into()]).unwrap())
    );
    for param in [&a, &c] {
        assert_eq!(param.status(), Status::Linked);
        assert_eq!(param.constraint(), common);
        assert_eq!(param.get(), Some(Value::Float(0.5)));
    }

    c.set(0.75).unwrap();
    assert_eq!(a.get(), Some(Value::Float(0.5)));

    b.set(0.7).unwrap();
    assert_eq!(b.get(), Some(Value::Float(0.7)));
    assert_eq!(a.get(), Some(Value::Float(0.5)));

    // Once alone, each gets its own range back
    a.unlink(&c);
    assert_eq!(c.constraint(), Constraint::Range(Range::float(0.0, 0.25, 1.0).unwrap()));
}

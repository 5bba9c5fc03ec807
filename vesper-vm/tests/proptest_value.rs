// vesper-vm - Property-based tests for value operations
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Property-based tests for value arithmetic, comparison and interning.
//!
//! Tests the following properties:
//! - Arithmetic on numbers agrees bit-for-bit with host IEEE arithmetic
//! - Comparisons agree with host comparison
//! - String concatenation produces the interned concatenation of the bytes
//! - Equality is identity on interned strings and IEEE on numbers

use proptest::prelude::*;
use vesper_vm::{Interner, Value};

/// Finite f64 values (the machine's number type).
fn arb_number() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("must be finite", |f| f.is_finite())
}

/// Short printable strings.
fn arb_string() -> impl Strategy<Value = String> {
    "[a-z0-9 ]{0,12}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn addition_agrees_with_host(x in arb_number(), y in arb_number()) {
        let mut strings = Interner::new();
        let sum = Value::Number(x).add(&Value::Number(y), &mut strings).unwrap();
        match sum {
            Value::Number(n) => prop_assert_eq!(n.to_bits(), (x + y).to_bits()),
            other => prop_assert!(false, "expected number, got {}", other),
        }
    }

    #[test]
    fn sub_mul_div_agree_with_host(x in arb_number(), y in arb_number()) {
        let a = Value::Number(x);
        let b = Value::Number(y);
        match (a.sub(&b).unwrap(), a.mul(&b).unwrap(), a.div(&b).unwrap()) {
            (Value::Number(d), Value::Number(p), Value::Number(q)) => {
                prop_assert_eq!(d.to_bits(), (x - y).to_bits());
                prop_assert_eq!(p.to_bits(), (x * y).to_bits());
                prop_assert_eq!(q.to_bits(), (x / y).to_bits());
            }
            _ => prop_assert!(false, "arithmetic on numbers must yield numbers"),
        }
    }

    #[test]
    fn comparison_agrees_with_host(x in arb_number(), y in arb_number()) {
        let a = Value::Number(x);
        let b = Value::Number(y);
        prop_assert_eq!(a.lt(&b).unwrap(), Value::Bool(x < y));
        prop_assert_eq!(a.gt(&b).unwrap(), Value::Bool(x > y));
    }

    #[test]
    fn number_equality_is_ieee(x in arb_number()) {
        prop_assert!(Value::Number(x).equal(&Value::Number(x)));
        prop_assert!(!Value::Number(x).equal(&Value::Bool(true)));
        prop_assert!(!Value::Number(x).equal(&Value::Nil));
    }

    #[test]
    fn concatenation_interns_the_joined_bytes(a in arb_string(), b in arb_string()) {
        let mut strings = Interner::new();
        let left = Value::Str(strings.intern(&a));
        let right = Value::Str(strings.intern(&b));

        let joined = left.add(&right, &mut strings).unwrap();
        let expected = format!("{}{}", a, b);
        match &joined {
            Value::Str(s) => prop_assert_eq!(s.as_str(), expected.as_str()),
            other => prop_assert!(false, "expected string, got {}", other),
        }
        // The result is the canonical handle for those bytes.
        prop_assert!(joined.equal(&Value::Str(strings.intern(&expected))));
    }

    #[test]
    fn interning_is_identity_on_bytes(s in arb_string()) {
        let mut pool = Interner::new();
        let first = pool.intern(&s);
        let second = pool.intern(&s);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(pool.len(), 1);
    }
}

//! Property-based tests for Try<A>.
//!
//! - **Functor Identity**: `t.map(|x| x) == t` for successes
//! - **Functor Composition**: `t.map(f).map(g) == t.map(|x| g(f(x)))`
//! - **Monad Left Identity**: `Try::succeeded(a).flat_map(f) == f(a)`
//! - **Failure Propagation**: `map`/`flat_map` never call their function on a failure

#![cfg(feature = "control")]

use proptest::prelude::*;
use std::cell::Cell;
use typed_operation::OperationError;
use typed_operation::control::Try;

fn try_strategy() -> impl Strategy<Value = Try<i32>> {
    prop_oneof![
        any::<i32>().prop_map(Try::succeeded),
        Just(Try::failed(OperationError::IndeterminateOutcome)),
    ]
}

proptest! {
    #[test]
    fn prop_map_identity(value in any::<i32>()) {
        prop_assert_eq!(Try::succeeded(value).map(|x| x), Try::succeeded(value));
    }

    #[test]
    fn prop_map_applies_function(value in any::<i32>()) {
        let function = |n: i32| n.wrapping_mul(3);
        prop_assert_eq!(Try::succeeded(value).map(function), Try::succeeded(function(value)));
    }

    #[test]
    fn prop_map_composition(value in try_strategy()) {
        let function1 = |n: i32| n.wrapping_add(1);
        let function2 = |n: i32| n.wrapping_mul(2);

        let left = value.clone().map(function1).map(function2);
        let right = value.clone().map(|x| function2(function1(x)));

        prop_assert_eq!(left.is_failed(), value.is_failed());
        prop_assert_eq!(left.to_option(), right.to_option());
    }

    #[test]
    fn prop_flat_map_left_identity(value in any::<i32>()) {
        let function = |n: i32| Try::succeeded(n.wrapping_sub(7));
        prop_assert_eq!(Try::succeeded(value).flat_map(function), function(value));
    }

    #[test]
    fn prop_flat_map_invocation_count(value in try_strategy()) {
        let calls = Cell::new(0_usize);
        let expected = usize::from(value.is_succeeded());
        let _ = value.flat_map(|n| {
            calls.set(calls.get() + 1);
            Try::succeeded(n)
        });
        prop_assert_eq!(calls.get(), expected);
    }

    #[test]
    fn prop_failure_survives_map(seed in any::<i32>()) {
        let failure: Try<i32> = Try::failed(OperationError::IndeterminateOutcome);
        let mapped = failure.map(|n| n.wrapping_add(seed));
        prop_assert!(matches!(mapped.error(), Some(OperationError::IndeterminateOutcome)));
    }

    #[test]
    fn prop_handle_always_succeeds(value in try_strategy(), fallback in any::<i32>()) {
        prop_assert!(value.handle(|_| fallback).is_succeeded());
    }
}

//! Unit tests for the Try<A> type.
//!
//! Try represents the outcome of a synchronous computation:
//! - `Succeeded(A)`: the computation produced a value
//! - `Failed(OperationError)`: the computation failed

#![cfg(feature = "control")]

use rstest::rstest;
use std::cell::{Cell, RefCell};
use std::fmt;
use typed_operation::OperationError;
use typed_operation::control::Try;

#[derive(Debug)]
enum TestError {
    Failure,
}

impl fmt::Display for TestError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "test failure")
    }
}

impl std::error::Error for TestError {}

fn failed() -> Try<i32> {
    Try::failed(OperationError::new(TestError::Failure))
}

// =============================================================================
// Construction
// =============================================================================

#[rstest]
fn of_without_error_succeeds() {
    let value = Try::of(|| Ok::<_, TestError>(10));
    assert_eq!(value.get().unwrap(), 10);
}

#[rstest]
fn of_with_error_fails() {
    let value = Try::<i32>::of(|| Err(TestError::Failure));
    assert!(value.get().is_err());
}

#[rstest]
fn from_result_preserves_error() {
    let value: Try<i32> = Err::<i32, _>(TestError::Failure).into();
    let error = value.get().unwrap_err();
    assert!(matches!(
        error.downcast_ref::<TestError>(),
        Some(TestError::Failure)
    ));
}

// =============================================================================
// Recovery
// =============================================================================

#[rstest]
fn handle_on_success_keeps_value() {
    let value = Try::succeeded(10).handle(|_| 20);
    assert_eq!(value.get().unwrap(), 10);
}

#[rstest]
fn handle_on_failure_recovers() {
    let value = failed().handle(|_| 20);
    assert_eq!(value.get().unwrap(), 20);
}

#[rstest]
fn rescue_on_success_keeps_value() {
    let value = Try::succeeded(10).rescue(|_| Try::succeeded(20));
    assert_eq!(value.get().unwrap(), 10);
}

#[rstest]
fn rescue_on_failure_recovers() {
    let value = failed().rescue(|_| Try::succeeded(20));
    assert_eq!(value.get().unwrap(), 20);
}

#[rstest]
fn handle_receives_original_error() {
    let value = failed().handle(|error| {
        if error.downcast_ref::<TestError>().is_some() { 1 } else { 0 }
    });
    assert_eq!(value, Try::succeeded(1));
}

// =============================================================================
// Observers
// =============================================================================

#[rstest]
fn on_success_observes_value() {
    let seen = Cell::new(None);
    let value = Try::succeeded(10).on_success(|value| seen.set(Some(*value)));
    assert_eq!(seen.get(), Some(10));
    assert_eq!(value, Try::succeeded(10));
}

#[rstest]
fn on_success_ignores_failure() {
    let seen = Cell::new(None);
    let _ = failed().on_success(|value| seen.set(Some(*value)));
    assert_eq!(seen.get(), None);
}

#[rstest]
fn on_failure_ignores_success() {
    let seen = RefCell::new(None);
    let _ = Try::succeeded(10).on_failure(|error| *seen.borrow_mut() = Some(error.to_string()));
    assert!(seen.borrow().is_none());
}

#[rstest]
fn on_failure_observes_error() {
    let seen = RefCell::new(None);
    let value = failed().on_failure(|error| *seen.borrow_mut() = Some(error.to_string()));
    assert_eq!(seen.borrow().as_deref(), Some("test failure"));
    assert!(value.is_failed());
}

// =============================================================================
// Transformation
// =============================================================================

#[rstest]
fn map_on_success() {
    assert_eq!(Try::succeeded(10).map(|value| value * 2).get().unwrap(), 20);
}

#[rstest]
fn flat_map_on_success() {
    let value = Try::succeeded(10).flat_map(|value| Try::catching(|| value * 2));
    assert_eq!(value.get().unwrap(), 20);
}

#[rstest]
fn map_on_failure() {
    assert!(failed().map(|value| value * 2).get().is_err());
}

#[rstest]
fn flat_map_on_failure() {
    let value = failed().flat_map(|value| Try::succeeded(value * 2));
    assert!(value.get().is_err());
}

#[rstest]
fn flat_map_with_failing_function() {
    let value = Try::succeeded(10).flat_map(|_| failed());
    assert!(value.get().is_err());
}

#[rstest]
fn map_with_panicking_function() {
    let value = Try::succeeded(10).map(|_| -> i32 { panic!("map failed") });
    let error = value.get().unwrap_err();
    assert!(error.is_panic());
    assert!(error.to_string().contains("map failed"));
}

#[rstest]
fn flat_map_with_panicking_function() {
    let value = Try::succeeded(10).flat_map(|_| -> Try<i32> { panic!("flat_map failed") });
    assert!(value.get().is_err());
}

// =============================================================================
// Extraction
// =============================================================================

#[rstest]
fn to_option() {
    assert!(Try::succeeded(10).to_option().is_some());
    assert!(failed().to_option().is_none());
    assert_eq!(Try::succeeded(10).to_option(), Some(10));
}

#[rstest]
fn collect_stops_at_first_failure() {
    let values: Try<Vec<i32>> = vec![Try::succeeded(1), failed(), Try::succeeded(3)]
        .into_iter()
        .collect();
    assert!(values.is_failed());
}

// =============================================================================
// Equality
// =============================================================================

#[rstest]
#[case(Try::succeeded(10), Try::succeeded(10), true)]
#[case(Try::succeeded(10), Try::succeeded(20), false)]
#[case(Try::succeeded(10), failed(), false)]
#[case(failed(), Try::succeeded(10), false)]
#[case(failed(), failed(), false)]
fn equality(#[case] left: Try<i32>, #[case] right: Try<i32>, #[case] expected: bool) {
    assert_eq!(left == right, expected);
}

#[rstest]
#[allow(clippy::eq_op)]
fn failure_is_not_equal_to_itself() {
    let value = failed();
    assert!(value != value);
}

//! Integration tests for `CallbackAdapter`.
//!
//! `PiService` stands in for a callback-based API: it answers on another
//! thread with whatever `(value, error)` pair it was built with.

#![cfg(feature = "effect")]

use std::f64::consts::PI;
use std::fmt;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rstest::rstest;

use typed_operation::OperationError;
use typed_operation::effect::{
    AdapterConfig, Callback, CallbackAdapter, Operation, WaitTimeout, WorkQueue,
};

const OBSERVER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
struct ServiceError {
    code: i32,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "pi service failed with code {}", self.code)
    }
}

impl std::error::Error for ServiceError {}

#[derive(Clone)]
struct PiService {
    returning: (Option<f64>, Option<ServiceError>),
}

impl PiService {
    const fn new(value: Option<f64>, error: Option<ServiceError>) -> Self {
        Self {
            returning: (value, error),
        }
    }

    fn compute_pi_with<F>(&self, _digits: usize, callback: F)
    where
        F: FnOnce(Option<f64>, Option<ServiceError>) + Send + 'static,
    {
        let (value, error) = self.returning.clone();
        thread::spawn(move || callback(value, error));
    }

    fn pi(&self, digits: usize) -> Operation<f64> {
        let service = self.clone();
        CallbackAdapter::new().adapt(move |callback: Callback<f64>| {
            service.compute_pi_with(digits, move |value, error| callback.complete(value, error));
        })
    }
}

// =============================================================================
// Outcome interpretation
// =============================================================================

#[rstest]
fn value_only_succeeds() {
    let (sender, receiver) = mpsc::channel();
    let _ = PiService::new(Some(PI), None)
        .pi(5)
        .on_success(move |pi| sender.send(*pi).unwrap());
    let pi = receiver.recv_timeout(OBSERVER_TIMEOUT).unwrap();
    assert!((pi - PI).abs() < f64::EPSILON);
}

#[rstest]
fn error_only_fails() {
    let (sender, receiver) = mpsc::channel();
    let _ = PiService::new(None, Some(ServiceError { code: 0 }))
        .pi(10)
        .on_failure(move |error| sender.send(error.to_string()).unwrap());
    let message = receiver.recv_timeout(OBSERVER_TIMEOUT).unwrap();
    assert_eq!(message, "pi service failed with code 0");
}

#[rstest]
fn value_and_error_fails_with_error() {
    let operation = PiService::new(Some(PI), Some(ServiceError { code: 7 })).pi(10);
    let error = operation.await_result().unwrap_err();
    assert_eq!(
        error.downcast_ref::<ServiceError>(),
        Some(&ServiceError { code: 7 })
    );
}

#[rstest]
fn neither_value_nor_error_is_indeterminate() {
    let operation = PiService::new(None, None).pi(10);
    assert!(matches!(
        operation.await_result(),
        Err(OperationError::IndeterminateOutcome)
    ));
}

// =============================================================================
// Registration
// =============================================================================

#[rstest]
fn registration_failure_fails_immediately() {
    let adapter = CallbackAdapter::with_config(
        AdapterConfig::new().with_wait(WaitTimeout::After(Duration::from_secs(30))),
    );
    let operation = adapter.try_adapt(|callback: Callback<f64>| {
        drop(callback);
        Err(ServiceError { code: 3 })
    });
    let error = operation.await_result().unwrap_err();
    assert_eq!(
        error.downcast_ref::<ServiceError>(),
        Some(&ServiceError { code: 3 })
    );
}

#[rstest]
fn callback_dropped_on_another_thread_fails() {
    let operation = Operation::from_callback(|callback: Callback<f64>| {
        thread::spawn(move || drop(callback));
    });
    assert!(matches!(
        operation.await_result(),
        Err(OperationError::CallbackDropped)
    ));
}

#[rstest]
fn late_callback_after_timeout_is_ignored() {
    let adapter = CallbackAdapter::with_config(
        AdapterConfig::new().with_wait(WaitTimeout::After(Duration::from_millis(20))),
    );
    let operation = adapter.adapt(|callback: Callback<f64>| {
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            callback.succeed(1.0);
        });
    });
    assert!(matches!(
        operation.await_result(),
        Err(OperationError::TimedOut(_))
    ));
    thread::sleep(Duration::from_millis(250));
    assert!(matches!(
        operation.await_result(),
        Err(OperationError::TimedOut(_))
    ));
}

#[rstest]
fn default_config_waits_forever() {
    assert_eq!(CallbackAdapter::new().config().wait(), WaitTimeout::Forever);
}

// =============================================================================
// Composition
// =============================================================================

#[rstest]
fn adapted_operation_composes() {
    let service = PiService::new(Some(3.0), None);
    let operation = service
        .pi(1)
        .join(&service.pi(2))
        .map(|pair| pair.0 + pair.1);
    assert!((operation.await_result().unwrap() - 6.0).abs() < f64::EPSILON);
}

#[rstest]
fn adapted_failure_can_be_rescued() {
    let operation = PiService::new(None, Some(ServiceError { code: 1 }))
        .pi(3)
        .rescue(|_| Operation::constant(3.0));
    assert!((operation.await_result().unwrap() - 3.0).abs() < f64::EPSILON);
}

#[rstest]
fn adapter_on_shared_queue() {
    let queue = WorkQueue::new();
    let adapter = CallbackAdapter::new().on_queue(&queue);
    let operations: Vec<Operation<usize>> = (0..4)
        .map(|index| {
            adapter.adapt(move |callback: Callback<usize>| {
                thread::spawn(move || callback.succeed(index));
            })
        })
        .collect();
    assert!(operations.iter().all(|operation| operation.queue().same_queue(&queue)));
    let all = Operation::join_all(operations);
    assert_eq!(all.await_result().unwrap(), vec![0, 1, 2, 3]);
}

//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;

/// How long to wait for the service worker to pick up a command
///
/// The worker loop sleeps 50ms between iterations; three laps is enough
/// for a command plus its event to land.
pub fn worker_settle() -> Duration {
    Duration::from_millis(150)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

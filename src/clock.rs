// ABOUTME: Injectable time source so expiry math is controllable in tests
// ABOUTME: Provides the Clock trait and the wall-clock SystemClock default
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Every component that computes absolute expiries or checks TTLs takes a
/// `Clock` handle instead of calling `Utc::now()` directly, so tests can run
/// multiple isolated instances against a manual clock.
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used outside of tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

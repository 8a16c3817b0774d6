//! Count and time limits as dispatcher decorators.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::checker::clock::Clock;
use crate::checker::errors::CheckerResult;

use super::{Dispatcher, Next};

/// Stops after `limit` objects have been handed out.
#[derive(Debug)]
pub struct CountLimit<D> {
    inner: D,
    remaining: u64,
}

impl<D: Dispatcher> CountLimit<D> {
    pub fn new(inner: D, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: Dispatcher> Dispatcher for CountLimit<D> {
    fn next(&mut self) -> CheckerResult<Next> {
        if self.remaining == 0 {
            return Ok(Next::Exhausted);
        }
        let next = self.inner.next()?;
        if !next.is_exhausted() {
            self.remaining -= 1;
        }
        Ok(next)
    }
}

/// Stops once the clock reaches `deadline`.
///
/// Checked before each delegated call, never during a check. Once expired it
/// stays expired even if the clock is moved back.
#[derive(Debug)]
pub struct TimeLimit<D> {
    inner: D,
    deadline: DateTime<Utc>,
    clock: Arc<dyn Clock>,
    expired: bool,
}

impl<D: Dispatcher> TimeLimit<D> {
    pub fn new(inner: D, deadline: DateTime<Utc>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            deadline,
            clock,
            expired: false,
        }
    }

    /// Deadline = now + `budget`, saturating at the latest representable time.
    pub fn from_now(inner: D, budget: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        let deadline = clock
            .now()
            .checked_add_signed(budget)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(inner, deadline, clock)
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: Dispatcher> Dispatcher for TimeLimit<D> {
    fn next(&mut self) -> CheckerResult<Next> {
        if self.expired || self.clock.now() >= self.deadline {
            self.expired = true;
            return Ok(Next::Exhausted);
        }
        self.inner.next()
    }
}

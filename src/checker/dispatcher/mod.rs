//! # Work Selection
//!
//! A `Dispatcher` answers one question: which object should be checked next?
//!
//! Running out of work is an expected terminal condition, so it is a value
//! (`Next::Exhausted`), not an error. Errors are reserved for infrastructure
//! failures while selecting (e.g. the status store is unreachable).
//!
//! Strategies:
//! - `StaticList`: a fixed sequence of ids
//! - `ScopedResolver`: every object under a catalog handle
//! - `OldestPending`: least-recently-checked pending object, straight from the store
//!
//! Decorators wrap any dispatcher and compose freely:
//! - `CountLimit`: stop after a fixed number of objects
//! - `TimeLimit`: stop once a deadline has passed
//!
//! ```ignore
//! let dispatcher = CountLimit::new(
//!     TimeLimit::new(OldestPending::continuous(ledger), deadline, clock),
//!     500,
//! );
//! ```
//!
//! `next` takes `&mut self`: one caller at a time per instance.

mod limit;
mod list;
mod oldest;
mod scoped;

pub use limit::{CountLimit, TimeLimit};
pub use list::StaticList;
pub use oldest::OldestPending;
pub use scoped::ScopedResolver;

use super::errors::CheckerResult;
use super::model::ObjectId;

/// Result of asking a dispatcher for work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Object(ObjectId),
    Exhausted,
}

impl Next {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Next::Exhausted)
    }

    pub fn into_object(self) -> Option<ObjectId> {
        match self {
            Next::Object(id) => Some(id),
            Next::Exhausted => None,
        }
    }
}

/// Pull-based source of object ids to check.
pub trait Dispatcher: Send {
    fn next(&mut self) -> CheckerResult<Next>;
}

impl<D: Dispatcher + ?Sized> Dispatcher for Box<D> {
    fn next(&mut self) -> CheckerResult<Next> {
        (**self).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxed_dispatcher_delegates() {
        let id = ObjectId::new("a").unwrap();
        let mut boxed: Box<dyn Dispatcher> = Box::new(StaticList::new(vec![id.clone()]));

        assert_eq!(boxed.next().unwrap(), Next::Object(id));
        assert!(boxed.next().unwrap().is_exhausted());
    }

    #[test]
    fn test_into_object() {
        let id = ObjectId::new("a").unwrap();
        assert_eq!(Next::Object(id.clone()).into_object(), Some(id));
        assert_eq!(Next::Exhausted.into_object(), None);
    }
}

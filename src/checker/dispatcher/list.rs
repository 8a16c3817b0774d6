//! Fixed list of object ids.

use crate::checker::errors::CheckerResult;
use crate::checker::model::ObjectId;

use super::{Dispatcher, Next};

/// Dispatches a precomputed list, popping from the end.
///
/// Not restartable: build a new one to go again.
#[derive(Debug, Clone, Default)]
pub struct StaticList {
    remaining: Vec<ObjectId>,
}

impl StaticList {
    pub fn new(ids: Vec<ObjectId>) -> Self {
        Self { remaining: ids }
    }

    pub fn single(id: ObjectId) -> Self {
        Self::new(vec![id])
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

impl Dispatcher for StaticList {
    fn next(&mut self) -> CheckerResult<Next> {
        Ok(match self.remaining.pop() {
            Some(id) => Next::Object(id),
            None => Next::Exhausted,
        })
    }
}

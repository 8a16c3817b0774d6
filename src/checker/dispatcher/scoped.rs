//! Every object beneath one catalog handle.

use crate::checker::catalog::{Catalog, NodeKind};
use crate::checker::errors::CheckerResult;

use super::{Dispatcher, Next, StaticList};

/// Resolves a handle against the catalog once, then dispatches its objects.
#[derive(Debug)]
pub struct ScopedResolver {
    handle: String,
    kind: NodeKind,
    inner: StaticList,
}

impl ScopedResolver {
    /// Resolve `handle` now. Fails if the catalog does not know it.
    pub fn new(catalog: &dyn Catalog, handle: &str) -> CheckerResult<Self> {
        let node = catalog.resolve(handle)?;
        Ok(Self {
            handle: handle.to_string(),
            kind: node.kind,
            inner: StaticList::new(node.member_object_ids),
        })
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining()
    }
}

impl Dispatcher for ScopedResolver {
    fn next(&mut self) -> CheckerResult<Next> {
        self.inner.next()
    }
}

//! Query Context - per-query rewrite state
//!
//! A [`QueryContext`] is created when the meta query is classified, handed to
//! the JOIN and WHERE rewriters for the same query, and dropped afterwards.
//! It is never shared between queries.
//!
//! ## One-shot passes
//!
//! The host may fire its JOIN/WHERE callbacks again for a nested query built
//! while the outer one is still being assembled. Each rewrite therefore owns a
//! [`RewritePass`] guard: the first `claim()` succeeds, later ones don't, and
//! the `*_once` rewriter entry points turn into no-ops.

use crate::meta_query::MetaPredicate;

/// A guard that can be claimed exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewritePass {
    consumed: bool,
}

impl RewritePass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time it is called and `false` afterwards.
    pub fn claim(&mut self) -> bool {
        !std::mem::replace(&mut self.consumed, true)
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}

/// Classification result for one query plus its rewrite guards.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    /// Clauses pointed at order table columns
    pub mapped_predicates: Vec<MetaPredicate>,

    /// Set when any clause still needs the side table; keeps its JOIN alive
    pub has_unmapped_attributes: bool,

    join_pass: RewritePass,
    where_pass: RewritePass,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_mapped(&mut self, predicate: MetaPredicate) {
        self.mapped_predicates.push(predicate);
    }

    pub fn mark_unmapped(&mut self) {
        self.has_unmapped_attributes = true;
    }

    pub fn join_pass(&mut self) -> &mut RewritePass {
        &mut self.join_pass
    }

    pub fn where_pass(&mut self) -> &mut RewritePass {
        &mut self.where_pass
    }

    pub fn is_join_rewritten(&self) -> bool {
        self.join_pass.is_consumed()
    }

    pub fn is_where_rewritten(&self) -> bool {
        self.where_pass.is_consumed()
    }
}

//! Mark-sweep collector for the scope/AST graph.
//!
//! # Phases
//!
//! 1. **Mark** – Starting from the isolate's persistent roots and the
//!    context's registered roots, a grey-stack walk that follows *every* edge
//!    marks each node and scope still reachable.
//!
//! 2. **Trace candidates** – Starting from the collection root, a second
//!    walk gathers the candidate set.  This walk honours the caller's
//!    [`TraceOptions`]: child scopes only when deep, object keys only when
//!    requested.
//!
//! 3. **Sweep** – Every candidate that was not marked in phase 1 is garbage.
//!
//! Nothing moves, so there is no compaction phase: handles stay valid for
//! every survivor.  The collector only reads the isolate; freeing the swept
//! objects is left to [`Isolate::collect`](crate::isolate::Isolate::collect).

use std::collections::HashSet;

use crate::gc::trace::{GcRef, Trace, TraceOptions, Tracer};
use crate::isolate::Isolate;

/// What a collection released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectStats {
    pub nodes_freed: usize,
    pub scopes_freed: usize,
    pub bytes_freed: usize,
}

impl CollectStats {
    /// Total number of objects released.
    pub fn objects_freed(&self) -> usize {
        self.nodes_freed + self.scopes_freed
    }
}

/// Performs one mark-sweep pass over an [`Isolate`].
///
/// Created once per collection, borrows the isolate for the duration of the
/// mark and sweep phases, and is dropped before the dead objects are freed.
pub struct MarkSweep<'iso> {
    isolate: &'iso Isolate,
    /// Objects reached from a root in the current cycle.
    mark_set: HashSet<GcRef>,
}

impl<'iso> MarkSweep<'iso> {
    pub fn new(isolate: &'iso Isolate) -> Self {
        Self {
            isolate,
            mark_set: HashSet::new(),
        }
    }

    // ── Phase helpers ─────────────────────────────────────────────────────

    /// Returns `true` if `r` has been marked live.
    pub fn is_marked(&self, r: GcRef) -> bool {
        self.mark_set.contains(&r)
    }

    fn is_allocated(&self, r: GcRef) -> bool {
        match r {
            GcRef::Node(n) => self.isolate.node(n).is_some(),
            GcRef::Scope(s) => self.isolate.scope(s).is_some(),
        }
    }

    fn trace_one(&self, r: GcRef, tracer: &mut Tracer) {
        match r {
            GcRef::Node(n) => {
                if let Some(node) = self.isolate.node(n) {
                    node.trace(tracer);
                }
            }
            GcRef::Scope(s) => {
                if let Some(scope) = self.isolate.scope(s) {
                    scope.trace(tracer);
                }
            }
        }
    }

    /// Walk the graph from `start`, returning every allocated object reached
    /// in discovery order.  `seen` doubles as the visited set.
    fn walk(&self, start: GcRef, options: TraceOptions, seen: &mut HashSet<GcRef>) -> Vec<GcRef> {
        let mut reached = Vec::new();
        let mut tracer = Tracer::new(options);
        tracer.push_root(start);
        while let Some(r) = tracer.pop() {
            if !self.is_allocated(r) || !seen.insert(r) {
                continue;
            }
            reached.push(r);
            self.trace_one(r, &mut tracer);
        }
        reached
    }

    // ── Public phase methods ──────────────────────────────────────────────

    /// **Mark phase**: mark everything reachable from `roots` along every
    /// edge.
    pub fn mark(&mut self, roots: impl IntoIterator<Item = GcRef>) {
        let mut seen = std::mem::take(&mut self.mark_set);
        for root in roots {
            self.walk(root, TraceOptions::FULL, &mut seen);
        }
        self.mark_set = seen;
    }

    /// **Trace phase**: the candidate set reachable from `root` under
    /// `options`.
    pub fn candidates(&self, root: GcRef, options: TraceOptions) -> Vec<GcRef> {
        self.walk(root, options, &mut HashSet::new())
    }

    /// **Sweep phase**: the candidates that were not marked.
    pub fn sweep(&self, candidates: &[GcRef]) -> Vec<GcRef> {
        candidates
            .iter()
            .copied()
            .filter(|r| !self.is_marked(*r))
            .collect()
    }

    /// Number of objects marked live.
    pub fn marked_count(&self) -> usize {
        self.mark_set.len()
    }
}

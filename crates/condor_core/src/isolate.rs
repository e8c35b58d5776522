//! The isolate: one compilation's private memory.
//!
//! An [`Isolate`] owns
//!
//! - one [`MemoryPool`] per [`SizeClass`], each a bounded byte budget;
//! - slot arenas for AST nodes, scopes and raw blocks, every slot charged to
//!   the pool its size class selects;
//! - the persistent root set and the single [`Context`];
//! - the collector entry point, [`Isolate::collect`].
//!
//! Nothing is reclaimed implicitly.  Objects are released by an explicit
//! free or by a collection the caller requests.
//!
//! # Example
//!
//! ```
//! use condor_core::isolate::Isolate;
//!
//! let mut iso = Isolate::new();
//! let block = iso.allocate(48).unwrap();
//! assert_eq!(iso.block(block).unwrap().len(), 48);
//! iso.free(block, 48).unwrap();
//! ```

use std::mem::size_of;

use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{CondorError, CondorResult, ErrorKind};
use crate::gc::collector::{CollectStats, MarkSweep};
use crate::gc::handle::{Handle, PersistentRoots, Slots};
use crate::gc::pool::{Block, MemoryPool, SizeClass};
use crate::gc::trace::{GcRef, TraceOptions};
use crate::parser::ast::{Node, NodeRef, ScopeRef};
use crate::parser::scope::Scope;

/// Pool capacities, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsolateConfig {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
    pub extra_large: usize,
    pub self_pool: usize,
}

impl Default for IsolateConfig {
    fn default() -> Self {
        Self {
            small: 4 << 20,
            medium: 16 << 20,
            large: 16 << 20,
            extra_large: 32 << 20,
            self_pool: 64 << 10,
        }
    }
}

impl IsolateConfig {
    fn capacity(&self, class: SizeClass) -> usize {
        match class {
            SizeClass::Small => self.small,
            SizeClass::Medium => self.medium,
            SizeClass::Large => self.large,
            SizeClass::ExtraLarge => self.extra_large,
            SizeClass::SelfPool => self.self_pool,
        }
    }
}

/// One compilation's memory: pools, arenas, roots and context.
pub struct Isolate {
    config: IsolateConfig,
    pools: [MemoryPool; 5],
    nodes: Slots<Node>,
    scopes: Slots<Scope>,
    blocks: Slots<Block>,
    roots: PersistentRoots,
    context: Option<Context>,
}

impl Isolate {
    /// An isolate with the default pool capacities.
    pub fn new() -> Self {
        Self::with_config(IsolateConfig::default())
    }

    pub fn with_config(config: IsolateConfig) -> Self {
        Self {
            config,
            pools: SizeClass::ALL.map(|class| MemoryPool::new(class, config.capacity(class))),
            nodes: Slots::new(),
            scopes: Slots::new(),
            blocks: Slots::new(),
            roots: PersistentRoots::new(),
            context: None,
        }
    }

    pub fn config(&self) -> &IsolateConfig {
        &self.config
    }

    /// Usage statistics for one pool.
    pub fn pool(&self, class: SizeClass) -> &MemoryPool {
        &self.pools[class.index()]
    }

    // ── Pool accounting ───────────────────────────────────────────────────

    fn class_for(size: usize) -> CondorResult<SizeClass> {
        SizeClass::for_size(size).ok_or_else(|| {
            warn!(target: "condor::isolate", size, "allocation exceeds every size class");
            CondorError::from(ErrorKind::AllocationTooLarge(size))
        })
    }

    fn reserve(&mut self, class: SizeClass, size: usize) -> CondorResult<()> {
        self.pools[class.index()].reserve(size).inspect_err(|_| {
            warn!(target: "condor::isolate", %class, size, "pool exhausted");
        })
    }

    fn release(&mut self, class: SizeClass, size: usize) {
        self.pools[class.index()].release(size);
    }

    /// Charge `size` bytes of bookkeeping to the self pool.
    pub(crate) fn reserve_self(&mut self, size: usize) -> CondorResult<()> {
        self.reserve(SizeClass::SelfPool, size)
    }

    pub(crate) fn release_self(&mut self, size: usize) {
        self.release(SizeClass::SelfPool, size);
    }

    // ── Raw blocks ────────────────────────────────────────────────────────

    /// A zeroed block of `size` bytes from the pool whose class covers it.
    pub fn allocate(&mut self, size: usize) -> CondorResult<Handle<Block>> {
        let class = Self::class_for(size)?;
        self.reserve(class, size)?;
        Ok(self.blocks.insert(Block::zeroed(size), class, size))
    }

    /// Return a block obtained from [`allocate`][Self::allocate].
    ///
    /// `size` must be the size the block was allocated with.
    pub fn free(&mut self, block: Handle<Block>, size: usize) -> CondorResult<()> {
        let (_, allocated) = self.blocks.charge(block).ok_or(ErrorKind::StaleHandle)?;
        if allocated != size {
            return Err(ErrorKind::FreeSizeMismatch {
                allocated,
                freed: size,
            }
            .into());
        }
        let (_, class, size) = self.blocks.remove(block).ok_or(ErrorKind::StaleHandle)?;
        self.release(class, size);
        Ok(())
    }

    pub fn block(&self, block: Handle<Block>) -> Option<&Block> {
        self.blocks.get(block)
    }

    pub fn block_mut(&mut self, block: Handle<Block>) -> Option<&mut Block> {
        self.blocks.get_mut(block)
    }

    pub fn live_blocks(&self) -> usize {
        self.blocks.len()
    }

    // ── Nodes ─────────────────────────────────────────────────────────────

    /// Move `node` into the node arena.
    pub fn alloc_node(&mut self, node: Node) -> CondorResult<NodeRef> {
        let size = size_of::<Node>();
        let class = Self::class_for(size)?;
        self.reserve(class, size)?;
        Ok(self.nodes.insert(node, class, size))
    }

    /// Release a node and hand its contents back.  Child handles inside the
    /// returned node are not followed.
    pub fn free_node(&mut self, node: NodeRef) -> CondorResult<Node> {
        let (value, class, size) = self.nodes.remove(node).ok_or(ErrorKind::StaleHandle)?;
        self.release(class, size);
        Ok(value)
    }

    pub fn node(&self, node: NodeRef) -> Option<&Node> {
        self.nodes.get(node)
    }

    pub fn node_mut(&mut self, node: NodeRef) -> Option<&mut Node> {
        self.nodes.get_mut(node)
    }

    /// Like [`node`][Self::node] but a stale handle is an error.
    pub fn try_node(&self, node: NodeRef) -> CondorResult<&Node> {
        self.nodes.get(node).ok_or_else(|| ErrorKind::StaleHandle.into())
    }

    pub fn try_node_mut(&mut self, node: NodeRef) -> CondorResult<&mut Node> {
        self.nodes
            .get_mut(node)
            .ok_or_else(|| ErrorKind::StaleHandle.into())
    }

    pub fn live_nodes(&self) -> usize {
        self.nodes.len()
    }

    // ── Scopes ────────────────────────────────────────────────────────────

    /// Move `scope` into the scope arena.
    pub fn alloc_scope(&mut self, scope: Scope) -> CondorResult<ScopeRef> {
        let size = size_of::<Scope>();
        let class = Self::class_for(size)?;
        self.reserve(class, size)?;
        Ok(self.scopes.insert(scope, class, size))
    }

    /// Release a scope.  The nodes it holds are not freed.
    pub fn free_scope(&mut self, scope: ScopeRef) -> CondorResult<Scope> {
        let (value, class, size) = self.scopes.remove(scope).ok_or(ErrorKind::StaleHandle)?;
        self.release(class, size);
        Ok(value)
    }

    pub fn scope(&self, scope: ScopeRef) -> Option<&Scope> {
        self.scopes.get(scope)
    }

    pub fn scope_mut(&mut self, scope: ScopeRef) -> Option<&mut Scope> {
        self.scopes.get_mut(scope)
    }

    pub fn try_scope(&self, scope: ScopeRef) -> CondorResult<&Scope> {
        self.scopes.get(scope).ok_or_else(|| ErrorKind::StaleHandle.into())
    }

    pub fn try_scope_mut(&mut self, scope: ScopeRef) -> CondorResult<&mut Scope> {
        self.scopes
            .get_mut(scope)
            .ok_or_else(|| ErrorKind::StaleHandle.into())
    }

    pub fn live_scopes(&self) -> usize {
        self.scopes.len()
    }

    // ── Roots ─────────────────────────────────────────────────────────────

    /// Keep `root` and everything reachable from it alive across
    /// collections.
    pub fn add_root(&mut self, root: impl Into<GcRef>) {
        self.roots.register(root.into());
    }

    /// Undo [`add_root`][Self::add_root].  Returns `true` if it was a root.
    pub fn remove_root(&mut self, root: impl Into<GcRef>) -> bool {
        self.roots.unregister(root.into())
    }

    /// The persistent roots followed by the context's roots.
    pub fn gc_roots(&self) -> Vec<GcRef> {
        let mut roots: Vec<GcRef> = self.roots.iter_roots().collect();
        if let Some(ctx) = &self.context {
            roots.extend(ctx.gc_roots());
        }
        roots
    }

    // ── Collection ────────────────────────────────────────────────────────

    /// Free everything reachable from `root` under `options` that is not
    /// also reachable from a persistent or context root.
    ///
    /// With default options the trace stays within `root`'s own statements
    /// and expressions; set `deep` to descend into child scopes and
    /// `include_object_keys` to take object key nodes along.
    pub fn collect(&mut self, root: impl Into<GcRef>, options: TraceOptions) -> CollectStats {
        let root = root.into();
        let dead = {
            let roots = self.gc_roots();
            let mut ms = MarkSweep::new(self);
            ms.mark(roots);
            let candidates = ms.candidates(root, options);
            ms.sweep(&candidates)
        };
        let stats = self.release_all(&dead);
        debug!(
            target: "condor::isolate",
            ?root,
            nodes = stats.nodes_freed,
            scopes = stats.scopes_freed,
            bytes = stats.bytes_freed,
            "collected"
        );
        stats
    }

    /// Free every still-live object in `refs`.  Stale entries are skipped.
    pub(crate) fn release_all(&mut self, refs: &[GcRef]) -> CollectStats {
        let mut stats = CollectStats::default();
        for &r in refs {
            match r {
                GcRef::Node(n) => {
                    if let Some((_, class, size)) = self.nodes.remove(n) {
                        self.release(class, size);
                        stats.nodes_freed += 1;
                        stats.bytes_freed += size;
                    }
                }
                GcRef::Scope(s) => {
                    if let Some((_, class, size)) = self.scopes.remove(s) {
                        self.release(class, size);
                        stats.scopes_freed += 1;
                        stats.bytes_freed += size;
                    }
                }
            }
        }
        stats
    }

    // ── Context ───────────────────────────────────────────────────────────

    /// Establish the isolate's context, or return the existing one.
    pub fn create_context(&mut self) -> CondorResult<&mut Context> {
        if self.context.is_none() {
            self.reserve_self(size_of::<Context>())?;
            debug!(target: "condor::isolate", "context created");
        }
        Ok(self.context.get_or_insert_with(Context::new))
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut Context> {
        self.context.as_mut()
    }

    /// Release everything: every node, scope and block, the roots and the
    /// context.  Outstanding handles go stale; the isolate can be reused.
    pub fn dispose(&mut self) {
        self.nodes.clear();
        self.scopes.clear();
        self.blocks.clear();
        self.roots.clear();
        self.context = None;
        for pool in &mut self.pools {
            pool.reset();
        }
        debug!(target: "condor::isolate", "disposed");
    }
}

impl Default for Isolate {
    fn default() -> Self {
        Self::new()
    }
}

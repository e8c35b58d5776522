/// Mark-sweep collection over the scope/AST graph.
pub mod collector;
/// Generational handles, slot arenas and persistent roots.
pub mod handle;
/// Size-classed memory pools.
pub mod pool;
/// Mark-and-trace infrastructure for the collector.
pub mod trace;

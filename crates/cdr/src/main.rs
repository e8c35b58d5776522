//! `cdr`: Condor shell.
//!
//! Parses a source file into a fresh isolate and prints its scope tree.
//! Bodies stay deferred unless `--realize` is given.

mod logging;

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use condor_core::gc::pool::SizeClass;
use condor_core::gc::trace::{GcRef, Trace, TraceOptions, Tracer};
use condor_core::parser::ast::ScopeRef;
use condor_core::parser::printer::dump;
use condor_core::{Isolate, ParserFlags, parse, parse_scope};
use tracing::info;

#[derive(Parser)]
#[command(name = "cdr", about = "Parse a Condor source file and dump its scope tree")]
struct Cli {
    /// Source file to parse
    file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Parse every deferred body before printing
    #[arg(long)]
    realize: bool,

    /// Accept `%name(...)` native calls
    #[arg(long)]
    natives: bool,

    /// Log every grammar rule the parser enters
    #[arg(long)]
    trace: bool,

    /// Log every variable declaration
    #[arg(long)]
    print_variables: bool,

    /// Print pool and object statistics after parsing
    #[arg(long)]
    stats: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, logging::parser_level(cli.trace, cli.print_variables))?;

    let source = fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;
    let flags = ParserFlags {
        allow_natives: cli.natives,
        trace: cli.trace,
        print_variables: cli.print_variables,
    };

    let mut isolate = Isolate::new();
    let root = parse(&mut isolate, &source, flags).map_err(|err| {
        anyhow::anyhow!(
            "{}:{}:{}: {err}",
            cli.file.display(),
            err.row(),
            err.column()
        )
    })?;

    if cli.realize {
        let count = realize_all(&mut isolate, root, flags)?;
        info!(target: "condor::shell", count, "realized deferred bodies");
    }

    println!("{}", dump(&isolate, root));

    if cli.stats {
        print_stats(&isolate);
    }
    isolate.dispose();
    Ok(())
}

/// Realize every deferred scope reachable from `root`, including the ones
/// that only appear once their enclosing body is parsed.
fn realize_all(isolate: &mut Isolate, root: ScopeRef, flags: ParserFlags) -> anyhow::Result<usize> {
    let mut tracer = Tracer::new(TraceOptions::FULL);
    tracer.push_root(GcRef::Scope(root));
    let mut seen = HashSet::new();
    let mut realized = 0;
    while let Some(item) = tracer.pop() {
        if !seen.insert(item) {
            continue;
        }
        match item {
            GcRef::Scope(scope) => {
                if !isolate.try_scope(scope)?.is_parsed() {
                    parse_scope(isolate, scope, flags)?;
                    realized += 1;
                }
                isolate.try_scope(scope)?.trace(&mut tracer);
            }
            GcRef::Node(node) => isolate.try_node(node)?.trace(&mut tracer),
        }
    }
    Ok(realized)
}

fn print_stats(isolate: &Isolate) {
    println!();
    println!("nodes:  {}", isolate.live_nodes());
    println!("scopes: {}", isolate.live_scopes());
    for class in SizeClass::ALL {
        let pool = isolate.pool(class);
        println!(
            "{:<12} used {:>8}  peak {:>8}  capacity {:>10}  allocations {}",
            class.to_string(),
            pool.used(),
            pool.peak(),
            pool.capacity(),
            pool.total_allocations()
        );
    }
}

use criterion::{Criterion, criterion_group, criterion_main};
use condor_core::gc::pool::SizeClass;
use condor_core::gc::trace::TraceOptions;
use condor_core::isolate::Isolate;
use condor_core::parser::{ParserFlags, parse, parse_scope};

fn sample_source(functions: usize) -> String {
    let mut source = String::from("import \"io\"\nvar total = 0;\n");
    for i in 0..functions {
        source.push_str(&format!(
            "func step{i}(int a, int b) {{\n    var {{ x = a; y = b; }}\n    \
             if (x < y) {{ total += x; }} else {{ total -= y; }}\n    \
             for (int j = 0; j < 10; j++) {{ log(j); }}\n    return x + y;\n}}\n"
        ));
    }
    source
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn bench_parse_deferred(c: &mut Criterion) {
    let source = sample_source(64);
    c.bench_function("parse_64_functions_deferred", |b| {
        b.iter(|| {
            let mut iso = Isolate::new();
            parse(&mut iso, &source, ParserFlags::default()).unwrap()
        });
    });
}

fn bench_realize_bodies(c: &mut Criterion) {
    let source = sample_source(64);
    c.bench_function("realize_64_function_bodies", |b| {
        b.iter(|| {
            let mut iso = Isolate::new();
            let root = parse(&mut iso, &source, ParserFlags::default()).unwrap();
            let funcs = iso.scope(root).unwrap().nodes().to_vec();
            for f in funcs {
                if let Some(body) = iso.node(f).and_then(|n| n.as_func()).map(|f| f.body) {
                    parse_scope(&mut iso, body, ParserFlags::default()).unwrap();
                }
            }
            iso.live_nodes()
        });
    });
}

// ---------------------------------------------------------------------------
// Pools and collection
// ---------------------------------------------------------------------------

fn bench_pool_allocate_free(c: &mut Criterion) {
    c.bench_function("pool_allocate_free_mixed_sizes", |b| {
        let mut iso = Isolate::new();
        let sizes = [16usize, 64, 200, 900, 4096];
        b.iter(|| {
            let handles: Vec<_> = sizes
                .iter()
                .map(|&size| (iso.allocate(size).unwrap(), size))
                .collect();
            for (handle, size) in handles {
                iso.free(handle, size).unwrap();
            }
            iso.pool(SizeClass::Small).used()
        });
    });
}

fn bench_collect_unrooted_tree(c: &mut Criterion) {
    let source = sample_source(32);
    c.bench_function("collect_unrooted_32_functions", |b| {
        b.iter(|| {
            let mut iso = Isolate::new();
            let root = parse(&mut iso, &source, ParserFlags::default()).unwrap();
            iso.context_mut().unwrap().unregister_root(root);
            iso.collect(root, TraceOptions::FULL)
        });
    });
}

criterion_group!(
    benches,
    bench_parse_deferred,
    bench_realize_bodies,
    bench_pool_allocate_free,
    bench_collect_unrooted_tree,
);
criterion_main!(benches);

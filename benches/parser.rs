use bminor::{parse, tokenize};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn generate_program(functions: usize) -> String {
    let mut source = String::new();
    for i in 0..functions {
        source.push_str(&format!(
            "f{i}: function integer (a: integer, b: array [] integer) = {{
    total: integer = 0;
    j: integer;
    for (j = 0; j < a; j++) {{
        if (b[j] % 2 == 0 && j > 1) total = total + b[j] * {i};
        else if (b[j] < 0) total--;
        else total = total - 1;
    }}
    while (total > 100) total = total / 2;
    return total;
}}
"
        ));
    }
    source
}

fn benchmark_parser(c: &mut Criterion) {
    let source = generate_program(200);
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("tokenize", |b| {
        b.iter(|| black_box(tokenize(black_box(&source)).unwrap()))
    });

    let tokens = tokenize(&source).unwrap();
    group.bench_function("parse", |b| {
        b.iter(|| black_box(parse(tokens.clone()).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, benchmark_parser);
criterion_main!(benches);

use bminor::{compile, Diagnostics, Interpreter};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io;

const SOURCE: &str = r#"
fact: function integer (n: integer) = {
    if (n <= 1) return 1;
    return n * fact(n - 1);
}

main: function integer () = {
    return fact(20);
}
"#;

fn benchmark_factorial(c: &mut Criterion) {
    let mut group = c.benchmark_group("factorial");

    // Front end only: scan, parse and check
    group.bench_function("compile", |b| {
        b.iter(|| {
            let mut diagnostics = Diagnostics::new();
            black_box(compile(black_box(SOURCE), &mut diagnostics))
        })
    });

    let mut diagnostics = Diagnostics::new();
    let program = compile(SOURCE, &mut diagnostics).unwrap();
    group.bench_function("interpret_n20", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::new(io::sink(), io::empty());
            black_box(interpreter.execute(&program).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_factorial);
criterion_main!(benches);

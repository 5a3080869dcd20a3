// Performance regression tests
// These tests ensure that front-end and interpreter speed doesn't degrade over time

use bminor::*;
use std::io;
use std::time::{Duration, Instant};

/// Number of iterations for performance measurements (to average out noise)
const PERF_ITERATIONS: u32 = 5;

/// Helper to measure a specific operation with averaging
fn measure_operation<F>(mut op: F, iterations: u32) -> Duration
where
    F: FnMut(),
{
    let mut total = Duration::ZERO;
    for _ in 0..iterations {
        let start = Instant::now();
        op();
        total += start.elapsed();
    }
    total / iterations
}

fn large_function(statements: usize) -> String {
    let mut source = String::from("main: function integer () = {\n");
    for i in 0..statements {
        source.push_str(&format!("    x{}: integer = {} * 2 + 1;\n", i, i));
    }
    source.push_str("    return 0;\n}\n");
    source
}

#[test]
fn test_parse_performance_large_function() {
    let source = large_function(500);
    let duration = measure_operation(
        || {
            let _ = parse_source(&source);
        },
        PERF_ITERATIONS,
    );

    // 500 declarations should parse well under 200ms even on slow CI machines
    assert!(
        duration < Duration::from_millis(200),
        "Large function parse took too long: {:?} (average over {} iterations)",
        duration,
        PERF_ITERATIONS
    );
}

#[test]
fn test_check_performance() {
    let source = large_function(500);
    let program = parse_source(&source).unwrap();
    let duration = measure_operation(
        || {
            let mut copy = program.clone();
            let mut diagnostics = Diagnostics::new();
            check(&mut copy, &mut diagnostics);
            assert!(!diagnostics.has_errors());
        },
        PERF_ITERATIONS,
    );

    assert!(
        duration < Duration::from_millis(200),
        "Semantic check took too long: {:?} (average over {} iterations)",
        duration,
        PERF_ITERATIONS
    );
}

#[test]
fn test_parse_performance_deep_nesting() {
    let mut source = String::from("main: function void () = {\n");
    for i in 0..100 {
        source.push_str(&format!("if (c{} == 0) ", i));
    }
    source.push_str("print 1; else print 2;\n}");

    let duration = measure_operation(
        || {
            assert!(parse_source(&source).is_ok());
        },
        PERF_ITERATIONS,
    );

    assert!(
        duration < Duration::from_millis(100),
        "Nested if parse took too long: {:?} (average over {} iterations)",
        duration,
        PERF_ITERATIONS
    );
}

#[test]
fn test_interpreter_performance_fibonacci() {
    let source = "
        fib: function integer (n: integer) = {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        main: function integer () = { return fib(18); }
    ";
    let mut diagnostics = Diagnostics::new();
    let program = compile(source, &mut diagnostics).unwrap();

    let duration = measure_operation(
        || {
            let mut interpreter = Interpreter::new(io::sink(), io::empty());
            let result = interpreter.execute(&program).unwrap();
            assert_eq!(result, Some(Value::Integer(2584)));
        },
        PERF_ITERATIONS,
    );

    // Roughly 8k calls; allow a wide margin for debug builds
    assert!(
        duration < Duration::from_secs(2),
        "fib(18) took too long: {:?} (average over {} iterations)",
        duration,
        PERF_ITERATIONS
    );
}

#[test]
fn test_interpreter_performance_loop() {
    let source = "
        main: function integer () = {
            total: integer = 0;
            i: integer;
            for (i = 0; i < 20000; i++) total = total + i % 7;
            return total;
        }
    ";
    let mut diagnostics = Diagnostics::new();
    let program = compile(source, &mut diagnostics).unwrap();

    let duration = measure_operation(
        || {
            let mut interpreter = Interpreter::new(io::sink(), io::empty());
            assert!(interpreter.execute(&program).is_ok());
        },
        PERF_ITERATIONS,
    );

    assert!(
        duration < Duration::from_secs(2),
        "20k iteration loop took too long: {:?} (average over {} iterations)",
        duration,
        PERF_ITERATIONS
    );
}

#[test]
fn test_frames_do_not_leak_between_runs() {
    // Each interpreter owns its own frames; repeated runs must not slow down
    let source = "
        f: function integer (n: integer) = { return n + 1; }
        main: function integer () = {
            i: integer;
            for (i = 0; i < 1000; i++) f(i);
            return 0;
        }
    ";
    let mut diagnostics = Diagnostics::new();
    let program = compile(source, &mut diagnostics).unwrap();

    let first = measure_operation(
        || {
            let mut interpreter = Interpreter::new(io::sink(), io::empty());
            interpreter.execute(&program).unwrap();
        },
        PERF_ITERATIONS,
    );
    let later = measure_operation(
        || {
            let mut interpreter = Interpreter::new(io::sink(), io::empty());
            interpreter.execute(&program).unwrap();
        },
        PERF_ITERATIONS,
    );
    assert!(
        later < first * 4 + Duration::from_millis(20),
        "later runs slowed down: first {:?}, later {:?}",
        first,
        later
    );
}

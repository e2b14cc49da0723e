//! Benchmark for whole-program compaction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fir_compact::compact::{compact, CompactConfig};
use fir_compact::fir::{Expr, FuncDecl, Program, QName, Rule, TypeExpr, Visibility};
use fir_compact::modules::MemoryLoader;

fn function(module: &str, name: &str, body: Expr) -> FuncDecl {
    FuncDecl {
        name: QName::new(module, name),
        arity: 0,
        visibility: Visibility::Public,
        ty: TypeExpr::base(QName::new("prelude", "Int")),
        rule: Rule::Rule {
            params: Vec::new(),
            body,
        },
    }
}

/// Модуль-цепочка: f0 -> f1 -> ... -> f(n-1), плюс столько же мусорных функций.
fn chain_module(module: &str, length: usize) -> Program {
    let mut program = Program::new(module);
    for i in 0..length {
        let body = if i + 1 < length {
            Expr::call(QName::new(module, format!("f{}", i + 1)), vec![])
        } else {
            Expr::Var(0)
        };
        program
            .functions
            .push(function(module, &format!("f{}", i), body));
        program
            .functions
            .push(function(module, &format!("dead{}", i), Expr::Var(0)));
    }
    program
}

/// Главный модуль, зовущий начало цепочки в соседнем модуле.
fn main_module() -> Program {
    let mut program = Program::new("main");
    program.functions.push(function(
        "main",
        "main",
        Expr::call(QName::new("chain", "f0"), vec![]),
    ));
    program
}

fn benchmark_compact_chain(c: &mut Criterion) {
    let chain = chain_module("chain", 500);
    let main = main_module();

    let mut config = CompactConfig::new();
    config.main_function = Some("main".to_string());

    c.bench_function("compact 500-function call chain", |b| {
        b.iter(|| {
            let mut loader = MemoryLoader::with_programs(vec![chain.clone()]);
            black_box(compact(&config, &mut loader, main.clone()).unwrap())
        });
    });
}

fn benchmark_compact_wide_fanout(c: &mut Criterion) {
    // Корень зовёт 200 функций, каждая из которых зовёт ещё две
    let mut program = Program::new("main");
    let mut root_args = Vec::new();
    for i in 0..200 {
        root_args.push(Expr::call(QName::new("main", format!("g{}", i)), vec![]));
        program.functions.push(function(
            "main",
            &format!("g{}", i),
            Expr::call(
                QName::new("main", format!("h{}", i)),
                vec![Expr::call(QName::new("main", format!("k{}", i)), vec![])],
            ),
        ));
        program
            .functions
            .push(function("main", &format!("h{}", i), Expr::Var(0)));
        program
            .functions
            .push(function("main", &format!("k{}", i), Expr::Var(0)));
    }
    program
        .functions
        .push(function("main", "main", Expr::call(QName::new("main", "g0"), root_args)));

    let mut config = CompactConfig::new();
    config.main_function = Some("main".to_string());

    c.bench_function("compact wide call fanout", |b| {
        b.iter(|| {
            let mut loader = MemoryLoader::new();
            black_box(compact(&config, &mut loader, program.clone()).unwrap())
        });
    });
}

fn benchmark_program_json_roundtrip(c: &mut Criterion) {
    let program = chain_module("chain", 200);
    let json = program.to_json().unwrap();

    c.bench_function("program JSON roundtrip", |b| {
        b.iter(|| black_box(Program::from_json(&json).unwrap()));
    });
}

criterion_group!(
    benches,
    benchmark_compact_chain,
    benchmark_compact_wide_fanout,
    benchmark_program_json_roundtrip
);
criterion_main!(benches);

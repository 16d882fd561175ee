//! Integration tests for the whole front end.
//!
//! These tests run complete programs through tokenization, parsing,
//! registration and resolution via [`dachs::analyze_source`].

use std::rc::{Rc, Weak};

use dachs::{
    analyze_source,
    ast::{
        ast::Node,
        expressions::ExprKind,
        statements::{FunctionDefinition, Stmt},
    },
    errors::errors::ErrorKind,
    semantics::{types::Type, Analysis, AnalysisOptions},
};

const PROGRAM: &str = r#"
const LIMIT: int = 3;
const GREETING = "hello";

func add(a: int, b: int): int {
    return a + b;
}

func add(a: float, b: float): float {
    return a + b;
}

func id(x) {
    return x;
}

func min_max(xs: [int]) {
    var lo = xs[0];
    var hi = xs[0];
    for x in xs {
        lo = x if x < lo;
        hi = x if x > hi;
    }
    return lo, hi;
}

proc report(name: string, value: int) {
    println(name + ": " + value.to_string);
}

proc main() {
    var total = 0;
    val xs: [int] = [1, 2, 3];
    for x in xs {
        total += x;
    }

    val lo, hi = min_max(xs);
    report("range", hi - lo);

    let val y = add(total, LIMIT) in println(y);

    if total > LIMIT {
        println(GREETING);
    } elseif total == 0 {
        println("none");
    } else {
        println(id(2.5));
    }

    unless total > 10 {
        println(id("small"));
    }

    case {
        when total > 1 { println(add(1.5, 2.5)); }
        else { }
    }

    case total {
        when 1, 2 { println("few"); }
        else { }
    }

    while total > 0 {
        total -= 1;
    }

    val ages = {"ann" => 31, "bob" => 42};
    for name, age in ages {
        report(name, age);
    }

    println(xs.size);
    return if total > 0;
} ensure {
    println("done");
}
"#;

fn analyze(source: &str) -> Analysis {
    analyze_source(source, "main.dachs", &AnalysisOptions::default()).unwrap()
}

fn function<'a>(analysis: &'a Analysis, name: &str) -> &'a Rc<FunctionDefinition> {
    analysis
        .program
        .functions()
        .find(|def| def.name == name)
        .unwrap()
}

#[test]
fn test_analyze_complete_program() {
    let analysis = analyze(PROGRAM);

    // Every global function got a scope linked to its symbol.
    for def in analysis.program.functions().filter(|def| !def.is_template()) {
        let scope = def.get_scope().unwrap();
        assert!(Rc::ptr_eq(&scope.def.upgrade().unwrap(), def));
        assert!(def.body.get_scope().is_some());
    }

    let min_max = analysis.global_scope.lookup_functions("min_max");
    assert_eq!(
        min_max[0].get_return_type(),
        Some(&Type::Tuple(vec![Type::int(), Type::int()]))
    );
}

#[test]
fn test_template_instances_are_recorded() {
    let analysis = analyze(PROGRAM);

    let id = function(&analysis, "id");
    let instances: Vec<Vec<Type>> = id
        .instantiated
        .borrow()
        .iter()
        .map(|instance| {
            instance
                .params
                .iter()
                .map(|param| {
                    param
                        .symbol
                        .get()
                        .and_then(Weak::upgrade)
                        .unwrap()
                        .get_type()
                        .cloned()
                        .unwrap()
                })
                .collect()
        })
        .collect();

    assert_eq!(instances, vec![vec![Type::float()], vec![Type::string()]]);
    assert_eq!(analysis.global_scope.instances.borrow().len(), 2);
}

#[test]
fn test_overload_is_chosen_by_argument_types() {
    let analysis = analyze(
        "func add(a: int, b: int): int { return a + b; }
         func add(a: float, b: float): float { return a + b; }
         proc main() { val i = add(1, 2); val f = add(1.5, 2.5); }",
    );
    let main = function(&analysis, "main");

    let chosen: Vec<String> = main
        .body
        .stmts
        .iter()
        .map(|stmt| match stmt {
            Stmt::Initialize(init) => match &init.values[0].kind {
                ExprKind::Call(call) => call.get_function().unwrap().to_string(),
                _ => panic!("expected a call"),
            },
            _ => panic!("expected an initialize statement"),
        })
        .collect();

    assert_eq!(
        chosen,
        vec!["func add(int, int): int", "func add(float, float): float"]
    );
}

#[test]
fn test_every_initializer_is_typed() {
    let analysis = analyze(PROGRAM);
    let main = function(&analysis, "main");

    for stmt in &main.body.stmts {
        if let Stmt::Initialize(init) = stmt {
            for value in &init.values {
                assert!(value.get_type().is_some(), "{} is untyped", value.describe());
            }
        }
    }
}

#[test]
fn test_errors_carry_positions() {
    let cases = [
        ("proc main() {\n    var x = ;\n}", ErrorKind::Syntax, 2, 13),
        ("proc main() {\n    println(y);\n}", ErrorKind::UnresolvedName, 2, 13),
        (
            "func f(a: int) { }\nfunc f(b: int) { }",
            ErrorKind::DuplicateDeclaration,
            2,
            1,
        ),
        (
            "func h(a: int): int { return a; }\nproc main() { h(1, 2); }",
            ErrorKind::NoMatchingOverload,
            2,
            15,
        ),
        ("proc main() {\n  val x = 1;\n  x = 2;\n}", ErrorKind::TypeMismatch, 3, 3),
    ];

    for (source, kind, line, col) in cases {
        let error = analyze_source(source, "main.dachs", &AnalysisOptions::default()).unwrap_err();

        assert_eq!(error.get_kind(), kind, "{}", source);
        assert_eq!(error.get_position().line, line, "{}", source);
        assert_eq!(error.get_position().col, col, "{}", source);
    }
}

#[test]
fn test_error_display_names_the_location() {
    let error = analyze_source("proc main() { y; }", "main.dachs", &AnalysisOptions::default())
        .unwrap_err();

    assert_eq!(error.to_string(), "main.dachs:1:15: unresolved name \"y\"");
}

//! Unit tests for semantic analysis.
//!
//! Covers the overload engine on hand-built symbols, then whole programs:
//! name resolution and shadowing, return-type inference, generic
//! instantiation, UFCS and the error cases of each statement kind.

use crate::ast::ast::Node;
use std::{
    cell::OnceCell,
    rc::{Rc, Weak},
};

use super::{
    overload::{overload_score, score_params, select_overload},
    resolver::INSTANTIATION_LIMIT,
    scope::{Scope, WeakScope},
    symbol::{FuncSymbol, VarSymbol},
    types::Type,
    Analysis, AnalysisOptions,
};
use crate::{
    analyze_source,
    ast::{
        expressions::{Expr, ExprKind},
        statements::{FuncKind, FunctionDefinition, Stmt},
    },
    errors::errors::{Error, ErrorImpl, ErrorKind},
};

fn symbol(name: &str, params: Vec<Type>) -> Rc<FuncSymbol> {
    let params = params
        .into_iter()
        .enumerate()
        .map(|(index, ty)| {
            VarSymbol::new(
                &format!("p{}", index),
                Some(ty),
                false,
                WeakScope::Global(Weak::new()),
            )
        })
        .collect();

    Rc::new(FuncSymbol {
        name: name.to_string(),
        params,
        ret_type: OnceCell::new(),
        kind: FuncKind::Func,
        is_builtin: false,
        decl: Weak::new(),
    })
}

fn analyze(source: &str) -> Result<Analysis, Error> {
    analyze_source(source, "test.dachs", &AnalysisOptions::default())
}

fn analyze_bare(source: &str) -> Result<Analysis, Error> {
    analyze_source(source, "test.dachs", &AnalysisOptions { builtins: false })
}

fn function<'a>(analysis: &'a Analysis, name: &str) -> &'a Rc<FunctionDefinition> {
    analysis
        .program
        .functions()
        .find(|def| def.name == name)
        .unwrap()
}

/// The value of the `index`th statement of `name`'s body, which must be an
/// initialize statement.
fn init_value(analysis: &Analysis, name: &str, index: usize) -> Rc<Expr> {
    match &function(analysis, name).body.stmts[index] {
        Stmt::Initialize(init) => Rc::clone(&init.values[0]),
        _ => panic!("expected an initialize statement"),
    }
}

fn init_type(analysis: &Analysis, name: &str, index: usize) -> Type {
    match &function(analysis, name).body.stmts[index] {
        Stmt::Initialize(init) => init.decls[0]
            .symbol
            .get()
            .and_then(Weak::upgrade)
            .unwrap()
            .get_type()
            .cloned()
            .unwrap(),
        _ => panic!("expected an initialize statement"),
    }
}

// OVERLOAD ENGINE

#[test]
fn test_zero_params_zero_args_scores_one() {
    let f = symbol("f", vec![]);

    assert_eq!(overload_score(&f, &[]), 1);
    let (chosen, score) = select_overload([&f], "f", &[]).unwrap();
    assert!(Rc::ptr_eq(&chosen, &f));
    assert_eq!(score, 1);
}

#[test]
fn test_exact_match_beats_template() {
    let template = symbol("g", vec![Type::Template(7)]);
    let concrete = symbol("g", vec![Type::int()]);

    assert_eq!(overload_score(&template, &[Type::int()]), 1);
    assert_eq!(overload_score(&concrete, &[Type::int()]), 2);

    let candidates = vec![Rc::clone(&template), Rc::clone(&concrete)];
    let (chosen, score) = select_overload(candidates.iter(), "g", &[Type::int()]).unwrap();
    assert!(Rc::ptr_eq(&chosen, &concrete));
    assert_eq!(score, 2);

    // Declaration order does not matter when scores differ.
    let candidates = vec![concrete.clone(), template];
    let (chosen, _) = select_overload(candidates.iter(), "g", &[Type::int()]).unwrap();
    assert!(Rc::ptr_eq(&chosen, &concrete));
}

#[test]
fn test_arity_mismatch_scores_zero() {
    let h = symbol("h", vec![Type::int(), Type::int()]);

    assert_eq!(overload_score(&h, &[Type::int()]), 0);
    assert_eq!(overload_score(&h, &[]), 0);
    assert!(select_overload([&h], "h", &[Type::int()]).is_none());
}

#[test]
fn test_any_mismatched_param_scores_zero() {
    assert_eq!(score_params(&[Type::int(), Type::float()], &[Type::int(), Type::int()]), 0);
    assert_eq!(score_params(&[Type::int(), Type::float()], &[Type::int(), Type::float()]), 4);
    assert_eq!(score_params(&[Type::Template(1), Type::float()], &[Type::string(), Type::float()]), 2);
}

#[test]
fn test_tie_keeps_earlier_candidate() {
    let first = symbol("k", vec![Type::Template(1)]);
    let second = symbol("k", vec![Type::Template(2)]);
    let candidates = vec![Rc::clone(&first), Rc::clone(&second)];

    for _ in 0..3 {
        let (chosen, score) = select_overload(candidates.iter(), "k", &[Type::char()]).unwrap();
        assert!(Rc::ptr_eq(&chosen, &first));
        assert_eq!(score, 1);
    }
}

#[test]
fn test_other_names_are_ignored() {
    let other = symbol("other", vec![]);

    assert!(select_overload([&other], "f", &[]).is_none());
}

// TYPES AND SYMBOLS

#[test]
fn test_type_equality_is_structural() {
    assert_eq!(Type::array(Type::int()), Type::array(Type::int()));
    assert_ne!(Type::array(Type::int()), Type::array(Type::uint()));
    assert_eq!(Type::Template(3), Type::Template(3));
    assert_ne!(Type::Template(3), Type::Template(4));
    assert_ne!(Type::Template(3), Type::int());
    assert!(Type::unit().is_unit());
}

#[test]
fn test_type_display() {
    let func = Type::Func {
        params: vec![Type::int()],
        ret: Some(Box::new(Type::int())),
    };
    let procedure = Type::Func {
        params: vec![Type::int()],
        ret: None,
    };

    assert_eq!(Type::dict(Type::string(), Type::int()).to_string(), "{string => int}");
    assert_eq!(Type::Tuple(vec![Type::int(), Type::float()]).to_string(), "(int, float)");
    assert_eq!(func.to_string(), "func(int) : int");
    assert_eq!(procedure.to_string(), "proc(int)");
    assert_eq!(Type::range(Type::int()).to_string(), "range(int)");
}

#[test]
fn test_func_symbol_declaration_equality() {
    assert!(*symbol("f", vec![Type::int()]) == *symbol("f", vec![Type::int()]));
    assert!(*symbol("f", vec![Type::Template(1)]) == *symbol("f", vec![Type::Template(2)]));
    assert!(*symbol("f", vec![Type::Template(1)]) != *symbol("f", vec![Type::int()]));
    assert!(*symbol("f", vec![Type::int()]) != *symbol("f", vec![Type::float()]));
    assert!(*symbol("f", vec![Type::int()]) != *symbol("g", vec![Type::int()]));
    assert!(*symbol("f", vec![]) != *symbol("f", vec![Type::int()]));
}

#[test]
fn test_func_symbol_display() {
    let analysis = analyze("func add(a: int, b: int): int { return a + b; }").unwrap();
    let functions = analysis.global_scope.lookup_functions("add");
    assert_eq!(functions[0].to_string(), "func add(int, int): int");

    let print = analysis.global_scope.lookup_functions("print");
    assert_eq!(print[0].to_string(), "func print(value)");
}

#[test]
#[should_panic]
fn test_builtin_has_no_declaration() {
    let analysis = analyze("").unwrap();
    let println = analysis.global_scope.lookup_functions("println");

    println[0].get_declaration();
}

// REGISTRATION

#[test]
fn test_call_without_params() {
    let analysis = analyze_bare("func f() { return 1; } proc main() { f(); }").unwrap();
    let main = function(&analysis, "main");

    let Stmt::Expression(expr) = &main.body.stmts[0] else {
        panic!("expected an expression statement");
    };
    let ExprKind::Call(call) = &expr.kind else {
        panic!("expected a call");
    };

    assert_eq!(call.get_function().unwrap().name, "f");
    assert_eq!(expr.get_type(), Some(&Type::int()));
}

#[test]
fn test_template_and_concrete_overloads_coexist() {
    let analysis = analyze_bare(
        "func g(x) { return x; }
         func g(x: int): int { return x + 1; }
         proc main() { val a = g(3); val b = g(\"s\"); }",
    )
    .unwrap();

    assert_eq!(analysis.global_scope.lookup_functions("g").len(), 2);

    let a = init_value(&analysis, "main", 0);
    let ExprKind::Call(call) = &a.kind else {
        panic!("expected a call");
    };
    let chosen = call.get_function().unwrap();
    assert!(!chosen.is_template());
    assert!(chosen.get_declaration().return_type.is_some());

    assert_eq!(init_type(&analysis, "main", 1), Type::string());
}

#[test]
fn test_duplicate_function_is_rejected() {
    let error = analyze_bare("func f(x: int) { } func f(y: int) { }").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::DuplicateDeclaration);
    assert_eq!(error.get_error_name(), "FunctionAlreadyDeclared");
}

#[test]
fn test_duplicate_parameter_is_rejected() {
    let error = analyze_bare("func f(a: int, a: int) { }").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::DuplicateDeclaration);
}

#[test]
fn test_duplicate_constant_is_rejected() {
    let error = analyze_bare("const A = 1; const A = 2;").unwrap_err();

    assert_eq!(error.get_error_name(), "VariableAlreadyDeclared");
}

#[test]
fn test_unknown_parameter_type() {
    let error = analyze_bare("func f(a: vec) { }").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::UnresolvedName);
    assert_eq!(error.get_error_name(), "UnknownType");
}

#[test]
fn test_builtins_can_be_disabled() {
    assert!(analyze("proc main() { println(1); }").is_ok());

    let error = analyze_bare("proc main() { println(1); }").unwrap_err();
    assert_eq!(error.get_kind(), ErrorKind::UnresolvedName);
}

// NAME RESOLUTION

#[test]
fn test_inner_declaration_shadows_outer() {
    let analysis = analyze(
        "proc main() {
            val x = 1;
            if true {
                val x = \"inner\";
                println(x);
            }
        }",
    )
    .unwrap();
    let main = function(&analysis, "main");

    let Stmt::If(if_stmt) = &main.body.stmts[1] else {
        panic!("expected an if statement");
    };
    let Stmt::Expression(expr) = &if_stmt.then_block.stmts[1] else {
        panic!("expected an expression statement");
    };
    let ExprKind::Call(call) = &expr.kind else {
        panic!("expected a call");
    };

    let var_ref = call.args[0].as_var_ref().unwrap();
    let resolved = var_ref.symbol.get().unwrap().as_var().unwrap();
    let inner_scope = if_stmt.then_block.get_scope().unwrap();

    assert!(Rc::ptr_eq(&resolved, &inner_scope.vars.borrow()[0]));
    assert_eq!(call.args[0].get_type(), Some(&Type::string()));
}

#[test]
fn test_ignored_variable_is_not_an_error() {
    let analysis = analyze_bare("proc main() { _; _ = 3; }").unwrap();
    let main = function(&analysis, "main");

    let Stmt::Expression(expr) = &main.body.stmts[0] else {
        panic!("expected an expression statement");
    };
    assert!(expr.as_var_ref().unwrap().is_ignored_var());
    assert_eq!(expr.get_type(), Some(&Type::unit()));

    let Stmt::Assign(assign) = &main.body.stmts[1] else {
        panic!("expected an assignment");
    };
    assert_eq!(assign.assignees[0].get_type(), Some(&Type::int()));
}

#[test]
fn test_unresolved_name_position() {
    let error = analyze_bare("proc main() { y; }").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::UnresolvedName);
    assert_eq!(error.get_position().line, 1);
    assert_eq!(error.get_position().col, 15);
}

#[test]
fn test_parameters_and_constants_are_visible() {
    let analysis = analyze_bare(
        "const N = 10;
         func f(a: int): int { val b = a + N; return b; }",
    )
    .unwrap();

    assert_eq!(init_type(&analysis, "f", 0), Type::int());
    let n = analysis.global_scope.lookup_constant("N").unwrap();
    assert_eq!(n.get_type(), Some(&Type::int()));
    assert!(!n.is_var);
}

#[test]
fn test_constant_uses_later_function() {
    let analysis = analyze_bare("const X = f(); func f() { return 2.5; }").unwrap();

    let x = analysis.global_scope.lookup_constant("X").unwrap();
    assert_eq!(x.get_type(), Some(&Type::float()));
}

#[test]
fn test_constant_resolved_on_first_read() {
    let analysis = analyze_bare("const A = B; const B = 1;").unwrap();
    let a = analysis.global_scope.lookup_constant("A").unwrap();
    assert_eq!(a.get_type(), Some(&Type::int()));

    let analysis = analyze_bare(
        "const X = f();
         func f() { return Y * 2; }
         const Y = 21;",
    )
    .unwrap();
    let x = analysis.global_scope.lookup_constant("X").unwrap();
    assert_eq!(x.get_type(), Some(&Type::int()));
}

#[test]
fn test_cyclic_constants_are_not_inferred() {
    let error = analyze_bare("const A = B; const B = A;").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::TypeMismatch);
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::TypeNotInferred { name: "A".to_string() }
    );
}

#[test]
fn test_duplicate_local_is_rejected() {
    let error = analyze_bare("proc main() { val x = 1; val x = 2; }").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::DuplicateDeclaration);
}

#[test]
fn test_let_opens_a_blockless_scope() {
    let analysis = analyze("proc main() { let val y = 10 in println(y); }").unwrap();
    let main = function(&analysis, "main");

    let Stmt::Let(let_stmt) = &main.body.stmts[0] else {
        panic!("expected a let statement");
    };
    let scope = let_stmt.scope.get().and_then(Weak::upgrade).unwrap();

    assert!(scope.block.upgrade().is_none());
    assert_eq!(scope.vars.borrow()[0].name, "y");
}

// FUNCTIONS

#[test]
fn test_return_type_is_inferred_on_demand() {
    let analysis = analyze_bare(
        "proc main() { val x = twice(2); }
         func twice(n: int) { return n * 2; }",
    )
    .unwrap();

    assert_eq!(init_type(&analysis, "main", 0), Type::int());
    let twice = analysis.global_scope.lookup_functions("twice");
    assert_eq!(twice[0].get_return_type(), Some(&Type::int()));
}

#[test]
fn test_func_without_return_is_unit() {
    let analysis = analyze_bare("func nothing() { } proc main() { val u = nothing(); }").unwrap();

    assert_eq!(init_type(&analysis, "main", 0), Type::unit());
}

#[test]
fn test_recursion_needs_a_declared_return_type() {
    let error = analyze_bare("func f(n: int) { return f(n); }").unwrap_err();
    assert_eq!(error.get_error_name(), "TypeNotInferred");

    let analysis = analyze_bare(
        "func fact(n: int): int { if n <= 1 { return 1; } return n * fact(n - 1); }",
    );
    assert!(analysis.is_ok());
}

#[test]
fn test_procedure_cannot_return_a_value() {
    let error = analyze_bare("proc p() { return 1; }").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::TypeMismatch);
    assert_eq!(error.get_error_name(), "InvalidReturn");
}

#[test]
fn test_declared_return_type_is_checked() {
    let error = analyze_bare("func f(): int { return \"s\"; }").unwrap_err();

    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::TypeMatchError {
            expected: "int".to_string(),
            received: "string".to_string(),
        }
    );
}

#[test]
fn test_template_instantiation_bookkeeping() {
    let analysis = analyze_bare(
        "func id(x) { return x; }
         proc main() { val a = id(1); val b = id(\"s\"); val c = id(2); }",
    )
    .unwrap();

    let id = function(&analysis, "id");
    assert_eq!(id.instantiated.borrow().len(), 2);
    assert_eq!(analysis.global_scope.instances.borrow().len(), 2);
    assert!(id.body.get_scope().is_none());

    assert_eq!(init_type(&analysis, "main", 0), Type::int());
    assert_eq!(init_type(&analysis, "main", 1), Type::string());

    let callee = |index: usize| {
        let value = init_value(&analysis, "main", index);
        let ExprKind::Call(call) = &value.kind else {
            panic!("expected a call");
        };
        call.get_function().unwrap()
    };

    let first = callee(0);
    assert!(!first.is_template());
    assert_eq!(first.param_types(), vec![Type::int()]);
    assert!(Rc::ptr_eq(&first, &callee(2)));
    assert!(!Rc::ptr_eq(&first, &callee(1)));

    let instance = first.get_declaration();
    assert_ne!(instance.get_id(), id.get_id());
    assert!(instance.body.get_scope().is_some());
}

#[test]
fn test_polymorphic_recursion_is_cut_off() {
    let error = analyze_bare(
        "func f(x) { return f([x]); } proc main() { f(1); }",
    )
    .unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::TypeMismatch);
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::InstantiationLimit {
            function: "f".to_string(),
            limit: INSTANTIATION_LIMIT,
        }
    );
    assert_eq!(error.get_position().line, 1);
    assert_eq!(error.get_position().col, 20);

    let error = analyze_bare("func g(x) { return g((x, x)); } proc main() { g(1); }").unwrap_err();
    assert_eq!(error.get_error_name(), "InstantiationLimit");
}

#[test]
fn test_bounded_template_recursion_is_allowed() {
    let analysis = analyze_bare(
        "func count(x, n: int): int { if n == 0 { return 0; } return count(x, n - 1) + 1; }
         proc main() { val c = count(\"s\", 3); }",
    )
    .unwrap();

    assert_eq!(init_type(&analysis, "main", 0), Type::int());
    assert_eq!(analysis.global_scope.instances.borrow().len(), 1);
}

#[test]
fn test_no_matching_overload() {
    let error = analyze_bare(
        "func h(x: int, y: int): int { return x + y; }
         proc main() { h(3); }",
    )
    .unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::NoMatchingOverload);
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::NoMatchingOverload {
            function: "h".to_string(),
            arguments: "int".to_string(),
        }
    );
}

#[test]
fn test_function_as_value() {
    let analysis = analyze_bare(
        "func inc(n: int): int { return n + 1; }
         func apply(f: func(int) : int, v: int): int { return f(v); }
         proc main() { val r = apply(inc, 1); val g = inc; }",
    )
    .unwrap();

    assert_eq!(init_type(&analysis, "main", 0), Type::int());
    assert_eq!(init_type(&analysis, "main", 1).to_string(), "func(int) : int");

    let value = init_value(&analysis, "main", 1);
    let var_ref = value.as_var_ref().unwrap();
    assert_eq!(var_ref.symbol.get().unwrap().as_func().unwrap().name, "inc");
    assert!(var_ref.symbol.get().unwrap().as_var().is_none());
}

#[test]
fn test_global_scope_resolves_overloads() {
    let analysis = analyze_bare("func g(x) { } func g(x: int) { } func g(x: int, y: int) { }").unwrap();
    let global = &analysis.global_scope;

    let chosen = global.resolve_func("g", &[Type::int()]).unwrap();
    assert_eq!(chosen.param_types(), vec![Type::int()]);

    let chosen = global.resolve_func("g", &[Type::string()]).unwrap();
    assert!(chosen.is_template());

    assert!(global.resolve_func("g", &[]).is_none());
    assert!(global.resolve_func("missing", &[]).is_none());
}

#[test]
fn test_overloaded_function_as_value_is_ambiguous() {
    let error = analyze_bare(
        "func g(a: int) { } func g(a: float) { }
         proc main() { val h = g; }",
    )
    .unwrap_err();

    assert_eq!(error.get_error_name(), "AmbiguousFunctionReference");
}

#[test]
fn test_ufcs_member_call() {
    let analysis = analyze_bare(
        "func double(n: int): int { return n * 2; }
         func add(a: int, b: int): int { return a + b; }
         proc main() { val n = 3; val a = n.double; val b = n.double(); val c = n.add(1); val s = [1, 2].size; }",
    )
    .unwrap();

    assert_eq!(init_type(&analysis, "main", 1), Type::int());
    assert_eq!(init_type(&analysis, "main", 2), Type::int());
    assert_eq!(init_type(&analysis, "main", 3), Type::int());
    assert_eq!(init_type(&analysis, "main", 4), Type::uint());

    let value = init_value(&analysis, "main", 1);
    let ExprKind::MemberAccess(access) = &value.kind else {
        panic!("expected a member access");
    };
    assert_eq!(access.callee.get().and_then(Weak::upgrade).unwrap().name, "double");
}

// STATEMENTS AND EXPRESSIONS

#[test]
fn test_immutable_assignment() {
    let error = analyze_bare("proc main() { val x = 1; x = 2; }").unwrap_err();
    assert_eq!(error.get_error_name(), "ImmutableAssignment");

    let error = analyze_bare("proc p(x: int) { x += 1; }").unwrap_err();
    assert_eq!(error.get_error_name(), "ImmutableAssignment");

    assert!(analyze_bare("proc main() { var x = 1; x += 2; x = 5; }").is_ok());
    assert!(analyze_bare("proc p(var x: int) { x -= 1; }").is_ok());
}

#[test]
fn test_initializer_type_mismatch() {
    let error = analyze_bare("proc main() { val x: int = \"s\"; }").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::TypeMismatch);
    assert_eq!(error.get_error_name(), "TypeMatchError");
}

#[test]
fn test_condition_must_be_bool() {
    let error = analyze_bare("proc main() { if 1 { } }").unwrap_err();

    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::TypeMatchError {
            expected: "bool".to_string(),
            received: "int".to_string(),
        }
    );
}

#[test]
fn test_empty_literals_need_a_type() {
    let error = analyze_bare("proc main() { val xs = []; }").unwrap_err();
    assert_eq!(error.get_error_name(), "TypeNotInferred");

    let analysis = analyze_bare(
        "proc main() { val xs: [int] = []; val d = {} : {string => int}; }",
    )
    .unwrap();
    assert_eq!(init_type(&analysis, "main", 0), Type::array(Type::int()));
    assert_eq!(init_type(&analysis, "main", 1), Type::dict(Type::string(), Type::int()));
}

#[test]
fn test_tuple_destructuring() {
    let source = "func pair(): (int, string) { return 1, \"a\"; }
                  proc main() { val a, b = pair(); }";
    let analysis = analyze_bare(source).unwrap();

    let main = function(&analysis, "main");
    let Stmt::Initialize(init) = &main.body.stmts[0] else {
        panic!("expected an initialize statement");
    };
    let b = init.decls[1].symbol.get().and_then(Weak::upgrade).unwrap();
    assert_eq!(b.get_type(), Some(&Type::string()));

    let error = analyze_bare(&source.replace("val a, b", "val a, b, c")).unwrap_err();
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::ArityMismatch {
            expected: 3,
            received: 2,
        }
    );
}

#[test]
fn test_for_loop_element_types() {
    let analysis = analyze_bare(
        "proc main() {
            for x in [1, 2] { }
            for k, v in {\"a\" => 1.5} { }
            for i in 0..10 { }
            for c in \"abc\" { }
        }",
    )
    .unwrap();
    let main = function(&analysis, "main");

    let var_types: Vec<Vec<Type>> = main
        .body
        .stmts
        .iter()
        .map(|stmt| match stmt {
            Stmt::For(for_stmt) => for_stmt
                .iter_vars
                .iter()
                .map(|var| {
                    var.symbol
                        .get()
                        .and_then(Weak::upgrade)
                        .unwrap()
                        .get_type()
                        .cloned()
                        .unwrap()
                })
                .collect(),
            _ => panic!("expected a for statement"),
        })
        .collect();

    assert_eq!(
        var_types,
        vec![
            vec![Type::int()],
            vec![Type::string(), Type::float()],
            vec![Type::int()],
            vec![Type::char()],
        ]
    );
}

#[test]
fn test_for_loop_over_non_iterable() {
    let error = analyze_bare("proc main() { for x in 1 { } }").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_switch_arms_match_target() {
    assert!(analyze_bare("proc main() { val n = 1; case n { when 1, 2 { } else { } } }").is_ok());

    let error = analyze_bare("proc main() { val n = 1; case n { when \"a\" { } } }").unwrap_err();
    assert_eq!(error.get_error_name(), "TypeMatchError");
}

#[test]
fn test_expression_types() {
    let analysis = analyze_bare(
        "proc main() {
            val t = (1, \"a\");
            val s = t[1];
            val f = t.first;
            val c = \"abc\"[0];
            val d = {\"k\" => 1}[\"k\"];
            val r = 1...5;
            val i = if true then 1.5 else 2.5;
            val x = 3 as float;
            val b = !(1 < 2) || false;
            val u = -7;
        }",
    )
    .unwrap();

    let expected = vec![
        Type::Tuple(vec![Type::int(), Type::string()]),
        Type::string(),
        Type::int(),
        Type::char(),
        Type::int(),
        Type::range(Type::int()),
        Type::float(),
        Type::float(),
        Type::bool(),
        Type::int(),
    ];
    for (index, ty) in expected.into_iter().enumerate() {
        assert_eq!(init_type(&analysis, "main", index), ty);
    }
}

#[test]
fn test_binary_operands_must_match() {
    let error = analyze_bare("proc main() { val x = 1 + 2.0; }").unwrap_err();
    assert_eq!(error.get_error_name(), "TypeMatchError");

    let error = analyze_bare("proc main() { val x = true + false; }").unwrap_err();
    assert_eq!(error.get_error_name(), "TypeMatchError");

    assert!(analyze_bare("proc main() { val s = \"a\" + \"b\"; }").is_ok());
}

#[test]
fn test_scope_dump_lists_symbols() {
    let analysis = analyze_bare("const K = 1; proc main() { var total = K; }").unwrap();
    let dump = analysis.dump_scopes();

    assert!(dump.contains("const val K : int"));
    assert!(dump.contains("proc main()"));
    assert!(dump.contains("var total : int"));
}

// LAMBDAS

fn lambda_of(value: &Expr) -> Rc<FunctionDefinition> {
    match &value.kind {
        ExprKind::Lambda(def) => Rc::clone(def),
        _ => panic!("expected a lambda"),
    }
}

#[test]
fn test_lambda_captures_enclosing_local() {
    let analysis = analyze_bare(
        "proc main() {
            val k = 10;
            val add = -> (x: int) in x + k;
            val r = add(1);
        }",
    )
    .unwrap();
    let main = function(&analysis, "main");

    assert_eq!(init_type(&analysis, "main", 1).to_string(), "func(int) : int");
    assert_eq!(init_type(&analysis, "main", 2), Type::int());

    let lambda = lambda_of(&init_value(&analysis, "main", 1));
    let main_scope = main.body.get_scope().unwrap();
    let lambda_scope = lambda.get_scope().unwrap();
    match lambda_scope.enclosing.upgrade() {
        Some(Scope::Local(local)) => assert!(Rc::ptr_eq(&local, &main_scope)),
        _ => panic!("expected the lambda to be enclosed by main's block"),
    }

    let Stmt::Return(ret) = &lambda.body.stmts[0] else {
        panic!("expected a return statement");
    };
    let ExprKind::Binary { rhs, .. } = &ret.values[0].kind else {
        panic!("expected a binary expression");
    };
    let captured = rhs.as_var_ref().unwrap().symbol.get().unwrap().as_var().unwrap();
    assert!(Rc::ptr_eq(&captured, &main_scope.vars.borrow()[0]));

    assert_eq!(analysis.global_scope.lambdas.borrow().len(), 1);
    assert_eq!(analysis.global_scope.lambda_scopes.borrow().len(), 1);
}

#[test]
fn test_lambda_params_from_declared_type() {
    let analysis = analyze_bare(
        "proc main() {
            val inc: func(int) : int = -> n in n + 1;
            val v = inc(2);
            val show: proc(int) = -> (n: int) { val m = n; };
        }",
    )
    .unwrap();

    let inc = lambda_of(&init_value(&analysis, "main", 0));
    let symbol = inc.get_scope().unwrap().get_func().unwrap();
    assert_eq!(symbol.param_types(), vec![Type::int()]);
    assert_eq!(symbol.get_return_type(), Some(&Type::int()));
    assert_eq!(init_type(&analysis, "main", 1), Type::int());
    assert_eq!(init_type(&analysis, "main", 2).to_string(), "proc(int)");
}

#[test]
fn test_lambda_param_without_type_is_not_inferred() {
    let error = analyze_bare("proc main() { val f = -> x in x; }").unwrap_err();

    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::TypeNotInferred { name: "x".to_string() }
    );
}

#[test]
fn test_lambda_return_stays_inside_lambda() {
    let analysis = analyze_bare(
        "func outer(): int {
            val f = -> (s: string) { return s; };
            return 1;
         }
         func apply(g: func(int) : int, v: int): int { return g(v); }
         proc main() { val r = apply(-> (n: int) in n * 2, 3); }",
    )
    .unwrap();

    assert_eq!(init_type(&analysis, "outer", 0).to_string(), "func(string) : string");
    assert_eq!(init_type(&analysis, "main", 0), Type::int());
}

#[test]
fn test_lambda_in_template_is_copied_per_instance() {
    let analysis = analyze_bare(
        "func wrap(x) { val g = -> in x; return g(); }
         proc main() { val a = wrap(1); val b = wrap(\"s\"); }",
    )
    .unwrap();

    assert_eq!(init_type(&analysis, "main", 0), Type::int());
    assert_eq!(init_type(&analysis, "main", 1), Type::string());
    assert_eq!(analysis.global_scope.lambdas.borrow().len(), 2);
    assert!(analysis.dump_scopes().contains("lambda lambda."));
}

#[test]
fn test_symbol_literal_type() {
    let analysis = analyze_bare("proc main() { val s = :ready; }").unwrap();

    assert_eq!(init_type(&analysis, "main", 0), Type::symbol());
    assert_eq!(Type::symbol().to_string(), "symbol");
}

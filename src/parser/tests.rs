//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Function, procedure and constant definitions
//! - Initialization and assignment statements
//! - Expressions and operator precedence
//! - Control flow statements
//! - Syntax error positions

use std::rc::Rc;

use super::parser::parse;
use crate::{
    ast::{
        ast::{GlobalDefinition, Inu, Node},
        expressions::{BinaryOp, ExprKind, Literal},
        statements::{FuncKind, Stmt},
        types::TypeNodeKind,
    },
    errors::errors::{Error, ErrorKind},
    lexer::lexer::tokenize,
};

fn parse_source(source: &str) -> Result<Rc<Inu>, Error> {
    let tokens = tokenize(source.to_string(), Some("test.dachs".to_string()))?;
    parse(tokens, Rc::new("test.dachs".to_string()))
}

fn body_of(source: &str) -> Vec<Stmt> {
    let program = parse_source(source).unwrap();
    let def = program.functions().next().unwrap();
    def.body.stmts.clone()
}

#[test]
fn test_parse_function_definition() {
    let program = parse_source("func add(a: int, b: int): int { return a + b; }").unwrap();

    assert_eq!(program.definitions.len(), 1);
    let def = program.functions().next().unwrap();
    assert_eq!(def.kind, FuncKind::Func);
    assert_eq!(def.name, "add");
    assert_eq!(def.params.len(), 2);
    assert!(def.return_type.is_some());
    assert!(!def.is_template());
}

#[test]
fn test_parse_template_function() {
    let program = parse_source("func id(x) { return x; }").unwrap();
    let def = program.functions().next().unwrap();

    assert!(def.is_template());
    assert!(def.params[0].param_type.is_none());
}

#[test]
fn test_parse_procedure_with_ensure() {
    let program = parse_source("proc p(var x: int) { x += 1; } ensure { println(1); }").unwrap();
    let def = program.functions().next().unwrap();

    assert_eq!(def.kind, FuncKind::Proc);
    assert!(def.params[0].is_var);
    assert!(def.ensure_body.is_some());
}

#[test]
fn test_parse_procedure_return_type_is_rejected() {
    let result = parse_source("proc p(): int { }");

    assert!(result.is_err());
}

#[test]
fn test_parse_constant_definition() {
    let program = parse_source("const PI: float = 3.14;").unwrap();

    match &program.definitions[0] {
        GlobalDefinition::Constant(constant) => {
            assert_eq!(constant.decls[0].name, "PI");
            assert!(constant.decls[0].explicit_type.is_some());
            assert_eq!(constant.values.len(), 1);
        }
        _ => panic!("expected a constant definition"),
    }
}

#[test]
fn test_parse_initialize_statements() {
    let stmts = body_of("proc main() { var total = 0; val xs: [int] = [1, 2, 3]; val a, b = 1, 2; }");

    match &stmts[0] {
        Stmt::Initialize(init) => {
            assert!(init.decls[0].is_var);
            assert_eq!(init.decls[0].name, "total");
        }
        _ => panic!("expected an initialize statement"),
    }

    match &stmts[1] {
        Stmt::Initialize(init) => {
            assert!(!init.decls[0].is_var);
            let ty = init.decls[0].explicit_type.as_ref().unwrap();
            assert!(matches!(ty.kind, TypeNodeKind::Array(_)));
        }
        _ => panic!("expected an initialize statement"),
    }

    match &stmts[2] {
        Stmt::Initialize(init) => {
            assert_eq!(init.decls.len(), 2);
            assert_eq!(init.values.len(), 2);
        }
        _ => panic!("expected an initialize statement"),
    }
}

#[test]
fn test_parse_assignment_marks_lhs() {
    let stmts = body_of("proc main() { var a = 1; a, b = 2, 3; a += 1; }");

    match &stmts[1] {
        Stmt::Assign(assign) => {
            assert_eq!(assign.assignees.len(), 2);
            assert!(assign.operator.is_none());
            let var_ref = assign.assignees[0].as_var_ref().unwrap();
            assert!(var_ref.is_lhs_of_assignment.get());
        }
        _ => panic!("expected an assignment"),
    }

    match &stmts[2] {
        Stmt::Assign(assign) => assert_eq!(assign.operator, Some(BinaryOp::Add)),
        _ => panic!("expected a compound assignment"),
    }
}

#[test]
fn test_parse_operator_precedence() {
    let stmts = body_of("proc main() { println(1 + 2 * 3); }");

    let Stmt::Expression(expr) = &stmts[0] else {
        panic!("expected an expression statement");
    };
    let ExprKind::Call(call) = &expr.kind else {
        panic!("expected a call");
    };
    let ExprKind::Binary { op, rhs, .. } = &call.args[0].kind else {
        panic!("expected a binary expression");
    };

    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn test_parse_unary_binds_tighter_than_binary() {
    let stmts = body_of("proc main() { -a + b; }");

    let Stmt::Expression(expr) = &stmts[0] else {
        panic!("expected an expression statement");
    };
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
}

#[test]
fn test_parse_literals() {
    let stmts = body_of("proc main() { f('a', 1.5, true, \"s\", 42, 7u, (), (1, 2), {1 => 2}); }");

    let Stmt::Expression(expr) = &stmts[0] else {
        panic!("expected an expression statement");
    };
    let ExprKind::Call(call) = &expr.kind else {
        panic!("expected a call");
    };

    assert!(matches!(call.args[0].kind, ExprKind::Literal(Literal::Char('a'))));
    assert!(matches!(call.args[1].kind, ExprKind::Literal(Literal::Float(_))));
    assert!(matches!(call.args[2].kind, ExprKind::Literal(Literal::Bool(true))));
    assert!(matches!(call.args[3].kind, ExprKind::Literal(Literal::String(_))));
    assert!(matches!(call.args[4].kind, ExprKind::Literal(Literal::Int(42))));
    assert!(matches!(call.args[5].kind, ExprKind::Literal(Literal::Uint(7))));
    assert!(matches!(&call.args[6].kind, ExprKind::Tuple(elems) if elems.is_empty()));
    assert!(matches!(&call.args[7].kind, ExprKind::Tuple(elems) if elems.len() == 2));
    assert!(matches!(&call.args[8].kind, ExprKind::Dict(pairs) if pairs.len() == 1));
}

#[test]
fn test_parse_postfix_chain() {
    let stmts = body_of("proc main() { xs.foo(1)[0].size; }");

    let Stmt::Expression(expr) = &stmts[0] else {
        panic!("expected an expression statement");
    };
    let ExprKind::MemberAccess(access) = &expr.kind else {
        panic!("expected a member access");
    };
    assert_eq!(access.member, "size");
    assert!(matches!(access.receiver.kind, ExprKind::IndexAccess { .. }));
}

#[test]
fn test_parse_control_flow() {
    let stmts = body_of(
        "proc main() {
            if a { } elseif b { } else { }
            unless a { }
            case { when a { } else { } }
            case x { when 1, 2 { } else { } }
            for x in xs { }
            while a { }
            let val y = 10 in println(y);
            return if a;
        }",
    );

    assert!(matches!(&stmts[0], Stmt::If(stmt) if stmt.elseifs.len() == 1 && stmt.else_block.is_some()));
    assert!(matches!(&stmts[1], Stmt::If(_)));
    assert!(matches!(&stmts[2], Stmt::Case(stmt) if stmt.whens.len() == 1));
    assert!(matches!(&stmts[3], Stmt::Switch(stmt) if stmt.whens[0].0.len() == 2));
    assert!(matches!(&stmts[4], Stmt::For(stmt) if stmt.iter_vars.len() == 1));
    assert!(matches!(&stmts[5], Stmt::While(_)));
    assert!(matches!(&stmts[6], Stmt::Let(stmt) if stmt.inits.len() == 1));
    assert!(matches!(&stmts[7], Stmt::PostfixIf(stmt) if matches!(stmt.body, Stmt::Return(_))));
}

#[test]
fn test_parse_expression_forms() {
    let stmts = body_of(
        "proc main() { val a = if c then 1 else 2; val b = x as float; val c = [] : [int]; val r = 1..n + 1; }",
    );

    let value_kind = |stmt: &Stmt| match stmt {
        Stmt::Initialize(init) => init.values[0].kind.describe(),
        _ => panic!("expected an initialize statement"),
    };

    assert_eq!(value_kind(&stmts[0]), "IfExpr(if)");
    assert_eq!(value_kind(&stmts[1]), "Cast");
    assert_eq!(value_kind(&stmts[2]), "Typed");
    assert_eq!(value_kind(&stmts[3]), "Range(..)");
}

#[test]
fn test_parse_symbol_literal() {
    let stmts = body_of("proc main() { val s = :ready; }");

    let Stmt::Initialize(init) = &stmts[0] else {
        panic!("expected an initialize statement");
    };
    assert!(matches!(&init.values[0].kind, ExprKind::Literal(Literal::Symbol(name)) if name == "ready"));
}

#[test]
fn test_parse_lambda_forms() {
    let stmts = body_of(
        "proc main() {
            val inc = -> x in x + 1;
            val add = -> (a: int, b: int) { return a + b; };
            val zero = -> in 0;
        }",
    );

    let lambda = |stmt: &Stmt| match stmt {
        Stmt::Initialize(init) => match &init.values[0].kind {
            ExprKind::Lambda(def) => Rc::clone(def),
            _ => panic!("expected a lambda"),
        },
        _ => panic!("expected an initialize statement"),
    };

    let inc = lambda(&stmts[0]);
    assert_eq!(inc.kind, FuncKind::Lambda);
    assert_eq!(inc.params.len(), 1);
    assert!(inc.params[0].param_type.is_none());
    assert!(matches!(&inc.body.stmts[..], [Stmt::Return(ret)] if ret.values.len() == 1));
    assert!(inc.name.starts_with("lambda."));

    let add = lambda(&stmts[1]);
    assert_eq!(add.params.len(), 2);
    assert!(add.params.iter().all(|param| param.param_type.is_some()));
    assert_eq!(add.body.stmts.len(), 1);

    let zero = lambda(&stmts[2]);
    assert!(zero.params.is_empty());
}

#[test]
fn test_parse_types() {
    let program = parse_source(
        "func f(a: {string => int}, b: (int, float), c: func(int) : int, d: proc(int), e: &int, g: int?, h: range(int)) { }",
    )
    .unwrap();
    let def = program.functions().next().unwrap();
    let rendered: Vec<String> = def
        .params
        .iter()
        .map(|param| param.param_type.as_ref().unwrap().to_string())
        .collect();

    assert_eq!(
        rendered,
        vec![
            "{string => int}",
            "(int, float)",
            "func(int) : int",
            "proc(int)",
            "&int",
            "int?",
            "range(int)",
        ]
    );
}

#[test]
fn test_node_ids_are_unique() {
    let program = parse_source("func f(a: int) { return a; } func g() { }").unwrap();
    let ids: Vec<usize> = program
        .definitions
        .iter()
        .map(|def| def.as_node().get_id())
        .collect();

    assert_ne!(ids[0], ids[1]);
    assert!(ids.iter().all(|id| *id >= 1024));
}

#[test]
fn test_parse_error_position() {
    let error = parse_source("proc main() {\n    var x = ;\n}").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::Syntax);
    assert_eq!(error.get_position().line, 2);
    assert_eq!(error.get_position().col, 13);
}

#[test]
fn test_parse_missing_semicolon() {
    let error = parse_source("proc main() { var x = 1 }").unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::Syntax);
    assert_eq!(error.get_position().col, 25);
}

#[test]
fn test_parse_rejects_top_level_statement() {
    let error = parse_source("var x = 1;").unwrap_err();

    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

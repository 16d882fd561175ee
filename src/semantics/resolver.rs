//! Second pass: resolves every name, fills every expression's type slot and
//! checks statements.
//!
//! Constant initializers are resolved first, in declaration order, then the
//! body of every non-template function. A constant read before its turn is
//! resolved on demand, and so is a function whose return type is still
//! unknown when someone calls it. Template bodies are only ever analyzed
//! through their instances. Lambda bodies are analyzed where they appear.

use std::{
    collections::HashMap,
    fmt::Display,
    rc::{Rc, Weak},
};

use log::{debug, trace};

use crate::{
    ast::{
        ast::{Inu, Node},
        expressions::{BinaryOp, Call, Expr, ExprKind, ExprRef, IfExpr, Literal, MemberAccess, UnaryOp, VarRef},
        statements::{
            AssignStmt, CaseStmt, ConstantDefinition, ForStmt, FuncKind, FunctionDefinition, IfStmt,
            InitializeStmt, LetStmt, ReturnStmt, StatementBlock, Stmt, SwitchStmt,
        },
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{
    overload::{score_params, select_overload},
    registrar::declare_function,
    scope::{GlobalScope, Scope},
    symbol::{FuncSymbol, SymbolRef, VarSymbol},
    types::{BuiltinType, Type},
};

/// How many instances of one template may be under analysis at once. Past
/// this the template is taken to recurse on ever-growing argument types.
pub const INSTANTIATION_LIMIT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    InProgress,
    Done,
}

struct Resolver {
    global: Rc<GlobalScope>,
    /// Keyed by the id of the function or constant definition.
    progress: HashMap<usize, Progress>,
    /// One instance per template definition and argument-type list.
    instances: HashMap<(usize, Vec<Type>), Rc<FuncSymbol>>,
    /// Instances under analysis, per template definition id.
    instantiating: HashMap<usize, usize>,
    /// The definition declaring each constant name.
    constant_defs: HashMap<String, Rc<ConstantDefinition>>,
}

pub fn resolve(program: &Inu, global: &Rc<GlobalScope>) -> Result<(), Error> {
    let mut constant_defs = HashMap::new();
    for def in program.constants() {
        for decl in &def.decls {
            constant_defs.insert(decl.name.clone(), Rc::clone(def));
        }
    }

    let mut resolver = Resolver {
        global: Rc::clone(global),
        progress: HashMap::new(),
        instances: HashMap::new(),
        instantiating: HashMap::new(),
        constant_defs,
    };

    for constant in program.constants() {
        if resolver.progress.contains_key(&constant.get_id()) {
            continue;
        }
        resolver.resolve_constants(constant)?;
    }

    for def in program.functions() {
        if def.is_template() || resolver.progress.contains_key(&def.get_id()) {
            continue;
        }
        resolver.analyze_function(def)?;
    }

    Ok(())
}

fn at(node: &dyn Node) -> Position {
    node.get_span().start.clone()
}

fn type_error(expected: impl Display, received: &Type, node: &dyn Node) -> Error {
    Error::new(
        ErrorImpl::TypeMatchError {
            expected: expected.to_string(),
            received: received.to_string(),
        },
        at(node),
    )
}

fn expect_type(expected: &Type, received: &Type, node: &dyn Node) -> Result<(), Error> {
    if expected == received {
        Ok(())
    } else {
        Err(type_error(expected, received, node))
    }
}

fn not_inferred(name: &str, node: &dyn Node) -> Error {
    Error::new(
        ErrorImpl::TypeNotInferred {
            name: String::from(name),
        },
        at(node),
    )
}

fn join_types(types: &[Type]) -> String {
    types
        .iter()
        .map(|ty| ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn literal_type(literal: &Literal) -> Type {
    match literal {
        Literal::Char(_) => Type::char(),
        Literal::Float(_) => Type::float(),
        Literal::Bool(_) => Type::bool(),
        Literal::String(_) => Type::string(),
        Literal::Int(_) => Type::int(),
        Literal::Uint(_) => Type::uint(),
        Literal::Symbol(_) => Type::symbol(),
    }
}

/// Members every value of a type has without a function declaring them.
fn builtin_member(receiver: &Type, member: &str) -> Option<Type> {
    match (receiver, member) {
        (Type::Array(_) | Type::Dict(..) | Type::Builtin(BuiltinType::String), "size") => {
            Some(Type::uint())
        }
        (Type::Tuple(elems), "first") => elems.first().cloned(),
        (Type::Tuple(elems), "second") => elems.get(1).cloned(),
        (Type::Tuple(elems), "last") => elems.last().cloned(),
        _ => None,
    }
}

/// Result type of a binary operator applied to two operands of type
/// `operand`, or `None` when the operator does not apply.
fn binary_result(op: BinaryOp, operand: &Type) -> Option<Type> {
    if op.is_comparison() {
        Some(Type::bool())
    } else if op.is_logical() {
        (*operand == Type::bool()).then(Type::bool)
    } else if op.is_arithmetic() {
        let applies = operand.is_numeric() || (op == BinaryOp::Add && *operand == Type::string());
        applies.then(|| operand.clone())
    } else {
        operand.is_integral().then(|| operand.clone())
    }
}

fn operand_description(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::And | BinaryOp::Or => "bool",
        BinaryOp::Add => "number or string",
        op if op.is_arithmetic() => "number",
        _ => "integer",
    }
}

fn define_local(
    scope: &Scope,
    name: &str,
    ty: Type,
    is_var: bool,
    node: &dyn Node,
) -> Result<Rc<VarSymbol>, Error> {
    let Scope::Local(local) = scope else {
        unreachable!("local variable {:?} declared outside a block", name)
    };

    let symbol = VarSymbol::new(name, Some(ty), is_var, scope.downgrade());
    trace!("Defining {}", symbol);

    local.define_var(Rc::clone(&symbol)).map_err(|_| {
        Error::new(
            ErrorImpl::VariableAlreadyDeclared {
                variable: String::from(name),
            },
            at(node),
        )
    })?;

    Ok(symbol)
}

fn check_assignable(target: &Expr) -> Result<(), Error> {
    let name = match &target.kind {
        ExprKind::IndexAccess { .. } | ExprKind::MemberAccess(_) => return Ok(()),
        ExprKind::VarRef(var_ref) => {
            let var = var_ref.symbol.get().and_then(SymbolRef::as_var);
            if var.is_some_and(|var| var.is_var) {
                return Ok(());
            }
            var_ref.name.clone()
        }
        kind => kind.describe(),
    };

    Err(Error::new(
        ErrorImpl::ImmutableAssignment { variable: name },
        at(target),
    ))
}

impl Resolver {
    // DEFINITIONS

    fn resolve_constants(&mut self, def: &ConstantDefinition) -> Result<(), Error> {
        self.progress.insert(def.get_id(), Progress::InProgress);
        let scope = Scope::Global(Rc::clone(&self.global));

        let mut symbols = Vec::with_capacity(def.decls.len());
        for decl in &def.decls {
            let symbol = self.global.lookup_constant(&decl.name).ok_or_else(|| {
                Error::new(
                    ErrorImpl::UnresolvedName {
                        name: decl.name.clone(),
                    },
                    at(&**decl),
                )
            })?;
            symbols.push(symbol);
        }

        let hints: Vec<Option<Type>> = symbols.iter().map(|s| s.get_type().cloned()).collect();
        let types = self.resolve_values(&def.values, &hints, &scope, def)?;

        for ((decl, symbol), ty) in def.decls.iter().zip(&symbols).zip(types) {
            match symbol.get_type() {
                Some(expected) => expect_type(expected, &ty, &**decl)?,
                None => {
                    debug!("Inferred type {} for constant {}", ty, symbol.name);
                    let _ = symbol.ty.set(ty);
                }
            }
        }

        self.progress.insert(def.get_id(), Progress::Done);
        Ok(())
    }

    /// Resolves the definition of constant `name` ahead of its turn. A
    /// definition already in progress is left alone; the reader then finds
    /// the type still missing.
    fn demand_constant(&mut self, name: &str) -> Result<(), Error> {
        let Some(def) = self.constant_defs.get(name).cloned() else {
            return Ok(());
        };

        if self.progress.contains_key(&def.get_id()) {
            return Ok(());
        }
        debug!("Resolving {} on demand", def.describe());
        self.resolve_constants(&def)
    }

    fn analyze_function(&mut self, def: &Rc<FunctionDefinition>) -> Result<(), Error> {
        debug!("Resolving {}", def.describe());
        self.progress.insert(def.get_id(), Progress::InProgress);

        let scope = def
            .get_scope()
            .expect("function scope is registered before resolution");
        let func = scope
            .get_func()
            .expect("function symbol outlives its scope");
        let scope = Scope::Function(scope);

        self.resolve_block(&def.body, &scope)?;
        if let Some(ensure) = &def.ensure_body {
            self.resolve_block(ensure, &scope)?;
        }

        if func.kind.returns_value() && func.get_return_type().is_none() {
            debug!("{} has no return value", func.name);
            let _ = func.ret_type.set(Type::unit());
        }

        self.progress.insert(def.get_id(), Progress::Done);
        Ok(())
    }

    /// Type of a call to `func`, analyzing its body first if its return
    /// type has to be inferred.
    fn call_result_type(&mut self, func: &Rc<FuncSymbol>, node: &dyn Node) -> Result<Type, Error> {
        if func.kind == FuncKind::Proc {
            return Ok(Type::unit());
        }
        if let Some(ret) = func.get_return_type() {
            return Ok(ret.clone());
        }

        if !func.is_builtin {
            let def = func.get_declaration();
            let progress = self.progress.get(&def.get_id()).copied();
            match progress {
                Some(Progress::InProgress) => return Err(not_inferred(&func.name, node)),
                Some(Progress::Done) => {}
                None => self.analyze_function(&def)?,
            }
        }

        Ok(func.get_return_type().cloned().unwrap_or_else(Type::unit))
    }

    fn func_value_type(&mut self, func: &Rc<FuncSymbol>, node: &dyn Node) -> Result<Type, Error> {
        let ret = match func.kind {
            FuncKind::Proc => None,
            FuncKind::Func | FuncKind::Lambda => Some(Box::new(self.call_result_type(func, node)?)),
        };

        Ok(Type::Func {
            params: func.param_types(),
            ret,
        })
    }

    fn instantiate(
        &mut self,
        template: &Rc<FuncSymbol>,
        args: &[Type],
        node: &dyn Node,
    ) -> Result<Rc<FuncSymbol>, Error> {
        let def = template.get_declaration();
        let key = (def.get_id(), args.to_vec());
        if let Some(instance) = self.instances.get(&key) {
            return Ok(Rc::clone(instance));
        }

        let depth = self.instantiating.get(&def.get_id()).copied().unwrap_or(0);
        if depth >= INSTANTIATION_LIMIT {
            return Err(Error::new(
                ErrorImpl::InstantiationLimit {
                    function: template.name.clone(),
                    limit: INSTANTIATION_LIMIT,
                },
                at(node),
            ));
        }

        let instance_def = def.instantiate();
        def.instantiated.borrow_mut().push(Rc::clone(&instance_def));

        let global = Scope::Global(Rc::clone(&self.global));
        let (scope, symbol) = declare_function(&instance_def, &global, Some(args))?;
        debug!("Instantiated {} as {}", template, symbol);

        self.global.instances.borrow_mut().push(Rc::clone(&symbol));
        self.global.instance_scopes.borrow_mut().push(scope);
        self.instances.insert(key, Rc::clone(&symbol));

        self.instantiating.insert(def.get_id(), depth + 1);
        let analyzed = self.analyze_function(&instance_def);
        self.instantiating.insert(def.get_id(), depth);

        analyzed?;
        Ok(symbol)
    }

    /// Global overload resolution for `name(args)`. Template candidates are
    /// replaced by their instance for `args`.
    fn call_function(
        &mut self,
        name: &str,
        args: &[Type],
        node: &dyn Node,
    ) -> Result<(Rc<FuncSymbol>, Type), Error> {
        let candidates = self.global.lookup_functions(name);
        if candidates.is_empty() {
            return Err(Error::new(
                ErrorImpl::UnresolvedName {
                    name: String::from(name),
                },
                at(node),
            ));
        }

        let Some((func, score)) = select_overload(candidates.iter(), name, args) else {
            return Err(Error::new(
                ErrorImpl::NoMatchingOverload {
                    function: String::from(name),
                    arguments: join_types(args),
                },
                at(node),
            ));
        };
        debug!("Resolved {}({}) to {} with score {}", name, join_types(args), func, score);

        let func = if func.is_template() && !func.is_builtin {
            self.instantiate(&func, args, node)?
        } else {
            func
        };

        let ty = self.call_result_type(&func, node)?;
        Ok((func, ty))
    }

    // STATEMENTS

    fn open_block(&self, block: &Rc<StatementBlock>, parent: &Scope) -> Scope {
        let local = parent.open_local(Rc::downgrade(block));
        let _ = block.scope.set(Rc::downgrade(&local));
        Scope::Local(local)
    }

    fn resolve_block(&mut self, block: &Rc<StatementBlock>, parent: &Scope) -> Result<(), Error> {
        let scope = self.open_block(block, parent);
        self.resolve_stmts(&block.stmts, &scope)
    }

    fn resolve_stmts(&mut self, stmts: &[Stmt], scope: &Scope) -> Result<(), Error> {
        for stmt in stmts {
            self.resolve_stmt(stmt, scope)?;
        }
        Ok(())
    }

    fn resolve_stmt(&mut self, stmt: &Stmt, scope: &Scope) -> Result<(), Error> {
        trace!("Resolving {}", stmt.as_node().describe());

        match stmt {
            Stmt::Initialize(init) => self.resolve_initialize(init, scope),
            Stmt::Assign(assign) => self.resolve_assign(assign, scope),
            Stmt::If(if_stmt) => self.resolve_if(if_stmt, scope),
            Stmt::Return(ret) => self.resolve_return(ret, scope),
            Stmt::Case(case) => self.resolve_case(case, scope),
            Stmt::Switch(switch) => self.resolve_switch(switch, scope),
            Stmt::For(for_stmt) => self.resolve_for(for_stmt, scope),
            Stmt::While(while_stmt) => {
                self.resolve_condition(&while_stmt.condition, scope)?;
                self.resolve_block(&while_stmt.body, scope)
            }
            Stmt::PostfixIf(postfix) => {
                self.resolve_stmt(&postfix.body, scope)?;
                self.resolve_condition(&postfix.condition, scope)
            }
            Stmt::Let(let_stmt) => self.resolve_let(let_stmt, scope),
            Stmt::Expression(expr) => self.resolve_expr(expr, scope, None).map(|_| ()),
        }
    }

    fn resolve_condition(&mut self, condition: &ExprRef, scope: &Scope) -> Result<(), Error> {
        let ty = self.resolve_expr(condition, scope, Some(&Type::bool()))?;
        expect_type(&Type::bool(), &ty, &**condition)
    }

    /// Resolves right-hand sides against `hints.len()` targets. A single
    /// tuple value is destructured across several targets.
    fn resolve_values(
        &mut self,
        values: &[ExprRef],
        hints: &[Option<Type>],
        scope: &Scope,
        node: &dyn Node,
    ) -> Result<Vec<Type>, Error> {
        if values.len() == hints.len() {
            let mut types = Vec::with_capacity(values.len());
            for (value, hint) in values.iter().zip(hints) {
                types.push(self.resolve_expr(value, scope, hint.as_ref())?);
            }
            return Ok(types);
        }

        if let [value] = values {
            let hint = hints
                .iter()
                .cloned()
                .collect::<Option<Vec<_>>>()
                .map(Type::Tuple);
            let ty = self.resolve_expr(value, scope, hint.as_ref())?;

            return match ty {
                Type::Tuple(elems) if elems.len() == hints.len() => Ok(elems),
                Type::Tuple(elems) => Err(Error::new(
                    ErrorImpl::ArityMismatch {
                        expected: hints.len(),
                        received: elems.len(),
                    },
                    at(&**value),
                )),
                _ => Err(Error::new(
                    ErrorImpl::ArityMismatch {
                        expected: hints.len(),
                        received: 1,
                    },
                    at(&**value),
                )),
            };
        }

        Err(Error::new(
            ErrorImpl::ArityMismatch {
                expected: hints.len(),
                received: values.len(),
            },
            at(node),
        ))
    }

    fn resolve_initialize(&mut self, init: &InitializeStmt, scope: &Scope) -> Result<(), Error> {
        let mut explicit = Vec::with_capacity(init.decls.len());
        for decl in &init.decls {
            explicit.push(match &decl.explicit_type {
                Some(node) => Some(Type::from_node(node)?),
                None => None,
            });
        }

        let types = if init.values.is_empty() {
            init.decls
                .iter()
                .zip(&explicit)
                .map(|(decl, ty)| ty.clone().ok_or_else(|| not_inferred(&decl.name, &**decl)))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            self.resolve_values(&init.values, &explicit, scope, init)?
        };

        for ((decl, expected), ty) in init.decls.iter().zip(&explicit).zip(types) {
            if let Some(expected) = expected {
                expect_type(expected, &ty, &**decl)?;
            }
            if decl.is_ignored() {
                continue;
            }

            let symbol = define_local(scope, &decl.name, ty, decl.is_var, &**decl)?;
            let _ = decl.symbol.set(Rc::downgrade(&symbol));
        }

        Ok(())
    }

    fn resolve_assign(&mut self, assign: &AssignStmt, scope: &Scope) -> Result<(), Error> {
        if let Some(op) = assign.operator {
            let ([target], [value]) = (assign.assignees.as_slice(), assign.values.as_slice()) else {
                return Err(Error::new(
                    ErrorImpl::ArityMismatch {
                        expected: 1,
                        received: assign.values.len(),
                    },
                    at(assign),
                ));
            };

            let target_ty = self.resolve_expr(target, scope, None)?;
            let value_ty = self.resolve_expr(value, scope, Some(&target_ty))?;
            expect_type(&target_ty, &value_ty, &**value)?;
            if binary_result(op, &target_ty).is_none() {
                return Err(type_error(operand_description(op), &target_ty, &**target));
            }
            return check_assignable(target);
        }

        // `_` targets take whatever is assigned to them.
        let mut hints = Vec::with_capacity(assign.assignees.len());
        for assignee in &assign.assignees {
            let ignored = assignee
                .as_var_ref()
                .is_some_and(|var_ref| var_ref.name == "_" && scope.lookup_var("_").is_none());
            hints.push(if ignored {
                None
            } else {
                Some(self.resolve_expr(assignee, scope, None)?)
            });
        }

        let types = self.resolve_values(&assign.values, &hints, scope, assign)?;

        for ((assignee, expected), ty) in assign.assignees.iter().zip(&hints).zip(types) {
            match expected {
                Some(expected) => {
                    expect_type(expected, &ty, &**assignee)?;
                    check_assignable(assignee)?;
                }
                None => assignee.set_type(ty),
            }
        }

        Ok(())
    }

    fn resolve_if(&mut self, stmt: &IfStmt, scope: &Scope) -> Result<(), Error> {
        self.resolve_condition(&stmt.condition, scope)?;
        self.resolve_block(&stmt.then_block, scope)?;

        for (condition, block) in &stmt.elseifs {
            self.resolve_condition(condition, scope)?;
            self.resolve_block(block, scope)?;
        }

        if let Some(block) = &stmt.else_block {
            self.resolve_block(block, scope)?;
        }
        Ok(())
    }

    fn resolve_return(&mut self, ret: &ReturnStmt, scope: &Scope) -> Result<(), Error> {
        let Some(func) = scope.enclosing_function().and_then(|scope| scope.get_func()) else {
            return Err(Error::new(
                ErrorImpl::InvalidReturn {
                    message: String::from("return outside of a function"),
                },
                at(ret),
            ));
        };

        let hints: Vec<Option<Type>> = match (func.get_return_type(), ret.values.len()) {
            (Some(Type::Tuple(elems)), n) if n > 1 && elems.len() == n => {
                elems.iter().cloned().map(Some).collect()
            }
            (Some(ty), 1) => vec![Some(ty.clone())],
            (_, n) => vec![None; n],
        };

        let mut types = Vec::with_capacity(ret.values.len());
        for (value, hint) in ret.values.iter().zip(&hints) {
            types.push(self.resolve_expr(value, scope, hint.as_ref())?);
        }
        let ty = if types.len() == 1 {
            types.remove(0)
        } else {
            Type::Tuple(types)
        };

        match func.kind {
            FuncKind::Proc if !ty.is_unit() => Err(Error::new(
                ErrorImpl::InvalidReturn {
                    message: format!("procedure `{}` cannot return a value", func.name),
                },
                at(ret),
            )),
            FuncKind::Proc => Ok(()),
            FuncKind::Func | FuncKind::Lambda => match func.get_return_type() {
                Some(expected) => expect_type(expected, &ty, ret),
                None => {
                    debug!("Inferred return type {} for {}", ty, func.name);
                    let _ = func.ret_type.set(ty);
                    Ok(())
                }
            },
        }
    }

    fn resolve_case(&mut self, case: &CaseStmt, scope: &Scope) -> Result<(), Error> {
        for (condition, block) in &case.whens {
            self.resolve_condition(condition, scope)?;
            self.resolve_block(block, scope)?;
        }

        if let Some(block) = &case.else_block {
            self.resolve_block(block, scope)?;
        }
        Ok(())
    }

    fn resolve_switch(&mut self, switch: &SwitchStmt, scope: &Scope) -> Result<(), Error> {
        let target = self.resolve_expr(&switch.target, scope, None)?;

        for (values, block) in &switch.whens {
            for value in values {
                let ty = self.resolve_expr(value, scope, Some(&target))?;
                expect_type(&target, &ty, &**value)?;
            }
            self.resolve_block(block, scope)?;
        }

        if let Some(block) = &switch.else_block {
            self.resolve_block(block, scope)?;
        }
        Ok(())
    }

    fn resolve_for(&mut self, stmt: &ForStmt, scope: &Scope) -> Result<(), Error> {
        let range = self.resolve_expr(&stmt.range, scope, None)?;

        let elem = match &range {
            Type::Array(elem) => (**elem).clone(),
            Type::Builtin(BuiltinType::String) => Type::char(),
            Type::Dict(key, value) => Type::Tuple(vec![(**key).clone(), (**value).clone()]),
            Type::Class { name, args } if name == "range" && args.len() == 1 => args[0].clone(),
            _ => return Err(type_error("iterable value", &range, &*stmt.range)),
        };

        let received = match &elem {
            Type::Tuple(elems) => elems.len(),
            _ => 1,
        };
        let var_types = match (stmt.iter_vars.len(), elem) {
            (1, elem) => vec![elem],
            (count, Type::Tuple(elems)) if elems.len() == count => elems,
            (count, _) => {
                return Err(Error::new(
                    ErrorImpl::ArityMismatch {
                        expected: count,
                        received,
                    },
                    at(stmt),
                ))
            }
        };

        let body = self.open_block(&stmt.body, scope);
        for (param, ty) in stmt.iter_vars.iter().zip(var_types) {
            if let Some(node) = &param.param_type {
                expect_type(&Type::from_node(node)?, &ty, &**param)?;
            }
            if param.name == "_" {
                continue;
            }

            let symbol = define_local(&body, &param.name, ty, param.is_var, &**param)?;
            let _ = param.symbol.set(Rc::downgrade(&symbol));
        }

        self.resolve_stmts(&stmt.body.stmts, &body)
    }

    fn resolve_let(&mut self, stmt: &LetStmt, scope: &Scope) -> Result<(), Error> {
        let local = scope.open_local(Weak::new());
        let _ = stmt.scope.set(Rc::downgrade(&local));
        let scope = Scope::Local(local);

        for init in &stmt.inits {
            self.resolve_initialize(init, &scope)?;
        }
        self.resolve_stmt(&stmt.child, &scope)
    }

    // EXPRESSIONS

    /// Resolves `expr` and writes its type slot. `hint` is the type the
    /// context expects; only empty literals depend on it.
    fn resolve_expr(&mut self, expr: &ExprRef, scope: &Scope, hint: Option<&Type>) -> Result<Type, Error> {
        let ty = match &expr.kind {
            ExprKind::Literal(literal) => literal_type(literal),
            ExprKind::Array(elems) => self.resolve_array(expr, elems, scope, hint)?,
            ExprKind::Tuple(elems) => {
                let hints = match hint {
                    Some(Type::Tuple(hints)) if hints.len() == elems.len() => Some(hints),
                    _ => None,
                };

                let mut types = Vec::with_capacity(elems.len());
                for (index, elem) in elems.iter().enumerate() {
                    types.push(self.resolve_expr(elem, scope, hints.map(|hints| &hints[index]))?);
                }
                Type::Tuple(types)
            }
            ExprKind::Dict(pairs) => self.resolve_dict(expr, pairs, scope, hint)?,
            ExprKind::VarRef(var_ref) => self.resolve_var_ref(expr, var_ref, scope)?,
            ExprKind::MemberAccess(access) => self.resolve_member_access(expr, access, scope)?,
            ExprKind::IndexAccess { receiver, index } => self.resolve_index(receiver, index, scope)?,
            ExprKind::Call(call) => self.resolve_call(expr, call, scope)?,
            ExprKind::Unary { op, operand } => {
                let ty = self.resolve_expr(operand, scope, hint)?;
                match op {
                    UnaryOp::Not if ty == Type::bool() => ty,
                    UnaryOp::Not => return Err(type_error("bool", &ty, &**operand)),
                    UnaryOp::Neg | UnaryOp::Plus if ty.is_numeric() => ty,
                    UnaryOp::Neg | UnaryOp::Plus => return Err(type_error("number", &ty, &**operand)),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.resolve_expr(lhs, scope, None)?;
                let rhs_ty = self.resolve_expr(rhs, scope, Some(&lhs_ty))?;
                expect_type(&lhs_ty, &rhs_ty, &**rhs)?;
                binary_result(*op, &lhs_ty)
                    .ok_or_else(|| type_error(operand_description(*op), &lhs_ty, &**lhs))?
            }
            ExprKind::Cast { expr: inner, target } => {
                self.resolve_expr(inner, scope, None)?;
                Type::from_node(target)?
            }
            ExprKind::Typed { expr: inner, ty } => {
                let ty = Type::from_node(ty)?;
                let actual = self.resolve_expr(inner, scope, Some(&ty))?;
                expect_type(&ty, &actual, &**inner)?;
                ty
            }
            ExprKind::If(if_expr) => self.resolve_if_expr(if_expr, scope, hint)?,
            ExprKind::Range { from, to, .. } => {
                let from_ty = self.resolve_expr(from, scope, None)?;
                let to_ty = self.resolve_expr(to, scope, Some(&from_ty))?;
                expect_type(&from_ty, &to_ty, &**to)?;
                if !from_ty.is_numeric() {
                    return Err(type_error("number", &from_ty, &**from));
                }
                Type::range(from_ty)
            }
            ExprKind::Lambda(def) => self.resolve_lambda(def, scope, hint)?,
        };

        trace!("{} : {}", expr.kind.describe(), ty);
        expr.set_type(ty.clone());
        Ok(ty)
    }

    fn resolve_array(
        &mut self,
        expr: &Expr,
        elems: &[ExprRef],
        scope: &Scope,
        hint: Option<&Type>,
    ) -> Result<Type, Error> {
        let elem_hint = match hint {
            Some(Type::Array(elem)) => Some(elem.as_ref()),
            _ => None,
        };

        let Some((first, rest)) = elems.split_first() else {
            return elem_hint
                .map(|elem| Type::array(elem.clone()))
                .ok_or_else(|| not_inferred("[]", expr));
        };

        let elem_ty = self.resolve_expr(first, scope, elem_hint)?;
        for elem in rest {
            let ty = self.resolve_expr(elem, scope, Some(&elem_ty))?;
            expect_type(&elem_ty, &ty, &**elem)?;
        }

        Ok(Type::array(elem_ty))
    }

    fn resolve_dict(
        &mut self,
        expr: &Expr,
        pairs: &[(ExprRef, ExprRef)],
        scope: &Scope,
        hint: Option<&Type>,
    ) -> Result<Type, Error> {
        let (key_hint, value_hint) = match hint {
            Some(Type::Dict(key, value)) => (Some(key.as_ref()), Some(value.as_ref())),
            _ => (None, None),
        };

        let Some(((first_key, first_value), rest)) = pairs.split_first() else {
            return match (key_hint, value_hint) {
                (Some(key), Some(value)) => Ok(Type::dict(key.clone(), value.clone())),
                _ => Err(not_inferred("{}", expr)),
            };
        };

        let key_ty = self.resolve_expr(first_key, scope, key_hint)?;
        let value_ty = self.resolve_expr(first_value, scope, value_hint)?;
        for (key, value) in rest {
            let ty = self.resolve_expr(key, scope, Some(&key_ty))?;
            expect_type(&key_ty, &ty, &**key)?;
            let ty = self.resolve_expr(value, scope, Some(&value_ty))?;
            expect_type(&value_ty, &ty, &**value)?;
        }

        Ok(Type::dict(key_ty, value_ty))
    }

    fn resolve_var_ref(&mut self, expr: &Expr, var_ref: &VarRef, scope: &Scope) -> Result<Type, Error> {
        if let Some(var) = scope.lookup_var(&var_ref.name) {
            let _ = var_ref.symbol.set(SymbolRef::Var(Rc::downgrade(&var)));
            if var.get_type().is_none() {
                self.demand_constant(&var.name)?;
            }
            return var
                .get_type()
                .cloned()
                .ok_or_else(|| not_inferred(&var_ref.name, expr));
        }

        // An ignored binding read as a value.
        if var_ref.name == "_" {
            return Ok(Type::unit());
        }

        let functions = self.global.lookup_functions(&var_ref.name);
        if functions.is_empty() {
            return Err(Error::new(
                ErrorImpl::UnresolvedName {
                    name: var_ref.name.clone(),
                },
                at(expr),
            ));
        }

        let concrete: Vec<&Rc<FuncSymbol>> = functions.iter().filter(|func| !func.is_template()).collect();
        let [func] = concrete.as_slice() else {
            return Err(Error::new(
                ErrorImpl::AmbiguousFunctionReference {
                    function: var_ref.name.clone(),
                },
                at(expr),
            ));
        };

        let func = Rc::clone(*func);
        let _ = var_ref.symbol.set(SymbolRef::Func(Rc::downgrade(&func)));
        self.func_value_type(&func, expr)
    }

    fn resolve_member_access(
        &mut self,
        expr: &Expr,
        access: &MemberAccess,
        scope: &Scope,
    ) -> Result<Type, Error> {
        let receiver = self.resolve_expr(&access.receiver, scope, None)?;
        if let Some(ty) = builtin_member(&receiver, &access.member) {
            return Ok(ty);
        }

        let (func, ty) = self.call_function(&access.member, &[receiver], expr)?;
        let _ = access.callee.set(Rc::downgrade(&func));
        Ok(ty)
    }

    fn resolve_index(&mut self, receiver: &ExprRef, index: &ExprRef, scope: &Scope) -> Result<Type, Error> {
        let receiver_ty = self.resolve_expr(receiver, scope, None)?;
        let hint = match &receiver_ty {
            Type::Dict(key, _) => Some(key.as_ref()),
            _ => None,
        };
        let index_ty = self.resolve_expr(index, scope, hint)?;

        match &receiver_ty {
            Type::Array(elem) if index_ty.is_integral() => Ok((**elem).clone()),
            Type::Builtin(BuiltinType::String) if index_ty.is_integral() => Ok(Type::char()),
            Type::Array(_) | Type::Builtin(BuiltinType::String) => {
                Err(type_error("integer", &index_ty, &**index))
            }
            Type::Dict(key, value) => {
                expect_type(key, &index_ty, &**index)?;
                Ok((**value).clone())
            }
            Type::Tuple(elems) => {
                let position = match &index.kind {
                    ExprKind::Literal(Literal::Int(value)) => usize::try_from(*value).ok(),
                    ExprKind::Literal(Literal::Uint(value)) => usize::try_from(*value).ok(),
                    _ => None,
                };
                position
                    .and_then(|position| elems.get(position))
                    .cloned()
                    .ok_or_else(|| type_error("constant tuple index", &index_ty, &**index))
            }
            _ => Err(type_error("indexable value", &receiver_ty, &**receiver)),
        }
    }

    fn resolve_call(&mut self, expr: &Expr, call: &Call, scope: &Scope) -> Result<Type, Error> {
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.resolve_expr(arg, scope, None)?);
        }

        match &call.callee.kind {
            ExprKind::VarRef(var_ref) if scope.lookup_var(&var_ref.name).is_none() => {
                let (func, ty) = self.call_function(&var_ref.name, &args, expr)?;
                let _ = var_ref.symbol.set(SymbolRef::Func(Rc::downgrade(&func)));
                let _ = call.function.set(Rc::downgrade(&func));
                if let Some(func_ty) = func.func_type() {
                    call.callee.set_type(func_ty);
                }
                Ok(ty)
            }
            ExprKind::MemberAccess(access) => {
                let receiver = self.resolve_expr(&access.receiver, scope, None)?;
                if args.is_empty() {
                    if let Some(ty) = builtin_member(&receiver, &access.member) {
                        call.callee.set_type(ty.clone());
                        return Ok(ty);
                    }
                }

                let mut ufcs_args = Vec::with_capacity(args.len() + 1);
                ufcs_args.push(receiver);
                ufcs_args.extend(args);

                let (func, ty) = self.call_function(&access.member, &ufcs_args, expr)?;
                let _ = access.callee.set(Rc::downgrade(&func));
                let _ = call.function.set(Rc::downgrade(&func));
                if let Some(func_ty) = func.func_type() {
                    call.callee.set_type(func_ty);
                }
                Ok(ty)
            }
            _ => {
                // A variable or expression of function type is the only
                // candidate.
                let callee = self.resolve_expr(&call.callee, scope, None)?;
                match &callee {
                    Type::Func { params, ret } if score_params(params, &args) > 0 => {
                        Ok(ret.as_deref().cloned().unwrap_or_else(Type::unit))
                    }
                    Type::Func { .. } => Err(Error::new(
                        ErrorImpl::NoMatchingOverload {
                            function: call.callee.kind.describe(),
                            arguments: join_types(&args),
                        },
                        at(expr),
                    )),
                    _ => Err(type_error("function", &callee, &*call.callee)),
                }
            }
        }
    }

    /// Declares and analyzes a lambda inside `scope`. Untyped parameters take
    /// their types from a function-typed `hint`.
    fn resolve_lambda(
        &mut self,
        def: &Rc<FunctionDefinition>,
        scope: &Scope,
        hint: Option<&Type>,
    ) -> Result<Type, Error> {
        let (hinted_params, proc_hint) = match hint {
            Some(Type::Func { params, ret }) if params.len() == def.params.len() => {
                (Some(params.as_slice()), ret.is_none())
            }
            _ => (None, false),
        };

        let mut params = Vec::with_capacity(def.params.len());
        for (index, param) in def.params.iter().enumerate() {
            let ty = match (&param.param_type, hinted_params) {
                (Some(node), _) => Type::from_node(node)?,
                (None, Some(hinted)) if !hinted[index].is_template() => hinted[index].clone(),
                (None, _) => return Err(not_inferred(&param.name, &**param)),
            };
            params.push(ty);
        }

        let (lambda_scope, symbol) = declare_function(def, scope, Some(params.as_slice()))?;
        debug!("Declared {}", symbol);
        self.global.lambdas.borrow_mut().push(Rc::clone(&symbol));
        self.global.lambda_scopes.borrow_mut().push(lambda_scope);

        self.analyze_function(def)?;

        let ret = symbol.get_return_type().cloned().unwrap_or_else(Type::unit);
        let ret = if proc_hint && ret.is_unit() {
            None
        } else {
            Some(Box::new(ret))
        };

        Ok(Type::Func { params, ret })
    }

    fn resolve_if_expr(&mut self, if_expr: &IfExpr, scope: &Scope, hint: Option<&Type>) -> Result<Type, Error> {
        self.resolve_condition(&if_expr.condition, scope)?;
        let then_ty = self.resolve_expr(&if_expr.then_expr, scope, hint)?;
        let else_ty = self.resolve_expr(&if_expr.else_expr, scope, Some(&then_ty))?;
        expect_type(&then_ty, &else_ty, &*if_expr.else_expr)?;
        Ok(then_ty)
    }
}

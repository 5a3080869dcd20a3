// Semantic checker - scope resolution and type checking
//
// Walks the program once, annotating every expression with its resolved
// type. Problems are appended to the caller's `Diagnostics`; the walk never
// stops early, and an expression whose type could not be resolved does not
// produce further diagnostics in its parents.

use crate::ast::*;
use crate::config::{RED_ZONE, STACK_GROWTH};
use crate::error::{Diagnostics, Stage};
use crate::scope::{ScopeArena, ScopeId};
use crate::stdlib::{CONSTANTS, NATIVES};
use crate::types::{check_binop, check_unaryop, Params, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Array,
    Parameter,
    /// `defined` is false for a prototype still waiting for its body
    Function { defined: bool },
    Builtin,
    Constant,
}

impl SymbolKind {
    fn describe(self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Array => "array",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Function { .. } => "function",
            SymbolKind::Builtin => "builtin",
            SymbolKind::Constant => "constant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub ty: Type,
    pub kind: SymbolKind,
    pub line: usize,
}

/// Check `program` in place, recording every problem in `diagnostics`
pub fn check(program: &mut Program, diagnostics: &mut Diagnostics) {
    let before = diagnostics.count(Stage::Semantic);
    let mut checker = Checker::new(diagnostics);
    checker.check_program(program);
    log::debug!(
        "semantic check finished with {} new diagnostic(s)",
        checker.diagnostics.count(Stage::Semantic) - before
    );
}

pub struct Checker<'d> {
    scopes: ScopeArena<Symbol>,
    current: ScopeId,
    /// Declared return types of the enclosing functions, innermost last
    returns: Vec<Type>,
    loop_depth: usize,
    diagnostics: &'d mut Diagnostics,
}

impl<'d> Checker<'d> {
    pub fn new(diagnostics: &'d mut Diagnostics) -> Self {
        let mut scopes = ScopeArena::new();
        let global = scopes.global();
        for (name, constant) in CONSTANTS {
            scopes.declare(
                global,
                *name,
                Symbol {
                    ty: constant.ty(),
                    kind: SymbolKind::Constant,
                    line: 0,
                },
            );
        }
        for native in NATIVES {
            scopes.declare(
                global,
                native.name,
                Symbol {
                    ty: Type::Function(Box::new(native.signature())),
                    kind: SymbolKind::Builtin,
                    line: 0,
                },
            );
        }

        Self {
            scopes,
            current: global,
            returns: Vec::new(),
            loop_depth: 0,
            diagnostics,
        }
    }

    pub fn check_program(&mut self, program: &mut Program) {
        for decl in &mut program.decls {
            self.check_decl(decl);
        }
    }

    /// Symbol visible from the current scope
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.lookup(self.current, name)
    }

    fn error(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.error(Stage::Semantic, line, message);
    }

    /// Insert into the current scope, reporting same-scope redeclarations.
    /// A definition may complete an earlier prototype with the same type.
    fn declare(&mut self, name: &str, symbol: Symbol) {
        let Some(existing) = self.scopes.get_local(self.current, name) else {
            self.scopes.declare(self.current, name, symbol);
            return;
        };

        let completes_prototype = existing.kind == SymbolKind::Function { defined: false }
            && symbol.kind == SymbolKind::Function { defined: true }
            && existing.ty == symbol.ty;
        if completes_prototype {
            self.scopes.declare(self.current, name, symbol);
            return;
        }

        let message = if existing.ty != symbol.ty {
            format!(
                "{} '{}' already declared as {} with a different type ({})",
                symbol.kind.describe(),
                name,
                existing.kind.describe(),
                existing.ty
            )
        } else {
            format!("{} '{}' already declared", symbol.kind.describe(), name)
        };
        self.error(symbol.line, message);
    }

    fn check_decl(&mut self, decl: &mut Decl) {
        match decl {
            Decl::Var(var) => self.check_var_decl(var),
            Decl::Array(array) => self.check_array_decl(array),
            Decl::Func(func) => self.check_func_decl(func),
        }
    }

    fn check_var_decl(&mut self, var: &mut VarDecl) {
        let declared = var.ty.to_type();
        if declared == Type::Void {
            self.error(var.line, format!("variable '{}' cannot be void", var.name));
        }
        if let Some(init) = &mut var.init {
            if let Some(found) = self.check_expr(init) {
                if !found.accepts(&declared) {
                    self.error(
                        var.line,
                        format!(
                            "type mismatch in initialization of '{}': expected {}, got {}",
                            var.name, declared, found
                        ),
                    );
                }
            }
        }
        self.declare(
            &var.name,
            Symbol {
                ty: declared,
                kind: SymbolKind::Variable,
                line: var.line,
            },
        );
    }

    fn check_array_decl(&mut self, array: &mut ArrayDecl) {
        let declared = array.to_type();
        if array.elem == BaseType::Void {
            self.error(array.line, format!("array '{}' cannot hold void", array.name));
        }
        self.check_dims(&array.name, &mut array.dims, array.line);

        match &mut array.init {
            Some(items) => {
                if let Some(Some(size)) = array.dims.first() {
                    if let Some(n) = const_int(size) {
                        if usize::try_from(n).ok() != Some(items.len()) {
                            self.error(
                                array.line,
                                format!(
                                    "array '{}' declared with {} elements but initialized with {}",
                                    array.name,
                                    n,
                                    items.len()
                                ),
                            );
                        }
                    }
                }
                let elem = declared.index(1).cloned().unwrap_or(Type::Any);
                for (i, item) in items.iter_mut().enumerate() {
                    if let Some(found) = self.check_expr(item) {
                        if !found.accepts(&elem) {
                            self.error(
                                item.line,
                                format!(
                                    "element {} of '{}' has type {}, expected {}",
                                    i, array.name, found, elem
                                ),
                            );
                        }
                    }
                }
            }
            None => {
                if array.dims.iter().any(Option::is_none) {
                    self.error(
                        array.line,
                        format!("array '{}' needs a size or an initializer", array.name),
                    );
                }
            }
        }

        self.declare(
            &array.name,
            Symbol {
                ty: declared,
                kind: SymbolKind::Array,
                line: array.line,
            },
        );
    }

    /// Every present size expression must be a non-negative integer
    fn check_dims(&mut self, name: &str, dims: &mut [Option<Expr>], line: usize) {
        for size in dims.iter_mut().flatten() {
            match self.check_expr(size) {
                Some(Type::Integer) => {
                    if let Some(n) = const_int(size).filter(|n| *n < 0) {
                        self.error(line, format!("array '{}' has negative size {}", name, n));
                    }
                }
                Some(other) => self.error(
                    line,
                    format!("size of array '{}' must be integer, got {}", name, other),
                ),
                None => {}
            }
        }
    }

    fn check_func_decl(&mut self, func: &mut FuncDecl) {
        let ret = func.return_type.to_type();
        let params: Vec<Type> = func.params.iter().map(Param::to_type).collect();
        self.declare(
            &func.name,
            Symbol {
                ty: Type::function(ret.clone(), params),
                kind: SymbolKind::Function {
                    defined: func.body.is_some(),
                },
                line: func.line,
            },
        );

        let enclosing = self.current;
        let saved_loops = self.loop_depth;
        self.current = self.scopes.push(enclosing);
        self.returns.push(ret);
        self.loop_depth = 0;

        for param in &mut func.params {
            self.check_param(param);
        }
        if let Some(body) = &mut func.body {
            for stmt in body {
                self.check_stmt(stmt);
            }
        }

        self.loop_depth = saved_loops;
        self.returns.pop();
        self.current = enclosing;
    }

    fn check_param(&mut self, param: &mut Param) {
        let ty = param.to_type();
        match param {
            Param::Var { name, ty: base, line } => {
                if *base == BaseType::Void {
                    self.error(*line, format!("parameter '{}' cannot be void", name));
                }
            }
            Param::Array {
                name, dims, line, ..
            } => {
                let (name, line) = (name.clone(), *line);
                self.check_dims(&name, dims, line);
            }
        }
        self.declare(
            param.name(),
            Symbol {
                ty,
                kind: SymbolKind::Parameter,
                line: param.line(),
            },
        );
    }

    fn check_block(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_loop_body(&mut self, body: &mut [Stmt]) {
        self.loop_depth += 1;
        self.check_block(body);
        self.loop_depth -= 1;
    }

    fn check_condition(&mut self, cond: &mut Expr, construct: &str) {
        if let Some(found) = self.check_expr(cond) {
            if found != Type::Boolean {
                self.error(
                    cond.line,
                    format!("condition of '{}' must be boolean, got {}", construct, found),
                );
            }
        }
    }

    pub fn check_stmt(&mut self, stmt: &mut Stmt) {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.check_stmt_inner(stmt))
    }

    fn check_stmt_inner(&mut self, stmt: &mut Stmt) {
        let line = stmt.line;
        match &mut stmt.kind {
            StmtKind::Decl(decl) => self.check_decl(decl),
            StmtKind::Expr(expr) => {
                self.check_expr(expr);
            }
            StmtKind::If { cond, then, else_ } => {
                self.check_condition(cond, "if");
                self.check_block(then);
                if let Some(else_) = else_ {
                    self.check_block(else_);
                }
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.check_expr(init);
                }
                if let Some(cond) = cond {
                    self.check_condition(cond, "for");
                }
                if let Some(step) = step {
                    self.check_expr(step);
                }
                self.check_loop_body(body);
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond, "while");
                self.check_loop_body(body);
            }
            StmtKind::DoWhile { body, cond } => {
                self.check_loop_body(body);
                self.check_condition(cond, "do-while");
            }
            StmtKind::Return(value) => {
                let found = value.as_mut().and_then(|e| self.check_expr(e));
                match self.returns.last().cloned() {
                    None => self.error(line, "return statement outside of a function"),
                    Some(expected) => {
                        if let Some(found) = found {
                            if !found.accepts(&expected) {
                                self.error(
                                    line,
                                    format!(
                                        "function returns {}, but return value has type {}",
                                        expected, found
                                    ),
                                );
                            }
                        }
                    }
                }
            }
            StmtKind::Print(args) => {
                for arg in args {
                    if self.check_expr(arg) == Some(Type::Void) {
                        let message = format!("cannot print void value '{}'", arg.describe());
                        self.error(arg.line, message);
                    }
                }
            }
            StmtKind::Block(stmts) => self.check_block(stmts),
            StmtKind::Break => self.check_loop_control("break", line),
            StmtKind::Continue => self.check_loop_control("continue", line),
        }
    }

    fn check_loop_control(&mut self, keyword: &str, line: usize) {
        if self.loop_depth == 0 {
            self.error(line, format!("'{}' outside of a loop", keyword));
        }
    }

    /// Resolve and record the type of `expr`; `None` when it is erroneous
    pub fn check_expr(&mut self, expr: &mut Expr) -> Option<Type> {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.check_expr_inner(expr))
    }

    fn check_expr_inner(&mut self, expr: &mut Expr) -> Option<Type> {
        if expr.is_literal() {
            return expr.ty.clone();
        }
        let line = expr.line;
        let ty = match &mut expr.kind {
            ExprKind::Integer(_)
            | ExprKind::Float(_)
            | ExprKind::Boolean(_)
            | ExprKind::Char(_)
            | ExprKind::String(_) => expr.ty.clone(),
            ExprKind::BinOper { op, left, right } => {
                let op = *op;
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                match (left, right) {
                    (Some(l), Some(r)) => {
                        let result = check_binop(op, &l, &r);
                        if result.is_none() {
                            self.error(
                                line,
                                format!("in '{}', types {} and {} do not match", op.symbol(), l, r),
                            );
                        }
                        result
                    }
                    _ => None,
                }
            }
            ExprKind::UnaryOper { op, operand } => {
                let op = *op;
                let operand = self.check_expr(operand)?;
                let result = check_unaryop(op, &operand);
                if result.is_none() {
                    self.error(
                        line,
                        format!("unary '{}' does not apply to {}", op.symbol(), operand),
                    );
                }
                result
            }
            ExprKind::Increment { target, .. } | ExprKind::Decrement { target, .. } => {
                let found = self.check_expr(target)?;
                if !found.is_numeric() {
                    let message = format!(
                        "'{}' requires a numeric location, got {}",
                        target.describe(),
                        found
                    );
                    self.error(line, message);
                    None
                } else {
                    Some(found)
                }
            }
            ExprKind::Assignment { target, value } => {
                if !self.check_assignable(target) {
                    self.check_expr(value);
                    return None;
                }
                let expected = self.check_expr(target);
                let found = self.check_expr(value);
                match (expected, found) {
                    (Some(expected), Some(found)) => {
                        if found.accepts(&expected) {
                            Some(expected)
                        } else {
                            self.error(
                                line,
                                format!(
                                    "type mismatch in assignment to '{}': expected {}, got {}",
                                    target.describe(),
                                    expected,
                                    found
                                ),
                            );
                            None
                        }
                    }
                    _ => None,
                }
            }
            ExprKind::FuncCall { name, args } => {
                let name = name.clone();
                self.check_call(&name, args, line)
            }
            ExprKind::VarLoc { name, .. } => match self.lookup(name) {
                Some(symbol) => Some(symbol.ty.clone()),
                None => {
                    let message = format!("undefined variable '{}'", name);
                    self.error(line, message);
                    None
                }
            },
            ExprKind::ArrayLoc { name, index, .. } => {
                let name = name.clone();
                self.check_array_loc(&name, index, line)
            }
        };
        expr.ty = ty.clone();
        ty
    }

    /// Functions, builtins and constants are not storage locations
    fn check_assignable(&mut self, target: &Expr) -> bool {
        let ExprKind::VarLoc { name, .. } = &target.kind else {
            return true;
        };
        let kind = match self.lookup(name) {
            Some(symbol) => symbol.kind,
            None => return true,
        };
        if matches!(
            kind,
            SymbolKind::Function { .. } | SymbolKind::Builtin | SymbolKind::Constant
        ) {
            self.error(
                target.line,
                format!("cannot assign to {} '{}'", kind.describe(), name),
            );
            return false;
        }
        true
    }

    fn check_call(&mut self, name: &str, args: &mut [Expr], line: usize) -> Option<Type> {
        let found: Vec<Option<Type>> = args.iter_mut().map(|a| self.check_expr(a)).collect();

        let signature = match self.lookup(name).map(|s| s.ty.clone()) {
            Some(Type::Function(signature)) => signature,
            Some(other) => {
                self.error(line, format!("'{}' of type {} is not a function", name, other));
                return None;
            }
            None => {
                self.error(line, format!("undefined function '{}'", name));
                return None;
            }
        };

        if let Params::Fixed(params) = &signature.params {
            if params.len() != args.len() {
                self.error(
                    line,
                    format!(
                        "'{}' expects {} arguments, got {}",
                        name,
                        params.len(),
                        args.len()
                    ),
                );
            } else {
                for (i, (expected, found)) in params.iter().zip(&found).enumerate() {
                    if let Some(found) = found {
                        if !found.accepts(expected) {
                            self.error(
                                args[i].line,
                                format!(
                                    "argument {} of '{}' has type {}, expected {}",
                                    i + 1,
                                    name,
                                    found,
                                    expected
                                ),
                            );
                        }
                    }
                }
            }
        }
        Some(signature.ret)
    }

    fn check_array_loc(&mut self, name: &str, index: &mut [Expr], line: usize) -> Option<Type> {
        let mut indices_ok = true;
        for idx in index.iter_mut() {
            match self.check_expr(idx) {
                Some(Type::Integer) => {}
                Some(other) => {
                    self.error(idx.line, format!("array index must be integer, got {}", other));
                    indices_ok = false;
                }
                None => indices_ok = false,
            }
        }

        let Some(symbol) = self.lookup(name) else {
            self.error(line, format!("undefined variable '{}'", name));
            return None;
        };
        let ty = symbol.ty.clone();
        if ty.rank() == 0 {
            self.error(line, format!("'{}' of type {} is not an array", name, ty));
            return None;
        }
        let Some(elem) = ty.index(index.len()).cloned() else {
            self.error(
                line,
                format!(
                    "too many indices for '{}': rank {}, got {}",
                    name,
                    ty.rank(),
                    index.len()
                ),
            );
            return None;
        };
        indices_ok.then_some(elem)
    }
}

/// Value of an integer expression built only from literals
fn const_int(expr: &Expr) -> Option<i64> {
    match &expr.kind {
        ExprKind::Integer(n) => Some(*n),
        ExprKind::UnaryOper {
            op: UnaryOp::Neg,
            operand,
        } => const_int(operand)?.checked_neg(),
        ExprKind::BinOper { op, left, right } => {
            let (l, r) = (const_int(left)?, const_int(right)?);
            match op {
                BinOp::Add => l.checked_add(r),
                BinOp::Sub => l.checked_sub(r),
                BinOp::Mul => l.checked_mul(r),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn check_source(source: &str) -> (Program, Diagnostics) {
        let mut program = parse(tokenize(source).unwrap()).unwrap();
        let mut diags = Diagnostics::new();
        check(&mut program, &mut diags);
        (program, diags)
    }

    fn messages(source: &str) -> Vec<String> {
        check_source(source).1.messages()
    }

    #[test]
    fn test_clean_program_annotates_types() {
        let (program, diags) = check_source("x: integer = 1 + 2;");
        assert!(!diags.has_errors());
        match &program.decls[0] {
            Decl::Var(VarDecl { init: Some(init), .. }) => {
                assert_eq!(init.ty, Some(Type::Integer));
            }
            other => panic!("Expected VarDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_initializer_type_mismatch() {
        assert_eq!(
            messages("x: integer = \"hi\";"),
            vec!["type mismatch in initialization of 'x': expected integer, got string"]
        );
    }

    #[test]
    fn test_redeclaration_messages_differ_by_type() {
        assert_eq!(
            messages("x: integer; x: integer;"),
            vec!["variable 'x' already declared"]
        );
        let msgs = messages("x: integer; x: float;");
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("different type"));
    }

    #[test]
    fn test_shadowing_in_function_is_allowed() {
        assert!(messages("x: integer; f: function void () = { x: float = 1.5; }").is_empty());
    }

    #[test]
    fn test_prototype_then_definition() {
        let ok = "f: function integer (n: integer);
                  f: function integer (n: integer) = { return n; }";
        assert!(messages(ok).is_empty());

        let twice = "f: function integer () = { return 1; }
                     f: function integer () = { return 2; }";
        assert_eq!(messages(twice), vec!["function 'f' already declared"]);

        let mismatch = "f: function integer (n: integer);
                        f: function integer (n: float) = { return 1; }";
        assert!(messages(mismatch)[0].contains("different type"));
    }

    #[test]
    fn test_recursive_call_resolves() {
        let source = "fact: function integer (n: integer) = {
            if (n <= 1) return 1;
            return n * fact(n - 1);
        }";
        assert!(messages(source).is_empty());
    }

    #[test]
    fn test_return_rules() {
        assert_eq!(
            messages("f: function integer () = { return \"s\"; }"),
            vec!["function returns integer, but return value has type string"]
        );
    }

    #[test]
    fn test_undefined_names() {
        assert_eq!(
            messages("f: function void () = { y = 3; }"),
            vec!["undefined variable 'y'"]
        );
        assert_eq!(
            messages("x: integer = g(1);"),
            vec!["undefined function 'g'"]
        );
    }

    #[test]
    fn test_errors_do_not_cascade() {
        // Only the undefined name is reported, not the `+` or the initializer
        assert_eq!(
            messages("x: integer = missing + 1;"),
            vec!["undefined variable 'missing'"]
        );
    }

    #[test]
    fn test_binop_mismatch() {
        assert_eq!(
            messages("x: integer = 1 + true;"),
            vec!["in '+', types integer and boolean do not match"]
        );
    }

    #[test]
    fn test_conditions_must_be_boolean() {
        let msgs = messages("f: function void () = { if (1) print 1; while (\"s\") print 2; }");
        assert_eq!(
            msgs,
            vec![
                "condition of 'if' must be boolean, got integer",
                "condition of 'while' must be boolean, got string",
            ]
        );
    }

    #[test]
    fn test_call_arity_and_argument_types() {
        let source = "add: function integer (a: integer, b: integer) = { return a + b; }
                      x: integer = add(1);
                      y: integer = add(1, 'c');";
        assert_eq!(
            messages(source),
            vec![
                "'add' expects 2 arguments, got 1",
                "argument 2 of 'add' has type char, expected integer",
            ]
        );
    }

    #[test]
    fn test_builtins_are_seeded() {
        let source = "s: string = input();
                      n: integer = len(s);
                      b: boolean = true;
                      f: function void () = { print s, n, b; }";
        assert!(messages(source).is_empty());
    }

    #[test]
    fn test_len_takes_strings_and_arrays() {
        assert!(messages("a: array [2] char; n: integer = len(a);").is_empty());
        assert_eq!(
            messages("n: integer = len(5);"),
            vec!["argument 1 of 'len' has type integer, expected string or array"]
        );
    }

    #[test]
    fn test_array_declarations() {
        assert!(messages("a: array [3] integer = {1, 2, 3};").is_empty());
        assert_eq!(
            messages("a: array [2] integer = {1, 2, 3};"),
            vec!["array 'a' declared with 2 elements but initialized with 3"]
        );
        assert_eq!(
            messages("a: array [2] integer = {1, \"x\"};"),
            vec!["element 1 of 'a' has type string, expected integer"]
        );
        assert_eq!(
            messages("a: array [1.5] integer;"),
            vec!["size of array 'a' must be integer, got float"]
        );
        assert_eq!(
            messages("a: array [] integer;"),
            vec!["array 'a' needs a size or an initializer"]
        );
    }

    #[test]
    fn test_array_indexing() {
        let source = "m: array [2] array [2] integer;
                      a: integer = m[0][1];
                      b: integer = m[0][1][2];
                      c: integer = m[true][0];";
        assert_eq!(
            messages(source),
            vec![
                "too many indices for 'm': rank 2, got 3",
                "array index must be integer, got boolean",
            ]
        );
    }

    #[test]
    fn test_loop_control_placement() {
        assert_eq!(
            messages("f: function void () = { break; }"),
            vec!["'break' outside of a loop"]
        );
        assert!(messages("f: function void () = { while (true) { continue; } }").is_empty());
    }

    #[test]
    fn test_void_rules() {
        assert_eq!(
            messages("v: void;"),
            vec!["variable 'v' cannot be void"]
        );
        let source = "g: function void () = { }
                      f: function void () = { print g(); }";
        assert_eq!(messages(source), vec!["cannot print void value 'g()'"]);
    }

    #[test]
    fn test_increment_requires_numeric() {
        assert_eq!(
            messages("s: string; f: function void () = { s++; }"),
            vec!["'s' requires a numeric location, got string"]
        );
    }

    #[test]
    fn test_cannot_assign_to_function() {
        assert_eq!(
            messages("f: function integer () = { return 1; } g: function void () = { f = 2; }"),
            vec!["cannot assign to function 'f'"]
        );
    }
}

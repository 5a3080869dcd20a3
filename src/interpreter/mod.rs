// Tree-walking interpreter over the checked AST

mod ops;
mod value;

pub use ops::{floor_div, floor_mod};
pub use value::{ArrayRef, Closure, Value};

use crate::ast::*;
use crate::config::{Config, RED_ZONE, STACK_GROWTH};
use crate::error::{Diagnostics, RuntimeError};
use crate::scope::{ScopeArena, ScopeId};
use crate::stdlib::{Native, CONSTANTS, NATIVES};
use std::io::{self, BufRead, Write};

pub type EvalResult<T> = Result<T, RuntimeError>;

/// Outcome of executing one statement
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<'a> {
    Normal,
    Return(Value<'a>),
    Break,
    Continue,
}

/// Outcome of `Interpreter::interpret`
#[derive(Debug, Clone, PartialEq)]
pub enum Execution<'a> {
    /// Earlier stages recorded diagnostics; nothing ran
    Skipped,
    /// Ran to the end; holds `main`'s result when `main` was called
    Completed(Option<Value<'a>>),
    /// Stopped on a runtime error, which was pushed to the diagnostics
    Failed,
}

pub struct Interpreter<'a> {
    scopes: ScopeArena<Value<'a>>,
    current: ScopeId,
    /// Newest frame a closure was declared in; frames up to it outlive their call
    pinned: ScopeId,
    depth: usize,
    config: Config,
    out: Box<dyn Write + 'a>,
    input: Box<dyn BufRead + 'a>,
}

impl<'a> Interpreter<'a> {
    pub fn new(out: impl Write + 'a, input: impl BufRead + 'a) -> Self {
        Self::with_config(Config::default(), out, input)
    }

    pub fn with_config(config: Config, out: impl Write + 'a, input: impl BufRead + 'a) -> Self {
        let mut scopes = ScopeArena::new();
        let global = scopes.global();
        for (name, constant) in CONSTANTS {
            scopes.declare(global, *name, constant.value());
        }
        for native in NATIVES {
            scopes.declare(global, native.name, Value::Native(native));
        }

        Self {
            scopes,
            current: global,
            pinned: global,
            depth: 0,
            config,
            out: Box::new(out),
            input: Box::new(input),
        }
    }

    /// Run `program` unless `diagnostics` already holds errors. A runtime
    /// error stops execution and is appended to `diagnostics`.
    pub fn interpret(
        &mut self,
        program: &'a Program,
        diagnostics: &mut Diagnostics,
    ) -> Execution<'a> {
        if diagnostics.has_errors() {
            log::info!(
                "skipping execution: {} earlier diagnostic(s)",
                diagnostics.len()
            );
            return Execution::Skipped;
        }

        let result = self.execute(program);
        if let Err(e) = self.out.flush() {
            log::warn!("failed to flush program output: {}", e);
        }

        match result {
            Ok(value) => Execution::Completed(value),
            Err(err) => {
                log::debug!("runtime error at line {}: {}", err.line(), err);
                diagnostics.push((&err).into());
                Execution::Failed
            }
        }
    }

    /// Execute the top-level declarations, then `main` if it exists
    pub fn execute(&mut self, program: &'a Program) -> EvalResult<Option<Value<'a>>> {
        for decl in &program.decls {
            self.eval_decl(decl)?;
        }

        let global = self.scopes.global();
        let entry = match self.scopes.get_local(global, "main") {
            Some(Value::Function(closure)) if closure.decl.params.is_empty() => *closure,
            _ => return Ok(None),
        };
        log::debug!("calling main");
        self.eval_function(entry, Vec::new(), entry.decl.line).map(Some)
    }

    /// Value bound to `name` in the global frame
    pub fn global(&self, name: &str) -> Option<&Value<'a>> {
        self.scopes.get_local(self.scopes.global(), name)
    }

    pub fn write_output(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    /// Next line of program input without its line terminator; empty at EOF
    pub fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    fn eval_decl(&mut self, decl: &'a Decl) -> EvalResult<()> {
        match decl {
            Decl::Var(var) => {
                let value = match &var.init {
                    Some(init) => self.eval_expr(init)?,
                    None => Value::default_for(var.ty.base),
                };
                self.scopes.declare(self.current, var.name.as_str(), value);
            }
            Decl::Array(array) => {
                let value = self.eval_array_decl(array)?;
                self.scopes.declare(self.current, array.name.as_str(), value);
            }
            Decl::Func(func) => {
                // A prototype never replaces an existing binding
                let bound = self.scopes.get_local(self.current, &func.name).is_some();
                if func.body.is_none() && bound {
                    return Ok(());
                }
                let closure = Closure {
                    decl: func,
                    env: self.current,
                };
                self.pinned = self.pinned.max(self.current);
                self.scopes
                    .declare(self.current, func.name.as_str(), Value::Function(closure));
            }
        }
        Ok(())
    }

    fn eval_array_decl(&mut self, array: &'a ArrayDecl) -> EvalResult<Value<'a>> {
        let sizes = self.eval_dims(&array.name, &array.dims, array.line)?;
        let Some(init) = &array.init else {
            let sizes: Vec<usize> = sizes.into_iter().map(|s| s.unwrap_or(0)).collect();
            return Ok(Value::new_array(&sizes, array.elem));
        };

        // Rows are copied so that each element owns its storage
        let mut items = Vec::with_capacity(init.len());
        for expr in init {
            items.push(self.eval_expr(expr)?.deep_copy());
        }
        let value = Value::array(items);
        check_shape(&value, &sizes, &array.name, array.line)?;
        Ok(value)
    }

    /// Evaluate each dimension, outermost first; `None` where no size was given
    fn eval_dims(
        &mut self,
        name: &str,
        dims: &'a [Option<Expr>],
        line: usize,
    ) -> EvalResult<Vec<Option<usize>>> {
        let mut sizes = Vec::with_capacity(dims.len());
        for dim in dims {
            sizes.push(match dim {
                Some(size) => Some(self.eval_size(name, size, line)?),
                None => None,
            });
        }
        Ok(sizes)
    }

    fn eval_size(&mut self, name: &str, size: &'a Expr, line: usize) -> EvalResult<usize> {
        let invalid = |size: String| RuntimeError::InvalidArraySize {
            name: name.to_string(),
            size,
            line,
        };
        match self.eval_expr(size)? {
            Value::Integer(n) => usize::try_from(n).map_err(|_| invalid(n.to_string())),
            other => Err(invalid(other.to_string())),
        }
    }

    fn eval_block(&mut self, stmts: &'a [Stmt]) -> EvalResult<Completion<'a>> {
        for stmt in stmts {
            match self.eval_stmt(stmt)? {
                Completion::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(Completion::Normal)
    }

    fn eval_stmt(&mut self, stmt: &'a Stmt) -> EvalResult<Completion<'a>> {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.exec_stmt(stmt))
    }

    fn exec_stmt(&mut self, stmt: &'a Stmt) -> EvalResult<Completion<'a>> {
        log::trace!("executing statement at line {}", stmt.line);

        match &stmt.kind {
            StmtKind::Decl(decl) => {
                self.eval_decl(decl)?;
                Ok(Completion::Normal)
            }
            StmtKind::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(Completion::Normal)
            }
            StmtKind::If { cond, then, else_ } => {
                if self.eval_expr(cond)?.is_truthy() {
                    self.eval_block(then)
                } else if let Some(else_) = else_ {
                    self.eval_block(else_)
                } else {
                    Ok(Completion::Normal)
                }
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.eval_expr(init)?;
                }
                loop {
                    if let Some(cond) = cond {
                        if !self.eval_expr(cond)?.is_truthy() {
                            break;
                        }
                    }
                    match self.eval_block(body)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if let Some(step) = step {
                        self.eval_expr(step)?;
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::While { cond, body } => {
                while self.eval_expr(cond)?.is_truthy() {
                    match self.eval_block(body)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::DoWhile { body, cond } => {
                loop {
                    match self.eval_block(body)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if !self.eval_expr(cond)?.is_truthy() {
                        break;
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Nil,
                };
                Ok(Completion::Return(value))
            }
            StmtKind::Print(args) => {
                for arg in args {
                    let text = match self.eval_expr(arg)? {
                        Value::String(s) => expand_escapes(&s),
                        other => other.to_string(),
                    };
                    self.write_output(&text).map_err(|e| RuntimeError::Output {
                        message: e.to_string(),
                        line: stmt.line,
                    })?;
                }
                Ok(Completion::Normal)
            }
            StmtKind::Block(stmts) => self.eval_block(stmts),
            StmtKind::Break => Ok(Completion::Break),
            StmtKind::Continue => Ok(Completion::Continue),
        }
    }

    pub fn eval_expr(&mut self, expr: &'a Expr) -> EvalResult<Value<'a>> {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.eval_expr_inner(expr))
    }

    fn eval_expr_inner(&mut self, expr: &'a Expr) -> EvalResult<Value<'a>> {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Integer(n) => Ok(Value::Integer(*n)),
            ExprKind::Float(x) => Ok(Value::Float(*x)),
            ExprKind::Boolean(b) => Ok(Value::Boolean(*b)),
            ExprKind::Char(c) => Ok(Value::Char(*c)),
            ExprKind::String(s) => Ok(Value::String(s.clone())),
            ExprKind::BinOper {
                op: BinOp::And,
                left,
                right,
            } => {
                let left = self.eval_expr(left)?;
                if left.is_truthy() {
                    self.eval_expr(right)
                } else {
                    Ok(left)
                }
            }
            ExprKind::BinOper {
                op: BinOp::Or,
                left,
                right,
            } => {
                let left = self.eval_expr(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval_expr(right)
                }
            }
            ExprKind::BinOper { op, left, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                ops::binary(*op, left, right, line)
            }
            ExprKind::UnaryOper { op, operand } => {
                let operand = self.eval_expr(operand)?;
                ops::unary(*op, operand, line)
            }
            ExprKind::Increment { target, prefix } => self.eval_step(target, 1, *prefix),
            ExprKind::Decrement { target, prefix } => self.eval_step(target, -1, *prefix),
            ExprKind::Assignment { target, value } => {
                let value = self.eval_expr(value)?;
                self.store(target, value.clone())?;
                Ok(value)
            }
            ExprKind::FuncCall { name, args } => {
                let callee = self.lookup(name, line)?;
                if !callee.is_callable() {
                    return Err(RuntimeError::NotCallable {
                        text: expr.describe(),
                        line,
                    });
                }
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg)?);
                }
                self.call(callee, values, line)
            }
            ExprKind::VarLoc { name, .. } => self.lookup(name, line),
            ExprKind::ArrayLoc { name, index, .. } => {
                let (items, pos) = self.element(name, index, line)?;
                let value = items.borrow()[pos].clone();
                Ok(value)
            }
        }
    }

    fn lookup(&self, name: &str, line: usize) -> EvalResult<Value<'a>> {
        self.scopes
            .lookup(self.current, name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            })
    }

    fn eval_step(&mut self, target: &'a Expr, delta: i64, prefix: bool) -> EvalResult<Value<'a>> {
        let old = self.eval_expr(target)?;
        let new = ops::step(old.clone(), delta, target.line)?;
        self.store(target, new.clone())?;
        Ok(if prefix { new } else { old })
    }

    fn store(&mut self, target: &'a Expr, value: Value<'a>) -> EvalResult<()> {
        let line = target.line;
        match &target.kind {
            ExprKind::VarLoc { name, .. } => self
                .scopes
                .assign(self.current, name, value)
                .map_err(|_| RuntimeError::UndefinedVariable {
                    name: name.clone(),
                    line,
                }),
            ExprKind::ArrayLoc { name, index, .. } => {
                let (items, pos) = self.element(name, index, line)?;
                items.borrow_mut()[pos] = value;
                Ok(())
            }
            _ => Err(RuntimeError::InvalidTarget {
                text: target.describe(),
                line,
            }),
        }
    }

    /// Resolve `name[i]...[k]` to the innermost array and the slot within it
    fn element(
        &mut self,
        name: &str,
        index: &'a [Expr],
        line: usize,
    ) -> EvalResult<(ArrayRef<'a>, usize)> {
        let mut current = self.lookup(name, line)?;
        let mut positions = Vec::with_capacity(index.len());
        for expr in index {
            match self.eval_expr(expr)? {
                Value::Integer(n) => positions.push(n),
                other => {
                    return Err(RuntimeError::InvalidIndex {
                        found: other.type_name().to_string(),
                        line,
                    })
                }
            }
        }

        let Some((&last, outer)) = positions.split_last() else {
            return Err(RuntimeError::NotAnArray {
                name: name.to_string(),
                line,
            });
        };
        for &i in outer {
            let items = as_array(&current, name, line)?;
            let pos = checked_index(&items, i, name, line)?;
            let next = items.borrow()[pos].clone();
            current = next;
        }
        let items = as_array(&current, name, line)?;
        let pos = checked_index(&items, last, name, line)?;
        Ok((items, pos))
    }

    fn call(
        &mut self,
        callee: Value<'a>,
        args: Vec<Value<'a>>,
        line: usize,
    ) -> EvalResult<Value<'a>> {
        match callee {
            Value::Native(native) => self.call_native(native, args, line),
            Value::Function(closure) => self.eval_function(closure, args, line),
            other => Err(RuntimeError::NotCallable {
                text: other.to_string(),
                line,
            }),
        }
    }

    fn call_native(
        &mut self,
        native: &Native,
        args: Vec<Value<'a>>,
        line: usize,
    ) -> EvalResult<Value<'a>> {
        if !native.arity.accepts(args.len()) {
            return Err(RuntimeError::ArityMismatch {
                name: native.name.to_string(),
                expected: native.arity.param_count(),
                found: args.len(),
                line,
            });
        }
        (native.call)(self, args).map_err(|e| RuntimeError::NativeCall {
            name: native.name.to_string(),
            message: e.0,
            line,
        })
    }

    /// Activate a user function in a fresh frame enclosed by its declaring
    /// frame. The frame is released on return unless a closure captured it.
    pub fn eval_function(
        &mut self,
        closure: Closure<'a>,
        args: Vec<Value<'a>>,
        line: usize,
    ) -> EvalResult<Value<'a>> {
        let decl = closure.decl;
        if decl.params.len() != args.len() {
            return Err(RuntimeError::ArityMismatch {
                name: decl.name.clone(),
                expected: decl.params.len(),
                found: args.len(),
                line,
            });
        }
        let Some(body) = &decl.body else {
            return Err(RuntimeError::MissingBody {
                name: decl.name.clone(),
                line,
            });
        };
        if self.depth >= self.config.max_call_depth {
            return Err(RuntimeError::RecursionLimit {
                limit: self.config.max_call_depth,
                line,
            });
        }

        let mark = self.scopes.mark();
        let frame = self.scopes.push(closure.env);
        for (param, arg) in decl.params.iter().zip(args) {
            self.scopes.declare(frame, param.name(), arg);
        }

        let caller = self.current;
        self.current = frame;
        self.depth += 1;
        let result = self.eval_block(body);
        self.depth -= 1;
        self.current = caller;
        if self.pinned < mark {
            self.scopes.truncate(mark);
        }

        match result? {
            Completion::Return(value) => Ok(value),
            Completion::Normal => Ok(Value::Nil),
            Completion::Break => Err(RuntimeError::ControlOutsideLoop {
                keyword: "break",
                line,
            }),
            Completion::Continue => Err(RuntimeError::ControlOutsideLoop {
                keyword: "continue",
                line,
            }),
        }
    }
}

fn as_array<'a>(value: &Value<'a>, name: &str, line: usize) -> EvalResult<ArrayRef<'a>> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        _ => Err(RuntimeError::NotAnArray {
            name: name.to_string(),
            line,
        }),
    }
}

/// Compare every array level of `value` against the declared sizes
fn check_shape(
    value: &Value<'_>,
    sizes: &[Option<usize>],
    name: &str,
    line: usize,
) -> EvalResult<()> {
    let (Some((size, rest)), Value::Array(items)) = (sizes.split_first(), value) else {
        return Ok(());
    };
    let items = items.borrow();
    if let Some(expected) = *size {
        if expected != items.len() {
            return Err(RuntimeError::InitializerMismatch {
                name: name.to_string(),
                expected,
                found: items.len(),
                line,
            });
        }
    }
    items.iter().try_for_each(|item| check_shape(item, rest, name, line))
}

fn checked_index(items: &ArrayRef<'_>, index: i64, name: &str, line: usize) -> EvalResult<usize> {
    let len = items.borrow().len();
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| RuntimeError::IndexOutOfBounds {
            name: name.to_string(),
            index,
            len,
            line,
        })
}

/// Turn the two-character sequences `\n` and `\t` into real control characters
fn expand_escapes(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::check;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn program(source: &str) -> Program {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut program = parse(tokenize(source).unwrap()).unwrap();
        let mut diags = Diagnostics::new();
        check(&mut program, &mut diags);
        assert!(!diags.has_errors(), "unexpected diagnostics: {:?}", diags);
        program
    }

    fn run(source: &str) -> (String, Result<Option<String>, RuntimeError>) {
        let program = program(source);
        let mut out = Vec::new();
        let result = {
            let mut interp = Interpreter::new(&mut out, io::empty());
            interp.execute(&program).map(|v| v.map(|v| v.to_string()))
        };
        (String::from_utf8(out).unwrap(), result)
    }

    #[test]
    fn test_global_initializer() {
        let program = program("x: integer = 1 + 2;");
        let mut interp = Interpreter::new(io::sink(), io::empty());
        let mut diags = Diagnostics::new();
        assert_eq!(interp.interpret(&program, &mut diags), Execution::Completed(None));
        assert_eq!(interp.global("x"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_recursive_factorial() {
        let (_, result) = run(
            "fact: function integer (n: integer) = {
                if (n <= 1) return 1;
                return n * fact(n - 1);
            }
            main: function integer () = { return fact(5); }",
        );
        assert_eq!(result, Ok(Some("120".to_string())));
    }

    #[test]
    fn test_print_expands_escapes() {
        let (out, _) = run(r#"main: function void () = { print "a\tb\n", 3, 'c'; }"#);
        assert_eq!(out, "a\tb\n3c");
    }

    #[test]
    fn test_loops_and_control_signals() {
        let (out, _) = run(
            "main: function void () = {
                i: integer;
                for (i = 0; i < 10; i++) {
                    if (i == 2) continue;
                    if (i == 5) break;
                    print i;
                }
                j: integer = 3;
                while (j > 0) j--;
                do { print j; j++; } while (j < 2);
            }",
        );
        assert_eq!(out, "013401");
    }

    #[test]
    fn test_closures_see_defining_frame() {
        let (_, result) = run(
            "counter: integer = 0;
            bump: function void () = { counter = counter + 1; }
            main: function integer () = {
                counter: integer = 100;
                bump();
                bump();
                return counter;
            }",
        );
        assert_eq!(result, Ok(Some("100".to_string())));
    }

    #[test]
    fn test_assignment_updates_defining_frame() {
        let program = program(
            "total: integer = 0;
            add: function void (n: integer) = { total = total + n; }
            main: function void () = { add(4); add(5); }",
        );
        let mut interp = Interpreter::new(io::sink(), io::empty());
        interp.execute(&program).unwrap();
        assert_eq!(interp.global("total"), Some(&Value::Integer(9)));
    }

    #[test]
    fn test_arrays_share_storage_with_callee() {
        let (out, _) = run(
            "fill: function void (a: array [] integer, n: integer) = {
                i: integer;
                for (i = 0; i < n; i++) a[i] = i * i;
            }
            main: function void () = {
                squares: array [4] integer;
                fill(squares, 4);
                print squares[3], len(squares);
            }",
        );
        assert_eq!(out, "94");
    }

    #[test]
    fn test_index_out_of_bounds() {
        let (_, result) = run(
            "main: function void () = {
                a: array [2] integer = {1, 2};
                print a[2];
            }",
        );
        assert!(matches!(
            result,
            Err(RuntimeError::IndexOutOfBounds { index: 2, len: 2, .. })
        ));
    }

    #[test]
    fn test_recursion_limit() {
        let program = program(
            "down: function integer (n: integer) = { return down(n + 1); }
            main: function integer () = { return down(0); }",
        );
        let config = Config::default().with_max_call_depth(16);
        let mut interp = Interpreter::with_config(config, io::sink(), io::empty());
        assert!(matches!(
            interp.execute(&program),
            Err(RuntimeError::RecursionLimit { limit: 16, .. })
        ));
    }

    #[test]
    fn test_call_frames_are_released() {
        let program = program(
            "id: function integer (n: integer) = { return n; }
            main: function integer () = {
                i: integer;
                total: integer = 0;
                for (i = 0; i < 1000; i++) total = total + id(i);
                return total;
            }",
        );
        let mut interp = Interpreter::new(io::sink(), io::empty());
        let baseline = interp.scopes.mark();
        assert_eq!(interp.execute(&program), Ok(Some(Value::Integer(499500))));
        assert_eq!(interp.scopes.mark(), baseline);
    }

    #[test]
    fn test_frames_of_nested_functions_survive() {
        let program = program(
            "outer: function integer (n: integer) = {
                inner: function integer () = { return n * 2; }
                return inner() + inner();
            }
            id: function integer (n: integer) = { return n; }
            main: function integer () = {
                i: integer;
                total: integer = 0;
                for (i = 0; i < 50; i++) total = total + id(i);
                return outer(5) + outer(1) + total;
            }",
        );
        let mut interp = Interpreter::new(io::sink(), io::empty());
        assert_eq!(interp.execute(&program), Ok(Some(Value::Integer(1249))));
    }

    #[test]
    fn test_inner_initializer_sizes_are_checked() {
        let (_, result) = run(
            "r: array [2] integer = {1, 2};
            m: array [2] array [5] integer = {r, r};
            main: function integer () = { return len(m[0]); }",
        );
        assert_eq!(
            result,
            Err(RuntimeError::InitializerMismatch {
                name: "m".to_string(),
                expected: 5,
                found: 2,
                line: 2
            })
        );
    }

    #[test]
    fn test_initializer_rows_do_not_alias() {
        let (_, result) = run(
            "r: array [2] integer = {1, 2};
            m: array [2] array [2] integer = {r, r};
            main: function integer () = {
                m[0][0] = 9;
                return m[0][0] * 100 + m[1][0] * 10 + r[0];
            }",
        );
        assert_eq!(result, Ok(Some("911".to_string())));
    }

    #[test]
    fn test_prototype_without_body_fails_at_call() {
        let (_, result) = run(
            "later: function integer ();
            main: function integer () = { return later(); }",
        );
        assert!(matches!(result, Err(RuntimeError::MissingBody { .. })));
    }

    #[test]
    fn test_skipped_when_diagnostics_present() {
        let program = program("x: integer = 1;");
        let mut diags = Diagnostics::new();
        diags.error(crate::error::Stage::Semantic, 1, "earlier problem");
        let mut interp = Interpreter::new(io::sink(), io::empty());
        assert_eq!(interp.interpret(&program, &mut diags), Execution::Skipped);
        assert_eq!(interp.global("x"), None);
    }

    #[test]
    fn test_runtime_error_lands_in_diagnostics() {
        let program = program("main: function integer () = { return 1 / 0; }");
        let mut diags = Diagnostics::new();
        let mut interp = Interpreter::new(io::sink(), io::empty());
        assert_eq!(interp.interpret(&program, &mut diags), Execution::Failed);
        assert_eq!(diags.messages(), vec!["division by zero"]);
    }

    #[test]
    fn test_expand_escapes() {
        assert_eq!(expand_escapes(r"a\nb\tc"), "a\nb\tc");
        assert_eq!(expand_escapes("plain"), "plain");
    }
}

//! parlc-sem - the PArL semantic analyzer
//!
//! Two passes over the [`Program`] produced by `parlc-par`, per §4.3:
//!
//! - Pass 1 registers every top-level function's signature in a global
//!   [`FunctionTable`] before any body is checked, so forward references
//!   and recursion resolve.
//! - Pass 2 walks every statement and expression, maintaining a scope
//!   stack of variable bindings and reporting every violation of PArL's
//!   type rules into the shared [`Handler`].
//!
//! The analyzer never rewrites the AST (§4.3 contract) and never stops at
//! the first error: it keeps walking so a single run can report every
//! problem in the program, and only the final `handler.has_errors()` check
//! decides whether code generation may proceed. On success it hands back a
//! [`FunctionTable`] (wrapped in [`AnalysisResult`]) — the one piece of
//! information `parlc-gen` needs that is not already present in the AST:
//! a callee's parameter types, used to know how many elements to push when
//! an argument is an array.

use std::fmt;

use parlc_ast::{BinOp, Block, Expr, LiteralValue, Program, Stmt, Type, UnOp};
use parlc_util::{Handler, Position, Symbol};
use rustc_hash::FxHashMap;

// ============================================================================
// Errors
// ============================================================================

/// One semantic violation, per the taxonomy in §7. Rendered to a
/// [`parlc_util::Diagnostic`] message by its `Display` impl; the analyzer
/// never matches on these variants itself, only constructs and reports them.
#[derive(Debug, thiserror::Error)]
pub enum SemaError {
    #[error("redeclaration of `{name}`")]
    Redeclaration { name: Symbol },
    #[error("undeclared variable `{name}`")]
    UndeclaredVariable { name: Symbol },
    #[error("undeclared function `{name}`")]
    UndeclaredFunction { name: Symbol },
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: Type, found: Type },
    #[error("invalid assignment: {reason}")]
    InvalidAssignment { reason: String },
    #[error("function `{name}` must return a value of type `{return_type}` on every path")]
    MissingReturn { name: Symbol, return_type: Type },
    #[error("`return` used outside of any function")]
    ReturnOutsideFunction,
    #[error("cannot cast `{from}` as `{to}`")]
    InvalidCast { from: Type, to: Type },
    #[error("function `{name}` expects {expected} argument(s), found {found}")]
    ArgumentCountMismatch { name: Symbol, expected: usize, found: usize },
    #[error("function `{name}` argument {index}: expected `{expected}`, found `{found}`")]
    ArgumentTypeMismatch { name: Symbol, index: usize, expected: Type, found: Type },
    #[error("invalid arguments to `{name}`: {reason}")]
    InvalidBuiltinArgs { name: &'static str, reason: String },
}

// ============================================================================
// Symbol table
// ============================================================================

#[derive(Clone, Debug)]
struct VarSymbol {
    ty: Type,
    #[allow(dead_code)]
    pos: Position,
    #[allow(dead_code)]
    is_param: bool,
}

type Scope = FxHashMap<Symbol, VarSymbol>;

/// A registered function's callable shape: parameter types in declaration
/// order and the declared return type. Lives in a single global table
/// (§3.4) separate from the variable scope stack.
#[derive(Clone, Debug)]
pub struct FunctionSignature {
    pub params: Vec<Type>,
    pub return_type: Type,
    pub pos: Position,
}

#[derive(Default, Debug)]
pub struct FunctionTable(FxHashMap<Symbol, FunctionSignature>);

impl FunctionTable {
    pub fn get(&self, name: Symbol) -> Option<&FunctionSignature> {
        self.0.get(&name)
    }
}

/// What `parlc-gen` needs from a successful analysis.
#[derive(Debug)]
pub struct AnalysisResult {
    pub functions: FunctionTable,
}

// ============================================================================
// Analyzer
// ============================================================================

struct Analyzer<'a> {
    handler: &'a mut Handler,
    functions: FunctionTable,
    scopes: Vec<Scope>,
    /// `None` at top level (inside `main`); `Some(return_type)` while
    /// walking a function body.
    current_return_type: Option<Type>,
}

/// Runs both passes over `program`. Returns `Some` iff the program is
/// well-typed; on failure every diagnostic has already been pushed to
/// `handler`.
pub fn analyze(program: &Program, handler: &mut Handler) -> Option<AnalysisResult> {
    let mut analyzer = Analyzer {
        handler,
        functions: FunctionTable::default(),
        scopes: vec![Scope::default()],
        current_return_type: None,
    };
    analyzer.pass1(program);
    analyzer.pass2(program);
    let functions = analyzer.functions;
    if analyzer.handler.has_errors() {
        None
    } else {
        Some(AnalysisResult { functions })
    }
}

impl<'a> Analyzer<'a> {
    fn report(&mut self, pos: Position, err: SemaError) {
        self.handler.error(pos, err.to_string());
    }

    // -- pass 1: function signatures ---------------------------------------

    fn pass1(&mut self, program: &Program) {
        for stmt in &program.statements {
            if let Stmt::FunctionDecl { name, params, return_type, pos, .. } = stmt {
                if self.functions.0.contains_key(name) {
                    self.report(*pos, SemaError::Redeclaration { name: *name });
                    continue;
                }
                let param_types = params.iter().map(|p| p.ty.clone()).collect();
                self.functions.0.insert(
                    *name,
                    FunctionSignature { params: param_types, return_type: return_type.clone(), pos: *pos },
                );
            }
        }
    }

    // -- pass 2: bodies -------------------------------------------------------

    fn pass2(&mut self, program: &Program) {
        for stmt in &program.statements {
            self.check_stmt(stmt);
        }
    }

    fn declare_var(&mut self, name: Symbol, ty: Type, pos: Position, is_param: bool) {
        let scope = self.scopes.last_mut().expect("at least one scope is always open");
        if scope.contains_key(&name) {
            self.report(pos, SemaError::Redeclaration { name });
            return;
        }
        scope.insert(name, VarSymbol { ty, pos, is_param });
    }

    fn lookup_var(&self, name: Symbol) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name)).map(|sym| &sym.ty)
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn check_block(&mut self, block: &Block) {
        self.push_scope();
        for stmt in &block.statements {
            self.check_stmt(stmt);
        }
        self.pop_scope();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl { name, ty, initializer, pos } => {
                let mut declared_ty = ty.clone();
                if let Some(init) = initializer {
                    if let Some(init_ty) = self.check_expr(init) {
                        declared_ty = self.reconcile_var_decl_type(ty, &init_ty, init, *pos);
                    }
                }
                self.declare_var(*name, declared_ty, *pos, false);
            }
            Stmt::Assignment { target, value, pos } => self.check_assignment(target, value, *pos),
            Stmt::If { cond, then_block, else_block, pos } => {
                self.check_condition(cond, *pos);
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
            }
            Stmt::While { cond, body, pos } => {
                self.check_condition(cond, *pos);
                self.check_block(body);
            }
            Stmt::For { init, cond, update, body, pos } => {
                self.push_scope();
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                self.check_condition(cond, *pos);
                if let Some(update) = update {
                    self.check_stmt(update);
                }
                self.check_block(body);
                self.pop_scope();
            }
            Stmt::Return { expr, pos } => self.check_return(expr.as_ref(), *pos),
            Stmt::FunctionDecl { name, params, return_type, body, pos } => {
                self.check_function_decl(*name, params, return_type, body, *pos);
            }
            Stmt::Block { block, .. } => self.check_block(block),
            Stmt::Print { expr, pos } => {
                if let Some(ty) = self.check_expr(expr) {
                    if !matches!(ty, Type::Int | Type::Float | Type::Bool | Type::Colour) {
                        self.report(
                            *pos,
                            SemaError::InvalidBuiltinArgs {
                                name: "__print",
                                reason: format!("cannot print a value of type `{ty}`"),
                            },
                        );
                    }
                }
            }
            Stmt::Delay { expr, pos } => self.expect_scalar(expr, Type::Int, "__delay", *pos),
            Stmt::Write { x, y, color, pos } => {
                self.expect_scalar(x, Type::Int, "__write", *pos);
                self.expect_scalar(y, Type::Int, "__write", *pos);
                self.expect_scalar(color, Type::Colour, "__write", *pos);
            }
            Stmt::WriteBox { x, y, w, h, color, pos } => {
                self.expect_scalar(x, Type::Int, "__write_box", *pos);
                self.expect_scalar(y, Type::Int, "__write_box", *pos);
                self.expect_scalar(w, Type::Int, "__write_box", *pos);
                self.expect_scalar(h, Type::Int, "__write_box", *pos);
                self.expect_scalar(color, Type::Colour, "__write_box", *pos);
            }
            Stmt::Clear { color, pos } => self.expect_scalar(color, Type::Colour, "__clear", *pos),
            Stmt::ExprStmt { expr, .. } => {
                self.check_expr(expr);
            }
        }
    }

    /// Resolves the declared type for a `VarDecl`, applying the "unknown
    /// array size inherits the initializer's length" rule (§4.3).
    fn reconcile_var_decl_type(&mut self, declared: &Type, init_ty: &Type, init: &Expr, pos: Position) -> Type {
        match (declared, init_ty) {
            (Type::Array(elem, None), Type::Array(init_elem, Some(n))) if **elem == **init_elem => {
                Type::Array(elem.clone(), Some(*n))
            }
            _ if declared == init_ty => declared.clone(),
            _ => {
                self.report(init.pos(), SemaError::TypeMismatch { expected: declared.clone(), found: init_ty.clone() });
                let _ = pos;
                declared.clone()
            }
        }
    }

    fn expect_scalar(&mut self, expr: &Expr, expected: Type, name: &'static str, _pos: Position) {
        if let Some(ty) = self.check_expr(expr) {
            if ty != expected {
                self.report(
                    expr.pos(),
                    SemaError::InvalidBuiltinArgs {
                        name,
                        reason: format!("expected `{expected}`, found `{ty}`"),
                    },
                );
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr, _pos: Position) {
        if let Some(ty) = self.check_expr(cond) {
            if ty != Type::Bool {
                self.report(cond.pos(), SemaError::TypeMismatch { expected: Type::Bool, found: ty });
            }
        }
    }

    fn check_assignment(&mut self, target: &parlc_ast::LValue, value: &Expr, pos: Position) {
        let value_ty = self.check_expr(value);
        match target {
            parlc_ast::LValue::Identifier { name, pos: tpos } => {
                let Some(target_ty) = self.lookup_var(*name).cloned() else {
                    self.report(*tpos, SemaError::UndeclaredVariable { name: *name });
                    return;
                };
                if target_ty.is_scalar() {
                    if let Some(value_ty) = value_ty {
                        if value_ty != target_ty {
                            self.report(pos, SemaError::TypeMismatch { expected: target_ty, found: value_ty });
                        }
                    }
                } else {
                    self.report(
                        *tpos,
                        SemaError::InvalidAssignment {
                            reason: format!("cannot assign to whole array `{name}`"),
                        },
                    );
                }
            }
            parlc_ast::LValue::Index { name, index, pos: tpos } => {
                let Some(target_ty) = self.lookup_var(*name).cloned() else {
                    self.report(*tpos, SemaError::UndeclaredVariable { name: *name });
                    return;
                };
                let Type::Array(elem, _) = &target_ty else {
                    self.report(
                        *tpos,
                        SemaError::InvalidAssignment { reason: format!("`{name}` is not an array") },
                    );
                    return;
                };
                if let Some(index_ty) = self.check_expr(index) {
                    if index_ty != Type::Int {
                        self.report(index.pos(), SemaError::TypeMismatch { expected: Type::Int, found: index_ty });
                    }
                }
                if let Some(value_ty) = value_ty {
                    if value_ty != **elem {
                        self.report(pos, SemaError::TypeMismatch { expected: (**elem).clone(), found: value_ty });
                    }
                }
            }
        }
    }

    fn check_return(&mut self, expr: Option<&Expr>, pos: Position) {
        let Some(return_type) = self.current_return_type.clone() else {
            self.report(pos, SemaError::ReturnOutsideFunction);
            if let Some(expr) = expr {
                self.check_expr(expr);
            }
            return;
        };
        match (expr, &return_type) {
            (None, Type::Void) => {}
            (None, other) => {
                self.report(pos, SemaError::TypeMismatch { expected: other.clone(), found: Type::Void });
            }
            (Some(expr), Type::Void) => {
                if let Some(ty) = self.check_expr(expr) {
                    self.report(expr.pos(), SemaError::TypeMismatch { expected: Type::Void, found: ty });
                }
            }
            (Some(expr), other) => {
                if let Some(ty) = self.check_expr(expr) {
                    if ty != *other {
                        self.report(expr.pos(), SemaError::TypeMismatch { expected: other.clone(), found: ty });
                    }
                }
            }
        }
    }

    fn check_function_decl(
        &mut self,
        name: Symbol,
        params: &[parlc_ast::FormalParameter],
        return_type: &Type,
        body: &Block,
        pos: Position,
    ) {
        let saved_scopes = std::mem::replace(&mut self.scopes, vec![Scope::default()]);
        let saved_return_type = self.current_return_type.replace(return_type.clone());

        for param in params {
            self.declare_var(param.name, param.ty.clone(), param.pos, true);
        }
        for stmt in &body.statements {
            self.check_stmt(stmt);
        }

        self.scopes = saved_scopes;
        self.current_return_type = saved_return_type;

        if *return_type != Type::Void && !block_contains_return(body) {
            self.report(pos, SemaError::MissingReturn { name, return_type: return_type.clone() });
        }
    }

    // -- expressions ----------------------------------------------------------

    fn check_expr(&mut self, expr: &Expr) -> Option<Type> {
        match expr {
            Expr::Literal { ty, .. } => Some(ty.clone()),
            Expr::Identifier { name, pos } => match self.lookup_var(*name).cloned() {
                Some(ty) => Some(ty),
                None => {
                    self.report(*pos, SemaError::UndeclaredVariable { name: *name });
                    None
                }
            },
            Expr::Binary { left, op, right, pos } => self.check_binary(left, *op, right, *pos),
            Expr::Unary { op, operand, pos } => self.check_unary(*op, operand, *pos),
            Expr::Cast { expr, target_type, pos } => self.check_cast(expr, target_type, *pos),
            Expr::Call { name, args, pos } => self.check_call(*name, args, *pos),
            Expr::Index { base, index, pos } => self.check_index(base, index, *pos),
            Expr::ArrayLiteral { elements, pos } => self.check_array_literal(elements, *pos),
            Expr::Width { .. } | Expr::Height { .. } => Some(Type::Int),
            Expr::Read { x, y, pos } => {
                self.expect_scalar(x, Type::Int, "__read", *pos);
                self.expect_scalar(y, Type::Int, "__read", *pos);
                Some(Type::Colour)
            }
            Expr::RandI { max, pos } => {
                self.expect_scalar(max, Type::Int, "__randi", *pos);
                Some(Type::Int)
            }
        }
    }

    fn check_binary(&mut self, left: &Expr, op: BinOp, right: &Expr, pos: Position) -> Option<Type> {
        let lt = self.check_expr(left)?;
        let rt = self.check_expr(right)?;
        if lt != rt {
            self.report(pos, SemaError::TypeMismatch { expected: lt, found: rt });
            return None;
        }
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                if matches!(lt, Type::Int | Type::Float) {
                    Some(lt)
                } else {
                    self.report(pos, SemaError::TypeMismatch { expected: Type::Int, found: lt });
                    None
                }
            }
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
                if matches!(lt, Type::Int | Type::Float | Type::Bool | Type::Colour) {
                    Some(Type::Bool)
                } else {
                    self.report(pos, SemaError::TypeMismatch { expected: Type::Int, found: lt });
                    None
                }
            }
            BinOp::And | BinOp::Or => {
                if lt == Type::Bool {
                    Some(Type::Bool)
                } else {
                    self.report(pos, SemaError::TypeMismatch { expected: Type::Bool, found: lt });
                    None
                }
            }
        }
    }

    fn check_unary(&mut self, op: UnOp, operand: &Expr, pos: Position) -> Option<Type> {
        let ty = self.check_expr(operand)?;
        match op {
            UnOp::Neg => {
                if matches!(ty, Type::Int | Type::Float) {
                    Some(ty)
                } else {
                    self.report(pos, SemaError::TypeMismatch { expected: Type::Int, found: ty });
                    None
                }
            }
            UnOp::Not => {
                if ty == Type::Bool {
                    Some(Type::Bool)
                } else {
                    self.report(pos, SemaError::TypeMismatch { expected: Type::Bool, found: ty });
                    None
                }
            }
        }
    }

    fn check_cast(&mut self, expr: &Expr, target: &Type, pos: Position) -> Option<Type> {
        let from = self.check_expr(expr)?;
        if from == *target || legal_cast(&from, target) {
            Some(target.clone())
        } else {
            self.report(pos, SemaError::InvalidCast { from, to: target.clone() });
            None
        }
    }

    fn check_call(&mut self, name: Symbol, args: &[Expr], pos: Position) -> Option<Type> {
        let arg_types: Vec<Option<Type>> = args.iter().map(|a| self.check_expr(a)).collect();
        let Some(sig) = self.functions.get(name).cloned() else {
            self.report(pos, SemaError::UndeclaredFunction { name });
            return None;
        };
        if sig.params.len() != args.len() {
            self.report(
                pos,
                SemaError::ArgumentCountMismatch { name, expected: sig.params.len(), found: args.len() },
            );
            return Some(sig.return_type);
        }
        for (i, (expected, found)) in sig.params.iter().zip(arg_types.iter()).enumerate() {
            if let Some(found) = found {
                if found != expected {
                    self.report(
                        args[i].pos(),
                        SemaError::ArgumentTypeMismatch {
                            name,
                            index: i,
                            expected: expected.clone(),
                            found: found.clone(),
                        },
                    );
                }
            }
        }
        Some(sig.return_type)
    }

    fn check_index(&mut self, base: &Expr, index: &Expr, pos: Position) -> Option<Type> {
        let base_ty = self.check_expr(base)?;
        if let Some(index_ty) = self.check_expr(index) {
            if index_ty != Type::Int {
                self.report(index.pos(), SemaError::TypeMismatch { expected: Type::Int, found: index_ty });
            }
        }
        match base_ty {
            Type::Array(elem, _) => Some(*elem),
            other => {
                self.report(pos, SemaError::InvalidAssignment { reason: format!("`{other}` is not an array") });
                None
            }
        }
    }

    fn check_array_literal(&mut self, elements: &[Expr], pos: Position) -> Option<Type> {
        if elements.is_empty() {
            self.report(pos, SemaError::InvalidAssignment { reason: "array literal must not be empty".into() });
            return None;
        }
        let mut elem_ty: Option<Type> = None;
        for e in elements {
            let ty = self.check_expr(e)?;
            match &elem_ty {
                None => elem_ty = Some(ty),
                Some(prev) if *prev == ty => {}
                Some(prev) => {
                    self.report(e.pos(), SemaError::TypeMismatch { expected: prev.clone(), found: ty });
                    return None;
                }
            }
        }
        Some(Type::Array(Box::new(elem_ty.unwrap()), Some(elements.len() as u32)))
    }
}

/// The fixed legal-cast set from §4.3, excluding the identity case (handled
/// separately by the caller).
fn legal_cast(from: &Type, to: &Type) -> bool {
    matches!(
        (from, to),
        (Type::Int, Type::Float)
            | (Type::Float, Type::Int)
            | (Type::Int, Type::Bool)
            | (Type::Bool, Type::Int)
            | (Type::Int, Type::Colour)
            | (Type::Colour, Type::Int)
    )
}

/// Structural "does this function body contain a `return` anywhere"
/// check (§3.6, §4.3): a weaker any-path property, not full control-flow
/// coverage.
fn block_contains_return(block: &Block) -> bool {
    block.statements.iter().any(stmt_contains_return)
}

fn stmt_contains_return(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return { .. } => true,
        Stmt::If { then_block, else_block, .. } => {
            block_contains_return(then_block) || else_block.as_ref().is_some_and(block_contains_return)
        }
        Stmt::While { body, .. } | Stmt::For { body, .. } => block_contains_return(body),
        Stmt::Block { block, .. } => block_contains_return(block),
        _ => false,
    }
}

impl fmt::Display for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionTable({} functions)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_src(src: &str) -> (Option<AnalysisResult>, Handler) {
        let mut handler = Handler::new();
        let program = parlc_par::parse(src, &mut handler);
        assert!(!handler.has_errors(), "parse errors: {:?}", handler.diagnostics());
        let mut handler = Handler::new();
        let result = analyze(&program, &mut handler);
        (result, handler)
    }

    #[test]
    fn accepts_well_typed_program() {
        let (result, handler) = analyze_src("let x: int = 2 + 3 * 4; __print x;");
        assert!(!handler.has_errors());
        assert!(result.is_some());
    }

    #[test]
    fn rejects_int_literal_assigned_to_bool() {
        let (_, handler) = analyze_src("let b: bool = 1;");
        assert!(handler.has_errors());
        assert!(handler.diagnostics()[0].message.contains("type mismatch"));
    }

    #[test]
    fn rejects_undeclared_variable() {
        let (_, handler) = analyze_src("__print y;");
        assert!(handler.has_errors());
    }

    #[test]
    fn rejects_redeclaration_in_same_scope() {
        let (_, handler) = analyze_src("let x: int = 1; let x: int = 2;");
        assert!(handler.has_errors());
    }

    #[test]
    fn allows_shadowing_in_nested_scope() {
        let (_, handler) = analyze_src("let x: int = 1; { let x: bool = true; }");
        assert!(!handler.has_errors());
    }

    #[test]
    fn forward_reference_to_function_is_allowed() {
        let (result, handler) =
            analyze_src("let y: int = f(1); fun f(n: int) -> int { return n; }");
        assert!(!handler.has_errors());
        assert!(result.is_some());
    }

    #[test]
    fn recursive_call_resolves() {
        let (_, handler) = analyze_src(
            "fun f(n: int) -> int { if (n <= 1) { return 1; } return n * f(n - 1); } let y: int = f(5);",
        );
        assert!(!handler.has_errors());
    }

    #[test]
    fn missing_return_is_an_error() {
        let (_, handler) = analyze_src("fun f() -> int { let x: int = 1; }");
        assert!(handler.has_errors());
    }

    #[test]
    fn void_function_without_return_is_fine() {
        let (_, handler) = analyze_src("fun f() -> void { let x: int = 1; }");
        assert!(!handler.has_errors());
    }

    #[test]
    fn argument_count_mismatch_is_an_error() {
        let (_, handler) = analyze_src("fun f(n: int) -> int { return n; } let y: int = f(1, 2);");
        assert!(handler.has_errors());
    }

    #[test]
    fn argument_type_mismatch_is_an_error() {
        let (_, handler) = analyze_src("fun f(n: int) -> int { return n; } let y: int = f(true);");
        assert!(handler.has_errors());
    }

    #[test]
    fn array_literal_resolves_unknown_size() {
        let (_, handler) = analyze_src("let a: int[] = [1, 2, 3]; __print a[0];");
        assert!(!handler.has_errors());
    }

    #[test]
    fn array_size_mismatch_is_an_error() {
        let (_, handler) = analyze_src("let a: int[4] = [1, 2, 3];");
        assert!(handler.has_errors());
    }

    #[test]
    fn whole_array_assignment_is_an_error() {
        let (_, handler) = analyze_src("let a: int[3] = [1, 2, 3]; let b: int[3] = [4, 5, 6]; a = b;");
        assert!(handler.has_errors());
    }

    #[test]
    fn legal_cast_is_accepted() {
        let (_, handler) = analyze_src("let x: float = 1 as float;");
        assert!(!handler.has_errors());
    }

    #[test]
    fn illegal_cast_is_rejected() {
        let (_, handler) = analyze_src("let x: bool = 1.5 as bool;");
        assert!(handler.has_errors());
    }

    #[test]
    fn return_outside_function_is_an_error() {
        let (_, handler) = analyze_src("return 1;");
        assert!(handler.has_errors());
    }

    #[test]
    fn condition_must_be_bool() {
        let (_, handler) = analyze_src("if (1) { __print 1; }");
        assert!(handler.has_errors());
    }

    #[test]
    fn function_cannot_see_enclosing_top_level_variables() {
        let (_, handler) = analyze_src("let x: int = 1; fun f() -> int { return x; }");
        assert!(handler.has_errors());
    }

    #[test]
    fn param_collides_with_local_is_redeclaration() {
        let (_, handler) = analyze_src("fun f(n: int) -> int { let n: int = 2; return n; }");
        assert!(handler.has_errors());
    }
}

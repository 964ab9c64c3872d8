//! parlc-gen - the PArIR code generator
//!
//! Lowers a type-checked AST into the textual PArIR instruction stream
//! (§4.4, §6.2). The generator never re-validates types; it trusts that
//! `parlc-sem` already accepted the program, and its only failure modes are
//! the two internal-consistency cases in §7 (an array whose size was never
//! resolved, or a backpatch/addressing bug it detects about itself).
//!
//! Two mechanisms carry the whole design:
//!
//! - **Frame/level addressing.** Every `oframe`/function-entry opens one
//!   more frame on a scope stack; a variable found `d` frames down from the
//!   top is addressed `[index : depth - d]`. The same rule is applied
//!   whether the use site is inside `main` or inside a function body -
//!   there is no special-cased "level 0 because we're in a function".
//! - **Two-pass function emission.** Before emitting a function's real
//!   header (`push #PC+skip ; jmp ; .F`), a disposable copy of the
//!   generator lowers the same body into a scratch buffer to measure its
//!   length. The real pass then bakes the resulting skip distance directly
//!   into the header; nothing is backpatched after the fact, and no
//!   generator state leaks between the scratch run and the real one
//!   because the scratch run operates on its own independent copy.

use std::fmt::Write as _;

use parlc_ast::{BinOp, Block, Expr, FormalParameter, LValue, LiteralValue, Program, Stmt, Type, UnOp};
use parlc_sem::{AnalysisResult, FunctionSignature};
use parlc_util::Symbol;
use rustc_hash::FxHashMap;

#[derive(Debug, thiserror::Error)]
pub enum CodeGenError {
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),
    #[error("array size was never resolved for `{0}`")]
    UnresolvedArraySize(Symbol),
}

type Result<T> = std::result::Result<T, CodeGenError>;

/// Emits the full PArIR listing for `program`, returning one instruction
/// per element. `analysis` supplies the function signature table computed
/// by `parlc-sem`; `program` is assumed to have already passed that
/// analysis (the generator does not re-check types).
pub fn generate(program: &Program, analysis: &AnalysisResult) -> Result<Vec<String>> {
    let mut gen = Generator::new(&analysis.functions);
    gen.run(program)?;
    Ok(gen.instructions)
}

#[derive(Clone, Copy, Debug)]
struct VarSlot {
    index: u32,
    size: u32,
}

type GenScope = FxHashMap<Symbol, VarSlot>;

struct Generator<'a> {
    functions: &'a parlc_sem::FunctionTable,
    instructions: Vec<String>,
    scopes: Vec<GenScope>,
    next_index: Vec<u32>,
}

impl<'a> Generator<'a> {
    fn new(functions: &'a parlc_sem::FunctionTable) -> Self {
        Self { functions, instructions: Vec::new(), scopes: Vec::new(), next_index: Vec::new() }
    }

    /// A disposable copy sharing only the function table, used to measure a
    /// function body's instruction count without touching `self`'s state.
    fn scratch(&self) -> Self {
        Self { functions: self.functions, instructions: Vec::new(), scopes: Vec::new(), next_index: Vec::new() }
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.instructions.push(line.into());
    }

    fn emit_push_imm(&mut self, v: impl std::fmt::Display) {
        self.emit(format!("push {v}"));
    }

    fn here(&self) -> usize {
        self.instructions.len()
    }

    // -- scope management ---------------------------------------------------

    fn push_scope(&mut self) {
        self.scopes.push(GenScope::default());
        self.next_index.push(0);
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
        self.next_index.pop();
    }

    fn declare(&mut self, name: Symbol, size: u32) -> u32 {
        let depth = self.scopes.len() - 1;
        let index = self.next_index[depth];
        self.next_index[depth] += size;
        self.scopes[depth].insert(name, VarSlot { index, size });
        index
    }

    fn lookup(&self, name: Symbol) -> Result<(u32, u32, u32)> {
        let top = self.scopes.len();
        for (d, scope) in self.scopes.iter().enumerate().rev() {
            if let Some(slot) = scope.get(&name) {
                let level = (top - 1 - d) as u32;
                return Ok((slot.index, level, slot.size));
            }
        }
        Err(CodeGenError::InternalConsistency(format!("`{name}` has no frame slot at code-gen time")))
    }

    // -- top-level driver -----------------------------------------------------

    fn run(&mut self, program: &Program) -> Result<()> {
        self.emit(".main");
        self.emit_push_imm(4);
        self.emit("jmp");
        self.emit("halt");

        let main_stmts: Vec<&Stmt> = program.statements.iter().filter(|s| !matches!(s, Stmt::FunctionDecl { .. })).collect();
        let main_frame_size = frame_size_of(main_stmts.iter().copied())?;
        self.emit_push_imm(main_frame_size);
        self.emit("oframe");
        self.push_scope();

        for stmt in &program.statements {
            if let Stmt::FunctionDecl { name, params, return_type, body, .. } = stmt {
                self.emit_function(*name, params, return_type, body)?;
            }
        }

        for stmt in main_stmts {
            self.lower_stmt(stmt, false)?;
        }

        self.pop_scope();
        self.emit("cframe");
        self.emit("halt");
        Ok(())
    }

    // -- functions --------------------------------------------------------

    fn emit_function(&mut self, name: Symbol, params: &[FormalParameter], return_type: &Type, body: &Block) -> Result<()> {
        let body_len = {
            let mut scratch = self.scratch();
            scratch.lower_function_body(params, body)?;
            scratch.instructions.len()
        };
        let skip = 3 + body_len;
        self.emit_push_imm(format!("#PC+{skip}"));
        self.emit("jmp");
        self.emit(format!(".{name}"));
        let body_start = self.here();
        self.lower_function_body(params, body)?;
        let _ = return_type;
        debug_assert_eq!(self.here() - body_start, body_len);
        Ok(())
    }

    /// Lowers one function's parameters and body, appending a trailing
    /// `ret` so every function body ends in one (§4.4, contract). Shared
    /// verbatim between the dry-run scratch copy and the real emission so
    /// both measure/produce the exact same instruction count.
    fn lower_function_body(&mut self, params: &[FormalParameter], body: &Block) -> Result<()> {
        self.push_scope();
        for p in params {
            let size = slot_size(&p.ty).unwrap_or(1);
            self.declare(p.name, size);
        }
        for stmt in &body.statements {
            self.lower_stmt(stmt, true)?;
        }
        self.emit("ret");
        self.pop_scope();
        Ok(())
    }

    // -- statements -----------------------------------------------------------

    /// `alloc_decls`: true for statements directly at a function's own
    /// top level (which shares its frame with the parameters and grows it
    /// with `alloc`), false for `main`'s top level and every nested block
    /// (whose frame size is already fixed by an enclosing `oframe`).
    fn lower_stmt(&mut self, stmt: &Stmt, alloc_decls: bool) -> Result<()> {
        match stmt {
            Stmt::VarDecl { name, ty, initializer, .. } => self.lower_var_decl(*name, ty, initializer.as_ref(), alloc_decls),
            Stmt::Assignment { target, value, .. } => self.lower_assignment(target, value),
            Stmt::If { cond, then_block, else_block, .. } => self.lower_if(cond, then_block, else_block.as_ref()),
            Stmt::While { cond, body, .. } => self.lower_while(cond, body),
            Stmt::For { init, cond, update, body, .. } => self.lower_for(init.as_deref(), cond, update.as_deref(), body),
            Stmt::Return { expr, .. } => self.lower_return(expr.as_ref()),
            Stmt::FunctionDecl { .. } => Ok(()),
            Stmt::Block { block, .. } => self.lower_block(block),
            Stmt::Print { expr, .. } => {
                self.lower_expr(expr)?;
                self.emit("print");
                Ok(())
            }
            Stmt::Delay { expr, .. } => {
                self.lower_expr(expr)?;
                self.emit("delay");
                Ok(())
            }
            Stmt::Write { x, y, color, .. } => {
                self.lower_expr(color)?;
                self.lower_expr(y)?;
                self.lower_expr(x)?;
                self.emit("write");
                Ok(())
            }
            Stmt::WriteBox { x, y, w, h, color, .. } => {
                self.lower_expr(color)?;
                self.lower_expr(w)?;
                self.lower_expr(h)?;
                self.lower_expr(y)?;
                self.lower_expr(x)?;
                self.emit("writebox");
                Ok(())
            }
            Stmt::Clear { color, .. } => {
                self.lower_expr(color)?;
                self.emit("clear");
                Ok(())
            }
            Stmt::ExprStmt { expr, .. } => self.lower_expr(expr).map(|_| ()),
        }
    }

    fn lower_var_decl(&mut self, name: Symbol, ty: &Type, initializer: Option<&Expr>, alloc_decls: bool) -> Result<()> {
        let size = slot_size(ty).ok_or(CodeGenError::UnresolvedArraySize(name))?;
        match ty {
            Type::Array(_, _) => {
                if let Some(Expr::ArrayLiteral { elements, .. }) = initializer {
                    for elem in elements.iter().rev() {
                        self.lower_expr(elem)?;
                    }
                    self.emit_push_imm(elements.len());
                }
                if alloc_decls {
                    self.emit_push_imm(size);
                    self.emit("alloc");
                }
                let index = self.declare(name, size);
                if initializer.is_some() {
                    self.emit_push_imm(index);
                    self.emit_push_imm(self.current_level());
                    self.emit("sta");
                }
            }
            _ => {
                if let Some(init) = initializer {
                    self.lower_expr(init)?;
                }
                if alloc_decls {
                    self.emit_push_imm(size);
                    self.emit("alloc");
                }
                let index = self.declare(name, size);
                if initializer.is_some() {
                    self.emit_push_imm(index);
                    self.emit_push_imm(self.current_level());
                    self.emit("st");
                }
            }
        }
        Ok(())
    }

    fn current_level(&self) -> u32 {
        0
    }

    fn lower_assignment(&mut self, target: &LValue, value: &Expr) -> Result<()> {
        match target {
            LValue::Identifier { name, .. } => {
                self.lower_expr(value)?;
                let (index, level, _) = self.lookup(*name)?;
                self.emit_push_imm(index);
                self.emit_push_imm(level);
                self.emit("st");
            }
            LValue::Index { name, index, .. } => {
                self.lower_expr(value)?;
                self.lower_expr(index)?;
                let (base, level, _) = self.lookup(*name)?;
                self.emit_push_imm(base);
                self.emit("add");
                self.emit_push_imm(level);
                self.emit("st");
            }
        }
        Ok(())
    }

    fn lower_if(&mut self, cond: &Expr, then_block: &Block, else_block: Option<&Block>) -> Result<()> {
        self.lower_expr(cond)?;
        let cjmp_push = self.here();
        self.emit_push_imm("#PC+4");
        self.emit("cjmp");
        let else_push = self.here();
        self.emit_push_imm("#PC+0");
        self.emit("jmp");
        self.patch(cjmp_push, self.here());

        self.lower_block(then_block)?;

        if let Some(else_block) = else_block {
            let end_push = self.here();
            self.emit_push_imm("#PC+0");
            self.emit("jmp");
            self.patch(else_push, self.here());
            self.lower_block(else_block)?;
            self.patch(end_push, self.here());
        } else {
            self.patch(else_push, self.here());
        }
        Ok(())
    }

    fn lower_while(&mut self, cond: &Expr, body: &Block) -> Result<()> {
        let loop_start = self.here();
        self.lower_expr(cond)?;
        let cjmp_push = self.here();
        self.emit_push_imm("#PC+4");
        self.emit("cjmp");
        let exit_push = self.here();
        self.emit_push_imm("#PC+0");
        self.emit("jmp");
        self.patch(cjmp_push, self.here());

        self.lower_block(body)?;

        let back_push = self.here();
        self.emit_push_imm(format!("#PC-{}", back_push.saturating_sub(loop_start)));
        self.emit("jmp");
        self.patch(exit_push, self.here());
        Ok(())
    }

    fn lower_for(&mut self, init: Option<&Stmt>, cond: &Expr, update: Option<&Stmt>, body: &Block) -> Result<()> {
        let has_init = init.is_some();
        if has_init {
            let loop_var_size = for_init_size(init)?;
            self.emit_push_imm(loop_var_size);
            self.emit("oframe");
            self.push_scope();
        }
        if let Some(init) = init {
            self.lower_stmt(init, false)?;
        }

        let loop_start = self.here();
        self.lower_expr(cond)?;
        let cjmp_push = self.here();
        self.emit_push_imm("#PC+4");
        self.emit("cjmp");
        let exit_push = self.here();
        self.emit_push_imm("#PC+0");
        self.emit("jmp");
        self.patch(cjmp_push, self.here());

        self.lower_block(body)?;

        if let Some(update) = update {
            self.lower_stmt(update, false)?;
        }

        let back_push = self.here();
        self.emit_push_imm(format!("#PC-{}", back_push.saturating_sub(loop_start)));
        self.emit("jmp");
        self.patch(exit_push, self.here());

        if has_init {
            self.pop_scope();
            self.emit("cframe");
        }
        Ok(())
    }

    fn lower_return(&mut self, expr: Option<&Expr>) -> Result<()> {
        if let Some(expr) = expr {
            self.lower_expr(expr)?;
        }
        self.emit("ret");
        Ok(())
    }

    fn lower_block(&mut self, block: &Block) -> Result<()> {
        let size = frame_size_of(block.statements.iter())?;
        self.emit_push_imm(size);
        self.emit("oframe");
        self.push_scope();
        for stmt in &block.statements {
            self.lower_stmt(stmt, false)?;
        }
        self.pop_scope();
        self.emit("cframe");
        Ok(())
    }

    /// Overwrites the `push #PC±k` placeholder emitted at `push_idx` so it
    /// targets `target_idx`, relative to the push instruction's own index
    /// (the VM resolves `#PC+k` against the PC of the instruction computing
    /// it, one earlier than the `jmp`/`cjmp` that consumes the result).
    fn patch(&mut self, push_idx: usize, target_idx: usize) {
        let k = target_idx as i64 - push_idx as i64;
        let sign = if k >= 0 { '+' } else { '-' };
        self.instructions[push_idx] = format!("push #PC{sign}{}", k.unsigned_abs());
    }

    // -- expressions ------------------------------------------------------

    fn lower_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal { value, .. } => self.lower_literal(value),
            Expr::Identifier { name, .. } => {
                let (index, level, _) = self.lookup(*name)?;
                self.emit_push_imm(format!("[{index}:{level}]"));
                Ok(())
            }
            Expr::Binary { left, op, right, .. } => self.lower_binary(left, *op, right),
            Expr::Unary { op, operand, .. } => self.lower_unary(*op, operand),
            Expr::Cast { expr, .. } => self.lower_expr(expr),
            Expr::Call { name, args, .. } => self.lower_call(*name, args),
            Expr::Index { base, index, .. } => self.lower_index(base, index),
            Expr::ArrayLiteral { elements, .. } => {
                for elem in elements {
                    self.lower_expr(elem)?;
                }
                Ok(())
            }
            Expr::Width { .. } => {
                self.emit("width");
                Ok(())
            }
            Expr::Height { .. } => {
                self.emit("height");
                Ok(())
            }
            Expr::Read { x, y, .. } => {
                self.lower_expr(y)?;
                self.lower_expr(x)?;
                self.emit("read");
                Ok(())
            }
            Expr::RandI { max, .. } => {
                self.lower_expr(max)?;
                self.emit("irnd");
                Ok(())
            }
        }
    }

    fn lower_literal(&mut self, value: &LiteralValue) -> Result<()> {
        match value {
            LiteralValue::Int(v) => self.emit_push_imm(v),
            LiteralValue::Float(v) => self.emit_push_imm(v),
            LiteralValue::Bool(v) => self.emit_push_imm(if *v { 1 } else { 0 }),
            LiteralValue::Colour(v) => self.emit_push_imm(format_colour(*v)),
        }
        Ok(())
    }

    fn lower_binary(&mut self, left: &Expr, op: BinOp, right: &Expr) -> Result<()> {
        if op == BinOp::NotEq {
            self.lower_expr(right)?;
            self.lower_expr(left)?;
            self.emit("eq");
            self.emit("not");
            return Ok(());
        }
        self.lower_expr(right)?;
        self.lower_expr(left)?;
        self.emit(binop_mnemonic(op));
        Ok(())
    }

    fn lower_unary(&mut self, op: UnOp, operand: &Expr) -> Result<()> {
        match op {
            UnOp::Neg => {
                self.lower_expr(operand)?;
                self.emit_push_imm(0);
                self.emit("sub");
            }
            UnOp::Not => {
                self.lower_expr(operand)?;
                self.emit("not");
            }
        }
        Ok(())
    }

    fn lower_call(&mut self, name: Symbol, args: &[Expr]) -> Result<()> {
        let sig = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| CodeGenError::InternalConsistency(format!("call to unresolved function `{name}`")))?;
        let mut total_slots = 0u32;
        for (arg, param_ty) in args.iter().zip(sig.params.iter()).rev() {
            total_slots += self.lower_call_argument(arg, param_ty)?;
        }
        self.emit_push_imm(total_slots);
        self.emit(format!("push .{name}"));
        self.emit("call");
        Ok(())
    }

    fn lower_call_argument(&mut self, arg: &Expr, param_ty: &Type) -> Result<u32> {
        match param_ty {
            Type::Array(_, Some(n)) => match arg {
                Expr::Identifier { name, .. } => {
                    let (base, level, _) = self.lookup(*name)?;
                    for k in (0..*n).rev() {
                        self.emit_push_imm(k);
                        self.emit_push_imm(format!("+[{base}:{level}]"));
                    }
                    Ok(*n)
                }
                Expr::ArrayLiteral { elements, .. } => {
                    for elem in elements.iter().rev() {
                        self.lower_expr(elem)?;
                    }
                    Ok(elements.len() as u32)
                }
                other => Err(CodeGenError::InternalConsistency(format!(
                    "array argument at {:?} is neither a variable nor a literal",
                    other.pos()
                ))),
            },
            _ => {
                self.lower_expr(arg)?;
                Ok(1)
            }
        }
    }

    fn lower_index(&mut self, base: &Expr, index: &Expr) -> Result<()> {
        let Expr::Identifier { name, .. } = base else {
            return Err(CodeGenError::InternalConsistency("indexed base is not a plain identifier".into()));
        };
        self.lower_expr(index)?;
        let (base_index, level, _) = self.lookup(*name)?;
        self.emit_push_imm(format!("+[{base_index}:{level}]"));
        Ok(())
    }
}

fn binop_mnemonic(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "mul",
        BinOp::Div => "div",
        BinOp::Mod => "mod",
        BinOp::Eq => "eq",
        BinOp::NotEq => unreachable!("NotEq is lowered to eq;not by the caller"),
        BinOp::Lt => "lt",
        BinOp::Gt => "gt",
        BinOp::LtEq => "le",
        BinOp::GtEq => "ge",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}

fn format_colour(v: u32) -> String {
    let mut s = String::new();
    let _ = write!(s, "0x{v:06x}");
    s
}

/// The slot width of a resolved type: 1 for every scalar, the element
/// count for a sized array. `None` means the array's size was never
/// resolved - only possible for a parameter whose declared type kept an
/// unresolved `[]` (see DESIGN.md); reaching code generation with one
/// anywhere else is an analyzer bug.
fn slot_size(ty: &Type) -> Option<u32> {
    match ty {
        Type::Array(_, Some(n)) => Some(*n),
        Type::Array(_, None) => None,
        _ => Some(1),
    }
}

fn for_init_size(init: Option<&Stmt>) -> Result<u32> {
    match init {
        None => Ok(0),
        Some(Stmt::VarDecl { name, ty, .. }) => slot_size(ty).ok_or(CodeGenError::UnresolvedArraySize(*name)),
        Some(other) => Err(CodeGenError::InternalConsistency(format!(
            "for-loop initializer at {:?} is not a variable declaration",
            other.pos()
        ))),
    }
}

/// Sums the slot width of every variable declared directly in `stmts`
/// (not recursing into nested blocks), used to size an `oframe`/main's
/// initial frame before any of its statements run.
fn frame_size_of<'a>(stmts: impl Iterator<Item = &'a Stmt>) -> Result<u32> {
    let mut total = 0u32;
    for stmt in stmts {
        if let Stmt::VarDecl { name, ty, .. } = stmt {
            total += slot_size(ty).ok_or(CodeGenError::UnresolvedArraySize(*name))?;
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(src: &str) -> Vec<String> {
        let mut handler = parlc_util::Handler::new();
        let program = parlc_par::parse(src, &mut handler);
        assert!(!handler.has_errors(), "parse errors: {:?}", handler.diagnostics());
        let mut handler = parlc_util::Handler::new();
        let analysis = parlc_sem::analyze(&program, &mut handler).expect("should pass analysis");
        generate(&program, &analysis).expect("should generate")
    }

    // S1
    #[test]
    fn arithmetic_precedence_emits_one_mul_and_ends_with_print_halt() {
        let out = compile("let x:int = 2 + 3 * 4; __print x;");
        assert_eq!(out.iter().filter(|l| *l == "mul").count(), 1);
        assert_eq!(out.iter().filter(|l| *l == "add").count(), 1);
        assert_eq!(out[out.len() - 1], "halt");
        assert!(out.iter().any(|l| l == "print"));
    }

    // S2
    #[test]
    fn array_decl_and_index_emit_sta_and_indexed_push() {
        let out = compile("let a:int[] = [10,20,30]; __print a[1];");
        assert_eq!(out.iter().filter(|l| *l == "sta").count(), 1);
        assert!(out.iter().any(|l| l.starts_with("push +[")));
    }

    // S3
    #[test]
    fn recursive_function_emits_label_and_call() {
        let out = compile(
            "fun f(n:int)->int{ if(n<=1){return 1;} return n*f(n-1);} let y:int = f(5);",
        );
        assert!(out.iter().any(|l| l == ".f"));
        assert!(out.iter().any(|l| l == "call"));
    }

    // S4
    #[test]
    fn for_loop_emits_backward_jump() {
        let out = compile("for(let i:int=0;i<3;i=i+1){ __print i; }");
        assert!(out.iter().any(|l| l.starts_with("push #PC-")));
        assert!(out.iter().any(|l| l == "oframe"));
        assert!(out.iter().any(|l| l == "cframe"));
    }

    #[test]
    fn function_body_ends_in_ret() {
        let out = compile("fun f(n:int)->int{ return n; } let y:int = f(1);");
        let label_idx = out.iter().position(|l| l == ".f").unwrap();
        assert_eq!(out[label_idx + 1], "push [0:0]");
        assert!(out[label_idx..].iter().any(|l| l == "ret"));
    }

    #[test]
    fn not_equal_lowers_to_eq_then_not() {
        let out = compile("let b:bool = 1 != 2;");
        let pos = out.iter().position(|l| l == "eq").unwrap();
        assert_eq!(out[pos + 1], "not");
    }

    #[test]
    fn if_without_else_patches_to_fallthrough() {
        let out = compile("if (true) { __print 1; }");
        assert!(out.iter().any(|l| l == "cjmp"));
    }

    #[test]
    fn while_loop_has_matching_frame_and_backedge() {
        let out = compile("let i:int = 0; while (i < 3) { i = i + 1; }");
        assert!(out.iter().any(|l| l.starts_with("push #PC-")));
    }

    #[test]
    fn main_frame_size_counts_only_top_level_scalars_and_arrays() {
        let out = compile("let x:int = 1; let a:int[3] = [1,2,3];");
        assert_eq!(out[4], "push 4");
    }

    #[test]
    fn write_box_pushes_colour_first_then_reverse_declaration_order() {
        let out = compile("__write_box 1, 2, 3, 4, #ff0000;");
        let wb = out.iter().position(|l| l == "writebox").unwrap();
        assert_eq!(&out[wb - 5..wb], ["push 0xff0000", "push 3", "push 4", "push 2", "push 1"]);
    }
}

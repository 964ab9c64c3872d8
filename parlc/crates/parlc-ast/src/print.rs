//! Indented tree dump of a [`Program`], used by the driver's `--show-ast`
//! flag.
//!
//! This is a debug aid, not a canonical re-parseable serialization; it
//! favors a readable indented tree (matching the shape of the tracing
//! debug output elsewhere in the driver) over exact PArL source syntax.

use crate::*;
use std::fmt::Write;

pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    writeln!(out, "Program").unwrap();
    for stmt in &program.statements {
        print_stmt(&mut out, stmt, 1);
    }
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn print_stmt(out: &mut String, stmt: &Stmt, level: usize) {
    indent(out, level);
    match stmt {
        Stmt::VarDecl { name, ty, initializer, .. } => {
            writeln!(out, "VarDecl {name}: {ty}").unwrap();
            if let Some(init) = initializer {
                print_expr(out, init, level + 1);
            }
        }
        Stmt::Assignment { target, value, .. } => {
            writeln!(out, "Assignment {}", lvalue_label(target)).unwrap();
            print_expr(out, value, level + 1);
        }
        Stmt::If { cond, then_block, else_block, .. } => {
            writeln!(out, "If").unwrap();
            print_expr(out, cond, level + 1);
            indent(out, level);
            writeln!(out, "Then").unwrap();
            print_block(out, then_block, level + 1);
            if let Some(else_block) = else_block {
                indent(out, level);
                writeln!(out, "Else").unwrap();
                print_block(out, else_block, level + 1);
            }
        }
        Stmt::While { cond, body, .. } => {
            writeln!(out, "While").unwrap();
            print_expr(out, cond, level + 1);
            print_block(out, body, level + 1);
        }
        Stmt::For { init, cond, update, body, .. } => {
            writeln!(out, "For").unwrap();
            if let Some(init) = init {
                print_stmt(out, init, level + 1);
            }
            print_expr(out, cond, level + 1);
            if let Some(update) = update {
                print_stmt(out, update, level + 1);
            }
            print_block(out, body, level + 1);
        }
        Stmt::Return { expr, .. } => {
            writeln!(out, "Return").unwrap();
            if let Some(expr) = expr {
                print_expr(out, expr, level + 1);
            }
        }
        Stmt::FunctionDecl { name, params, return_type, body, .. } => {
            let param_list = params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.ty))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "FunctionDecl {name}({param_list}) -> {return_type}").unwrap();
            print_block(out, body, level + 1);
        }
        Stmt::Block { block, .. } => {
            writeln!(out, "Block").unwrap();
            print_block(out, block, level + 1);
        }
        Stmt::Print { expr, .. } => {
            writeln!(out, "Print").unwrap();
            print_expr(out, expr, level + 1);
        }
        Stmt::Delay { expr, .. } => {
            writeln!(out, "Delay").unwrap();
            print_expr(out, expr, level + 1);
        }
        Stmt::Write { x, y, color, .. } => {
            writeln!(out, "Write").unwrap();
            print_expr(out, x, level + 1);
            print_expr(out, y, level + 1);
            print_expr(out, color, level + 1);
        }
        Stmt::WriteBox { x, y, w, h, color, .. } => {
            writeln!(out, "WriteBox").unwrap();
            for e in [x, y, w, h, color] {
                print_expr(out, e, level + 1);
            }
        }
        Stmt::Clear { color, .. } => {
            writeln!(out, "Clear").unwrap();
            print_expr(out, color, level + 1);
        }
        Stmt::ExprStmt { expr, .. } => {
            writeln!(out, "ExprStmt").unwrap();
            print_expr(out, expr, level + 1);
        }
    }
}

fn print_block(out: &mut String, block: &Block, level: usize) {
    for stmt in &block.statements {
        print_stmt(out, stmt, level);
    }
}

fn lvalue_label(target: &LValue) -> String {
    match target {
        LValue::Identifier { name, .. } => name.to_string(),
        LValue::Index { name, .. } => format!("{name}[..]"),
    }
}

fn print_expr(out: &mut String, expr: &Expr, level: usize) {
    indent(out, level);
    match expr {
        Expr::Literal { value, .. } => writeln!(out, "Literal {value:?}").unwrap(),
        Expr::Identifier { name, .. } => writeln!(out, "Identifier {name}").unwrap(),
        Expr::Binary { left, op, right, .. } => {
            writeln!(out, "Binary {op:?}").unwrap();
            print_expr(out, left, level + 1);
            print_expr(out, right, level + 1);
        }
        Expr::Unary { op, operand, .. } => {
            writeln!(out, "Unary {op:?}").unwrap();
            print_expr(out, operand, level + 1);
        }
        Expr::Cast { expr, target_type, .. } => {
            writeln!(out, "Cast as {target_type}").unwrap();
            print_expr(out, expr, level + 1);
        }
        Expr::Call { name, args, .. } => {
            writeln!(out, "Call {name}").unwrap();
            for a in args {
                print_expr(out, a, level + 1);
            }
        }
        Expr::Index { base, index, .. } => {
            writeln!(out, "Index").unwrap();
            print_expr(out, base, level + 1);
            print_expr(out, index, level + 1);
        }
        Expr::ArrayLiteral { elements, .. } => {
            writeln!(out, "ArrayLiteral").unwrap();
            for e in elements {
                print_expr(out, e, level + 1);
            }
        }
        Expr::Width { .. } => writeln!(out, "Width").unwrap(),
        Expr::Height { .. } => writeln!(out, "Height").unwrap(),
        Expr::Read { x, y, .. } => {
            writeln!(out, "Read").unwrap();
            print_expr(out, x, level + 1);
            print_expr(out, y, level + 1);
        }
        Expr::RandI { max, .. } => {
            writeln!(out, "RandI").unwrap();
            print_expr(out, max, level + 1);
        }
    }
}

//! parlc-util - shared foundation types for the PArL compiler
//!
//! Every phase crate (`parlc-lex`, `parlc-par`, `parlc-sem`, `parlc-gen`,
//! `parlc-drv`) depends on this crate for three things that have no natural
//! home in any single phase:
//!
//! - [`Position`]: the `(line, column)` a token or AST node started at.
//! - [`Symbol`]: an interned identifier, so that equality and hashing of
//!   variable/function names is a pointer/index comparison rather than a
//!   string comparison, repeated at every scope lookup.
//! - [`Diagnostic`] / [`Handler`]: the common shape every phase's errors are
//!   converted into before being printed by the driver.
//!
//! None of these types encode anything about PArL's grammar or semantics;
//! they are pure plumbing, which is why they live below the phase crates in
//! the dependency graph rather than inside any one of them.

use std::fmt;
use std::sync::{OnceLock, RwLock};

// ============================================================================
// Source positions
// ============================================================================

/// A 1-based `(line, column)` pair identifying where a token or AST node
/// begins in its source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ============================================================================
// Symbol interning
// ============================================================================

/// An interned identifier.
///
/// Two `Symbol`s compare equal iff the strings they were interned from are
/// equal; comparison, hashing, and copying are all `u32`-cheap. Every
/// identifier the lexer produces is interned exactly once; every later
/// phase compares `Symbol`s, never the underlying `&str`, when deciding
/// whether two names refer to the same binding.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

struct Interner {
    // Owns the strings; `as_str` hands out references into these leaked
    // boxes, which is sound because nothing is ever removed.
    strings: Vec<&'static str>,
    lookup: rustc_hash::FxHashMap<&'static str, u32>,
}

impl Interner {
    fn new() -> Self {
        Self {
            strings: Vec::new(),
            lookup: rustc_hash::FxHashMap::default(),
        }
    }

    fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&id) = self.lookup.get(s) {
            return Symbol(id);
        }
        let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
        let id = self.strings.len() as u32;
        self.strings.push(leaked);
        self.lookup.insert(leaked, id);
        Symbol(id)
    }

    fn resolve(&self, sym: Symbol) -> &'static str {
        self.strings[sym.0 as usize]
    }
}

fn global_interner() -> &'static RwLock<Interner> {
    static INTERNER: OnceLock<RwLock<Interner>> = OnceLock::new();
    INTERNER.get_or_init(|| RwLock::new(Interner::new()))
}

impl Symbol {
    /// Intern `s`, returning a handle that compares equal to every other
    /// handle interned from an equal string.
    pub fn intern(s: &str) -> Self {
        global_interner().write().unwrap().intern(s)
    }

    /// Look up the original string. Cheap: an index into the global table.
    pub fn as_str(&self) -> &'static str {
        global_interner().read().unwrap().resolve(*self)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Severity of a [`Diagnostic`]. PArL's own taxonomy only ever produces
/// `Error`; `Warning`/`Note` exist so the driver's rendering path and
/// `--debug` trace share one format rather than inventing a second one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        write!(f, "{s}")
    }
}

/// One user-facing diagnostic: a position, a severity, and a message.
///
/// Every phase's own error enum (lexer error kinds, parser errors, semantic
/// errors) implements a conversion into this type; the driver never matches
/// on phase-specific error variants, only on this common shape.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub position: Position,
    pub message: String,
}

impl Diagnostic {
    pub fn error(position: Position, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.position, self.severity, self.message)
    }
}

/// Accumulates diagnostics across a single phase.
///
/// Lexer and parser keep accumulating past the first error (panic-mode
/// recovery); the analyzer walks the whole tree before reporting; the
/// generator is only ever invoked on a clean `Handler`, so for it `push`
/// is only ever called at most once before the driver aborts. A single type
/// serves all three shapes because the difference is in *when* the caller
/// stops pushing, not in how the pushed diagnostics are stored.
#[derive(Default, Debug)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, position: Position, message: impl Into<String>) {
        self.push(Diagnostic::error(position, message));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

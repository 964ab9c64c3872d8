//! parlc-drv - the PArL compiler driver
//!
//! Owns the one pipeline-orchestration job none of the four phase crates
//! can own for itself: reading the source file, running lexer → parser →
//! analyzer → generator in order, deciding what to print and where, and
//! picking the process exit code (§6.3, §7).
//!
//! Each phase crate still reports its own diagnostics into a fresh
//! [`parlc_util::Handler`]; this crate never inspects a phase-specific
//! error type, only `Handler::has_errors()` and the rendered
//! `Diagnostic`s, so adding a fifth phase later would not change anything
//! here.

use std::path::{Path, PathBuf};

use parlc_util::{Diagnostic, Handler};

/// Parsed CLI configuration. Built by `parlc`'s `main.rs` from `clap`'s
/// derive output; kept as a plain struct here so the orchestration logic
/// below is testable without going through argument parsing.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub show_ast: bool,
    pub debug: bool,
}

impl Config {
    /// The `.parir` path a run will write to: `--output` if given,
    /// otherwise the input path with its extension replaced.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => self.input.with_extension("parir"),
        }
    }
}

/// What a successful run produced, returned so `main.rs` can decide what
/// (if anything) to print to stdout.
pub struct CompileOutcome {
    pub output_path: PathBuf,
    pub instructions: Vec<String>,
}

/// One non-success outcome, carrying the process exit code it maps to
/// (§6.3: `1` for reported compilation errors, `2` for I/O/internal
/// failures).
pub enum CompileError {
    /// Lex/parse/semantic errors were reported; `diagnostics` is what to
    /// print to stderr.
    Diagnosed(Vec<Diagnostic>),
    /// Could not read the input or write the output, or the generator hit
    /// an internal-consistency failure.
    Io(String),
}

impl CompileError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Diagnosed(_) => 1,
            CompileError::Io(_) => 2,
        }
    }
}

fn trace(config: &Config, phase: &str) {
    if config.debug {
        eprintln!("{phase}: {}", config.input.display());
    }
}

/// Runs the full pipeline for `config`, writing the `.parir` listing on
/// success. Mirrors the phase-by-phase structure every phase crate
/// documents for itself; this function only sequences them.
pub fn compile(config: &Config) -> Result<CompileOutcome, CompileError> {
    let source = std::fs::read_to_string(&config.input)
        .map_err(|e| CompileError::Io(format!("failed to read {}: {e}", config.input.display())))?;

    trace(config, "lexing");
    let mut handler = Handler::new();
    let program = parlc_par::parse(&source, &mut handler);
    // parlc_par::parse runs the lexer internally; a lex-only failure and a
    // parse failure both surface through the same Handler, matching the
    // propagation policy in which lexer errors become parser-visible
    // tokens rather than a separate phase boundary.
    trace(config, "parsing");
    if handler.has_errors() {
        return Err(CompileError::Diagnosed(handler.into_diagnostics()));
    }

    if config.show_ast {
        println!("{}", parlc_ast::print::print_program(&program));
    }

    trace(config, "analyzing");
    let mut handler = Handler::new();
    let analysis = match parlc_sem::analyze(&program, &mut handler) {
        Some(analysis) => analysis,
        None => return Err(CompileError::Diagnosed(handler.into_diagnostics())),
    };

    trace(config, "generating");
    let instructions = parlc_gen::generate(&program, &analysis)
        .map_err(|e| CompileError::Io(format!("code generation failed: {e}")))?;

    let output_path = config.output_path();
    let mut text = instructions.join("\n");
    text.push('\n');
    std::fs::write(&output_path, text)
        .map_err(|e| CompileError::Io(format!("failed to write {}: {e}", output_path.display())))?;

    Ok(CompileOutcome { output_path, instructions })
}

/// Renders diagnostics the way §6.3 specifies: one per line, numbered
/// when there is more than one, `line:col: kind: message`.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    if diagnostics.len() == 1 {
        out.push_str(&diagnostics[0].to_string());
        out.push('\n');
    } else {
        for (i, d) in diagnostics.iter().enumerate() {
            out.push_str(&format!("{}: {d}\n", i + 1));
        }
    }
    out
}

/// Convenience used by tests and by `main.rs`: compile and produce
/// exactly the stderr text / exit code a real invocation would.
pub fn run(config: &Config) -> i32 {
    match compile(config) {
        Ok(_) => 0,
        Err(CompileError::Diagnosed(diags)) => {
            eprint!("{}", render_diagnostics(&diags));
            1
        }
        Err(CompileError::Io(msg)) => {
            eprintln!("error: {msg}");
            2
        }
    }
}

pub fn default_output_for(input: &Path) -> PathBuf {
    input.with_extension("parir")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.parl");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn compiles_a_well_formed_program_and_writes_parir() {
        let (_dir, path) = write_temp("let x:int = 2 + 3 * 4; __print x;");
        let config = Config { input: path.clone(), output: None, show_ast: false, debug: false };
        let outcome = compile(&config).expect("should compile");
        assert_eq!(outcome.output_path, path.with_extension("parir"));
        assert!(std::fs::read_to_string(&outcome.output_path).unwrap().contains("halt"));
    }

    #[test]
    fn semantic_error_is_diagnosed_and_writes_nothing() {
        let (_dir, path) = write_temp("let b:bool = 1;");
        let config = Config { input: path.clone(), output: None, show_ast: false, debug: false };
        let err = compile(&config).err().expect("should fail");
        assert_eq!(err.exit_code(), 1);
        assert!(!path.with_extension("parir").exists());
    }

    #[test]
    fn missing_input_file_is_an_io_error() {
        let config = Config {
            input: PathBuf::from("/nonexistent/does-not-exist.parl"),
            output: None,
            show_ast: false,
            debug: false,
        };
        let err = compile(&config).err().expect("should fail");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn custom_output_path_is_honoured() {
        let (dir, path) = write_temp("__print 1;");
        let out = dir.path().join("custom.out");
        let config = Config { input: path, output: Some(out.clone()), show_ast: false, debug: false };
        let outcome = compile(&config).expect("should compile");
        assert_eq!(outcome.output_path, out);
        assert!(out.exists());
    }
}

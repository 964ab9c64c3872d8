use std::path::PathBuf;

use clap::Parser;
use parlc_drv::Config;

/// Compile a PArL source file to a PArIR instruction listing.
#[derive(Parser, Debug)]
#[command(name = "parlc")]
#[command(author = "PArL Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiles PArL source files to PArIR", long_about = None)]
struct Cli {
    /// PArL source file to compile
    input: PathBuf,

    /// Output path for the PArIR listing (defaults to the input path with
    /// its extension replaced by `.parir`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the parsed AST to stdout before semantic analysis runs
    #[arg(long)]
    show_ast: bool,

    /// Emit a one-line trace to stderr at the start of each phase
    #[arg(long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();
    let config = Config { input: cli.input, output: cli.output, show_ast: cli.show_ast, debug: cli.debug };
    std::process::exit(parlc_drv::run(&config));
}

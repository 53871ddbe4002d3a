//! Gentool CLI: find lexer/parser generators and describe their commands.

use clap::Parser;
use gentool::util::logging::{self, LoggingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "gentool",
    version,
    about = "Find lex/yacc-family generators and plan their invocations"
)]
struct Cli {
    /// Debug logging (overrides GENTOOL_LOG / RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: gentool::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    });

    if let Err(e) = gentool::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

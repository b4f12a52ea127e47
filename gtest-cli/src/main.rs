//! Command-line test runner for DELPH-IN grammars
//!
//! Compiles a grammar with ACE, parses [incr tsdb()] test suites with art and
//! reports regressions against gold profiles, parsing coverage, or semantic
//! well-formedness.

use std::process;

use clap::Parser;

mod cli;
mod dispatch;

use cli::Cli;
use dispatch::Dispatcher;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG, when set, takes precedence over -v/-q
    env_logger::Builder::new().filter_level(cli.log_level()).format_timestamp(None).parse_default_env().init();

    let result = Dispatcher::new(&cli).and_then(|dispatcher| dispatcher.execute(&cli.command));
    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);

            // Show error chain if in verbose mode
            if cli.verbose > 0 {
                for cause in e.chain().skip(1) {
                    eprintln!("Caused by: {}", cause);
                }
            }

            process::exit(1);
        }
    }
}

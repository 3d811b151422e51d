//! conform CLI binary entry point.
//! Runs the check pipeline and maps the outcome to an exit code.

use clap::Parser;
use conform::cli::Cli;
use conform::error::Error;
use conform::{app, engine, output, utils};
use tracing::debug;

fn report(e: &Error) -> i32 {
    eprintln!("{} {}", utils::error_prefix(), e);
    e.exit_code()
}

fn main() {
    let cli = Cli::parse();
    utils::init_tracing(cli.log_json, utils::level_for(cli.verbose));
    engine::install_panic_hook();
    debug!(root = %cli.project_root.display(), "starting check");

    let code = match app::run(&cli, output::use_colors()) {
        Ok(outcome) => match app::emit(&mut std::io::stdout().lock(), &outcome.text) {
            Ok(()) => outcome.exit_code(),
            Err(e) => report(&e),
        },
        Err(e) => report(&e),
    };
    std::process::exit(code);
}

use anyhow::{Context, Result};
use argh::FromArgs;
use minish::config;
use minish::{Interpreter, Session};
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

#[derive(FromArgs)]
/// A very small shell.
struct Args {
    /// narrate launches and exits on standard output
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// print internal trace lines
    #[argh(switch, short = 'd')]
    debug: bool,

    /// script to read commands from instead of the terminal
    #[argh(positional)]
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let mut session = Session::new();
    if args.verbose {
        session.set_var("MINISH_VERBOSE", "ON");
    }
    if args.debug {
        session.set_var("MINISH_DEBUG", "ON");
    }
    config::load_startup(&mut session);
    session.sync_env();

    let mut interpreter = Interpreter::new(session);
    match args.script {
        Some(path) => {
            let file =
                File::open(&path).with_context(|| format!("can't open {}", path.display()))?;
            interpreter.run_script(&mut BufReader::new(file))
        }
        None if io::stdin().is_terminal() => interpreter.repl(),
        None => interpreter.run_script(&mut io::stdin().lock()),
    }
}

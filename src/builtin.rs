use crate::config;
use crate::session::{Session, TRACKED_VARS};
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// What the driving loop should do after a command has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The closed set of commands the interpreter implements itself.
///
/// Everything else on a command line is assumed to name an external
/// program. Builtins receive the full argument vector (their own name
/// included) untouched, so operands like `cd -` need no flag parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Exec,
    Help,
    Quit,
    ShowEnv,
    ReadConfig,
}

impl Builtin {
    pub const ALL: [Builtin; 6] = [
        Builtin::Cd,
        Builtin::Exec,
        Builtin::Help,
        Builtin::Quit,
        Builtin::ShowEnv,
        Builtin::ReadConfig,
    ];

    pub fn lookup(name: &str) -> Option<Builtin> {
        Builtin::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Exec => "exec",
            Builtin::Help => "help",
            Builtin::Quit => "quit",
            Builtin::ShowEnv => "showenv",
            Builtin::ReadConfig => "readconfig",
        }
    }

    /// Run the builtin. Errors are recoverable; the caller reports them
    /// and keeps the loop going.
    pub fn run(
        self,
        args: &[String],
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<Flow> {
        match self {
            Builtin::Cd => cd(args, stdout, session),
            Builtin::Exec => exec(args),
            Builtin::Help => help(stdout),
            Builtin::Quit => quit(stdout, session),
            Builtin::ShowEnv => showenv(stdout, session),
            Builtin::ReadConfig => readconfig(stdout, session),
        }
    }
}

/// `cd` — home with no operand, `-` for the previous directory, or a
/// target path. Records where we came from for the next `cd -`.
fn cd(args: &[String], stdout: &mut dyn Write, session: &mut Session) -> Result<Flow> {
    if args.len() > 2 {
        anyhow::bail!("cd: too many arguments");
    }
    let operand = args.get(1).map(String::as_str);
    let target = match operand {
        None => {
            let home = session.get_var("HOME").context("cd: HOME is not set")?;
            PathBuf::from(home)
        }
        Some("-") => session
            .previous_dir
            .clone()
            .context("cd: no previous directory")?,
        Some(dir) => PathBuf::from(dir),
    };

    let new_dir = if target.is_absolute() {
        target
    } else {
        session.current_dir.join(target)
    };
    let canonical = fs::canonicalize(&new_dir)
        .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;
    env::set_current_dir(&canonical)
        .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;

    let came_from = std::mem::replace(&mut session.current_dir, canonical.clone());
    session.previous_dir = Some(came_from);

    if operand == Some("-") {
        writeln!(stdout, "{}", canonical.display())?;
    }
    Ok(Flow::Continue)
}

/// `exec` — replace this process image with the named program.
///
/// Returning at all means the replacement failed; the caller reports
/// the error and the loop continues.
#[cfg(unix)]
fn exec(args: &[String]) -> Result<Flow> {
    use std::os::unix::process::CommandExt;

    let Some(prog) = args.get(1) else {
        anyhow::bail!("exec: expected a program to run");
    };
    let err = Command::new(prog).args(&args[2..]).exec();
    Err(err).with_context(|| format!("exec: can't run {prog}"))
}

#[cfg(not(unix))]
fn exec(args: &[String]) -> Result<Flow> {
    let Some(prog) = args.get(1) else {
        anyhow::bail!("exec: expected a program to run");
    };
    // No image replacement to be had; the nearest behaviour is to run
    // the program and leave with its status.
    let status = Command::new(prog)
        .args(&args[2..])
        .status()
        .with_context(|| format!("exec: can't run {prog}"))?;
    std::process::exit(status.code().unwrap_or(1));
}

fn help(stdout: &mut dyn Write) -> Result<Flow> {
    writeln!(stdout, "minish -- a very small shell.")?;
    writeln!(stdout)?;
    writeln!(stdout, "Type a program name with its arguments and hit enter.")?;
    writeln!(stdout, "The following are built in:")?;
    for builtin in Builtin::ALL {
        writeln!(stdout, "  {}", builtin.name())?;
    }
    Ok(Flow::Continue)
}

fn quit(stdout: &mut dyn Write, session: &Session) -> Result<Flow> {
    if session.verbose() {
        writeln!(stdout, "bye!")?;
    }
    Ok(Flow::Exit)
}

/// `showenv` — the tracked variables, one `NAME=value` line each.
fn showenv(stdout: &mut dyn Write, session: &Session) -> Result<Flow> {
    for name in TRACKED_VARS {
        writeln!(stdout, "{}={}", name, session.get_var(name).unwrap_or_default())?;
    }
    Ok(Flow::Continue)
}

/// `readconfig` — reload the configuration file on demand. Unlike the
/// silent load at startup, a missing file is reported here.
fn readconfig(stdout: &mut dyn Write, session: &mut Session) -> Result<Flow> {
    let path = config::config_path(session);
    config::load(&path, session)?;
    if session.verbose() {
        writeln!(stdout, "[read config from {}]", path.display())?;
    }
    Ok(Flow::Continue)
}

use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Option variables mirrored between the session and the process
/// environment before every line.
pub const TRACKED_VARS: [&str; 5] = [
    "MINISH_VERBOSE",
    "MINISH_DEBUG",
    "MINISH_PROMPT",
    "MINISH_HISTFILE",
    "MINISH_CONFIG",
];

fn default_value(name: &str) -> &'static str {
    match name {
        "MINISH_VERBOSE" => "OFF",
        "MINISH_DEBUG" => "OFF",
        "MINISH_PROMPT" => "%n@%h %p2r $ ",
        "MINISH_HISTFILE" => "~/.minish_history",
        "MINISH_CONFIG" => "~/.minishrc",
        _ => "",
    }
}

/// Everything a command may observe or change about the running
/// interpreter. One instance is threaded by `&mut` through dispatch and
/// the builtins; there is no global shell state.
#[derive(Debug, Clone)]
pub struct Session {
    /// The working directory as the interpreter tracks it.
    pub current_dir: PathBuf,
    /// Where `cd -` swaps back to. None until the first successful `cd`.
    pub previous_dir: Option<PathBuf>,
    /// The tracked option variables, keyed by [`TRACKED_VARS`] names.
    pub vars: HashMap<String, String>,
    /// The binary spawned to evaluate `$(...)` expressions. Normally the
    /// running executable itself; tests point it at `/bin/sh`.
    pub shell_exe: PathBuf,
}

impl Session {
    /// Capture the current process state into a fresh session, with all
    /// tracked variables at their defaults.
    pub fn new() -> Self {
        let mut vars = HashMap::new();
        for name in TRACKED_VARS {
            vars.insert(name.to_string(), default_value(name).to_string());
        }
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let shell_exe = stdenv::current_exe().unwrap_or_else(|_| PathBuf::from("minish"));
        Self {
            current_dir,
            previous_dir: None,
            vars,
            shell_exe,
        }
    }

    /// Get a variable, falling back to the process environment for
    /// names the session does not track (HOME, PATH and friends).
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set a session variable without touching the process environment.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Set a session variable and export it, so the next [`sync_env`]
    /// pass does not undo the assignment.
    ///
    /// [`sync_env`]: Session::sync_env
    pub fn export_var(&mut self, key: &str, val: &str) {
        self.vars.insert(key.to_string(), val.to_string());
        // Sound while the interpreter stays single threaded.
        unsafe { stdenv::set_var(key, val) };
    }

    /// Align the tracked variables with the process environment: an
    /// environment value wins when present, otherwise the session value
    /// is exported. Runs once per input line.
    pub fn sync_env(&mut self) {
        for name in TRACKED_VARS {
            match stdenv::var(name) {
                Ok(value) => {
                    self.vars.insert(name.to_string(), value);
                }
                Err(_) => {
                    if let Some(value) = self.vars.get(name) {
                        // Sound while the interpreter stays single threaded.
                        unsafe { stdenv::set_var(name, value) };
                    }
                }
            }
        }
    }

    pub fn verbose(&self) -> bool {
        self.vars.get("MINISH_VERBOSE").map(String::as_str) == Some("ON")
    }

    pub fn debug(&self) -> bool {
        self.vars.get("MINISH_DEBUG").map(String::as_str) == Some("ON")
    }

    /// Print an internal trace line when `MINISH_DEBUG=ON`.
    pub fn debug_note(&self, note: &str) {
        if self.debug() {
            println!("\x1b[1mlog: {note}\x1b[0m");
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

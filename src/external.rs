use crate::builtin::Flow;
use crate::session::Session;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Launch `args[0]` as an external program and wait for it to finish.
///
/// The resolved path is only used to spawn; the child keeps the name
/// as typed in `argv[0]`. The child inherits our stdio. Stopped or
/// continued children never satisfy the wait; only a real exit or a
/// fatal signal does. Whatever happens to the child, the loop goes on.
pub fn launch(args: &[String], session: &Session) -> Result<Flow> {
    let name = &args[0];
    let search_paths = session.get_var("PATH").unwrap_or_default();
    let path = find_command_path(OsStr::new(&search_paths), Path::new(name))
        .with_context(|| format!("{name}: command not found"))?;

    let mut command = Command::new(path.as_ref());
    command.args(&args[1..]).current_dir(&session.current_dir);
    // Multi-call binaries dispatch on argv[0].
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.arg0(name);
    }
    let mut child = command
        .spawn()
        .with_context(|| format!("can't launch {name}"))?;

    if session.verbose() {
        println!("[launching {} with pid {}]", name, child.id());
    }

    let status = child
        .wait()
        .with_context(|| format!("can't wait for {name}"))?;

    if session.verbose() {
        println!("[{} exited with code {}]", name, exit_code(status));
    }
    Ok(Flow::Continue)
}

fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => {
            // Empty path -> not found
            None
        }
        (Some(x), None) => {
            // Single component -> search in PATH
            find_in_path(search_paths, x.as_os_str()).map(Cow::Owned)
        }
        _ => {
            // Multiple components -> search in current dir
            find_by_path(path).map(Cow::Borrowed)
        }
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let path = dir.join(cmd);
        if let Some(path) = find_by_path(&path) {
            return Some(path.to_owned());
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

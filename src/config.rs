//! Configuration file loading: `NAME=value` lines for the tracked
//! variables, read once at startup and again on `readconfig`.

use crate::expand;
use crate::session::{Session, TRACKED_VARS};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Where the configuration lives, per `MINISH_CONFIG` (`~` expanded).
pub fn config_path(session: &Session) -> PathBuf {
    let raw = session.get_var("MINISH_CONFIG").unwrap_or_default();
    let home = session.get_var("HOME");
    PathBuf::from(expand::expand_home(&raw, home.as_deref()))
}

/// Read `NAME=value` assignments into the session.
///
/// Blank lines and `#` comments are skipped. The name tolerates
/// surrounding whitespace; the value runs verbatim to the end of the
/// line, so a prompt can keep its trailing space. Assignments are
/// exported to the process environment as well, so the per-line sync
/// does not undo them. Unknown names and malformed lines get a warning
/// and are otherwise ignored.
pub fn load(path: &Path, session: &mut Session) -> Result<()> {
    let file = File::open(path).with_context(|| format!("can't open {}", path.display()))?;
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("can't read {}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((name, value)) = line.split_once('=') else {
            eprintln!(
                "minish: {}:{}: expected NAME=value",
                path.display(),
                idx + 1
            );
            continue;
        };
        let name = name.trim();
        if TRACKED_VARS.contains(&name) {
            session.export_var(name, value);
        } else {
            eprintln!(
                "minish: {}:{}: unknown variable {}",
                path.display(),
                idx + 1,
                name
            );
        }
    }
    Ok(())
}

/// Startup load: a missing file is normal and silent, anything else is
/// reported but never fatal.
pub fn load_startup(session: &mut Session) {
    let path = config_path(session);
    if !path.exists() {
        return;
    }
    if let Err(err) = load(&path, session) {
        eprintln!("minish: {err:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testlock;
    use std::env as stdenv;
    use std::fs;
    use std::io::Write;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_config(content: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = stdenv::temp_dir().join(format!(
            "minish_test_config_{}_{}",
            std::process::id(),
            nanos
        ));
        let mut f = fs::File::create(&path).expect("create config");
        write!(f, "{content}").expect("write config");
        path
    }

    #[test]
    fn load_sets_tracked_variables() {
        let _lock = testlock::env();
        let path = write_config(
            "# a comment\n\
             \n\
             MINISH_PROMPT=%p $\n\
             MINISH_HISTFILE =/tmp/hist\n",
        );

        let mut session = Session::new();
        load(&path, &mut session).expect("load");

        assert_eq!(session.get_var("MINISH_PROMPT").as_deref(), Some("%p $"));
        assert_eq!(
            session.get_var("MINISH_HISTFILE").as_deref(),
            Some("/tmp/hist")
        );

        unsafe { stdenv::remove_var("MINISH_PROMPT") };
        unsafe { stdenv::remove_var("MINISH_HISTFILE") };
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_keeps_value_whitespace() {
        let _lock = testlock::env();
        let path = write_config("MINISH_PROMPT=%n@%h %p2r $ \n");

        let mut session = Session::new();
        load(&path, &mut session).expect("load");

        assert_eq!(
            session.get_var("MINISH_PROMPT").as_deref(),
            Some("%n@%h %p2r $ ")
        );

        unsafe { stdenv::remove_var("MINISH_PROMPT") };
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_skips_unknown_and_malformed_lines() {
        let _lock = testlock::env();
        let path = write_config("SOME_OTHER=1\nnot an assignment\nMINISH_PROMPT=ok\n");

        let mut session = Session::new();
        load(&path, &mut session).expect("load");

        assert_eq!(session.get_var("MINISH_PROMPT").as_deref(), Some("ok"));
        assert!(session.vars.get("SOME_OTHER").is_none());

        unsafe { stdenv::remove_var("MINISH_PROMPT") };
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_of_a_missing_file_is_an_error() {
        let mut session = Session::new();
        let res = load(Path::new("/no/such/minish/config"), &mut session);
        assert!(res.is_err());
    }

    #[test]
    fn startup_load_ignores_a_missing_file() {
        let mut session = Session::new();
        session.set_var("MINISH_CONFIG", "/no/such/minish/config");
        load_startup(&mut session);
        assert_eq!(session.get_var("MINISH_VERBOSE").as_deref(), Some("OFF"));
    }

    #[test]
    fn config_path_expands_home() {
        let mut session = Session::new();
        session.set_var("HOME", "/home/u");
        assert_eq!(config_path(&session), PathBuf::from("/home/u/.minishrc"));
    }
}

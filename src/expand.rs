//! Per-argument expansion: `~`, one `$(...)` capture, then globbing.

use crate::session::Session;
use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::ops::Range;
use std::process::{Command, Stdio};

/// Run every argument through the expansion pipeline, accumulating the
/// final vector (globbing can turn one argument into many).
pub fn expand_args(args: Vec<String>, session: &Session) -> Vec<String> {
    let home = session.get_var("HOME");
    let mut expanded = Vec::with_capacity(args.len());
    for arg in args {
        session.debug_note(&format!("expanding {arg:?}"));
        if home.is_none() && arg.contains('~') {
            eprintln!("minish: can't expand ~ in {arg:?}, HOME is not set");
        }
        let arg = expand_home(&arg, home.as_deref());
        let arg = expand_substitution(&arg, session);
        expanded.extend(expand_pattern(&arg));
    }
    expanded
}

/// Replace every `~` with the home directory, left to right.
///
/// The scan resumes after each inserted value, so a `~` inside the home
/// path itself stays put. Without a home value the argument is returned
/// unchanged; the caller decides whether that deserves a diagnostic.
pub fn expand_home(arg: &str, home: Option<&str>) -> String {
    let Some(home) = home else {
        return arg.to_string();
    };
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    while let Some(idx) = rest.find('~') {
        out.push_str(&rest[..idx]);
        out.push_str(home);
        rest = &rest[idx + 1..];
    }
    out.push_str(rest);
    out
}

/// One `$(...)` or `$word` occurrence: the inner expression and the full
/// span the capture replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SubstSpan {
    expr: Range<usize>,
    span: Range<usize>,
}

/// Find the first substitutable expression, if any.
///
/// `$(expr)` runs to the first `)`; an inner `)` ends the match early,
/// so nested substitution is not supported. A bare `$word` runs to the
/// next whitespace or the end of the argument. A `$` with nothing
/// usable after it is left alone, as is a `$(` that never closes.
fn locate_substitution(arg: &str) -> Option<SubstSpan> {
    let dollar = arg.find('$')?;
    let after = dollar + 1;
    if arg[after..].starts_with('(') {
        let close = after + arg[after..].find(')')?;
        Some(SubstSpan {
            expr: after + 1..close,
            span: dollar..close + 1,
        })
    } else {
        let end = arg[after..]
            .find(|c: char| c.is_whitespace())
            .map_or(arg.len(), |i| after + i);
        if end == after {
            return None;
        }
        Some(SubstSpan {
            expr: after..end,
            span: dollar..end,
        })
    }
}

/// Expand the first `$` expression in the argument by running it
/// through a child interpreter and splicing the captured output over
/// the matched span. Later `$` expressions in the same argument pass
/// through untouched. On any child failure the argument comes back
/// unchanged after a diagnostic.
pub fn expand_substitution(arg: &str, session: &Session) -> String {
    let Some(located) = locate_substitution(arg) else {
        return arg.to_string();
    };
    match capture_output(&arg[located.expr.clone()], session) {
        Ok(output) => {
            session.debug_note(&format!("captured {output:?}"));
            let mut out = String::with_capacity(arg.len() + output.len());
            out.push_str(&arg[..located.span.start]);
            out.push_str(&output);
            out.push_str(&arg[located.span.end..]);
            out
        }
        Err(err) => {
            eprintln!("minish: command substitution failed: {err:#}");
            arg.to_string()
        }
    }
}

/// Evaluate `expr` in a child running this interpreter non-interactively.
///
/// Both ends are piped: the expression goes in followed by end-of-input,
/// then the output pipe is drained to EOF into a growing buffer. Exactly
/// one trailing newline is stripped from the capture. The child gets its
/// own working directory and its commentary flags forced off, so nothing
/// it does leaks back into the parent session.
fn capture_output(expr: &str, session: &Session) -> Result<String> {
    let mut child = Command::new(&session.shell_exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .env("MINISH_VERBOSE", "OFF")
        .env("MINISH_DEBUG", "OFF")
        .current_dir(&session.current_dir)
        .spawn()
        .with_context(|| format!("can't run {}", session.shell_exe.display()))?;

    // The child may exit without draining its input; a broken pipe here
    // just means there is nothing more it wants. Dropping the handle
    // closes our end so the child sees end-of-input after one line.
    let mut stdin = child.stdin.take().context("child stdin is not piped")?;
    let _ = stdin.write_all(expr.as_bytes());
    let _ = stdin.write_all(b"\n");
    drop(stdin);

    let mut output = Vec::new();
    let mut stdout = child.stdout.take().context("child stdout is not piped")?;
    stdout
        .read_to_end(&mut output)
        .context("can't read from substitution child")?;

    // EOF on the pipe means the child is done or gone. The kill is a
    // safety net for one that lingers; wait() reaps it either way.
    let _ = child.kill();
    let _ = child.wait();

    let mut output = String::from_utf8_lossy(&output).into_owned();
    if output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}

/// Glob the argument against the filesystem.
///
/// Matches come back in the order the matcher yields them. A pattern
/// that matches nothing, or is not a valid pattern at all, degrades to
/// the literal argument.
pub fn expand_pattern(arg: &str) -> Vec<String> {
    let Ok(paths) = glob::glob(arg) else {
        return vec![arg.to_string()];
    };
    let matches: Vec<String> = paths
        .filter_map(|entry| entry.ok())
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    if matches.is_empty() {
        vec![arg.to_string()]
    } else {
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testlock;
    use std::env as stdenv;
    use std::fs;
    use std::fs::File;
    use std::io;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_unique_temp_dir(tag: &str) -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("minish_test_{}_{}_{}", tag, std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }

    #[cfg(unix)]
    fn sh_session() -> Session {
        let mut session = Session::new();
        session.shell_exe = PathBuf::from("/bin/sh");
        session
    }

    #[test]
    fn home_replaces_tilde() {
        assert_eq!(expand_home("~/x", Some("/home/u")), "/home/u/x");
    }

    #[test]
    fn home_replaces_every_tilde() {
        assert_eq!(expand_home("~~", Some("/home/u")), "/home/u/home/u");
        assert_eq!(expand_home("a~b~c", Some("/h")), "a/hb/hc");
    }

    #[test]
    fn home_leaves_plain_arguments_alone() {
        assert_eq!(expand_home("plain", Some("/home/u")), "plain");
    }

    #[test]
    fn home_absent_leaves_the_argument_alone() {
        assert_eq!(expand_home("~/x", None), "~/x");
    }

    #[test]
    fn tilde_inside_the_home_value_stays_put() {
        assert_eq!(expand_home("~", Some("/odd~path")), "/odd~path");
    }

    #[test]
    fn locate_finds_the_wrapped_form() {
        let located = locate_substitution("$(echo hi)").unwrap();
        assert_eq!(located.expr, 2..9);
        assert_eq!(located.span, 0..10);
    }

    #[test]
    fn locate_finds_the_wrapped_form_mid_argument() {
        let arg = "pre$(cmd)post";
        let located = locate_substitution(arg).unwrap();
        assert_eq!(&arg[located.expr], "cmd");
        assert_eq!(&arg[located.span], "$(cmd)");
    }

    #[test]
    fn locate_finds_the_bare_form() {
        let arg = "a $word tail";
        let located = locate_substitution(arg).unwrap();
        assert_eq!(&arg[located.expr], "word");
        assert_eq!(&arg[located.span], "$word");
    }

    #[test]
    fn locate_bare_form_runs_to_end_of_argument() {
        let arg = "x$tail";
        let located = locate_substitution(arg).unwrap();
        assert_eq!(&arg[located.expr], "tail");
    }

    #[test]
    fn locate_ignores_arguments_without_dollar() {
        assert_eq!(locate_substitution("no dollars here"), None);
    }

    #[test]
    fn locate_ignores_a_trailing_lone_dollar() {
        assert_eq!(locate_substitution("price$"), None);
        assert_eq!(locate_substitution("a$ b"), None);
    }

    #[test]
    fn locate_ignores_an_unclosed_wrapped_form() {
        assert_eq!(locate_substitution("$(never closed"), None);
    }

    #[test]
    fn locate_stops_at_the_first_close_paren() {
        // Nested substitution is not supported; the inner ) ends the
        // expression.
        let arg = "$(a $(b) c)";
        let located = locate_substitution(arg).unwrap();
        assert_eq!(&arg[located.expr], "a $(b");
    }

    #[test]
    #[cfg(unix)]
    fn substitution_captures_output_and_strips_one_newline() {
        let _cwd = testlock::current_dir();
        let session = sh_session();
        assert_eq!(expand_substitution("$(echo hi)", &session), "hi");
    }

    #[test]
    #[cfg(unix)]
    fn substitution_splices_into_the_argument() {
        let _cwd = testlock::current_dir();
        let session = sh_session();
        assert_eq!(expand_substitution("x$(echo hi)y", &session), "xhiy");
    }

    #[test]
    #[cfg(unix)]
    fn substitution_keeps_embedded_newlines() {
        let _cwd = testlock::current_dir();
        let session = sh_session();
        let expanded = expand_substitution("$(printf 'a\\nb\\n')", &session);
        assert_eq!(expanded, "a\nb");
    }

    #[test]
    #[cfg(unix)]
    fn substitution_of_a_silent_command_is_empty() {
        let _cwd = testlock::current_dir();
        let session = sh_session();
        assert_eq!(expand_substitution("$(true)", &session), "");
    }

    #[test]
    #[cfg(unix)]
    fn substitution_drains_output_past_one_pipe_buffer() {
        let _cwd = testlock::current_dir();
        let session = sh_session();
        // seq to 50000 is a few hundred KB, several times the 64 KiB a
        // pipe holds on its own.
        let expanded = expand_substitution("$(seq 1 50000)", &session);
        assert!(expanded.starts_with("1\n2\n"));
        assert!(expanded.ends_with("\n50000"));
        assert!(expanded.len() > 65536);
        assert_eq!(expanded.lines().count(), 50000);
    }

    #[test]
    #[cfg(unix)]
    fn only_the_first_expression_expands() {
        let _cwd = testlock::current_dir();
        let session = sh_session();
        let expanded = expand_substitution("$(echo a) $(echo b)", &session);
        assert_eq!(expanded, "a $(echo b)");
    }

    #[test]
    fn substitution_failure_leaves_the_argument_alone() {
        let mut session = Session::new();
        session.shell_exe = PathBuf::from("/nonexistent/minish-child");
        assert_eq!(expand_substitution("$(echo hi)", &session), "$(echo hi)");
    }

    #[test]
    fn arguments_without_expressions_pass_through() {
        let session = Session::new();
        assert_eq!(expand_substitution("plain", &session), "plain");
    }

    #[test]
    fn pattern_with_no_matches_stays_literal() {
        let expanded = expand_pattern("/definitely/no/such/path/*.xyz");
        assert_eq!(expanded, vec!["/definitely/no/such/path/*.xyz"]);
    }

    #[test]
    fn invalid_pattern_stays_literal() {
        assert_eq!(expand_pattern("a[b"), vec!["a[b"]);
    }

    #[test]
    fn pattern_expands_to_matching_paths() {
        let temp = make_unique_temp_dir("glob").expect("temp dir");
        File::create(temp.join("one.txt")).unwrap();
        File::create(temp.join("two.txt")).unwrap();
        File::create(temp.join("other.log")).unwrap();

        let pattern = format!("{}/*.txt", temp.display());
        let mut expanded = expand_pattern(&pattern);
        expanded.sort();

        assert_eq!(expanded.len(), 2);
        assert!(expanded[0].ends_with("one.txt"));
        assert!(expanded[1].ends_with("two.txt"));

        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn expand_args_runs_the_whole_pipeline() {
        let temp = make_unique_temp_dir("pipeline").expect("temp dir");
        File::create(temp.join("a.dat")).unwrap();

        let mut session = Session::new();
        session.set_var("HOME", temp.display().to_string());

        let args = vec!["echo".to_string(), "~/*.dat".to_string()];
        let expanded = expand_args(args, &session);

        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0], "echo");
        assert!(expanded[1].ends_with("a.dat"));

        let _ = fs::remove_dir_all(temp);
    }
}

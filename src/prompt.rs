//! Prompt rendering from the `MINISH_PROMPT` template.

use crate::session::Session;

const RED: &str = "\x1b[31m";
const GRN: &str = "\x1b[32m";
const YEL: &str = "\x1b[33m";
const BLU: &str = "\x1b[34m";
const MAG: &str = "\x1b[35m";
const CYN: &str = "\x1b[36m";
const WHT: &str = "\x1b[37m";
const RESET: &str = "\x1b[0m";

const PATH_COLOURS: [&str; 7] = [RED, GRN, YEL, BLU, MAG, CYN, WHT];

/// Render the prompt template.
///
/// `%n` is the username (red), `%h` the hostname (green), `%p` the
/// working directory; a digit after `%p` keeps only that many trailing
/// components and an `r` after that colours them in rotation. Unknown
/// specifiers are consumed silently. Rendering never fails; anything
/// unavailable degrades to plain text.
pub fn render(session: &Session) -> String {
    render_with(session, true)
}

/// Render the template with no colour codes, for anything that sizes
/// the prompt by counting bytes.
pub fn render_plain(session: &Session) -> String {
    render_with(session, false)
}

fn render_with(session: &Session, colours: bool) -> String {
    let template: Vec<char> = session
        .get_var("MINISH_PROMPT")
        .unwrap_or_default()
        .chars()
        .collect();
    let cwd = session.current_dir.to_string_lossy().into_owned();
    let (red, grn, reset) = if colours {
        (RED, GRN, RESET)
    } else {
        ("", "", "")
    };

    let mut out = String::new();
    let mut i = 0;
    while i < template.len() {
        let c = template[i];
        i += 1;
        if c != '%' {
            out.push(c);
            continue;
        }
        match template.get(i).copied() {
            Some('n') => {
                i += 1;
                match std::env::var("USER") {
                    Ok(user) => {
                        out.push_str(red);
                        out.push_str(&user);
                        out.push_str(reset);
                    }
                    Err(_) => out.push('?'),
                }
            }
            Some('h') => {
                i += 1;
                out.push_str(grn);
                out.push_str(&hostname());
                out.push_str(reset);
            }
            Some('p') => {
                i += 1;
                let mut levels = 0;
                if let Some(digit) = template.get(i).and_then(|c| c.to_digit(10)) {
                    levels = digit as usize;
                    i += 1;
                }
                let mut rainbow = false;
                if template.get(i) == Some(&'r') {
                    rainbow = true;
                    i += 1;
                }
                render_path(&mut out, &cwd, levels, rainbow && colours);
            }
            Some(_) => i += 1,
            None => {}
        }
    }
    out
}

/// Append the last `levels` path components (all of them when zero),
/// each with a trailing `/`, colour-cycled when `rainbow` is set.
fn render_path(out: &mut String, cwd: &str, levels: usize, rainbow: bool) {
    if cwd.starts_with('/') {
        out.push('/');
    }
    let components: Vec<&str> = cwd.split('/').filter(|c| !c.is_empty()).collect();
    let skip = if levels == 0 || levels > components.len() {
        0
    } else {
        components.len() - levels
    };
    for (i, component) in components[skip..].iter().enumerate() {
        if rainbow {
            out.push_str(PATH_COLOURS[i % PATH_COLOURS.len()]);
        }
        out.push_str(component);
        if rainbow {
            out.push_str(RESET);
        }
        out.push('/');
    }
}

#[cfg(unix)]
fn hostname() -> String {
    let mut buf = [0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len()) };
    if rc == 0 {
        let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        String::from_utf8_lossy(&buf[..len]).into_owned()
    } else {
        "localhost".to_string()
    }
}

#[cfg(not(unix))]
fn hostname() -> String {
    std::env::var("COMPUTERNAME").unwrap_or_else(|_| "localhost".to_string())
}

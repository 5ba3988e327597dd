use crate::builtin::{Builtin, Flow};
use crate::expand;
use crate::external;
use crate::lexer;
use crate::prompt;
use crate::session::Session;
use anyhow::Result;
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};
use std::borrow::Cow;
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;

/// Drives the pipeline: one raw line in, one executed command out,
/// repeated until something signals the end.
pub struct Interpreter {
    pub session: Session,
}

impl Interpreter {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Take one raw line through tokenize, expand and dispatch.
    ///
    /// Every recoverable problem is reported on stderr and turned into
    /// [`Flow::Continue`]; only `quit` ends the loop.
    pub fn run_line(&mut self, line: &str) -> Flow {
        let args = match lexer::split_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("minish: {err}");
                return Flow::Continue;
            }
        };
        self.session.debug_note(&format!("split into {args:?}"));
        let args = expand::expand_args(args, &self.session);

        match self.execute(&args) {
            Ok(flow) => flow,
            Err(err) => {
                eprintln!("minish: {err:#}");
                Flow::Continue
            }
        }
    }

    /// Route an expanded argument vector to a builtin or an external
    /// program.
    fn execute(&mut self, args: &[String]) -> Result<Flow> {
        let Some(name) = args.first() else {
            if self.session.verbose() && std::io::stdin().is_terminal() {
                println!("...what do you want to do?");
            }
            return Ok(Flow::Continue);
        };
        match Builtin::lookup(name) {
            Some(builtin) => {
                if self.session.verbose() {
                    println!("[launching builtin {name}]");
                }
                builtin.run(args, &mut std::io::stdout(), &mut self.session)
            }
            None => external::launch(args, &self.session),
        }
    }

    /// The interactive loop: line editing, a rendered prompt, history
    /// loaded at the start and saved at the end. Ctrl-C and Ctrl-D end
    /// it the same way `quit` does.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl: Editor<ColouredPrompt, FileHistory> = Editor::new()?;
        rl.set_helper(Some(ColouredPrompt::default()));
        let hist_path = self.history_path();
        if let Some(path) = &hist_path {
            let _ = rl.load_history(path);
        }

        loop {
            self.session.sync_env();
            // Colours go through the helper so the editor measures a
            // prompt with no escape codes in it.
            if let Some(helper) = rl.helper_mut() {
                helper.display = prompt::render(&self.session);
            }
            match rl.readline(&prompt::render_plain(&self.session)) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if self.run_line(&line) == Flow::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("minish: {err}");
                    break;
                }
            }
        }

        if let Some(path) = &hist_path {
            if let Err(err) = rl.save_history(path) {
                eprintln!("minish: can't save history to {}: {err}", path.display());
            }
        }
        Ok(())
    }

    /// The non-interactive loop: read lines until end-of-input, no
    /// prompt, no history. A substitution child runs exactly this over
    /// a pipe.
    pub fn run_script(&mut self, input: &mut dyn BufRead) -> Result<()> {
        let mut line = String::new();
        loop {
            self.session.sync_env();
            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            if self.run_line(&line) == Flow::Exit {
                return Ok(());
            }
        }
    }

    fn history_path(&self) -> Option<PathBuf> {
        let raw = self.session.get_var("MINISH_HISTFILE")?;
        let home = self.session.get_var("HOME");
        if raw.contains('~') && home.is_none() {
            return None;
        }
        Some(PathBuf::from(expand::expand_home(&raw, home.as_deref())))
    }
}

/// Paints the coloured prompt over the plain one the editor was handed
/// to measure.
#[derive(Default)]
struct ColouredPrompt {
    display: String,
}

impl Highlighter for ColouredPrompt {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default && !self.display.is_empty() {
            Cow::Borrowed(&self.display)
        } else {
            Cow::Borrowed(prompt)
        }
    }
}

impl Completer for ColouredPrompt {
    type Candidate = String;
}

impl Hinter for ColouredPrompt {
    type Hint = String;
}

impl Validator for ColouredPrompt {}

impl Helper for ColouredPrompt {}

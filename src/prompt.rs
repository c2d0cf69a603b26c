use anyhow::{bail, Context, Result};
use std::io::{BufRead, IsTerminal, Write};

/// Source of line-based answers from the operator.
pub trait Prompt {
    fn line(&mut self, message: &str) -> Result<String>;

    /// Block until the operator presses enter.
    fn pause(&mut self, message: &str) -> Result<()> {
        self.line(message).map(|_| ())
    }
}

/// Uses dialoguer when attached to a terminal, plain stdin lines otherwise.
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn line(&mut self, message: &str) -> Result<String> {
        if std::io::stdin().is_terminal() {
            return dialoguer::Input::<String>::new()
                .with_prompt(message)
                .allow_empty(true)
                .interact_text()
                .context("Failed to read answer from terminal");
        }
        read_answer(&mut std::io::stdin().lock(), &mut std::io::stdout(), message)
    }
}

fn read_answer(input: &mut impl BufRead, output: &mut impl Write, message: &str) -> Result<String> {
    write!(output, "{}: ", message)?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer).context("Failed to read from stdin")? == 0 {
        bail!("stdin closed while waiting for: {}", message);
    }
    Ok(answer.trim_end_matches(['\r', '\n']).to_string())
}

/// Answer from the command line if given, otherwise ask.
pub fn answer_or_ask(given: Option<String>, prompt: &mut dyn Prompt, message: &str) -> Result<String> {
    match given {
        Some(answer) => Ok(answer),
        None => prompt.line(message),
    }
}

//! Interactive questions asked on the terminal.

use eyre::Context;
use std::io::{BufRead, Write};

/// Something that can ask the user a question and return their (trimmed) answer.
///
/// An empty answer means the user chose to skip.
pub trait Prompt {
    fn ask(&mut self, question: &str) -> eyre::Result<String>;
}

/// Asks on stdout and reads a line from stdin.
#[derive(Debug, Default)]
pub struct Terminal;

impl Prompt for Terminal {
    fn ask(&mut self, question: &str) -> eyre::Result<String> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{question}").context("write prompt")?;
        stdout.flush().context("flush prompt")?;
        drop(stdout);

        let mut answer = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("read answer from stdin")?;
        Ok(answer.trim().to_string())
    }
}

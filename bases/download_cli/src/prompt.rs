use std::io::Write;

use color_eyre::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-based questions on the terminal.
pub struct Prompter<R> {
    lines: Lines<R>,
}

impl Prompter<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Prompter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Print `question` and read one trimmed answer. End of input reads as
    /// an empty answer.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        print!("{}", question);
        std::io::stdout().flush()?;

        let answer = self.lines.next_line().await?;
        Ok(answer.map(|line| line.trim().to_string()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_are_trimmed_and_eof_is_empty() {
        let mut prompter = Prompter::new(&b"  https://example.com/list \n"[..]);

        assert_eq!(prompter.ask("URL: ").await.unwrap(), "https://example.com/list");
        assert_eq!(prompter.ask("Folder: ").await.unwrap(), "");
    }
}

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// The exact text a user must type to confirm a destructive operation.
pub const CONFIRMATION_WORD: &str = "DELETE";

/// Source of a yes/no answer before anything is destroyed.
#[async_trait]
pub trait ConfirmationPrompt: Send {
    /// Show `question` and return the raw answer line.
    async fn ask(&mut self, question: &str) -> io::Result<String>;
}

/// Reads one line from standard input without blocking the runtime.
#[derive(Debug, Default)]
pub struct StdinPrompt;

#[async_trait]
impl ConfirmationPrompt for StdinPrompt {
    async fn ask(&mut self, question: &str) -> io::Result<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(question.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        Ok(line)
    }
}

/// Answers every question with a fixed string.
#[derive(Debug, Clone)]
pub struct PresetAnswer(pub String);

impl PresetAnswer {
    pub fn confirm() -> Self {
        Self(CONFIRMATION_WORD.to_string())
    }
}

#[async_trait]
impl ConfirmationPrompt for PresetAnswer {
    async fn ask(&mut self, _question: &str) -> io::Result<String> {
        Ok(self.0.clone())
    }
}

/// Only the line terminator is stripped; case and inner whitespace matter.
pub fn is_confirmed(answer: &str) -> bool {
    let answer = answer
        .strip_suffix("\r\n")
        .or_else(|| answer.strip_suffix('\n'))
        .unwrap_or(answer);
    answer == CONFIRMATION_WORD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_word_confirms() {
        assert!(is_confirmed("DELETE"));
        assert!(is_confirmed("DELETE\n"));
        assert!(is_confirmed("DELETE\r\n"));
    }

    #[test]
    fn anything_else_cancels() {
        assert!(!is_confirmed("delete\n"));
        assert!(!is_confirmed(" DELETE\n"));
        assert!(!is_confirmed("DELETE \n"));
        assert!(!is_confirmed("no\n"));
        assert!(!is_confirmed(""));
    }

    #[tokio::test]
    async fn preset_answer_is_returned() {
        let mut p = PresetAnswer::confirm();
        assert!(is_confirmed(&p.ask("sure?").await.unwrap()));
        let mut p = PresetAnswer("no".into());
        assert_eq!(p.ask("sure?").await.unwrap(), "no");
    }
}

//! Interaction seam between the resolver state machine and the user.
//!
//! The resolver never touches stdin/stdout directly; it talks to a
//! [`Prompt`], so disambiguation and manual entry are testable with a
//! scripted input sequence.

use std::io::{self, Write};

use anyhow::Result;

pub trait Prompt {
    /// Show a line of text to the user.
    fn say(&mut self, text: &str);

    /// Ask a question and return one trimmed line of input.
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// Terminal-backed prompt.
pub struct Console;

impl Prompt for Console {
    fn say(&mut self, text: &str) {
        println!("{text}");
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        print!("{question} ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

/// Prompt fed from a fixed script. Running out of answers is an error,
/// which keeps re-prompt loops from hanging a test.
#[cfg(test)]
pub struct Scripted {
    answers: std::collections::VecDeque<String>,
    pub transcript: Vec<String>,
}

#[cfg(test)]
impl Scripted {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            transcript: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Prompt for Scripted {
    fn say(&mut self, text: &str) {
        self.transcript.push(text.to_string());
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        self.transcript.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("script exhausted at prompt: {question}"))
    }
}

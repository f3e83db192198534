//! Interactive questions for the configure wizard

use anyhow::anyhow;
use rpassword::prompt_password;
use std::collections::VecDeque;
use std::io::{self, Write};

/// Source of wizard answers
pub trait Prompt {
    /// Ask for a visible value; a blank answer returns `default` (or "")
    fn input(&mut self, label: &str, default: Option<&str>) -> anyhow::Result<String>;

    /// Ask for a hidden value
    fn secret(&mut self, label: &str) -> anyhow::Result<String>;
}

/// Ask until `valid` accepts the answer
pub fn input_valid(
    prompt: &mut dyn Prompt,
    label: &str,
    default: Option<&str>,
    hint: &str,
    valid: impl Fn(&str) -> bool,
) -> anyhow::Result<String> {
    loop {
        let answer = prompt.input(label, default)?;
        if valid(&answer) {
            return Ok(answer);
        }
        crate::output::print_warning(hint);
    }
}

/// Reads answers from the terminal
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn input(&mut self, label: &str, default: Option<&str>) -> anyhow::Result<String> {
        match default.filter(|d| !d.is_empty()) {
            Some(d) => print!("{} [{}]: ", label, d),
            None => print!("{}: ", label),
        }
        io::stdout().flush()?;

        let mut buffer = String::new();
        if io::stdin().read_line(&mut buffer)? == 0 {
            return Err(anyhow!("input closed"));
        }
        let answer = buffer.trim();
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer.to_string())
        }
    }

    fn secret(&mut self, label: &str) -> anyhow::Result<String> {
        prompt_password(format!("{}: ", label)).map_err(|err| anyhow!("read secret: {err}"))
    }
}

/// Replays canned answers, recording the labels asked
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    fn next(&mut self, label: &str) -> anyhow::Result<String> {
        self.asked.push(label.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for \"{}\"", label))
    }
}

impl Prompt for ScriptedPrompt {
    fn input(&mut self, label: &str, default: Option<&str>) -> anyhow::Result<String> {
        let answer = self.next(label)?;
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }

    fn secret(&mut self, label: &str) -> anyhow::Result<String> {
        self.next(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_blank_takes_default() {
        let mut prompt = ScriptedPrompt::new(["", "eu-west-1"]);
        assert_eq!(prompt.input("Region", Some("us-east-1")).unwrap(), "us-east-1");
        assert_eq!(prompt.input("Region", Some("us-east-1")).unwrap(), "eu-west-1");
        assert!(prompt.input("Region", None).is_err());
        assert_eq!(prompt.asked.len(), 3);
    }

    #[test]
    fn test_input_valid_repeats_until_accepted() {
        let mut prompt = ScriptedPrompt::new(["bad name!", "good-name"]);
        let answer = input_valid(&mut prompt, "Profile name", None, "letters only", |s| {
            !s.contains(' ')
        })
        .unwrap();
        assert_eq!(answer, "good-name");
        assert_eq!(prompt.asked.len(), 2);
    }
}

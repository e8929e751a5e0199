//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - The [Selector] seam and its interactive terminal implementation

use std::io::{self, BufRead, Write};

use console::style;

use crate::error::{ReleaseError, Result};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_error, display_release_summary, display_status, display_success, display_warning,
};

/// Validation callback used by prompts: `Err` carries the reason shown to the user
pub type Validator<'a> = &'a dyn Fn(&str) -> std::result::Result<(), String>;

/// Makes the choices the configuration and the command line left open.
pub trait Selector {
    /// Choose one of several remotes.
    fn select_remote(&self, remotes: &[String]) -> Result<String>;

    /// Choose a branch name.
    ///
    /// # Arguments
    /// * `description` - Which branch is asked for (e.g. "development")
    /// * `candidates` - Suggested branch names, possibly empty
    /// * `default` - Answer used on empty input
    /// * `validate` - Only names accepted by this callback may be returned
    fn select_branch(
        &self,
        description: &str,
        candidates: &[String],
        default: Option<&str>,
        validate: Validator<'_>,
    ) -> Result<String>;

    /// Choose the new version string.
    fn select_version(&self, current: Option<&str>, validate: Validator<'_>) -> Result<String>;

    /// Yes/no question, `false` by default.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Interactive [Selector] reading answers from stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSelector;

impl TerminalSelector {
    pub fn new() -> Self {
        TerminalSelector
    }
}

/// Print a prompt and read one trimmed line, end of input meaning cancellation.
fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    let read = io::stdin().lock().read_line(&mut input)?;
    if read == 0 {
        return Err(ReleaseError::Cancelled);
    }
    Ok(input.trim().to_string())
}

/// Resolve a numbered-list answer: an index into `choices` or a literal value.
fn resolve_choice(input: &str, choices: &[String]) -> String {
    match input.parse::<usize>() {
        Ok(index) if index > 0 && index <= choices.len() => choices[index - 1].clone(),
        _ => input.to_string(),
    }
}

impl Selector for TerminalSelector {
    fn select_remote(&self, remotes: &[String]) -> Result<String> {
        println!("\n{}", style("Available remotes:").bold());
        for (i, remote) in remotes.iter().enumerate() {
            println!("  {}. {}", i + 1, remote);
        }

        loop {
            let input = read_line(&format!(
                "\nSelect the remote to use (1-{}) [default: 1]: ",
                remotes.len()
            ))?;

            if input.is_empty() {
                if let Some(first) = remotes.first() {
                    return Ok(first.clone());
                }
            }

            let choice = resolve_choice(&input, remotes);
            if remotes.contains(&choice) {
                return Ok(choice);
            }
            display_error(&format!("Invalid remote: '{}'", input));
        }
    }

    fn select_branch(
        &self,
        description: &str,
        candidates: &[String],
        default: Option<&str>,
        validate: Validator<'_>,
    ) -> Result<String> {
        if !candidates.is_empty() {
            println!("\n{}", style(format!("Known {} branches:", description)).bold());
            for (i, branch) in candidates.iter().enumerate() {
                println!("  {}. {}", i + 1, branch);
            }
        }

        let prompt = match default {
            Some(default) => format!("\nSpecify the desired {} branch [{}]: ", description, default),
            None => format!("\nSpecify the desired {} branch: ", description),
        };

        loop {
            let input = read_line(&prompt)?;
            let answer = match (input.is_empty(), default) {
                (true, Some(default)) => default.to_string(),
                _ => resolve_choice(&input, candidates),
            };

            match validate(&answer) {
                Ok(()) => return Ok(answer),
                Err(reason) => display_error(&reason),
            }
        }
    }

    fn select_version(&self, current: Option<&str>, validate: Validator<'_>) -> Result<String> {
        if let Some(current) = current {
            display_status(&format!("Current version: {}", current));
        }

        loop {
            let answer = read_line("\nSpecify the desired version string: ")?;
            match validate(&answer) {
                Ok(()) => return Ok(answer),
                Err(reason) => display_error(&reason),
            }
        }
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        let response = read_line(&format!("\n{} (y/N): ", prompt))?.to_lowercase();
        Ok(response == "y" || response == "yes")
    }
}

//! Pure formatting functions for UI output.
//!
//! Colors go through `console`, so `console::set_colors_enabled(false)` turns them off.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::cli::orchestration::WorkflowResult;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a non-fatal warning.
pub fn display_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Summary lines printed once the release commit and tag exist.
pub fn release_summary_lines(result: &WorkflowResult) -> Vec<String> {
    let mut lines = Vec::new();

    match &result.previous_version {
        Some(previous) => lines.push(format!("Version: {} -> {}", previous, result.version)),
        None => lines.push(format!("Version: {}", result.version)),
    }
    lines.push(format!("Release branch: {}", result.release_branch));
    lines.push(format!("Development branch: {}", result.development_branch));
    if let Some(commit) = result.commit {
        lines.push(format!("Commit: {}", short_hash(&commit.to_string())));
    }
    if let Some(tag) = &result.tag {
        lines.push(format!("Tag: {}", tag));
    }
    if let Some(remote) = &result.remote {
        lines.push(format!(
            "To publish, run: git push {} {}{}",
            remote,
            result.release_branch,
            result
                .tag
                .as_ref()
                .map(|tag| format!(" {}", tag))
                .unwrap_or_default()
        ));
    }

    lines
}

/// Display the outcome of a release.
pub fn display_release_summary(result: &WorkflowResult) {
    println!("\n{}", style("Release ready:").bold());
    for line in release_summary_lines(result) {
        println!("  {}", line);
    }
}

fn short_hash(hash: &str) -> &str {
    if hash.len() > 7 {
        &hash[..7]
    } else {
        hash
    }
}

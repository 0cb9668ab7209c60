use crate::overlay::hover::HoverState;
use crate::overlay::markup::{self, Segment};
use crate::overlay::Status;
use crate::ErrorDescriptor;
use anyhow::Result;
use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Html => write!(f, "html"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    total_errors: usize,
    errors: &'a [ErrorDescriptor],
}

pub fn print_errors(
    text: &str,
    errors: &[ErrorDescriptor],
    colored_output: bool,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => print_text_errors(text, errors, colored_output),
        OutputFormat::Json => print_json_errors(errors)?,
        OutputFormat::Html => println!("{}", markup::render(text, errors)),
    }
    Ok(())
}

fn print_text_errors(text: &str, errors: &[ErrorDescriptor], colored_output: bool) {
    if errors.is_empty() {
        return;
    }

    println!("\n{}", highlight(text, errors, colored_output));
    println!();

    for (i, error) in errors.iter().enumerate() {
        let position = format!("{}:{}", error.offset, error.length);

        if colored_output {
            println!(
                "  {} {} {} {}",
                format!("{}.", i + 1).dimmed(),
                position.blue().bold(),
                error.bad.red().bold(),
                error.message
            );
        } else {
            println!("  {}. {} {} {}", i + 1, position, error.bad, error.message);
        }

        if !error.suggestions.is_empty() {
            let suggestions = if colored_output {
                error
                    .suggestions
                    .iter()
                    .map(|s| s.green().to_string())
                    .collect::<Vec<_>>()
                    .join(&", ".dimmed().to_string())
            } else {
                error.suggestions.join(", ")
            };
            println!("     → {}", suggestions);
        }
    }
}

fn print_json_errors(errors: &[ErrorDescriptor]) -> Result<()> {
    let output = JsonOutput {
        total_errors: errors.len(),
        errors,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Terminal rendering of `text` with error spans highlighted.
///
/// Without color, flagged runs are bracketed instead.
pub fn highlight(text: &str, errors: &[ErrorDescriptor], colored_output: bool) -> String {
    markup::segments(text, errors)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(run) => run.to_string(),
            Segment::Marked { text: run, .. } if colored_output => {
                run.red().bold().underline().to_string()
            }
            Segment::Marked { text: run, .. } => format!("[{}]", run),
        })
        .collect()
}

pub fn print_check_summary(total_errors: usize, colored: bool) {
    println!();
    if total_errors == 0 {
        if colored {
            println!("{}", "✓ No grammar errors!".green().bold());
        } else {
            println!("✓ No grammar errors!");
        }
    } else {
        let error_word = if total_errors == 1 { "error" } else { "errors" };
        if colored {
            println!(
                "{} {} {} found",
                "✗".red().bold(),
                total_errors.to_string().red().bold(),
                error_word
            );
        } else {
            println!("✗ {} {} found", total_errors, error_word);
        }
    }
}

pub fn print_status(status: Status, colored: bool) {
    let line = status.to_string();
    if line.is_empty() {
        return;
    }
    if !colored {
        println!("{}", line);
        return;
    }
    match status {
        Status::Checking => println!("{}", line.dimmed()),
        Status::Clean => println!("{}", line.green().bold()),
        Status::Found(_) => println!("{}", line.yellow().bold()),
        Status::Idle => {}
    }
}

/// Tooltip for the hovered error. Returns the picked suggestion, if any.
pub fn pick_suggestion(hover: &HoverState, colored: bool) -> Result<Option<String>> {
    if colored {
        println!("\n{} {}", hover.word.red().bold(), hover.message);
    } else {
        println!("\n{} {}", hover.word, hover.message);
    }

    if hover.suggestions.is_empty() {
        println!("  No suggestions.");
        return Ok(None);
    }

    let mut items = hover.suggestions.clone();
    items.push("Skip".to_string());

    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Suggestions")
        .items(&items)
        .default(0)
        .interact_opt()?;

    Ok(choice
        .filter(|&idx| idx < hover.suggestions.len())
        .map(|idx| hover.suggestions[idx].clone()))
}

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use rectifier::cli::output::{self, OutputFormat};
use rectifier::overlay::surface::{OverlayBuffer, Rect, ScrollPosition, TextField};
use rectifier::overlay::{marker_target, Rectifier};
use rectifier::{Config, DebouncedChecker, GrammarCheck, GrammarClient};
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "rectifier")]
#[command(version, about = "Grammar highlighting backed by a remote checking service", long_about = None)]
struct Cli {
    /// Grammar service endpoint (overrides config files)
    #[arg(long, global = true, env = "RECTIFIER_ENDPOINT")]
    endpoint: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a piece of text once and print the errors found
    Check {
        /// Text to check; read from stdin when neither TEXT nor --file is given
        #[arg(value_name = "TEXT")]
        text: Vec<String>,

        /// Read the text from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Output format (text, json, html)
        #[arg(short = 'o', long, default_value = "text")]
        format: OutputFormat,

        /// Exit with code 0 even if errors are found
        #[arg(long)]
        no_fail: bool,
    },
    /// Edit text line by line with live, debounced checking
    ///
    /// Each line you type replaces the text. `:fix N` picks a suggestion for
    /// error N, `:quit` exits.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "rectifier", &mut io::stdout());
        return Ok(());
    }

    if cli.no_color {
        colored::control::set_override(false);
    }
    let colored = !cli.no_color;

    let config = Config::load(cli.endpoint.clone())?;

    match cli.command {
        Some(Commands::Check {
            text,
            file,
            format,
            no_fail,
        }) => {
            let text = read_text(text, file)?;
            let total_errors = check(&text, &config, &format, colored).await?;
            if total_errors > 0 && !no_fail {
                std::process::exit(1);
            }
        }
        Some(Commands::Watch) => watch(&config, colored).await?,
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn read_text(words: Vec<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()));
    }
    if !words.is_empty() {
        return Ok(words.join(" "));
    }

    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read text from stdin")?;
    Ok(text.trim_end_matches(&['\r', '\n'][..]).to_string())
}

async fn check(text: &str, config: &Config, format: &OutputFormat, colored: bool) -> Result<usize> {
    if text.is_empty() {
        println!("Nothing to check.");
        return Ok(0);
    }

    let client = GrammarClient::new(config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.set_message("Checking...");
    pb.enable_steady_tick(Duration::from_millis(80));

    let result = client.check(text).await;
    pb.finish_and_clear();

    let errors = result
        .with_context(|| format!("Grammar check against {} failed", client.endpoint()))?;

    output::print_errors(text, &errors, colored, format)?;
    if let OutputFormat::Text = format {
        output::print_check_summary(errors.len(), colored);
    }

    Ok(errors.len())
}

enum Line {
    Quit,
    Fix(usize),
    Edit(String),
}

impl Line {
    fn parse(line: String) -> Self {
        let trimmed = line.trim();
        if trimmed == ":quit" || trimmed == ":q" {
            return Line::Quit;
        }
        if let Some(n) = trimmed.strip_prefix(":fix ") {
            if let Ok(n) = n.trim().parse() {
                return Line::Fix(n);
            }
        }
        Line::Edit(line)
    }
}

async fn watch(config: &Config, colored: bool) -> Result<()> {
    let client: Arc<dyn GrammarCheck> = Arc::new(GrammarClient::new(config)?);
    let (checker, mut events) = DebouncedChecker::spawn(client, config.debounce());
    let mut rectifier = Rectifier::new(TextField::new(""), OverlayBuffer::default(), checker, config);

    println!(
        "Checking against {}. Type text, `:fix N` to correct error N, `:quit` to exit.",
        config.endpoint
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                match Line::parse(line) {
                    Line::Quit => break,
                    Line::Edit(text) => rectifier.on_input(text),
                    Line::Fix(n) => fix(&mut rectifier, n, colored)?,
                }
            }
            Some(event) = events.recv() => {
                if rectifier.handle_check_event(event) {
                    println!("{}", output::highlight(rectifier.text(), rectifier.errors(), colored));
                    for (i, error) in rectifier.errors().iter().enumerate() {
                        println!("  {}. {} - {}", i + 1, error.bad, error.message);
                    }
                }
                output::print_status(rectifier.status(), colored);
            }
        }
    }

    Ok(())
}

fn fix(
    rectifier: &mut Rectifier<TextField, OverlayBuffer, DebouncedChecker>,
    n: usize,
    colored: bool,
) -> Result<()> {
    let Some(error) = n.checked_sub(1).and_then(|i| rectifier.errors().get(i)).cloned() else {
        println!("No error #{}.", n);
        return Ok(());
    };

    let target = marker_target(&error, Rect::default());
    rectifier.on_pointer_move(Some(&target), ScrollPosition::default());
    let Some(hover) = rectifier.hover().cloned() else {
        return Ok(());
    };

    let picked = tokio::task::block_in_place(|| output::pick_suggestion(&hover, colored))?;
    match picked {
        Some(suggestion) => {
            rectifier.apply_suggestion(&suggestion);
            println!("{}", rectifier.text());
        }
        None => rectifier.on_pointer_leave(),
    }
    Ok(())
}

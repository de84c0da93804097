//! premail - CSS inliner for email HTML

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{ArgAction, Parser};
use walkdir::WalkDir;

use premail::inliner::{InlineResult, ProcessingStats};
use premail::resolver::ValidationWarning;
use premail::{Config, Error, Inliner, Result};

const VALID_TARGETS: &[&str] = &["outlook", "gmail", "apple_mail", "outlook_online", "generic"];

#[derive(Parser)]
#[command(name = "premail")]
#[command(version, about = "CSS inliner for email HTML", long_about = None)]
struct Cli {
    /// Input HTML file (reads stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output HTML file (writes stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Process all HTML files in a directory
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output directory for batch processing
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Target email client (outlook, gmail, apple_mail, outlook_online, generic)
    #[arg(long, default_value = "generic")]
    target: String,

    /// Preserve @media queries in <style> tags
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    preserve_media: bool,

    /// Preserve pseudo-selectors (:hover, :focus, etc.) in <style> tags
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    preserve_pseudo: bool,

    /// Remove <style> tags after inlining
    #[arg(long)]
    remove_style_tags: bool,

    /// Remove CSS rules that don't match any elements
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    strip_unused: bool,

    /// Apply email client optimizations
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    email_optimizations: bool,

    /// Preserve HTML formatting
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    preserve_whitespace: bool,

    /// Verbose output with processing statistics
    #[arg(long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long)]
    quiet: bool,

    /// Show processing statistics
    #[arg(long)]
    stats: bool,

    /// Validate HTML for email compatibility (no inlining)
    #[arg(long)]
    validate: bool,

    /// Show compatibility warnings
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    warnings: bool,

    /// Show processing time when done
    #[arg(long)]
    benchmark: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also land here; only real parse
            // failures are errors.
            let is_error = err.use_stderr();
            let _ = err.print();
            return if is_error {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    validate_args(cli)?;

    let inliner = Inliner::new(build_config(cli));
    let start = Instant::now();

    if cli.validate {
        run_validation(cli, &inliner)?;
    } else if let (Some(input_dir), Some(output_dir)) = (&cli.input_dir, &cli.output_dir) {
        run_batch(cli, &inliner, input_dir, output_dir)?;
    } else if let Some(input) = &cli.input {
        run_single_file(cli, &inliner, input)?;
    } else {
        run_stdin(cli, &inliner)?;
    }

    if cli.benchmark {
        eprintln!("processing completed in {:?}", start.elapsed());
    }
    Ok(())
}

fn validate_args(cli: &Cli) -> Result<()> {
    if cli.input.is_some() && cli.input_dir.is_some() {
        return Err(Error::InvalidArguments(
            "cannot specify both --input and --input-dir".to_string(),
        ));
    }
    if cli.input_dir.is_some() && cli.output_dir.is_none() {
        return Err(Error::InvalidArguments(
            "--output-dir is required when using --input-dir".to_string(),
        ));
    }
    if cli.quiet && cli.verbose {
        return Err(Error::InvalidArguments(
            "cannot specify both --quiet and --verbose".to_string(),
        ));
    }
    if !VALID_TARGETS.contains(&cli.target.as_str()) {
        return Err(Error::InvalidTarget(cli.target.clone()));
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Config {
    Config {
        preserve_media_queries: cli.preserve_media,
        preserve_pseudo_selectors: cli.preserve_pseudo,
        remove_style_tags: cli.remove_style_tags,
        strip_unused_css: cli.strip_unused,
        email_client_optimizations: cli.email_optimizations,
        preserve_whitespace: cli.preserve_whitespace,
        target_email_client: cli.target.clone(),
    }
}

fn run_single_file(cli: &Cli, inliner: &Inliner, input: &Path) -> Result<()> {
    let content = fs::read_to_string(input)?;

    let result = inliner.inline(&content)?;
    write_output(&result.html, cli.output.as_deref())?;

    if cli.stats || cli.verbose {
        show_stats(&result, &input.display().to_string());
    }
    if cli.warnings && !cli.quiet {
        show_warnings(&result.warnings);
    }
    Ok(())
}

fn run_stdin(cli: &Cli, inliner: &Inliner) -> Result<()> {
    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;

    let result = inliner.inline(&content)?;
    write_output(&result.html, cli.output.as_deref())?;

    if cli.stats || cli.verbose {
        show_stats(&result, "<stdin>");
    }
    if cli.warnings && !cli.quiet {
        show_warnings(&result.warnings);
    }
    Ok(())
}

fn run_batch(cli: &Cli, inliner: &Inliner, input_dir: &Path, output_dir: &Path) -> Result<()> {
    let html_files = find_html_files(input_dir)?;
    if html_files.is_empty() {
        return Err(Error::NoInputFiles(input_dir.display().to_string()));
    }

    fs::create_dir_all(output_dir)?;

    let mut total_stats = ProcessingStats::default();
    let mut total_warnings = 0;
    let mut processed = 0;

    for (index, input_path) in html_files.iter().enumerate() {
        if cli.verbose {
            eprintln!(
                "processing {}/{}: {}",
                index + 1,
                html_files.len(),
                input_path.display()
            );
        }

        // Per-file failures don't abort the batch.
        let content = match fs::read_to_string(input_path) {
            Ok(content) => content,
            Err(err) => {
                eprintln!("warning: failed to read {}: {err}", input_path.display());
                continue;
            }
        };
        let result = match inliner.inline(&content) {
            Ok(result) => result,
            Err(err) => {
                eprintln!("warning: failed to process {}: {err}", input_path.display());
                continue;
            }
        };

        let relative = input_path.strip_prefix(input_dir).unwrap_or(input_path);
        let output_path = output_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Err(err) = fs::write(&output_path, &result.html) {
            eprintln!("warning: failed to write {}: {err}", output_path.display());
            continue;
        }

        processed += 1;
        total_stats.css_rules_parsed += result.stats.css_rules_parsed;
        total_stats.html_elements_processed += result.stats.html_elements_processed;
        total_stats.selectors_matched += result.stats.selectors_matched;
        total_stats.processing_time_ms += result.stats.processing_time_ms;
        total_warnings += result.warnings.len();
    }

    if cli.stats || cli.verbose {
        eprintln!("\nbatch processing summary:");
        eprintln!("  files processed: {processed}/{}", html_files.len());
        eprintln!("  CSS rules parsed: {}", total_stats.css_rules_parsed);
        eprintln!(
            "  HTML elements processed: {}",
            total_stats.html_elements_processed
        );
        eprintln!("  selectors matched: {}", total_stats.selectors_matched);
        eprintln!("  total processing time: {}ms", total_stats.processing_time_ms);
        if total_warnings > 0 {
            eprintln!("  total warnings: {total_warnings}");
        }
    }
    Ok(())
}

fn run_validation(cli: &Cli, inliner: &Inliner) -> Result<()> {
    let (content, filename) = match &cli.input {
        Some(path) => (fs::read_to_string(path)?, path.display().to_string()),
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            (content, "<stdin>".to_string())
        }
    };

    let issues = inliner.validate(&content);
    if issues.is_empty() {
        if !cli.quiet {
            println!("✓ {filename}: no email compatibility issues found");
        }
        return Ok(());
    }

    println!("✗ {filename}: found {} email compatibility issues:", issues.len());
    for issue in &issues {
        println!(
            "  [{}] {}: {}",
            issue.severity.to_string().to_uppercase(),
            issue.element,
            issue.message
        );
        if let Some(property) = &issue.property {
            println!("         property: {property}");
        }
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => fs::write(path, content)?,
        None => print!("{content}"),
    }
    Ok(())
}

fn find_html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut html_files = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_html = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
        if is_html {
            html_files.push(entry.into_path());
        }
    }

    html_files.sort();
    Ok(html_files)
}

fn show_stats(result: &InlineResult, filename: &str) {
    eprintln!("\nprocessing statistics for {filename}:");
    eprintln!("  inlined styles: {}", result.inlined_styles);
    eprintln!("  preserved rules: {}", result.preserved_rules);
    eprintln!("  CSS rules parsed: {}", result.stats.css_rules_parsed);
    eprintln!(
        "  HTML elements processed: {}",
        result.stats.html_elements_processed
    );
    eprintln!("  selectors matched: {}", result.stats.selectors_matched);
    eprintln!("  processing time: {}ms", result.stats.processing_time_ms);
}

fn show_warnings(warnings: &[ValidationWarning]) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("\ncompatibility warnings:");
    for warning in warnings {
        eprintln!(
            "  [{}] {}: {} ({})",
            warning.severity.to_string().to_uppercase(),
            warning.property,
            warning.message,
            warning.value
        );
    }
}

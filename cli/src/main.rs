//! labscan CLI - biomarker extraction from OCR-scanned lab reports

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use labscan::{render, AnalyzeOptions, Analyzer, Dictionary, HtmlOptions, JsonFormat, Report};

#[derive(Parser)]
#[command(name = "labscan")]
#[command(version)]
#[command(about = "Extract biomarker measurements from OCR-scanned lab reports", long_about = None)]
struct Cli {
    /// Input OCR payload (.json or .json.gz)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect biomarker measurements in an OCR payload
    Analyze {
        /// Input OCR payload (.json or .json.gz)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputKind,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Custom biomarker dictionary (JSON)
        #[arg(long, value_name = "PATH", env = "LABSCAN_DICTIONARY")]
        dictionary: Option<PathBuf>,

        /// Analyze pages one after another
        #[arg(long)]
        sequential: bool,

        /// Only normalize the OCR pages, skip detection
        #[arg(long)]
        no_analyze: bool,
    },

    /// Render the word boxes of one page as HTML
    Debug {
        /// Input OCR payload (.json or .json.gz)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page number (1-indexed)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Outline grouped lines
        #[arg(long)]
        lines: bool,

        /// Custom biomarker dictionary (JSON)
        #[arg(long, value_name = "PATH", env = "LABSCAN_DICTIONARY")]
        dictionary: Option<PathBuf>,
    },

    /// Show report information
    Info {
        /// Input OCR payload (.json or .json.gz)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Analyze every OCR payload in a directory
    Batch {
        /// Directory with OCR payloads
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Custom biomarker dictionary (JSON)
        #[arg(long, value_name = "PATH", env = "LABSCAN_DICTIONARY")]
        dictionary: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputKind {
    /// Full report as JSON
    Json,
    /// One line per measurement, then warnings
    Text,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Analyze {
            input,
            output,
            format,
            compact,
            dictionary,
            sequential,
            no_analyze,
        }) => cmd_analyze(
            &input,
            output.as_deref(),
            format,
            compact,
            dictionary.as_deref(),
            sequential,
            !no_analyze,
        ),
        Some(Commands::Debug {
            input,
            page,
            output,
            lines,
            dictionary,
        }) => cmd_debug(&input, page, output.as_deref(), lines, dictionary.as_deref()),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Batch {
            input,
            output,
            dictionary,
            compact,
        }) => cmd_batch(&input, output.as_deref(), dictionary.as_deref(), compact),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: analyze if input is provided
            if let Some(input) = cli.input {
                cmd_analyze(&input, None, OutputKind::Text, false, None, false, true)
            } else {
                println!("{}", "Usage: labscan <FILE>".yellow());
                println!("       labscan --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_analyzer(
    dictionary: Option<&Path>,
    sequential: bool,
) -> Result<Analyzer, Box<dyn std::error::Error>> {
    let mut analyzer =
        Analyzer::new().with_options(AnalyzeOptions::new().with_parallel(!sequential));
    if let Some(path) = dictionary {
        analyzer = analyzer.with_dictionary(Dictionary::from_path(path)?);
    }
    Ok(analyzer)
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn cmd_analyze(
    input: &Path,
    output: Option<&Path>,
    format: OutputKind,
    compact: bool,
    dictionary: Option<&Path>,
    sequential: bool,
    analyze: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let analyzer = build_analyzer(dictionary, sequential)?;
    let report = analyzer.from_file(input, analyze)?;

    let content = match format {
        OutputKind::Json => render::to_json(&report, json_format(compact))?,
        OutputKind::Text => render::to_text(&report)?,
    };

    write_or_print(output, &content)?;

    if analyze && !report.warnings().is_empty() {
        eprintln!(
            "{} {} warning(s)",
            "Warning:".yellow().bold(),
            report.warnings().len()
        );
    }

    Ok(())
}

fn cmd_debug(
    input: &Path,
    page: u32,
    output: Option<&Path>,
    lines: bool,
    dictionary: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let analyzer = build_analyzer(dictionary, false)?;
    let report = analyzer.from_file(input, true)?;

    let options = HtmlOptions::new().with_lines(lines).with_measurements(true);
    let html = render::to_html(&report, page, &options)?;

    match output {
        Some(path) => write_or_print(Some(path), &html),
        None => {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            let stem = stem.trim_end_matches(".json");
            let path = PathBuf::from(format!("{}_page{}.html", stem, page));
            write_or_print(Some(&path), &html)
        }
    }
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let format = labscan::detect_format_from_path(input)?;
    let report = Analyzer::new().from_file(input, true)?;

    println!("{}", "Report Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);
    println!("{}: {}", "Pages".bold(), report.page_count());

    for page in &report.pages {
        let languages = if page.languages.is_empty() {
            "-".to_string()
        } else {
            page.languages.join(", ")
        };
        println!(
            "  {} {}: {}x{}, {} words, {} lines, languages: {}",
            "Page".dimmed(),
            page.number,
            page.width,
            page.height,
            page.word_count(),
            page.line_count(),
            languages
        );
    }

    if let serde_json::Value::Object(extras) = &report.metadata.extras {
        for (key, value) in extras.iter().filter(|(k, _)| k.as_str() != "format") {
            println!("{}: {}", key.bold(), serde_json::to_string(value)?);
        }
    }

    println!();
    println!("{}", "Analysis".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    print_summary(&report);

    Ok(())
}

fn print_summary(report: &Report) {
    println!("{}: {}", "Measurements".bold(), report.measurements().len());
    for m in report.measurements() {
        let flag = match m.is_in_range() {
            Some(false) => " (out of range)".red().to_string(),
            _ => String::new(),
        };
        println!(
            "  {} {} {} {}{}",
            "├─".dimmed(),
            m.metadata.name,
            m.value,
            m.unit,
            flag
        );
    }

    println!("{}: {}", "Warnings".bold(), report.warnings().len());
    for warning in report.warnings() {
        println!("  {} {}", "├─".dimmed(), warning.to_string().yellow());
    }
}

/// Collect `.json` and `.json.gz` payloads of a directory, sorted by name.
fn collect_payloads(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            (name.ends_with(".json") || name.ends_with(".json.gz"))
                && !name.ends_with(".measurements.json")
        })
        .collect();
    files.sort();
    Ok(files)
}

fn output_name(input: &Path) -> String {
    let name = input.file_name().unwrap_or_default().to_string_lossy();
    let stem = name
        .trim_end_matches(".gz")
        .trim_end_matches(".json")
        .to_string();
    format!("{}.measurements.json", stem)
}

fn cmd_batch(
    input: &Path,
    output: Option<&Path>,
    dictionary: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_name().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_labscan", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let files = collect_payloads(input)?;
    if files.is_empty() {
        println!("{}", "No OCR payloads found".yellow());
        return Ok(());
    }

    let analyzer = build_analyzer(dictionary, false)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut measurements = 0;
    let mut warnings = 0;
    let mut failures = Vec::new();

    for file in &files {
        let name = file.file_name().unwrap_or_default().to_string_lossy().into_owned();
        pb.set_message(name.clone());

        match analyzer.from_file(file, true) {
            Ok(report) => {
                measurements += report.measurements().len();
                warnings += report.warnings().len();
                let json = render::to_json(&report, json_format(compact))?;
                fs::write(output_dir.join(output_name(file)), json)?;
            }
            Err(e) => {
                log::warn!("Failed to analyze {}: {}", file.display(), e);
                failures.push((name, e.to_string()));
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Done!");

    println!("\n{}", "Batch summary:".green().bold());
    println!("  {} {} files", "├─".dimmed(), files.len());
    println!("  {} {} measurements", "├─".dimmed(), measurements);
    println!("  {} {} warnings", "├─".dimmed(), warnings);
    println!("  {} {} failed", "└─".dimmed(), failures.len());
    for (name, error) in &failures {
        println!("     {} {}: {}", "✗".red(), name, error);
    }
    println!("{} {}", "Output:".bold(), output_dir.display());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "labscan".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Biomarker extraction from OCR-scanned lab reports");
    println!();
    println!("License: MIT");
}

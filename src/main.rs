// SPDX-License-Identifier: MIT
//
// n-tone — design tokens in, WCAG AA compliant custom properties out.
//
// This is the main binary that wires together all the crates:
//
//   n-token → documents, token index, reference grammar, property names
//   n-theme → palettes, core colors, layers, stepping, the full computation
//   n-style → registry, write-boundary validation, stylesheet rendering
//   n-watch → startup validation and bounded auto-fix
//
// Every command runs the same pipeline:
//
//   tokens.json ─┐
//   theme.json  ─┼─► Context ─► compute ─► PropertyStore ─► attach/validate
//   ui-kit.json ─┘                                               │
//                                              stylesheet ◄──────┴──► report
//
// `check` stops after the report and exits non-zero on errors. `build`
// also writes the stylesheet. `preset` dumps a built-in document set.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use n_style::{MemoryRegistry, stylesheet};
use n_theme::builtin::{builtin_names, builtin_preset};
use n_theme::{ComplianceReport, Context, EngineOptions};
use n_token::Mode;
use n_watch::ComplianceWatcher;

// ─── Command line ───────────────────────────────────────────────────────────

/// Resolve design tokens into AA-compliant CSS custom properties.
#[derive(Parser, Debug)]
#[command(name = "n-tone", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute, validate, and write the stylesheet.
    Build(BuildArgs),

    /// Compute and validate only. Exits 1 when any error is found.
    Check(InputArgs),

    /// Write a built-in preset's documents, or list the presets.
    Preset(PresetArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Token document.
    #[arg(long, required_unless_present = "preset", requires = "theme")]
    tokens: Option<PathBuf>,

    /// Theme document.
    #[arg(long, requires = "tokens")]
    theme: Option<PathBuf>,

    /// UI-kit document.
    #[arg(long)]
    ui_kit: Option<PathBuf>,

    /// Use a built-in preset instead of documents.
    #[arg(long, conflicts_with_all = ["tokens", "theme", "ui_kit"])]
    preset: Option<String>,

    /// Engine options file (JSON).
    #[arg(long)]
    options: Option<PathBuf>,

    /// Token reference for the text emphasis opacity.
    #[arg(long)]
    text_emphasis: Option<String>,

    /// Bound on transitive reference resolution.
    #[arg(long)]
    max_reference_depth: Option<usize>,

    /// Mode UI-kit brand bindings point at.
    #[arg(long)]
    ui_kit_mode: Option<Mode>,

    /// Compliance report format.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,

    /// Write the report here instead of stderr.
    #[arg(long)]
    report_out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Stylesheet destination. Stdout when omitted.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write the stylesheet even when validation found errors.
    #[arg(long)]
    allow_errors: bool,
}

#[derive(Args, Debug)]
struct PresetArgs {
    /// Preset name.
    #[arg(required_unless_present = "list")]
    name: Option<String>,

    /// Directory for tokens.json, theme.json, and ui-kit.json.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// List the built-in presets.
    #[arg(long)]
    list: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

// ─── Pipeline ───────────────────────────────────────────────────────────────

impl InputArgs {
    /// Options file first, then flags on top.
    fn options(&self) -> Result<EngineOptions> {
        let mut options = match &self.options {
            Some(path) => EngineOptions::load(path)?,
            None => EngineOptions::default(),
        };
        if let Some(text_emphasis) = &self.text_emphasis {
            options.text_emphasis = Some(text_emphasis.clone());
        }
        if let Some(depth) = self.max_reference_depth {
            options.max_reference_depth = depth;
        }
        if let Some(mode) = self.ui_kit_mode {
            options.ui_kit_mode = mode;
        }
        Ok(options)
    }

    fn context(&self) -> Result<Context> {
        let options = self.options()?;
        if let Some(name) = &self.preset {
            let Some(preset) = builtin_preset(name) else {
                bail!("unknown preset {name:?} (available: {})", builtin_names().join(", "));
            };
            return Ok(preset.into_context(options));
        }
        let (Some(tokens), Some(theme)) = (&self.tokens, &self.theme) else {
            bail!("--tokens and --theme are required without --preset");
        };
        Ok(Context::load(tokens, theme, self.ui_kit.as_deref(), options)?)
    }

    fn emit_report(&self, report: &ComplianceReport) -> Result<()> {
        let text = match self.report {
            ReportFormat::Text => report.render_text(),
            ReportFormat::Json => report.render_json().context("rendering the report")? + "\n",
        };
        match &self.report_out {
            Some(path) => write_file(path, &text),
            None => {
                io::stderr().write_all(text.as_bytes())?;
                Ok(())
            }
        }
    }
}

/// Compute, apply to a fresh registry, and run the startup validation.
fn run(input: &InputArgs) -> Result<(ComplianceWatcher<MemoryRegistry>, ComplianceReport)> {
    let ctx = input.context()?;
    let mut watcher = ComplianceWatcher::new(ctx, MemoryRegistry::new());
    let outcome = watcher.attach();
    tracing::info!(
        properties = watcher.computation().map.len(),
        fixed = outcome.fixed.len(),
        "pipeline finished"
    );
    Ok((watcher, outcome.report))
}

fn build(args: &BuildArgs) -> Result<ExitCode> {
    let (watcher, report) = run(&args.input)?;
    args.input.emit_report(&report)?;
    if report.has_errors() && !args.allow_errors {
        bail!("validation found errors; stylesheet not written (use --allow-errors to write anyway)");
    }
    let css = stylesheet(watcher.registry());
    match &args.out {
        Some(path) => write_file(path, &css)?,
        None => io::stdout().write_all(css.as_bytes())?,
    }
    Ok(ExitCode::SUCCESS)
}

fn check(input: &InputArgs) -> Result<ExitCode> {
    let (_, report) = run(input)?;
    input.emit_report(&report)?;
    Ok(if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn preset(args: &PresetArgs) -> Result<ExitCode> {
    if args.list {
        for name in builtin_names() {
            println!("{name}");
        }
        return Ok(ExitCode::SUCCESS);
    }
    let Some(name) = &args.name else {
        bail!("a preset name is required");
    };
    let Some(preset) = builtin_preset(name) else {
        bail!("unknown preset {name:?} (available: {})", builtin_names().join(", "));
    };
    fs::create_dir_all(&args.out_dir).with_context(|| format!("creating {}", args.out_dir.display()))?;
    for (file, doc) in [
        ("tokens.json", &preset.tokens),
        ("theme.json", &preset.theme),
        ("ui-kit.json", &preset.ui_kit),
    ] {
        let text = serde_json::to_string_pretty(doc.root())? + "\n";
        write_file(&args.out_dir.join(file), &text)?;
    }
    tracing::info!(preset = preset.name, dir = %args.out_dir.display(), "preset written");
    Ok(ExitCode::SUCCESS)
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Command::Build(args) => build(args),
        Command::Check(input) => check(input),
        Command::Preset(args) => preset(args),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("n-tone: {e:#}");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

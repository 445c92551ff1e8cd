//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_md2pdf::{
    convert, ArtifactKind, ConversionConfig, ConversionOutput, ConversionProgressCallback,
    PluginKind, PluginRegistry, ProgressCallback, Report, StageKind,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner that follows the run through
/// processing, rendering and writing, plus the `Reporter:` line.
///
/// Installed on every run, since the report must reach stderr even when the
/// spinner is disabled.
struct CliProgressCallback {
    /// Spinner anchored at the bottom of the terminal; `None` when disabled.
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl CliProgressCallback {
    fn new(show_spinner: bool, quiet: bool) -> Arc<Self> {
        let bar = show_spinner.then(|| {
            let bar = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Processing");
            bar.set_message("Reading input…");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self { bar, quiet })
    }

    /// Print a line above the spinner, or straight to stderr without one.
    fn println(&self, line: String) {
        match self.bar {
            Some(ref bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_plugin_resolved(&self, kind: PluginKind, name: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(format!("{kind} plugin {name}"));
        }
    }

    fn on_stage_start(&self, stage: StageKind) {
        if let Some(ref bar) = self.bar {
            bar.set_message(stage.to_string());
        }
    }

    fn on_report(&self, report: &Report) {
        if !self.quiet {
            self.println(format!("Reporter: {report}"));
        }
    }

    fn on_render_start(&self) {
        if let Some(ref bar) = self.bar {
            bar.set_prefix("Rendering");
            bar.set_message("Launching browser…");
        }
    }

    fn on_artifact_written(&self, kind: ArtifactKind, path: &Path, bytes: usize) {
        if !self.quiet {
            self.println(format!(
                "  {} {:<4}  {}  {}",
                green("✓"),
                kind.to_string(),
                path.display(),
                dim(&format!("{bytes} bytes")),
            ));
        }
        if let (Some(bar), ArtifactKind::Html) = (&self.bar, kind) {
            bar.set_message("Waiting for browser…");
        }
    }

    fn on_conversion_complete(&self, _artifacts_written: usize) {
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert ./input.md into ./pdf.html, ./pdf.pdf and ./pdf.png
  md2pdf

  # Work in another directory
  md2pdf -C docs/report

  # Only produce the intermediate HTML (no browser needed)
  md2pdf --html-only

  # Inside a container running as root
  md2pdf --no-sandbox --browser /usr/bin/chromium

  # Wider viewport, screenshot of the whole page
  md2pdf --width 1280 --height 800 --full-page

  # Machine-readable summary
  md2pdf --json > summary.json

FRONT MATTER (input.md):
  ---
  remarkPlugins: [remark-gfm, remark-math]
  rehypePlugins: [rehype-slug, rehype-autolink-headings]
  stylesheets:
    - style.css
    - { href: print.css, media: print }
  title: Quarterly report
  lang: en
  ---

ENVIRONMENT VARIABLES:
  CHROME_PATH             Chrome/Chromium executable (when --browser is not set)
  MD2PDF_*                Every flag, e.g. MD2PDF_WORKDIR, MD2PDF_NO_SANDBOX
  RUST_LOG                Override the log filter (e.g. edgequake_md2pdf=debug)

SETUP:
  Any Chrome or Chromium install is picked up automatically from PATH or the
  usual install locations. Run `md2pdf --list-plugins` to see the plugin
  identifiers front matter may use.
"#;

/// Render a Markdown document to HTML, PDF and PNG.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Render input.md to pdf.html, pdf.pdf and pdf.png",
    long_about = "Render a Markdown document to HTML, then to a PDF and a PNG snapshot with \
headless Chrome/Chromium. The document's YAML front matter selects the remark and rehype \
plugins and the stylesheets to apply.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory holding input.md; the artifacts are written next to it.
    #[arg(short = 'C', long, env = "MD2PDF_WORKDIR", default_value = ".")]
    workdir: PathBuf,

    /// Stop after writing pdf.html.
    #[arg(long, env = "MD2PDF_HTML_ONLY")]
    html_only: bool,

    /// Chrome/Chromium executable. Auto-detected when not set.
    #[arg(long, env = "MD2PDF_BROWSER")]
    browser: Option<PathBuf>,

    /// Launch the browser without its sandbox (needed as root in containers).
    #[arg(long, env = "MD2PDF_NO_SANDBOX")]
    no_sandbox: bool,

    /// Viewport width in CSS pixels (320–7680).
    #[arg(long, env = "MD2PDF_WIDTH", default_value_t = 800,
          value_parser = clap::value_parser!(u32).range(320..=7680))]
    width: u32,

    /// Viewport height in CSS pixels (240–4320).
    #[arg(long, env = "MD2PDF_HEIGHT", default_value_t = 600,
          value_parser = clap::value_parser!(u32).range(240..=4320))]
    height: u32,

    /// Capture the whole page in the PNG instead of the viewport.
    #[arg(long, env = "MD2PDF_FULL_PAGE")]
    full_page: bool,

    /// Browser launch timeout in seconds.
    #[arg(long, env = "MD2PDF_LAUNCH_TIMEOUT", default_value_t = 30,
          value_parser = clap::value_parser!(u64).range(1..))]
    launch_timeout: u64,

    /// Timeout in seconds for each of content load, PDF and PNG capture.
    #[arg(long, env = "MD2PDF_RENDER_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    render_timeout: u64,

    /// Print the built-in plugin identifiers and exit.
    #[arg(long)]
    list_plugins: bool,

    /// Output structured JSON (ConversionOutput) on stdout.
    #[arg(long, env = "MD2PDF_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active;
    // the spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List-plugins mode ────────────────────────────────────────────────
    if cli.list_plugins {
        print_plugins(&PluginRegistry::default());
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = CliProgressCallback::new(show_progress, cli.quiet);
    let config = build_config(&cli, progress.clone() as ProgressCallback)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert(&config).await;
    progress.finish();
    let output = result.context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&output);
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: ProgressCallback) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .workdir(&cli.workdir)
        .html_only(cli.html_only)
        .no_sandbox(cli.no_sandbox)
        .viewport(cli.width, cli.height)
        .full_page_screenshot(cli.full_page)
        .launch_timeout_secs(cli.launch_timeout)
        .render_timeout_secs(cli.render_timeout)
        .progress_callback(progress);

    if let Some(ref browser) = cli.browser {
        builder = builder.browser_path(browser);
    }

    builder.build().context("Invalid configuration")
}

fn print_plugins(registry: &PluginRegistry) {
    println!("{}", bold("remarkPlugins"));
    for name in registry.syntax_names() {
        println!("  {name}");
    }
    println!("{}", bold("rehypePlugins"));
    for name in registry.markup_names() {
        println!("  {name}");
    }
}

fn print_summary(output: &ConversionOutput) {
    let stats = &output.stats;
    if output.html_only() {
        eprintln!(
            "{}  HTML only  {}ms  →  {}",
            green("✔"),
            stats.total_duration_ms,
            bold(&output.paths.html.display().to_string()),
        );
        return;
    }

    eprintln!(
        "{}  {} + {}  {}ms",
        if output.report.is_empty() {
            green("✔")
        } else {
            cyan("⚠")
        },
        bold(&output.paths.pdf.display().to_string()),
        bold(&output.paths.png.display().to_string()),
        stats.total_duration_ms,
    );
    eprintln!(
        "   {}  /  PNG {}x{}  /  render {}ms",
        dim(&format!("PDF {} bytes", stats.pdf_bytes)),
        stats.png_width,
        stats.png_height,
        stats.render_duration_ms,
    );
}

//! End-to-end integration tests for edgequake-md2pdf.
//!
//! The processing tests run everywhere: they only touch a temporary working
//! directory. The render tests launch a real Chrome/Chromium and are gated
//! behind the `E2E_ENABLED` environment variable so they do not run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Inside a container running as root, also set `E2E_NO_SANDBOX=1`.

use edgequake_md2pdf::{
    convert, process_markdown, ArtifactKind, ConversionConfig, ConversionProgressCallback,
    Md2PdfError, PluginKind, PluginRegistry, StageKind,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A fresh working directory holding `input.md` with `markdown`.
fn workdir_with(markdown: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("input.md"), markdown).expect("write input.md");
    dir
}

fn html_only_config(dir: &Path) -> ConversionConfig {
    ConversionConfig::builder()
        .workdir(dir)
        .html_only(true)
        .build()
        .expect("valid config")
}

fn artifact(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

/// Skip this test unless E2E_ENABLED is set *and* a browser can be found.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if !chrome_auto::is_browser_available() {
            println!("SKIP — no Chrome/Chromium found");
            println!("       Set CHROME_PATH or install chromium");
            return;
        }
    }};
}

fn render_config(dir: &Path) -> ConversionConfig {
    ConversionConfig::builder()
        .workdir(dir)
        .no_sandbox(std::env::var("E2E_NO_SANDBOX").is_ok())
        .build()
        .expect("valid config")
}

// ── Processing tests (no browser) ────────────────────────────────────────────

#[tokio::test]
async fn test_hello_writes_full_shell_without_links() {
    let dir = workdir_with("# Hello");
    let out = convert(&html_only_config(dir.path()))
        .await
        .expect("convert should succeed");

    let html = std::fs::read_to_string(artifact(dir.path(), "pdf.html")).unwrap();
    assert_eq!(html, out.html);
    assert!(html.starts_with("<!doctype html>\n<html lang=\"en\">\n  <head>\n"));
    assert!(html.contains("<meta charset=\"utf-8\">"));
    assert_eq!(html.matches("<h1>Hello</h1>").count(), 1);
    assert_eq!(html.matches("<link").count(), 0);
    assert!(html.ends_with("</html>\n"));
    assert!(out.report.is_empty());
}

#[tokio::test]
async fn test_single_stylesheet_links_once() {
    let dir = workdir_with("---\nstylesheets: [\"style.css\"]\n---\n# Hello\n");
    let out = convert(&html_only_config(dir.path())).await.unwrap();

    assert_eq!(
        out.html
            .matches("<link rel=\"stylesheet\" href=\"style.css\">")
            .count(),
        1
    );
    assert_eq!(out.html.matches("<link").count(), 1);
    assert_eq!(out.stylesheets, vec!["style.css"]);
}

#[tokio::test]
async fn test_invalid_stylesheets_are_reported_not_fatal() {
    let dir = workdir_with(
        "---\n\
         stylesheets:\n\
         \x20 - first.css\n\
         \x20 - 42\n\
         \x20 - { media: print }\n\
         \x20 - { href: print.css, media: print }\n\
         ---\n\
         body\n",
    );
    let out = convert(&html_only_config(dir.path())).await.unwrap();

    assert_eq!(out.stylesheets, vec!["first.css", "print.css"]);
    assert_eq!(out.report.len(), 2);
    let first = out.html.find("first.css").unwrap();
    let second = out.html.find("print.css").unwrap();
    assert!(first < second, "stylesheets must keep declared order");
    assert!(out
        .html
        .contains("<link rel=\"stylesheet\" href=\"print.css\" media=\"print\">"));
}

#[tokio::test]
async fn test_unknown_plugin_fails_without_writing() {
    let dir = workdir_with("---\nremarkPlugins: [\"nonexistent-plugin-xyz\"]\n---\n# Hello\n");
    let err = convert(&html_only_config(dir.path())).await.unwrap_err();

    assert!(matches!(
        err,
        Md2PdfError::PluginNotFound {
            kind: PluginKind::Remark,
            ..
        }
    ));
    assert!(err.to_string().contains("nonexistent-plugin-xyz"));
    for name in ["pdf.html", "pdf.pdf", "pdf.png"] {
        assert!(!artifact(dir.path(), name).exists(), "{name} must not exist");
    }
}

#[tokio::test]
async fn test_running_twice_is_byte_identical() {
    let md = "---\n\
              remarkPlugins: [remark-gfm, remark-math]\n\
              rehypePlugins: [rehype-slug, rehype-autolink-headings]\n\
              ---\n\
              # Title\n\n\
              | a | b |\n|---|:-:|\n| 1 | 2 |\n\n\
              - [x] done\n- [ ] todo\n\n\
              Inline $x^2$ and a note[^1].\n\n\
              [^1]: The note.\n";
    let dir = workdir_with(md);
    let config = html_only_config(dir.path());

    let first = convert(&config).await.unwrap();
    let on_disk_first = std::fs::read(artifact(dir.path(), "pdf.html")).unwrap();
    let second = convert(&config).await.unwrap();
    let on_disk_second = std::fs::read(artifact(dir.path(), "pdf.html")).unwrap();

    assert_eq!(first.html, second.html);
    assert_eq!(on_disk_first, on_disk_second);
}

#[test]
fn test_gfm_document_structure() {
    let doc = process_markdown(
        "---\nremarkPlugins: [remark-gfm]\nrehypePlugins: [rehype-slug]\n---\n\
         ## Intro\n\n## Intro\n\n~~old~~ new\n\n| h |\n|---|\n| c |\n",
        &PluginRegistry::default(),
        None,
    )
    .unwrap();

    assert!(doc.html.contains("<h2 id=\"intro\">Intro</h2>"));
    assert!(doc.html.contains("<h2 id=\"intro-1\">Intro</h2>"));
    assert!(doc.html.contains("<del>old</del>"));
    assert!(doc.html.contains("<table>"));
    assert!(doc.html.contains("<thead>"));
}

#[test]
fn test_title_and_lang_from_front_matter() {
    let doc = process_markdown(
        "---\ntitle: Rapport\nlang: fr\n---\nBonjour\n",
        &PluginRegistry::default(),
        None,
    )
    .unwrap();
    assert!(doc.html.contains("<html lang=\"fr\">"));
    assert!(doc.html.contains("<title>Rapport</title>"));
    assert!(doc.html.contains("<p>Bonjour</p>"));
}

#[test]
fn test_malformed_front_matter_is_fatal() {
    let err = process_markdown(
        "---\nremarkPlugins: [unclosed\n---\n# Hi\n",
        &PluginRegistry::default(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, Md2PdfError::FrontMatter { .. }));
}

#[tokio::test]
async fn test_progress_events_follow_the_run() {
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ConversionProgressCallback for Recorder {
        fn on_plugin_resolved(&self, kind: PluginKind, name: &str) {
            self.0.lock().unwrap().push(format!("{kind}:{name}"));
        }
        fn on_stage_complete(&self, stage: StageKind, _elapsed_ms: u64) {
            self.0.lock().unwrap().push(stage.to_string());
        }
        fn on_report(&self, _report: &edgequake_md2pdf::Report) {
            self.0.lock().unwrap().push("report".into());
        }
        fn on_artifact_written(&self, kind: ArtifactKind, _path: &Path, _bytes: usize) {
            self.0.lock().unwrap().push(format!("wrote {kind}"));
        }
    }

    let dir = workdir_with("---\nrehypePlugins: [rehype-slug]\n---\n# Hi\n");
    let recorder = Arc::new(Recorder::default());
    let config = ConversionConfig::builder()
        .workdir(dir.path())
        .html_only(true)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    convert(&config).await.unwrap();

    let events = recorder.0.lock().unwrap().clone();
    let mut expected = vec!["rehype:rehype-slug".to_string()];
    expected.extend(StageKind::ALL.iter().map(|s| s.to_string()));
    expected.push("report".into());
    expected.push("wrote HTML".into());
    assert_eq!(events, expected);
}

#[test]
fn test_noop_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<edgequake_md2pdf::NoopProgressCallback>();
    assert_send_sync::<ConversionConfig>();
}

// ── CLI tests ────────────────────────────────────────────────────────────────

#[cfg(feature = "cli")]
mod cli {
    use super::*;
    use std::process::Command;

    fn md2pdf(dir: &Path, args: &[&str]) -> std::process::Output {
        Command::new(env!("CARGO_BIN_EXE_md2pdf"))
            .arg("-C")
            .arg(dir)
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("spawn md2pdf")
    }

    #[test]
    fn test_cli_unknown_plugin_exits_non_zero() {
        let dir = workdir_with("---\nremarkPlugins: [\"nonexistent-plugin-xyz\"]\n---\n# Hello\n");
        let out = md2pdf(dir.path(), &["--no-progress"]);

        assert!(!out.status.success());
        assert_eq!(out.status.code(), Some(1));
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("nonexistent-plugin-xyz"), "stderr: {stderr}");
        for name in ["pdf.html", "pdf.pdf", "pdf.png"] {
            assert!(!artifact(dir.path(), name).exists(), "{name} must not exist");
        }
    }

    #[test]
    fn test_cli_html_only_prints_reporter() {
        let dir = workdir_with("# Hello\n");
        let out = md2pdf(dir.path(), &["--html-only", "--no-progress"]);

        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("Reporter: no issues found"), "stderr: {stderr}");
        assert!(artifact(dir.path(), "pdf.html").exists());
        assert!(!artifact(dir.path(), "pdf.pdf").exists());
    }

    #[test]
    fn test_cli_json_summary() {
        let dir = workdir_with("---\ntitle: T\n---\n# Hello\n");
        let out = md2pdf(dir.path(), &["--html-only", "--json"]);

        assert!(out.status.success());
        let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
        assert_eq!(json["title"], "T");
        assert_eq!(json["written"].as_array().unwrap().len(), 1);
        assert!(json.get("html").is_none());
    }

    #[test]
    fn test_cli_list_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let out = md2pdf(dir.path(), &["--list-plugins"]);
        assert!(out.status.success());
        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("remark-gfm"));
        assert!(stdout.contains("rehype-slug"));
    }
}

// ── Render tests (real browser) ──────────────────────────────────────────────

#[tokio::test]
async fn test_render_produces_pdf_and_viewport_png() {
    e2e_skip_unless_ready!();

    let dir = workdir_with("---\nremarkPlugins: [remark-gfm]\n---\n# Hello\n\nSome **bold** text.\n");
    let out = convert(&render_config(dir.path()))
        .await
        .expect("render should succeed");

    let pdf = std::fs::read(artifact(dir.path(), "pdf.pdf")).unwrap();
    let png = std::fs::read(artifact(dir.path(), "pdf.png")).unwrap();
    assert!(pdf.starts_with(b"%PDF"), "PDF magic missing");
    assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"), "PNG signature missing");
    assert_eq!((out.stats.png_width, out.stats.png_height), (800, 600));
    assert_eq!(out.written.len(), 3);
    assert!(!out.html_only());

    println!("Stats: {:?}", out.stats);
}

#[tokio::test]
async fn test_render_with_missing_stylesheet_still_succeeds() {
    e2e_skip_unless_ready!();

    let dir = workdir_with("---\nstylesheets: [does-not-exist.css]\n---\n# Hello\n");
    let out = convert(&render_config(dir.path())).await.unwrap();
    assert!(artifact(dir.path(), "pdf.pdf").exists());
    assert!(out.stats.pdf_bytes > 0);
}

#[tokio::test]
async fn test_render_bad_browser_path_keeps_html() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }

    let dir = workdir_with("# Hello\n");
    let config = ConversionConfig::builder()
        .workdir(dir.path())
        .browser_path(dir.path().join("not-a-browser"))
        .launch_timeout_secs(5)
        .build()
        .unwrap();
    let err = convert(&config).await.unwrap_err();

    assert!(matches!(
        err,
        Md2PdfError::BrowserLaunch { .. } | Md2PdfError::RenderTimeout { .. }
    ));
    assert!(artifact(dir.path(), "pdf.html").exists());
    assert!(!artifact(dir.path(), "pdf.pdf").exists());
}

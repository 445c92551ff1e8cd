//! Render orchestration: final HTML → PDF + PNG via headless Chromium.
//!
//! One browser, one page, one load. The page emulates `screen` media before
//! the content is set, so the PDF looks like the PNG rather than like a
//! print stylesheet. The HTML is loaded as page content, never navigated to,
//! so relative stylesheet URLs resolve against `about:blank`.
//!
//! ## Why a throwaway profile?
//!
//! Chromium refuses to share a profile directory between running instances.
//! A fresh [`TempDir`] per run avoids lock conflicts with a desktop browser
//! and leaves nothing behind when the run ends.
//!
//! Every browser step is bounded by a timeout. Once launched, the browser is
//! closed and the CDP handler task joined on every path, success or failure.

use crate::config::ConversionConfig;
use crate::error::{ArtifactKind, Md2PdfError};
use crate::output::RenderArtifacts;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetEmulatedMediaParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use image::{ImageFormat, ImageReader};
use std::future::Future;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Upper bound for closing the browser and joining the handler.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Load `html` into a headless browser page and capture a PDF and a PNG.
pub async fn render_html(
    html: &str,
    config: &ConversionConfig,
) -> Result<RenderArtifacts, Md2PdfError> {
    let executable = resolve_browser(config)?;
    let profile = TempDir::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create browser profile dir: {e}")))?;

    let mut builder = BrowserConfig::builder()
        .chrome_executable(&executable)
        .user_data_dir(profile.path())
        .viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            ..Default::default()
        })
        .request_timeout(Duration::from_secs(config.render_timeout_secs));
    if config.no_sandbox {
        builder = builder.no_sandbox();
    }
    let browser_config = builder.build().map_err(|detail| Md2PdfError::BrowserLaunch {
        path: executable.clone(),
        detail,
    })?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_render_start();
    }
    info!("Launching headless browser: {}", executable.display());

    let (browser, mut handler) = bounded(
        "browser launch",
        config.launch_timeout_secs,
        Browser::launch(browser_config),
    )
    .await?
    .map_err(|e| Md2PdfError::BrowserLaunch {
        path: executable.clone(),
        detail: e.to_string(),
    })?;

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("CDP handler: {e}");
            }
        }
    });

    let captured = capture(&browser, html, config).await;
    shutdown(browser, handler_task).await;
    drop(profile);

    let artifacts = captured?;
    info!(
        "Captured PDF ({} bytes) and PNG ({}x{}, {} bytes)",
        artifacts.pdf.len(),
        artifacts.png_width,
        artifacts.png_height,
        artifacts.png.len()
    );
    Ok(artifacts)
}

fn resolve_browser(config: &ConversionConfig) -> Result<PathBuf, Md2PdfError> {
    match config.browser_path {
        Some(ref path) => Ok(path.clone()),
        None => chrome_auto::locate_browser()
            .map_err(|e| Md2PdfError::BrowserNotFound(e.to_string())),
    }
}

async fn capture(
    browser: &Browser,
    html: &str,
    config: &ConversionConfig,
) -> Result<RenderArtifacts, Md2PdfError> {
    let secs = config.render_timeout_secs;
    let load_failed = |e: chromiumoxide::error::CdpError| Md2PdfError::ContentLoad {
        detail: e.to_string(),
    };

    let page = bounded("page open", secs, browser.new_page("about:blank"))
        .await?
        .map_err(load_failed)?;

    let screen = SetEmulatedMediaParams::builder().media("screen").build();
    bounded("media emulation", secs, page.execute(screen))
        .await?
        .map_err(load_failed)?;

    bounded("content load", secs, page.set_content(html))
        .await?
        .map_err(load_failed)?;
    debug!("Content loaded ({} bytes)", html.len());

    let pdf = bounded("pdf capture", secs, page.pdf(PrintToPdfParams::default()))
        .await?
        .map_err(|e| Md2PdfError::Capture {
            artifact: ArtifactKind::Pdf,
            detail: e.to_string(),
        })?;
    if !pdf.starts_with(b"%PDF") {
        return Err(Md2PdfError::Capture {
            artifact: ArtifactKind::Pdf,
            detail: "browser output is missing the %PDF header".into(),
        });
    }

    let screenshot = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(config.full_page_screenshot)
        .build();
    let png = bounded("png capture", secs, page.screenshot(screenshot))
        .await?
        .map_err(|e| Md2PdfError::Capture {
            artifact: ArtifactKind::Png,
            detail: e.to_string(),
        })?;
    let (png_width, png_height) = png_dimensions(&png)?;

    Ok(RenderArtifacts {
        pdf,
        png,
        png_width,
        png_height,
    })
}

/// Close the browser and join its handler, falling back to kill/abort.
async fn shutdown(mut browser: Browser, mut handler_task: JoinHandle<()>) {
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, browser.close()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            warn!("Browser did not close cleanly: {e}; killing it");
            browser.kill().await;
        }
        Err(_) => {
            warn!("Browser close timed out; killing it");
            browser.kill().await;
        }
    }
    if let Err(e) = browser.wait().await {
        warn!("Failed to reap browser process: {e}");
    }

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut handler_task).await {
        Ok(Ok(())) => debug!("CDP handler finished"),
        Ok(Err(e)) => warn!("CDP handler task failed: {e}"),
        Err(_) => {
            warn!("CDP handler did not stop; aborting it");
            handler_task.abort();
        }
    }
}

/// Run `fut` with a deadline of `secs` seconds.
async fn bounded<T>(
    step: &'static str,
    secs: u64,
    fut: impl Future<Output = T>,
) -> Result<T, Md2PdfError> {
    tokio::time::timeout(Duration::from_secs(secs), fut)
        .await
        .map_err(|_| {
            warn!("Browser step '{step}' timed out after {secs}s");
            Md2PdfError::RenderTimeout { step, secs }
        })
}

/// Width and height from a PNG header.
pub fn png_dimensions(png: &[u8]) -> Result<(u32, u32), Md2PdfError> {
    ImageReader::with_format(Cursor::new(png), ImageFormat::Png)
        .into_dimensions()
        .map_err(|e| Md2PdfError::Capture {
            artifact: ArtifactKind::Png,
            detail: format!("screenshot is not a valid PNG: {e}"),
        })
}

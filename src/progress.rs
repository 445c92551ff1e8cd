//! Progress-callback trait for pipeline and render events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the run resolves plugins, walks the eight pipeline stages,
//! drives the browser and writes artifacts.
//!
//! Callers forward events wherever they like: a terminal spinner, a log, a
//! test probe. The trait is `Send + Sync` since the render step runs on the
//! tokio runtime.
//!
//! # Example
//!
//! ```rust
//! use edgequake_md2pdf::{ConversionConfig, ConversionProgressCallback, PluginKind};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     plugins: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_plugin_resolved(&self, kind: PluginKind, name: &str) {
//!         self.plugins.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{kind} plugin {name} ready");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { plugins: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::{ArtifactKind, PluginKind};
use crate::pipeline::StageKind;
use crate::report::Report;
use std::path::Path;
use std::sync::Arc;

/// Called by the conversion run as it makes progress.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// A declared plugin identifier was found in the registry.
    fn on_plugin_resolved(&self, kind: PluginKind, name: &str) {
        let _ = (kind, name);
    }

    /// A stylesheet entry was accepted and will be linked from the head.
    fn on_stylesheet_added(&self, href: &str) {
        let _ = href;
    }

    /// A pipeline stage is about to run.
    fn on_stage_start(&self, stage: StageKind) {
        let _ = stage;
    }

    /// A pipeline stage finished without error.
    ///
    /// # Arguments
    /// * `stage`     : the stage that ran
    /// * `elapsed_ms`: wall-clock time spent in the stage
    fn on_stage_complete(&self, stage: StageKind, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Processing finished; `report` holds every diagnostic raised so far.
    ///
    /// Fires before the browser is launched, so the report is surfaced even
    /// when rendering fails afterwards.
    fn on_report(&self, report: &Report) {
        let _ = report;
    }

    /// The browser is about to be launched.
    fn on_render_start(&self) {}

    /// An artifact was flushed to disk.
    ///
    /// # Arguments
    /// * `kind` : which artifact
    /// * `path` : where it was written
    /// * `bytes`: its size
    fn on_artifact_written(&self, kind: ArtifactKind, path: &Path, bytes: usize) {
        let _ = (kind, path, bytes);
    }

    /// Called once after every artifact has been written.
    fn on_conversion_complete(&self, artifacts_written: usize) {
        let _ = artifacts_written;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

//! Asset load pipeline.
//!
//! Drives fetch + decode for an ordered list of candidate sources with a
//! bounded fallback policy: every failure moves on to the next unattempted
//! source after a fixed delay, each source is attempted exactly once, and
//! the terminal failure carries every source that was tried. Progress and
//! state transitions are observable through [`LoadEvent`]s; the viewer
//! drains them over an mpsc channel from a worker thread.

use crate::error::AssetError;
use crate::geometry::RawGeometry;
use crate::ply::decode_points;
use crate::source::AssetSource;
use std::fs::File;
use std::io::{BufReader, Read};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

/// Delay between a failed attempt and the next source.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

const FETCH_CHUNK: usize = 64 * 1024;

/// State of the one in-flight load session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Resolving,
    Fetching,
    Succeeded,
    FailedRetrying,
    FailedTerminal,
}

/// Fetch progress: a percentage when the total byte length is known,
/// bytes-so-far when it is not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    Percent(f32),
    Indeterminate { bytes: u64 },
}

/// Observable load-session transitions.
#[derive(Debug)]
pub enum LoadEvent {
    /// A fetch attempt began. `attempt` is 1-based.
    Started {
        source: AssetSource,
        attempt: usize,
        total: usize,
    },
    Progress(Progress),
    /// An attempt failed and the next source will be tried after the delay.
    Retrying {
        failed: AssetSource,
        error: String,
        next: AssetSource,
    },
    Succeeded(LoadedAsset),
    Failed(LoadReport),
}

/// Successfully decoded geometry plus the source it came from.
#[derive(Debug)]
pub struct LoadedAsset {
    pub geometry: RawGeometry,
    pub source: AssetSource,
}

/// Terminal failure diagnostics: the last error and every attempted source.
#[derive(Debug)]
pub struct LoadReport {
    pub error: AssetError,
    pub attempted: Vec<AssetSource>,
    pub retries: usize,
}

/// One load session at a time; a second `run` while a session is in
/// flight is rejected rather than raced.
#[derive(Debug)]
pub struct LoadPipeline {
    phase: LoadPhase,
    retry_delay: Duration,
}

impl LoadPipeline {
    pub fn new() -> Self {
        Self {
            phase: LoadPhase::Idle,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Override the inter-attempt delay (tests).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            LoadPhase::Resolving | LoadPhase::Fetching | LoadPhase::FailedRetrying
        )
    }

    /// Run a session against the filesystem fetcher.
    pub fn run(
        &mut self,
        sources: Vec<AssetSource>,
        emit: &mut dyn FnMut(LoadEvent),
    ) -> Result<LoadedAsset, LoadReport> {
        self.run_with(sources, fetch_file, emit)
    }

    /// Run a session with an injectable fetcher. The fetcher owns the
    /// fetch + decode boundary: bytes in motion report progress through
    /// the callback, and the result is decoded geometry or the error
    /// that ends the attempt.
    pub fn run_with<F>(
        &mut self,
        sources: Vec<AssetSource>,
        mut fetch: F,
        emit: &mut dyn FnMut(LoadEvent),
    ) -> Result<LoadedAsset, LoadReport>
    where
        F: FnMut(&AssetSource, &mut dyn FnMut(Progress)) -> Result<RawGeometry, AssetError>,
    {
        if self.is_busy() {
            return Err(LoadReport {
                error: AssetError::LoadInProgress,
                attempted: Vec::new(),
                retries: 0,
            });
        }

        self.phase = LoadPhase::Resolving;

        let mut attempted: Vec<AssetSource> = Vec::new();
        let mut retries = 0usize;
        let mut last_error: Option<AssetError> = None;

        for (index, source) in sources.iter().enumerate() {
            if index > 0 {
                self.phase = LoadPhase::FailedRetrying;
                emit(LoadEvent::Retrying {
                    failed: attempted[attempted.len() - 1].clone(),
                    error: last_error
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    next: source.clone(),
                });
                thread::sleep(self.retry_delay);
                retries += 1;
            }

            self.phase = LoadPhase::Fetching;
            emit(LoadEvent::Started {
                source: source.clone(),
                attempt: index + 1,
                total: sources.len(),
            });
            attempted.push(source.clone());

            // Percentages are clamped and monotone within one fetch.
            let mut last_pct = 0.0f32;
            let outcome = fetch(source, &mut |progress| {
                let progress = match progress {
                    Progress::Percent(pct) => {
                        last_pct = last_pct.max(pct.clamp(0.0, 100.0));
                        Progress::Percent(last_pct)
                    }
                    other => other,
                };
                emit(LoadEvent::Progress(progress));
            });

            // Zero-point geometry is a failure, never success.
            let outcome = outcome.and_then(|geometry| {
                if geometry.is_empty() {
                    Err(AssetError::EmptyAsset)
                } else {
                    Ok(geometry)
                }
            });

            match outcome {
                Ok(geometry) => {
                    self.phase = LoadPhase::Succeeded;
                    info!("loaded {} points from {}", geometry.len(), source);
                    return Ok(LoadedAsset {
                        geometry,
                        source: source.clone(),
                    });
                }
                Err(error) => {
                    warn!("attempt {} failed for {}: {}", index + 1, source, error);
                    last_error = Some(error);
                }
            }
        }

        self.phase = LoadPhase::FailedTerminal;
        Err(LoadReport {
            error: last_error
                .unwrap_or_else(|| AssetError::Decode("no sources resolved".to_string())),
            attempted,
            retries,
        })
    }
}

impl Default for LoadPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the source file in chunks, reporting progress, then decode.
pub fn fetch_file(
    source: &AssetSource,
    progress: &mut dyn FnMut(Progress),
) -> Result<RawGeometry, AssetError> {
    let file = File::open(&source.path)?;
    let total = file.metadata().ok().map(|m| m.len()).filter(|len| *len > 0);
    let mut reader = BufReader::new(file);

    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = [0u8; FETCH_CHUNK];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        match total {
            Some(total) => {
                progress(Progress::Percent(bytes.len() as f32 / total as f32 * 100.0));
            }
            None => {
                progress(Progress::Indeterminate {
                    bytes: bytes.len() as u64,
                });
            }
        }
    }

    decode_points(&bytes)
}

/// Run a load session on a worker thread, forwarding every event plus the
/// terminal outcome through the channel. The viewport drains the receiver
/// once per frame; dropping the receiver just ends the forwarding.
pub fn spawn_load(sources: Vec<AssetSource>, tx: Sender<LoadEvent>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut pipeline = LoadPipeline::new();
        let result = {
            let mut emit = |event| {
                let _ = tx.send(event);
            };
            pipeline.run(sources, &mut emit)
        };
        let terminal = match result {
            Ok(asset) => LoadEvent::Succeeded(asset),
            Err(report) => LoadEvent::Failed(report),
        };
        let _ = tx.send(terminal);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Provenance;
    use glam::Vec3;
    use std::io::Write;
    use std::time::Instant;

    fn source(name: &str) -> AssetSource {
        AssetSource::new(name, Provenance::Default)
    }

    fn some_geometry() -> RawGeometry {
        RawGeometry::from_positions(vec![Vec3::ZERO, Vec3::ONE])
    }

    #[test]
    fn first_source_success_skips_fallback() {
        let mut pipeline = LoadPipeline::new().with_retry_delay(Duration::ZERO);
        let mut fetches = 0;
        let mut events = Vec::new();

        let asset = pipeline
            .run_with(
                vec![source("a.ply"), source("b.ply")],
                |_, _| {
                    fetches += 1;
                    Ok(some_geometry())
                },
                &mut |e| events.push(e),
            )
            .unwrap();

        assert_eq!(fetches, 1);
        assert_eq!(asset.source.path, std::path::PathBuf::from("a.ply"));
        assert_eq!(pipeline.phase(), LoadPhase::Succeeded);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, LoadEvent::Retrying { .. }))
        );
    }

    #[test]
    fn two_failing_sources_two_attempts_one_delay() {
        let delay = Duration::from_millis(20);
        let mut pipeline = LoadPipeline::new().with_retry_delay(delay);
        let mut fetches = 0;

        let started = Instant::now();
        let report = pipeline
            .run_with(
                vec![source("a.ply"), source("b.ply")],
                |_, _| {
                    fetches += 1;
                    Err(AssetError::Decode("bad bytes".to_string()))
                },
                &mut |_| {},
            )
            .unwrap_err();

        assert_eq!(fetches, 2);
        assert_eq!(report.retries, 1);
        assert_eq!(report.attempted.len(), 2);
        assert!(started.elapsed() >= delay);
        assert!(matches!(report.error, AssetError::Decode(_)));
        assert_eq!(pipeline.phase(), LoadPhase::FailedTerminal);
    }

    #[test]
    fn fallback_source_recovers() {
        let mut pipeline = LoadPipeline::new().with_retry_delay(Duration::ZERO);
        let mut fetches = 0;

        let asset = pipeline
            .run_with(
                vec![source("a.ply"), source("b.ply")],
                |src, _| {
                    fetches += 1;
                    if src.path.ends_with("a.ply") {
                        Err(AssetError::Decode("truncated".to_string()))
                    } else {
                        Ok(some_geometry())
                    }
                },
                &mut |_| {},
            )
            .unwrap();

        assert_eq!(fetches, 2);
        assert_eq!(asset.source.path, std::path::PathBuf::from("b.ply"));
    }

    #[test]
    fn empty_geometry_is_a_failure_and_falls_back() {
        let mut pipeline = LoadPipeline::new().with_retry_delay(Duration::ZERO);

        let report = pipeline
            .run_with(
                vec![source("a.ply")],
                |_, _| Ok(RawGeometry::from_positions(vec![])),
                &mut |_| {},
            )
            .unwrap_err();
        assert!(matches!(report.error, AssetError::EmptyAsset));

        // With a second source present, the empty asset still falls back.
        let mut fetches = 0;
        let asset = pipeline
            .run_with(
                vec![source("a.ply"), source("b.ply")],
                |_, _| {
                    fetches += 1;
                    if fetches == 1 {
                        Ok(RawGeometry::from_positions(vec![]))
                    } else {
                        Ok(some_geometry())
                    }
                },
                &mut |_| {},
            )
            .unwrap();
        assert_eq!(fetches, 2);
        assert_eq!(asset.geometry.len(), 2);
    }

    #[test]
    fn progress_is_clamped_and_monotone() {
        let mut pipeline = LoadPipeline::new().with_retry_delay(Duration::ZERO);
        let mut seen = Vec::new();

        pipeline
            .run_with(
                vec![source("a.ply")],
                |_, progress| {
                    progress(Progress::Percent(10.0));
                    progress(Progress::Percent(150.0));
                    progress(Progress::Percent(40.0));
                    progress(Progress::Percent(-5.0));
                    Ok(some_geometry())
                },
                &mut |e| {
                    if let LoadEvent::Progress(Progress::Percent(pct)) = e {
                        seen.push(pct);
                    }
                },
            )
            .unwrap();

        assert_eq!(seen, vec![10.0, 100.0, 100.0, 100.0]);
    }

    #[test]
    fn indeterminate_progress_passes_through() {
        let mut pipeline = LoadPipeline::new().with_retry_delay(Duration::ZERO);
        let mut seen = Vec::new();

        pipeline
            .run_with(
                vec![source("a.ply")],
                |_, progress| {
                    progress(Progress::Indeterminate { bytes: 1024 });
                    Ok(some_geometry())
                },
                &mut |e| {
                    if let LoadEvent::Progress(p) = e {
                        seen.push(p);
                    }
                },
            )
            .unwrap();

        assert_eq!(seen, vec![Progress::Indeterminate { bytes: 1024 }]);
    }

    #[test]
    fn busy_pipeline_rejects_second_session() {
        let mut pipeline = LoadPipeline::new();
        pipeline.phase = LoadPhase::Fetching;

        let report = pipeline
            .run_with(
                vec![source("a.ply")],
                |_, _| Ok(some_geometry()),
                &mut |_| {},
            )
            .unwrap_err();
        assert!(matches!(report.error, AssetError::LoadInProgress));
        assert!(report.attempted.is_empty());
    }

    #[test]
    fn terminal_pipeline_accepts_new_session() {
        let mut pipeline = LoadPipeline::new().with_retry_delay(Duration::ZERO);
        let _ = pipeline
            .run_with(
                vec![source("a.ply")],
                |_, _| Err(AssetError::Decode("bad".to_string())),
                &mut |_| {},
            )
            .unwrap_err();

        let asset = pipeline
            .run_with(vec![source("b.ply")], |_, _| Ok(some_geometry()), &mut |_| {})
            .unwrap();
        assert_eq!(asset.source.path, std::path::PathBuf::from("b.ply"));
    }

    #[test]
    fn fetch_file_reports_percentages_and_decodes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nend_header\n0 0 0\n1 2 3\n"
        )
        .unwrap();

        let src = AssetSource::new(file.path(), Provenance::User);
        let mut seen = Vec::new();
        let geometry = fetch_file(&src, &mut |p| seen.push(p)).unwrap();

        assert_eq!(geometry.len(), 2);
        assert!(!seen.is_empty());
        assert!(matches!(seen.last(), Some(Progress::Percent(pct)) if (*pct - 100.0).abs() < 1e-3));
    }

    #[test]
    fn fetch_file_missing_path_is_io_error() {
        let src = AssetSource::new("/nonexistent/missing.ply", Provenance::Default);
        let err = fetch_file(&src, &mut |_| {}).unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    #[test]
    fn spawned_load_forwards_terminal_event() {
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = spawn_load(vec![source("/nonexistent/missing.ply")], tx);
        handle.join().unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, LoadEvent::Started { .. }))
        );
        assert!(matches!(events.last(), Some(LoadEvent::Failed(_))));
    }
}

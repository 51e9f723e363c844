use crate::buffer::PixelBuffer;
use crate::error::AppError;
use crate::reconstruction::progress::{ProgressReporter, RunState, RunStatus};
use crate::reconstruction::{
    CircleReconstructor, MosaicReconstructor, PaletteReconstructor, ReconstructionParameters,
    RunOutcome,
};
use crate::surface::DrawSurface;
use image::Rgb;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use uuid::Uuid;

/// Identifies one reconstruction run. The generation is what the controller
/// compares against; the id is for host bookkeeping and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunHandle {
    pub id: Uuid,
    pub generation: u64,
}

struct ActiveRun {
    handle: RunHandle,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<RunOutcome>,
}

enum PreparedRun {
    Mosaic(MosaicReconstructor),
    Circles(CircleReconstructor),
    Palette(PaletteReconstructor),
}

/// Owns reconstruction runs over one source image. At most one run is live;
/// starting a new one cancels the previous run first and advances the live
/// generation, so anything the old run still reports is dropped on identity,
/// even if it fires after the new run has begun.
pub struct ReconstructionController {
    buffer: PixelBuffer,
    palette: Vec<Rgb<u8>>,
    live_generation: Arc<AtomicU64>,
    next_generation: u64,
    status_tx: watch::Sender<RunStatus>,
    // keeps the watch channel open so sends are stored even when the host
    // holds no subscriber; watch::Sender::send drops the value otherwise
    _status_rx: watch::Receiver<RunStatus>,
    active: Option<ActiveRun>,
    last_request: Option<ReconstructionParameters>,
}

impl ReconstructionController {
    /// `palette` comes from the analysis of the same buffer and is only used
    /// by palette-quantization runs.
    pub fn new(buffer: PixelBuffer, palette: Vec<Rgb<u8>>) -> Self {
        let (status_tx, status_rx) = watch::channel(RunStatus::idle());
        Self {
            buffer,
            palette,
            live_generation: Arc::new(AtomicU64::new(0)),
            next_generation: 1,
            status_tx,
            _status_rx: status_rx,
            active: None,
            last_request: None,
        }
    }

    /// Observable run status: progress in [0, 1] plus animating/idle state.
    pub fn status(&self) -> watch::Receiver<RunStatus> {
        self.status_tx.subscribe()
    }

    pub fn current_status(&self) -> RunStatus {
        *self.status_tx.borrow()
    }

    pub fn is_animating(&self) -> bool {
        self.status_tx.borrow().is_animating()
    }

    /// Cancel any in-flight run, then start a fresh one for `params`. The
    /// surface is prepared here, before anything is spawned; a surface that
    /// cannot be acquired aborts the start with no progress reported.
    pub fn start<S: DrawSurface + Send + 'static>(
        &mut self,
        params: ReconstructionParameters,
        mut surface: S,
    ) -> Result<RunHandle, AppError> {
        let prepared = self.prepare_run(&params)?;

        // the live generation must advance before the old token fires;
        // a report in between would otherwise pass the identity check
        let generation = self.next_generation;
        self.next_generation += 1;
        self.live_generation.store(generation, Ordering::SeqCst);
        self.supersede();

        if let Err(e) = surface.prepare(self.buffer.width(), self.buffer.height()) {
            let _ = self.status_tx.send(RunStatus {
                generation,
                state: RunState::Idle,
                progress: 0.0,
            });
            return Err(e.into());
        }

        let handle = RunHandle {
            id: Uuid::new_v4(),
            generation,
        };
        let reporter = ProgressReporter::new(
            generation,
            self.live_generation.clone(),
            self.status_tx.clone(),
        );
        reporter.report(0.0);

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let buffer = self.buffer.clone();
        debug!(
            "Starting {:?} run {} (generation {})",
            params.style(),
            handle.id,
            generation
        );

        let task = tokio::spawn(async move {
            let outcome = match prepared {
                PreparedRun::Mosaic(r) => r.run(&buffer, &mut surface, &reporter, &token).await,
                PreparedRun::Circles(r) => r.run(&buffer, &mut surface, &reporter, &token).await,
                PreparedRun::Palette(r) => r.run(&buffer, &mut surface, &reporter, &token).await,
            };
            if outcome == RunOutcome::Completed {
                reporter.complete();
            }
            outcome
        });

        self.active = Some(ActiveRun {
            handle,
            cancel,
            task,
        });
        self.last_request = Some(params);
        Ok(handle)
    }

    /// Re-run the most recently requested style and parameters.
    pub fn replay<S: DrawSurface + Send + 'static>(
        &mut self,
        surface: S,
    ) -> Result<RunHandle, AppError> {
        let params = self.last_request.clone().ok_or_else(|| {
            AppError::Parameters("no previous reconstruction to replay".to_string())
        })?;
        self.start(params, surface)
    }

    /// Cancel the run identified by `handle`. Handles from superseded runs
    /// are ignored; only the current generation can be cancelled.
    pub fn cancel(&mut self, handle: &RunHandle) {
        let is_current = self
            .active
            .as_ref()
            .map_or(false, |run| run.handle.generation == handle.generation);
        if !is_current {
            debug!("Ignoring cancel for stale run {}", handle.id);
            return;
        }
        if let Some(run) = self.active.take() {
            debug!("Cancelling run {}", run.handle.id);
            // retire the generation before signalling the token; the
            // winding-down task must already fail the identity check
            self.live_generation
                .store(self.next_generation, Ordering::SeqCst);
            self.next_generation += 1;
            run.cancel.cancel();
            let progress = self.status_tx.borrow().progress;
            let _ = self.status_tx.send(RunStatus {
                generation: run.handle.generation,
                state: RunState::Cancelled,
                progress,
            });
        }
    }

    /// Wait for the active run to finish. Returns None when there is no
    /// active run or the task failed.
    pub async fn join(&mut self) -> Option<RunOutcome> {
        let run = self.active.take()?;
        match run.task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Reconstruction task failed: {}", e);
                None
            }
        }
    }

    fn prepare_run(&self, params: &ReconstructionParameters) -> Result<PreparedRun, AppError> {
        match *params {
            ReconstructionParameters::Mosaic { block_size } => {
                Ok(PreparedRun::Mosaic(MosaicReconstructor::new(block_size)?))
            }
            ReconstructionParameters::Circles {
                num_circles,
                min_radius,
                max_radius,
            } => Ok(PreparedRun::Circles(CircleReconstructor::new(
                num_circles,
                min_radius,
                max_radius,
            )?)),
            ReconstructionParameters::PaletteQuantization => Ok(PreparedRun::Palette(
                PaletteReconstructor::new(self.palette.clone()),
            )),
        }
    }

    /// Signal the old run and drop its handle. Callers advance the live
    /// generation first, so by the time the token fires every report the
    /// old run can still make already fails the identity check.
    fn supersede(&mut self) {
        if let Some(run) = self.active.take() {
            debug!("Superseding run {}", run.handle.id);
            run.cancel.cancel();
        }
    }
}

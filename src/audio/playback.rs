//! Audio playback via rodio.
//!
//! `rodio::OutputStream` is not `Send`, so the output device lives on a
//! dedicated thread that owns the stream for its whole lifetime. Play jobs
//! are sent to it over a channel and completion is reported back through a
//! oneshot. Shutting the player down (explicitly or on drop) stops the sink
//! and joins the thread, releasing the device.
//!
//! Every job carries the stop epoch it was queued under. `stop()` bumps the
//! epoch, so jobs still waiting in the channel are dropped instead of played.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::pcm::CHANNELS;

/// Something that can play mono f32 PCM to completion.
pub trait AudioOutput: Send + Sync {
    /// Play `samples` and resolve once playback has finished.
    fn play(
        &self,
        samples: Vec<f32>,
        sample_rate: u32,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Silence the device now and discard anything still waiting to play.
    fn stop(&self);
}

enum PlayerCommand {
    Play {
        samples: Vec<f32>,
        sample_rate: u32,
        epoch: u64,
        done: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Plays PCM through the default output device.
pub struct AudioPlayer {
    tx: mpsc::Sender<PlayerCommand>,
    sink: Arc<Sink>,
    flags: Arc<OutputFlags>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

/// Shared between the player handle and the output thread.
#[derive(Default)]
struct OutputFlags {
    epoch: AtomicU64,
    shutting_down: AtomicBool,
}

impl OutputFlags {
    /// Whether a job queued under `epoch` may still start.
    fn accepts(&self, epoch: u64) -> bool {
        !self.shutting_down.load(Ordering::Acquire) && self.epoch.load(Ordering::Acquire) == epoch
    }
}

impl AudioPlayer {
    /// Open the default audio output device at the given volume (0.0..=1.0).
    pub fn new(volume: f32) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel::<PlayerCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<anyhow::Result<Arc<Sink>>>();
        let flags = Arc::new(OutputFlags::default());
        let thread_flags = Arc::clone(&flags);

        let thread = std::thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || {
                let (stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let err = anyhow::anyhow!("Failed to open audio output: {}", e);
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => Arc::new(sink),
                    Err(e) => {
                        let err = anyhow::anyhow!("Failed to create audio sink: {}", e);
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                sink.set_volume(volume.clamp(0.0, 1.0));
                if ready_tx.send(Ok(Arc::clone(&sink))).is_err() {
                    return;
                }

                run_output_loop(&sink, &thread_flags, rx);

                sink.stop();
                drop(stream);
                debug!("audio output thread exiting");
            })?;

        let sink = ready_rx
            .recv()
            .map_err(|_| anyhow::anyhow!("Audio output thread exited during startup"))??;

        info!(volume, "Audio output ready");
        Ok(Self {
            tx,
            sink,
            flags,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Stop any playback and release the output device. Idempotent.
    pub fn shutdown(&self) {
        let handle = match self.thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };
        self.flags.shutting_down.store(true, Ordering::Release);
        self.sink.stop();
        let _ = self.tx.send(PlayerCommand::Shutdown);
        if handle.join().is_err() {
            warn!("audio output thread panicked");
        }
        info!("Audio output released");
    }
}

impl AudioOutput for AudioPlayer {
    fn play(
        &self,
        samples: Vec<f32>,
        sample_rate: u32,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            if samples.is_empty() {
                return Ok(());
            }
            let (done_tx, done_rx) = oneshot::channel();
            self.tx
                .send(PlayerCommand::Play {
                    samples,
                    sample_rate,
                    epoch: self.flags.epoch.load(Ordering::Acquire),
                    done: done_tx,
                })
                .map_err(|_| anyhow::anyhow!("Audio output is shut down"))?;
            done_rx
                .await
                .map_err(|_| anyhow::anyhow!("Audio output stopped before playback finished"))
        })
    }

    fn stop(&self) {
        self.flags.epoch.fetch_add(1, Ordering::AcqRel);
        self.sink.stop();
        debug!("Audio output stopped");
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_output_loop(sink: &Sink, flags: &OutputFlags, rx: mpsc::Receiver<PlayerCommand>) {
    while let Ok(cmd) = rx.recv() {
        match cmd {
            PlayerCommand::Play {
                samples,
                sample_rate,
                epoch,
                done,
            } => {
                // Dropping `done` fails the waiting play future.
                if !flags.accepts(epoch) {
                    debug!(epoch, "Discarding stale play job");
                    continue;
                }
                debug!(samples = samples.len(), sample_rate, "Playing buffer");
                sink.append(SamplesBuffer::new(CHANNELS, sample_rate, samples));
                sink.sleep_until_end();
                let _ = done.send(());
            }
            PlayerCommand::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_discards_jobs_from_earlier_epochs() {
        let flags = OutputFlags::default();
        assert!(flags.accepts(0));
        flags.epoch.fetch_add(1, Ordering::AcqRel);
        assert!(!flags.accepts(0));
        assert!(flags.accepts(1));
    }

    #[test]
    fn test_shutdown_refuses_every_job() {
        let flags = OutputFlags::default();
        flags.shutting_down.store(true, Ordering::Release);
        assert!(!flags.accepts(0));
    }
}

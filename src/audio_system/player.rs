/// Audio output
///
/// Plays one clip at a time and reports the real end of each clip through a
/// completion callback.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rodio::buffer::SamplesBuffer;
use rodio::source::EmptyCallback;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::error::AudioError;

use super::cache::DecodedAudio;

/// Invoked once the clip has been fully played.
///
/// Not invoked for clips cut off by `stop` or by a newer clip.
pub type CompletionCallback = Box<dyn Fn() + Send + 'static>;

/// A rendered cue ready for the output
#[derive(Debug, Clone)]
pub struct Clip {
    pub trigger: String,
    pub audio: DecodedAudio,
    pub gain: f32,
}

pub trait AudioOutput: Send + Sync {
    /// Start `clip`, replacing anything still audible
    fn play(&self, clip: Clip, on_end: CompletionCallback) -> Result<(), AudioError>;

    /// Best-effort stop of the audible clip
    fn stop(&self);
}

enum OutputCommand {
    Play {
        clip: Clip,
        on_end: CompletionCallback,
    },
    Stop,
    Shutdown,
}

/// Device output through rodio.
///
/// The output stream is not `Send`, so it lives on a dedicated thread that
/// receives commands over a channel.
pub struct RodioOutput {
    commands: Sender<OutputCommand>,
    worker: Option<JoinHandle<()>>,
}

impl RodioOutput {
    /// Open the default output device
    pub fn new() -> Result<Self, AudioError> {
        let (command_tx, command_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded::<Result<(), AudioError>>(1);

        let worker = thread::Builder::new()
            .name("gemplay-audio".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(AudioError::StreamInitFailed(Box::new(e))));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                tracing::debug!("Audio output thread started");
                run_output_loop(&handle, command_rx);
                tracing::debug!("Audio output thread stopped");
            })
            .map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                commands: command_tx,
                worker: Some(worker),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AudioError::OutputClosed),
        }
    }
}

fn run_output_loop(handle: &OutputStreamHandle, commands: Receiver<OutputCommand>) {
    let mut sink: Option<Sink> = None;

    while let Ok(command) = commands.recv() {
        match command {
            OutputCommand::Play { clip, on_end } => {
                if let Some(previous) = sink.take() {
                    previous.stop();
                }

                let next = match Sink::try_new(handle) {
                    Ok(next) => next,
                    Err(e) => {
                        tracing::warn!("Failed to open sink for '{}': {}", clip.trigger, e);
                        on_end();
                        continue;
                    }
                };

                let audio = &clip.audio;
                next.set_volume(clip.gain);
                next.append(SamplesBuffer::new(
                    audio.channels(),
                    audio.sample_rate(),
                    audio.samples().to_vec(),
                ));
                // Runs when the sink reaches it, i.e. after the last sample
                next.append(EmptyCallback::<f32>::new(on_end));
                next.play();

                sink = Some(next);
            }
            OutputCommand::Stop => {
                if let Some(current) = sink.take() {
                    current.stop();
                }
            }
            OutputCommand::Shutdown => break,
        }
    }
}

impl AudioOutput for RodioOutput {
    fn play(&self, clip: Clip, on_end: CompletionCallback) -> Result<(), AudioError> {
        self.commands
            .send(OutputCommand::Play { clip, on_end })
            .map_err(|_| AudioError::OutputClosed)
    }

    fn stop(&self) {
        let _ = self.commands.send(OutputCommand::Stop);
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        let _ = self.commands.send(OutputCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Output that discards audio and completes immediately
#[derive(Debug, Default)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn play(&self, clip: Clip, on_end: CompletionCallback) -> Result<(), AudioError> {
        tracing::trace!("Discarding '{}' ({:?})", clip.trigger, clip.audio.duration());
        on_end();
        Ok(())
    }

    fn stop(&self) {}
}

//! Alert tone playback
//!
//! Synthesized tones played through a rodio sink on a dedicated audio thread;
//! the output stream is not `Send`, so it lives and dies with that thread.
//! The thread keeps at most one sink: starting a new tone first stops the one
//! currently playing. When no output device is available, commands are
//! drained and alerts stay visual-only.

use std::f32::consts::PI;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use rodio::{buffer::SamplesBuffer, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

const SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy)]
enum SoundCommand {
    Checkpoint,
    Completion,
    Stop,
}

/// Handle to the audio thread, cheap to clone.
#[derive(Debug, Clone)]
pub struct SoundPlayer {
    tx: Option<Sender<SoundCommand>>,
}

impl SoundPlayer {
    /// Spawn the audio thread. With `enabled == false` the player is silent
    /// and no thread is started.
    pub fn spawn(enabled: bool) -> Self {
        if !enabled {
            return Self::disabled();
        }
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || audio_thread(rx));
        Self { tx: Some(tx) }
    }

    /// A player that swallows every command (muted runs and tests).
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Loop the checkpoint tone, replacing any current sound.
    pub fn play_checkpoint(&self) {
        self.send(SoundCommand::Checkpoint);
    }

    /// Loop the completion tone, replacing any current sound.
    pub fn play_completion(&self) {
        self.send(SoundCommand::Completion);
    }

    /// Stop whatever is playing.
    pub fn stop(&self) {
        self.send(SoundCommand::Stop);
    }

    fn send(&self, command: SoundCommand) {
        if let Some(tx) = &self.tx {
            if tx.send(command).is_err() {
                warn!("Audio thread is gone; dropping sound command");
            }
        }
    }
}

fn audio_thread(rx: Receiver<SoundCommand>) {
    // The stream must outlive every sink created from its handle.
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Audio output unavailable, alerts will be silent: {}", e);
            while rx.recv().is_ok() {}
            return;
        }
    };

    let mut current: Option<Sink> = None;
    while let Ok(command) = rx.recv() {
        // One alert sound system-wide: silence the previous sink first.
        if let Some(sink) = current.take() {
            sink.stop();
        }
        let samples = match command {
            SoundCommand::Checkpoint => checkpoint_tone(),
            SoundCommand::Completion => completion_tone(),
            SoundCommand::Stop => continue,
        };
        current = start_loop(&handle, samples);
    }
    if let Some(sink) = current.take() {
        sink.stop();
    }
    debug!("Audio thread exiting");
}

fn start_loop(handle: &OutputStreamHandle, samples: Vec<f32>) -> Option<Sink> {
    match Sink::try_new(handle) {
        Ok(sink) => {
            let source = SamplesBuffer::new(1, SAMPLE_RATE, samples).repeat_infinite();
            sink.append(source);
            Some(sink)
        }
        Err(e) => {
            warn!("Failed to open audio sink: {}", e);
            None
        }
    }
}

/// Write a sine burst with a short attack/release envelope into `samples`.
fn write_beep(samples: &mut [f32], offset_secs: f32, length_secs: f32, freq: f32, gain: f32) {
    let start = (offset_secs * SAMPLE_RATE as f32) as usize;
    let count = (length_secs * SAMPLE_RATE as f32) as usize;
    let ramp = 0.01 * SAMPLE_RATE as f32;
    for i in 0..count {
        let Some(slot) = samples.get_mut(start + i) else { break };
        let t = i as f32 / SAMPLE_RATE as f32;
        let envelope = (i as f32 / ramp)
            .min((count - i) as f32 / ramp)
            .clamp(0.0, 1.0);
        *slot += (t * freq * 2.0 * PI).sin() * gain * envelope;
    }
}

/// Two short high beeps inside a one-second window.
fn checkpoint_tone() -> Vec<f32> {
    let mut samples = vec![0.0; SAMPLE_RATE as usize];
    write_beep(&mut samples, 0.0, 0.15, 880.0, 0.3);
    write_beep(&mut samples, 0.25, 0.15, 880.0, 0.3);
    samples
}

/// A rising three-note figure inside a 1.5 second window.
fn completion_tone() -> Vec<f32> {
    let mut samples = vec![0.0; (SAMPLE_RATE as f32 * 1.5) as usize];
    for (index, freq) in [523.25f32, 659.25, 783.99].iter().enumerate() {
        write_beep(&mut samples, index as f32 * 0.3, 0.25, *freq, 0.25);
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_player_swallows_commands() {
        let player = SoundPlayer::disabled();
        player.play_checkpoint();
        player.play_completion();
        player.stop();
    }

    #[test]
    fn tones_fit_their_windows_and_stay_in_range() {
        for samples in [checkpoint_tone(), completion_tone()] {
            assert!(!samples.is_empty());
            assert!(samples.iter().all(|s| s.abs() <= 1.0));
        }
        assert_eq!(checkpoint_tone().len(), SAMPLE_RATE as usize);
    }

    #[test]
    fn beeps_are_silent_outside_their_burst() {
        let samples = checkpoint_tone();
        // Gap between the two beeps.
        let gap = (0.2 * SAMPLE_RATE as f32) as usize;
        assert_eq!(samples[gap], 0.0);
    }
}

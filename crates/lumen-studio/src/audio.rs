use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use lumen_engine::AudioSink;

/// Smoothed RMS of the PCM stream, readable from the render thread.
#[derive(Debug, Default)]
pub struct PcmLevel {
    // f32 bits
    level: AtomicU32,
}

impl PcmLevel {
    /// Level in `0.0..=1.0`.
    pub fn level(&self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Relaxed))
    }
}

impl AudioSink for PcmLevel {
    fn add_pcm(&self, samples: &[i16]) {
        if samples.is_empty() {
            return;
        }
        let sum: f32 = samples
            .iter()
            .map(|&s| {
                let v = f32::from(s) / f32::from(i16::MAX);
                v * v
            })
            .sum();
        let rms = (sum / samples.len() as f32).sqrt().min(1.0);
        let smoothed = self.level() * 0.8 + rms * 0.2;
        self.level.store(smoothed.to_bits(), Ordering::Relaxed);
    }
}

/// Synthetic capture thread: a pulsing tone in 1/60 s chunks.
///
/// Chunks go to a bounded queue the host drains each frame; when the render
/// thread falls behind, new chunks are dropped rather than blocking capture.
pub struct ToneFeed {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ToneFeed {
    const SAMPLE_RATE: u32 = 44_100;
    const CHUNK: usize = (Self::SAMPLE_RATE / 60) as usize;

    const QUEUE: usize = 8;

    pub fn spawn() -> (Self, Receiver<Vec<i16>>) {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let (tx, rx) = mpsc::sync_channel(Self::QUEUE);

        let handle = thread::Builder::new()
            .name("lumen-tone".to_string())
            .spawn(move || capture(&flag, &tx));

        let handle = match handle {
            Ok(h) => Some(h),
            Err(err) => {
                log::warn!("audio feed unavailable: {err}");
                None
            }
        };
        (Self { running, handle }, rx)
    }
}

fn capture(running: &AtomicBool, tx: &SyncSender<Vec<i16>>) {
    let mut n: u64 = 0;
    while running.load(Ordering::Relaxed) {
        let chunk: Vec<i16> = (0..ToneFeed::CHUNK)
            .map(|_| {
                let t = n as f32 / ToneFeed::SAMPLE_RATE as f32;
                n = n.wrapping_add(1);
                let envelope = 0.5 + 0.5 * (TAU * 0.5 * t).sin();
                (envelope * (TAU * 220.0 * t).sin() * f32::from(i16::MAX) * 0.8) as i16
            })
            .collect();
        match tx.try_send(chunk) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => return,
        }
        thread::sleep(Duration::from_millis(16));
    }
}

impl Drop for ToneFeed {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_keeps_level_at_zero() {
        let level = PcmLevel::default();
        level.add_pcm(&[0; 256]);
        assert_eq!(level.level(), 0.0);
    }

    #[test]
    fn loud_input_raises_level_gradually() {
        let level = PcmLevel::default();
        level.add_pcm(&[i16::MAX; 256]);
        let first = level.level();
        assert!(first > 0.0 && first < 1.0);

        for _ in 0..100 {
            level.add_pcm(&[i16::MAX; 256]);
        }
        assert!(level.level() > first);
        assert!(level.level() <= 1.0);
    }

    #[test]
    fn feed_delivers_full_chunks_until_dropped() {
        let (feed, pcm) = ToneFeed::spawn();
        let chunk = pcm.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(chunk.len(), ToneFeed::CHUNK);
        assert!(chunk.iter().any(|&s| s != 0));

        drop(feed);
        // thread has exited; the queue drains and then disconnects
        while pcm.try_recv().is_ok() {}
        assert!(pcm.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn empty_chunk_is_ignored() {
        let level = PcmLevel::default();
        level.add_pcm(&[]);
        assert_eq!(level.level(), 0.0);
    }
}

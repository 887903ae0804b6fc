//! Tile boundary detector
//!
//! Turns noisy point samples from the reflectance sensor into a debounced
//! "still on light floor" signal. A background sampler keeps a short rolling
//! window; the control thread compares the window average with a threshold.
//!
//! # Session lifecycle
//!
//! ```text
//! start_reading(n, prime, interval, warmup)
//!   ├─ stop_reading()            join any previous sampler
//!   ├─ buffer = [prime; n]       new session number
//!   └─ spawn sampler             sleeps warmup, then samples every interval
//!
//! stop_reading()                 signal + join, no-op when idle
//! ```
//!
//! Priming the buffer with a known extreme lets the caller assert where the
//! robot is when a segment starts: a light prime keeps a fresh advance from
//! triggering on the marker it is leaving, a dark prime makes a correction
//! start "on the line".

use super::sampler::{self, SamplerShared};
use crate::error::{Error, Result};
use crate::hardware::LightSensor;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Rolling-average light threshold detector
pub struct TileBoundarySensor {
    /// Light sensor, shared with the sampler thread
    light: Arc<Mutex<Box<dyn LightSensor>>>,
    /// Buffer, sample notification and fault slot
    shared: Arc<SamplerShared>,
    /// Average above this is light floor, at or below is a boundary
    threshold: f32,
    /// Stop signal for the running sampler
    stop_tx: Option<Sender<()>>,
    /// Running sampler, joined on stop
    handle: Option<JoinHandle<()>>,
}

impl TileBoundarySensor {
    /// Create an idle detector. The buffer holds a single 0.0 until the first
    /// [`start_reading`](Self::start_reading).
    pub fn new(light: Box<dyn LightSensor>, threshold: f32) -> Self {
        Self {
            light: Arc::new(Mutex::new(light)),
            shared: Arc::new(SamplerShared::new()),
            threshold,
            stop_tx: None,
            handle: None,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Start a sampling session.
    ///
    /// Any running sampler is stopped and joined first. The buffer is then
    /// refilled with `count` copies of `init_value` and a new sampler thread
    /// waits `warmup` before taking one sample every `interval`. Returns as
    /// soon as the thread is spawned.
    pub fn start_reading(
        &mut self,
        count: usize,
        init_value: f32,
        interval: Duration,
        warmup: Duration,
    ) -> Result<()> {
        if count == 0 {
            return Err(Error::InvalidParameter(
                "sample buffer needs at least one entry".to_string(),
            ));
        }

        self.stop_reading();

        let session = self.shared.buffer.lock().reset(count, init_value);
        *self.shared.fault.lock() = None;

        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let light = Arc::clone(&self.light);
        let shared = Arc::clone(&self.shared);

        let handle = thread::Builder::new()
            .name("boundary-sampler".to_string())
            .spawn(move || {
                sampler::sampler_loop(light, shared, stop_rx, session, interval, warmup);
            })
            .map_err(|e| Error::ThreadSpawn(format!("boundary sampler: {}", e)))?;

        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);

        log::trace!(
            "Sampling session {} started: {} x {:.1}, interval {:?}, warmup {:?}",
            session,
            count,
            init_value,
            interval,
            warmup
        );
        Ok(())
    }

    /// Stop the sampler and block until its thread has exited.
    ///
    /// Safe to call when nothing is running.
    pub fn stop_reading(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        if let Some(stop_tx) = self.stop_tx.take() {
            // A full channel or a sampler that already exited both mean the
            // request is effectively delivered.
            let _ = stop_tx.try_send(());
        }

        if handle.join().is_err() {
            log::error!("Boundary sampler panicked");
        }
    }

    pub fn is_sampling(&self) -> bool {
        self.handle.is_some()
    }

    /// Read the sensor once and store the value in the current session
    pub fn take_reading(&self) -> Result<f32> {
        let session = self.shared.buffer.lock().session();
        sampler::take_sample(&self.light, &self.shared, session)
    }

    /// Mean of the current buffer contents
    pub fn get_average(&self) -> f32 {
        self.shared.buffer.lock().average()
    }

    /// True when the average is above the threshold (light floor)
    pub fn above_threshold(&self) -> bool {
        self.get_average() > self.threshold
    }

    /// Block until the sampler stores a new sample, a fault is raised or
    /// `timeout` elapses. Returns false on timeout.
    pub fn wait_for_sample(&self, timeout: Duration) -> bool {
        let mut buffer = self.shared.buffer.lock();
        !self.shared.sampled.wait_for(&mut buffer, timeout).timed_out()
    }

    /// Error raised by the sampler thread, if any
    pub fn check_fault(&self) -> Result<()> {
        match self.shared.fault.lock().as_ref() {
            Some(message) => Err(Error::Hardware(format!("light sensor: {}", message))),
            None => Ok(()),
        }
    }

    /// Current session number
    pub fn session(&self) -> u64 {
        self.shared.buffer.lock().session()
    }

    /// Samples stored since the current session started
    pub fn samples_in_session(&self) -> u64 {
        self.shared.buffer.lock().written()
    }
}

impl Drop for TileBoundarySensor {
    fn drop(&mut self) {
        self.stop_reading();
    }
}

//! Sampler thread for the tile boundary sensor
//!
//! Reads the light sensor at a fixed interval and writes into the shared ring
//! buffer. The stop signal is a channel: the loop sleeps in `recv_timeout`,
//! so a stop request (message or dropped sender) wakes it immediately instead
//! of waiting out the interval.

use super::buffer::SampleBuffer;
use crate::error::Result;
use crate::hardware::LightSensor;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

/// State shared between the control thread and the sampler
pub(super) struct SamplerShared {
    /// Sample ring, locked for every write and every average
    pub buffer: Mutex<SampleBuffer>,
    /// Notified after each stored sample and on fault
    pub sampled: Condvar,
    /// Light sensor error raised inside the sampler
    pub fault: Mutex<Option<String>>,
}

impl SamplerShared {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(SampleBuffer::new(1, 0.0)),
            sampled: Condvar::new(),
            fault: Mutex::new(None),
        }
    }
}

/// Sampler loop - waits `warmup`, then samples every `interval` until stopped
pub(super) fn sampler_loop(
    light: Arc<Mutex<Box<dyn LightSensor>>>,
    shared: Arc<SamplerShared>,
    stop: Receiver<()>,
    session: u64,
    interval: Duration,
    warmup: Duration,
) {
    log::trace!("Sampler session {} warming up for {:?}", session, warmup);

    if stop_requested(&stop, warmup) {
        log::trace!("Sampler session {} stopped during warmup", session);
        return;
    }

    while !stop_requested(&stop, interval) {
        if let Err(e) = take_sample(&light, &shared, session) {
            log::error!("Light sensor read failed: {}", e);
            *shared.fault.lock() = Some(e.to_string());
            shared.sampled.notify_all();
            break;
        }
    }

    log::trace!("Sampler session {} exiting", session);
}

/// Wait up to `wait` for a stop request
fn stop_requested(stop: &Receiver<()>, wait: Duration) -> bool {
    match stop.recv_timeout(wait) {
        Err(RecvTimeoutError::Timeout) => false,
        Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
    }
}

/// Read the sensor once and store the value under the buffer lock.
///
/// The sensor itself is read outside the buffer lock.
pub(super) fn take_sample(
    light: &Mutex<Box<dyn LightSensor>>,
    shared: &SamplerShared,
    session: u64,
) -> Result<f32> {
    let value = light.lock().reflected_light()?;

    let stored = shared.buffer.lock().push(session, value);
    if stored {
        shared.sampled.notify_all();
    } else {
        log::trace!("Dropped sample {:.1} from stale session {}", value, session);
    }

    Ok(value)
}

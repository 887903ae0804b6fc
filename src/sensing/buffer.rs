//! Rolling sample buffer
//!
//! Fixed-length ring of the most recent reflectance samples. Each sampling
//! session gets a new generation number; writes tagged with an older
//! generation are dropped, so a superseded sampler can never leak samples into
//! a fresh session.

/// Ring buffer of the last N samples
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    values: Vec<f32>,
    index: usize,
    session: u64,
    written: u64,
}

impl SampleBuffer {
    /// Buffer of `count` copies of `value` (at least one entry)
    pub fn new(count: usize, value: f32) -> Self {
        Self {
            values: vec![value; count.max(1)],
            index: 0,
            session: 0,
            written: 0,
        }
    }

    /// Refill with `count` copies of `value` and open a new session.
    ///
    /// Returns the new session number.
    pub fn reset(&mut self, count: usize, value: f32) -> u64 {
        self.values.clear();
        self.values.resize(count.max(1), value);
        self.index = 0;
        self.written = 0;
        self.session += 1;
        self.session
    }

    /// Store `value` at the write index if `session` is still current.
    pub fn push(&mut self, session: u64, value: f32) -> bool {
        if session != self.session {
            return false;
        }
        self.values[self.index] = value;
        self.index = (self.index + 1) % self.values.len();
        self.written += 1;
        true
    }

    /// Mean of all entries
    pub fn average(&self) -> f32 {
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Current session number
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Samples stored since the current session started
    pub fn written(&self) -> u64 {
        self.written
    }
}

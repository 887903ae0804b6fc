//! Reflectance sampling and tile boundary detection

mod boundary;
mod buffer;
mod sampler;

pub use boundary::TileBoundarySensor;
pub use buffer::SampleBuffer;

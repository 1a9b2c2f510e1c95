mod gesture;
mod probe;
mod sequencer;
mod slider;
mod timer;

pub use gesture::*;
pub use probe::*;
pub use sequencer::*;
pub use slider::*;
pub use timer::*;

use crate::node::SampleTime;

/// Whole samples in `seconds` at `sample_rate`, never less than one.
#[inline]
pub(crate) fn seconds_to_samples(seconds: f32, sample_rate: u32) -> SampleTime {
    let samples = (seconds as f64 * sample_rate as f64).round();
    if samples.is_finite() && samples >= 1.0 {
        samples as SampleTime
    } else {
        1
    }
}

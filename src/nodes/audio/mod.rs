mod composite;
mod constant;
mod gain;
mod output;
mod sine;
mod square;
mod waveform;

pub use composite::*;
pub use constant::*;
pub use gain::*;
pub use output::*;
pub use sine::*;
pub use square::*;
pub use waveform::*;

/// Wrap a phase into `[0, 1)`.
#[inline]
pub(crate) fn wrap_unit(phase: f32) -> f32 {
    let wrapped = phase - phase.floor();
    // `floor` leaves 1.0 for inputs a hair below an integer
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

//! Frame timing for the render loop.
//!
//! - one `FrameClock` per render loop; `tick()` once per drawn frame
//! - `FpsCounter` turns presented frames into periodic `FrameStats`

mod fps;
mod frame_clock;

pub use fps::{FpsCounter, FrameStats};
pub use frame_clock::{FrameClock, FrameTime};

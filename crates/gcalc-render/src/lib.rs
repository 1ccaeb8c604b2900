//! GPU-side packaging and the render loop.
//!
//! - [`program`]: the Program Encoder ([`encode`]) and its input snapshot.
//! - [`texture`]: RG32F texture packing of the instruction stream.
//! - [`feed`]: the dirty-flag channel between edits and the render loop.
//! - [`scheduler`]: the fixed-rate Render Scheduler.
//! - [`viewport`]: the viewport transform.

pub mod error;
pub mod feed;
pub mod program;
pub mod scheduler;
pub mod texture;
pub mod viewport;

pub use error::EncodeError;
pub use feed::{FeedValue, ProgramFeed};
pub use program::{encode, slot_rgba, ProgramEntry, ProgramSnapshot, RenderProgram, Slot};
pub use scheduler::{Frame, FrameSink, RenderScheduler, RenderStats, SchedulerConfig, Tick};
pub use texture::{pack, EncoderConfig, ProgramTexture};
pub use viewport::Viewport;

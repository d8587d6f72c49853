pub mod error;
pub mod ids;
pub mod time;

pub use error::{ErrorCode, WaveError, WaveResult};
pub use ids::EventId;
pub use time::{now_epoch_millis, Clock, EpochMillis, ManualClock, SystemClock};

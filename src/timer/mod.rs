mod auto_advance;

pub use auto_advance::{AutoAdvanceTimer, TimerEvent, TimerState};

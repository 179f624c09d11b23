//! Flow-control state shared by every invocation: the time source, the two ledgers and the
//! serialized gate that guards them.
pub mod clock;
pub mod cool_down;
pub mod flow;
pub mod interfering;

pub use clock::{Clock, ManualClock, SystemClock};
pub use flow::{Blocked, FlowControl, GateRequest, InterferenceSlot};

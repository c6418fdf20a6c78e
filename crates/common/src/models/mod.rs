pub mod approval;
pub mod client;
pub mod close;
pub mod device;
pub mod execution;
pub mod signal;

pub use approval::{Approval, Decision};
pub use client::Client;
pub use close::{CloseReason, CloseRequest, CloseState};
pub use device::{Device, DeviceIdentity};
pub use execution::{Execution, ExecutionStatus};
pub use signal::{Side, Signal};

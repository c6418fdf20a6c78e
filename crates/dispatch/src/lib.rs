pub mod errors;
pub mod services;
pub mod wire;

pub use errors::DispatchError;
pub use services::ack_service::AckService;
pub use services::close_service::CloseService;
pub use services::poll_service::PollService;

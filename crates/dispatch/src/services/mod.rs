pub mod ack_service;
pub mod close_service;
pub mod poll_service;

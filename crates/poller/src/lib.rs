pub mod poller;
pub mod shutdown;

pub mod bootstrap;
pub mod poller;

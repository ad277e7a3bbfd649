pub mod http;
pub mod poller;

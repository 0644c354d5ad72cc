pub mod config;
pub mod responder;

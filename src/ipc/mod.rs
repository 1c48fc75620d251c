//! IPC module for triggering and inspecting the board from other programs

mod protocol;
mod server;

pub use protocol::{BoardStatus, Request, Response};
pub use server::Server;

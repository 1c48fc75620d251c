//! Button input
//!
//! Reads press/release lines from the button controller on a dedicated
//! thread and turns them into dispatcher commands.

mod buttons;
mod listener;

pub use listener::{InputError, InputListener};

//! Telegram glue: the [`Transport`](crate::transport::Transport) adapter and
//! the long-poll runner.

mod adapter;
mod runner;

pub use adapter::TelegramTransport;
pub use runner::run_repl;

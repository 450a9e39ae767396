pub mod app;
pub mod check;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod listing;
pub mod provision;
pub mod run;
pub mod runtime;

pub use app::run;
pub use env::CliArgs;

pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod io;
pub mod matching;
pub mod oracle;
pub mod paths;
pub mod planner;
pub mod reconcile;
pub mod sink;
pub mod source;
pub mod types;
pub mod validator;

pub use error::{PairingError, Result};

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod installer;
pub mod manifest;
pub mod release;
pub mod ui;
pub mod warning;

pub use error::{ReleaseError, Result};

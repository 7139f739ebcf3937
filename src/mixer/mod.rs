//! Random clip mixing pipeline: scan source folders, draw one clip per folder, shuffle,
//! and stream-copy the result into a single file with FFmpeg's concat demuxer.
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::thread;

#[cfg(feature = "desktop")]
mod commands;
mod config;
mod error;
mod job;
mod manifest;
mod output;
mod pipeline;
mod progress;
mod runtime;
mod scanner;
mod selection;

#[cfg(feature = "desktop")]
pub use commands::*;
pub use config::*;
pub use error::*;
pub use job::*;
pub use manifest::*;
pub use output::*;
pub use pipeline::*;
pub use progress::*;
pub use runtime::*;
pub use scanner::*;
pub use selection::*;

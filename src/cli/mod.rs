// src/cli/mod.rs
//
// Command-line interface module

mod args;
mod output;
mod wav;

pub use args::Args;
pub use output::{format_json, format_report};
pub use wav::{collect_wav_files, load_wav};

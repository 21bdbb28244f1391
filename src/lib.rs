// Core library for the serialblocks CSV identifier grouping tool

pub mod cli;
pub mod colors;
pub mod config;
pub mod config_file;
pub mod decompression;
pub mod detection;
pub mod driver;
pub mod error_handling;
pub mod extract;
pub mod formatters;
pub mod grouping;
pub mod input;
pub mod interactive;
pub mod model;
pub mod orchestrator;
pub mod parsers;
pub mod platform;
pub mod readers;
pub mod state;
pub mod stats;
pub mod tty;

pub use config::SerialConfig;
pub use driver::{CancelToken, DriverSettings, ParseDriver};
pub use error_handling::PipelineError;
pub use extract::extract_number;
pub use grouping::{group_into_serial_blocks, group_numbers};
pub use model::{ParsedFileResult, Row, SerialBlock};
pub use orchestrator::{PipelineOrchestrator, PipelineOutput, Presenter, Settled};
pub use state::{transition, PipelineEvent, PipelineState, PipelineStatus};

//! Library side of the `eupp` command line: logging, settings and the
//! per-file ingestion pipeline.

pub mod logging;
pub mod pipeline;
pub mod settings;
pub mod types;

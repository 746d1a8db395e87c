//! Upload ingestion pipeline.

mod limit;
mod pipeline;

#[cfg(test)]
mod pipeline_tests;

pub use limit::{LimitExceeded, limit_stream};
pub use pipeline::{
    IncomingFile, MAX_ITEM_NAME_LENGTH, UploadOutcome, UploadPipeline, UploadSession,
    truncate_name,
};

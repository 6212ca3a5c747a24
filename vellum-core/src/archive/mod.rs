//! Submission side of the pipeline: the pending batch, the deposit
//! document built from it, and the client that delivers it.

pub mod batch;
pub mod payload;
pub mod submitter;

pub use batch::SubmissionBatch;
pub use payload::{ArchivePayload, build_payload};
pub use submitter::{ArchiveSink, HttpArchiveClient};

//! Sample assignment and label submission

pub mod sample_provider;
pub mod submission;

pub use sample_provider::{encode_data_uri, Sample, SampleProvider};
pub use submission::{LabelSubmission, SubmissionHandler, SubmissionOutcome};

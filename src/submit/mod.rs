pub mod pipeline;
pub mod request;

pub use pipeline::{BatchJob, DispatchOutcome, SubmissionPipeline};
pub use request::{apply_common_args, seed_add_request, CommonArgs, FileSelection};

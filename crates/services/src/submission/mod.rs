mod assembler;
mod sink;

pub use assembler::{
    Completeness, NO_COMMENTS, NO_FLAG_REASONS, NO_OPTION_SELECTED, ResponseEntry, SelectionInfo,
    SessionInfo, SubmissionPayload, assemble_submission, validate_completeness,
};
pub use sink::{HttpSubmissionSink, SubmissionSink};

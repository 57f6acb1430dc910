mod tables;

pub use self::tables::{
    candidates as print_candidate_report, kernels as print_kernel_report,
    marks as print_mark_report, summary as print_run_summary, CandidateRow,
};

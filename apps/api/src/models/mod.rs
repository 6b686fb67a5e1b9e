pub mod analysis;
pub mod cv;
pub mod job_posting;

pub mod frames;
pub mod samples;

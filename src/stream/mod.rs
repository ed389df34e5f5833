pub mod format;
pub mod params;
pub mod writer;

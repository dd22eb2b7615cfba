pub mod classify;
pub mod report_stream;

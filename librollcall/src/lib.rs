//! Attendance and exam-blueprint logic shared by the dashboard server and the CLI.

pub mod attendance;
pub mod blueprint;
pub mod cache;
pub mod normalize;
pub mod types;

pub mod attendance;
pub mod blueprint;

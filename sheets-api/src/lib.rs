pub mod client;
pub mod creds;
pub mod csv_source;
pub mod services;
pub mod source;
pub mod table;
pub mod types;

mod util;

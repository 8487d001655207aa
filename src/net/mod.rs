pub mod frames;
pub mod server_io;

pub mod config;
pub mod packet;

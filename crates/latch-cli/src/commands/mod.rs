pub mod bench;
pub mod compare;
pub mod config;
pub mod detect;

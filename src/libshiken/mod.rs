pub mod assembler;
pub mod bank;
pub mod bankfile;
pub mod config;
pub mod document;
pub mod error;
pub mod selector;
pub mod shitsumon;

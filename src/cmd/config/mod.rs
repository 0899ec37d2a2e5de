//! `toolkit config`: view, validate and create `toolkit.toml`.

pub mod init_command;
pub mod show_command;
pub mod validate_command;

//! Shared configuration, platform paths and wire types for spotify-cli.

pub mod config;
pub mod platform;
pub mod protocol;

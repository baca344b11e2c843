//! Integration tests for docfs path resolution and archive transfers

mod archive_roundtrip;
mod cli_contracts;
mod mirror_local;
mod path_properties;
mod resolver_contracts;

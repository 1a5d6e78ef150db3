//! Integration tests for the paneline generation pipeline

mod config_integration;
mod generation_pipeline;
mod store_integration;
mod test_utils;
mod update_pipeline;

pub mod board;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod optimizer;
pub mod predictor;
pub mod profile;
pub mod report;
pub mod rules;
pub mod sample_pool;
pub mod scoring;
pub mod solver;

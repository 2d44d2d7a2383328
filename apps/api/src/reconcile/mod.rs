pub mod apply;
pub mod engine;

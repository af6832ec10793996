pub mod audit;
pub mod error;
pub mod evaluator;
pub mod instance_gen;
pub mod model;
pub mod objective;
pub mod optimizer;
pub mod timeline;

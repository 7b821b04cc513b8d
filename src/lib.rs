pub mod dataset;
pub mod encoder;
pub mod forest;
pub mod predictor;
pub mod roster;

pub mod attribute;
pub mod generation;

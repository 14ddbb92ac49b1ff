pub mod encoder;
pub mod metadata;
pub mod sink;

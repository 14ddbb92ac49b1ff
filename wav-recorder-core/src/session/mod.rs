pub mod destination;
pub mod recording;
mod streaming_loop;

//! PLY decoding

mod decode;

pub use decode::decode_points;

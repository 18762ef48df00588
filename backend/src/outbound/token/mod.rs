//! Session token codecs.

mod jwt;

pub use jwt::{JwtCodec, MIN_SECRET_BYTES};

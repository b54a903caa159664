//! Session token encoding and decoding.

pub mod claims;
pub mod codec;

pub use claims::{Claims, TokenType};
pub use codec::TokenCodec;

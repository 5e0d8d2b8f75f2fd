pub mod codec;
pub mod model;

pub use codec::{CodecError, EnvelopeCodec, EnvelopeKeys, KeysError};
pub use model::*;

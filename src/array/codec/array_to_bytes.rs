//! `array->bytes` codecs.

pub mod bytes;
pub mod codec_chain;
pub mod sharding;

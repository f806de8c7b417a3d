//! # Frame Primitives
//!
//! Bit-layout codecs over the 33-byte DMR burst: slot type, sync field,
//! embedded signalling (EMB), short LC, the embedded-LC accumulator, and the
//! data header/block structures. Each struct decodes from and re-encodes into
//! its fixed bit range so a burst can be regenerated field by field.

pub mod data_block;
pub mod data_header;
pub mod embedded_data;
pub mod emb;
pub mod short_lc;
pub mod slot_type;
pub mod sync;

pub use data_block::DataBlock;
pub use data_header::DataHeader;
pub use emb::Emb;
pub use embedded_data::EmbeddedData;
pub use slot_type::SlotType;

//! Unidirectional byte channels between processes.
//!
//! A [`Channel`] is an OS pipe split into an owned [`ReadEnd`] and an owned
//! [`WriteEnd`]. Each end closes its file descriptor when dropped, so handing
//! an end to a child and dropping the parent's copy is how end-of-stream
//! reaches the reader.
//!
//! On top of the raw pipe this crate provides the wire codec used by the
//! producer/consumer protocol:
//! - Every message is one native-endian `i32` ([`VALUE_WIDTH`] bytes)
//! - No framing, no length prefix, no checksum
//! - End-of-stream is the only delimiter
//!
//! Unix only: channels are pipe(2) descriptors.

#[cfg(not(unix))]
compile_error!("forkpair-channel requires a Unix target (pipe(2))");

pub mod codec;
pub mod error;
pub mod pipe;
pub mod reader;
pub mod writer;

pub use codec::{decode_value, encode_value, VALUE_WIDTH};
pub use error::{ChannelError, Endpoint, Result};
pub use pipe::{Channel, ReadEnd, WriteEnd};
pub use reader::ValueReader;
pub use writer::ValueWriter;

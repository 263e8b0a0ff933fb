//! # Utility Modules
//!
//! Fixed-capacity packet buffers, hex formatting and rate-limited logging shared by
//! the radio driver and the LoRaWAN layer.

pub mod buffer;
pub mod hex;
pub mod logging;

pub use buffer::{FrameBuffer, RxBuffer, FRAME_CAPACITY, RX_CAPACITY};
pub use hex::{format_hex_compact, format_register_dump, parse_hex_lenient, HexError};
pub use logging::{log_frame_hex, LogThrottle};

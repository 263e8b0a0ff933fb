//! # Packet Buffers
//!
//! Fixed-capacity `heapless` vectors for frames on their way to the FIFO and for
//! packets read back from it.

/// Largest PHYPayload the encoder produces
pub const FRAME_CAPACITY: usize = 64;

/// Largest packet the SX127x FIFO can hold
pub const RX_CAPACITY: usize = 255;

/// Transmit frame buffer
pub type FrameBuffer = heapless::Vec<u8, FRAME_CAPACITY>;

/// Receive buffer sized for the largest SX127x packet
pub type RxBuffer = heapless::Vec<u8, RX_CAPACITY>;

//! # Logging Utilities
//!
//! Rate limiting for log lines emitted from the receive interrupt path, and hex
//! dumps of frames for protocol debugging.
//!
//! The throttle takes its time from the caller rather than reading a clock, so the
//! driver can feed it the HAL's millisecond counter.
//!
//! ```rust
//! use lora_sx127x::util::logging::LogThrottle;
//!
//! let mut throttle = LogThrottle::new(1000, 5); // 5 messages per second
//! if throttle.allow(0) {
//!     log::warn!("CRC error detected");
//! }
//! ```

/// Rate limiter for repeated log messages
#[derive(Debug, Clone)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Messages seen in the current window
    count: u32,
    /// Start of the current window
    window_start_ms: Option<u64>,
    /// Messages dropped since the last allowed one
    suppressed: u32,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    ///
    /// # Arguments
    /// * `window_ms` - Time window in milliseconds
    /// * `cap` - Maximum messages allowed per window
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            window_start_ms: None,
            suppressed: 0,
        }
    }

    /// Check if a message may be logged at `now_ms`
    ///
    /// A clock that jumps backwards starts a new window.
    pub fn allow(&mut self, now_ms: u64) -> bool {
        let expired = match self.window_start_ms {
            None => true,
            Some(start) => now_ms < start || now_ms - start > self.window_ms,
        };

        if expired {
            self.window_start_ms = Some(now_ms);
            self.count = 0;
        }

        self.count = self.count.saturating_add(1);
        let allowed = self.count <= self.cap;
        if !allowed {
            self.suppressed = self.suppressed.saturating_add(1);
        }
        allowed
    }

    /// Number of messages dropped since the last call; resets the counter
    pub fn take_suppressed(&mut self) -> u32 {
        std::mem::take(&mut self.suppressed)
    }
}

/// Log frame data in hex at debug level, truncated to 64 bytes
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 64;

    if !log::log_enabled!(log::Level::Debug) {
        return;
    }

    let shown = &data[..data.len().min(MAX_LOG_BYTES)];
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    log::debug!("{prefix}: {}{suffix}", crate::util::hex::format_hex_compact(shown));
}

/// Log an error with throttling, first reporting how many were dropped
#[macro_export]
macro_rules! log_error_throttled {
    ($throttle:expr, $now_ms:expr, $($arg:tt)*) => {
        if $throttle.allow($now_ms) {
            let suppressed = $throttle.take_suppressed();
            if suppressed > 0 {
                log::error!("{} similar messages suppressed", suppressed);
            }
            log::error!($($arg)*);
        }
    };
}

/// Log a warning with throttling
#[macro_export]
macro_rules! log_warn_throttled {
    ($throttle:expr, $now_ms:expr, $($arg:tt)*) => {
        if $throttle.allow($now_ms) {
            let suppressed = $throttle.take_suppressed();
            if suppressed > 0 {
                log::warn!("{} similar messages suppressed", suppressed);
            }
            log::warn!($($arg)*);
        }
    };
}

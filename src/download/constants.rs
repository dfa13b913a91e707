//! Constants for the download module.

/// Default connect timeout for direct-link transfers (30 seconds).
pub const DOWNLOAD_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default stall timeout: the longest gap between two received chunks.
pub const DOWNLOAD_READ_TIMEOUT_SECS: u64 = 300;

/// Name used when a host-reported name sanitizes to nothing.
pub const FALLBACK_FILE_NAME: &str = "download.bin";

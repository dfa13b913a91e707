//! Streaming a resolved download to disk.
//!
//! # Example
//!
//! ```no_run
//! use hostdl_core::download::{DownloadStreamer, target_path};
//! use hostdl_core::driver::Download;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let streamer = DownloadStreamer::new()?;
//! let mut download = Download::new("UnFichier", "movie.mkv", Some(1024), "https://a-1.1fichier.com/c123")
//!     .ok_or("empty link")?;
//! download.set_target(target_path(Path::new("./downloads"), download.file_name()));
//! let report = streamer
//!     .start(download, |received, total| println!("{received}/{total:?}"))
//!     .await?;
//! println!("Downloaded: {}", report.path.display());
//! # Ok(())
//! # }
//! ```

mod constants;
mod error;
mod filename;
mod streamer;

pub use constants::{DOWNLOAD_CONNECT_TIMEOUT_SECS, DOWNLOAD_READ_TIMEOUT_SECS};
pub use error::DownloadError;
pub use filename::{decode_file_name, sanitize_filename, target_path};
pub use streamer::{DownloadStreamer, StreamReport, default_download_timeouts};

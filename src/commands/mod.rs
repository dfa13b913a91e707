//! CLI command handlers.

mod download;
mod drivers;
mod info;
mod login;
mod revoke;

pub use download::run_download_command;
pub use drivers::run_drivers_command;
pub use info::run_info_command;
pub use login::run_login_command;
pub use revoke::run_revoke_command;

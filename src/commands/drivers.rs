use anyhow::Result;
use tracing::warn;

use crate::ProcessExit;
use crate::app::AppContext;

/// Lists registered drivers and whether a credential is stored for each.
///
/// # Errors
///
/// Never fails; an unreadable credential store is reported per driver.
pub fn run_drivers_command(ctx: &AppContext) -> Result<ProcessExit> {
    for driver in ctx.registry.iter() {
        let status = match driver.is_authenticated() {
            Ok(true) => "authenticated",
            Ok(false) => "anonymous",
            Err(error) => {
                warn!(driver = driver.name(), %error, "Credential lookup failed");
                "credential store unavailable"
            }
        };
        println!("{} ({status})", driver.name());
    }
    Ok(ProcessExit::Success)
}

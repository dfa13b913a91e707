use anyhow::Result;

use crate::ProcessExit;
use crate::app::AppContext;

/// Erases the stored credential of a driver. Succeeds when none was stored.
///
/// # Errors
///
/// Returns an error when the driver is unknown or the credential store fails.
pub fn run_revoke_command(ctx: &AppContext, driver_name: &str) -> Result<ProcessExit> {
    let driver = ctx.registry.find_by_name(driver_name)?;
    driver.unauthenticate()?;
    println!("Disconnected of {}", driver.name());
    Ok(ProcessExit::Success)
}

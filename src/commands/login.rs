use anyhow::Result;

use crate::ProcessExit;
use crate::app::AppContext;

/// Authenticates against a host and persists the credential.
///
/// # Errors
///
/// Returns an error when the driver is unknown or refuses authentication.
pub async fn run_login_command(
    ctx: &AppContext,
    driver_name: &str,
    login: &str,
    password: &str,
) -> Result<ProcessExit> {
    let driver = ctx.registry.find_by_name(driver_name)?;
    driver.authenticate(login, password).await?;
    println!("Connected to {}", driver.name());
    Ok(ProcessExit::Success)
}

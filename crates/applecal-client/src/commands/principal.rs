//! `principal` command.

use applecal_providers::{AppleCalendarProvider, CalDavTransport};

use crate::error::ClientResult;

/// Prints the principal id of the account.
pub async fn run<T: CalDavTransport>(provider: &AppleCalendarProvider<T>) -> ClientResult<()> {
    let principal = provider.get_principal().await?;
    println!("{}", principal);
    Ok(())
}

//! City search command.

use nimbus_client::ApiClient;

use super::{CommandResult, emit, render};

/// Print the cities matching `query`.
///
/// # Errors
///
/// Returns an error for a blank query or if the server cannot be reached.
pub async fn run(api: &ApiClient, query: &str) -> CommandResult {
    let results = api.search(query).await?;
    emit(&render::search(&results));
    Ok(())
}

//! Login of the bot account.
//!
//! The first start logs in with the password and persists the session; later
//! starts restore it from the [`SessionStore`].

use anyhow::Context;
use log::{debug, info};
use matrix_sdk::{Client, ruma::OwnedUserId};

use crate::matrix::{UserCredentials, session::SessionStore};

async fn build_client(user_id: &OwnedUserId, store: &SessionStore) -> anyhow::Result<Client> {
    let client = Client::builder()
        .server_name(user_id.server_name())
        .sqlite_store(store.sqlite_path(), None)
        .build()
        .await
        .context("cannot build the matrix client")?;

    debug!("matrix client created");
    Ok(client)
}

async fn login(
    user_credentials: &UserCredentials,
    user_id: OwnedUserId,
    store: &SessionStore,
) -> anyhow::Result<Client> {
    let client = build_client(&user_id, store).await?;

    client
        .matrix_auth()
        .login_username(user_id, &user_credentials.password)
        .initial_device_display_name("profilebot")
        .send()
        .await
        .context("login failed")?;

    let user_session = client
        .matrix_auth()
        .session()
        .context("no session after login")?;
    store.persist_user_session(&user_session).await?;

    info!("logged in as {}", user_credentials.user_id);
    Ok(client)
}

async fn restore(user_id: OwnedUserId, store: &SessionStore) -> anyhow::Result<Client> {
    let user_session = store
        .user_session()
        .context("no session to restore")?
        .clone();
    let client = build_client(&user_id, store).await?;

    client
        .restore_session(user_session)
        .await
        .context("cannot restore the matrix session")?;

    info!("matrix session of {} restored", user_id);
    Ok(client)
}

/// Returns a logged-in client, restoring the persisted session when there is one.
///
/// # Errors
///
/// Fails if the user ID is invalid, the homeserver is unreachable or the
/// credentials are refused.
pub async fn setup_client(
    user_credentials: &UserCredentials,
    store: &SessionStore,
) -> anyhow::Result<Client> {
    let user_id: OwnedUserId = user_credentials
        .user_id
        .as_str()
        .try_into()
        .with_context(|| format!("invalid user id {}", user_credentials.user_id))?;

    match store.user_session() {
        Some(_) => restore(user_id, store).await,
        None => login(user_credentials, user_id, store).await,
    }
}

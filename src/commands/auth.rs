//! Session command handlers.
//!
//! - `ledger login` signs in and remembers the identity
//! - `ledger logout` forgets it
//! - `ledger profile` shows who is signed in

use crate::args::LoginArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::Identity;
use crate::{Ledger, Result};
use anyhow::anyhow;

/// Handles `ledger login`: signs in as the identity described by `args`.
pub async fn login(ledger: &Ledger, args: &LoginArgs) -> Result<Out<Identity>> {
    let email = args.email().trim();
    if !email.contains('@') {
        return Err(anyhow!("'{email}' does not look like an email address"))
            .pub_result(ErrorType::Validation);
    }
    let mut identity = Identity::new(args.uid(), email);
    identity.display_name = args.display_name().map(str::to_string);
    identity.photo_url = args.photo_url().map(str::to_string);

    ledger
        .auth()
        .sign_in(identity.clone())
        .await
        .pub_result(ErrorType::Auth)?;
    Ok(Out::new(
        format!("Signed in as {}", identity.display_name()),
        identity,
    ))
}

/// Handles `ledger logout`.
pub async fn logout(ledger: &Ledger) -> Result<Out<()>> {
    ledger.auth().sign_out().await.pub_result(ErrorType::Auth)?;
    Ok(format!(
        "Signed out. Sign in again at {} or with 'ledger login'",
        ledger.config().login_url()
    )
    .into())
}

/// Handles `ledger profile`.
pub async fn profile(ledger: &Ledger) -> Result<Out<Identity>> {
    let identity = ledger.require_identity().await?;
    let mut body = format!("{}\n{}", identity.display_name(), identity.email);
    if let Some(photo_url) = &identity.photo_url {
        body.push_str(&format!("\nPhoto: {photo_url}"));
    }
    Ok(Out::new(format!("Profile of {}", identity.email), identity).with_body(body))
}

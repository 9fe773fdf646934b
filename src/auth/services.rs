use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::auth::{
    jwt::now_unix,
    password::{new_salt, CredentialHasher, DIGEST_LEN, SALT_LEN},
    repo_types::Account,
};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Runs the deliberately slow derivation on the blocking pool.
async fn derive_off_thread(
    hasher: CredentialHasher,
    password: String,
    salt: Vec<u8>,
) -> AppResult<Vec<u8>> {
    let digest = tokio::task::spawn_blocking(move || hasher.derive(&password, &salt))
        .await
        .context("join password derivation task")??;
    Ok(digest)
}

/// Creates the account and returns a freshly issued session token.
pub async fn register(state: &AppState, email: &str, password: &str) -> AppResult<String> {
    if !is_valid_email(email) {
        debug!(%email, "rejected invalid email");
        return Err(AppError::BadRequest("invalid email".into()));
    }
    if password.is_empty() {
        return Err(AppError::BadRequest("password is required".into()));
    }

    let salt = new_salt().to_vec();
    let digest = derive_off_thread(state.hasher.clone(), password.to_owned(), salt.clone()).await?;

    let created = Account::create(
        &state.db,
        email,
        &hex::encode(&digest),
        &hex::encode(&salt),
        now_unix(),
    )
    .await?;
    if created.is_none() {
        info!(%email, "email already registered");
        return Err(AppError::Conflict("account already exists".into()));
    }

    let token = state.keys.issue(email)?;
    info!(%email, "account created");
    Ok(token)
}

// Stands in for a missing account so unknown emails still pay for a derivation.
const DECOY_SALT: [u8; SALT_LEN] = [0u8; SALT_LEN];

/// Salt and digest to check the password against. Unknown emails get the decoy
/// salt and an all-zero digest, which no derivation produces in practice.
fn stored_credentials(account: Option<&Account>) -> AppResult<(Vec<u8>, Vec<u8>)> {
    match account {
        Some(account) => {
            let salt = hex::decode(&account.salt).context("stored salt is not hex")?;
            let digest = hex::decode(&account.password_hash).context("stored digest is not hex")?;
            Ok((salt, digest))
        }
        None => Ok((DECOY_SALT.to_vec(), vec![0u8; DIGEST_LEN])),
    }
}

/// Checks credentials and returns a freshly issued session token.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> AppResult<String> {
    let account = Account::find_by_email(&state.db, email).await?;
    let (salt, stored) = stored_credentials(account.as_ref())?;

    let hasher = state.hasher.clone();
    let password = password.to_owned();
    let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &salt, &stored))
        .await
        .context("join password verification task")??;

    if account.is_none() {
        info!(%email, "login for unknown email");
        return Err(AppError::Unauthorized("invalid credentials".into()));
    }
    if !matches {
        info!(%email, "login with wrong password");
        return Err(AppError::Unauthorized("invalid credentials".into()));
    }

    let token = state.keys.issue(email)?;
    info!(%email, "user logged in");
    Ok(token)
}

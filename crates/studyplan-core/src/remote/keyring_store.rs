//! Thin wrapper around the OS keyring for the persisted auth session.

use super::types::AuthSession;
use crate::error::Result;

const SERVICE: &str = "studyplan";

pub fn get(key: &str) -> Result<Option<String>> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    match entry.get_password() {
        Ok(pw) => Ok(Some(pw)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    entry.set_password(value)?;
    Ok(())
}

pub fn delete(key: &str) -> Result<()> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Keyring entry name for the session of one backend project.
pub fn session_key(backend_url: &str) -> String {
    format!("session:{}", backend_url.trim().trim_end_matches('/'))
}

pub fn load_session(backend_url: &str) -> Result<Option<AuthSession>> {
    match get(&session_key(backend_url))? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub fn save_session(backend_url: &str, session: &AuthSession) -> Result<()> {
    let json = serde_json::to_string(session)?;
    set(&session_key(backend_url), &json)
}

pub fn clear_session(backend_url: &str) -> Result<()> {
    delete(&session_key(backend_url))
}

//! Accounts and the read-modify-write transaction every operation runs in

use secrecy::SecretString;
use sfs_core::{KeyRole, RecordId, SfsError, SfsResult};
use sfs_crypto::{
    derive_user_id, derive_user_keys, generate_salt, Layout, Seal, SealedRecord, Unseal,
};

use crate::backend::Backend;
use crate::records::UserRecord;

/// A logged-in user.
///
/// Holds credentials and the derived record id, never the record itself:
/// each operation re-fetches it, so several handles for one account see
/// each other's committed changes.
pub struct User {
    backend: Backend,
    username: String,
    password: SecretString,
    record_id: RecordId,
}

/// The working copy of a user record inside [`User::transact`].
pub struct Session<'a> {
    user: &'a User,
    record: UserRecord,
    dirty: bool,
    purged: bool,
}

impl User {
    /// Create an account.
    ///
    /// `AlreadyExists` if either directory entry for `username` is taken.
    /// Usernames are case sensitive.
    pub fn create(backend: &Backend, username: &str, password: &str) -> SfsResult<Self> {
        let directory = backend.directory();
        for role in KeyRole::ALL {
            let entry = role.entry(username);
            if directory.contains(&entry)? {
                return Err(SfsError::AlreadyExists(entry));
            }
        }

        let record = UserRecord::generate(username);
        directory.set(
            &KeyRole::Verify.entry(username),
            record.signing_key.verify_key().to_bytes().to_vec(),
        )?;
        directory.set(
            &KeyRole::Encrypt.entry(username),
            record.decryption_key.encryption_key().to_bytes().to_vec(),
        )?;

        let user = Self::handle(backend, username, password);
        user.commit(&record)?;
        tracing::info!(username, "account created");
        Ok(user)
    }

    /// Log in to an existing account.
    ///
    /// `NotFound` if the account has no directory entries. Every other
    /// failure (wrong password included) is `AuthenticationFailure`.
    pub fn login(backend: &Backend, username: &str, password: &str) -> SfsResult<Self> {
        let user = Self::handle(backend, username, password);
        user.fetch_record()?;
        tracing::debug!(username, "logged in");
        Ok(user)
    }

    fn handle(backend: &Backend, username: &str, password: &str) -> Self {
        let password = SecretString::from(password);
        let record_id = derive_user_id(username, &password, backend.params().id_rounds);
        Self {
            backend: backend.clone(),
            username: username.to_string(),
            password,
            record_id,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Run `op` against a freshly fetched copy of this user's record.
    ///
    /// On success the record is re-sealed and stored if `op` changed it. On
    /// failure nothing is stored unless `op` purged poisoned file pointers,
    /// in which case the purge is stored and the original error returned.
    ///
    /// Only the user record is covered: sentinels, metadata and blocks that
    /// `op` already published stay published if it later fails.
    pub fn transact<T>(&self, op: impl FnOnce(&mut Session<'_>) -> SfsResult<T>) -> SfsResult<T> {
        let record = self.fetch_record()?;
        let mut session = Session {
            user: self,
            record,
            dirty: false,
            purged: false,
        };

        match op(&mut session) {
            Ok(value) => {
                if session.dirty {
                    self.commit(&session.record)?;
                }
                Ok(value)
            }
            Err(err) => {
                if session.purged {
                    if let Err(commit_err) = self.commit(&session.record) {
                        tracing::warn!(
                            username = %self.username,
                            error = %commit_err,
                            "failed to persist pointer purge"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    fn fetch_record(&self) -> SfsResult<UserRecord> {
        if !self.backend.has_account(&self.username)? {
            return Err(SfsError::NotFound(format!("account {}", self.username)));
        }

        let bytes = self
            .backend
            .get(&self.record_id)?
            .ok_or(SfsError::AuthenticationFailure)?;
        let sealed =
            SealedRecord::parse(&bytes, Layout::SaltedMac).map_err(|_| SfsError::AuthenticationFailure)?;
        let salt = sealed.salt().ok_or(SfsError::AuthenticationFailure)?;

        let keys = derive_user_keys(
            &self.username,
            &self.password,
            salt,
            &self.backend.params().kdf,
        )?;
        let plaintext = sealed
            .open(&self.record_id, Unseal::Mac(&keys.mac), &keys.enc)
            .map_err(|_| SfsError::AuthenticationFailure)?;
        let record = UserRecord::from_json(&plaintext).map_err(|_| SfsError::AuthenticationFailure)?;

        if record.username != self.username {
            return Err(SfsError::AuthenticationFailure);
        }
        // Stored private keys must match what the directory publishes.
        if self.backend.verify_key(&self.username)? != record.signing_key.verify_key()
            || self.backend.encryption_key(&self.username)? != record.decryption_key.encryption_key()
        {
            return Err(SfsError::AuthenticationFailure);
        }
        Ok(record)
    }

    /// Seal `record` under a fresh salt and overwrite the stored copy.
    fn commit(&self, record: &UserRecord) -> SfsResult<()> {
        let salt = generate_salt();
        let keys = derive_user_keys(
            &self.username,
            &self.password,
            &salt,
            &self.backend.params().kdf,
        )?;
        let sealed = SealedRecord::seal(
            &self.record_id,
            &record.to_json()?,
            &keys.enc,
            Seal::SaltedMac {
                key: &keys.mac,
                salt,
            },
        )?;
        self.backend.put(&self.record_id, sealed.to_bytes())
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("record_id", &self.record_id)
            .finish_non_exhaustive()
    }
}

impl<'a> Session<'a> {
    pub fn username(&self) -> &'a str {
        &self.user.username
    }

    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    /// Mutable access; marks the record for commit.
    pub fn record_mut(&mut self) -> &mut UserRecord {
        self.dirty = true;
        &mut self.record
    }

    pub(crate) fn backend(&self) -> &'a Backend {
        &self.user.backend
    }

    /// Drop the pointer for `name_hash`. Persisted even if the operation fails.
    pub(crate) fn purge(&mut self, name_hash: &str) {
        if self.record.files.remove(name_hash).is_some() {
            self.purged = true;
            self.dirty = true;
        }
    }
}

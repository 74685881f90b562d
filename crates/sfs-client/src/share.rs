use sfs_core::{SfsError, SfsResult};
use sfs_crypto::filename_hash;

use crate::records::FilePointer;
use crate::token::{CapabilityToken, Envelope};
use crate::user::User;

impl User {
    /// Give `recipient` access to `filename` and return the token they need
    /// to receive it.
    ///
    /// Sharing with someone who already has access issues a fresh token
    /// without changing the access graph.
    pub fn share_file(&self, filename: &str, recipient: &str) -> SfsResult<CapabilityToken> {
        self.transact(|session| {
            let mut file = session.open_file(filename)?;
            let backend = session.backend();
            let recipient_key = backend.encryption_key(recipient)?;
            let sharer = session.username();

            if file.metadata.access.grant(sharer, recipient) {
                session.publish_metadata(&mut file)?;
                file.sentinel
                    .grant(recipient, &recipient_key, &file.metadata_key)?;
                backend.put(&file.pointer.sentinel, file.sentinel.to_bytes()?)?;
                tracing::info!(
                    file = %file.pointer.sentinel,
                    from = sharer,
                    to = recipient,
                    "file shared"
                );
            } else {
                tracing::debug!(to = recipient, "recipient already has access, reissuing token");
            }

            CapabilityToken::issue(
                &Envelope {
                    owner: file.pointer.owner.clone(),
                    sentinel: file.pointer.sentinel,
                },
                &session.record().signing_key,
                &recipient_key,
            )
        })
    }

    /// Accept a token from `sender` and map it to `filename`.
    pub fn receive_file(
        &self,
        filename: &str,
        sender: &str,
        token: &CapabilityToken,
    ) -> SfsResult<()> {
        self.transact(|session| {
            let backend = session.backend();
            let sender_key = backend.verify_key(sender)?;
            let envelope = token.accept(&sender_key, &session.record().decryption_key)?;

            let name_hash = filename_hash(filename, session.username());
            if session.record().files.contains_key(&name_hash) {
                return Err(SfsError::AlreadyExists(format!("file {filename:?}")));
            }
            if !backend.has_account(&envelope.owner)? {
                return Err(SfsError::not_found(format!("owner {}", envelope.owner)));
            }

            session.record_mut().files.insert(
                name_hash,
                FilePointer {
                    sentinel: envelope.sentinel,
                    owner: envelope.owner,
                },
            );
            tracing::info!(from = sender, sentinel = %envelope.sentinel, "file received");
            Ok(())
        })
    }
}

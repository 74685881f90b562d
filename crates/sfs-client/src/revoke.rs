use sfs_core::{SfsError, SfsResult};
use sfs_crypto::SymmetricKey;

use crate::records::{ContentBlock, Sentinel};
use crate::user::User;

impl User {
    /// Remove `target`, and everyone who got access through them, from
    /// `filename`. Owner only.
    ///
    /// Every key protecting the file is replaced and every block re-sealed,
    /// so nothing a revoked user kept can open the file afterwards.
    pub fn revoke_file(&self, filename: &str, target: &str) -> SfsResult<()> {
        self.transact(|session| {
            let mut file = session.open_file(filename)?;
            let backend = session.backend();
            let me = session.username();

            if file.metadata.owner != me {
                return Err(SfsError::AuthorizationFailure(format!(
                    "only {} may revoke access to {filename:?}",
                    file.metadata.owner
                )));
            }
            if target == me {
                return Err(SfsError::AuthorizationFailure(
                    "the owner cannot revoke themselves".to_string(),
                ));
            }
            if !file.metadata.access.contains(target) || !file.metadata.access.is_reachable(me, target) {
                return Err(SfsError::access_denied(format!(
                    "{target} has no access to {filename:?}"
                )));
            }

            // Read everything under the old keys before anything is replaced.
            let mut blocks = Vec::with_capacity(file.metadata.blocks.len());
            for id in &file.metadata.blocks {
                let bytes = backend.fetch(id, "content block")?;
                blocks.push(ContentBlock::open(id, &bytes, &file.metadata)?);
            }

            let removed = file.metadata.access.remove_subtree(target);
            let survivors = file
                .metadata
                .access
                .members()
                .map(|user| -> SfsResult<_> { Ok((user.to_string(), backend.encryption_key(user)?)) })
                .collect::<SfsResult<Vec<_>>>()?;

            file.metadata.rotate_content_keys();
            file.metadata_key = SymmetricKey::generate();

            for block in &blocks {
                session.publish_block(block, &file.metadata)?;
            }
            session.publish_metadata(&mut file)?;

            let signing_key = &session.record().signing_key;
            let mut sentinel = Sentinel::new(file.metadata.id, &file.metadata_key, signing_key);
            for (user, key) in &survivors {
                sentinel.grant(user, key, &file.metadata_key)?;
            }
            backend.put(&file.pointer.sentinel, sentinel.to_bytes()?)?;

            tracing::info!(
                file = %file.pointer.sentinel,
                ?removed,
                remaining = survivors.len(),
                "access revoked"
            );
            Ok(())
        })
    }
}

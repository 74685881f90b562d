use sfs_core::{RecordId, SfsResult};
use sfs_crypto::{filename_hash, SymmetricKey};

use crate::chain::OpenFile;
use crate::records::{ContentBlock, FilePointer, Metadata, Sentinel};
use crate::user::{Session, User};

impl User {
    /// Store `data` under `filename`, replacing any previous contents.
    ///
    /// A name the caller already maps (own or shared) is overwritten in
    /// place: same sentinel, same metadata, a single new block.
    pub fn store_file(&self, filename: &str, data: &[u8]) -> SfsResult<()> {
        self.transact(|session| {
            let name_hash = filename_hash(filename, session.username());
            if session.record().files.contains_key(&name_hash) {
                let mut file = session.open_file(filename)?;
                let block = ContentBlock::new(data);
                file.metadata.blocks = vec![block.id];
                session.publish_block(&block, &file.metadata)?;
                session.publish_metadata(&mut file)?;
                tracing::debug!(file = %file.pointer.sentinel, "file overwritten");
            } else {
                session.create_file(name_hash, data)?;
            }
            Ok(())
        })
    }

    /// Append `data` as one new block. Existing blocks are not touched.
    pub fn append_file(&self, filename: &str, data: &[u8]) -> SfsResult<()> {
        self.transact(|session| {
            let mut file = session.open_file(filename)?;
            let block = ContentBlock::new(data);
            file.metadata.blocks.push(block.id);
            session.publish_block(&block, &file.metadata)?;
            session.publish_metadata(&mut file)?;
            tracing::debug!(
                file = %file.pointer.sentinel,
                blocks = file.metadata.blocks.len(),
                "block appended"
            );
            Ok(())
        })
    }

    /// Verified contents of `filename`, all blocks in order.
    pub fn load_file(&self, filename: &str) -> SfsResult<Vec<u8>> {
        self.transact(|session| {
            let file = session.open_file(filename)?;
            let backend = session.backend();

            let mut data = Vec::new();
            for id in &file.metadata.blocks {
                let bytes = backend.fetch(id, "content block")?;
                let block = ContentBlock::open(id, &bytes, &file.metadata)?;
                data.extend_from_slice(&block.data);
            }
            Ok(data)
        })
    }
}

impl Session<'_> {
    fn create_file(&mut self, name_hash: String, data: &[u8]) -> SfsResult<()> {
        let owner = self.username();
        let sentinel_id = RecordId::random();
        let metadata_key = SymmetricKey::generate();
        let mut metadata = Metadata::new(RecordId::random(), owner);

        let block = ContentBlock::new(data);
        metadata.blocks.push(block.id);
        self.publish_block(&block, &metadata)?;

        let signing_key = &self.record().signing_key;
        self.backend()
            .put(&metadata.id, metadata.seal(&metadata_key, signing_key)?)?;

        let mut sentinel = Sentinel::new(metadata.id, &metadata_key, signing_key);
        sentinel.grant(
            owner,
            &self.record().decryption_key.encryption_key(),
            &metadata_key,
        )?;
        self.backend().put(&sentinel_id, sentinel.to_bytes()?)?;

        self.record_mut().files.insert(
            name_hash,
            FilePointer {
                sentinel: sentinel_id,
                owner: owner.to_string(),
            },
        );
        tracing::debug!(sentinel = %sentinel_id, metadata = %metadata.id, "file created");
        Ok(())
    }

    pub(crate) fn publish_block(&self, block: &ContentBlock, metadata: &Metadata) -> SfsResult<()> {
        self.backend().put(&block.id, block.seal(metadata)?)
    }

    /// Mark the caller as last modifier, then sign and store the metadata.
    pub(crate) fn publish_metadata(&self, file: &mut OpenFile) -> SfsResult<()> {
        file.metadata.last_modifier = self.username().to_string();
        let sealed = file
            .metadata
            .seal(&file.metadata_key, &self.record().signing_key)?;
        self.backend().put(&file.metadata.id, sealed)
    }
}

//! Durable content slots behind a key-value store.
//!
//! Two slots exist: the durable site content and an ephemeral preview draft
//! used to hand content to a freshly opened preview. Plain reads never fail
//! from the caller's point of view: missing, unreadable or corrupt data reads
//! as absent. Writes report their errors and leave in-memory state alone. A
//! section save merges into the stored record, so it refuses to write when
//! that record cannot be read.
//!
//! The store is assumed to have a single writer. Nothing here detects or merges
//! concurrent writes from other processes.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::application::error::PersistenceError;
use crate::cache::{CacheConfig, ChangeKind, ChangeSignal, ContentCache};
use crate::domain::content::ContentTree;
use crate::domain::site::SiteContent;
use crate::infra::store::{KeyValueStore, MemoryStore};
use crate::util::clock::{Clock, SystemClock};

pub const CONTENT_SLOT: &str = "site-content";
pub const DRAFT_SLOT: &str = "preview-draft";

pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
    cache: Arc<ContentCache>,
    signal: Arc<ChangeSignal>,
}

impl PersistenceGateway {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        cache: Arc<ContentCache>,
        signal: Arc<ChangeSignal>,
    ) -> Self {
        Self {
            store,
            cache,
            signal,
        }
    }

    /// Gateway over a fresh in-memory store with a default cache.
    pub fn in_memory() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ContentCache::new(CacheConfig::default(), clock)),
            Arc::new(ChangeSignal::new()),
        )
    }

    pub fn signal(&self) -> &Arc<ChangeSignal> {
        &self.signal
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    pub fn load(&self) -> Option<SiteContent> {
        if let Some(record) = self.cache.get() {
            return Some(record);
        }
        let record = self.read_slot(CONTENT_SLOT)?;
        self.cache.put(record.clone());
        Some(record)
    }

    pub fn save(&self, record: &SiteContent) -> Result<(), PersistenceError> {
        self.write_slot(CONTENT_SLOT, record)?;
        self.cache.invalidate();
        self.signal.notify(ChangeKind::ContentSaved);
        info!(
            slot = CONTENT_SLOT,
            sections = record.sections.len(),
            revision = ?record.revision,
            "Site content saved"
        );
        Ok(())
    }

    pub fn load_draft(&self) -> Option<SiteContent> {
        self.read_slot(DRAFT_SLOT)
    }

    pub fn save_draft(&self, record: &SiteContent) -> Result<(), PersistenceError> {
        self.write_slot(DRAFT_SLOT, record)?;
        self.signal.notify(ChangeKind::DraftSaved);
        debug!(slot = DRAFT_SLOT, revision = ?record.revision, "Preview draft saved");
        Ok(())
    }

    pub fn clear_draft(&self) -> Result<(), PersistenceError> {
        self.store
            .remove(DRAFT_SLOT)
            .map_err(|source| PersistenceError::Write {
                slot: DRAFT_SLOT,
                source,
            })?;
        debug!(slot = DRAFT_SLOT, "Preview draft cleared");
        Ok(())
    }

    /// Stored content for one section, if any.
    pub fn load_section(&self, section_id: &str) -> Option<ContentTree> {
        self.load()
            .and_then(|record| record.section(section_id).cloned())
    }

    /// Replace one section in the durable record and save it.
    pub fn save_section(
        &self,
        section_id: &str,
        content: ContentTree,
    ) -> Result<SiteContent, PersistenceError> {
        let record = self
            .load_for_merge()?
            .unwrap_or_default()
            .with_section(section_id, content);
        self.save(&record)?;
        Ok(record)
    }

    /// Like `load`, but an unreadable store is an error rather than absence.
    fn load_for_merge(&self) -> Result<Option<SiteContent>, PersistenceError> {
        if let Some(record) = self.cache.get() {
            return Ok(Some(record));
        }
        let record = self.try_read_slot(CONTENT_SLOT)?;
        if let Some(record) = record.as_ref() {
            self.cache.put(record.clone());
        }
        Ok(record)
    }

    /// Another view reported that stored content may have changed.
    pub fn notify_external_update(&self) {
        self.cache.invalidate();
        self.signal.notify(ChangeKind::ExternalUpdate);
    }

    fn read_slot(&self, slot: &'static str) -> Option<SiteContent> {
        match self.try_read_slot(slot) {
            Ok(record) => record,
            Err(error) => {
                warn!(slot, error = %error, "Stored content could not be read; using defaults");
                None
            }
        }
    }

    /// Corrupt data reads as absent; only store failures are errors.
    fn try_read_slot(&self, slot: &'static str) -> Result<Option<SiteContent>, PersistenceError> {
        let raw = match self.store.read(slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(source) => return Err(PersistenceError::Read { slot, source }),
        };

        match serde_json::from_str::<SiteContent>(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(error) => {
                counter!("vitrine_corrupt_read_total", "slot" => slot).increment(1);
                warn!(slot, error = %error, "Stored content is corrupt; ignoring it");
                Ok(None)
            }
        }
    }

    fn write_slot(&self, slot: &'static str, record: &SiteContent) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(record)
            .map_err(|source| PersistenceError::Serialize { slot, source })?;
        self.store
            .write(slot, &raw)
            .map_err(|source| PersistenceError::Write { slot, source })
    }
}

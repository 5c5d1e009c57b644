//! The persisted form of a whole site's content.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::content::ContentTree;

/// Every section's content keyed by section id.
///
/// Used both for the durable site-content slot and for the preview draft slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SiteContent {
    #[serde(default)]
    pub sections: BTreeMap<String, ContentTree>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub saved_at: Option<OffsetDateTime>,
    /// Fresh for every write; lets readers tell two saves apart.
    #[serde(default)]
    pub revision: Option<Uuid>,
}

impl SiteContent {
    pub fn section(&self, section_id: &str) -> Option<&ContentTree> {
        self.sections.get(section_id)
    }

    /// Copy of this record with one section replaced and a new revision stamp.
    pub fn with_section(&self, section_id: &str, content: ContentTree) -> SiteContent {
        let mut sections = self.sections.clone();
        sections.insert(section_id.to_string(), content);
        SiteContent {
            sections,
            saved_at: Some(OffsetDateTime::now_utc()),
            revision: Some(Uuid::new_v4()),
        }
    }
}

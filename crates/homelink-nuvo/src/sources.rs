//! Source input naming.

use std::collections::{BTreeMap, HashMap};

use crate::ids::SourceId;

/// Bidirectional mapping between source inputs and their configured names.
///
/// Built once from configuration and never changed. When two inputs share
/// a name, the higher-numbered input owns it for name lookups and the name
/// is listed once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTable {
    by_id: BTreeMap<SourceId, String>,
    by_name: HashMap<String, SourceId>,
    ordered: Vec<String>,
}

impl SourceTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (SourceId, S)>,
        S: Into<String>,
    {
        let by_id: BTreeMap<SourceId, String> = entries
            .into_iter()
            .map(|(id, name)| (id, name.into()))
            .collect();

        // Ascending iteration, so a later (higher) id overwrites a duplicate.
        let mut by_name = HashMap::new();
        for (id, name) in &by_id {
            by_name.insert(name.clone(), *id);
        }

        let mut ordered: Vec<(SourceId, String)> = by_name
            .iter()
            .map(|(name, id)| (*id, name.clone()))
            .collect();
        ordered.sort();
        let ordered = ordered.into_iter().map(|(_, name)| name).collect();

        Self {
            by_id,
            by_name,
            ordered,
        }
    }

    /// Configured name of a source input.
    pub fn name_for(&self, id: SourceId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Name for a raw source number as reported by the amplifier.
    ///
    /// Numbers outside the valid range or without a configured name are
    /// `None`.
    pub fn name_for_raw(&self, id: u32) -> Option<&str> {
        let id = u8::try_from(id).ok()?;
        self.name_for(SourceId::new(id).ok()?)
    }

    /// Source input configured under `name`.
    pub fn id_for(&self, name: &str) -> Option<SourceId> {
        self.by_name.get(name).copied()
    }

    /// Names in ascending source number order.
    pub fn ordered_names(&self) -> &[String] {
        &self.ordered
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

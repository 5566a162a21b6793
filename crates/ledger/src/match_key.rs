//! The identity tuple that decides merge-vs-new for incoming stock.

use crate::import::ImportRow;
use crate::item::StockFields;

/// Canonical form of a text field for matching: trimmed, lowercased, inner
/// whitespace collapsed to single spaces.
pub fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Which fields participate in matching.
///
/// The identity tuple is (project, part_name, uom, location). Some
/// deployments also treat differing descriptions as distinct parts; that is
/// a per-store decision, fixed at store construction so the same key always
/// means the same thing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct MatchPolicy {
    pub match_description: bool,
}

impl MatchPolicy {
    /// Read the policy from `STOCKROOM_MATCH_DESCRIPTION` (default: off).
    pub fn from_env() -> Self {
        let match_description = std::env::var("STOCKROOM_MATCH_DESCRIPTION")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);
        Self { match_description }
    }

    pub fn key(
        &self,
        project: &str,
        part_name: &str,
        uom: &str,
        location: &str,
        description: &str,
    ) -> MatchKey {
        MatchKey {
            project: normalize(project),
            part_name: normalize(part_name),
            uom: normalize(uom),
            location: normalize(location),
            description: self.match_description.then(|| normalize(description)),
        }
    }

    pub fn key_for_item(&self, fields: &StockFields) -> MatchKey {
        self.key(
            &fields.project,
            &fields.part_name,
            &fields.uom,
            &fields.location,
            &fields.description,
        )
    }

    pub fn key_for_row(&self, row: &ImportRow) -> MatchKey {
        self.key(
            &row.project,
            &row.part_name,
            &row.uom,
            &row.location,
            &row.description,
        )
    }
}

/// Normalized matching key. Only a [`MatchPolicy`] can build one, so every
/// key in circulation is already normalized and policy-consistent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    project: String,
    part_name: String,
    uom: String,
    location: String,
    /// `None` when the policy ignores descriptions.
    description: Option<String>,
}

//! Aggregate counts over the whole graph.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::store::CoarseFilter;

use super::GraphSearchEngine;

#[derive(Debug, Clone, Serialize)]
pub struct EntityStats {
    /// Every entity, active or not.
    pub total: usize,
    pub active: usize,
    pub by_primary_classification: BTreeMap<String, usize>,
    /// Counts per free-text classification tag.
    pub by_tag: BTreeMap<String, usize>,
    /// Entities created within the last `recent_window_days`.
    pub recent_additions: usize,
    pub recent_window_days: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_confidence: BTreeMap<u8, usize>,
    /// Mean confidence score; 0.0 for an empty store.
    pub avg_confidence: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl GraphSearchEngine {
    pub fn entity_statistics(&self) -> EntityStats {
        self.entity_statistics_at(Utc::now())
    }

    /// [`entity_statistics`](Self::entity_statistics) relative to a fixed clock.
    pub fn entity_statistics_at(&self, now: DateTime<Utc>) -> EntityStats {
        let all = self.entities.scan(&CoarseFilter {
            include_inactive: true,
            ..Default::default()
        });
        let window = self.config.recent_window_days;
        // A window reaching past the representable range counts everything.
        let since = Duration::try_days(window).and_then(|d| now.checked_sub_signed(d));

        let mut by_primary_classification = BTreeMap::new();
        let mut by_tag = BTreeMap::new();
        let mut active = 0;
        let mut recent_additions = 0;
        let mut last_updated: Option<DateTime<Utc>> = None;
        for e in &all {
            *by_primary_classification
                .entry(e.primary_classification().to_string())
                .or_insert(0) += 1;
            for tag in &e.classifications {
                *by_tag.entry(tag.clone()).or_insert(0) += 1;
            }
            if e.is_active {
                active += 1;
            }
            if since.is_none_or(|since| e.created_at >= since) {
                recent_additions += 1;
            }
            last_updated = last_updated.max(Some(e.updated_at));
        }

        EntityStats {
            total: all.len(),
            active,
            by_primary_classification,
            by_tag,
            recent_additions,
            recent_window_days: window,
            last_updated,
        }
    }

    pub fn relationship_statistics(&self) -> RelationshipStats {
        let rels = self.relationships.snapshot();
        let mut by_type = BTreeMap::new();
        let mut by_confidence = BTreeMap::new();
        let mut sum = 0u64;
        let mut last_updated: Option<DateTime<Utc>> = None;
        for r in &rels {
            *by_type.entry(r.relationship_type.clone()).or_insert(0) += 1;
            *by_confidence.entry(r.confidence_score.get()).or_insert(0) += 1;
            sum += u64::from(r.confidence_score.get());
            last_updated = last_updated.max(Some(r.updated_at));
        }
        let avg_confidence = if rels.is_empty() {
            0.0
        } else {
            sum as f64 / rels.len() as f64
        };
        RelationshipStats {
            total: rels.len(),
            by_type,
            by_confidence,
            avg_confidence,
            last_updated,
        }
    }
}

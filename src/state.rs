//! Application state: the in-memory sequence store and admin auth handle.
//!
//! This module owns:
//!   - the sequence store (by text id), seeded from config and built-ins
//!   - resolved admin auth material (absent when login is disabled)
//!   - the generate-count cap from config

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::auth::AdminAuth;
use crate::config::AppConfig;
use crate::domain::{SequenceInfo, SequenceSource};
use crate::expr;
use crate::seeds::seed_sequences;
use crate::util::slugify;

#[derive(Clone)]
pub struct AppState {
    pub sequences: Arc<RwLock<HashMap<String, SequenceInfo>>>,
    pub auth: Option<AdminAuth>,
    pub generate_cap: u32,
}

impl AppState {
    /// Build state from config: insert bank sequences, then built-in seeds,
    /// then resolve admin auth.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: &AppConfig) -> Self {
        let mut map = HashMap::<String, SequenceInfo>::new();

        // Insert config-based sequences (if any).
        for sc in &cfg.sequences {
            let id = match &sc.id {
                Some(id) => id.clone(),
                None => {
                    let slug = slugify(&sc.name);
                    if slug.is_empty() {
                        Uuid::new_v4().to_string()
                    } else {
                        slug
                    }
                }
            };
            if !expr::validate(&sc.expression) {
                error!(target: "sequence", %id, expression = %sc.expression, "Skipping bank item: invalid expression.");
                continue;
            }
            let info = SequenceInfo {
                text_id: id.clone(),
                name: sc.name.clone(),
                description: sc.description.clone().unwrap_or_default(),
                formula: sc.formula.clone().unwrap_or_default(),
                expression: sc.expression.clone(),
                color: sc.color.clone().unwrap_or_default(),
                fun_fact: sc.fun_fact.clone().unwrap_or_default(),
                seed: sc.seed.clone().unwrap_or_default(),
                source: SequenceSource::ConfigBank,
            };
            map.insert(id, info);
        }

        // Always insert built-in seeds, but don't overwrite existing ids.
        for s in seed_sequences() {
            map.entry(s.text_id.clone()).or_insert(s);
        }

        // Inventory summary by source.
        let mut counts = (0usize, 0usize);
        for s in map.values() {
            match s.source {
                SequenceSource::ConfigBank => counts.0 += 1,
                SequenceSource::Seed => counts.1 += 1,
                SequenceSource::Created => {}
            }
        }
        info!(target: "sequence", config_bank = counts.0, builtin = counts.1, "Startup sequence inventory");

        let auth = AdminAuth::from_sources(&cfg.auth);
        if auth.is_some() {
            info!(target: "seqdrill", "Admin auth enabled.");
        } else {
            info!(target: "seqdrill", "Admin auth disabled (no password digest configured). Mutating routes are off.");
        }

        Self {
            sequences: Arc::new(RwLock::new(map)),
            auth,
            generate_cap: cfg.server.generate_cap,
        }
    }

    /// Sorted list of known text ids.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_ids(&self) -> Vec<String> {
        let map = self.sequences.read().await;
        let mut ids: Vec<String> = map.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Read-only access to a sequence by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_sequence(&self, id: &str) -> Option<SequenceInfo> {
        let map = self.sequences.read().await;
        map.get(id).cloned()
    }

    /// Insert or replace a sequence.
    #[instrument(level = "debug", skip(self, s), fields(id = %s.text_id))]
    pub async fn insert_sequence(&self, s: SequenceInfo) {
        let mut map = self.sequences.write().await;
        map.insert(s.text_id.clone(), s);
    }

    /// Apply an in-place update; returns the updated record, or None when the
    /// id is unknown.
    #[instrument(level = "debug", skip(self, apply), fields(%id))]
    pub async fn update_sequence(
        &self,
        id: &str,
        apply: impl FnOnce(&mut SequenceInfo),
    ) -> Option<SequenceInfo> {
        let mut map = self.sequences.write().await;
        let entry = map.get_mut(id)?;
        apply(entry);
        Some(entry.clone())
    }

    /// Remove a sequence; true when something was actually deleted.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn remove_sequence(&self, id: &str) -> bool {
        let mut map = self.sequences.write().await;
        map.remove(id).is_some()
    }

    /// Derive a free text id from a display name. Collisions get a short
    /// uuid suffix; unusable names fall back to a plain uuid.
    #[instrument(level = "debug", skip(self), fields(%name))]
    pub async fn unique_text_id(&self, name: &str) -> String {
        let base = slugify(name);
        if base.is_empty() {
            return Uuid::new_v4().to_string();
        }
        let map = self.sequences.read().await;
        if !map.contains_key(&base) {
            return base;
        }
        format!("{}-{}", base, &Uuid::new_v4().to_string()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SequenceCfg;

    fn bank_entry(id: Option<&str>, name: &str, expression: &str) -> SequenceCfg {
        SequenceCfg {
            id: id.map(|s| s.to_string()),
            name: name.to_string(),
            description: None,
            formula: None,
            expression: expression.to_string(),
            color: None,
            fun_fact: None,
            seed: Some(vec![1]),
        }
    }

    #[tokio::test]
    async fn default_config_seeds_the_builtins() {
        let state = AppState::from_config(&AppConfig::default());
        let ids = state.list_ids().await;
        assert_eq!(ids, vec!["even", "fibonacci", "odd", "powers-of-two", "squares"]);
    }

    #[tokio::test]
    async fn bank_entries_take_precedence_over_builtins() {
        let mut cfg = AppConfig::default();
        cfg.sequences.push(bank_entry(Some("even"), "Config Evens", "2*n"));
        let state = AppState::from_config(&cfg);
        let even = state.get_sequence("even").await.expect("even");
        assert_eq!(even.name, "Config Evens");
        assert!(matches!(even.source, SequenceSource::ConfigBank));
        assert_eq!(state.list_ids().await.len(), 5);
    }

    #[tokio::test]
    async fn invalid_bank_expressions_are_skipped() {
        let mut cfg = AppConfig::default();
        cfg.sequences.push(bank_entry(Some("broken"), "Broken", "(1+"));
        let state = AppState::from_config(&cfg);
        assert!(state.get_sequence("broken").await.is_none());
    }

    #[tokio::test]
    async fn bank_entries_without_ids_get_slugs() {
        let mut cfg = AppConfig::default();
        cfg.sequences.push(bank_entry(None, "Lucas Numbers", "history[n-1]+history[n-2]"));
        let state = AppState::from_config(&cfg);
        assert!(state.get_sequence("lucas-numbers").await.is_some());
    }

    #[tokio::test]
    async fn unique_text_id_suffixes_on_collision() {
        let state = AppState::from_config(&AppConfig::default());
        let fresh = state.unique_text_id("Lucas Numbers").await;
        assert_eq!(fresh, "lucas-numbers");
        let taken = state.unique_text_id("Even").await;
        assert!(taken.starts_with("even-"));
        assert_eq!(taken.len(), "even-".len() + 8);
    }

    #[tokio::test]
    async fn update_and_remove_round_trip() {
        let state = AppState::from_config(&AppConfig::default());
        let updated = state
            .update_sequence("even", |s| s.name = "Renamed".to_string())
            .await
            .expect("update");
        assert_eq!(updated.name, "Renamed");
        assert!(state.remove_sequence("even").await);
        assert!(!state.remove_sequence("even").await);
        assert!(state.get_sequence("even").await.is_none());
    }
}

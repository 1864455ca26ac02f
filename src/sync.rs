use std::collections::{HashMap, HashSet};
use std::fs;
use std::thread;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::config::{DocumentSource, SyncConfig};
use crate::field_map::{build_field_map, field_data};
use crate::http_client::fetch_page;
use crate::standings::extract_all_tables;
use crate::store::CollectionStore;
use crate::table_select::{normalize_name, select_best_table};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub tables_found: usize,
    pub table_index: usize,
    pub score: usize,
    pub updated: usize,
    pub created: usize,
    pub skipped: usize,
    pub published: usize,
    /// Store items with no row in the selected table.
    pub missing_from_page: Vec<String>,
}

pub fn load_document(source: &DocumentSource) -> Result<String> {
    match source {
        DocumentSource::Url(url) => fetch_page(url),
        DocumentSource::File(path) => fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display())),
    }
}

/// Writes the standings found in `document` into `store`.
pub fn run_sync<S: CollectionStore + ?Sized>(
    cfg: &SyncConfig,
    document: &str,
    store: &S,
) -> Result<SyncSummary> {
    let fields = store.schema_fields()?;
    let field_map = build_field_map(&fields);
    let unmapped = field_map.unmapped();
    if field_map.is_empty() {
        log::warn!("schema maps none of the standings fields");
    } else if !unmapped.is_empty() {
        let keys = unmapped.iter().map(|a| a.key()).collect::<Vec<_>>();
        log::info!("schema has no field for: {}", keys.join(", "));
    }

    let items = store.list_items()?;
    let mut ids_by_name: HashMap<String, String> = HashMap::new();
    let mut display_names: HashMap<String, String> = HashMap::new();
    for item in items {
        let key = normalize_name(&item.name);
        if key.is_empty() {
            continue;
        }
        display_names.insert(key.clone(), item.name);
        ids_by_name.insert(key, item.id);
    }
    let reference_names = ids_by_name.keys().cloned().collect::<HashSet<_>>();
    log::info!("store holds {} named item(s)", reference_names.len());

    let tables = extract_all_tables(document);
    if tables.is_empty() {
        return Err(anyhow!("no tables found in document"));
    }
    let selection = select_best_table(&tables, &reference_names)
        .ok_or_else(|| anyhow!("no table matched any known team name ({} checked)", tables.len()))?;
    log::info!(
        "using table {} of {}: {} row(s), {} matched",
        selection.index,
        tables.len(),
        selection.records.len(),
        selection.score
    );
    for name in &selection.duplicates {
        log::warn!("team {name:?} appears more than once; the last row wins");
    }

    let mut summary = SyncSummary {
        tables_found: tables.len(),
        table_index: selection.index,
        score: selection.score,
        ..SyncSummary::default()
    };

    let mut written: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    let mut writes = 0usize;
    for record in &selection.records {
        let key = normalize_name(&record.name);
        seen.insert(key.clone());
        let mut data = field_data(record, &field_map);
        let existing = ids_by_name.get(&key).cloned();

        if existing.is_none() && !cfg.create_missing {
            log::info!("skipping {:?}: not in store", record.name);
            summary.skipped += 1;
            continue;
        }
        if writes > 0 && !cfg.dry_run {
            thread::sleep(cfg.write_delay);
        }
        writes += 1;

        match existing {
            Some(id) => {
                if cfg.dry_run {
                    log::info!("would update {:?} ({id}): {}", record.name, Value::Object(data));
                } else {
                    store.update_item(&id, data)?;
                    log::info!("updated {:?} ({id})", record.name);
                    written.push(id);
                }
                summary.updated += 1;
            }
            None => {
                data.insert("name".to_string(), Value::from(record.name.clone()));
                data.insert("slug".to_string(), Value::from(slugify(&record.name)));
                if cfg.dry_run {
                    log::info!("would create {:?}: {}", record.name, Value::Object(data));
                    // Stands in for the real id so a repeated name plans an update.
                    ids_by_name.insert(key, format!("planned-{}", summary.created + 1));
                } else {
                    let id = store.create_item(data)?;
                    log::info!("created {:?} ({id})", record.name);
                    ids_by_name.insert(key, id.clone());
                    written.push(id);
                }
                summary.created += 1;
            }
        }
    }

    let mut missing = display_names
        .iter()
        .filter(|(key, _)| !seen.contains(*key))
        .map(|(_, name)| name.clone())
        .collect::<Vec<_>>();
    missing.sort();
    for name in &missing {
        log::info!("store item {name:?} has no row in the standings table");
    }
    summary.missing_from_page = missing;

    // Duplicate rows write the same item twice; publish it once.
    let mut publish_ids = HashSet::new();
    written.retain(|id| publish_ids.insert(id.clone()));
    if cfg.publish && !cfg.dry_run && !written.is_empty() {
        store.publish_items(&written)?;
        log::info!("published {} item(s)", written.len());
        summary.published = written.len();
    }

    Ok(summary)
}

/// URL slug for a new item: lower-case, runs of other characters collapsed to `-`.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out
}

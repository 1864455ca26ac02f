use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::standings::{TeamRecord, extract_all_tables, parse_table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSelection {
    pub records: Vec<TeamRecord>,
    /// Records whose name is in the reference set.
    pub score: usize,
    /// 1-based position among all candidate tables. Diagnostic only.
    pub index: usize,
    /// Names appearing on more than one row of the winning table.
    pub duplicates: Vec<String>,
}

/// Key used when comparing team names across the page and the store.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Picks the candidate whose rows best match the known team names.
///
/// Candidates are parsed in parallel, but ranking walks them in document order and
/// only replaces the leader on a strictly higher score, so ties go to the earlier
/// table. Returns `None` when no candidate produces a row matching any name.
pub fn select_best_table<S: AsRef<str> + Sync>(
    candidates: &[S],
    reference_names: &HashSet<String>,
) -> Option<TableSelection> {
    let known = reference_names
        .iter()
        .map(|n| normalize_name(n))
        .collect::<HashSet<_>>();

    let parsed = candidates
        .par_iter()
        .map(|table| parse_table(table.as_ref()))
        .collect::<Vec<_>>();

    let mut best: Option<(usize, usize)> = None;
    for (idx, records) in parsed.iter().enumerate() {
        if records.is_empty() {
            continue;
        }
        let score = records
            .iter()
            .filter(|r| known.contains(&normalize_name(&r.name)))
            .count();
        log::debug!(
            "table {} of {}: {} rows, score {}",
            idx + 1,
            candidates.len(),
            records.len(),
            score
        );
        if let Some((_, best_score)) = best {
            if score <= best_score {
                continue;
            }
        }
        best = Some((idx, score));
    }

    let (idx, score) = best.filter(|(_, score)| *score > 0)?;
    let records = parsed.into_iter().nth(idx)?;
    let duplicates = duplicate_names(&records);
    Some(TableSelection {
        records,
        score,
        index: idx + 1,
        duplicates,
    })
}

/// Finds every table in `document` and selects the standings table among them.
pub fn extract_standings(
    document: &str,
    reference_names: &HashSet<String>,
) -> Option<TableSelection> {
    let tables = extract_all_tables(document);
    log::debug!("found {} table(s) in document", tables.len());
    select_best_table(&tables, reference_names)
}

/// Names (as first written) that occur on more than one record, in first-seen order.
pub fn duplicate_names(records: &[TeamRecord]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for r in records {
        *counts.entry(normalize_name(&r.name)).or_default() += 1;
    }
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| {
            let key = normalize_name(&r.name);
            counts.get(&key).copied().unwrap_or(0) > 1 && seen.insert(key)
        })
        .map(|r| r.name.clone())
        .collect()
}

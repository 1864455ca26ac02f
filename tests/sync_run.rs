use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde_json::{Map, Value, json};

use standings_sync::config::{DocumentSource, SyncConfig};
use standings_sync::field_map::SchemaField;
use standings_sync::store::{CollectionStore, StoreItem};
use standings_sync::sync::run_sync;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[derive(Default)]
struct FakeStore {
    items: Vec<StoreItem>,
    updates: RefCell<Vec<(String, Value)>>,
    creates: RefCell<Vec<Value>>,
    published: RefCell<Vec<Vec<String>>>,
}

impl FakeStore {
    fn with_teams(names: &[&str]) -> Self {
        Self {
            items: names
                .iter()
                .enumerate()
                .map(|(i, name)| StoreItem {
                    id: format!("item-{i}"),
                    name: name.to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }
}

impl CollectionStore for FakeStore {
    fn schema_fields(&self) -> Result<Vec<SchemaField>> {
        let raw = json!([
            {"displayName": "Name", "slug": "name"},
            {"displayName": "Position", "slug": "position"},
            {"displayName": "Played", "slug": "played"},
            {"displayName": "Wins", "slug": "wins"},
            {"displayName": "OT Wins", "slug": "ot-wins"},
            {"displayName": "OT Losses", "slug": "ot-losses"},
            {"displayName": "Losses", "slug": "losses"},
            {"displayName": "Goals For", "slug": "goals-for"},
            {"displayName": "Points", "slug": "points"}
        ]);
        Ok(serde_json::from_value(raw)?)
    }

    fn list_items(&self) -> Result<Vec<StoreItem>> {
        Ok(self.items.clone())
    }

    fn update_item(&self, id: &str, field_data: Map<String, Value>) -> Result<()> {
        self.updates
            .borrow_mut()
            .push((id.to_string(), Value::Object(field_data)));
        Ok(())
    }

    fn create_item(&self, field_data: Map<String, Value>) -> Result<String> {
        let mut creates = self.creates.borrow_mut();
        creates.push(Value::Object(field_data));
        Ok(format!("new-{}", creates.len()))
    }

    fn publish_items(&self, ids: &[String]) -> Result<()> {
        self.published.borrow_mut().push(ids.to_vec());
        Ok(())
    }
}

fn config() -> SyncConfig {
    SyncConfig {
        source: DocumentSource::File(PathBuf::from("unused.html")),
        api_base: "http://localhost".to_string(),
        api_token: "token".to_string(),
        collection_id: "teams".to_string(),
        write_delay: Duration::ZERO,
        create_missing: true,
        publish: true,
        dry_run: false,
    }
}

#[test]
fn updates_known_teams_and_creates_the_rest() {
    let html = read_fixture("standings_page.html");
    let store = FakeStore::with_teams(&["Owls", "bears", "Hawks & Co", "North Stars", "Retired FC"]);
    let summary = run_sync(&config(), &html, &store).expect("sync");

    assert_eq!(summary.tables_found, 5);
    assert_eq!(summary.table_index, 3);
    assert_eq!(summary.score, 4);
    assert_eq!(summary.updated, 4);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.missing_from_page, ["Retired FC"]);

    let updates = store.updates.borrow();
    assert_eq!(updates[0].0, "item-0");
    assert_eq!(
        updates[0].1,
        json!({
            "position": 1, "played": 12, "wins": 9, "ot-wins": 1,
            "ot-losses": 0, "losses": 2, "goals-for": 48, "points": 29
        })
    );
    assert_eq!(updates[2].0, "item-2");

    let creates = store.creates.borrow();
    assert_eq!(creates.len(), 2);
    assert_eq!(creates[0]["name"], "Falcons");
    assert_eq!(creates[0]["slug"], "falcons");
    assert_eq!(creates[1]["points"], 4);

    let published = store.published.borrow();
    assert_eq!(published.len(), 1);
    assert_eq!(
        published[0],
        ["item-0", "item-1", "item-2", "item-3", "new-1", "new-2"]
    );
    assert_eq!(summary.published, 6);
}

#[test]
fn dry_run_writes_nothing() {
    let html = read_fixture("standings_page.html");
    let store = FakeStore::with_teams(&["Owls", "Bears"]);
    let mut cfg = config();
    cfg.dry_run = true;
    let summary = run_sync(&cfg, &html, &store).expect("sync");

    assert_eq!(summary.updated, 2);
    assert_eq!(summary.created, 4);
    assert_eq!(summary.published, 0);
    assert!(store.updates.borrow().is_empty());
    assert!(store.creates.borrow().is_empty());
    assert!(store.published.borrow().is_empty());
}

#[test]
fn missing_teams_are_skipped_without_create() {
    let html = read_fixture("standings_page.html");
    let store = FakeStore::with_teams(&["Owls", "Lynx"]);
    let mut cfg = config();
    cfg.create_missing = false;
    cfg.publish = false;
    let summary = run_sync(&cfg, &html, &store).expect("sync");

    assert_eq!(summary.updated, 2);
    assert_eq!(summary.skipped, 4);
    assert!(store.creates.borrow().is_empty());
    assert!(store.published.borrow().is_empty());
}

#[test]
fn unmatched_page_is_an_error() {
    let html = read_fixture("standings_page.html");
    let store = FakeStore::with_teams(&["Sharks"]);
    let err = run_sync(&config(), &html, &store).expect_err("no match");
    assert!(err.to_string().contains("no table matched"));

    let err = run_sync(&config(), "<p>maintenance</p>", &store).expect_err("no tables");
    assert!(err.to_string().contains("no tables found"));
    assert!(store.updates.borrow().is_empty());
}

fn duplicate_page() -> String {
    let row = |pos: u32, name: &str, points: u32| {
        format!(
            "<tr><td>{pos}</td><td>{name}</td><td>4</td><td>2</td><td>0</td><td>0</td>\
             <td>2</td><td>9</td><td>8</td><td>{points}</td></tr>"
        )
    };
    format!(
        "<table>{}{}{}</table>",
        row(1, "Owls", 6),
        row(2, "New", 5),
        row(3, "new", 1)
    )
}

#[test]
fn repeated_name_writes_last_row_and_publishes_once() {
    let store = FakeStore::with_teams(&["Owls"]);
    let summary = run_sync(&config(), &duplicate_page(), &store).expect("sync");

    assert_eq!(summary.updated, 2);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.published, 2);

    let creates = store.creates.borrow();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0]["name"], "New");
    assert_eq!(creates[0]["points"], 5);

    let updates = store.updates.borrow();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].0, "item-0");
    assert_eq!(updates[1].0, "new-1");
    assert_eq!(updates[1].1["position"], 3);
    assert_eq!(updates[1].1["points"], 1);

    let published = store.published.borrow();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0], ["item-0", "new-1"]);
}

#[test]
fn dry_run_counts_repeated_new_name_as_one_create() {
    let store = FakeStore::with_teams(&["Owls"]);
    let mut cfg = config();
    cfg.dry_run = true;
    let summary = run_sync(&cfg, &duplicate_page(), &store).expect("sync");

    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.published, 0);
    assert!(store.creates.borrow().is_empty());
    assert!(store.updates.borrow().is_empty());
}

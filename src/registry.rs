//! The Designer-Config Registry (spec §4.2): a dictionary-like accessor over
//! ~150 JSON configuration tables, keyed by table name. Grounded directly in
//! `original_source/sandrock/lib/designer_config.py`'s
//! `_DesignerConfigLoader`/`_DesignerConfigWrapper`, and in shape on
//! `amtep-ck3-tiger/src/db.rs`'s `Db`: a single generic indexing primitive,
//! with narrow table-specific wrappers layered on top in `src/tables.rs`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use crate::error::AtlasError;
use crate::helpers::FnvHashMap;

/// Whether a table's records have a numeric `id`/`ID` field (keyed) or not
/// (an ordered list), decided at first load by probing the first record —
/// matching `load_designer_config`'s `isinstance(configs[0].get('id'), int)`
/// check exactly.
#[derive(Debug, Clone)]
pub enum TableView {
    Keyed(BTreeMap<i64, Value>),
    List(Vec<Value>),
}

impl TableView {
    pub fn get(&self, id: i64) -> Option<&Value> {
        match self {
            TableView::Keyed(map) => map.get(&id),
            TableView::List(_) => None,
        }
    }

    pub fn contains_id(&self, id: i64) -> bool {
        match self {
            TableView::Keyed(map) => map.contains_key(&id),
            TableView::List(_) => false,
        }
    }

    /// Iterates in stable order: sorted by id when keyed, original file
    /// order otherwise — matching spec §4.2's iteration-order guarantee.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            TableView::Keyed(map) => Box::new(map.values()),
            TableView::List(list) => Box::new(list.iter()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TableView::Keyed(map) => map.len(),
            TableView::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads one designer-config JSON file of the shape
/// `{ "configList": [ {record...}, ... ] }` (spec §6) and decides whether it
/// is keyed or a plain list.
fn build_table_view(config_list: Vec<Value>) -> TableView {
    let is_keyed = config_list
        .first()
        .map(|first| {
            first.get("id").and_then(Value::as_i64).is_some()
                || first.get("ID").and_then(Value::as_i64).is_some()
        })
        .unwrap_or(false);

    if !is_keyed {
        return TableView::List(config_list);
    }

    let mut map = BTreeMap::new();
    for record in config_list {
        let id = record
            .get("id")
            .and_then(Value::as_i64)
            .or_else(|| record.get("ID").and_then(Value::as_i64));
        if let Some(id) = id {
            map.insert(id, record);
        }
    }
    TableView::Keyed(map)
}

/// The registry itself: memoizes tables by name, reading from
/// `<assets_root>/designer_config/<table>.json` on first access.
pub struct Registry {
    root: PathBuf,
    cache: Mutex<FnvHashMap<String, TableView>>,
}

impl Registry {
    pub fn new(designer_config_root: impl Into<PathBuf>) -> Registry {
        Registry { root: designer_config_root.into(), cache: Mutex::new(FnvHashMap::default()) }
    }

    fn path_for(&self, table: &str) -> PathBuf {
        self.root.join(format!("{table}.json"))
    }

    /// Loads (if necessary) and returns a cloned `TableView` for `table`.
    /// Cloning a `BTreeMap<i64, Value>`/`Vec<Value>` is not free, but it
    /// keeps the lock scope tight and callers uncoupled from the mutex;
    /// tables are read a handful of times per run, not in a hot loop.
    pub fn table(&self, table: &str) -> Result<TableView, AtlasError> {
        if let Some(view) = self.cache.lock().expect("registry cache poisoned").get(table) {
            return Ok(view.clone());
        }

        let path = self.path_for(table);
        let text = std::fs::read_to_string(&path).map_err(|_| AtlasError::AssetNotFound { path: path.clone() })?;
        let parsed: Value = serde_json::from_str(&text).map_err(|e| AtlasError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let config_list = parsed
            .get("configList")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| AtlasError::SchemaMismatch {
                context: format!("table {table}"),
                expected: "object with a configList array".to_string(),
                found: parsed_kind(&parsed).to_string(),
            })?;

        let view = build_table_view(config_list);
        self.cache
            .lock()
            .expect("registry cache poisoned")
            .insert(table.to_string(), view.clone());
        Ok(view)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn parsed_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyed_table_probes_lowercase_id() {
        let list = vec![json!({"id": 2, "x": 1}), json!({"id": 1, "x": 2})];
        let view = build_table_view(list);
        match view {
            TableView::Keyed(map) => {
                assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
            }
            TableView::List(_) => panic!("expected a keyed view"),
        }
    }

    #[test]
    fn keyed_table_probes_uppercase_id() {
        let list = vec![json!({"ID": 5, "x": 1})];
        let view = build_table_view(list);
        assert!(view.contains_id(5));
    }

    #[test]
    fn unkeyed_table_stays_a_list_in_original_order() {
        let list = vec![json!({"x": 1}), json!({"x": 2})];
        let view = build_table_view(list);
        match view {
            TableView::List(items) => assert_eq!(items.len(), 2),
            TableView::Keyed(_) => panic!("expected a list view"),
        }
    }

    #[test]
    fn loads_and_memoizes_a_table_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Widget.json"),
            r#"{"configList":[{"id":1,"name":"a"},{"id":2,"name":"b"}]}"#,
        )
        .unwrap();
        let registry = Registry::new(dir.path());
        let view = registry.table("Widget").unwrap();
        assert_eq!(view.len(), 2);
        assert!(view.contains_id(1));
        // Second call hits the memoized cache; same content either way.
        let view_again = registry.table("Widget").unwrap();
        assert_eq!(view_again.len(), 2);
    }

    #[test]
    fn missing_table_is_an_asset_not_found_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(dir.path());
        let err = registry.table("DoesNotExist").unwrap_err();
        assert!(matches!(err, AtlasError::AssetNotFound { .. }));
    }
}

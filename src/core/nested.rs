use crate::domain::model::{is_object_list, Record};
use serde_json::Value;

pub const PARENT_ID_KEY: &str = "parent_id";
pub const MISSING_PARENT_ID: &str = "unknown";

/// Items of one object-list field gathered across all records.
#[derive(Debug, Clone, PartialEq)]
pub struct SideTable {
    pub field: String,
    pub items: Vec<Record>,
}

/// Collects every top-level object-list field into a side-table, tagging each
/// item with its owner's `id`. Tables are returned in first-seen field order.
pub fn collect_side_tables(records: &[Record]) -> Vec<SideTable> {
    let mut tables: Vec<SideTable> = Vec::new();

    for record in records {
        let parent_id = record
            .get("id")
            .cloned()
            .unwrap_or_else(|| Value::String(MISSING_PARENT_ID.to_string()));

        for (field, value) in &record.data {
            let Value::Array(items) = value else {
                continue;
            };
            if !is_object_list(items) {
                continue;
            }

            let position = match tables.iter().position(|t| &t.field == field) {
                Some(position) => position,
                None => {
                    tables.push(SideTable {
                        field: field.clone(),
                        items: Vec::new(),
                    });
                    tables.len() - 1
                }
            };

            for (index, item) in items.iter().enumerate() {
                let Value::Object(item) = item else {
                    tracing::warn!(
                        "⚠️ Skipping non-object item {} of '{}' (parent_id {})",
                        index,
                        field,
                        parent_id
                    );
                    continue;
                };
                let mut tagged = item.clone();
                tagged.insert(PARENT_ID_KEY.to_string(), parent_id.clone());
                tables[position].items.push(Record::new(tagged));
            }
        }
    }

    tables
}

/// File-name safe form of a field name.
pub fn sanitize_field_name(field: &str) -> String {
    field.replace(['.', '/', '\\'], "_")
}

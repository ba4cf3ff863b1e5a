//! Defensive conversion of untrusted JSON into domain records.
//!
//! Everything read from the store, from an import file, or from a backup
//! snapshot passes through here. These functions are pure and never fail:
//! invalid fragments are dropped (or repaired where a sensible default
//! exists) and the caller gets whatever survived.
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`normalize_item`] | `{description, tags}` | `Option<Item>` |
//! | [`normalize_tote`] | `{id, number/label, room, date, items, imageUrl}` | `Option<Tote>` |
//! | [`normalize_rooms`] | `["name", ...]` or `[{name, icon}, ...]` | rooms + migrated flag |
//! | [`normalize_import_payload`] | `{totes, rooms}` | totes, rooms, warnings |

use serde_json::{Map, Value};

use crate::models::{Item, Room, Tote};

/// Result of [`normalize_rooms`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedRooms {
    pub rooms: Vec<Room>,
    /// True when any entry had to be upgraded (bare string or missing icon),
    /// meaning the caller should persist the upgraded form.
    pub migrated: bool,
    /// Entries that could not be turned into a room.
    pub skipped: usize,
}

/// Result of [`normalize_import_payload`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportPayload {
    pub totes: Vec<Tote>,
    pub rooms: Vec<Room>,
    /// Whether the file carried a `rooms` array at all. Only then should an
    /// import replace the existing room list.
    pub has_rooms: bool,
    pub warnings: Vec<String>,
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn first_non_empty(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| non_empty_string(map.get(*k)))
}

/// Finite, integral JSON number as `i64`.
fn integral_id(value: Option<&Value>) -> Option<i64> {
    let Some(Value::Number(n)) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Split a comma-joined tag string, trimming and lower-casing each tag.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Normalize a `tags` field given either as an array of strings or as one
/// comma-joined string. Non-string array entries are dropped.
pub fn normalize_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_str)
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::String(s)) => parse_tag_list(s),
        _ => Vec::new(),
    }
}

pub fn normalize_item(raw: &Value) -> Option<Item> {
    let map = raw.as_object()?;
    let description = non_empty_string(map.get("description"))?;
    Some(Item {
        description,
        tags: normalize_tags(map.get("tags")),
    })
}

/// Normalize one stored or imported tote.
///
/// Requires a finite integral `id` and non-empty `number` (or `label`),
/// `room` and `date` (or `createdDate`). A missing or malformed `items`
/// field becomes an empty list; invalid items are dropped one by one.
pub fn normalize_tote(raw: &Value) -> Option<Tote> {
    let map = raw.as_object()?;
    let id = integral_id(map.get("id"))?;
    let label = first_non_empty(map, &["number", "label"])?;
    let room = non_empty_string(map.get("room"))?;
    let created_date = first_non_empty(map, &["date", "createdDate"])?;

    let items = match map.get("items") {
        Some(Value::Array(entries)) => entries.iter().filter_map(normalize_item).collect(),
        _ => Vec::new(),
    };

    let image_url = map
        .get("imageUrl")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);

    Some(Tote {
        id,
        label,
        room,
        items,
        image_url,
        created_date,
    })
}

/// Normalize the stored room list.
///
/// Accepts the legacy form (bare name strings) and the current form
/// (`{name, icon}` objects), mixed freely. Bare names and objects without
/// an icon get `default_icon` and set `migrated`.
pub fn normalize_rooms(raw: &Value, default_icon: &str) -> NormalizedRooms {
    let Some(entries) = raw.as_array() else {
        return NormalizedRooms::default();
    };

    let mut out = NormalizedRooms::default();
    for entry in entries {
        match entry {
            Value::String(_) => match non_empty_string(Some(entry)) {
                Some(name) => {
                    out.rooms.push(Room {
                        name,
                        icon: default_icon.to_string(),
                    });
                    out.migrated = true;
                }
                None => out.skipped += 1,
            },
            Value::Object(map) => {
                let Some(name) = non_empty_string(map.get("name")) else {
                    out.skipped += 1;
                    continue;
                };
                let icon = match non_empty_string(map.get("icon")) {
                    Some(icon) => icon,
                    None => {
                        out.migrated = true;
                        default_icon.to_string()
                    }
                };
                out.rooms.push(Room { name, icon });
            }
            _ => out.skipped += 1,
        }
    }
    out
}

/// Normalize a bulk import object `{ totes, rooms, exportDate? }`.
///
/// Never rejects the file as a whole. Every problem becomes a
/// human-readable warning and the valid remainder is returned.
pub fn normalize_import_payload(raw: &Value, default_icon: &str) -> ImportPayload {
    let mut payload = ImportPayload::default();
    let Some(map) = raw.as_object() else {
        payload
            .warnings
            .push("Import file is not a valid JSON object.".to_string());
        return payload;
    };

    match map.get("totes") {
        Some(Value::Array(entries)) => {
            let mut invalid = 0usize;
            for entry in entries {
                match normalize_tote(entry) {
                    Some(tote) => payload.totes.push(tote),
                    None => invalid += 1,
                }
            }
            if invalid > 0 {
                payload
                    .warnings
                    .push(format!("{} tote(s) skipped due to invalid data.", invalid));
            }
        }
        _ => payload
            .warnings
            .push("No totes array found in import.".to_string()),
    }

    match map.get("rooms") {
        Some(rooms @ Value::Array(_)) => {
            let normalized = normalize_rooms(rooms, default_icon);
            payload.has_rooms = true;
            if normalized.skipped > 0 {
                payload.warnings.push(format!(
                    "{} room(s) skipped due to invalid data.",
                    normalized.skipped
                ));
            }
            if normalized.migrated {
                payload
                    .warnings
                    .push("Some rooms were normalized to the current format.".to_string());
            }
            payload.rooms = normalized.rooms;
        }
        _ => payload
            .warnings
            .push("No rooms array found in import.".to_string()),
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_tote_json() -> Value {
        json!({
            "id": 1717171717171i64,
            "number": "Tote 7",
            "room": "Garage",
            "date": "6/1/2024",
            "imageUrl": "data:image/jpeg;base64,AAAA",
            "items": [
                {"description": "Cordless drill", "tags": ["tools", "power"]},
                {"description": "Extension cord", "tags": ["electrical"]}
            ]
        })
    }

    #[test]
    fn item_requires_description() {
        assert!(normalize_item(&json!({"description": "   ", "tags": []})).is_none());
        assert!(normalize_item(&json!({"tags": ["a"]})).is_none());
        assert!(normalize_item(&json!("Drill")).is_none());
    }

    #[test]
    fn item_tags_from_comma_string() {
        let item = normalize_item(&json!({"description": " Drill ", "tags": "Tools, ,POWER "}))
            .unwrap();
        assert_eq!(item.description, "Drill");
        assert_eq!(item.tags, vec!["tools", "power"]);
    }

    #[test]
    fn item_tags_array_drops_non_strings_and_empties() {
        let item = normalize_item(&json!({"description": "Drill", "tags": ["A", 3, "", null, " b "]}))
            .unwrap();
        assert_eq!(item.tags, vec!["a", "b"]);
    }

    #[test]
    fn item_duplicate_tags_are_kept() {
        let item = normalize_item(&json!({"description": "Drill", "tags": ["x", "X"]})).unwrap();
        assert_eq!(item.tags, vec!["x", "x"]);
    }

    #[test]
    fn tote_round_trip_preserves_fields() {
        let tote = normalize_tote(&valid_tote_json()).unwrap();
        let reserialized = serde_json::to_value(&tote).unwrap();
        let again = normalize_tote(&reserialized).unwrap();
        assert_eq!(tote, again);
        assert_eq!(again.id, 1717171717171);
        assert_eq!(again.label, "Tote 7");
        assert_eq!(again.items.len(), 2);
        assert_eq!(again.items[0].tags, vec!["tools", "power"]);
    }

    #[test]
    fn tote_rejects_missing_required_fields() {
        for field in ["id", "number", "room", "date"] {
            let mut raw = valid_tote_json();
            raw.as_object_mut().unwrap().remove(field);
            assert!(normalize_tote(&raw).is_none(), "missing {} accepted", field);
        }
    }

    #[test]
    fn tote_rejects_non_numeric_or_fractional_id() {
        let mut raw = valid_tote_json();
        raw["id"] = json!("123");
        assert!(normalize_tote(&raw).is_none());
        raw["id"] = json!(1.5);
        assert!(normalize_tote(&raw).is_none());
        raw["id"] = json!(12.0);
        assert_eq!(normalize_tote(&raw).unwrap().id, 12);
    }

    #[test]
    fn tote_drops_invalid_items_only() {
        let mut raw = valid_tote_json();
        raw["items"] = json!([{"description": "ok"}, {"description": ""}, 42, null]);
        let tote = normalize_tote(&raw).unwrap();
        assert_eq!(tote.items.len(), 1);
        assert_eq!(tote.items[0].description, "ok");
    }

    #[test]
    fn tote_malformed_items_default_to_empty() {
        let mut raw = valid_tote_json();
        raw["items"] = json!("not a list");
        assert!(normalize_tote(&raw).unwrap().items.is_empty());
    }

    #[test]
    fn tote_blank_image_url_is_dropped() {
        let mut raw = valid_tote_json();
        raw["imageUrl"] = json!("  ");
        assert!(normalize_tote(&raw).unwrap().image_url.is_none());
    }

    #[test]
    fn tote_accepts_label_and_created_date_names() {
        let raw = json!({"id": 1, "label": "Bin", "room": "Attic", "createdDate": "2024"});
        let tote = normalize_tote(&raw).unwrap();
        assert_eq!(tote.label, "Bin");
        assert_eq!(tote.created_date, "2024");
    }

    #[test]
    fn legacy_room_strings_are_upgraded() {
        let out = normalize_rooms(&json!(["Garage", " Attic ", "", "Kitchen"]), "🏠");
        assert!(out.migrated);
        assert_eq!(out.rooms.len(), 3);
        assert!(out.rooms.iter().all(|r| r.icon == "🏠"));
        assert_eq!(out.rooms[1].name, "Attic");
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn current_rooms_are_not_migrated() {
        let out = normalize_rooms(
            &json!([{"name": "Garage", "icon": "🚗"}, {"name": "Den", "icon": "📚"}]),
            "🏠",
        );
        assert!(!out.migrated);
        assert_eq!(out.rooms[0].icon, "🚗");
    }

    #[test]
    fn room_without_icon_gets_default_and_flags_migration() {
        let out = normalize_rooms(&json!([{"name": "Garage"}, {"icon": "x"}]), "📦");
        assert!(out.migrated);
        assert_eq!(out.rooms, vec![Room { name: "Garage".into(), icon: "📦".into() }]);
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn rooms_non_array_is_empty() {
        let out = normalize_rooms(&json!({"name": "Garage"}), "🏠");
        assert!(out.rooms.is_empty());
        assert!(!out.migrated);
    }

    #[test]
    fn import_accumulates_warnings() {
        let raw = json!({
            "totes": [valid_tote_json(), {"id": "bad"}, {}],
            "rooms": ["Garage"]
        });
        let payload = normalize_import_payload(&raw, "🏠");
        assert_eq!(payload.totes.len(), 1);
        assert_eq!(payload.rooms.len(), 1);
        assert!(payload.has_rooms);
        assert!(payload
            .warnings
            .contains(&"2 tote(s) skipped due to invalid data.".to_string()));
        assert!(payload
            .warnings
            .contains(&"Some rooms were normalized to the current format.".to_string()));
    }

    #[test]
    fn import_missing_arrays_warns() {
        let payload = normalize_import_payload(&json!({"exportDate": "x"}), "🏠");
        assert!(payload.totes.is_empty());
        assert!(!payload.has_rooms);
        assert_eq!(payload.warnings.len(), 2);
    }

    #[test]
    fn import_non_object_warns() {
        let payload = normalize_import_payload(&json!([1, 2]), "🏠");
        assert_eq!(payload.warnings, vec!["Import file is not a valid JSON object."]);
    }
}

//! Layout document: the persisted form of a whole layout.
//!
//! Used for save/load, crash recovery and undo snapshots. Loading always
//! builds a fresh layout and swaps it in only once every part parsed, so
//! a bad document never leaves a half-populated layout behind.
//!
//! Lengths are written as plain numbers. Earlier files stored CSS pixel
//! strings (`"120px"`), which the reader still accepts.

use std::collections::HashSet;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SeatingError};
use crate::guests::{guest_from_columns, GuestRow, ID_COLUMN};
use crate::layout::{Layout, TableTemplate};
use crate::types::{ChairRef, DecorItem, Guest, HeadSeating, ItemKind, Point, Shape, Size};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLength {
    Number(f64),
    Text(String),
}

fn parse_px(text: &str) -> Option<f64> {
    let t = text.trim();
    t.strip_suffix("px").unwrap_or(t).trim().parse().ok()
}

fn length<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    let value = match RawLength::deserialize(d)? {
        RawLength::Number(n) => n,
        RawLength::Text(s) => {
            parse_px(&s).ok_or_else(|| de::Error::custom(format!("invalid length {s:?}")))?
        }
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(de::Error::custom("length must be finite"))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Text(String),
    Number(serde_json::Number),
}

fn label<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(match RawLabel::deserialize(d)? {
        RawLabel::Text(s) => s,
        RawLabel::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallroomDoc {
    #[serde(deserialize_with = "length")]
    pub width: f64,
    #[serde(deserialize_with = "length")]
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeatDoc {
    /// Guest id, or a display name in hand-edited files. Empty when free.
    #[serde(default)]
    pub guest: String,
    #[serde(default)]
    pub party: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDoc {
    #[serde(deserialize_with = "label")]
    pub id: String,
    pub shape: Shape,
    #[serde(deserialize_with = "length")]
    pub width: f64,
    #[serde(deserialize_with = "length")]
    pub height: f64,
    #[serde(deserialize_with = "length")]
    pub left: f64,
    #[serde(deserialize_with = "length")]
    pub top: f64,
    #[serde(rename = "useHeads", default, skip_serializing_if = "Option::is_none")]
    pub use_heads: Option<bool>,
    #[serde(rename = "headSeats", default, skip_serializing_if = "Option::is_none")]
    pub head_seats: Option<i64>,
    #[serde(default)]
    pub seats: Vec<SeatDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDoc {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(deserialize_with = "length")]
    pub width: f64,
    #[serde(deserialize_with = "length")]
    pub height: f64,
    #[serde(deserialize_with = "length")]
    pub left: f64,
    #[serde(deserialize_with = "length")]
    pub top: f64,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub ballroom: BallroomDoc,
    #[serde(default)]
    pub guests: Vec<GuestRow>,
    #[serde(default)]
    pub tables: Vec<TableDoc>,
    #[serde(default)]
    pub items: Vec<ItemDoc>,
}

impl LayoutDocument {
    /// Parse a document. Missing or mistyped fields are `MalformedDocument`;
    /// text that is not JSON at all is `Json`.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| match e.classify() {
            serde_json::error::Category::Data => SeatingError::MalformedDocument(e.to_string()),
            _ => SeatingError::Json(e),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn guest_record(guest: &Guest) -> GuestRow {
    let mut record = guest.columns.clone();
    record.insert(ID_COLUMN.to_string(), guest.id.clone());
    record
}

fn guest_from_record(mut record: GuestRow, index: usize) -> Guest {
    let id = record
        .shift_remove(ID_COLUMN)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("g{index}"));
    guest_from_columns(id, record)
}

impl Layout {
    /// Snapshot the layout as a document.
    pub fn to_document(&self) -> LayoutDocument {
        let tables = self
            .tables
            .values()
            .map(|t| {
                let rect = t.shape == Shape::Rectangular;
                TableDoc {
                    id: t.label.clone(),
                    shape: t.shape,
                    width: t.size.width,
                    height: t.size.height,
                    left: t.position.x,
                    top: t.position.y,
                    use_heads: rect.then_some(t.heads.use_heads),
                    head_seats: rect.then_some(i64::from(t.heads.per_head)),
                    seats: t
                        .chairs
                        .iter()
                        .map(|c| SeatDoc {
                            guest: c.guest.clone().unwrap_or_default(),
                            party: c.party.clone(),
                        })
                        .collect(),
                }
            })
            .collect();
        let items = self
            .items
            .iter()
            .map(|it| ItemDoc {
                kind: it.kind,
                width: it.size.width,
                height: it.size.height,
                left: it.position.x,
                top: it.position.y,
                text: it.label.clone(),
            })
            .collect();
        LayoutDocument {
            ballroom: BallroomDoc {
                width: self.ballroom.width,
                height: self.ballroom.height,
            },
            guests: self.roster.iter().map(guest_record).collect(),
            tables,
            items,
        }
    }

    /// Replace the whole layout with the contents of `doc`.
    ///
    /// Chair references resolve by guest id first, then by display name
    /// (first match wins). References matching no guest are kept as
    /// orphans showing the stored text.
    pub fn load_document(&mut self, doc: LayoutDocument) -> Result<()> {
        let mut fresh = Layout::new(self.params.clone());
        fresh.ballroom = Size::new(doc.ballroom.width, doc.ballroom.height);
        fresh.replace_roster(
            doc.guests
                .into_iter()
                .enumerate()
                .map(|(i, record)| guest_from_record(record, i))
                .collect(),
        );

        let mut seated: HashSet<String> = HashSet::new();
        for table in doc.tables {
            let heads = match table.shape {
                Shape::Rectangular => {
                    let per_head =
                        u32::try_from(table.head_seats.unwrap_or(0).max(0)).unwrap_or(u32::MAX);
                    HeadSeating::new(table.use_heads.unwrap_or(false), per_head)
                }
                _ => HeadSeating::none(),
            };
            let key = fresh.insert_table(&TableTemplate {
                seat_count: table.seats.len(),
                shape: table.shape,
                size: Size::new(table.width, table.height),
                position: Point::new(table.left, table.top),
                heads,
            });
            fresh.rename_table(key, &table.id)?;

            for (index, seat) in table.seats.iter().enumerate() {
                if seat.guest.is_empty() {
                    continue;
                }
                let (id, name) = match fresh.roster.resolve(&seat.guest) {
                    Some(g) => (g.id.clone(), g.name.clone()),
                    None => {
                        warn!(reference = seat.guest.as_str(), "seat references unknown guest");
                        (seat.guest.clone(), seat.guest.clone())
                    }
                };
                if !seated.insert(id.clone()) {
                    warn!(guest = id.as_str(), table = table.id.as_str(), "guest seated twice, keeping first");
                    continue;
                }
                fresh.assign(ChairRef::new(key, index), &id, &name, &seat.party)?;
            }
        }

        fresh.items = doc
            .items
            .into_iter()
            .map(|it| DecorItem {
                kind: it.kind,
                size: Size::new(it.width, it.height),
                position: Point::new(it.left, it.top),
                label: it.text,
            })
            .collect();

        info!(
            guests = fresh.roster.len(),
            tables = fresh.tables.len(),
            items = fresh.items.len(),
            "layout loaded"
        );
        *self = fresh;
        Ok(())
    }

    pub fn load_json(&mut self, text: &str) -> Result<()> {
        self.load_document(LayoutDocument::from_json(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_document().to_json()
    }
}

// -- Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TableKey;

    const LEGACY_JSON: &str = r#"{
        "ballroom": { "width": "1000px", "height": "700px" },
        "guests": [
            { "Guest Name": "Ada Lovelace", "Party ID": "Byron", "RSVP Response": "Yes", "Meal": "Fish", "__id": "g0" },
            { "Guest Name": "Annabella", "Party ID": "Byron", "__id": "g1" },
            { "Guest Name": "Charles Babbage", "Party ID": "" }
        ],
        "tables": [
            {
                "id": "7",
                "shape": "rectangular",
                "width": "130px",
                "height": "60px",
                "left": "200px",
                "top": "150px",
                "useHeads": true,
                "headSeats": 1,
                "seats": [
                    { "guest": "g0", "party": "Byron" },
                    { "guest": "Charles Babbage", "party": "" },
                    { "guest": "", "party": "" },
                    { "guest": "g9", "party": "Ghosts" },
                    { "guest": "g0", "party": "Byron" },
                    { "guest": "", "party": "" }
                ]
            },
            {
                "id": 12,
                "shape": "round",
                "width": 50,
                "height": 50,
                "left": 400,
                "top": 300,
                "seats": [ { "guest": "", "party": "" }, { "guest": "g1", "party": "Byron" } ]
            }
        ],
        "items": [
            { "type": "dancefloor", "width": "200px", "height": "200px", "left": "500px", "top": "20px", "text": "Dance!" }
        ]
    }"#;

    fn loaded() -> Layout {
        let mut layout = Layout::default();
        layout.load_json(LEGACY_JSON).expect("load");
        layout
    }

    #[test]
    fn legacy_pixel_strings_load() {
        let layout = loaded();
        assert_eq!(layout.ballroom(), Size::new(1000.0, 700.0));
        let tables: Vec<_> = layout.tables().collect();
        assert_eq!(tables.len(), 2);
        let t = tables[0];
        assert_eq!(t.label, "7");
        assert_eq!(t.shape, Shape::Rectangular);
        assert_eq!(t.size, Size::new(130.0, 60.0));
        assert_eq!(t.position, Point::new(200.0, 150.0));
        assert_eq!(t.heads, HeadSeating::new(true, 1));
        assert_eq!(tables[1].label, "12");
        assert_eq!(layout.items()[0].label, "Dance!");
        assert_eq!(layout.items()[0].kind, ItemKind::Dancefloor);
    }

    #[test]
    fn seats_resolve_by_id_then_name() {
        let layout = loaded();
        let t = layout.tables().next().expect("table");
        assert_eq!(t.chairs[0].guest.as_deref(), Some("g0"));
        assert_eq!(t.chairs[0].guest_name, "Ada Lovelace");
        // Charles has no stored id and received g2; his seat named him.
        assert_eq!(t.chairs[1].guest.as_deref(), Some("g2"));
        assert!(!t.chairs[2].is_occupied());
    }

    #[test]
    fn orphans_kept_and_duplicates_dropped() {
        let layout = loaded();
        let t = layout.tables().next().expect("table");
        assert_eq!(t.chairs[3].guest.as_deref(), Some("g9"));
        assert_eq!(t.chairs[3].guest_name, "g9");
        assert!(t.party_colors.contains_key("Ghosts"));
        assert!(!t.chairs[4].is_occupied());
        assert_eq!(layout.find_chair_of("g0"), Some(ChairRef::new(t.key, 0)));
    }

    #[test]
    fn colors_cover_loaded_parties() {
        let layout = loaded();
        let t = layout.tables().next().expect("table");
        let mut keys: Vec<&str> = t.party_colors.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, ["", "Byron", "Ghosts"]);
    }

    #[test]
    fn missing_ballroom_is_malformed() {
        let mut layout = loaded();
        let err = layout.load_json(r#"{ "tables": [] }"#).unwrap_err();
        assert!(matches!(err, SeatingError::MalformedDocument(_)));
        // The previous layout survives a failed load.
        assert_eq!(layout.table_count(), 2);
    }

    #[test]
    fn bad_length_is_malformed() {
        let err = LayoutDocument::from_json(r#"{ "ballroom": { "width": "wide", "height": 3 } }"#)
            .unwrap_err();
        assert!(matches!(err, SeatingError::MalformedDocument(_)));
    }

    #[test]
    fn truncated_text_is_json_error() {
        let err = LayoutDocument::from_json(r#"{ "ballroom": "#).unwrap_err();
        assert!(matches!(err, SeatingError::Json(_)));
    }

    #[test]
    fn round_trip_preserves_layout() {
        let layout = loaded();
        let doc = layout.to_document();
        let mut again = Layout::default();
        again.load_document(doc.clone()).expect("reload");
        assert_eq!(again.to_document(), doc);
        let a: Vec<_> = layout.tables().map(|t| (&t.label, t.shape, t.size, t.position)).collect();
        let b: Vec<_> = again.tables().map(|t| (&t.label, t.shape, t.size, t.position)).collect();
        assert_eq!(a, b);
        assert_eq!(layout.roster(), again.roster());
    }

    #[test]
    fn writer_emits_numbers_and_ids() {
        let layout = loaded();
        let json = layout.to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["ballroom"]["width"], 1000.0);
        assert_eq!(value["guests"][2]["__id"], "g2");
        assert_eq!(value["guests"][0]["Meal"], "Fish");
        assert_eq!(value["tables"][0]["useHeads"], true);
        assert!(value["tables"][1].get("useHeads").is_none());
        assert_eq!(value["tables"][0]["seats"][1]["guest"], "g2");
    }

    #[test]
    fn oversized_head_count_loads() {
        let json = r#"{
            "ballroom": { "width": 800, "height": 600 },
            "tables": [{
                "id": "1", "shape": "rectangular",
                "width": 80, "height": 60, "left": 10, "top": 10,
                "useHeads": true, "headSeats": 2000000000,
                "seats": [ { "guest": "", "party": "" }, { "guest": "", "party": "" } ]
            }]
        }"#;
        let mut layout = Layout::default();
        layout.load_json(json).expect("load");
        let t = layout.tables().next().expect("table");
        assert_eq!(t.chairs.len(), 2);
        assert!(t.chairs.iter().all(|c| c.position.is_some()));
    }

    #[test]
    fn heads_stored_for_rectangles_only() {
        let mut layout = Layout::default();
        let key = layout.add_table(Shape::Rectangular, 8, HeadSeating::new(true, 1));
        layout.set_shape(key, Shape::Round).expect("reshape");
        assert_eq!(layout.table(key).expect("table").heads, HeadSeating::new(true, 1));
        let doc = layout.to_document();
        assert_eq!(doc.tables[0].use_heads, None);
        let mut again = Layout::default();
        again.load_document(doc).expect("reload");
        let t = again.tables().next().expect("table");
        assert_eq!(t.heads, HeadSeating::none());
    }

    #[test]
    fn fresh_keys_after_load() {
        let layout = loaded();
        let keys: Vec<TableKey> = layout.tables().map(|t| t.key).collect();
        assert_eq!(keys, [TableKey(1), TableKey(2)]);
    }
}

//! Data model for the seating engine.
//!
//! Tables own their chairs, chairs carry a cached copy of whoever sits
//! on them, and guests are owned by the roster. `LayoutParams` holds every
//! tunable constant so callers can override them from a JSON blob.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::palette::PartyColor;

// -- Geometry primitives -------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

// -- Tables and chairs ---------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Square,
    Rectangular,
    Round,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Square => "square",
            Shape::Rectangular => "rectangular",
            Shape::Round => "round",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Head-of-table seating for rectangular tables.
///
/// Only meaningful for `Shape::Rectangular`. A shape change keeps the
/// value in memory, but documents store it for rectangular tables only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeadSeating {
    pub use_heads: bool,
    pub per_head: u32,
}

impl HeadSeating {
    /// Heads are enabled only when requested with at least one chair.
    pub fn new(use_heads: bool, per_head: u32) -> Self {
        let enabled = use_heads && per_head > 0;
        HeadSeating {
            use_heads: enabled,
            per_head: if enabled { per_head } else { 0 },
        }
    }

    pub fn none() -> Self {
        HeadSeating::default()
    }

    /// Chairs at each head, zero when heads are disabled.
    pub fn effective(&self) -> u32 {
        if self.use_heads {
            self.per_head
        } else {
            0
        }
    }
}

/// Stable arena key of a table. Never reused within a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableKey(pub u32);

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A chair addressed by its owning table and its position in chair order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChairRef {
    pub table: TableKey,
    pub index: usize,
}

impl ChairRef {
    pub fn new(table: TableKey, index: usize) -> Self {
        ChairRef { table, index }
    }
}

impl fmt::Display for ChairRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.table, self.index)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chair {
    /// Id of the seated guest. May reference a guest missing from the
    /// roster after a re-import; `guest_name` then stands in for display.
    pub guest: Option<String>,
    pub guest_name: String,
    pub party: String,
    /// Top-left corner. `None` until geometry has placed the chair.
    pub position: Option<Point>,
}

impl Chair {
    pub fn is_occupied(&self) -> bool {
        self.guest.is_some()
    }

    /// Caption drawn on the chair: the seated guest's initials.
    pub fn caption(&self) -> String {
        if self.is_occupied() {
            initials(&self.guest_name)
        } else {
            String::new()
        }
    }

    pub(crate) fn vacate(&mut self) {
        self.guest = None;
        self.guest_name.clear();
        self.party.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub key: TableKey,
    /// User-editable label. Uniqueness is not enforced.
    pub label: String,
    pub shape: Shape,
    pub size: Size,
    /// Top-left corner on the ballroom canvas.
    pub position: Point,
    pub heads: HeadSeating,
    pub chairs: Vec<Chair>,
    pub party_colors: IndexMap<String, PartyColor>,
}

impl Table {
    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.size.width / 2.0,
            self.position.y + self.size.height / 2.0,
        )
    }

    pub fn free_chairs(&self) -> usize {
        self.chairs.iter().filter(|c| !c.is_occupied()).count()
    }

    pub fn occupied_chairs(&self) -> usize {
        self.chairs.len() - self.free_chairs()
    }

    /// True if any occupied chair at this table carries `party`.
    pub fn seats_party(&self, party: &str) -> bool {
        self.chairs
            .iter()
            .any(|c| c.is_occupied() && c.party == party)
    }

    pub fn chair_refs(&self) -> impl Iterator<Item = ChairRef> + '_ {
        (0..self.chairs.len()).map(move |i| ChairRef::new(self.key, i))
    }
}

// -- Guests --------------------------------------------------------

/// A guest imported from the guest list.
///
/// `columns` keeps every column of the source row in source order so the
/// list can be exported again with its original header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Guest {
    pub id: String,
    pub name: String,
    /// Empty string means "no party".
    pub party: String,
    pub responded: String,
    pub response: String,
    pub columns: IndexMap<String, String>,
}

impl Guest {
    /// Guests who answered "no" are never seated.
    pub fn is_declined(&self) -> bool {
        self.response.eq_ignore_ascii_case("no")
    }

    pub fn summary(&self) -> GuestSummary {
        GuestSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            party: self.party.clone(),
        }
    }
}

/// The slice of a guest the planner and the UI lists need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestSummary {
    pub id: String,
    pub name: String,
    pub party: String,
}

/// First letter of every whitespace-separated word, uppercased.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

// -- Decor ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Bar,
    Stage,
    Dancefloor,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Bar => "bar",
            ItemKind::Stage => "stage",
            ItemKind::Dancefloor => "dancefloor",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecorItem {
    pub kind: ItemKind,
    pub size: Size,
    pub position: Point,
    pub label: String,
}

// -- Tunables ------------------------------------------------------

fn default_chair_size() -> f64 {
    20.0
}
fn default_chair_gap() -> f64 {
    5.0
}
fn default_min_round_size() -> f64 {
    50.0
}
fn default_min_square_size() -> f64 {
    50.0
}
fn default_min_rect_width() -> f64 {
    80.0
}
fn default_min_rect_height() -> f64 {
    60.0
}
fn default_undo_depth() -> usize {
    20
}
fn default_seed() -> u64 {
    0x5EA7_C0DE
}
fn default_hue_min_separation() -> u16 {
    30
}
fn default_hue_attempts() -> u32 {
    100
}
fn default_saturation() -> u8 {
    70
}
fn default_lightness() -> u8 {
    80
}
fn default_table_origin() -> Point {
    Point::new(10.0, 10.0)
}
fn default_item_size() -> Size {
    Size::new(120.0, 80.0)
}
fn default_ballroom() -> Size {
    Size::new(1200.0, 800.0)
}
fn default_paste_offset() -> f64 {
    20.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    #[serde(default = "default_chair_size")]
    pub chair_size: f64,
    #[serde(default = "default_chair_gap")]
    pub chair_gap: f64,
    #[serde(default = "default_min_round_size")]
    pub min_round_size: f64,
    #[serde(default = "default_min_square_size")]
    pub min_square_size: f64,
    #[serde(default = "default_min_rect_width")]
    pub min_rect_width: f64,
    #[serde(default = "default_min_rect_height")]
    pub min_rect_height: f64,
    #[serde(default = "default_undo_depth")]
    pub undo_depth: usize,
    /// Seed for the party colour PRNG.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_hue_min_separation")]
    pub hue_min_separation_deg: u16,
    #[serde(default = "default_hue_attempts")]
    pub hue_attempts: u32,
    #[serde(default = "default_saturation")]
    pub saturation_pct: u8,
    #[serde(default = "default_lightness")]
    pub lightness_pct: u8,
    #[serde(default = "default_table_origin")]
    pub table_origin: Point,
    #[serde(default = "default_item_size")]
    pub item_size: Size,
    #[serde(default = "default_ballroom")]
    pub ballroom: Size,
    #[serde(default = "default_paste_offset")]
    pub paste_offset: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            chair_size: 20.0,
            chair_gap: 5.0,
            min_round_size: 50.0,
            min_square_size: 50.0,
            min_rect_width: 80.0,
            min_rect_height: 60.0,
            undo_depth: 20,
            seed: default_seed(),
            hue_min_separation_deg: 30,
            hue_attempts: 100,
            saturation_pct: 70,
            lightness_pct: 80,
            table_origin: default_table_origin(),
            item_size: default_item_size(),
            ballroom: default_ballroom(),
            paste_offset: 20.0,
        }
    }
}

impl LayoutParams {
    /// Distance from one chair slot to the next along a table edge.
    pub fn chair_step(&self) -> f64 {
        self.chair_size + self.chair_gap
    }
}

// -- Tests ---------------------------------------------------------

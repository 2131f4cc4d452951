//! Layout model: the ballroom canvas with its tables and decor items.
//!
//! `Layout` is the single owner of every table, chair, guest and item.
//! Fields are crate-private; outside callers mutate only through the
//! methods here and in `directory`, which keep chair assignments and
//! party colour maps consistent.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directory::Roster;
use crate::error::{Result, SeatingError};
use crate::geometry::{clamp_into, reposition_chairs, table_footprint};
use crate::palette::Palette;
use crate::types::{
    Chair, ChairRef, DecorItem, HeadSeating, ItemKind, LayoutParams, Point, Shape, Size, Table,
    TableKey,
};

/// Everything needed to recreate a table without its seat assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableTemplate {
    pub seat_count: usize,
    pub shape: Shape,
    pub size: Size,
    pub position: Point,
    pub heads: HeadSeating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStats {
    /// Guests who have not declined.
    pub guests: usize,
    pub seats: usize,
}

impl fmt::Display for RoomStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} guests / {} seats", self.guests, self.seats)
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub(crate) params: LayoutParams,
    pub(crate) ballroom: Size,
    pub(crate) roster: Roster,
    pub(crate) tables: IndexMap<TableKey, Table>,
    pub(crate) items: Vec<DecorItem>,
    pub(crate) palette: Palette,
    next_key: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::new(LayoutParams::default())
    }
}

impl Layout {
    pub fn new(params: LayoutParams) -> Self {
        Layout {
            ballroom: params.ballroom,
            palette: Palette::new(&params),
            roster: Roster::default(),
            tables: IndexMap::new(),
            items: Vec::new(),
            next_key: 1,
            params,
        }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn ballroom(&self) -> Size {
        self.ballroom
    }

    pub fn set_ballroom(&mut self, size: Size) {
        self.ballroom = size;
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Tables in creation order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn table(&self, key: TableKey) -> Result<&Table> {
        self.tables.get(&key).ok_or(SeatingError::UnknownTable(key))
    }

    pub(crate) fn table_mut(&mut self, key: TableKey) -> Result<&mut Table> {
        self.tables
            .get_mut(&key)
            .ok_or(SeatingError::UnknownTable(key))
    }

    pub fn chair(&self, chair: ChairRef) -> Result<&Chair> {
        self.table(chair.table)?
            .chairs
            .get(chair.index)
            .ok_or(SeatingError::UnknownChair(chair))
    }

    pub fn items(&self) -> &[DecorItem] {
        &self.items
    }

    fn allocate_key(&mut self) -> TableKey {
        let key = TableKey(self.next_key);
        self.next_key += 1;
        key
    }

    /// Add one table at the default origin, sized for `seat_count` chairs.
    pub fn add_table(&mut self, shape: Shape, seat_count: usize, heads: HeadSeating) -> TableKey {
        let heads = match shape {
            Shape::Rectangular => HeadSeating::new(heads.use_heads, heads.per_head),
            _ => HeadSeating::none(),
        };
        let template = TableTemplate {
            seat_count,
            shape,
            size: table_footprint(seat_count, shape, heads, &self.params),
            position: self.params.table_origin,
            heads,
        };
        self.insert_table(&template)
    }

    /// Add `count` identical tables.
    pub fn create_tables(
        &mut self,
        shape: Shape,
        seat_count: usize,
        count: usize,
        heads: HeadSeating,
    ) -> Vec<TableKey> {
        (0..count)
            .map(|_| self.add_table(shape, seat_count, heads))
            .collect()
    }

    /// Insert a table built from `template`, labelled with the next number.
    pub(crate) fn insert_table(&mut self, template: &TableTemplate) -> TableKey {
        if template.shape == Shape::Rectangular
            && template.heads.effective() as usize * 2 > template.seat_count
        {
            tracing::warn!(
                seats = template.seat_count,
                per_head = template.heads.effective(),
                "more head chairs requested than the table seats"
            );
        }
        let key = self.allocate_key();
        let mut table = Table {
            key,
            label: (self.tables.len() + 1).to_string(),
            shape: template.shape,
            size: template.size,
            position: template.position,
            heads: template.heads,
            chairs: vec![Chair::default(); template.seat_count],
            party_colors: IndexMap::new(),
        };
        reposition_chairs(&mut table, &self.params);
        debug!(table = %key, shape = %template.shape, seats = template.seat_count, "table added");
        self.tables.insert(key, table);
        key
    }

    pub fn template_of(&self, key: TableKey) -> Result<TableTemplate> {
        let table = self.table(key)?;
        Ok(TableTemplate {
            seat_count: table.chairs.len(),
            shape: table.shape,
            size: table.size,
            position: table.position,
            heads: table.heads,
        })
    }

    /// Delete a table together with its chairs and their assignments.
    pub fn remove_table(&mut self, key: TableKey) -> Result<Table> {
        let table = self
            .tables
            .shift_remove(&key)
            .ok_or(SeatingError::UnknownTable(key))?;
        debug!(table = %key, seated = table.occupied_chairs(), "table removed");
        Ok(table)
    }

    pub fn rename_table(&mut self, key: TableKey, label: &str) -> Result<()> {
        self.table_mut(key)?.label = label.trim().to_string();
        Ok(())
    }

    /// Switch shape, resizing the table for its existing chair count.
    pub fn set_shape(&mut self, key: TableKey, shape: Shape) -> Result<()> {
        let params = self.params.clone();
        let table = self.table_mut(key)?;
        table.shape = shape;
        table.size = table_footprint(table.chairs.len(), shape, table.heads, &params);
        reposition_chairs(table, &params);
        Ok(())
    }

    /// Turn a rectangular table by 90 degrees. Returns false for other shapes.
    pub fn rotate_table(&mut self, key: TableKey) -> Result<bool> {
        let params = self.params.clone();
        let table = self.table_mut(key)?;
        if table.shape != Shape::Rectangular {
            return Ok(false);
        }
        table.size = Size::new(table.size.height, table.size.width);
        reposition_chairs(table, &params);
        Ok(true)
    }

    /// Move a table, keeping it inside the ballroom. Returns where it landed.
    pub fn move_table(&mut self, key: TableKey, to: Point) -> Result<Point> {
        let params = self.params.clone();
        let bounds = self.ballroom;
        let table = self.table_mut(key)?;
        table.position = clamp_into(to, table.size, bounds);
        reposition_chairs(table, &params);
        Ok(table.position)
    }

    // -- Decor items -------------------------------------------------

    pub fn add_item(&mut self, kind: ItemKind) -> usize {
        self.items.push(DecorItem {
            kind,
            size: self.params.item_size,
            position: self.params.table_origin,
            label: kind.as_str().to_string(),
        });
        self.items.len() - 1
    }

    fn item_mut(&mut self, index: usize) -> Result<&mut DecorItem> {
        self.items
            .get_mut(index)
            .ok_or(SeatingError::UnknownItem(index))
    }

    pub fn move_item(&mut self, index: usize, to: Point) -> Result<Point> {
        let bounds = self.ballroom;
        let item = self.item_mut(index)?;
        item.position = clamp_into(to, item.size, bounds);
        Ok(item.position)
    }

    pub fn resize_item(&mut self, index: usize, size: Size) -> Result<()> {
        self.item_mut(index)?.size = Size::new(size.width.max(0.0), size.height.max(0.0));
        Ok(())
    }

    pub fn relabel_item(&mut self, index: usize, label: &str) -> Result<()> {
        self.item_mut(index)?.label = label.to_string();
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Result<DecorItem> {
        if index >= self.items.len() {
            return Err(SeatingError::UnknownItem(index));
        }
        Ok(self.items.remove(index))
    }

    // -- Whole layout ------------------------------------------------

    pub fn room_stats(&self) -> RoomStats {
        RoomStats {
            guests: self.roster.iter().filter(|g| !g.is_declined()).count(),
            seats: self.tables.values().map(|t| t.chairs.len()).sum(),
        }
    }

    /// Drop every guest, table and item. The ballroom keeps its size.
    pub fn clear(&mut self) {
        self.roster = Roster::default();
        self.tables.clear();
        self.items.clear();
    }
}

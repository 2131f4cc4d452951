//! Auto-seating planner.
//!
//! Works on a private copy of chair occupancy so a plan is computed in
//! full before any chair changes. Planning rules, per party (in the
//! order parties first appear among the unseated guests):
//!
//! 1. a table already seating someone from the party, with room for all;
//! 2. otherwise the roomiest table that fits the whole party (first
//!    table wins ties);
//! 3. otherwise split the party, in order, across tables in table order.
//!
//! Inside a table each next member tries the chair left of, right of, and
//! (on even-sized tables) opposite the previous member before falling back
//! to the lowest free chair.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SeatingError};
use crate::types::{ChairRef, GuestSummary, Table, TableKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub guest: GuestSummary,
    pub chair: ChairRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingPlan {
    pub placements: Vec<Placement>,
}

impl SeatingPlan {
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Planner view of one table.
struct TableSlots {
    key: TableKey,
    occupied: Vec<bool>,
    parties: HashSet<String>,
}

impl TableSlots {
    fn from_table(table: &Table) -> Self {
        TableSlots {
            key: table.key,
            occupied: table.chairs.iter().map(|c| c.is_occupied()).collect(),
            parties: table
                .chairs
                .iter()
                .filter(|c| c.is_occupied())
                .map(|c| c.party.clone())
                .collect(),
        }
    }

    fn free(&self) -> usize {
        self.occupied.iter().filter(|o| !**o).count()
    }

    fn is_free(&self, index: usize) -> bool {
        !self.occupied[index]
    }

    fn first_free(&self) -> Option<usize> {
        self.occupied.iter().position(|o| !*o)
    }

    /// Next chair for a party member, given where the previous one sat.
    fn next_chair(&self, previous: Option<usize>) -> Option<usize> {
        let n = self.occupied.len();
        if let Some(prev) = previous {
            // Odd tables have no chair directly opposite.
            let opposite = (n % 2 == 0).then(|| (prev + n / 2) % n);
            let candidates = [Some((prev + n - 1) % n), Some((prev + 1) % n), opposite];
            if let Some(idx) = candidates.into_iter().flatten().find(|&c| self.is_free(c)) {
                return Some(idx);
            }
        }
        self.first_free()
    }

    fn seat_chunk(&mut self, chunk: &[&GuestSummary], plan: &mut SeatingPlan) {
        let mut previous = None;
        for guest in chunk {
            let Some(idx) = self.next_chair(previous) else {
                break;
            };
            self.occupied[idx] = true;
            self.parties.insert(guest.party.clone());
            plan.placements.push(Placement {
                guest: (*guest).clone(),
                chair: ChairRef::new(self.key, idx),
            });
            previous = Some(idx);
        }
    }
}

/// Pick the single table that should hold a whole party, if any.
fn choose_table(slots: &[TableSlots], party: &str, size: usize) -> Option<usize> {
    if let Some(idx) = slots
        .iter()
        .position(|s| s.parties.contains(party) && s.free() >= size)
    {
        return Some(idx);
    }
    let mut best: Option<(usize, usize)> = None;
    for (idx, s) in slots.iter().enumerate() {
        let free = s.free();
        if free >= size && best.map_or(true, |(_, f)| free > f) {
            best = Some((idx, free));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Plan chairs for every guest in `unseated`.
///
/// Fails with `InsufficientCapacity` when the tables' free chairs cannot
/// hold everyone; nothing is planned in that case.
pub fn plan_auto_seat<'a, I>(unseated: &[GuestSummary], tables: I) -> Result<SeatingPlan>
where
    I: IntoIterator<Item = &'a Table>,
{
    let mut slots: Vec<TableSlots> = tables.into_iter().map(TableSlots::from_table).collect();
    let available: usize = slots.iter().map(TableSlots::free).sum();
    if available < unseated.len() {
        return Err(SeatingError::InsufficientCapacity {
            shortfall: unseated.len() - available,
        });
    }

    let mut parties: IndexMap<&str, Vec<&GuestSummary>> = IndexMap::new();
    for guest in unseated {
        parties.entry(guest.party.as_str()).or_default().push(guest);
    }

    let mut plan = SeatingPlan::default();
    for (party, members) in &parties {
        if let Some(idx) = choose_table(&slots, party, members.len()) {
            debug!(party, size = members.len(), table = %slots[idx].key, "party placed whole");
            slots[idx].seat_chunk(members, &mut plan);
            continue;
        }
        debug!(party, size = members.len(), "party split across tables");
        let mut remaining: &[&GuestSummary] = members;
        for slot in slots.iter_mut() {
            if remaining.is_empty() {
                break;
            }
            let open = slot.free();
            if open == 0 {
                continue;
            }
            let (chunk, rest) = remaining.split_at(open.min(remaining.len()));
            slot.seat_chunk(chunk, &mut plan);
            remaining = rest;
        }
    }
    Ok(plan)
}

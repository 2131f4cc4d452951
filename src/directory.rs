//! Seating directory: the guest roster and who sits where.
//!
//! Every chair assignment goes through `Layout::assign` / `Layout::unseat`
//! so two invariants hold after any sequence of operations:
//!
//! - a guest id appears on at most one chair across the whole layout;
//! - a table's party colour map has exactly one entry per party found
//!   among its occupied chairs.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SeatingError};
use crate::layout::Layout;
use crate::palette::PartyColor;
use crate::planner::{plan_auto_seat, SeatingPlan};
use crate::types::{ChairRef, Guest, GuestSummary, TableKey};

/// Label shown for guests without a party.
pub const NO_PARTY: &str = "No Party";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    guests: Vec<Guest>,
}

impl Roster {
    pub fn new(guests: Vec<Guest>) -> Self {
        Roster { guests }
    }

    pub fn len(&self) -> usize {
        self.guests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Guest> {
        self.guests.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Guest> {
        self.guests.iter().find(|g| g.id == id)
    }

    /// First guest with this display name. Names may collide.
    pub fn find_by_name(&self, name: &str) -> Option<&Guest> {
        self.guests.iter().find(|g| g.name == name)
    }

    /// Resolve a stored reference by id, then by display name.
    pub fn resolve(&self, reference: &str) -> Option<&Guest> {
        self.get(reference).or_else(|| self.find_by_name(reference))
    }
}

/// One row of a table's guest summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub responded: String,
    pub response: String,
}

/// Guests seated at one table who share a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyGroup {
    pub party: String,
    pub members: Vec<RosterEntry>,
}

impl Layout {
    /// Replace the whole roster. Chairs keep their ids and cached names.
    pub fn replace_roster(&mut self, guests: Vec<Guest>) {
        info!(count = guests.len(), "guest roster replaced");
        self.roster = Roster::new(guests);
    }

    pub fn guest(&self, id: &str) -> Option<&Guest> {
        self.roster.get(id)
    }

    /// The chair a guest occupies, if any.
    pub fn find_chair_of(&self, guest_id: &str) -> Option<ChairRef> {
        self.tables.values().find_map(|table| {
            table
                .chairs
                .iter()
                .position(|c| c.guest.as_deref() == Some(guest_id))
                .map(|i| ChairRef::new(table.key, i))
        })
    }

    fn seated_ids(&self) -> HashSet<&str> {
        self.tables
            .values()
            .flat_map(|t| t.chairs.iter())
            .filter_map(|c| c.guest.as_deref())
            .collect()
    }

    /// Seat a guest on `chair`.
    ///
    /// Refuses with `GuestAlreadySeated` when the guest sits on another
    /// chair; the caller decides whether to `move_guest` instead.
    /// Seating a guest on the chair they already hold is a no-op.
    pub fn seat(&mut self, chair: ChairRef, guest_id: &str) -> Result<()> {
        self.chair(chair)?;
        let guest = self
            .roster
            .get(guest_id)
            .ok_or_else(|| SeatingError::UnknownGuest(guest_id.to_string()))?;
        let (name, party) = (guest.name.clone(), guest.party.clone());
        match self.find_chair_of(guest_id) {
            Some(existing) if existing == chair => Ok(()),
            Some(existing) => Err(SeatingError::GuestAlreadySeated {
                guest_id: guest_id.to_string(),
                existing,
            }),
            None => self.assign(chair, guest_id, &name, &party),
        }
    }

    /// Seat a guest, vacating any chair they currently hold.
    ///
    /// Returns the chair they left.
    pub fn move_guest(&mut self, chair: ChairRef, guest_id: &str) -> Result<Option<ChairRef>> {
        self.chair(chair)?;
        if self.roster.get(guest_id).is_none() {
            return Err(SeatingError::UnknownGuest(guest_id.to_string()));
        }
        let previous = self.find_chair_of(guest_id).filter(|c| *c != chair);
        if let Some(old) = previous {
            self.unseat(old)?;
        }
        self.seat(chair, guest_id)?;
        Ok(previous)
    }

    /// Write an assignment onto a chair, vacating its current occupant.
    ///
    /// Does not check whether `guest_id` sits elsewhere.
    pub(crate) fn assign(
        &mut self,
        chair: ChairRef,
        guest_id: &str,
        name: &str,
        party: &str,
    ) -> Result<()> {
        if self.chair(chair)?.is_occupied() {
            self.unseat(chair)?;
        }
        let slot = self
            .table_mut(chair.table)?
            .chairs
            .get_mut(chair.index)
            .ok_or(SeatingError::UnknownChair(chair))?;
        slot.guest = Some(guest_id.to_string());
        slot.guest_name = name.to_string();
        slot.party = party.to_string();
        self.color_for(chair.table, party)?;
        debug!(%chair, guest = guest_id, party, "guest seated");
        Ok(())
    }

    /// Clear a chair. Returns the id of the guest who sat there.
    pub fn unseat(&mut self, chair: ChairRef) -> Result<Option<String>> {
        let table = self.table_mut(chair.table)?;
        let slot = table
            .chairs
            .get_mut(chair.index)
            .ok_or(SeatingError::UnknownChair(chair))?;
        let Some(guest) = slot.guest.take() else {
            return Ok(None);
        };
        let party = std::mem::take(&mut slot.party);
        slot.vacate();
        if !table.seats_party(&party) {
            table.party_colors.shift_remove(&party);
        }
        debug!(%chair, guest = guest.as_str(), "guest unseated");
        Ok(Some(guest))
    }

    /// Unseat everyone at one table. Returns how many chairs were cleared.
    pub fn clear_table(&mut self, key: TableKey) -> Result<usize> {
        let refs: Vec<ChairRef> = self.table(key)?.chair_refs().collect();
        let mut cleared = 0;
        for chair in refs {
            if self.unseat(chair)?.is_some() {
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    /// Unseat everyone everywhere.
    pub fn clear_all_seats(&mut self) -> usize {
        let mut cleared = 0;
        for table in self.tables.values_mut() {
            for chair in table.chairs.iter_mut().filter(|c| c.is_occupied()) {
                chair.vacate();
                cleared += 1;
            }
            table.party_colors.clear();
        }
        info!(cleared, "all seats cleared");
        cleared
    }

    /// Guests who still need a chair, ordered by party then name.
    ///
    /// Comparison ignores case first, then falls back to exact text.
    /// Declined guests are excluded. The empty party sorts first.
    pub fn unseated_guests(&self) -> Vec<GuestSummary> {
        let seated = self.seated_ids();
        let mut out: Vec<GuestSummary> = self
            .roster
            .iter()
            .filter(|g| !g.is_declined() && !seated.contains(g.id.as_str()))
            .map(Guest::summary)
            .collect();
        out.sort_by_cached_key(|g| {
            (
                g.party.to_lowercase(),
                g.party.clone(),
                g.name.to_lowercase(),
                g.name.clone(),
            )
        });
        out
    }

    /// Colour of `party` at a table, allocating one if it has none yet.
    pub(crate) fn color_for(&mut self, key: TableKey, party: &str) -> Result<PartyColor> {
        let table = self
            .tables
            .get_mut(&key)
            .ok_or(SeatingError::UnknownTable(key))?;
        if let Some(color) = table.party_colors.get(party) {
            return Ok(*color);
        }
        let color = self.palette.pick(table.party_colors.values());
        table.party_colors.insert(party.to_string(), color);
        Ok(color)
    }

    /// Colour already assigned to `party` at a table.
    pub fn party_color(&self, key: TableKey, party: &str) -> Result<Option<PartyColor>> {
        Ok(self.table(key)?.party_colors.get(party).copied())
    }

    /// Guests to offer for a chair at `key`.
    ///
    /// Members of parties already partly seated at this table come first,
    /// then every other guest who has not declined, in roster order.
    pub fn seat_candidates(&self, key: TableKey) -> Result<Vec<GuestSummary>> {
        let table = self.table(key)?;
        let mut parties: Vec<&str> = Vec::new();
        for chair in &table.chairs {
            if !chair.party.is_empty() && !parties.contains(&chair.party.as_str()) {
                parties.push(&chair.party);
            }
        }
        let attending = || self.roster.iter().filter(|g| !g.is_declined());
        let mut first: Vec<&Guest> = Vec::new();
        for party in parties {
            let members: Vec<&Guest> = attending().filter(|g| g.party == party).collect();
            let seated_here: Vec<&str> = table
                .chairs
                .iter()
                .filter(|c| c.party == party)
                .filter_map(|c| c.guest.as_deref())
                .collect();
            if seated_here.len() < members.len() {
                first.extend(
                    members
                        .into_iter()
                        .filter(|g| !seated_here.contains(&g.id.as_str())),
                );
            }
        }
        let rest = attending().filter(|g| !first.iter().any(|f| f.id == g.id));
        Ok(first
            .iter()
            .copied()
            .chain(rest)
            .map(Guest::summary)
            .collect())
    }

    /// Occupied chairs at a table grouped by party, in first-seen order.
    ///
    /// Orphaned chairs fall back to their cached name and party.
    pub fn table_roster(&self, key: TableKey) -> Result<Vec<PartyGroup>> {
        let table = self.table(key)?;
        let mut groups: IndexMap<String, Vec<RosterEntry>> = IndexMap::new();
        for chair in &table.chairs {
            let Some(id) = chair.guest.as_deref() else {
                continue;
            };
            let guest = self.roster.get(id);
            let name = guest
                .map(|g| g.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| chair.guest_name.clone());
            let party = if !chair.party.is_empty() {
                chair.party.clone()
            } else {
                guest
                    .map(|g| g.party.clone())
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| NO_PARTY.to_string())
            };
            groups.entry(party).or_default().push(RosterEntry {
                name,
                responded: guest.map(|g| g.responded.clone()).unwrap_or_default(),
                response: guest.map(|g| g.response.clone()).unwrap_or_default(),
            });
        }
        Ok(groups
            .into_iter()
            .map(|(party, members)| PartyGroup { party, members })
            .collect())
    }

    /// Seat every unseated guest, keeping parties together where possible.
    ///
    /// Fails with `InsufficientCapacity` before touching any chair when
    /// the free chairs cannot hold everyone.
    pub fn auto_seat(&mut self) -> Result<SeatingPlan> {
        let unseated = self.unseated_guests();
        if unseated.is_empty() {
            return Ok(SeatingPlan::default());
        }
        let plan = plan_auto_seat(&unseated, self.tables.values())?;
        for placement in &plan.placements {
            let g = &placement.guest;
            self.assign(placement.chair, &g.id, &g.name, &g.party)?;
        }
        info!(seated = plan.placements.len(), "auto-seat complete");
        Ok(plan)
    }
}

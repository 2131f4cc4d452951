//! User-facing commands over one layout, with a bounded undo history.
//!
//! Every mutating command snapshots the layout document first and pushes
//! the snapshot only when the command succeeds. Undo reloads the newest
//! snapshot. Table and item moves are continuous drags and stay out of
//! the history.
//!
//! Table keys are reassigned whenever a document is loaded, so keys held
//! across `undo` or `load_json` must be looked up again.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::LayoutDocument;
use crate::error::{Result, SeatingError};
use crate::layout::{Layout, RoomStats, TableTemplate};
use crate::planner::SeatingPlan;
use crate::types::{ChairRef, HeadSeating, ItemKind, LayoutParams, Point, Shape, Size, TableKey};

#[derive(Debug, Clone)]
struct UndoEntry {
    label: String,
    document: LayoutDocument,
}

#[derive(Debug, Clone)]
struct History {
    entries: VecDeque<UndoEntry>,
    depth: usize,
}

impl History {
    fn new(depth: usize) -> Self {
        History {
            entries: VecDeque::with_capacity(depth),
            depth,
        }
    }

    fn push(&mut self, label: &str, document: LayoutDocument) {
        if self.depth == 0 {
            return;
        }
        if self.entries.len() == self.depth {
            self.entries.pop_front();
        }
        self.entries.push_back(UndoEntry {
            label: label.to_string(),
            document,
        });
    }

    fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop_back()
    }
}

/// First half of a two-phase seat: what would happen, decided before
/// anything changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRequest {
    pub chair: ChairRef,
    pub guest_id: String,
    /// Chair the guest currently holds elsewhere. When set, the caller
    /// must decide whether to move them.
    pub conflict: Option<ChairRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDecision {
    Move,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatOutcome {
    Seated,
    Moved { from: ChairRef },
    /// The move was declined; nothing changed.
    Declined,
}

#[derive(Debug, Clone)]
pub struct Session {
    layout: Layout,
    history: History,
    clipboard: Option<TableTemplate>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(LayoutParams::default())
    }
}

impl Session {
    pub fn new(params: LayoutParams) -> Self {
        Session {
            history: History::new(params.undo_depth),
            layout: Layout::new(params),
            clipboard: None,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of commands that can be undone.
    pub fn undo_len(&self) -> usize {
        self.history.entries.len()
    }

    /// Label of the command `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.history.entries.back().map(|e| e.label.as_str())
    }

    fn record<T>(&mut self, label: &str, op: impl FnOnce(&mut Layout) -> Result<T>) -> Result<T> {
        let snapshot = self.layout.to_document();
        let out = op(&mut self.layout)?;
        self.history.push(label, snapshot);
        debug!(label, depth = self.history.entries.len(), "undo point recorded");
        Ok(out)
    }

    /// Revert the last recorded command. Returns its label.
    pub fn undo(&mut self) -> Result<String> {
        let entry = self.history.pop().ok_or(SeatingError::NothingToUndo)?;
        self.layout.load_document(entry.document)?;
        info!(label = entry.label.as_str(), "undone");
        Ok(entry.label)
    }

    // -- Tables ------------------------------------------------------

    pub fn create_tables(
        &mut self,
        shape: Shape,
        seat_count: usize,
        count: usize,
        heads: HeadSeating,
    ) -> Result<Vec<TableKey>> {
        self.record("Add table", |l| Ok(l.create_tables(shape, seat_count, count, heads)))
    }

    pub fn delete_table(&mut self, key: TableKey) -> Result<()> {
        self.record("Delete table", |l| l.remove_table(key).map(|_| ()))
    }

    pub fn change_shape(&mut self, key: TableKey, shape: Shape) -> Result<()> {
        self.record("Change shape", |l| l.set_shape(key, shape))
    }

    /// Rotate a rectangular table. Other shapes are left alone and no
    /// undo point is recorded for them.
    pub fn rotate_table(&mut self, key: TableKey) -> Result<bool> {
        if self.layout.table(key)?.shape != Shape::Rectangular {
            return Ok(false);
        }
        self.record("Rotate table", |l| l.rotate_table(key))
    }

    pub fn rename_table(&mut self, key: TableKey, label: &str) -> Result<()> {
        self.record("Rename table", |l| l.rename_table(key, label))
    }

    pub fn move_table(&mut self, key: TableKey, to: Point) -> Result<Point> {
        self.layout.move_table(key, to)
    }

    pub fn copy_table(&mut self, key: TableKey) -> Result<()> {
        self.clipboard = Some(self.layout.template_of(key)?);
        Ok(())
    }

    /// Add an unseated copy of the copied table, shifted down and right.
    pub fn paste_table(&mut self) -> Result<TableKey> {
        let mut template = self.clipboard.clone().ok_or(SeatingError::EmptyClipboard)?;
        let offset = self.layout.params().paste_offset;
        template.position = Point::new(template.position.x + offset, template.position.y + offset);
        self.record("Paste table", |l| Ok(l.insert_table(&template)))
    }

    // -- Decor items -------------------------------------------------

    pub fn add_item(&mut self, kind: ItemKind) -> Result<usize> {
        self.record("Add item", |l| Ok(l.add_item(kind)))
    }

    pub fn delete_item(&mut self, index: usize) -> Result<()> {
        self.record("Delete item", |l| l.remove_item(index).map(|_| ()))
    }

    pub fn resize_item(&mut self, index: usize, size: Size) -> Result<()> {
        self.record("Resize item", |l| l.resize_item(index, size))
    }

    pub fn relabel_item(&mut self, index: usize, label: &str) -> Result<()> {
        self.record("Edit item", |l| l.relabel_item(index, label))
    }

    pub fn move_item(&mut self, index: usize, to: Point) -> Result<Point> {
        self.layout.move_item(index, to)
    }

    // -- Seating -----------------------------------------------------

    /// Check a seat request without changing anything.
    pub fn request_seat(&self, chair: ChairRef, guest_id: &str) -> Result<SeatRequest> {
        self.layout.chair(chair)?;
        if self.layout.guest(guest_id).is_none() {
            return Err(SeatingError::UnknownGuest(guest_id.to_string()));
        }
        Ok(SeatRequest {
            chair,
            guest_id: guest_id.to_string(),
            conflict: self.layout.find_chair_of(guest_id).filter(|c| *c != chair),
        })
    }

    /// Carry out a seat request with the caller's decision on any move.
    ///
    /// If the guest was seated somewhere new since the request was made,
    /// fails with `GuestAlreadySeated` so the caller can ask again.
    pub fn commit_seat(&mut self, request: &SeatRequest, decision: MoveDecision) -> Result<SeatOutcome> {
        let current = self
            .layout
            .find_chair_of(&request.guest_id)
            .filter(|c| *c != request.chair);
        if let Some(existing) = current.filter(|c| Some(*c) != request.conflict) {
            return Err(SeatingError::GuestAlreadySeated {
                guest_id: request.guest_id.clone(),
                existing,
            });
        }
        let id = request.guest_id.as_str();
        let chair = request.chair;
        match (current, decision) {
            (None, _) => {
                if self.layout.find_chair_of(id) != Some(chair) {
                    self.record("Seat guest", |l| l.seat(chair, id))?;
                }
                Ok(SeatOutcome::Seated)
            }
            (Some(from), MoveDecision::Move) => {
                self.record("Move guest", |l| l.move_guest(chair, id))?;
                Ok(SeatOutcome::Moved { from })
            }
            (Some(_), MoveDecision::Keep) => Ok(SeatOutcome::Declined),
        }
    }

    pub fn unseat(&mut self, chair: ChairRef) -> Result<Option<String>> {
        if !self.layout.chair(chair)?.is_occupied() {
            return Ok(None);
        }
        self.record("Unseat guest", |l| l.unseat(chair))
    }

    pub fn clear_table_seats(&mut self, key: TableKey) -> Result<usize> {
        self.record("Clear table", |l| l.clear_table(key))
    }

    pub fn clear_all_seats(&mut self) -> Result<usize> {
        self.record("Clear all seats", |l| Ok(l.clear_all_seats()))
    }

    /// Seat everyone still unseated. A shortfall leaves no undo point.
    pub fn auto_seat(&mut self) -> Result<SeatingPlan> {
        self.record("Autocomplete seating", Layout::auto_seat)
    }

    // -- Whole layout ------------------------------------------------

    /// Drop every guest, table and item. Can be undone.
    pub fn reset(&mut self) -> Result<()> {
        self.record("Reset", |l| {
            l.clear();
            Ok(())
        })
    }

    pub fn import_guests(&mut self, csv: &str) -> Result<usize> {
        self.record("Import guests", |l| Ok(l.import_guests(csv)))
    }

    pub fn export_guests_csv(&self) -> String {
        self.layout.export_guests()
    }

    pub fn room_stats(&self) -> RoomStats {
        self.layout.room_stats()
    }

    pub fn save_json(&self) -> Result<String> {
        self.layout.to_json()
    }

    /// Replace the layout with a saved document and start a fresh history.
    pub fn load_json(&mut self, text: &str) -> Result<()> {
        self.layout.load_json(text)?;
        self.history = History::new(self.layout.params().undo_depth);
        self.clipboard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUESTS: &str = "Guest Name,Party ID,RSVP Response\n\
        Ann,smith,Yes\n\
        Ben,smith,Yes\n\
        Cy,jones,\n\
        Di,jones,No\n";

    fn session_with_guests() -> (Session, TableKey) {
        let mut s = Session::default();
        let keys = s
            .create_tables(Shape::Round, 4, 1, HeadSeating::none())
            .expect("create");
        s.import_guests(GUESTS).expect("import");
        (s, keys[0])
    }

    fn first_key(s: &Session) -> TableKey {
        s.layout().tables().next().expect("table").key
    }

    #[test]
    fn undo_reverts_last_command() {
        let (mut s, _) = session_with_guests();
        assert_eq!(s.undo_len(), 2);
        assert_eq!(s.undo().expect("undo"), "Import guests");
        assert!(s.layout().roster().is_empty());
        assert_eq!(s.layout().table_count(), 1);
        assert_eq!(s.undo().expect("undo"), "Add table");
        assert_eq!(s.layout().table_count(), 0);
        assert!(matches!(s.undo(), Err(SeatingError::NothingToUndo)));
    }

    #[test]
    fn history_is_bounded() {
        let params = LayoutParams {
            undo_depth: 3,
            ..LayoutParams::default()
        };
        let mut s = Session::new(params);
        for _ in 0..5 {
            s.add_item(ItemKind::Bar).expect("add");
        }
        assert_eq!(s.undo_len(), 3);
        for _ in 0..3 {
            s.undo().expect("undo");
        }
        assert_eq!(s.layout().items().len(), 2);
        assert!(matches!(s.undo(), Err(SeatingError::NothingToUndo)));
    }

    #[test]
    fn auto_seat_then_undo() {
        let (mut s, _) = session_with_guests();
        let plan = s.auto_seat().expect("auto");
        assert_eq!(plan.len(), 3);
        assert_eq!(s.undo_label(), Some("Autocomplete seating"));
        assert!(s.layout().unseated_guests().is_empty());
        s.undo().expect("undo");
        assert_eq!(s.layout().unseated_guests().len(), 3);
    }

    #[test]
    fn failed_auto_seat_records_nothing() {
        let (mut s, key) = session_with_guests();
        s.change_shape(key, Shape::Square).expect("shape");
        s.delete_table(key).expect("delete");
        let before = s.undo_len();
        let err = s.auto_seat().unwrap_err();
        assert!(matches!(err, SeatingError::InsufficientCapacity { shortfall: 3 }));
        assert_eq!(s.undo_len(), before);
    }

    #[test]
    fn two_phase_seat_without_conflict() {
        let (mut s, key) = session_with_guests();
        let req = s.request_seat(ChairRef::new(key, 0), "g0").expect("request");
        assert_eq!(req.conflict, None);
        let outcome = s.commit_seat(&req, MoveDecision::Keep).expect("commit");
        assert_eq!(outcome, SeatOutcome::Seated);
        assert_eq!(s.layout().find_chair_of("g0"), Some(ChairRef::new(key, 0)));
        assert_eq!(s.undo_label(), Some("Seat guest"));
    }

    #[test]
    fn two_phase_move_and_decline() {
        let (mut s, key) = session_with_guests();
        let first = s.request_seat(ChairRef::new(key, 0), "g2").expect("request");
        s.commit_seat(&first, MoveDecision::Move).expect("commit");

        let req = s.request_seat(ChairRef::new(key, 2), "g2").expect("request");
        assert_eq!(req.conflict, Some(ChairRef::new(key, 0)));
        let depth = s.undo_len();
        assert_eq!(s.commit_seat(&req, MoveDecision::Keep).expect("keep"), SeatOutcome::Declined);
        assert_eq!(s.undo_len(), depth);
        assert_eq!(s.layout().find_chair_of("g2"), Some(ChairRef::new(key, 0)));

        let outcome = s.commit_seat(&req, MoveDecision::Move).expect("move");
        assert_eq!(outcome, SeatOutcome::Moved { from: ChairRef::new(key, 0) });
        assert_eq!(s.layout().find_chair_of("g2"), Some(ChairRef::new(key, 2)));
        assert!(!s.layout().chair(ChairRef::new(key, 0)).expect("chair").is_occupied());
    }

    #[test]
    fn stale_request_is_rejected() {
        let (mut s, key) = session_with_guests();
        let req = s.request_seat(ChairRef::new(key, 1), "g1").expect("request");
        let other = s.request_seat(ChairRef::new(key, 3), "g1").expect("request");
        s.commit_seat(&other, MoveDecision::Move).expect("commit");
        let err = s.commit_seat(&req, MoveDecision::Move).unwrap_err();
        assert!(matches!(
            err,
            SeatingError::GuestAlreadySeated { existing, .. } if existing == ChairRef::new(key, 3)
        ));
    }

    #[test]
    fn request_checks_chair_and_guest() {
        let (s, key) = session_with_guests();
        assert!(matches!(
            s.request_seat(ChairRef::new(key, 9), "g0"),
            Err(SeatingError::UnknownChair(_))
        ));
        assert!(matches!(
            s.request_seat(ChairRef::new(key, 0), "zz"),
            Err(SeatingError::UnknownGuest(_))
        ));
    }

    #[test]
    fn copy_paste_offsets_and_skips_guests() {
        let (mut s, key) = session_with_guests();
        assert!(matches!(s.paste_table(), Err(SeatingError::EmptyClipboard)));
        let req = s.request_seat(ChairRef::new(key, 0), "g0").expect("request");
        s.commit_seat(&req, MoveDecision::Move).expect("commit");
        s.copy_table(key).expect("copy");
        let pasted = s.paste_table().expect("paste");
        let src = s.layout().table(key).expect("src");
        let copy = s.layout().table(pasted).expect("copy");
        assert_eq!(copy.position, Point::new(src.position.x + 20.0, src.position.y + 20.0));
        assert_eq!(copy.chairs.len(), 4);
        assert_eq!(copy.occupied_chairs(), 0);
        assert_eq!(copy.label, "2");
    }

    #[test]
    fn moves_stay_out_of_history() {
        let (mut s, key) = session_with_guests();
        let depth = s.undo_len();
        s.move_table(key, Point::new(300.0, 200.0)).expect("move");
        assert_eq!(s.undo_len(), depth);
        assert!(!s.rotate_table(key).expect("rotate"));
        assert_eq!(s.undo_len(), depth);
    }

    #[test]
    fn reset_can_be_undone() {
        let (mut s, _) = session_with_guests();
        s.add_item(ItemKind::Stage).expect("item");
        s.reset().expect("reset");
        assert_eq!(s.room_stats(), RoomStats { guests: 0, seats: 0 });
        s.undo().expect("undo");
        assert_eq!(s.room_stats(), RoomStats { guests: 3, seats: 4 });
        assert_eq!(s.layout().items().len(), 1);
    }

    #[test]
    fn undo_keys_are_reassigned() {
        let (mut s, key) = session_with_guests();
        s.rename_table(key, "Family").expect("rename");
        s.clear_all_seats().expect("clear");
        s.undo().expect("undo");
        let key = first_key(&s);
        assert_eq!(s.layout().table(key).expect("table").label, "Family");
    }

    #[test]
    fn save_and_load_start_fresh_history() {
        let (mut s, key) = session_with_guests();
        s.auto_seat().expect("auto");
        s.copy_table(key).expect("copy");
        let saved = s.save_json().expect("save");

        let mut restored = Session::default();
        restored.load_json(&saved).expect("load");
        assert_eq!(restored.undo_len(), 0);
        assert!(restored.layout().unseated_guests().is_empty());
        assert_eq!(restored.export_guests_csv(), s.export_guests_csv());
        assert!(matches!(restored.paste_table(), Err(SeatingError::EmptyClipboard)));
    }

    #[test]
    fn unseat_empty_chair_records_nothing() {
        let (mut s, key) = session_with_guests();
        let depth = s.undo_len();
        assert_eq!(s.unseat(ChairRef::new(key, 0)).expect("unseat"), None);
        assert_eq!(s.undo_len(), depth);
    }
}

//! Guest list import and export.
//!
//! Imports read comma-separated text with a header row, as exported by
//! the common wedding RSVP sites. Column names vary between sites, so the
//! canonical columns are filled from the first non-empty alias. Every
//! source column is kept, in order, for export.

use std::borrow::Cow;
use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::info;

use crate::layout::Layout;
use crate::types::Guest;

pub const GUEST_NAME: &str = "Guest Name";
pub const PARTY_ID: &str = "Party ID";
pub const RESPONDED: &str = "Responded";
pub const RSVP_RESPONSE: &str = "RSVP Response";
/// Column appended on export with the label of the guest's table.
pub const TABLE_COLUMN: &str = "Table";
/// Key holding the guest id in layout documents.
pub const ID_COLUMN: &str = "__id";

const PARTY_ALIASES: &[&str] = &[PARTY_ID, "Group", "Group Name", "Party Name", "Household"];
const RESPONDED_ALIASES: &[&str] = &[RESPONDED, "Has RSVPed", "RSVP Status"];
const RESPONSE_ALIASES: &[&str] = &[
    RSVP_RESPONSE,
    "RSVP",
    "Response",
    "Attendance",
    "RSVP Status",
];
const FIRST_NAME_ALIASES: &[&str] = &["First Name", "First"];
const LAST_NAME_ALIASES: &[&str] = &["Last Name", "Last"];

pub type GuestRow = IndexMap<String, String>;

/// Split one line into cells. Quotes group commas; `""` is a literal quote.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match (in_quotes, ch) {
            (true, '"') if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            (true, '"') => in_quotes = false,
            (false, '"') => in_quotes = true,
            (false, ',') => cells.push(std::mem::take(&mut current)),
            (_, c) => current.push(c),
        }
    }
    cells.push(current);
    cells
}

/// Parse a header row plus records into column maps. Cells are trimmed,
/// missing trailing cells read as empty, and blank lines are skipped.
pub fn parse_csv(text: &str) -> Vec<GuestRow> {
    let mut lines = text.trim().lines().map(|l| l.trim_end_matches('\r'));
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = split_csv_line(header_line)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    lines
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let cells = split_csv_line(line);
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let value = cells.get(i).map(|c| c.trim()).unwrap_or("");
                    (h.clone(), value.to_string())
                })
                .collect()
        })
        .collect()
}

fn first_non_empty<'a>(row: &'a GuestRow, keys: &[&str]) -> &'a str {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .map(String::as_str)
        .find(|v| !v.is_empty())
        .unwrap_or("")
}

/// Fill the canonical columns from their aliases.
pub fn normalize_row(row: &mut GuestRow) {
    let party = first_non_empty(row, PARTY_ALIASES).to_string();
    row.insert(PARTY_ID.to_string(), party);

    if first_non_empty(row, &[GUEST_NAME]).is_empty() {
        let first = first_non_empty(row, FIRST_NAME_ALIASES);
        let last = first_non_empty(row, LAST_NAME_ALIASES);
        let combined = [first, last]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let name = match first_non_empty(row, &["Name"]) {
            "" => combined,
            n => n.to_string(),
        };
        row.insert(GUEST_NAME.to_string(), name);
    }

    let responded = first_non_empty(row, RESPONDED_ALIASES).to_string();
    row.insert(RESPONDED.to_string(), responded);
    let response = first_non_empty(row, RESPONSE_ALIASES).to_string();
    row.insert(RSVP_RESPONSE.to_string(), response);
}

/// Build a guest from already-normalized columns.
pub fn guest_from_columns(id: String, columns: GuestRow) -> Guest {
    let get = |k: &str| columns.get(k).cloned().unwrap_or_default();
    Guest {
        id,
        name: get(GUEST_NAME),
        party: get(PARTY_ID),
        responded: get(RESPONDED),
        response: get(RSVP_RESPONSE),
        columns,
    }
}

/// Parse and normalize a guest list. Ids are `g0, g1, …` in row order.
pub fn parse_guest_list(text: &str) -> Vec<Guest> {
    parse_csv(text)
        .into_iter()
        .enumerate()
        .map(|(idx, mut row)| {
            normalize_row(&mut row);
            guest_from_columns(format!("g{idx}"), row)
        })
        .collect()
}

fn quote_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn write_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let line: Vec<Cow<'_, str>> = cells.map(quote_cell).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

impl Layout {
    /// Replace the roster with a freshly imported guest list.
    pub fn import_guests(&mut self, text: &str) -> usize {
        let guests = parse_guest_list(text);
        let count = guests.len();
        info!(count, "guest list imported");
        self.replace_roster(guests);
        count
    }

    /// The guest list with a trailing `Table` column.
    ///
    /// The header follows the first guest's columns. Returns an empty
    /// string when there are no guests.
    pub fn export_guests(&self) -> String {
        let Some(first) = self.roster.iter().next() else {
            return String::new();
        };
        let mut headers: Vec<&str> = first
            .columns
            .keys()
            .map(String::as_str)
            .filter(|h| *h != ID_COLUMN && *h != TABLE_COLUMN)
            .collect();
        headers.push(TABLE_COLUMN);

        let mut table_of: HashMap<&str, &str> = HashMap::new();
        for table in self.tables.values() {
            for id in table.chairs.iter().filter_map(|c| c.guest.as_deref()) {
                table_of.entry(id).or_insert(table.label.as_str());
            }
        }

        let mut out = String::new();
        write_row(&mut out, headers.iter().copied());
        for guest in self.roster.iter() {
            let cells = headers.iter().map(|h| {
                if *h == TABLE_COLUMN {
                    table_of.get(guest.id.as_str()).copied().unwrap_or("")
                } else {
                    guest.columns.get(*h).map(String::as_str).unwrap_or("")
                }
            });
            write_row(&mut out, cells);
        }
        out
    }
}

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::cell::{is_stat_cell, normalize};

// Non-greedy so one match never spans two tables.
static TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<table\b[^>]*>.*?</table>").expect("valid table regex"));
static ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("valid row regex"));
static CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").expect("valid cell regex"));
static HEADER_CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<th\b").expect("valid header cell regex"));

const POSITION_SCAN: usize = 3;
const MIN_POSITION: u32 = 1;
const MAX_POSITION: u32 = 20;

/// Numeric columns of a standings row, in the order they appear after the team name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position,
    Played,
    Wins,
    OtWins,
    OtLosses,
    Losses,
    GoalsFor,
    GoalsAgainst,
    Points,
}

impl Attribute {
    pub const ALL: [Attribute; 9] = [
        Attribute::Position,
        Attribute::Played,
        Attribute::Wins,
        Attribute::OtWins,
        Attribute::OtLosses,
        Attribute::Losses,
        Attribute::GoalsFor,
        Attribute::GoalsAgainst,
        Attribute::Points,
    ];

    pub const STATS: [Attribute; 8] = [
        Attribute::Played,
        Attribute::Wins,
        Attribute::OtWins,
        Attribute::OtLosses,
        Attribute::Losses,
        Attribute::GoalsFor,
        Attribute::GoalsAgainst,
        Attribute::Points,
    ];

    /// Lower-case, space-free key that schema display names are matched against.
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Position => "position",
            Attribute::Played => "played",
            Attribute::Wins => "wins",
            Attribute::OtWins => "otwins",
            Attribute::OtLosses => "otlosses",
            Attribute::Losses => "losses",
            Attribute::GoalsFor => "goalsfor",
            Attribute::GoalsAgainst => "goalsagainst",
            Attribute::Points => "points",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub name: String,
    pub position: u32,
    pub played: u32,
    pub wins: u32,
    pub ot_wins: u32,
    pub ot_losses: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
}

impl TeamRecord {
    pub fn value(&self, attr: Attribute) -> u32 {
        match attr {
            Attribute::Position => self.position,
            Attribute::Played => self.played,
            Attribute::Wins => self.wins,
            Attribute::OtWins => self.ot_wins,
            Attribute::OtLosses => self.ot_losses,
            Attribute::Losses => self.losses,
            Attribute::GoalsFor => self.goals_for,
            Attribute::GoalsAgainst => self.goals_against,
            Attribute::Points => self.points,
        }
    }
}

/// Every `<table>…</table>` fragment in document order.
pub fn extract_all_tables(document: &str) -> Vec<&str> {
    TABLE_RE.find_iter(document).map(|m| m.as_str()).collect()
}

/// Standings rows found in one table fragment, in document order.
///
/// Header rows and anything that does not look like a ranking entry are dropped
/// without error.
pub fn parse_table(table: &str) -> Vec<TeamRecord> {
    ROW_RE
        .captures_iter(table)
        .filter(|caps| !HEADER_CELL_RE.is_match(&caps[0]))
        .filter_map(|caps| {
            let cells = CELL_RE
                .captures_iter(&caps[1])
                .map(|c| normalize(&c[1]))
                .collect::<Vec<_>>();
            parse_row(&cells)
        })
        .collect()
}

/// Builds a record from already-normalized cells.
///
/// The position is the first of the leading three cells holding 1..=20, which covers
/// layouts with and without a blank or icon column before the rank.
pub fn parse_row(cells: &[String]) -> Option<TeamRecord> {
    if cells.is_empty() {
        return None;
    }
    let (position_idx, position) = cells
        .iter()
        .take(POSITION_SCAN)
        .enumerate()
        .find_map(|(idx, cell)| {
            if !is_stat_cell(cell) {
                return None;
            }
            let n = cell.parse::<u32>().ok()?;
            (MIN_POSITION..=MAX_POSITION).contains(&n).then_some((idx, n))
        })?;

    let name_idx = position_idx + 1;
    let data_start = position_idx + 2;
    let stats = cells.get(data_start..data_start + Attribute::STATS.len())?;
    let name = cells[name_idx].as_str();
    if name.is_empty() {
        return None;
    }
    if !stats.iter().all(|c| is_stat_cell(c)) {
        return None;
    }

    let stat = |i: usize| stats[i].parse::<u32>().unwrap_or(0);
    Some(TeamRecord {
        name: name.to_string(),
        position,
        played: stat(0),
        wins: stat(1),
        ot_wins: stat(2),
        ot_losses: stat(3),
        losses: stat(4),
        goals_for: stat(5),
        goals_against: stat(6),
        points: stat(7),
    })
}

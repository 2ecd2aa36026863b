//! CSV export of the standings table.

use crate::config::EngineConfig;
use crate::logic::get_standings;
use crate::models::{TournamentError, TournamentId};
use crate::storage::Storage;
use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;

pub const CSV_HEADER: &str = "Player,Points,Wins,Losses,Draws";

#[derive(Clone, Debug, PartialEq)]
pub struct ExportRow {
    pub name: String,
    pub points: f64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

/// Standings rows in rank order.
pub fn export_rows<S: Storage>(
    store: &S,
    config: &EngineConfig,
    tournament_id: TournamentId,
) -> Result<Vec<ExportRow>, TournamentError> {
    Ok(get_standings(store, config, tournament_id)?
        .into_iter()
        .map(|s| ExportRow {
            name: s.name,
            points: s.points,
            wins: s.wins,
            losses: s.losses,
            draws: s.draws,
        })
        .collect())
}

/// Header plus one line per row. Names are always quoted; points carry one decimal.
pub fn write_csv<W: Write>(rows: &[ExportRow], mut writer: W) -> Result<(), TournamentError> {
    let persistence = |e: csv::Error| TournamentError::Persistence(e.to_string());
    // Header stays unquoted.
    writeln!(writer, "{}", CSV_HEADER).map_err(|e| TournamentError::Persistence(e.to_string()))?;
    let mut out = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(writer);
    for row in rows {
        out.write_record([
            row.name.clone(),
            format!("{:.1}", row.points),
            row.wins.to_string(),
            row.losses.to_string(),
            row.draws.to_string(),
        ])
        .map_err(persistence)?;
    }
    out.flush()
        .map_err(|e| TournamentError::Persistence(e.to_string()))
}

/// Standings of a tournament as a CSV document.
pub fn export_csv<S: Storage>(
    store: &S,
    config: &EngineConfig,
    tournament_id: TournamentId,
) -> Result<String, TournamentError> {
    let rows = export_rows(store, config, tournament_id)?;
    let mut buf = Vec::new();
    write_csv(&rows, &mut buf)?;
    String::from_utf8(buf).map_err(|e| TournamentError::Persistence(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, points: f64, wins: u32, losses: u32, draws: u32) -> ExportRow {
        ExportRow {
            name: name.to_string(),
            points,
            wins,
            losses,
            draws,
        }
    }

    #[test]
    fn quotes_names_and_formats_points() {
        let mut buf = Vec::new();
        write_csv(
            &[row("Ann", 2.5, 2, 0, 1), row("O'Neil, Bo", 1.0, 1, 2, 0)],
            &mut buf,
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Player,Points,Wins,Losses,Draws");
        assert_eq!(lines[1], "\"Ann\",2.5,2,0,1");
        assert_eq!(lines[2], "\"O'Neil, Bo\",1.0,1,2,0");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let mut buf = Vec::new();
        write_csv(&[row("The \"Ace\"", 0.0, 0, 0, 0)], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().nth(1), Some("\"The \"\"Ace\"\"\",0.0,0,0,0"));
    }
}

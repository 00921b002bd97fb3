use blaseball_api::{Game, GameStatsheet, PlayerStatsheet};
use tui::buffer::Buffer;
use tui::layout::{Constraint, Rect};
use tui::text::Line;
use tui::widgets::{Cell, Row, Table, Widget};

use crate::components::palette::{PaletteColor, resolve};
use crate::state::app_settings::ColorScheme;

// ---------------------------------------------------------------------------
// Line score
// ---------------------------------------------------------------------------

/// Width of the team label column in the line score.
const LINE_LABEL_W: u16 = 12;
/// Width of one inning column.
const INNING_W: u16 = 4;

/// Runs per inning for both teams, with totals.
pub struct LineScore<'a> {
    pub game: &'a Game,
    pub statsheet: Option<&'a GameStatsheet>,
    pub scheme: ColorScheme,
}

impl Widget for &LineScore<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 3 || area.width < LINE_LABEL_W + INNING_W {
            return;
        }
        let header = resolve(PaletteColor::Header, self.scheme);
        let text = resolve(PaletteColor::Text, self.scheme);
        let dim = resolve(PaletteColor::Dim, self.scheme);

        let (away, home) = match self.statsheet {
            Some(s) => (s.away_team_runs_by_inning.as_slice(), s.home_team_runs_by_inning.as_slice()),
            None => (&[][..], &[][..]),
        };
        let innings = away.len().max(home.len()).max(9);

        let mut header_row = format!("{:<w$}", "", w = LINE_LABEL_W as usize);
        for inning in 1..=innings {
            header_row.push_str(&format!("{inning:>w$}", w = INNING_W as usize));
        }
        header_row.push_str(&format!("{:>w$}", "R", w = INNING_W as usize + 1));
        buf.set_stringn(area.x, area.y, &header_row, area.width as usize, header);

        let rows = [
            (self.game.away_team_nickname.as_str(), away),
            (self.game.home_team_nickname.as_str(), home),
        ];
        for (offset, (name, runs)) in rows.into_iter().enumerate() {
            let y = area.y + 1 + offset as u16;
            let label: String = name.chars().take(LINE_LABEL_W as usize - 1).collect();
            buf.set_stringn(area.x, y, &label, area.width as usize, text);

            for inning in 0..innings {
                let x = area.x + LINE_LABEL_W + inning as u16 * INNING_W;
                if x + INNING_W > area.x + area.width {
                    break;
                }
                let (cell, style) = match runs.get(inning) {
                    Some(r) => (format_stat(*r), text),
                    None => ("-".to_string(), dim),
                };
                buf.set_string(x, y, format!("{cell:>w$}", w = INNING_W as usize), style);
            }

            let total_x = area.x + LINE_LABEL_W + innings as u16 * INNING_W;
            if total_x + INNING_W < area.x + area.width {
                let total: f64 = runs.iter().sum();
                buf.set_string(total_x, y, format!("{:>w$}", format_stat(total), w = INNING_W as usize + 1), header);
            }
        }
    }
}

/// Runs and counters can be fractional; whole numbers print without a
/// decimal point.
pub fn format_stat(runs: f64) -> String {
    if runs.fract() == 0.0 {
        format!("{runs:.0}")
    } else {
        format!("{runs:.1}")
    }
}

// ---------------------------------------------------------------------------
// Player statistics table
// ---------------------------------------------------------------------------

type Column = (&'static str, fn(&PlayerStatsheet) -> f64);

/// Batting and pitching counters shown per player, in display order.
pub const COLUMNS: [Column; 16] = [
    ("AB", |p| p.at_bats),
    ("R", |p| p.runs),
    ("H", |p| p.hits),
    ("2B", |p| p.doubles),
    ("3B", |p| p.triples),
    ("HR", |p| p.home_runs),
    ("4B", |p| p.quadruples),
    ("RBI", |p| p.rbis),
    ("BB", |p| p.walks),
    ("SB", |p| p.stolen_bases),
    ("K", |p| p.struckouts),
    ("PT", |p| p.pitches_thrown),
    ("SO", |p| p.strikeouts),
    ("HA", |p| p.hits_allowed),
    ("ER", |p| p.earned_runs),
    ("BBI", |p| p.walks_issued),
];

/// One team's players as a table, in the order given.
pub struct StatsTable<'a> {
    pub title: String,
    pub players: Vec<&'a PlayerStatsheet>,
    pub scheme: ColorScheme,
}

impl Widget for &StatsTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let header_style = resolve(PaletteColor::Header, self.scheme);
        let text = resolve(PaletteColor::Text, self.scheme);

        let header = Row::new(
            std::iter::once(Cell::from(self.title.clone()))
                .chain(COLUMNS.iter().map(|(label, _)| Cell::from(Line::from(*label).right_aligned()))),
        )
        .style(header_style);

        let rows = self.players.iter().map(|p| {
            Row::new(
                std::iter::once(Cell::from(p.name.clone())).chain(
                    COLUMNS
                        .iter()
                        .map(|(_, value)| Cell::from(Line::from(format_stat(value(p))).right_aligned())),
                ),
            )
            .style(text)
        });

        let widths = std::iter::once(Constraint::Min(20)).chain(COLUMNS.iter().map(|(label, _)| {
            Constraint::Length(label.len().max(3) as u16)
        }));

        Widget::render(Table::new(rows, widths).header(header).column_spacing(1), area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(buf: &Buffer) -> String {
        let width = buf.area.width as usize;
        buf.content
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn runs_format() {
        assert_eq!(format_stat(3.0), "3");
        assert_eq!(format_stat(0.0), "0");
        assert_eq!(format_stat(1.5), "1.5");
    }

    #[test]
    fn line_score_totals_runs() {
        let game = Game {
            away_team_nickname: "Crabs".into(),
            home_team_nickname: "Tigers".into(),
            ..Default::default()
        };
        let statsheet = GameStatsheet {
            away_team_runs_by_inning: vec![1.0, 0.0, 2.0],
            home_team_runs_by_inning: vec![0.0, 0.5],
            ..Default::default()
        };
        let widget = LineScore { game: &game, statsheet: Some(&statsheet), scheme: ColorScheme::Dark };
        let area = Rect::new(0, 0, 60, 3);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);

        let rendered = text_of(&buf);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[1].starts_with("Crabs"));
        assert!(lines[1].trim_end().ends_with('3'));
        assert!(lines[2].trim_end().ends_with("0.5"));
    }

    #[test]
    fn stats_table_lists_players_in_order() {
        let players = [
            PlayerStatsheet { name: "Jessica Telephone".into(), at_bats: 4.0, hits: 2.0, ..Default::default() },
            PlayerStatsheet { name: "York Silk".into(), home_runs: 1.0, ..Default::default() },
        ];
        let widget = StatsTable {
            title: "Crabs".into(),
            players: players.iter().collect(),
            scheme: ColorScheme::Light,
        };
        let area = Rect::new(0, 0, 90, 4);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);

        let rendered = text_of(&buf);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].contains("AB") && lines[0].contains("BBI"));
        assert!(lines[1].starts_with("Jessica Telephone"));
        assert!(lines[2].starts_with("York Silk"));
    }

    #[test]
    fn pitcher_strikeouts_have_their_own_column() {
        let players = [PlayerStatsheet {
            name: "Pitching Machine".into(),
            strikeouts: 7.0,
            struckouts: 1.0,
            rbis: 1.5,
            ..Default::default()
        }];
        let widget = StatsTable {
            title: "Crabs".into(),
            players: players.iter().collect(),
            scheme: ColorScheme::Dark,
        };
        let area = Rect::new(0, 0, 90, 2);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);

        let rendered = text_of(&buf);
        let lines: Vec<&str> = rendered.lines().collect();
        let cells = |line: &str| line.split_whitespace().map(str::to_string).collect::<Vec<_>>();
        let header = cells(lines[0]);
        let row = cells(lines[1]);
        // Header starts with the team title, the row with a two-word name.
        let value = |label: &str| {
            let idx = header.iter().position(|h| h == label).unwrap();
            row[idx + 1].clone()
        };
        assert_eq!(value("SO"), "7");
        assert_eq!(value("K"), "1");
        assert_eq!(value("RBI"), "1.5");
    }
}

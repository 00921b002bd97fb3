use log::error;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::box_score::{LineScore, StatsTable};
use crate::components::palette::{PaletteColor, border_color, resolve};
use crate::state::app_settings::ColorScheme;
use crate::state::live::ChannelState;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::sync::{GameView, ViewStatus};
use crate::ui::layout::LayoutAreas;
use blaseball_api::Game;

static TABS: &[&str; 2] = &["Schedule", "Box Score"];

const HELP_TEXT: &str = "q=quit  1=Schedule  2=Box Score  ?=help
j/k=move  h/l=day  [/]=season  Enter=open game  Esc=back
t=light/dark  f=full screen  \"=logs";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Schedule => draw_schedule(f, layout.main, app),
            MenuItem::BoxScore => draw_box_score(f, layout.main, app),
            MenuItem::Help => draw_placeholder(f, layout.main, HELP_TEXT, app.settings.color_scheme),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs, app);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });

    if let Err(e) = result {
        error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = resolve(PaletteColor::Text, app.settings.color_scheme);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Schedule => 0,
        MenuItem::BoxScore => 1,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_schedule(f: &mut Frame, area: Rect, app: &App) {
    let scheme = app.settings.color_scheme;
    let schedule = &app.state.schedule;

    let title = match schedule.day_count {
        Some(count) => format!(" Season {}, Day {} of {} ", schedule.season + 1, schedule.day + 1, count),
        None => format!(" Season {}, Day {} ", schedule.season + 1, schedule.day + 1),
    };
    let block = default_border(border_color(scheme)).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [key_legend, content] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    f.render_widget(
        Paragraph::new("Keys: h/l=day  [/]=season  j/k=move  Enter=box score  ?=help  q=quit")
            .style(resolve(PaletteColor::Dim, scheme)),
        key_legend,
    );

    if !schedule.is_current() {
        let msg = match app.state.last_error.as_deref() {
            Some(err) => format!("error: {err}"),
            None => "loading...".to_string(),
        };
        draw_message(f, content, &msg, scheme);
        return;
    }
    if schedule.games.is_empty() {
        draw_message(f, content, "No games scheduled", scheme);
        return;
    }

    let lines: Vec<Line> = schedule
        .games
        .iter()
        .enumerate()
        .take(content.height as usize)
        .map(|(idx, game)| {
            let style = if idx == schedule.selected {
                resolve(PaletteColor::Accent, scheme)
            } else {
                resolve(PaletteColor::Text, scheme)
            };
            let marker = if idx == schedule.selected { "> " } else { "  " };
            let status = if game.game_complete { "final" } else { "" };
            Line::from(vec![
                Span::styled(format!("{marker}{}", matchup(game)), style),
                Span::styled(format!("  {status}"), resolve(PaletteColor::Dim, scheme)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), content);
}

fn draw_box_score(f: &mut Frame, area: Rect, app: &App) {
    let scheme = app.settings.color_scheme;
    let view: &GameView = &app.state.view;

    let title = match view.game.as_ref() {
        Some(game) => format!(" Season {}, Day {} ", game.season + 1, game.day + 1),
        None => " Box Score ".to_string(),
    };
    let block = default_border(border_color(scheme)).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let game = match (view.status(), view.game.as_ref()) {
        (ViewStatus::NoGameSelected, _) => {
            return draw_message(f, inner, "no game selected", scheme);
        }
        (ViewStatus::Error(err), _) => {
            return draw_error(f, inner, err, scheme);
        }
        (ViewStatus::Loading, _) | (_, None) => {
            return draw_message(f, inner, "loading...", scheme);
        }
        (_, Some(game)) => game,
    };

    let [header, line_score, tables] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(4),
        Constraint::Fill(1),
    ])
    .areas(inner);

    draw_game_header(f, header, game, app);
    f.render_widget(
        &LineScore { game, statsheet: view.game_statsheets.first(), scheme },
        line_score,
    );

    if view.status() == ViewStatus::WaitingForStart {
        return draw_message(f, tables, "waiting for game to start", scheme);
    }

    let [away_area, home_area] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(tables);
    let teams = [
        (game.away_team_name.as_str(), game.away_team.as_str(), away_area),
        (game.home_team_name.as_str(), game.home_team.as_str(), home_area),
    ];
    for (name, team_id, rect) in teams {
        let title = if view.lineup_known { name.to_string() } else { format!("{name} (unordered)") };
        let table = StatsTable {
            title,
            players: view.team_players(team_id).collect(),
            scheme,
        };
        f.render_widget(&table, rect);
    }
}

fn draw_game_header(f: &mut Frame, area: Rect, game: &Game, app: &App) {
    let scheme = app.settings.color_scheme;
    let live = &app.state.live;

    let live_span = if game.game_complete {
        Span::styled("final", resolve(PaletteColor::Dim, scheme))
    } else {
        match live.state {
            Some(ChannelState::Open) => Span::styled(ChannelState::Open.label(), resolve(PaletteColor::Live, scheme)),
            Some(state) => Span::styled(state.label(), resolve(PaletteColor::Dim, scheme)),
            None => Span::raw(""),
        }
    };
    let updated = live
        .last_update
        .as_deref()
        .map(|t| format!("  updated {t}"))
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled(matchup(game), resolve(PaletteColor::Header, scheme))),
        Line::from(vec![live_span, Span::styled(updated, resolve(PaletteColor::Dim, scheme))]),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn matchup(game: &Game) -> String {
    format!(
        "{} {} at {} {}",
        game.away_team_emoji, game.away_team_name, game.home_team_emoji, game.home_team_name
    )
}

fn draw_message(f: &mut Frame, area: Rect, msg: &str, scheme: ColorScheme) {
    f.render_widget(
        Paragraph::new(msg)
            .style(resolve(PaletteColor::Dim, scheme))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_error(f: &mut Frame, area: Rect, err: &str, scheme: ColorScheme) {
    f.render_widget(
        Paragraph::new(format!("error: {err}"))
            .style(resolve(PaletteColor::Error, scheme))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str, scheme: ColorScheme) {
    let block = default_border(border_color(scheme));
    let inner = block.inner(area);
    f.render_widget(block, area);
    draw_message(f, inner, msg, scheme);
}

fn draw_logs(f: &mut Frame, area: Rect, app: &App) {
    let scheme = app.settings.color_scheme;
    let widget = TuiLoggerWidget::default()
        .block(default_border(border_color(scheme)).title(" Logs "))
        .style_error(resolve(PaletteColor::Error, scheme))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(resolve(PaletteColor::Text, scheme));
    f.render_widget(widget, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => resolve(PaletteColor::Error, app.settings.color_scheme),
        _ => resolve(PaletteColor::Text, app.settings.color_scheme),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}

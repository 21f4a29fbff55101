//! Devices table. Enter transfers playback to the selected device.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Rect},
    Frame,
};

use spotify_proto::protocol::Device;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    list_window::RowSurface,
    theme::C_SECONDARY,
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        table_surface::TableSurface,
    },
};

const HEADER: [&str; 2] = ["Name", "Type"];

pub struct Devices {
    devices: Vec<Device>,
    table: TableSurface,
    badge: String,
}

impl Devices {
    pub fn new() -> Self {
        let mut table = TableSurface::new(2, true);
        table.append_row(HEADER.map(String::from));
        Self {
            devices: Vec::new(),
            table,
            badge: String::new(),
        }
    }

    /// Rebuild rows from the shared device list and highlight the web player.
    fn sync(&mut self, state: &AppState) {
        if state.devices == self.devices {
            return;
        }
        self.devices = state.devices.clone();
        self.table.clear_rows();
        self.table.append_row(HEADER.map(String::from));
        for device in &self.devices {
            self.table
                .append_row([device.name.clone(), device.kind.clone()]);
        }
        let web_player = self
            .devices
            .iter()
            .position(|d| d.id == state.web_player_id);
        self.table.select_quietly(web_player.map(|i| i + 1));
        self.badge = self.devices.len().to_string();
    }
}

impl Default for Devices {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Devices {
    fn id(&self) -> ComponentId {
        ComponentId::Devices
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        self.sync(state);
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.table.step_down();
                vec![]
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.table.step_up();
                vec![]
            }
            KeyCode::Enter => self
                .table
                .selected_data_row()
                .and_then(|row| self.devices.get(row))
                .map(|d| vec![Action::TransferPlayback(d.id.clone())])
                .unwrap_or_default(),
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.sync(state);
        let badge = (!self.badge.is_empty()).then(|| Badge {
            text: &self.badge,
            color: C_SECONDARY,
        });
        let block = pane_chrome("Devices", Some('7'), focused, badge);
        let widths = [Constraint::Min(20), Constraint::Length(14)];
        self.table.draw(frame, area, block, &widths, focused);
    }

    fn min_height(&self) -> u16 {
        4
    }
}

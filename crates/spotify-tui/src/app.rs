//! Component-based event loop.
//!
//! - `App` owns every component and the `AppState` they read from.
//! - A `tokio::mpsc` channel carries `AppMessage`s in from background tasks
//!   (terminal events, the refresh ticker, the playback listener and the
//!   short-lived remote calls).
//! - Components return `Vec<Action>`; the App applies each one. Remote
//!   commands run on their own task and report back as messages.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use spotify_proto::config::Config;
use spotify_proto::protocol::{Device, PlaybackState, SearchResults};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{AlbumList, Devices, PlaybackPanel, ResultKind, ResultsTable, SearchInput},
    error::{ApiError, FetchError, TransportCommandError},
    focus::FocusRing,
    list_window::{ListWindow, PageConfig},
    spotify::{PlayTarget, SpotifyApi},
    widgets::status_bar::{self, InputMode},
};

/// Delay between a transport command and re-reading the now-playing track,
/// so the player has switched before we ask.
const NOW_PLAYING_DELAY: Duration = Duration::from_millis(500);

// ── Internal event bus ────────────────────────────────────────────────────────

pub enum AppMessage {
    Event(Event),
    /// Redraw tick from the refresh loop.
    Refresh,
    NowPlaying(Option<String>),
    Devices(Vec<Device>),
    SearchResults(SearchResults),
    AlbumsLoaded(Result<ListWindow, FetchError>),
    /// Pushed by the web player over the device socket.
    Playback(PlaybackState),
    Log(String),
}

/// What to re-read once a command went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FollowUp {
    None,
    NowPlaying,
    Devices,
}

pub struct App {
    playback: PlaybackPanel,
    album_list: AlbumList,
    search_input: SearchInput,
    songs: ResultsTable,
    albums: ResultsTable,
    artists: ResultsTable,
    devices: Devices,

    focus: FocusRing,
    state: AppState,

    client: Arc<dyn SpotifyApi>,
    page_config: PageConfig,
    tx: mpsc::Sender<AppMessage>,
    should_quit: bool,
}

impl App {
    pub fn new(
        client: Arc<dyn SpotifyApi>,
        web_player_id: String,
        debug: bool,
        config: &Config,
    ) -> (Self, mpsc::Receiver<AppMessage>) {
        let (tx, rx) = mpsc::channel::<AppMessage>(1024);
        let page_config = PageConfig::from_config(config);
        let app = Self {
            playback: PlaybackPanel::new(),
            album_list: AlbumList::new(page_config),
            search_input: SearchInput::new(),
            songs: ResultsTable::new(ResultKind::Songs),
            albums: ResultsTable::new(ResultKind::Albums),
            artists: ResultsTable::new(ResultKind::Artists),
            devices: Devices::new(),
            focus: FocusRing::default(),
            state: AppState::new(web_player_id, debug),
            client,
            page_config,
            tx,
            should_quit: false,
        };
        (app, rx)
    }

    /// Sender for background producers such as the refresh loop.
    pub fn sender(&self) -> mpsc::Sender<AppMessage> {
        self.tx.clone()
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<AppMessage>,
        mut playback_rx: mpsc::UnboundedReceiver<PlaybackState>,
    ) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            while !event_tx.is_closed() {
                match event::poll(Duration::from_millis(250)) {
                    Ok(true) => match event::read() {
                        Ok(ev) => {
                            if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    },
                    Ok(false) => {}
                    Err(_) => break,
                }
            }
        });

        // ── Background task: playback listener ────────────────────────────────
        let playback_tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(state) = playback_rx.recv().await {
                if playback_tx.send(AppMessage::Playback(state)).await.is_err() {
                    break;
                }
            }
            debug!("playback listener stopped");
        });

        self.start_session();

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            let Some(msg) = rx.recv().await else {
                break;
            };
            const MAX_DRAIN: usize = 256;
            let mut redraw = self.handle_message(msg);
            let mut drained = 0usize;
            while drained < MAX_DRAIN {
                let Ok(next) = rx.try_recv() else {
                    break;
                };
                drained += 1;
                redraw |= self.handle_message(next);
            }
            needs_redraw = redraw;
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        info!("UI loop finished");

        Ok(())
    }

    /// Kick off the initial remote reads: hand playback to the web player,
    /// then devices and the current track, and load the album library.
    fn start_session(&mut self) {
        self.state.albums_loading = true;
        self.push_log(if self.state.debug {
            "started in debug mode".to_string()
        } else {
            format!("connected, web player {}", self.state.web_player_id)
        });

        let client = self.client.clone();
        let tx = self.tx.clone();
        let device_id = self.state.web_player_id.clone();
        tokio::spawn(async move {
            if let Err(source) = client.transfer_playback(&device_id, true).await {
                let err = TransportCommandError {
                    command: "transfer playback",
                    source,
                };
                error!("{}", err);
                let _ = tx.send(AppMessage::Log(err.to_string())).await;
            }
            let _ = tx.send(AppMessage::Devices(fetch_devices(client.as_ref()).await)).await;
            let _ = tx
                .send(AppMessage::NowPlaying(fetch_now_playing(client.as_ref()).await))
                .await;
        });

        let client = self.client.clone();
        let tx = self.tx.clone();
        let page_config = self.page_config;
        tokio::spawn(async move {
            let mut window = ListWindow::new(page_config);
            let loaded = window.load(client.as_ref()).await.map(|_| window);
            let _ = tx.send(AppMessage::AlbumsLoaded(loaded)).await;
        });
    }

    /// Returns whether the screen needs a redraw.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return false;
                    }
                    for action in self.handle_key(key) {
                        self.apply_action(action);
                    }
                }
                Event::Resize(w, h) => self.apply_action(Action::Resize(w, h)),
                _ => return false,
            },
            AppMessage::Refresh => {}
            AppMessage::NowPlaying(text) => self.state.now_playing = text,
            AppMessage::Devices(devices) => self.state.devices = devices,
            AppMessage::SearchResults(results) => self.state.search_results = results,
            AppMessage::AlbumsLoaded(Ok(window)) => {
                self.state.albums_loading = false;
                self.state.albums_error = None;
                self.push_log(format!("loaded {} albums", window.len()));
                self.album_list.set_window(window);
            }
            AppMessage::AlbumsLoaded(Err(e)) => {
                error!("could not load albums: {}", e);
                self.state.albums_loading = false;
                self.state.albums_error = Some(e.to_string());
                self.push_log(format!("could not load albums: {}", e));
            }
            AppMessage::Playback(playback) => {
                debug!("playback state: {:?}", playback);
                self.state.now_playing = Some(playback.display());
                // painted by the next refresh tick
                return false;
            }
            AppMessage::Log(line) => self.push_log(line),
        }
        true
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }

        match key.code {
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            _ => {}
        }

        if self.state.input_mode == InputMode::Normal {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return vec![Action::Quit],
                KeyCode::Char('n') => return vec![Action::Next],
                KeyCode::Char('p') => return vec![Action::Previous],
                KeyCode::Char(c @ '1'..='7') => {
                    let pos = c as usize - '1' as usize;
                    return vec![Action::FocusPane(ComponentId::FOCUS_ORDER[pos])];
                }
                _ => {}
            }
        }

        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::Transport) => self.playback.handle_key(key, s),
            Some(ComponentId::AlbumList) => self.album_list.handle_key(key, s),
            Some(ComponentId::SearchInput) => self.search_input.handle_key(key, s),
            Some(ComponentId::SongResults) => self.songs.handle_key(key, s),
            Some(ComponentId::AlbumResults) => self.albums.handle_key(key, s),
            Some(ComponentId::ArtistResults) => self.artists.handle_key(key, s),
            Some(ComponentId::Devices) => self.devices.handle_key(key, s),
            None => vec![],
        }
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    fn apply_action(&mut self, action: Action) {
        match &action {
            Action::Resize(..) | Action::Noop => {}
            _ => debug!("apply_action: {:?}", action),
        }
        match action {
            // ── Playback ──────────────────────────────────────────────────────
            Action::Play(target) => {
                self.spawn_command("play", FollowUp::NowPlaying, move |client| async move {
                    client.play(target).await
                });
            }
            Action::PlayTrack(uri) => {
                self.spawn_command("play track", FollowUp::NowPlaying, move |client| async move {
                    match client.play(PlayTarget::Uris(vec![uri.clone()])).await {
                        Ok(()) => Ok(()),
                        Err(e) => {
                            debug!("{} is not playable as a track ({}), trying as context", uri, e);
                            client.play(PlayTarget::Context(uri)).await
                        }
                    }
                });
            }
            Action::Pause => {
                self.spawn_command("pause", FollowUp::None, |client| async move {
                    client.pause().await
                });
            }
            Action::Next => {
                self.spawn_command("next", FollowUp::NowPlaying, |client| async move {
                    client.next().await
                });
            }
            Action::Previous => {
                self.spawn_command("previous", FollowUp::NowPlaying, |client| async move {
                    client.previous().await
                });
            }
            Action::TransferPlayback(device_id) => {
                self.spawn_command("transfer playback", FollowUp::Devices, move |client| async move {
                    client.transfer_playback(&device_id, true).await
                });
            }

            // ── Search ────────────────────────────────────────────────────────
            Action::Search(query) => {
                self.state.last_query = Some(query.clone());
                self.push_log(format!("searching for \"{}\"", query));
                let client = self.client.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let results = match client.search(&query).await {
                        Ok(results) => results,
                        Err(e) => {
                            warn!("search for {:?} failed: {}", query, e);
                            let _ = tx.send(AppMessage::Log(format!("search failed: {}", e))).await;
                            SearchResults::default()
                        }
                    };
                    let _ = tx.send(AppMessage::SearchResults(results)).await;
                });
            }

            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
                self.sync_input_mode();
            }
            Action::FocusPrev => {
                self.focus.prev();
                self.sync_input_mode();
            }
            Action::FocusPane(id) => {
                self.focus.set(id);
                self.sync_input_mode();
            }

            // ── System ────────────────────────────────────────────────────────
            Action::Quit => {
                info!("quit requested");
                self.should_quit = true;
            }
            Action::Resize(..) | Action::Noop => {}
        }
    }

    /// Run a remote command on its own task. Failures are logged and shown in
    /// the status bar; on success `follow_up` is re-read.
    fn spawn_command<F, Fut>(&self, command: &'static str, follow_up: FollowUp, run: F)
    where
        F: FnOnce(Arc<dyn SpotifyApi>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if let Err(source) = run(client.clone()).await {
                let err = TransportCommandError { command, source };
                warn!("{}", err);
                let _ = tx.send(AppMessage::Log(err.to_string())).await;
                return;
            }
            match follow_up {
                FollowUp::None => {}
                FollowUp::NowPlaying => {
                    tokio::time::sleep(NOW_PLAYING_DELAY).await;
                    let text = fetch_now_playing(client.as_ref()).await;
                    let _ = tx.send(AppMessage::NowPlaying(text)).await;
                }
                FollowUp::Devices => {
                    let devices = fetch_devices(client.as_ref()).await;
                    let _ = tx.send(AppMessage::Devices(devices)).await;
                }
            }
        });
    }

    fn sync_input_mode(&mut self) {
        self.state.input_mode = if self.focus.is_focused(ComponentId::SearchInput) {
            InputMode::Search
        } else {
            InputMode::Normal
        };
    }

    fn push_log(&mut self, msg: String) {
        self.state.push_log(msg);
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        // ── Outer layout: body | log line | keys ─────────────────────────────
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(outer[0]);

        self.draw_left(frame, columns[0]);
        self.draw_right(frame, columns[1]);

        status_bar::draw_log_bar(frame, outer[1], self.state.last_log(), self.state.debug);
        status_bar::draw_keys_bar(frame, outer[2], self.state.input_mode, self.focus.current());
    }

    fn draw_left(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(self.playback.min_height()),
                Constraint::Min(self.album_list.min_height()),
            ])
            .split(area);

        let s = &self.state;
        let f = &self.focus;
        self.playback
            .draw(frame, rows[0], f.is_focused(self.playback.id()), s);
        self.album_list
            .draw(frame, rows[1], f.is_focused(self.album_list.id()), s);
    }

    fn draw_right(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(8),
            ])
            .split(area);

        let results = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(rows[1]);

        let s = &self.state;
        let f = &self.focus;
        self.search_input
            .draw(frame, rows[0], f.is_focused(self.search_input.id()), s);
        self.songs
            .draw(frame, results[0], f.is_focused(self.songs.id()), s);
        self.albums
            .draw(frame, results[1], f.is_focused(self.albums.id()), s);
        self.artists
            .draw(frame, results[2], f.is_focused(self.artists.id()), s);
        self.devices
            .draw(frame, rows[2], f.is_focused(self.devices.id()), s);
    }
}

/// `None` when nothing is playing or the lookup failed.
async fn fetch_now_playing(client: &dyn SpotifyApi) -> Option<String> {
    match client.currently_playing().await {
        Ok(track) => track.map(|t| t.display()),
        Err(e) => {
            warn!("could not fetch currently playing track: {}", e);
            None
        }
    }
}

/// Empty on failure.
async fn fetch_devices(client: &dyn SpotifyApi) -> Vec<Device> {
    match client.devices().await {
        Ok(devices) => devices,
        Err(e) => {
            warn!("could not fetch devices: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::fixtures::{FixtureClient, DEBUG_DEVICE_ID, FIXTURE_ALBUM_COUNT};

    fn app() -> (App, mpsc::Receiver<AppMessage>) {
        App::new(
            Arc::new(FixtureClient::new()),
            DEBUG_DEVICE_ID.to_string(),
            true,
            &Config::default(),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_message(AppMessage::Event(Event::Key(key(code))));
    }

    #[tokio::test]
    async fn test_global_keys() {
        let (mut app, _rx) = app();
        assert_eq!(app.handle_key(key(KeyCode::Char('n'))), vec![Action::Next]);
        assert_eq!(app.handle_key(key(KeyCode::Char('p'))), vec![Action::Previous]);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), vec![Action::Quit]);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            vec![Action::Quit]
        );
        assert_eq!(
            app.handle_key(key(KeyCode::Char('3'))),
            vec![Action::FocusPane(ComponentId::SearchInput)]
        );
    }

    #[tokio::test]
    async fn test_search_focus_captures_typing() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.state.input_mode, InputMode::Search);

        // 'q' and 'n' are text while searching
        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Char('n'));
        assert!(!app.should_quit);
        assert!(!app.search_input.is_empty());

        // Esc clears, a second Esc quits
        press(&mut app, KeyCode::Esc);
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_tab_cycles_focus_and_mode() {
        let (mut app, _rx) = app();
        assert!(app.focus.is_focused(ComponentId::Transport));
        press(&mut app, KeyCode::Tab);
        assert!(app.focus.is_focused(ComponentId::AlbumList));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.state.input_mode, InputMode::Search);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.state.input_mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_startup_loads_albums_devices_and_now_playing() {
        let (mut app, mut rx) = app();
        app.start_session();
        assert!(app.state.albums_loading);

        let mut seen_albums = false;
        let mut seen_devices = false;
        let mut seen_now_playing = false;
        while !(seen_albums && seen_devices && seen_now_playing) {
            let msg = rx.recv().await.unwrap();
            match &msg {
                AppMessage::AlbumsLoaded(_) => seen_albums = true,
                AppMessage::Devices(_) => seen_devices = true,
                AppMessage::NowPlaying(_) => seen_now_playing = true,
                _ => {}
            }
            app.handle_message(msg);
        }

        assert!(!app.state.albums_loading);
        assert_eq!(app.album_list.len(), FIXTURE_ALBUM_COUNT);
        assert!(!app.state.devices.is_empty());
    }

    #[tokio::test]
    async fn test_playback_state_updates_label_without_redraw() {
        let (mut app, _rx) = app();
        let redraw = app.handle_message(AppMessage::Playback(PlaybackState {
            current_track_name: "Interstellar Main Theme".into(),
            current_album_name: "Interstellar".into(),
            current_artist_name: "Hans Zimmer".into(),
        }));
        assert!(!redraw);
        assert!(app.state.now_playing_text().contains("Hans Zimmer"));
        assert!(app.handle_message(AppMessage::Refresh));
    }

    #[tokio::test]
    async fn test_failed_album_load_is_reported() {
        let (mut app, _rx) = app();
        app.state.albums_loading = true;
        app.handle_message(AppMessage::AlbumsLoaded(Err(FetchError {
            pages_fetched: 1,
            offset: 25,
            source: ApiError::Other("boom".into()),
        })));
        assert!(!app.state.albums_loading);
        assert!(app.state.albums_error.is_some());
        assert!(app.state.last_log().unwrap().contains("boom"));
        assert_eq!(app.album_list.len(), 0);
    }
}

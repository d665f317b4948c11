use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

use crate::api::types::{DayReport, SimpleProfile, UserId, UserProfile};
use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::loader::{ActionResult, ActionRunner, LoadResult, Panel, Selection, SelectionLoader};
use crate::metrics::{validate_user_id, ActivityHistory, DayActivity};

/// Lists the user can move through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Friends,
    FriendsOfFriends,
    Strangers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    UserInput,
    ConfirmReset,
    Help,
}

/// State of a panel fed by a background request
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }
}

pub struct App {
    client: ApiClient,
    loader: SelectionLoader,
    actions: ActionRunner,
    pub config: AppConfig,

    pub section: Section,
    pub popup: Popup,

    // Simulation
    pub day: u64,
    pub total_users: u64,
    pub last_report: DayReport,
    pub history: ActivityHistory,

    // Selected user and its panels
    pub selection: Option<Selection>,
    pub profile: Loadable<UserProfile>,
    pub friends: Loadable<Vec<SimpleProfile>>,
    pub friends_of_friends: Loadable<Vec<SimpleProfile>>,
    pub strangers: Loadable<Vec<SimpleProfile>>,
    pub selected_friend: usize,
    pub selected_fof: usize,
    pub selected_stranger: usize,

    // User ID popup
    pub input_buffer: String,
    pub input_error: Option<String>,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    // Simulation actions in flight
    pub advancing_day: bool,
    pub resetting: bool,
    pub loading_random_user: bool,
    pub refreshing_total: bool,
}

impl App {
    pub async fn new(client: ApiClient, config: AppConfig) -> Result<Self> {
        let mut app = Self {
            client,
            loader: SelectionLoader::new(),
            actions: ActionRunner::new(),
            config,

            section: Section::Friends,
            popup: Popup::None,

            day: 0,
            total_users: 0,
            last_report: DayReport::default(),
            history: ActivityHistory::default(),

            selection: None,
            profile: Loadable::Idle,
            friends: Loadable::Idle,
            friends_of_friends: Loadable::Idle,
            strangers: Loadable::Idle,
            selected_friend: 0,
            selected_fof: 0,
            selected_stranger: 0,

            input_buffer: String::new(),
            input_error: None,

            status_message: None,
            status_message_time: None,

            advancing_day: false,
            resetting: false,
            loading_random_user: false,
            refreshing_total: false,
        };

        // Backend may not be up yet, the count is refreshed after every action
        match app.client.total_count().await {
            Ok(n) => app.total_users = n,
            Err(e) => {
                tracing::warn!("Initial total count failed: {}", e);
                app.set_status(format!("Backend unreachable: {}", e));
            }
        }

        Ok(app)
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Set a status message (auto-clears after the configured timeout)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn selected_user(&self) -> Option<UserId> {
        self.selection.as_ref().map(|s| s.user_id)
    }

    /// Ask the backend for the current user count
    pub fn refresh_total(&mut self) {
        if self.refreshing_total {
            return;
        }
        self.refreshing_total = true;
        self.actions.total_count(&self.client);
    }

    /// Advance the simulation by one day; ignored while a day or reset is pending
    pub fn advance_day(&mut self) {
        if self.advancing_day || self.resetting {
            return;
        }
        self.advancing_day = true;
        self.actions.advance_day(&self.client);
    }

    /// Reset the backend; local state is only dropped once it succeeds
    pub fn reset(&mut self) {
        if self.advancing_day || self.resetting {
            return;
        }
        self.resetting = true;
        self.actions.reset(&self.client);
    }

    /// Ask the backend for a valid user and load it
    pub fn random_user(&mut self) {
        if self.loading_random_user {
            return;
        }
        self.loading_random_user = true;
        self.actions.random_user(&self.client);
    }

    /// Apply a finished simulation action
    pub fn apply_action(&mut self, result: ActionResult) {
        match result {
            ActionResult::DayAdvanced { report, total } => {
                self.advancing_day = false;
                let report = match report {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::warn!("Simulate day failed: {}", e);
                        self.set_status(format!("Error: {}", e));
                        return;
                    }
                };

                self.day += 1;
                self.last_report = report;
                self.history.push(DayActivity::from(&report));
                tracing::info!(day = self.day, ?report, "simulated day");

                match total {
                    Some(Ok(n)) => {
                        self.total_users = n;
                        self.set_status(format!("Day {} simulated", self.day));
                    }
                    Some(Err(e)) => {
                        self.set_status(format!("Day {} simulated, count refresh failed: {}", self.day, e))
                    }
                    None => self.set_status(format!("Day {} simulated", self.day)),
                }

                // The selected user's graph changes with the day
                if let Some(user_id) = self.selected_user() {
                    self.select_user(user_id);
                }
            }
            ActionResult::Reset { result, total } => {
                self.resetting = false;
                if let Err(e) = result {
                    tracing::warn!("Reset failed: {}", e);
                    self.set_status(format!("Error: {}", e));
                    return;
                }

                self.day = 0;
                self.last_report = DayReport::default();
                self.history.clear();
                self.clear_selection();
                tracing::info!("simulation reset");

                match total {
                    Some(Ok(n)) => {
                        self.total_users = n;
                        self.set_status("Simulation reset");
                    }
                    Some(Err(e)) => {
                        self.set_status(format!("Simulation reset, count refresh failed: {}", e))
                    }
                    None => self.set_status("Simulation reset"),
                }
            }
            ActionResult::RandomUser(result) => {
                self.loading_random_user = false;
                match result {
                    Ok(user_id) => {
                        self.input_buffer = user_id.to_string();
                        self.select_user(user_id);
                    }
                    Err(e) => self.set_status(format!("Error: {}", e)),
                }
            }
            ActionResult::TotalCount(result) => {
                self.refreshing_total = false;
                match result {
                    Ok(n) => {
                        self.total_users = n;
                        self.set_status(format!("{} users", n));
                    }
                    Err(e) => self.set_status(format!("Error: {}", e)),
                }
            }
        }
    }

    /// Validate the typed ID locally, only selecting it when in range
    pub fn submit_user_id(&mut self) -> bool {
        match validate_user_id(&self.input_buffer, self.total_users) {
            Ok(user_id) => {
                self.input_error = None;
                self.select_user(user_id);
                true
            }
            Err(message) => {
                self.input_error = Some(message);
                false
            }
        }
    }

    /// Replace the selection, cancelling whatever the previous one was loading
    pub fn select_user(&mut self, user_id: UserId) {
        self.selection = Some(self.loader.spawn(&self.client, user_id));
        self.profile = Loadable::Loading;
        self.friends = Loadable::Loading;
        self.friends_of_friends = Loadable::Loading;
        self.strangers = Loadable::Loading;
        self.selected_friend = 0;
        self.selected_fof = 0;
        self.selected_stranger = 0;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.profile = Loadable::Idle;
        self.friends = Loadable::Idle;
        self.friends_of_friends = Loadable::Idle;
        self.strangers = Loadable::Idle;
        self.selected_friend = 0;
        self.selected_fof = 0;
        self.selected_stranger = 0;
        self.input_buffer.clear();
        self.input_error = None;
    }

    /// Apply one finished load, ignoring results for an older selection
    pub fn apply_load(&mut self, result: LoadResult) {
        let current = self.selection.as_ref().map(|s| s.generation);
        if current != Some(result.generation) {
            tracing::debug!(
                user_id = result.user_id,
                generation = result.generation,
                "discarding stale load"
            );
            return;
        }

        match result.panel {
            Panel::Profile(r) => self.profile = to_loadable(r),
            Panel::Friends(r) => self.friends = to_loadable(r),
            Panel::FriendsOfFriends(r) => self.friends_of_friends = to_loadable(r),
            Panel::Strangers(r) => self.strangers = to_loadable(r),
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        if self.popup != Popup::None {
            return self.handle_popup_key(key).await;
        }

        self.handle_normal_key(key).await
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Tab => {
                self.section = match self.section {
                    Section::Friends => Section::FriendsOfFriends,
                    Section::FriendsOfFriends => Section::Strangers,
                    Section::Strangers => Section::Friends,
                };
            }
            KeyCode::BackTab => {
                self.section = match self.section {
                    Section::Friends => Section::Strangers,
                    Section::FriendsOfFriends => Section::Friends,
                    Section::Strangers => Section::FriendsOfFriends,
                };
            }

            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),

            // Walk the graph: select the highlighted user
            KeyCode::Enter => {
                if let Some(user_id) = self.highlighted_user() {
                    self.input_buffer = user_id.to_string();
                    self.select_user(user_id);
                }
            }

            KeyCode::Char('n') => self.advance_day(),
            KeyCode::Char('r') => self.random_user(),
            KeyCode::Char('R') => self.popup = Popup::ConfirmReset,
            KeyCode::Char('/') | KeyCode::Char('i') => {
                self.input_error = None;
                self.popup = Popup::UserInput;
            }
            KeyCode::Char('x') => {
                if self.selection.is_some() {
                    self.clear_selection();
                    self.set_status("Selection cleared");
                }
            }
            KeyCode::Char('u') => self.refresh_total(),
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    async fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::UserInput => {
                match key.code {
                    KeyCode::Esc => {
                        self.input_error = None;
                        self.popup = Popup::None;
                    }
                    KeyCode::Enter => {
                        if self.submit_user_id() {
                            self.popup = Popup::None;
                        }
                    }
                    KeyCode::Backspace => {
                        self.input_buffer.pop();
                        self.input_error = None;
                    }
                    KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.input_buffer.clear();
                        self.input_error = None;
                    }
                    KeyCode::Char(c) if c.is_ascii_digit() => {
                        if self.input_buffer.len() < 20 {
                            self.input_buffer.push(c);
                        }
                        self.input_error = None;
                    }
                    _ => {}
                }
                Ok(())
            }
            Popup::ConfirmReset => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => {
                        self.popup = Popup::None;
                        self.reset();
                    }
                    KeyCode::Char('n') | KeyCode::Esc => {
                        self.popup = Popup::None;
                    }
                    _ => {}
                }
                Ok(())
            }
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
            Popup::None => Ok(()),
        }
    }

    fn section_list(&self, section: Section) -> &[SimpleProfile] {
        let list = match section {
            Section::Friends => &self.friends,
            Section::FriendsOfFriends => &self.friends_of_friends,
            Section::Strangers => &self.strangers,
        };
        list.loaded().map(|v| v.as_slice()).unwrap_or(&[])
    }

    fn cursor_mut(&mut self, section: Section) -> &mut usize {
        match section {
            Section::Friends => &mut self.selected_friend,
            Section::FriendsOfFriends => &mut self.selected_fof,
            Section::Strangers => &mut self.selected_stranger,
        }
    }

    pub fn cursor(&self, section: Section) -> usize {
        match section {
            Section::Friends => self.selected_friend,
            Section::FriendsOfFriends => self.selected_fof,
            Section::Strangers => self.selected_stranger,
        }
    }

    fn move_down(&mut self) {
        let len = self.section_list(self.section).len();
        if len > 0 {
            let cursor = self.cursor_mut(self.section);
            *cursor = (*cursor + 1) % len;
        }
    }

    fn move_up(&mut self) {
        let len = self.section_list(self.section).len();
        if len > 0 {
            let cursor = self.cursor_mut(self.section);
            *cursor = cursor.checked_sub(1).unwrap_or(len - 1);
        }
    }

    pub fn highlighted_user(&self) -> Option<UserId> {
        self.section_list(self.section)
            .get(self.cursor(self.section))
            .map(|p| p.user_id)
    }

    pub fn is_busy(&self) -> bool {
        self.advancing_day
            || self.resetting
            || self.loading_random_user
            || self.refreshing_total
            || self.profile.is_loading()
            || self.friends.is_loading()
            || self.friends_of_friends.is_loading()
            || self.strangers.is_loading()
    }

    pub async fn tick(&mut self) -> Result<()> {
        for result in self.actions.drain() {
            self.apply_action(result);
        }
        for result in self.loader.drain() {
            self.apply_load(result);
        }

        // Clear status message after timeout
        if let Some(time) = self.status_message_time {
            if time.elapsed() >= Duration::from_secs(self.config.status_timeout_secs) {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
impl App {
    /// Tick until nothing is in flight
    pub async fn settle(&mut self) {
        for _ in 0..300 {
            self.tick().await.unwrap();
            if !self.is_busy() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("background work never finished");
    }
}

fn to_loadable<T>(result: std::result::Result<T, crate::api::ApiError>) -> Loadable<T> {
    match result {
        Ok(value) => Loadable::Loaded(value),
        Err(e) => Loadable::Failed(e.to_string()),
    }
}

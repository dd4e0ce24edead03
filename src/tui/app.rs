//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration
//! - Async store mutations via the background worker

use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use crate::adapters::{SimulatedFheCipher, SqliteLedger, StaticWallet};
use crate::application::{Snapshot, SyncService};
use crate::domain::RecordStatus;
use crate::ports::Wallet;
use crate::TcmError;

use super::styles::HerbalTheme;
use super::ui::{
    dashboard::{render_dashboard, DashboardState},
    detail::render_detail,
    form::{render_form, RecordFormState},
    render_privacy_note,
};
use super::worker::{TaskProgress, TaskWorker, TaskWorkerHandle};

type Service = SyncService<SqliteLedger, SimulatedFheCipher>;

/// Current screen/view in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    CreateForm,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToastKind {
    Pending,
    Success,
    Error,
}

/// Transient transaction-status message shown at the bottom of the screen.
struct Toast {
    kind: ToastKind,
    message: String,
    since: Instant,
}

/// Main application state
pub struct App {
    /// Current screen
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    /// Sync service (wrapped in Arc<Mutex> for the worker)
    sync_service: Arc<Mutex<Service>>,

    /// Identity collaborator
    wallet: Arc<StaticWallet>,

    /// Latest record snapshot; replaced wholesale, never patched
    snapshot: Snapshot,

    /// Dashboard state
    dashboard_state: DashboardState,

    /// Create-form state
    form_state: RecordFormState,

    /// Record shown on the detail screen
    detail_id: Option<String>,

    /// Transaction toast
    toast: Option<Toast>,

    /// Pending background worker (if running)
    pending_worker: Option<TaskWorkerHandle>,
}

impl App {
    /// Create a new application instance using default adapters.
    ///
    /// Convenience constructor; for more control use `with_dependencies()`.
    ///
    /// # Errors
    /// Returns error if the local ledger cannot be opened.
    pub fn new() -> Result<Self> {
        let db_path = std::env::var("TCMLEDGER_DB_PATH")
            .unwrap_or_else(|_| "tcmledger.db".to_string());
        let ledger = Arc::new(SqliteLedger::new(&db_path)?);
        let cipher = Arc::new(SimulatedFheCipher::new());
        let wallet = Arc::new(StaticWallet::from_env());

        let service = Arc::new(Mutex::new(SyncService::new(ledger, cipher)));
        Self::with_dependencies(service, wallet)
    }

    /// Create application with injected dependencies (Composition Root).
    ///
    /// # Errors
    /// Reserved for construction failures of future dependencies.
    pub fn with_dependencies(
        sync_service: Arc<Mutex<Service>>,
        wallet: Arc<StaticWallet>,
    ) -> Result<Self> {
        Ok(Self {
            screen: Screen::Dashboard,
            should_quit: false,
            sync_service,
            wallet,
            snapshot: Arc::new(Vec::new()),
            dashboard_state: DashboardState::default(),
            form_state: RecordFormState::default(),
            detail_id: None,
            toast: None,
            pending_worker: None,
        })
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // First synchronization pass; a cold ledger is a soft failure.
        self.refresh();

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_worker();
            self.expire_toast();

            terminal.draw(|f| {
                let area = f.area();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(area);

                let content_area = chunks[0];
                let footer_area = chunks[1];

                match self.screen {
                    Screen::Dashboard => render_dashboard(
                        f,
                        content_area,
                        &self.dashboard_state,
                        &self.snapshot,
                        self.wallet.current_account().as_deref(),
                    ),
                    Screen::CreateForm => render_form(f, content_area, &self.form_state),
                    Screen::Detail => {
                        match self.detail_record() {
                            Some(record) => {
                                let is_owner = self
                                    .wallet
                                    .current_account()
                                    .is_some_and(|a| record.owner.eq_ignore_ascii_case(&a));
                                render_detail(f, content_area, &record, is_owner);
                            }
                            None => {
                                // The record disappeared from the snapshot.
                                render_dashboard(
                                    f,
                                    content_area,
                                    &self.dashboard_state,
                                    &self.snapshot,
                                    self.wallet.current_account().as_deref(),
                                );
                            }
                        }
                    }
                }

                match &self.toast {
                    Some(toast) => render_toast(f, footer_area, toast),
                    None => render_privacy_note(f, footer_area),
                }
            })?;

            // Handle input (short poll to stay responsive)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Poll the background worker for progress updates.
    fn poll_worker(&mut self) {
        if self.pending_worker.is_none() {
            return;
        }

        loop {
            let progress = match self
                .pending_worker
                .as_ref()
                .and_then(|worker| worker.try_recv())
            {
                Some(p) => p,
                None => break,
            };

            match progress {
                TaskProgress::Encrypting => {
                    self.set_toast(ToastKind::Pending, "Encrypting TCM data...");
                }
                TaskProgress::Submitting => {
                    self.set_toast(ToastKind::Pending, "Submitting to the ledger...");
                }
                TaskProgress::Computing => {
                    self.set_toast(ToastKind::Pending, "Running encrypted computation...");
                }
                TaskProgress::Complete(message) => {
                    self.set_toast(ToastKind::Success, &message);
                    self.pending_worker = None;
                    // The service reloaded after the mutation; adopt its view.
                    self.adopt_service_snapshot();
                    break;
                }
                TaskProgress::Error(message) => {
                    self.set_toast(ToastKind::Error, &message);
                    self.pending_worker = None;
                    break;
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::CreateForm => self.handle_form_key(key),
            Screen::Detail => self.handle_detail_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.form_state = RecordFormState::default();
                self.screen = Screen::CreateForm;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.refresh();
            }
            KeyCode::Up => {
                self.dashboard_state.selected =
                    self.dashboard_state.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.dashboard_state.selected + 1 < self.snapshot.len() {
                    self.dashboard_state.selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(record) = self.snapshot.get(self.dashboard_state.selected) {
                    self.detail_id = Some(record.id.clone());
                    self.screen = Screen::Detail;
                }
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.start_transition_on_selected(RecordStatus::Analyzed);
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.start_transition_on_selected(RecordStatus::Archived);
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.form_state.clear_sensitive();
                self.screen = Screen::Dashboard;
            }
            KeyCode::Up => {
                self.form_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.form_state.next_field();
            }
            KeyCode::Char(c) => {
                self.form_state.input_char(c);
            }
            KeyCode::Backspace => {
                self.form_state.delete_char();
            }
            KeyCode::Delete => {
                self.form_state.clear_field();
            }
            KeyCode::Enter => {
                self.submit_form();
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Enter => {
                self.detail_id = None;
                self.screen = Screen::Dashboard;
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                if let Some(id) = self.detail_id.clone() {
                    self.start_transition(&id, RecordStatus::Analyzed);
                }
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                if let Some(id) = self.detail_id.clone() {
                    self.start_transition(&id, RecordStatus::Archived);
                }
            }
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        if self.pending_worker.is_some() {
            return;
        }

        let Some(actor) = self.wallet.current_account() else {
            self.form_state.error_message =
                Some("Connect a wallet before submitting".to_string());
            return;
        };

        match self.form_state.to_draft() {
            Ok(draft) => {
                self.set_toast(ToastKind::Pending, "Encrypting TCM data...");

                let worker =
                    TaskWorker::spawn_create(self.sync_service.clone(), draft, actor);
                self.pending_worker = Some(worker);

                // Drop plaintext from the UI immediately.
                self.form_state.clear_sensitive();
                self.screen = Screen::Dashboard;
            }
            Err(e) => {
                self.form_state.error_message = Some(e);
            }
        }
    }

    fn start_transition_on_selected(&mut self, target: RecordStatus) {
        let id = match self.snapshot.get(self.dashboard_state.selected) {
            Some(record) => record.id.clone(),
            None => return,
        };
        self.start_transition(&id, target);
    }

    fn start_transition(&mut self, id: &str, target: RecordStatus) {
        if self.pending_worker.is_some() {
            return;
        }

        // The account is read at action time: switching wallets between load
        // and action changes the authorization outcome, by design.
        let Some(actor) = self.wallet.current_account() else {
            self.set_toast(ToastKind::Error, "Connect a wallet first");
            return;
        };

        let message = match target {
            RecordStatus::Archived => "Archiving record...",
            _ => "Analyzing TCM pattern...",
        };
        self.set_toast(ToastKind::Pending, message);

        let worker = TaskWorker::spawn_transition(
            self.sync_service.clone(),
            id.to_string(),
            target,
            actor,
        );
        self.pending_worker = Some(worker);
    }

    /// Run a full reload and adopt the resulting snapshot.
    fn refresh(&mut self) {
        let reload = match self.sync_service.lock() {
            Ok(mut svc) => Some(svc.full_reload()),
            Err(_) => None,
        };
        let result = match reload {
            Some(r) => r,
            None => {
                self.set_toast(ToastKind::Error, "Sync service lock poisoned");
                return;
            }
        };

        match result {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                self.dashboard_state.ledger_ready = true;
                self.clamp_selection();
            }
            Err(e @ TcmError::Unavailable) => {
                self.dashboard_state.ledger_ready = false;
                self.set_toast(ToastKind::Error, &e.to_string());
            }
            Err(e) => {
                self.set_toast(ToastKind::Error, &e.to_string());
            }
        }
    }

    /// Adopt the service's current snapshot without forcing a new reload.
    fn adopt_service_snapshot(&mut self) {
        let snap = self.sync_service.lock().ok().map(|svc| svc.snapshot());
        if let Some(snapshot) = snap {
            self.snapshot = snapshot;
            self.dashboard_state.ledger_ready = true;
            self.clamp_selection();
        }
    }

    fn clamp_selection(&mut self) {
        if self.dashboard_state.selected >= self.snapshot.len() {
            self.dashboard_state.selected = self.snapshot.len().saturating_sub(1);
        }
    }

    fn detail_record(&self) -> Option<crate::domain::DiagnosisRecord> {
        let id = self.detail_id.as_deref()?;
        self.snapshot.iter().find(|r| r.id == id).cloned()
    }

    fn set_toast(&mut self, kind: ToastKind, message: &str) {
        self.toast = Some(Toast {
            kind,
            message: message.to_string(),
            since: Instant::now(),
        });
    }

    /// Auto-hide finished toasts; pending ones stay while the worker runs.
    fn expire_toast(&mut self) {
        let expired = match &self.toast {
            Some(toast) => match toast.kind {
                ToastKind::Pending => false,
                ToastKind::Success => toast.since.elapsed() > Duration::from_secs(2),
                ToastKind::Error => toast.since.elapsed() > Duration::from_secs(3),
            },
            None => false,
        };

        if expired {
            self.toast = None;
        }
    }
}

fn render_toast(f: &mut ratatui::Frame, area: Rect, toast: &Toast) {
    let (label, style) = match toast.kind {
        ToastKind::Pending => ("WORKING", HerbalTheme::info()),
        ToastKind::Success => ("OK", HerbalTheme::success()),
        ToastKind::Error => ("ERROR", HerbalTheme::danger()),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {label} "), style),
        Span::styled(toast.message.clone(), HerbalTheme::text()),
    ]);

    let p = Paragraph::new(vec![line]).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(HerbalTheme::border()),
    );
    f.render_widget(p, area);
}

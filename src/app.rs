//! Application loop - Pagine, input da terminale ed eventi della connessione
//!
//! Un solo task possiede tutto lo stato: il loop alterna righe di input, eventi
//! della connessione e tick del polling di presenza con `tokio::select!`.

use crate::core::{AppError, AppState, Config, SessionStore};
use crate::dtos::{ClientRequest, ServerFrame};
use crate::services::{self, LoginOutcome};
use crate::views::auth::{CONNECTION_FAILED, TITLE};
use crate::views::main::{HELP, render_header};
use crate::views::{AuthForm, AuthStep, BackTo, render_about};
use crate::ws::{ConnectionEvent, ConnectionManager, Redraw, process_event};
use std::fmt::Display;
use std::future::pending;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Duration, Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Auth,
    Main,
    About(BackTo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App<W: Write> {
    config: Config,
    out: W,
    session: SessionStore,
    connections: ConnectionManager,
    events: UnboundedReceiver<ConnectionEvent>,
    page: Page,
    auth: AuthForm,
    state: Option<AppState>,
    poll: Option<Interval>,
}

impl<W: Write> App<W> {
    pub fn new(config: Config, out: W) -> Self {
        Self::with_session(config, SessionStore::new(), out)
    }

    /// Avvia con un session store già popolato (sessione ripristinata)
    pub fn with_session(config: Config, session: SessionStore, out: W) -> Self {
        let (connections, events) =
            ConnectionManager::new(config.server_url.clone(), config.ping_interval());
        Self {
            config,
            out,
            session,
            connections,
            events,
            page: Page::Auth,
            auth: AuthForm::new(),
            state: None,
            poll: None,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn state(&self) -> Option<&AppState> {
        self.state.as_ref()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Esegue il loop fino a `/quit` o alla fine dell'input e ritorna l'output.
    #[instrument(skip_all)]
    pub async fn run<R: AsyncBufRead + Unpin>(mut self, input: R) -> Result<W, AppError> {
        info!("Client started");
        self.start().await?;

        let mut lines = input.lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let flow = match line {
                        Ok(Some(line)) => self.handle_line(&line).await?,
                        Ok(None) => {
                            debug!("Input closed");
                            Flow::Quit
                        }
                        Err(e) => {
                            error!("Failed to read input: {:?}", e);
                            Flow::Quit
                        }
                    };
                    if flow == Flow::Quit {
                        break;
                    }
                }

                Some(event) = self.events.recv() => {
                    self.handle_connection_event(event).await?;
                }

                _ = next_tick(&mut self.poll) => {
                    self.on_poll_tick();
                }
            }
        }

        self.connections.close();
        info!("Client stopped");
        Ok(self.out)
    }

    /// Sessione con token: si entra direttamente nella main view, altrimenti auth
    async fn start(&mut self) -> Result<(), AppError> {
        if self.session.is_authenticated() {
            info!("Restoring previous session");
            self.enter_main(true).await
        } else {
            self.show_auth()
        }
    }

    // ********************* INPUT **********************//

    async fn handle_line(&mut self, line: &str) -> Result<Flow, AppError> {
        let line = line.trim();
        if line == "/quit" {
            return Ok(Flow::Quit);
        }

        match self.page {
            Page::About(back) => {
                if line == "/back" {
                    self.leave_about(back).await?;
                } else {
                    self.print("Type /back to go back.")?;
                }
            }
            Page::Auth => self.handle_auth_line(line).await?,
            Page::Main => self.handle_main_line(line).await?,
        }
        Ok(Flow::Continue)
    }

    async fn handle_auth_line(&mut self, line: &str) -> Result<(), AppError> {
        if line == "/about" {
            return self.show_about(BackTo::Auth);
        }

        match self.auth.step {
            AuthStep::Login => {
                self.auth.set_login(line);
                self.render_auth()
            }
            AuthStep::Password if line.is_empty() => {
                self.auth.back_to_login();
                self.render_auth()
            }
            AuthStep::Password => {
                self.auth.set_password(line);
                if self.auth.can_submit() {
                    self.submit_login().await
                } else {
                    self.render_auth()
                }
            }
            AuthStep::Waiting => self.print("Logging in..."),
        }
    }

    /// Apre una connessione nuova per il login e manda USER_LOGIN.
    /// La risposta arriva come evento della connessione.
    #[instrument(skip(self))]
    async fn submit_login(&mut self) -> Result<(), AppError> {
        let credentials = self.auth.credentials();
        let request = match services::login_request(&credentials) {
            Ok(request) => request,
            Err(e) => {
                self.auth.fail(e.to_string());
                return self.render_auth();
            }
        };

        self.auth.start_waiting();
        self.render_auth()?;

        match self.connections.open().await {
            Ok(connection) => {
                let sent = connection.send(request);
                self.connections.set(connection);
                if let Err(e) = sent {
                    warn!("Login request not sent: {}", e);
                    self.auth.fail(CONNECTION_FAILED);
                    self.render_auth()?;
                }
            }
            Err(e) => {
                warn!("Login connection failed: {}", e);
                self.auth.fail(CONNECTION_FAILED);
                self.render_auth()?;
            }
        }
        Ok(())
    }

    async fn handle_main_line(&mut self, line: &str) -> Result<(), AppError> {
        let (command, arg) = split_command(line);
        match command {
            Some("/about") => return self.show_about(BackTo::Main),
            Some("/logout") => return self.logout(),
            Some("/help") => return self.print(HELP),
            _ => {}
        }

        let Some(state) = self.state.as_mut() else {
            warn!("Main view without session state");
            return self.show_auth();
        };

        // ogni comando produce le view da ridisegnare e un'eventuale nota per l'utente
        let result: Result<(Redraw, Option<String>), AppError> = match command {
            Some("/users") => Ok((Redraw::ROSTER, None)),
            Some("/search") => {
                services::set_search(state, arg);
                Ok((Redraw::ROSTER, None))
            }
            Some("/open") => {
                services::open_conversation(state, arg)
                    .map(|_| (Redraw::ROSTER.merge(Redraw::DIALOG), None))
            }
            Some("/read") => {
                let redraw = if services::acknowledge(state) {
                    Redraw::DIALOG
                } else {
                    Redraw::NONE
                };
                Ok((redraw, None))
            }
            Some("/cancel") => {
                if services::cancel_edit(state) {
                    Ok((Redraw::DIALOG, None))
                } else {
                    Ok((Redraw::NONE, Some("Not editing.".to_string())))
                }
            }
            Some("/edit") => parse_index(arg)
                .and_then(|index| services::begin_edit(state, index))
                .map(|text| (Redraw::DIALOG, Some(format!("Editing: {}", text)))),
            Some("/delete") => parse_index(arg)
                .and_then(|index| services::delete_message(state, index))
                .map(|_| (Redraw::NONE, None)),
            Some(other) => Ok((
                Redraw::NONE,
                Some(format!("Unknown command {}. Type /help.", other)),
            )),
            None if line.is_empty() => Ok((Redraw::NONE, None)),
            None => services::submit(state, line).map(|_| (Redraw::NONE, None)),
        };

        match result {
            Ok((redraw, note)) => {
                self.render_redraw(redraw)?;
                match note {
                    Some(note) => self.print(note),
                    None => Ok(()),
                }
            }
            Err(e) => {
                debug!(error = %e, "Command failed");
                self.print(format!("! {}", e))
            }
        }
    }

    // ********************* CONNESSIONE **********************//

    async fn handle_connection_event(&mut self, event: ConnectionEvent) -> Result<(), AppError> {
        if !self.connections.is_current(event.connection_id()) {
            debug!(
                connection = event.connection_id(),
                "Event from replaced connection ignored"
            );
            return Ok(());
        }

        match event {
            ConnectionEvent::Frame(_, frame) => self.handle_frame(frame).await,
            ConnectionEvent::Error(_, message) => {
                warn!(error = %message, "Connection error");
                self.on_connection_lost()
            }
            ConnectionEvent::Closed(_) => {
                warn!("Connection to server closed");
                self.on_connection_lost()
            }
        }
    }

    async fn handle_frame(&mut self, frame: ServerFrame) -> Result<(), AppError> {
        // il login in attesa si chiude su qualsiasi pagina, anche dall'about
        if self.auth.is_waiting() {
            return match services::login_outcome(&frame.event) {
                LoginOutcome::Accepted => {
                    let credentials = self.auth.credentials();
                    services::complete_login(&mut self.session, &credentials);
                    self.auth = AuthForm::new();
                    self.enter_main(false).await
                }
                LoginOutcome::Rejected(reason) => {
                    info!(reason = %reason, "Login rejected");
                    self.auth.fail(reason);
                    self.render_auth_if_visible()
                }
                LoginOutcome::Ignored => Ok(()),
            };
        }

        let Some(state) = self.state.as_mut() else {
            debug!(kind = frame.event.kind(), "Frame without session ignored");
            return Ok(());
        };

        let redraw = process_event(state, frame.event);
        if self.page == Page::Main {
            self.render_redraw(redraw)?;
        }
        Ok(())
    }

    /// Nessun reconnect automatico: il login in corso fallisce, la main view resta
    /// com'è e le richieste successive vengono perse.
    fn on_connection_lost(&mut self) -> Result<(), AppError> {
        if self.auth.is_waiting() {
            self.auth.fail(CONNECTION_FAILED);
            return self.render_auth_if_visible();
        }
        Ok(())
    }

    fn on_poll_tick(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        if let Err(e) = services::request_presence(state) {
            debug!("Presence poll skipped: {}", e);
        }
    }

    // ********************* NAVIGAZIONE **********************//

    /// Entra nella main view. Con `restore` la connessione viene (ri)aperta, USER_LOGIN
    /// viene rimandato con le credenziali salvate e il polling parte dopo una pausa.
    #[instrument(skip(self))]
    async fn enter_main(&mut self, restore: bool) -> Result<(), AppError> {
        let Some(me) = self.session.login().map(str::to_owned) else {
            warn!("No stored login, back to auth");
            return self.show_auth();
        };

        let mut state = AppState::new(&me);
        let mut delay = Duration::ZERO;

        if restore {
            match self.connections.get().await {
                Ok(connection) => {
                    if let Some(credentials) = self.session.credentials() {
                        if let Err(e) = connection.send(ClientRequest::login(credentials)) {
                            warn!("Re-login not sent: {}", e);
                        }
                    }
                    state.attach_outbox(connection.outbox());
                    delay = self.config.login_settle_delay();
                }
                Err(e) => warn!("Main view without connection: {}", e),
            }
        } else if let Some(connection) = self.connections.current() {
            state.attach_outbox(connection.outbox());
        }

        let mut poll = interval_at(Instant::now() + delay, self.config.presence_poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.state = Some(state);
        self.poll = Some(poll);
        self.page = Page::Main;
        info!(me = %me, "Main view entered");
        self.render_main()
    }

    fn logout(&mut self) -> Result<(), AppError> {
        match self.state.take() {
            Some(state) => services::logout(&state, &mut self.session),
            None => self.session.forget_login(),
        }
        self.connections.close();
        self.poll = None;
        self.show_auth()
    }

    fn show_about(&mut self, back: BackTo) -> Result<(), AppError> {
        self.page = Page::About(back);
        self.print(render_about())
    }

    async fn leave_about(&mut self, back: BackTo) -> Result<(), AppError> {
        match back {
            BackTo::Main if self.state.is_some() => {
                self.page = Page::Main;
                self.render_main()
            }
            BackTo::Main => self.enter_main(true).await,
            BackTo::Auth => {
                // il form resta com'era: un login in attesa non va perso
                self.page = Page::Auth;
                self.print(format!("=== {} ===", TITLE))?;
                self.render_auth()
            }
        }
    }

    fn show_auth(&mut self) -> Result<(), AppError> {
        self.page = Page::Auth;
        self.auth = AuthForm::new();
        self.print(format!("=== {} ===", TITLE))?;
        self.render_auth()
    }

    // ********************* RENDER **********************//

    fn render_auth(&mut self) -> Result<(), AppError> {
        let form = self.auth.to_string();
        self.print(form)
    }

    /// Dall'about il form si vede al ritorno con /back
    fn render_auth_if_visible(&mut self) -> Result<(), AppError> {
        if self.page == Page::Auth {
            self.render_auth()
        } else {
            Ok(())
        }
    }

    fn render_main(&mut self) -> Result<(), AppError> {
        let Some(state) = self.state.as_ref() else {
            return Ok(());
        };
        let header = render_header(&state.me);
        let roster = services::roster_view(state);
        let dialog = services::dialog_view(state);
        self.print(header)?;
        self.print(roster)?;
        self.print(dialog)?;
        self.print("Type /help for commands.")
    }

    fn render_redraw(&mut self, redraw: Redraw) -> Result<(), AppError> {
        let Some(state) = self.state.as_ref() else {
            return Ok(());
        };
        let roster = redraw.roster.then(|| services::roster_view(state));
        let dialog = redraw.dialog.then(|| services::dialog_view(state));
        if let Some(roster) = roster {
            self.print(roster)?;
        }
        if let Some(dialog) = dialog {
            self.print(dialog)?;
        }
        Ok(())
    }

    fn print(&mut self, text: impl Display) -> Result<(), AppError> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Tick del polling; senza timer attivo non si completa mai
async fn next_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending::<()>().await,
    }
}

/// `/cmd argomento` -> (Some("/cmd"), "argomento"); testo libero -> (None, testo)
fn split_command(line: &str) -> (Option<&str>, &str) {
    if !line.starts_with('/') {
        return (None, line);
    }
    match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (Some(command), arg.trim()),
        None => (Some(line), ""),
    }
}

fn parse_index(arg: &str) -> Result<usize, AppError> {
    arg.parse::<usize>()
        .map_err(|_| AppError::validation("Expected a message number").with_details(arg.to_string()))
}

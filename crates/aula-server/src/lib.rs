//! Line-delimited TCP front end for the Aula reservation engine.
//!
//! One thread per connection. Requests are single lines, first token the
//! command verb, comma-separated fixed-arity fields. Every request yields
//! exactly one machine-parsable response: `OK`, `OK:<payload>`, or
//! `ERR:<KIND>:<message>`; multi-line query results are terminated by
//! `END`. Workflow notifications are pushed asynchronously as
//! `NOTIFY,...` lines on the same connection.
//!
//! The [`TestServer`] helper starts a server on a random port for
//! integration testing.

pub mod config;

pub use config::ServerConfig;

use aula_core::{
    CancelRequest, ChangeCandidate, ChangeSubmission, Channel, Directory, Dispatcher, Engine,
    EngineError, OriginalRef, PendingRef, StaticDirectory, StoreLock, SubmitRequest,
};
use aula_schema::{Classroom, RoomKind, UserId};
use aula_store::{validate_recipient_id, Catalog, Outbox, RoomStatus, RoomStatusStore, StoreLayout};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const END_MARKER: &str = "END";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("engine error: {0}")]
    Core(#[from] EngineError),
    #[error("store error: {0}")]
    Store(#[from] aula_store::StoreError),
}

/// Shared handles every connection thread works against.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub dispatcher: Arc<Dispatcher>,
    pub directory: Arc<dyn Directory>,
}

/// Construct the full engine stack from a config: store layout, process
/// lock, catalog, dispatcher, directory. Returned lock must be kept alive
/// for the lifetime of the server.
pub fn build_state(config: &ServerConfig) -> Result<(AppState, StoreLock), ServerError> {
    let layout = StoreLayout::new(&config.data_dir);
    layout.initialize()?;
    let lock = StoreLock::acquire(&layout.lock_file())?;

    let catalog = Arc::new(Catalog::open(&layout)?);
    let status = Arc::new(RoomStatusStore::open(&layout)?);
    let dispatcher = Arc::new(
        Dispatcher::new(Outbox::new(&layout))
            .with_pacing(Duration::from_millis(config.drain_pacing_ms)),
    );
    let mut directory = StaticDirectory::new();
    for (id, name) in &config.users {
        directory.insert(id, name);
    }
    let directory: Arc<dyn Directory> = Arc::new(directory);

    let engine = Arc::new(Engine::new(
        &layout,
        catalog,
        status,
        Arc::clone(&dispatcher),
        Arc::clone(&directory),
    ));

    Ok((
        AppState {
            engine,
            dispatcher,
            directory,
        },
        lock,
    ))
}

/// Per-connection session state: identity is bound by `CONNECT`.
#[derive(Default)]
pub struct Session {
    pub user: Option<UserId>,
}

struct TcpChannel {
    stream: Mutex<TcpStream>,
}

impl Channel for TcpChannel {
    fn push(&self, line: &str) -> std::io::Result<()> {
        let mut stream = self
            .stream
            .lock()
            .map_err(|_| std::io::Error::other("channel lock poisoned"))?;
        writeln!(stream, "{line}")?;
        stream.flush()
    }
}

fn ok() -> Vec<String> {
    vec!["OK".to_owned()]
}

fn ok_payload(payload: impl std::fmt::Display) -> Vec<String> {
    vec![format!("OK:{payload}")]
}

fn err(kind: &str, message: impl std::fmt::Display) -> Vec<String> {
    vec![format!("ERR:{kind}:{message}")]
}

/// Map an engine error to its wire form. Storage and unexpected failures
/// are logged with full context and converted to a generic message.
fn render_err(op: &str, e: &EngineError) -> Vec<String> {
    match e.kind() {
        "STORAGE" => {
            error!("storage failure during {op}: {e}");
            err("STORAGE", "internal storage error")
        }
        "UNEXPECTED" | "STATE" => {
            error!("unexpected failure during {op}: {e}");
            err("UNEXPECTED", "internal error")
        }
        kind => err(kind, e),
    }
}

fn listing(mut lines: Vec<String>) -> Vec<String> {
    lines.push(END_MARKER.to_owned());
    lines
}

/// Execute one request line. Responses come back as lines to write;
/// `CONNECT` additionally pushes queued notifications through `channel`.
pub fn execute(
    state: &AppState,
    session: &mut Session,
    channel: &Arc<dyn Channel>,
    line: &str,
) -> Vec<String> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    let verb = fields[0].trim();

    match verb {
        "CONNECT" => handle_connect(state, session, channel, &fields),
        "RESERVE" => handle_reserve(state, session, &fields),
        "APPROVE" | "REJECT" => handle_decision(state, session, verb, &fields),
        "CANCEL" => handle_cancel(state, session, &fields),
        "CHANGE" => handle_change(state, session, &fields),
        "CHANGE_FULL" => handle_change_full(state, session, &fields),
        "LIST_PENDING" => match state.engine.pending_requests() {
            Ok(records) => listing(records.iter().map(aula_schema::Reservation::encode).collect()),
            Err(e) => render_err(verb, &e),
        },
        "LIST_CHANGES" => match state.engine.change_requests() {
            Ok(records) => listing(records.iter().map(aula_schema::ChangeRecord::encode).collect()),
            Err(e) => render_err(verb, &e),
        },
        "LIST_APPROVED" => handle_list_approved(state, &fields),
        "MY_RESERVATIONS" => {
            let Some(user) = session.user.clone() else {
                return err("ACCESS_DENIED", "not connected");
            };
            match state.engine.reservations_for(user.as_str()) {
                Ok(records) => {
                    listing(records.iter().map(aula_schema::Reservation::encode).collect())
                }
                Err(e) => render_err(verb, &e),
            }
        }
        "PENDING_COUNT" => match state.engine.pending_count() {
            Ok(n) => ok_payload(n),
            Err(e) => render_err(verb, &e),
        },
        "RESERVED_COUNT" => {
            if fields.len() != 3 {
                return arity_err(verb, 3, fields.len());
            }
            match state.engine.reserved_count(fields[1], fields[2]) {
                Ok(n) => ok_payload(n),
                Err(e) => render_err(verb, &e),
            }
        }
        "ROOMS" => handle_rooms(state),
        "ADD_ROOM" => handle_add_room(state, session, &fields),
        "SET_CAPACITY" => handle_set_capacity(state, session, &fields),
        "REMOVE_ROOM" => handle_remove_room(state, session, &fields),
        "SET_ROOM_STATUS" => handle_set_room_status(state, session, &fields),
        "ROOM_STATUS" => {
            if fields.len() != 2 {
                return arity_err(verb, 2, fields.len());
            }
            ok_payload(state.engine.room_status(fields[1]))
        }
        other => err("INVALID_INPUT", format!("unknown command: {other}")),
    }
}

fn arity_err(verb: &str, expected: usize, got: usize) -> Vec<String> {
    err(
        "INVALID_INPUT",
        format!("{verb} takes {} fields, got {}", expected - 1, got - 1),
    )
}

fn require_user(session: &Session) -> Result<UserId, Vec<String>> {
    session
        .user
        .clone()
        .ok_or_else(|| err("ACCESS_DENIED", "not connected"))
}

fn handle_connect(
    state: &AppState,
    session: &mut Session,
    channel: &Arc<dyn Channel>,
    fields: &[&str],
) -> Vec<String> {
    if fields.len() != 2 {
        return arity_err("CONNECT", 2, fields.len());
    }
    let id = fields[1].trim();
    if let Err(e) = validate_recipient_id(id) {
        return err("INVALID_INPUT", e);
    }
    session.user = Some(UserId::new(id));

    // Acknowledge first so the client can distinguish the response from
    // the queued notifications that follow.
    if let Err(e) = channel.push("OK") {
        warn!("connect ack to {id} failed: {e}");
        return Vec::new();
    }
    match state.dispatcher.on_connect(id, Arc::clone(channel)) {
        Ok(delivered) if delivered > 0 => {
            info!("{id} connected, {delivered} queued notifications delivered");
        }
        Ok(_) => debug!("{id} connected"),
        Err(e) => warn!("offline drain for {id} failed: {e}"),
    }
    Vec::new()
}

fn handle_reserve(state: &AppState, session: &mut Session, fields: &[&str]) -> Vec<String> {
    let owner = match require_user(session) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if fields.len() != 9 {
        return arity_err("RESERVE", 9, fields.len());
    }
    let Ok(count) = fields[8].trim().parse::<u32>() else {
        return err("INVALID_INPUT", "participant count must be a number");
    };
    let req = SubmitRequest {
        requester: fields[1].to_owned(),
        owner,
        room: fields[2].to_owned(),
        date: fields[3].to_owned(),
        weekday: fields[4].to_owned(),
        slot: fields[5].to_owned(),
        purpose: fields[6].to_owned(),
        role: fields[7].to_owned(),
        count,
    };
    match state.engine.submit(&req) {
        Ok(()) => ok(),
        Err(e) => render_err("RESERVE", &e),
    }
}

fn pending_ref(fields: &[&str]) -> PendingRef {
    PendingRef {
        owner: UserId::new(fields[1].trim()),
        requester: fields[2].to_owned(),
        room: fields[3].to_owned(),
        date: fields[4].to_owned(),
        weekday: fields[5].to_owned(),
        slot: fields[6].to_owned(),
    }
}

fn handle_decision(
    state: &AppState,
    session: &mut Session,
    verb: &str,
    fields: &[&str],
) -> Vec<String> {
    let actor = match require_user(session) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if fields.len() != 7 {
        return arity_err(verb, 7, fields.len());
    }
    let key = pending_ref(fields);
    let result = if verb == "APPROVE" {
        state.engine.approve(&key, &actor)
    } else {
        state.engine.reject(&key, &actor)
    };
    match result {
        Ok(()) => ok(),
        Err(e) => render_err(verb, &e),
    }
}

fn handle_cancel(state: &AppState, session: &mut Session, fields: &[&str]) -> Vec<String> {
    let actor = match require_user(session) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if fields.len() != 7 {
        return arity_err("CANCEL", 7, fields.len());
    }
    let req = CancelRequest {
        requested_by: actor,
        owner: UserId::new(fields[1].trim()),
        requester: fields[2].to_owned(),
        room: fields[3].to_owned(),
        date: fields[4].to_owned(),
        weekday: fields[5].to_owned(),
        slot: fields[6].to_owned(),
    };
    match state.engine.cancel(&req) {
        Ok(()) => ok(),
        Err(e) => render_err("CANCEL", &e),
    }
}

fn handle_change(state: &AppState, session: &mut Session, fields: &[&str]) -> Vec<String> {
    let owner = match require_user(session) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if fields.len() != 10 {
        return arity_err("CHANGE", 10, fields.len());
    }
    let Ok(count) = fields[9].trim().parse::<u32>() else {
        return err("INVALID_INPUT", "participant count must be a number");
    };
    let requester = state
        .directory
        .display_name(owner.as_str())
        .unwrap_or_else(|| owner.to_string());
    let sub = ChangeSubmission {
        owner,
        requester,
        original: OriginalRef {
            room: fields[1].to_owned(),
            date: fields[2].to_owned(),
            weekday: fields[3].to_owned(),
            slot: fields[4].to_owned(),
        },
        room: fields[5].to_owned(),
        date: fields[6].to_owned(),
        weekday: fields[7].to_owned(),
        slot: fields[8].to_owned(),
        count,
    };
    match state.engine.change_request(&sub) {
        Ok(()) => ok(),
        Err(e) => render_err("CHANGE", &e),
    }
}

/// Candidates are `room|date|weekday|slot|purpose|role|count`, separated
/// by `;`.
fn parse_candidates(encoded: &str) -> Result<Vec<ChangeCandidate>, Vec<String>> {
    let mut out = Vec::new();
    for part in encoded.split(';') {
        if part.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = part.split('|').collect();
        if parts.len() != 7 {
            return Err(err(
                "INVALID_INPUT",
                format!("candidate takes 7 fields, got {}", parts.len()),
            ));
        }
        let Ok(count) = parts[6].trim().parse::<u32>() else {
            return Err(err("INVALID_INPUT", "candidate count must be a number"));
        };
        out.push(ChangeCandidate {
            room: parts[0].to_owned(),
            date: parts[1].to_owned(),
            weekday: parts[2].to_owned(),
            slot: parts[3].to_owned(),
            purpose: parts[4].to_owned(),
            role: parts[5].to_owned(),
            count,
        });
    }
    Ok(out)
}

fn handle_change_full(state: &AppState, session: &mut Session, fields: &[&str]) -> Vec<String> {
    let owner = match require_user(session) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if fields.len() != 6 {
        return arity_err("CHANGE_FULL", 6, fields.len());
    }
    let candidates = match parse_candidates(fields[5]) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let requester = state
        .directory
        .display_name(owner.as_str())
        .unwrap_or_else(|| owner.to_string());
    let original = OriginalRef {
        room: fields[1].to_owned(),
        date: fields[2].to_owned(),
        weekday: fields[3].to_owned(),
        slot: fields[4].to_owned(),
    };
    match state
        .engine
        .change_request_full(&owner, &requester, &original, &candidates)
    {
        Ok(()) => ok(),
        Err(e) => render_err("CHANGE_FULL", &e),
    }
}

fn handle_list_approved(state: &AppState, fields: &[&str]) -> Vec<String> {
    if fields.len() != 2 {
        return arity_err("LIST_APPROVED", 2, fields.len());
    }
    let Ok(kind) = RoomKind::parse(fields[1]) else {
        return err("INVALID_INPUT", format!("unknown room kind: {}", fields[1]));
    };
    match state.engine.approved_reservations(kind) {
        Ok(records) => listing(records.iter().map(aula_schema::Reservation::encode).collect()),
        Err(e) => render_err("LIST_APPROVED", &e),
    }
}

fn handle_rooms(state: &AppState) -> Vec<String> {
    listing(
        state
            .engine
            .rooms()
            .iter()
            .map(Classroom::encode)
            .collect(),
    )
}

fn handle_add_room(state: &AppState, session: &mut Session, fields: &[&str]) -> Vec<String> {
    let actor = match require_user(session) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if fields.len() != 4 {
        return arity_err("ADD_ROOM", 4, fields.len());
    }
    let Ok(kind) = RoomKind::parse(fields[2]) else {
        return err("INVALID_INPUT", format!("unknown room kind: {}", fields[2]));
    };
    let Ok(capacity) = fields[3].trim().parse::<u32>() else {
        return err("INVALID_INPUT", "capacity must be a number");
    };
    let room = Classroom {
        name: aula_schema::RoomName::new(fields[1].trim()),
        kind,
        capacity,
    };
    match state.engine.add_room(room, &actor) {
        Ok(()) => ok(),
        Err(e) => render_err("ADD_ROOM", &e),
    }
}

fn handle_set_capacity(state: &AppState, session: &mut Session, fields: &[&str]) -> Vec<String> {
    let actor = match require_user(session) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if fields.len() != 3 {
        return arity_err("SET_CAPACITY", 3, fields.len());
    }
    let Ok(capacity) = fields[2].trim().parse::<u32>() else {
        return err("INVALID_INPUT", "capacity must be a number");
    };
    match state.engine.update_room_capacity(fields[1], capacity, &actor) {
        Ok(()) => ok(),
        Err(e) => render_err("SET_CAPACITY", &e),
    }
}

fn handle_remove_room(state: &AppState, session: &mut Session, fields: &[&str]) -> Vec<String> {
    let actor = match require_user(session) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if fields.len() != 2 {
        return arity_err("REMOVE_ROOM", 2, fields.len());
    }
    match state.engine.remove_room(fields[1], &actor) {
        Ok(()) => ok(),
        Err(e) => render_err("REMOVE_ROOM", &e),
    }
}

fn handle_set_room_status(
    state: &AppState,
    session: &mut Session,
    fields: &[&str],
) -> Vec<String> {
    let actor = match require_user(session) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if fields.len() != 3 {
        return arity_err("SET_ROOM_STATUS", 3, fields.len());
    }
    let Some(status) = RoomStatus::parse(fields[2]) else {
        return err("INVALID_INPUT", format!("unknown status: {}", fields[2]));
    };
    match state.engine.set_room_status(fields[1], status, &actor) {
        Ok(()) => ok(),
        Err(e) => render_err("SET_ROOM_STATUS", &e),
    }
}

/// Accept loop. Checks the shutdown flag between accepts, so the listener
/// runs in non-blocking mode.
pub struct Server {
    state: AppState,
    max_clients: usize,
    active: Arc<AtomicUsize>,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    pub fn new(state: AppState, max_clients: usize) -> Self {
        Self {
            state,
            max_clients,
            active: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn run(&self, listener: &TcpListener) -> Result<(), ServerError> {
        listener.set_nonblocking(true)?;
        info!("listening on {}", listener.local_addr()?);

        while !self.shutdown.load(Ordering::SeqCst) && !aula_core::shutdown_requested() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if self.active.load(Ordering::SeqCst) >= self.max_clients {
                        warn!("rejecting {peer}: connection limit reached");
                        let mut stream = stream;
                        let _ = writeln!(stream, "ERR:BUSY:too many connections");
                        continue;
                    }
                    debug!("connection from {peer}");
                    self.active.fetch_add(1, Ordering::SeqCst);
                    let state = self.state.clone();
                    let active = Arc::clone(&self.active);
                    std::thread::spawn(move || {
                        if let Err(e) = handle_connection(&state, stream) {
                            debug!("connection from {peer} ended: {e}");
                        }
                        active.fetch_sub(1, Ordering::SeqCst);
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!("server stopped");
        Ok(())
    }
}

fn handle_connection(state: &AppState, stream: TcpStream) -> Result<(), ServerError> {
    stream.set_nonblocking(false)?;
    let reader = BufReader::new(stream.try_clone()?);
    let channel: Arc<dyn Channel> = Arc::new(TcpChannel {
        stream: Mutex::new(stream),
    });
    let mut session = Session::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if line.trim() == "QUIT" {
            break;
        }
        for response in execute(state, &mut session, &channel, &line) {
            channel.push(&response)?;
        }
    }

    // Peer disconnect resolves the read; unbind the delivery channel so
    // later events go to the offline queue.
    if let Some(user) = &session.user {
        state.dispatcher.unregister(user.as_str(), &channel);
        debug!("{user} disconnected");
    }
    Ok(())
}

/// Start a server with a temporary data directory on a random port.
/// Drop the `TestServer` to stop the accept loop.
pub struct TestServer {
    pub addr: String,
    pub data_dir: PathBuf,
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
    _lock: StoreLock,
}

impl TestServer {
    pub fn start(data_dir: PathBuf) -> Self {
        let config = ServerConfig {
            data_dir: data_dir.clone(),
            drain_pacing_ms: 0,
            ..ServerConfig::default()
        };
        let (state, lock) = build_state(&config).expect("failed to build test state");
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind test server");
        let addr = listener
            .local_addr()
            .expect("listener has no local addr")
            .to_string();

        let server = Server::new(state, config.max_clients);
        let shutdown = server.shutdown_handle();
        let handle = std::thread::spawn(move || {
            if let Err(e) = server.run(&listener) {
                error!("test server failed: {e}");
            }
        });

        Self {
            addr,
            data_dir,
            shutdown,
            handle: Some(handle),
            _lock: lock,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

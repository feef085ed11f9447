use crate::backoff::transient_read_delay;
use crate::constants::errno;
use crate::constants::serial::{
    MAX_CONSECUTIVE_TRANSIENT_ERRORS, READER_THREAD_NAME, READ_CHUNK_SIZE,
};
use bridge_protocol::{BridgeError, LinkState, Scheduling, SerialSettings, SharedLinkState};
use bridge_runtime::{
    bridge_debug, bridge_error, bridge_info, bridge_warn, IntentDispatcher, StopFlag,
};
use core_types::{Frame, PortOpener, SerialTransport};
use framing::{Framer, LineFramer};
use std::io;
use std::thread::{self, JoinHandle};

/// How a failed read should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadErrorClass {
    /// No data within the timeout
    Idle,
    /// Worth retrying
    Transient,
    /// Connection is dead
    Fatal,
}

pub fn classify_read_error(err: &io::Error) -> ReadErrorClass {
    use io::ErrorKind::*;

    match err.kind() {
        TimedOut | WouldBlock => ReadErrorClass::Idle,
        Interrupted => ReadErrorClass::Transient,
        BrokenPipe | NotConnected | ConnectionReset | ConnectionAborted | UnexpectedEof
        | NotFound | PermissionDenied => ReadErrorClass::Fatal,
        _ => match err.raw_os_error() {
            Some(errno::EIO) | Some(errno::ENXIO) | Some(errno::EBADF) | Some(errno::ENODEV) => {
                ReadErrorClass::Fatal
            }
            _ => ReadErrorClass::Transient,
        },
    }
}

enum ReadOutcome {
    Data(usize),
    Idle,
    Transient(io::Error),
    Fatal(String),
}

/// The open connection plus everything needed to turn its bytes into intents.
///
/// Exactly one execution context owns a session at a time: the link manager in poll
/// mode, the reader thread in thread mode.
struct ReadSession {
    port: String,
    transport: Box<dyn SerialTransport>,
    framer: LineFramer,
    dispatcher: IntentDispatcher,
    buf: Vec<u8>,
    transient_errors: u32,
}

impl ReadSession {
    fn new(
        port: String,
        transport: Box<dyn SerialTransport>,
        settings: &SerialSettings,
        dispatcher: IntentDispatcher,
    ) -> Self {
        Self {
            port,
            transport,
            framer: LineFramer::with_max_len(settings.max_line_len),
            dispatcher,
            buf: vec![0; READ_CHUNK_SIZE],
            transient_errors: 0,
        }
    }

    /// Read whatever is already buffered by the driver without blocking.
    fn read_available(&mut self) -> ReadOutcome {
        match self.transport.bytes_available() {
            Ok(0) => ReadOutcome::Idle,
            Ok(n) => {
                let want = n.min(self.buf.len());
                match self.buf.get_mut(..want) {
                    Some(chunk) => Self::outcome(self.transport.read(chunk), true),
                    None => ReadOutcome::Idle,
                }
            }
            Err(e) => Self::outcome(Err(e), true),
        }
    }

    /// Block for up to the transport's read timeout.
    fn read_blocking(&mut self) -> ReadOutcome {
        Self::outcome(self.transport.read(&mut self.buf), false)
    }

    fn outcome(result: io::Result<usize>, data_expected: bool) -> ReadOutcome {
        match result {
            Ok(0) if data_expected => {
                ReadOutcome::Fatal("device reported data ready but returned none".into())
            }
            Ok(0) => ReadOutcome::Fatal("end of stream".into()),
            Ok(n) => ReadOutcome::Data(n),
            Err(e) => match classify_read_error(&e) {
                ReadErrorClass::Idle => ReadOutcome::Idle,
                ReadErrorClass::Transient => ReadOutcome::Transient(e),
                ReadErrorClass::Fatal => ReadOutcome::Fatal(e.to_string()),
            },
        }
    }

    /// Frame the first `n` bytes of the read buffer and dispatch complete lines.
    fn ingest(&mut self, n: usize) {
        self.note_success();
        let frames = match self.buf.get(..n) {
            Some(bytes) => self.framer.push(bytes),
            None => return,
        };
        for frame in frames {
            self.handle_line(&frame);
        }
    }

    fn handle_line(&self, frame: &Frame) {
        let text = frame.text();
        let line = text.trim_end();
        if line.is_empty() {
            return;
        }

        bridge_debug!("Received: {}", line);
        match decoders::decode(line) {
            Some(intent) => self.dispatcher.dispatch(intent),
            None => bridge_warn!("Unknown command: {}", line.to_uppercase()),
        }
    }

    /// A read attempt that did not fail, with or without data, ends an error streak.
    fn note_success(&mut self) {
        self.transient_errors = 0;
    }

    /// Count a transient error. Returns `Err` once the error budget is spent.
    fn note_transient(&mut self, err: &io::Error) -> Result<u32, BridgeError> {
        self.transient_errors += 1;
        if self.transient_errors >= MAX_CONSECUTIVE_TRANSIENT_ERRORS {
            return Err(BridgeError::FatalLink(format!(
                "{} consecutive read errors on {}, last: {}",
                self.transient_errors, self.port, err
            )));
        }
        bridge_warn!(
            "{}",
            BridgeError::TransientRead(format!("{} on {}", err, self.port))
        );
        Ok(self.transient_errors)
    }

    fn close(&mut self) {
        if !self.transport.is_open() {
            return;
        }
        match self.transport.close() {
            Ok(()) => bridge_info!("Serial connection closed ({})", self.port),
            Err(e) => bridge_warn!("Closing {} failed: {}", self.port, e),
        }
    }
}

/// Owns the serial connection lifecycle for one bridge.
///
/// ```text
/// SerialLink::new ──► connect(opener) ──► start() ──► poll() … / reader thread
///                                                        │
///                                            shutdown() ─┘ (idempotent, also on drop)
/// ```
pub struct SerialLink {
    settings: SerialSettings,
    dispatcher: IntentDispatcher,
    state: SharedLinkState,
    stop: StopFlag,
    port: Option<String>,
    session: Option<ReadSession>,
    worker: Option<JoinHandle<ReadSession>>,
}

impl SerialLink {
    pub fn new(settings: SerialSettings, dispatcher: IntentDispatcher) -> Self {
        Self {
            settings,
            dispatcher,
            state: SharedLinkState::new(LinkState::Uninitialized),
            stop: StopFlag::new(),
            port: None,
            session: None,
            worker: None,
        }
    }

    /// A link that never connects, for channels rejected at startup.
    pub fn disabled(settings: SerialSettings, dispatcher: IntentDispatcher) -> Self {
        let link = Self::new(settings, dispatcher);
        let _ = link.state.transition(LinkState::Disabled);
        link
    }

    pub fn state(&self) -> LinkState {
        self.state.get()
    }

    /// Port chosen at connect time.
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn scheduling(&self) -> Scheduling {
        self.settings.scheduling
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    /// Try each candidate in order; the first one that opens is kept for the session.
    ///
    /// Can only be attempted once. When every candidate fails the link is Disabled.
    pub fn connect(&mut self, opener: &dyn PortOpener) -> Result<&str, BridgeError> {
        self.state.transition(LinkState::Connecting)?;

        let baud = self.settings.baud_rate;
        let timeout = self.settings.read_timeout();
        let candidates = self.settings.candidate_ports();

        for path in &candidates {
            bridge_info!("Attempting to connect to {} at {} baud...", path, baud);
            match opener.open(path, baud, timeout) {
                Ok(transport) => {
                    bridge_info!("Serial connection established on {}", path);
                    self.session = Some(ReadSession::new(
                        path.clone(),
                        transport,
                        &self.settings,
                        self.dispatcher.clone(),
                    ));
                    self.state.transition(LinkState::Connected)?;
                    return Ok(self.port.insert(path.clone()).as_str());
                }
                Err(e) => bridge_warn!("{}", BridgeError::port_open(path, &e)),
            }
        }

        let err = BridgeError::NoPortAvailable { tried: candidates };
        bridge_error!("{}", err);
        self.state.transition(LinkState::Disabled)?;
        Err(err)
    }

    /// Begin consuming input with the configured scheduling.
    ///
    /// Returns immediately in both modes. In poll mode the host must call [`poll`]
    /// every [`SerialSettings::poll_interval`].
    ///
    /// [`poll`]: SerialLink::poll
    pub fn start(&mut self) -> Result<(), BridgeError> {
        self.state.transition(LinkState::Reading)?;

        match self.settings.scheduling {
            Scheduling::Poll => {
                bridge_info!(
                    "Serial polling started ({}ms interval)",
                    self.settings.poll_interval_ms
                );
                Ok(())
            }
            Scheduling::Thread => self.spawn_reader(),
        }
    }

    fn spawn_reader(&mut self) -> Result<(), BridgeError> {
        let Some(session) = self.session.take() else {
            self.state.transition(LinkState::Disabled)?;
            return Err(BridgeError::FatalLink("no open connection to read".into()));
        };

        let stop = self.stop.clone();
        let state = self.state.clone();
        let spawned = thread::Builder::new()
            .name(READER_THREAD_NAME.into())
            .spawn(move || reader_loop(session, stop, state));

        match spawned {
            Ok(handle) => {
                bridge_info!("Serial reader thread started");
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                // The session moved into the failed closure and was dropped with it.
                self.state.transition(LinkState::Disabled)?;
                Err(BridgeError::FatalLink(format!(
                    "cannot spawn serial reader thread: {e}"
                )))
            }
        }
    }

    /// One cooperative poll step. Never blocks.
    ///
    /// A no-op unless the link is Reading in poll mode.
    pub fn poll(&mut self) {
        if self.state.get() != LinkState::Reading || self.stop.is_stopped() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let failure = match session.read_available() {
            ReadOutcome::Data(n) => {
                session.ingest(n);
                None
            }
            ReadOutcome::Idle => {
                session.note_success();
                None
            }
            ReadOutcome::Transient(e) => session.note_transient(&e).err(),
            ReadOutcome::Fatal(reason) => {
                Some(BridgeError::FatalLink(format!("{} on {}", reason, session.port)))
            }
        };

        if let Some(err) = failure {
            bridge_error!("{}", err);
            if let Some(mut session) = self.session.take() {
                session.close();
            }
            let _ = self.state.transition(LinkState::Disabled);
        }
    }

    /// Stop reading and close the connection.
    ///
    /// The reader thread, if any, is joined before the port is closed. Safe to call
    /// any number of times, including when the link never connected.
    pub fn shutdown(&mut self) {
        self.stop.stop();

        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(session) => self.session = Some(session),
                Err(_) => bridge_error!("Serial reader thread panicked"),
            }
        }

        if let Some(mut session) = self.session.take() {
            session.close();
        }

        if self.state.get() != LinkState::Disabled {
            let _ = self.state.transition(LinkState::Closed);
        }
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("state", &self.state())
            .field("port", &self.port)
            .field("scheduling", &self.settings.scheduling)
            .finish()
    }
}

/// Blocking read loop run on the reader thread.
///
/// The stop flag is checked before every read and again before the bytes of a
/// completed read are dispatched. Hands the session back so the manager can close it
/// after the thread has exited.
fn reader_loop(mut session: ReadSession, stop: StopFlag, state: SharedLinkState) -> ReadSession {
    while !stop.is_stopped() {
        let failure = match session.read_blocking() {
            ReadOutcome::Data(n) => {
                if stop.is_stopped() {
                    break;
                }
                session.ingest(n);
                None
            }
            ReadOutcome::Idle => {
                session.note_success();
                None
            }
            ReadOutcome::Transient(e) => match session.note_transient(&e) {
                Ok(consecutive) => {
                    stop.sleep(transient_read_delay(consecutive));
                    None
                }
                Err(err) => Some(err),
            },
            ReadOutcome::Fatal(reason) => {
                Some(BridgeError::FatalLink(format!("{} on {}", reason, session.port)))
            }
        };

        if let Some(err) = failure {
            bridge_error!("{}", err);
            session.close();
            let _ = state.transition(LinkState::Disabled);
            break;
        }
    }

    bridge_debug!("Serial reader thread exiting");
    session
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use bridge_runtime::NavigationTarget;
    use core_types::TransportError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<&'static str>>>);

    impl NavigationTarget for Calls {
        fn move_up(&mut self) {
            self.0.lock().unwrap().push("move_up");
        }
        fn move_down(&mut self) {
            self.0.lock().unwrap().push("move_down");
        }
        fn enter(&mut self) {
            self.0.lock().unwrap().push("enter");
        }
    }

    /// Chunks handed out one per read; an empty queue reads as idle.
    #[derive(Clone, Default)]
    struct Script {
        chunks: Arc<Mutex<VecDeque<io::Result<Vec<u8>>>>>,
        closes: Arc<Mutex<u32>>,
    }

    impl Script {
        fn push(&self, bytes: &[u8]) {
            self.chunks.lock().unwrap().push_back(Ok(bytes.to_vec()));
        }
        fn fail(&self, kind: io::ErrorKind) {
            self.chunks.lock().unwrap().push_back(Err(kind.into()));
        }
    }

    struct ScriptedPort {
        script: Script,
        open: bool,
    }

    impl SerialTransport for ScriptedPort {
        fn bytes_available(&mut self) -> io::Result<usize> {
            match self.script.chunks.lock().unwrap().front() {
                Some(Ok(bytes)) => Ok(bytes.len()),
                Some(Err(_)) => Ok(1),
                None => Ok(0),
            }
        }
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.chunks.lock().unwrap().pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(io::ErrorKind::TimedOut.into()),
            }
        }
        fn is_open(&self) -> bool {
            self.open
        }
        fn close(&mut self) -> Result<(), TransportError> {
            self.open = false;
            *self.script.closes.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct ScriptOpener(Script);

    impl PortOpener for ScriptOpener {
        fn open(
            &self,
            _path: &str,
            _baud_rate: u32,
            _read_timeout: Duration,
        ) -> Result<Box<dyn SerialTransport>, TransportError> {
            Ok(Box::new(ScriptedPort {
                script: self.0.clone(),
                open: true,
            }))
        }
    }

    fn polling_link(script: &Script) -> (SerialLink, Calls) {
        let calls = Calls::default();
        let mut link = SerialLink::new(
            SerialSettings::with_port("/dev/ttyACM0"),
            IntentDispatcher::new(calls.clone()),
        );
        link.connect(&ScriptOpener(script.clone())).unwrap();
        link.start().unwrap();
        (link, calls)
    }

    #[test]
    fn test_classify_read_errors() {
        let idle: io::Error = io::ErrorKind::TimedOut.into();
        let transient: io::Error = io::ErrorKind::Interrupted.into();
        let gone: io::Error = io::ErrorKind::BrokenPipe.into();
        assert_eq!(classify_read_error(&idle), ReadErrorClass::Idle);
        assert_eq!(classify_read_error(&transient), ReadErrorClass::Transient);
        assert_eq!(classify_read_error(&gone), ReadErrorClass::Fatal);
        assert_eq!(
            classify_read_error(&io::Error::from_raw_os_error(errno::EIO)),
            ReadErrorClass::Fatal
        );
    }

    #[test]
    fn test_poll_dispatches_decoded_lines() {
        let script = Script::default();
        let (mut link, calls) = polling_link(&script);

        script.push(b"cw\nCCW\n");
        link.poll();
        script.push(b"enter\nbanana\n\r\n");
        link.poll();

        assert_eq!(*calls.0.lock().unwrap(), vec!["move_up", "move_down", "enter"]);
    }

    #[test]
    fn test_partial_line_waits_for_terminator() {
        let script = Script::default();
        let (mut link, calls) = polling_link(&script);

        script.push(b"UP\r");
        link.poll();
        assert!(calls.0.lock().unwrap().is_empty());

        script.push(b"\n");
        link.poll();
        assert_eq!(*calls.0.lock().unwrap(), vec!["move_up"]);

        link.poll();
        assert_eq!(calls.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_poll_without_data_is_idle() {
        let script = Script::default();
        let (mut link, calls) = polling_link(&script);
        for _ in 0..3 {
            link.poll();
        }
        assert!(calls.0.lock().unwrap().is_empty());
        assert_eq!(link.state(), LinkState::Reading);
    }

    #[test]
    fn test_transient_error_keeps_polling() {
        let script = Script::default();
        let (mut link, calls) = polling_link(&script);

        script.fail(io::ErrorKind::Interrupted);
        link.poll();
        assert_eq!(link.state(), LinkState::Reading);

        script.push(b"PRESS\n");
        link.poll();
        assert_eq!(*calls.0.lock().unwrap(), vec!["enter"]);
    }

    #[test]
    fn test_consecutive_transient_errors_disable_link() {
        let script = Script::default();
        let (mut link, _calls) = polling_link(&script);

        for _ in 0..MAX_CONSECUTIVE_TRANSIENT_ERRORS {
            script.fail(io::ErrorKind::Interrupted);
        }
        for _ in 1..MAX_CONSECUTIVE_TRANSIENT_ERRORS {
            link.poll();
            assert_eq!(link.state(), LinkState::Reading);
        }
        link.poll();
        assert_eq!(link.state(), LinkState::Disabled);
        assert_eq!(*script.closes.lock().unwrap(), 1);

        link.poll();
        link.shutdown();
        assert_eq!(*script.closes.lock().unwrap(), 1);
    }

    #[test]
    fn test_idle_reads_break_transient_streak() {
        let script = Script::default();
        let (mut link, _calls) = polling_link(&script);

        for _ in 0..MAX_CONSECUTIVE_TRANSIENT_ERRORS * 2 {
            script.fail(io::ErrorKind::Interrupted);
            link.poll();
            link.poll(); // idle
        }
        assert_eq!(link.state(), LinkState::Reading);
    }

    #[test]
    fn test_data_breaks_transient_streak() {
        let script = Script::default();
        let (mut link, calls) = polling_link(&script);

        for _ in 0..MAX_CONSECUTIVE_TRANSIENT_ERRORS * 2 {
            script.fail(io::ErrorKind::Interrupted);
            script.push(b"UP\n");
        }
        for _ in 0..MAX_CONSECUTIVE_TRANSIENT_ERRORS * 4 {
            link.poll();
        }
        assert_eq!(link.state(), LinkState::Reading);
        assert_eq!(calls.0.lock().unwrap().len(), 20);
    }

    #[test]
    fn test_fatal_error_disables_and_closes() {
        let script = Script::default();
        let (mut link, _calls) = polling_link(&script);

        script.fail(io::ErrorKind::BrokenPipe);
        link.poll();
        assert_eq!(link.state(), LinkState::Disabled);
        assert_eq!(*script.closes.lock().unwrap(), 1);

        // Disabled stays Disabled, no second close
        script.push(b"UP\n");
        link.poll();
        link.shutdown();
        assert_eq!(link.state(), LinkState::Disabled);
        assert_eq!(*script.closes.lock().unwrap(), 1);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let script = Script::default();
        let (mut link, _calls) = polling_link(&script);

        link.shutdown();
        link.shutdown();
        drop(link);
        assert_eq!(*script.closes.lock().unwrap(), 1);
    }

    #[test]
    fn test_shutdown_never_connected() {
        let mut link = SerialLink::new(
            SerialSettings::default(),
            IntentDispatcher::new(Calls::default()),
        );
        link.shutdown();
        link.shutdown();
        assert_eq!(link.state(), LinkState::Closed);
        assert!(link.port().is_none());
    }

    #[test]
    fn test_start_requires_connection() {
        let mut link = SerialLink::new(
            SerialSettings::default(),
            IntentDispatcher::new(Calls::default()),
        );
        assert!(matches!(link.start(), Err(BridgeError::InvalidTransition(_))));
    }
}

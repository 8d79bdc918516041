//! Host fakes for the hardware abstractions
//!
//! Every fake records what it was asked to do in a shared [`Journal`], so
//! tests can assert on ordering across components.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use hal_abstractions::{
    Clock, ImuReading, ImuSensor, LinkCredentials, NetworkLink, SensorSettings, SessionOptions,
    TelemetrySession, Vector3,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Delay(u64),
    Probe,
    Configure,
    Read,
    Begin,
    Connect { client_id: String, authenticated: bool },
    Service,
    Publish(String, String),
    Write(Vec<u8>),
}

/// Shared, ordered record of fake activity
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    pub fn record(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| matches(e)).count()
    }

    /// Everything written to a fake port, as text
    pub fn written(&self) -> String {
        let bytes: Vec<u8> = self
            .0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Write(b) => Some(b.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        String::from_utf8(bytes).unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct FakeClock {
    now: Rc<Cell<u64>>,
    journal: Journal,
}

impl FakeClock {
    pub fn new(journal: &Journal) -> Self {
        Self {
            now: Rc::new(Cell::new(0)),
            journal: journal.clone(),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    async fn delay_ms(&mut self, ms: u64) {
        self.journal.record(Event::Delay(ms));
        self.advance(ms);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError;

pub struct FakeImu {
    /// Probe succeeds from this attempt on (1-based); `None` = absent chip
    pub present_from: Option<u32>,
    pub probes: u32,
    pub reject_config: bool,
    pub fail_reads: u32,
    pub reading: ImuReading,
    journal: Journal,
}

impl FakeImu {
    pub fn new(journal: &Journal) -> Self {
        Self {
            present_from: Some(1),
            probes: 0,
            reject_config: false,
            fail_reads: 0,
            reading: ImuReading {
                accel: Vector3::new(0.1234, -9.8001, 0.0312),
                gyro: Vector3::new(1.0, -0.5, 0.0001),
            },
            journal: journal.clone(),
        }
    }
}

impl ImuSensor for FakeImu {
    type Error = FakeError;

    async fn probe(&mut self) -> Result<(), FakeError> {
        self.journal.record(Event::Probe);
        self.probes += 1;
        match self.present_from {
            Some(n) if self.probes >= n => Ok(()),
            _ => Err(FakeError),
        }
    }

    async fn configure(&mut self, _settings: &SensorSettings) -> Result<(), FakeError> {
        self.journal.record(Event::Configure);
        if self.reject_config {
            Err(FakeError)
        } else {
            Ok(())
        }
    }

    async fn read(&mut self) -> Result<ImuReading, FakeError> {
        self.journal.record(Event::Read);
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(FakeError);
        }
        Ok(self.reading)
    }
}

pub struct FakeLink {
    /// Link reports up from this poll on (1-based); `None` = never
    pub up_from_poll: Option<u32>,
    pub polls: Cell<u32>,
    pub reject_begin: bool,
    journal: Journal,
}

impl FakeLink {
    pub fn new(journal: &Journal) -> Self {
        Self {
            up_from_poll: Some(1),
            polls: Cell::new(0),
            reject_begin: false,
            journal: journal.clone(),
        }
    }
}

impl NetworkLink for FakeLink {
    type Error = FakeError;

    async fn begin(&mut self, _credentials: &LinkCredentials) -> Result<(), FakeError> {
        self.journal.record(Event::Begin);
        if self.reject_begin {
            Err(FakeError)
        } else {
            Ok(())
        }
    }

    fn is_up(&self) -> bool {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        matches!(self.up_from_poll, Some(n) if polls >= n)
    }
}

pub struct FakeSession {
    pub connected: bool,
    /// Outcomes of upcoming connect attempts; empty = succeed
    pub connect_results: VecDeque<bool>,
    pub fail_publish: bool,
    journal: Journal,
}

impl FakeSession {
    pub fn new(journal: &Journal) -> Self {
        Self {
            connected: false,
            connect_results: VecDeque::new(),
            fail_publish: false,
            journal: journal.clone(),
        }
    }
}

impl TelemetrySession for FakeSession {
    type Error = FakeError;

    async fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), FakeError> {
        self.journal.record(Event::Connect {
            client_id: options.client_id.into(),
            authenticated: options.credentials.is_some(),
        });
        self.connected = self.connect_results.pop_front().unwrap_or(true);
        if self.connected {
            Ok(())
        } else {
            Err(FakeError)
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn service(&mut self) -> Result<(), FakeError> {
        self.journal.record(Event::Service);
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), FakeError> {
        if self.fail_publish {
            self.connected = false;
            return Err(FakeError);
        }
        self.journal.record(Event::Publish(
            topic.into(),
            String::from_utf8_lossy(payload).into_owned(),
        ));
        Ok(())
    }
}

pub struct FakePort {
    journal: Journal,
}

impl FakePort {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

impl embedded_io_async::ErrorType for FakePort {
    type Error = Infallible;
}

impl embedded_io_async::Write for FakePort {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        self.journal.record(Event::Write(buf.to_vec()));
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

//! Telemetry loop
//!
//! One context object owns the sensor, the output sink and the sampling
//! state. [`TelemetryLoop::bring_up`] runs once; [`TelemetryLoop::step`] is
//! one iteration of the steady state, which [`TelemetryLoop::run`] repeats
//! forever.
//!
//! Each iteration, in order:
//! 1. reconnect the session if it dropped (one attempt, no backoff)
//! 2. service the session
//! 3. if the sample interval elapsed, read, encode and emit one sample

use embedded_io_async::Write;
use hal_abstractions::{Clock, ImuSensor, NetworkLink, SessionOptions, TelemetrySession};

use crate::alerts::AlertMonitor;
use crate::config::TelemetryConfig;
use crate::error::BringUpError;
use crate::payload;
use crate::retry::RetryPolicy;
use crate::sample::Sample;
use crate::sink::{Delivery, OutputSink, Remote};

/// Log a statistics summary every this many samples
const STATS_LOG_INTERVAL: u32 = 1_000;

/// Counters for diagnostics; they never influence behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopStats {
    pub iterations: u32,
    /// Successful sensor reads
    pub samples: u32,
    /// Payloads written or published
    pub emitted: u32,
    /// Payloads dropped by the discard sink
    pub discarded: u32,
    /// Payloads lost to encoding or delivery failures
    pub dropped: u32,
    pub read_errors: u32,
    pub reconnect_attempts: u32,
    pub reconnects: u32,
}

/// Session parameters derived from configuration
pub fn session_options(config: &TelemetryConfig) -> SessionOptions<'_> {
    SessionOptions {
        client_id: config.client_id,
        credentials: config.broker.session_credentials(),
    }
}

pub struct TelemetryLoop<C, I, W, L, S> {
    config: TelemetryConfig,
    clock: C,
    sensor: I,
    sink: OutputSink<W, L, S>,
    alerts: AlertMonitor,
    stats: LoopStats,
    last_sample_ms: u64,
}

impl<C, I, W, L, S> TelemetryLoop<C, I, W, L, S>
where
    C: Clock,
    I: ImuSensor,
    W: Write,
    L: NetworkLink,
    S: TelemetrySession,
{
    pub fn new(config: TelemetryConfig, clock: C, sensor: I, sink: OutputSink<W, L, S>) -> Self {
        Self {
            config,
            clock,
            sensor,
            sink,
            alerts: AlertMonitor::new(),
            stats: LoopStats::default(),
            last_sample_ms: 0,
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn sink(&self) -> &OutputSink<W, L, S> {
        &self.sink
    }

    pub fn alerts(&self) -> &AlertMonitor {
        &self.alerts
    }

    pub fn sensor(&self) -> &I {
        &self.sensor
    }

    /// Timestamp of the most recent sample tick
    pub fn last_sample_ms(&self) -> u64 {
        self.last_sample_ms
    }

    /// One-time initialization
    ///
    /// Sensor errors are fatal. A link that never comes up is retryable:
    /// call again after a pause. The first session attempt may fail; the
    /// steady state keeps retrying.
    pub async fn bring_up(&mut self) -> Result<(), BringUpError> {
        info!("Bringing up telemetry ({})", self.config.output.as_str());

        probe_sensor(&mut self.sensor, &mut self.clock, self.config.sensor_retry).await?;

        if self.sensor.configure(&self.config.sensor).await.is_err() {
            error!("Sensor rejected its configuration");
            return Err(BringUpError::SensorConfig);
        }
        info!("Sensor configured");

        if let OutputSink::RemotePublish(remote) = &mut self.sink {
            associate(remote, &mut self.clock, &self.config).await?;

            let options = session_options(&self.config);
            match remote.session.connect(&options).await {
                Ok(()) => info!("Session established"),
                Err(_) => warn!("Initial session attempt failed; retrying in the loop"),
            }
        }

        Ok(())
    }

    /// One steady-state iteration
    pub async fn step(&mut self) {
        self.stats.iterations = self.stats.iterations.wrapping_add(1);

        if let OutputSink::RemotePublish(remote) = &mut self.sink {
            if !remote.session.is_connected() {
                self.stats.reconnect_attempts = self.stats.reconnect_attempts.wrapping_add(1);
                let options = session_options(&self.config);
                match remote.session.connect(&options).await {
                    Ok(()) => {
                        self.stats.reconnects = self.stats.reconnects.wrapping_add(1);
                        info!("Session re-established");
                    }
                    Err(_) => debug!("Reconnect attempt failed"),
                }
            }

            if remote.session.service().await.is_err() {
                debug!("Session housekeeping failed");
            }
        }

        let now = self.clock.now_ms();
        if now.saturating_sub(self.last_sample_ms) < self.config.sample_interval_ms {
            return;
        }
        self.last_sample_ms = now;
        self.sample(now).await;
    }

    /// Drive the steady state forever
    pub async fn run(&mut self) -> ! {
        info!(
            "Telemetry loop running, one sample every {} ms",
            self.config.sample_interval_ms
        );
        loop {
            self.step().await;

            let due = self
                .last_sample_ms
                .saturating_add(self.config.sample_interval_ms);
            let now = self.clock.now_ms();
            if due > now {
                self.clock.delay_ms(due - now).await;
            } else {
                embassy_futures::yield_now().await;
            }
        }
    }

    async fn sample(&mut self, now: u64) {
        let reading = match self.sensor.read().await {
            Ok(reading) => reading,
            Err(_) => {
                self.stats.read_errors = self.stats.read_errors.wrapping_add(1);
                warn!("Sensor read failed at {} ms", now);
                return;
            }
        };
        self.stats.samples = self.stats.samples.wrapping_add(1);

        let sample = Sample::new(now, reading);
        for alert in self.alerts.observe(&sample) {
            warn!(
                "{} alert {} at {} ms",
                alert.channel,
                alert.level.label,
                alert.timestamp_ms
            );
        }

        match payload::encode(&sample) {
            Ok(payload) => match self.sink.emit(self.config.topic, &payload).await {
                Ok(Delivery::Discarded) => {
                    self.stats.discarded = self.stats.discarded.wrapping_add(1);
                }
                Ok(Delivery::Written | Delivery::Published) => {
                    self.stats.emitted = self.stats.emitted.wrapping_add(1);
                }
                Err(e) => {
                    self.stats.dropped = self.stats.dropped.wrapping_add(1);
                    debug!("Sample at {} ms dropped: {}", now, e);
                }
            },
            Err(e) => {
                self.stats.dropped = self.stats.dropped.wrapping_add(1);
                warn!("Sample at {} ms not encoded: {}", now, e);
            }
        }

        if self.stats.samples % STATS_LOG_INTERVAL == 0 {
            info!("Loop stats: {}", self.stats);
        }
    }
}

async fn probe_sensor<I: ImuSensor, C: Clock>(
    sensor: &mut I,
    clock: &mut C,
    policy: RetryPolicy,
) -> Result<(), BringUpError> {
    let mut backoff = policy.backoff();
    let mut attempt = 1u32;
    loop {
        if sensor.probe().await.is_ok() {
            info!("Sensor found after {} attempt(s)", attempt);
            return Ok(());
        }
        match backoff.next() {
            Some(delay) => {
                warn!("Sensor probe {} failed, retrying in {} ms", attempt, delay);
                clock.delay_ms(delay).await;
                attempt += 1;
            }
            None => {
                error!("Sensor not found after {} attempt(s)", attempt);
                return Err(BringUpError::SensorNotFound);
            }
        }
    }
}

async fn associate<L: NetworkLink, S, C: Clock>(
    remote: &mut Remote<L, S>,
    clock: &mut C,
    config: &TelemetryConfig,
) -> Result<(), BringUpError> {
    info!(
        "Starting {} link{}",
        config.link.kind(),
        if config.link.ssid().is_some() { " (wireless)" } else { "" }
    );
    if remote.link.begin(&config.link).await.is_err() {
        error!("Link refused to start");
        return Err(BringUpError::LinkUnavailable);
    }

    let mut backoff = config.link_retry.backoff();
    while !remote.link.is_up() {
        match backoff.next() {
            Some(delay) => {
                debug!("Link not up yet, checking again in {} ms", delay);
                clock.delay_ms(delay).await;
            }
            None => {
                warn!(
                    "Link still down after {} ms",
                    config.link_retry.total_delay_ms()
                );
                return Err(BringUpError::LinkUnavailable);
            }
        }
    }
    info!("Link up");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputMode;
    use crate::testing::{Event, FakeClock, FakeImu, FakeLink, FakePort, FakeSession, Journal};
    use embassy_futures::block_on;
    use hal_abstractions::BrokerCredentials;

    type Loop = TelemetryLoop<FakeClock, FakeImu, FakePort, FakeLink, FakeSession>;

    struct Rig {
        journal: Journal,
        clock: FakeClock,
    }

    impl Rig {
        fn new() -> Self {
            let journal = Journal::default();
            let clock = FakeClock::new(&journal);
            Self { journal, clock }
        }

        fn build(&self, output: OutputMode, imu: FakeImu, link: FakeLink, session: FakeSession) -> Loop {
            let config = TelemetryConfig {
                output,
                ..TelemetryConfig::default()
            };
            let sink = match output {
                OutputMode::Discard => OutputSink::Discard,
                OutputMode::LocalText => OutputSink::LocalText(FakePort::new(&self.journal)),
                OutputMode::RemotePublish => OutputSink::RemotePublish(Remote { link, session }),
            };
            TelemetryLoop::new(config, self.clock.clone(), imu, sink)
        }

        fn default_loop(&self, output: OutputMode) -> Loop {
            self.build(
                output,
                FakeImu::new(&self.journal),
                FakeLink::new(&self.journal),
                FakeSession::new(&self.journal),
            )
        }
    }

    fn is_network(e: &Event) -> bool {
        matches!(
            e,
            Event::Begin | Event::Connect { .. } | Event::Service | Event::Publish(..)
        )
    }

    #[test]
    fn test_bring_up_order() {
        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::RemotePublish);
        assert_eq!(block_on(telemetry.bring_up()), Ok(()));
        assert_eq!(
            rig.journal.events(),
            [
                Event::Probe,
                Event::Configure,
                Event::Begin,
                Event::Connect {
                    client_id: "imu-telemetry".into(),
                    authenticated: false,
                },
            ]
        );
    }

    #[test]
    fn test_sensor_probe_retries_with_backoff() {
        let rig = Rig::new();
        let mut imu = FakeImu::new(&rig.journal);
        imu.present_from = Some(3);
        let mut telemetry = rig.build(
            OutputMode::Discard,
            imu,
            FakeLink::new(&rig.journal),
            FakeSession::new(&rig.journal),
        );
        assert_eq!(block_on(telemetry.bring_up()), Ok(()));
        assert_eq!(
            rig.journal.events(),
            [
                Event::Probe,
                Event::Delay(100),
                Event::Probe,
                Event::Delay(200),
                Event::Probe,
                Event::Configure,
            ]
        );
    }

    #[test]
    fn test_absent_sensor_is_fatal_and_silent() {
        let rig = Rig::new();
        let mut imu = FakeImu::new(&rig.journal);
        imu.present_from = None;
        let mut telemetry = rig.build(
            OutputMode::LocalText,
            imu,
            FakeLink::new(&rig.journal),
            FakeSession::new(&rig.journal),
        );

        let err = block_on(telemetry.bring_up()).unwrap_err();
        assert_eq!(err, BringUpError::SensorNotFound);
        assert!(err.is_fatal());

        let policy = telemetry.config().sensor_retry;
        assert_eq!(telemetry.sensor().probes, policy.max_attempts);
        assert_eq!(rig.journal.count(|e| matches!(e, Event::Delay(_))), 4);
        assert!(rig.journal.written().is_empty());
        assert_eq!(rig.journal.count(|e| matches!(e, Event::Configure | Event::Read)), 0);
    }

    #[test]
    fn test_rejected_configuration_is_fatal() {
        let rig = Rig::new();
        let mut imu = FakeImu::new(&rig.journal);
        imu.reject_config = true;
        let mut telemetry = rig.build(
            OutputMode::RemotePublish,
            imu,
            FakeLink::new(&rig.journal),
            FakeSession::new(&rig.journal),
        );
        assert_eq!(block_on(telemetry.bring_up()), Err(BringUpError::SensorConfig));
        assert_eq!(rig.journal.count(is_network), 0);
    }

    #[test]
    fn test_link_timeout_is_retryable() {
        let rig = Rig::new();
        let mut link = FakeLink::new(&rig.journal);
        link.up_from_poll = None;
        let mut telemetry = rig.build(
            OutputMode::RemotePublish,
            FakeImu::new(&rig.journal),
            link,
            FakeSession::new(&rig.journal),
        );

        let err = block_on(telemetry.bring_up()).unwrap_err();
        assert_eq!(err, BringUpError::LinkUnavailable);
        assert!(!err.is_fatal());

        let policy = telemetry.config().link_retry;
        let remote = telemetry.sink().remote().unwrap();
        assert_eq!(remote.link.polls.get(), policy.max_attempts);
        assert_eq!(rig.clock.now_ms(), policy.total_delay_ms());
        assert_eq!(rig.journal.count(|e| matches!(e, Event::Connect { .. })), 0);
    }

    #[test]
    fn test_link_comes_up_after_polling() {
        let rig = Rig::new();
        let mut link = FakeLink::new(&rig.journal);
        link.up_from_poll = Some(3);
        let mut telemetry = rig.build(
            OutputMode::RemotePublish,
            FakeImu::new(&rig.journal),
            link,
            FakeSession::new(&rig.journal),
        );
        assert_eq!(block_on(telemetry.bring_up()), Ok(()));
        assert_eq!(rig.journal.count(|e| *e == Event::Delay(250)), 1);
        assert_eq!(rig.journal.count(|e| *e == Event::Delay(500)), 1);
    }

    #[test]
    fn test_failed_first_session_is_not_an_error() {
        let rig = Rig::new();
        let mut session = FakeSession::new(&rig.journal);
        session.connect_results.push_back(false);
        let mut telemetry = rig.build(
            OutputMode::RemotePublish,
            FakeImu::new(&rig.journal),
            FakeLink::new(&rig.journal),
            session,
        );
        assert_eq!(block_on(telemetry.bring_up()), Ok(()));
        assert!(!telemetry.sink().remote().unwrap().session.is_connected());
    }

    #[test]
    fn test_credentials_presented_when_configured() {
        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::RemotePublish);
        telemetry.config.broker.credentials = Some(BrokerCredentials {
            username: "node",
            password: "secret",
        });
        block_on(telemetry.bring_up()).unwrap();
        assert!(rig.journal.events().contains(&Event::Connect {
            client_id: "imu-telemetry".into(),
            authenticated: true,
        }));
    }

    #[test]
    fn test_one_sample_per_interval() {
        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::LocalText);
        block_on(telemetry.bring_up()).unwrap();

        // Before the first interval elapses nothing is sampled
        rig.clock.set(9);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().samples, 0);

        rig.clock.set(10);
        block_on(telemetry.step());
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().samples, 1);
        assert_eq!(telemetry.last_sample_ms(), 10);

        rig.clock.set(19);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().samples, 1);

        // A late tick takes one sample, not one per missed interval
        rig.clock.set(55);
        block_on(telemetry.step());
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().samples, 2);
        assert_eq!(telemetry.last_sample_ms(), 55);
        assert_eq!(rig.journal.count(|e| *e == Event::Read), 2);
    }

    #[test]
    fn test_local_text_emits_json_lines() {
        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::LocalText);
        block_on(telemetry.bring_up()).unwrap();

        rig.clock.set(10023);
        block_on(telemetry.step());
        assert_eq!(
            rig.journal.written(),
            "{\"ts\":10023,\"ax\":0.1234,\"ay\":-9.8001,\"az\":0.0312,\"gx\":1.0000,\"gy\":-0.5000,\"gz\":0.0001}\n"
        );
        assert_eq!(telemetry.stats().emitted, 1);
    }

    #[test]
    fn test_reconnect_precedes_service_and_sampling() {
        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::RemotePublish);
        block_on(telemetry.bring_up()).unwrap();

        telemetry.sink.remote_mut().unwrap().session.connected = false;
        rig.journal.clear();
        rig.clock.set(20);
        block_on(telemetry.step());

        let events = rig.journal.events();
        assert!(matches!(events[0], Event::Connect { .. }));
        assert_eq!(events[1], Event::Service);
        assert_eq!(events[2], Event::Read);
        assert!(matches!(&events[3], Event::Publish(topic, _) if topic == "sensors/imu"));
        assert_eq!(events.len(), 4);
        assert_eq!(telemetry.stats().reconnect_attempts, 1);
        assert_eq!(telemetry.stats().reconnects, 1);
    }

    #[test]
    fn test_one_reconnect_attempt_per_iteration() {
        let rig = Rig::new();
        let mut session = FakeSession::new(&rig.journal);
        session.connect_results.extend([false, false, false]);
        let mut telemetry = rig.build(
            OutputMode::RemotePublish,
            FakeImu::new(&rig.journal),
            FakeLink::new(&rig.journal),
            session,
        );
        block_on(telemetry.bring_up()).unwrap();
        rig.journal.clear();

        rig.clock.set(10);
        block_on(telemetry.step());
        block_on(telemetry.step());

        assert_eq!(rig.journal.count(|e| matches!(e, Event::Connect { .. })), 2);
        assert_eq!(rig.journal.count(|e| *e == Event::Service), 2);
        assert_eq!(telemetry.stats().reconnect_attempts, 2);
        assert_eq!(telemetry.stats().reconnects, 0);

        // The sample was taken but could not be published
        assert_eq!(telemetry.stats().samples, 1);
        assert_eq!(telemetry.stats().dropped, 1);
        assert_eq!(rig.journal.count(|e| matches!(e, Event::Publish(..))), 0);
    }

    #[test]
    fn test_connected_session_is_serviced_every_iteration() {
        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::RemotePublish);
        block_on(telemetry.bring_up()).unwrap();
        rig.journal.clear();

        for ms in [1, 2, 3] {
            rig.clock.set(ms);
            block_on(telemetry.step());
        }
        assert_eq!(rig.journal.events(), [Event::Service, Event::Service, Event::Service]);
        assert_eq!(telemetry.stats().reconnect_attempts, 0);
    }

    #[test]
    fn test_failed_publish_is_dropped_not_retried() {
        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::RemotePublish);
        block_on(telemetry.bring_up()).unwrap();
        telemetry.sink.remote_mut().unwrap().session.fail_publish = true;

        rig.clock.set(10);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().dropped, 1);
        assert!(!telemetry.sink().remote().unwrap().session.is_connected());

        // Next tick reconnects first, the old sample is gone
        telemetry.sink.remote_mut().unwrap().session.fail_publish = false;
        rig.journal.clear();
        rig.clock.set(20);
        block_on(telemetry.step());
        let publishes: Vec<_> = rig
            .journal
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Publish(..)))
            .collect();
        assert_eq!(publishes.len(), 1);
        assert!(matches!(&publishes[0], Event::Publish(_, p) if p.starts_with("{\"ts\":20,")));
    }

    #[test]
    fn test_read_failure_consumes_tick() {
        let rig = Rig::new();
        let mut imu = FakeImu::new(&rig.journal);
        imu.fail_reads = 1;
        let mut telemetry = rig.build(
            OutputMode::LocalText,
            imu,
            FakeLink::new(&rig.journal),
            FakeSession::new(&rig.journal),
        );
        block_on(telemetry.bring_up()).unwrap();

        rig.clock.set(10);
        block_on(telemetry.step());
        rig.clock.set(15);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().read_errors, 1);
        assert_eq!(telemetry.stats().samples, 0);
        assert!(rig.journal.written().is_empty());

        rig.clock.set(20);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().samples, 1);
    }

    #[test]
    fn test_non_finite_reading_dropped() {
        let rig = Rig::new();
        let mut imu = FakeImu::new(&rig.journal);
        imu.reading.gyro.y = f32::NAN;
        let mut telemetry = rig.build(
            OutputMode::LocalText,
            imu,
            FakeLink::new(&rig.journal),
            FakeSession::new(&rig.journal),
        );
        block_on(telemetry.bring_up()).unwrap();

        rig.clock.set(10);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().samples, 1);
        assert_eq!(telemetry.stats().dropped, 1);
        assert!(rig.journal.written().is_empty());
    }

    #[test]
    fn test_modes_share_cadence_without_network() {
        for output in [OutputMode::Discard, OutputMode::LocalText] {
            let rig = Rig::new();
            let mut telemetry = rig.default_loop(output);
            block_on(telemetry.bring_up()).unwrap();

            for ms in (0..=100).step_by(5) {
                rig.clock.set(ms);
                block_on(telemetry.step());
            }
            assert_eq!(telemetry.stats().samples, 10);
            assert_eq!(rig.journal.count(is_network), 0);
        }

        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::RemotePublish);
        block_on(telemetry.bring_up()).unwrap();
        for ms in (0..=100).step_by(5) {
            rig.clock.set(ms);
            block_on(telemetry.step());
        }
        assert_eq!(telemetry.stats().samples, 10);
        assert_eq!(telemetry.stats().emitted, 10);
    }

    #[test]
    fn test_discard_counts_samples() {
        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::Discard);
        block_on(telemetry.bring_up()).unwrap();
        rig.clock.set(10);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().discarded, 1);
        assert_eq!(telemetry.stats().emitted, 0);
    }

    #[test]
    fn test_alerts_tracked_while_sampling() {
        let rig = Rig::new();
        let mut imu = FakeImu::new(&rig.journal);
        imu.reading.accel.z = 50.0;
        let mut telemetry = rig.build(
            OutputMode::Discard,
            imu,
            FakeLink::new(&rig.journal),
            FakeSession::new(&rig.journal),
        );
        block_on(telemetry.bring_up()).unwrap();
        rig.clock.set(10);
        block_on(telemetry.step());
        assert_eq!(
            telemetry.alerts().counts(crate::alerts::Channel::Acceleration),
            &[1, 1, 0, 0]
        );
    }

    #[test]
    fn test_link_begin_rejected_is_retryable() {
        let rig = Rig::new();
        let mut link = FakeLink::new(&rig.journal);
        link.reject_begin = true;
        let mut telemetry = rig.build(
            OutputMode::RemotePublish,
            FakeImu::new(&rig.journal),
            link,
            FakeSession::new(&rig.journal),
        );

        let err = block_on(telemetry.bring_up()).unwrap_err();
        assert_eq!(err, BringUpError::LinkUnavailable);
        assert!(!err.is_fatal());

        let remote = telemetry.sink().remote().unwrap();
        assert_eq!(remote.link.polls.get(), 0);
        assert_eq!(rig.journal.count(|e| matches!(e, Event::Connect { .. })), 0);
    }

    #[test]
    fn test_counters_wrap_at_max() {
        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::RemotePublish);
        block_on(telemetry.bring_up()).unwrap();
        telemetry.stats = LoopStats {
            iterations: u32::MAX,
            samples: u32::MAX,
            emitted: u32::MAX,
            discarded: u32::MAX,
            dropped: u32::MAX,
            read_errors: u32::MAX,
            reconnect_attempts: u32::MAX,
            reconnects: u32::MAX,
        };

        // Reconnect, sample and publish
        telemetry.sink.remote_mut().unwrap().session.connected = false;
        rig.clock.set(10);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().iterations, 0);
        assert_eq!(telemetry.stats().reconnect_attempts, 0);
        assert_eq!(telemetry.stats().reconnects, 0);
        assert_eq!(telemetry.stats().samples, 0);
        assert_eq!(telemetry.stats().emitted, 0);

        // Failed publish
        telemetry.sink.remote_mut().unwrap().session.fail_publish = true;
        rig.clock.set(20);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().dropped, 0);

        // Failed read
        telemetry.sink.remote_mut().unwrap().session.fail_publish = false;
        telemetry.sensor.fail_reads = 1;
        rig.clock.set(30);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().read_errors, 0);
        assert_eq!(telemetry.stats().samples, 1);
    }

    #[test]
    fn test_discard_counter_wraps_at_max() {
        let rig = Rig::new();
        let mut telemetry = rig.default_loop(OutputMode::Discard);
        block_on(telemetry.bring_up()).unwrap();
        telemetry.stats.discarded = u32::MAX;
        rig.clock.set(10);
        block_on(telemetry.step());
        assert_eq!(telemetry.stats().discarded, 0);
    }
}

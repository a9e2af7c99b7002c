//! Frame scheduler
//!
//! One background worker per streaming session. Each iteration drains at
//! most one queued command, checks connection staleness, emits exactly
//! one frame for the current mode, and self-throttles to the configured
//! FPS. The worker is the sole owner of mode, ramp and stats state; the
//! session thread only enqueues commands and reads snapshots.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rosc::OscType;
use tracing::{debug, error, info, warn};

use crate::config::StreamSettings;
use crate::error::StreamError;
use crate::modes::{ModeStateMachine, StreamMode};
use crate::monitor::ConnectionMonitor;
use crate::osc_transport::Transport;
use crate::ramp::{build_envelope, RampPhase, RampState};
use crate::sequence::SequenceProvider;
use crate::stats::{StatsSnapshot, StreamStats};
use crate::transform::{Denormalizer, Resolved, TransformTable};

/// Frame index messages go out on this address
pub const FRAME_ADDRESS: &str = "/mh/frame";
/// Mode name messages go out on this address
pub const MODE_ADDRESS: &str = "/mh/mode";

/// Log a sample of channel values every Nth emitted frame
const FRAME_LOG_INTERVAL: u64 = 30;

/// Control commands carried by the session -> worker queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCommand {
    /// Enter heartbeat streaming
    Start,
    TurnLeft,
    TurnRight,
    /// Ramp back toward the neutral pose
    Baseline,
    /// Stop streaming (terminal until Start)
    Stop,
    /// Terminate the worker thread
    Quit,
}

/// Timing and animation parameters for one scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub fps: u32,
    pub turn_duration_s: f32,
    pub hold_s: f32,
    pub connection_timeout: Duration,
}

impl SchedulerConfig {
    pub fn from_settings(settings: &StreamSettings) -> Self {
        Self {
            fps: settings.fps,
            turn_duration_s: settings.turn_duration_s,
            hold_s: settings.hold_s,
            connection_timeout: Duration::from_secs_f32(settings.connection_timeout_s),
        }
    }

    fn ramp_frames(&self) -> usize {
        ((self.turn_duration_s * self.fps as f32).round() as usize).max(1)
    }

    fn hold_frames(&self) -> usize {
        (self.hold_s * self.fps as f32).round() as usize
    }
}

/// Single-writer worker state; lives entirely on the scheduler thread
struct StreamWorker {
    machine: ModeStateMachine,
    table: TransformTable,
    denorm: Denormalizer,
    provider: Box<dyn SequenceProvider>,
    transport: Box<dyn Transport>,
    stats: Arc<StreamStats>,
    monitor: ConnectionMonitor,
    config: SchedulerConfig,
    frame_count: u64,
}

impl StreamWorker {
    /// Apply one queued command. Returns false when the worker should exit.
    fn handle_command(&mut self, command: StreamCommand) -> bool {
        match command {
            StreamCommand::Start => {
                if self.machine.start() {
                    self.provider.restart(StreamMode::Heartbeat);
                    info!("▶️  started heartbeat streaming");
                }
            }
            StreamCommand::TurnLeft => self.begin_ramp(StreamMode::TurningLeft),
            StreamCommand::TurnRight => self.begin_ramp(StreamMode::TurningRight),
            StreamCommand::Baseline => self.begin_ramp(StreamMode::Baseline),
            StreamCommand::Stop => {
                if self.machine.stop() {
                    self.flush_neutral();
                    info!("⏹️  stopped streaming");
                }
            }
            StreamCommand::Quit => return false,
        }
        true
    }

    fn begin_ramp(&mut self, target: StreamMode) {
        let ramp = RampState::new(
            build_envelope(self.config.ramp_frames()),
            self.config.hold_frames(),
        );
        if self.machine.begin(target, ramp) {
            self.provider.restart(target);
            info!("started {} ramp", target);
        } else {
            warn!("{} ignored - start streaming first", target);
        }
    }

    /// One scheduler iteration after command draining
    fn tick(&mut self) -> Result<(), StreamError> {
        self.monitor.check(self.stats.last_send_age());

        match self.machine.mode() {
            StreamMode::Idle | StreamMode::Stopped => Ok(()),
            StreamMode::Heartbeat => {
                self.emit_heartbeat();
                Ok(())
            }
            StreamMode::Baseline | StreamMode::TurningLeft | StreamMode::TurningRight => {
                self.emit_ramp_frame()
            }
        }
    }

    /// Heartbeat streams the neutral vector on every configured channel
    fn emit_heartbeat(&mut self) {
        let zeros = vec![0.0; self.table.len()];
        self.send_frame(&zeros);
    }

    fn emit_ramp_frame(&mut self) -> Result<(), StreamError> {
        let mode = self.machine.mode();
        let phase = match self.machine.ramp_mut() {
            Some(ramp) => ramp.phase(),
            None => {
                // Ramped mode without a ramp cannot happen via commands
                self.machine.revert_to_heartbeat();
                self.emit_heartbeat();
                return Ok(());
            }
        };

        match phase {
            RampPhase::Finished => {
                info!("{} complete, reverting to heartbeat", mode);
                self.machine.revert_to_heartbeat();
                self.emit_heartbeat();
                Ok(())
            }
            RampPhase::Hold => {
                let held = self
                    .machine
                    .ramp_mut()
                    .and_then(|r| r.targets().map(|t| t.to_vec()));
                let values = match held {
                    Some(values) => values,
                    None => self.compute_frame_values(mode, 1.0)?,
                };
                self.send_frame(&values);
                if let Some(ramp) = self.machine.ramp_mut() {
                    ramp.advance();
                }
                Ok(())
            }
            RampPhase::Ramp(gain) => {
                let final_frame = self
                    .machine
                    .ramp_mut()
                    .map(|r| r.at_final_ramp_frame())
                    .unwrap_or(false);
                let values = self.compute_frame_values(mode, gain)?;
                self.send_frame(&values);
                if let Some(ramp) = self.machine.ramp_mut() {
                    if final_frame {
                        ramp.record_targets(values);
                    }
                    ramp.advance();
                }
                Ok(())
            }
        }
    }

    /// Pull one provider frame and resolve every channel at the given gain
    fn compute_frame_values(
        &mut self,
        mode: StreamMode,
        gain: f32,
    ) -> Result<Vec<f32>, StreamError> {
        let frame = self.provider.next_frame(mode);
        if frame.len() != self.provider.features() {
            return Err(StreamError::InvalidParameter(format!(
                "provider returned {} features, expected {}",
                frame.len(),
                self.provider.features()
            )));
        }

        let mut values = Vec::with_capacity(self.table.len());
        for channel in self.table.channels() {
            match self.table.resolve(channel, &frame, &self.denorm) {
                Resolved::Value(v) => values.push(v * gain),
                Resolved::Miss => {
                    // Defined fallback: the channel still gets a frame
                    self.stats.record_mapping_miss();
                    values.push(0.0);
                }
            }
        }
        Ok(values)
    }

    /// Send one value per channel plus the frame/mode control messages.
    ///
    /// Individual send failures are counted and logged; they never abort
    /// the frame.
    fn send_frame(&mut self, values: &[f32]) {
        let mut sent = 0u64;
        for (channel, value) in self.table.channels().iter().zip(values) {
            match self
                .transport
                .send(&channel.address, vec![OscType::Float(*value)])
            {
                Ok(()) => sent += 1,
                Err(e) => {
                    self.stats.record_error();
                    warn!("OSC send error: {}", e);
                }
            }
        }

        let frame_info: [(&str, OscType); 2] = [
            (FRAME_ADDRESS, OscType::Int(self.frame_count as i32)),
            (
                MODE_ADDRESS,
                OscType::String(self.machine.mode().wire_name().to_string()),
            ),
        ];
        for (address, arg) in frame_info {
            match self.transport.send(address, vec![arg]) {
                Ok(()) => sent += 1,
                Err(e) => {
                    self.stats.record_error();
                    warn!("OSC send error: {}", e);
                }
            }
        }

        if sent > 0 {
            self.stats.record_sent(sent);
        }
        self.stats.record_frame();

        if self.frame_count % FRAME_LOG_INTERVAL == 0 {
            let sample: Vec<String> = values.iter().take(3).map(|v| format!("{:.2}", v)).collect();
            debug!(
                "frame {} ({}): {}",
                self.frame_count,
                self.machine.mode(),
                sample.join(", ")
            );
        }
        self.frame_count += 1;
    }

    /// One-shot neutral flush on the stop transition
    fn flush_neutral(&mut self) {
        let mut sent = 0u64;
        for channel in self.table.channels() {
            match self.transport.send(&channel.address, vec![OscType::Float(0.0)]) {
                Ok(()) => sent += 1,
                Err(e) => {
                    self.stats.record_error();
                    warn!("OSC send error: {}", e);
                }
            }
        }
        if self
            .transport
            .send(
                MODE_ADDRESS,
                vec![OscType::String(StreamMode::Stopped.wire_name().to_string())],
            )
            .is_ok()
        {
            sent += 1;
        }
        if sent > 0 {
            self.stats.record_sent(sent);
        }
    }
}

/// Handle to a running scheduler worker
pub struct FrameScheduler {
    command_tx: Sender<StreamCommand>,
    stats: Arc<StreamStats>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FrameScheduler {
    /// Validate parameters and spawn the worker thread
    pub fn spawn(
        table: TransformTable,
        denorm: Denormalizer,
        provider: Box<dyn SequenceProvider>,
        transport: Box<dyn Transport>,
        config: SchedulerConfig,
    ) -> Result<Self, StreamError> {
        if config.fps == 0 {
            return Err(StreamError::InvalidParameter(
                "fps must be >= 1".to_string(),
            ));
        }
        if provider.features() != denorm.features() {
            return Err(StreamError::Config(format!(
                "provider emits {} features but normalization covers {}",
                provider.features(),
                denorm.features()
            )));
        }

        let stats = Arc::new(StreamStats::new());
        let (command_tx, command_rx) = mpsc::channel();

        let worker = StreamWorker {
            machine: ModeStateMachine::new(),
            table,
            denorm,
            provider,
            transport,
            stats: Arc::clone(&stats),
            monitor: ConnectionMonitor::new(config.connection_timeout),
            config: config.clone(),
            frame_count: 0,
        };

        let handle = thread::Builder::new()
            .name("frame-scheduler".to_string())
            .spawn(move || run_worker(worker, command_rx))
            .map_err(|e| StreamError::Config(format!("cannot spawn scheduler thread: {}", e)))?;

        info!("frame scheduler running at {} fps", config.fps);
        Ok(Self {
            command_tx,
            stats,
            handle: Some(handle),
        })
    }

    /// Enqueue one control command (non-blocking)
    pub fn send_command(&self, command: StreamCommand) -> Result<(), StreamError> {
        self.command_tx
            .send(command)
            .map_err(|_| StreamError::Send("scheduler worker is not running".to_string()))
    }

    /// Eventually-consistent view of the worker's counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Ask the worker to exit and wait for it
    pub fn shutdown(mut self) {
        let _ = self.command_tx.send(StreamCommand::Quit);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Worker loop: commands, staleness, one frame, stats, self-throttled sleep
fn run_worker(mut worker: StreamWorker, command_rx: Receiver<StreamCommand>) {
    let period = Duration::from_secs_f64(1.0 / worker.config.fps as f64);

    loop {
        let started = Instant::now();

        match command_rx.try_recv() {
            Ok(command) => {
                if !worker.handle_command(command) {
                    break;
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        if let Err(e) = worker.tick() {
            // Never kill the thread over a bad tick; back off and retry
            error!("scheduler error: {}", e);
            thread::sleep(Duration::from_millis(100));
            continue;
        }

        let elapsed = started.elapsed();
        if elapsed < period {
            thread::sleep(period - elapsed);
        }
    }

    info!("frame scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::NeutralProvider;
    use crate::transform::Channel;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<(String, Vec<OscType>)>>>,
        fail_addresses: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<(String, Vec<OscType>)> {
            self.sent.lock().unwrap().clone()
        }

        fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }

        fn fail_address(&self, address: &str) {
            self.fail_addresses.lock().unwrap().push(address.to_string());
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, address: &str, args: Vec<OscType>) -> Result<(), StreamError> {
            if self.fail_addresses.lock().unwrap().iter().any(|a| a == address) {
                return Err(StreamError::Send(format!("{}: unreachable", address)));
            }
            self.sent.lock().unwrap().push((address.to_string(), args));
            Ok(())
        }
    }

    /// Provider that emits a constant frame, for value-level assertions
    struct ConstantProvider {
        frame: Vec<f32>,
    }

    impl SequenceProvider for ConstantProvider {
        fn features(&self) -> usize {
            self.frame.len()
        }
        fn restart(&mut self, _mode: StreamMode) {}
        fn next_frame(&mut self, _mode: StreamMode) -> Vec<f32> {
            self.frame.clone()
        }
    }

    fn channels() -> Vec<Channel> {
        vec![
            Channel {
                source_column: "a".to_string(),
                address: "/bone/pelvis/yaw".to_string(),
                scale: 2.0,
                offset: 0.0,
                clamp: None,
            },
            Channel {
                source_column: "b".to_string(),
                address: "/bone/neck_01/pitch".to_string(),
                scale: 1.0,
                offset: 1.0,
                clamp: None,
            },
        ]
    }

    fn feature_columns() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    fn config(fps: u32) -> SchedulerConfig {
        SchedulerConfig {
            fps,
            turn_duration_s: 1.0,
            hold_s: 0.0,
            connection_timeout: Duration::from_secs(2),
        }
    }

    fn worker_with(
        provider: Box<dyn SequenceProvider>,
        transport: RecordingTransport,
        cfg: SchedulerConfig,
    ) -> StreamWorker {
        let features = provider.features();
        StreamWorker {
            machine: ModeStateMachine::new(),
            table: TransformTable::new(channels(), &feature_columns()),
            denorm: Denormalizer::identity(features),
            provider,
            transport: Box::new(transport),
            stats: Arc::new(StreamStats::new()),
            monitor: ConnectionMonitor::default(),
            config: cfg,
            frame_count: 0,
        }
    }

    fn float_of(args: &[OscType]) -> f32 {
        match args[0] {
            OscType::Float(v) => v,
            _ => panic!("expected float arg"),
        }
    }

    #[test]
    fn test_idle_emits_nothing() {
        let transport = RecordingTransport::default();
        let mut worker = worker_with(
            Box::new(NeutralProvider::new(2)),
            transport.clone(),
            config(30),
        );

        worker.tick().unwrap();
        assert!(transport.sent().is_empty());
        assert_eq!(worker.stats.snapshot().frame_count, 0);
    }

    #[test]
    fn test_heartbeat_sends_zeros_and_frame_info() {
        let transport = RecordingTransport::default();
        let mut worker = worker_with(
            Box::new(NeutralProvider::new(2)),
            transport.clone(),
            config(30),
        );

        assert!(worker.handle_command(StreamCommand::Start));
        worker.tick().unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 4, "two channels + frame + mode");
        assert_eq!(sent[0].0, "/bone/pelvis/yaw");
        assert_eq!(float_of(&sent[0].1), 0.0);
        assert_eq!(sent[1].0, "/bone/neck_01/pitch");
        assert_eq!(float_of(&sent[1].1), 0.0);
        assert_eq!(sent[2].0, FRAME_ADDRESS);
        assert_eq!(sent[2].1[0], OscType::Int(0));
        assert_eq!(sent[3].0, MODE_ADDRESS);
        assert_eq!(sent[3].1[0], OscType::String("HEARTBEAT".to_string()));

        let snap = worker.stats.snapshot();
        assert_eq!(snap.sent_count, 4);
        assert_eq!(snap.frame_count, 1);
    }

    #[test]
    fn test_ramp_scales_transformed_values() {
        let transport = RecordingTransport::default();
        // 3-frame ramp at 3 fps over 1 s
        let mut cfg = config(3);
        cfg.turn_duration_s = 1.0;
        let mut worker = worker_with(
            Box::new(ConstantProvider {
                frame: vec![1.0, 2.0],
            }),
            transport.clone(),
            cfg,
        );

        worker.handle_command(StreamCommand::Start);
        worker.handle_command(StreamCommand::TurnLeft);
        transport.clear();

        // Frame 0: envelope gain 0
        worker.tick().unwrap();
        let sent = transport.sent();
        assert_eq!(float_of(&sent[0].1), 0.0);
        assert_eq!(sent[3].1[0], OscType::String("TURNING_LEFT".to_string()));
        transport.clear();

        // Frame 1: gain 0.5 -> channel a: 1.0*2.0*0.5, channel b: (2.0+1.0)*0.5
        worker.tick().unwrap();
        let sent = transport.sent();
        assert!((float_of(&sent[0].1) - 1.0).abs() < 1e-5);
        assert!((float_of(&sent[1].1) - 1.5).abs() < 1e-5);
        transport.clear();

        // Frame 2: gain 1.0 -> full values
        worker.tick().unwrap();
        let sent = transport.sent();
        assert!((float_of(&sent[0].1) - 2.0).abs() < 1e-5);
        assert!((float_of(&sent[1].1) - 3.0).abs() < 1e-5);
        transport.clear();

        // Ramp exhausted, no hold: reverts to heartbeat and emits zeros
        worker.tick().unwrap();
        let sent = transport.sent();
        assert_eq!(float_of(&sent[0].1), 0.0);
        assert_eq!(sent[3].1[0], OscType::String("HEARTBEAT".to_string()));
        assert_eq!(worker.machine.mode(), StreamMode::Heartbeat);
    }

    #[test]
    fn test_hold_repeats_final_values() {
        let transport = RecordingTransport::default();
        let mut cfg = config(2);
        cfg.turn_duration_s = 1.0; // 2 ramp frames
        cfg.hold_s = 1.0; // 2 hold frames
        let mut worker = worker_with(
            Box::new(ConstantProvider {
                frame: vec![1.0, 2.0],
            }),
            transport.clone(),
            cfg,
        );

        worker.handle_command(StreamCommand::Start);
        worker.handle_command(StreamCommand::TurnRight);
        worker.tick().unwrap(); // gain 0
        worker.tick().unwrap(); // gain 1, records targets
        transport.clear();

        for _ in 0..2 {
            worker.tick().unwrap();
            let sent = transport.sent();
            assert!((float_of(&sent[0].1) - 2.0).abs() < 1e-5, "held at target");
            assert!((float_of(&sent[1].1) - 3.0).abs() < 1e-5);
            assert_eq!(sent[3].1[0], OscType::String("TURNING_RIGHT".to_string()));
            transport.clear();
        }

        worker.tick().unwrap();
        assert_eq!(worker.machine.mode(), StreamMode::Heartbeat);
    }

    #[test]
    fn test_mapping_miss_sends_zero_fallback() {
        let transport = RecordingTransport::default();
        let mut bad_channels = channels();
        bad_channels[1].source_column = "missing_column".to_string();

        let mut worker = StreamWorker {
            machine: ModeStateMachine::new(),
            table: TransformTable::new(bad_channels, &feature_columns()),
            denorm: Denormalizer::identity(2),
            provider: Box::new(ConstantProvider {
                frame: vec![1.0, 2.0],
            }),
            transport: Box::new(transport.clone()),
            stats: Arc::new(StreamStats::new()),
            monitor: ConnectionMonitor::default(),
            config: config(2),
            frame_count: 0,
        };

        worker.handle_command(StreamCommand::Start);
        worker.handle_command(StreamCommand::TurnLeft);
        worker.tick().unwrap();
        worker.tick().unwrap();

        let snap = worker.stats.snapshot();
        assert_eq!(snap.mapping_miss_count, 2, "one miss per emitted frame");
        assert_eq!(snap.error_count, 0, "a miss is not a send error");

        // The missing channel still got its fallback frame
        let sent = transport.sent();
        let last_miss = sent
            .iter()
            .filter(|(addr, _)| addr == "/bone/neck_01/pitch")
            .last()
            .unwrap();
        assert_eq!(float_of(&last_miss.1), 0.0);
    }

    #[test]
    fn test_send_failure_does_not_abort_frame() {
        let transport = RecordingTransport::default();
        transport.fail_address("/bone/pelvis/yaw");
        let mut worker = worker_with(
            Box::new(NeutralProvider::new(2)),
            transport.clone(),
            config(30),
        );

        worker.handle_command(StreamCommand::Start);
        worker.tick().unwrap();

        let snap = worker.stats.snapshot();
        assert_eq!(snap.error_count, 1);
        assert_eq!(snap.sent_count, 3, "remaining sends still went out");
        assert_eq!(snap.frame_count, 1);
    }

    #[test]
    fn test_turn_refused_before_start() {
        let transport = RecordingTransport::default();
        let mut worker = worker_with(
            Box::new(NeutralProvider::new(2)),
            transport.clone(),
            config(30),
        );

        worker.handle_command(StreamCommand::TurnLeft);
        assert_eq!(worker.machine.mode(), StreamMode::Idle);
        worker.tick().unwrap();
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_stop_flushes_neutral_and_goes_silent() {
        let transport = RecordingTransport::default();
        let mut worker = worker_with(
            Box::new(NeutralProvider::new(2)),
            transport.clone(),
            config(30),
        );

        worker.handle_command(StreamCommand::Start);
        worker.tick().unwrap();
        transport.clear();

        worker.handle_command(StreamCommand::Stop);
        let sent = transport.sent();
        assert_eq!(sent.len(), 3, "zero flush per channel + mode message");
        assert_eq!(float_of(&sent[0].1), 0.0);
        assert_eq!(sent[2].1[0], OscType::String("STOPPED".to_string()));
        transport.clear();

        worker.tick().unwrap();
        assert!(transport.sent().is_empty(), "stopped mode emits no frames");
    }

    #[test]
    fn test_quit_command_exits_loop() {
        let transport = RecordingTransport::default();
        let mut worker = worker_with(Box::new(NeutralProvider::new(2)), transport, config(30));
        assert!(worker.handle_command(StreamCommand::Start));
        assert!(!worker.handle_command(StreamCommand::Quit));
    }

    #[test]
    fn test_commands_apply_in_fifo_order() {
        let transport = RecordingTransport::default();
        let mut worker = worker_with(
            Box::new(NeutralProvider::new(2)),
            transport.clone(),
            config(30),
        );

        // One command per tick, in arrival order
        for command in [
            StreamCommand::Start,
            StreamCommand::TurnLeft,
            StreamCommand::TurnRight,
        ] {
            worker.handle_command(command);
        }
        assert_eq!(worker.machine.mode(), StreamMode::TurningRight);
    }

    #[test]
    fn test_spawn_rejects_zero_fps() {
        let table = TransformTable::new(channels(), &feature_columns());
        let result = FrameScheduler::spawn(
            table,
            Denormalizer::identity(2),
            Box::new(NeutralProvider::new(2)),
            Box::new(RecordingTransport::default()),
            config(0),
        );
        assert!(matches!(result, Err(StreamError::InvalidParameter(_))));
    }

    #[test]
    fn test_spawn_rejects_feature_mismatch() {
        let table = TransformTable::new(channels(), &feature_columns());
        let result = FrameScheduler::spawn(
            table,
            Denormalizer::identity(3),
            Box::new(NeutralProvider::new(2)),
            Box::new(RecordingTransport::default()),
            config(30),
        );
        assert!(matches!(result, Err(StreamError::Config(_))));
    }
}

/*!
 * The bench runner.
 *
 * A session runs in two phases. Command lines are first read and queued up
 * to and including the first `exit` line; the queue is then drained in
 * submission order through the dispatcher. `exit` flushes the port logs
 * when it executes but does not stop the drain, so lines queued after it
 * still run.
 */
use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use hwbench_core::config::BenchConfig;
use hwbench_core::logging;

use crate::command::Command;
use crate::dispatcher::{Dispatcher, Line};
use crate::error::{Error, Result};
use crate::sink::LogSink;

/// Outcome of the reading phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Lines queued
    pub queued: usize,
    /// Whether reading stopped on an `exit` line
    pub saw_exit: bool,
}

/// Outcome of a whole session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines queued during the reading phase
    pub queued: usize,
    /// Commands executed during the drain
    pub executed: usize,
    /// Whether the input ended with `exit`
    pub saw_exit: bool,
}

/// A bench session: dispatcher plus command queue
#[derive(Debug)]
pub struct Bench {
    dispatcher: Dispatcher,
    queue: VecDeque<String>,
    sequence: u64,
}

impl Bench {
    /// Create a bench around a dispatcher
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            queue: VecDeque::new(),
            sequence: 0,
        }
    }

    /// Create a bench for a configuration
    pub fn from_config<S: LogSink + 'static>(config: &BenchConfig, sink: S) -> Self {
        Self::new(Dispatcher::from_config(config, sink))
    }

    /// The dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Number of queued lines
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue one raw line
    pub fn submit<S: Into<String>>(&mut self, line: S) {
        self.queue.push_back(line.into());
    }

    /// Queue lines from `reader` up to and including the first `exit` line.
    ///
    /// Reading also stops at end of input; the session then has no `exit`
    /// and its logs will not be flushed. Bytes that are not valid UTF-8 are
    /// replaced with U+FFFD instead of ending the session.
    pub fn read_commands<R: BufRead>(&mut self, mut reader: R) -> Result<ReadOutcome> {
        let mut outcome = ReadOutcome::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let trimmed = String::from_utf8_lossy(&buf).trim().to_string();
            let saw_exit = Command::is_exit_line(&trimmed);

            self.submit(trimmed);
            outcome.queued += 1;

            if saw_exit {
                outcome.saw_exit = true;
                break;
            }
        }

        if !outcome.saw_exit {
            warn!(
                queued = outcome.queued,
                "Input ended without exit, port logs will not be written"
            );
        }

        debug!(queued = outcome.queued, "Read commands");
        Ok(outcome)
    }

    /// Execute one line immediately, bypassing the queue
    pub fn execute(&mut self, line: &str) -> Vec<Line> {
        self.sequence += 1;
        let verb = line.split_whitespace().next().unwrap_or_default();
        let span = logging::command_span(verb, self.sequence);
        let _guard = span.enter();

        self.dispatcher.execute(line)
    }

    /// Drain the queue in submission order, passing every output line to `emit`.
    ///
    /// Returns the number of commands executed.
    pub fn run_queued<F>(&mut self, mut emit: F) -> usize
    where
        F: FnMut(&Line),
    {
        let mut executed = 0;

        while let Some(line) = self.queue.pop_front() {
            for output in self.execute(&line) {
                emit(&output);
            }
            executed += 1;
        }

        executed
    }

    /// Run both phases over `reader`
    pub fn run<R, F>(&mut self, reader: R, emit: F) -> Result<RunSummary>
    where
        R: BufRead,
        F: FnMut(&Line),
    {
        let outcome = self.read_commands(reader)?;
        let executed = self.run_queued(emit);

        info!(
            queued = outcome.queued,
            executed,
            flushes = self.dispatcher.flushes(),
            "Session finished"
        );

        Ok(RunSummary {
            queued: outcome.queued,
            executed,
            saw_exit: outcome.saw_exit,
        })
    }
}

/// A bench shared between several command sources.
///
/// Every command holds the lock for its whole execution, so commands from
/// different sources never interleave.
#[derive(Debug, Clone)]
pub struct SharedBench {
    inner: Arc<Mutex<Bench>>,
}

impl SharedBench {
    /// Share a bench
    pub fn new(bench: Bench) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bench)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Bench>> {
        self.inner.lock().map_err(|_| {
            Error::Core(hwbench_core::Error::runtime(
                "Failed to acquire lock on shared bench",
            ))
        })
    }

    /// Queue one raw line
    pub fn submit<S: Into<String>>(&self, line: S) -> Result<()> {
        self.lock()?.submit(line);
        Ok(())
    }

    /// Execute one line immediately
    pub fn execute(&self, line: &str) -> Result<Vec<Line>> {
        Ok(self.lock()?.execute(line))
    }

    /// Drain the queue, collecting every output line
    pub fn run_queued(&self) -> Result<Vec<Line>> {
        let mut lines = Vec::new();
        self.lock()?.run_queued(|line| lines.push(line.clone()));
        Ok(lines)
    }

    /// Run a closure with exclusive access to the bench
    pub fn with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Bench) -> T,
    {
        Ok(f(&mut *self.lock()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryLogSink;
    use std::io::Cursor;
    use std::thread;

    fn bench(sink: MemoryLogSink) -> Bench {
        let config = BenchConfig {
            ports: vec!["I2C".into(), "SPI".into()],
            max_sensors: 1,
            max_displays: 1,
            max_wireless_adapters: 1,
            max_motor_drivers: 1,
        };
        Bench::from_config(&config, sink)
    }

    #[test]
    fn test_reading_stops_at_exit() {
        let mut bench = bench(MemoryLogSink::new());
        let input = Cursor::new("list ports\n  exit  \nlist ports\n");

        let outcome = bench.read_commands(input).unwrap();
        assert_eq!(
            outcome,
            ReadOutcome {
                queued: 2,
                saw_exit: true
            }
        );
        assert_eq!(bench.pending(), 2);
    }

    #[test]
    fn test_reading_stops_at_eof() {
        let mut bench = bench(MemoryLogSink::new());
        let outcome = bench.read_commands(Cursor::new("list ports")).unwrap();
        assert!(!outcome.saw_exit);
        assert_eq!(outcome.queued, 1);
    }

    #[test]
    fn test_reading_keeps_invalid_utf8_lines() {
        let mut bench = bench(MemoryLogSink::new());
        let input = Cursor::new(b"printDisplay 0 caf\xe9\nexit\n".to_vec());

        let outcome = bench.read_commands(input).unwrap();
        assert_eq!(
            outcome,
            ReadOutcome {
                queued: 2,
                saw_exit: true
            }
        );
        assert_eq!(bench.queue[0], "printDisplay 0 caf\u{FFFD}");
    }

    #[test]
    fn test_commands_after_exit_still_run() {
        let sink = MemoryLogSink::new();
        let mut bench = bench(sink.clone());
        bench.submit("addDev LCD 0 0");
        bench.submit("exit");
        bench.submit("turnON 0");

        let mut out = Vec::new();
        assert_eq!(bench.run_queued(|line| out.push(line.clone())), 3);

        assert_eq!(
            out,
            vec![
                Line::Out("Device added.".into()),
                Line::Out("Exiting ...".into()),
                Line::Out("LCD: Turning ON.".into()),
            ]
        );
        // The flush happened before turnON ran
        assert_eq!(sink.latest("I2C_0").unwrap().entries, vec!["Port Opened."]);
        assert_eq!(bench.dispatcher().registry().ports()[0].log_len(), 1);
    }

    #[test]
    fn test_run_without_exit_does_not_flush() {
        let sink = MemoryLogSink::new();
        let mut bench = bench(sink.clone());

        let summary = bench
            .run(Cursor::new("addDev LCD 0 0\nturnON 0\n"), |_| {})
            .unwrap();

        assert_eq!(summary.executed, 2);
        assert!(!summary.saw_exit);
        assert!(sink.logs().is_empty());
    }

    #[test]
    fn test_shared_bench_from_threads() {
        let shared = SharedBench::new(bench(MemoryLogSink::new()));

        let handles = (0..2)
            .map(|port| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared
                        .execute(&format!("addDev BME280 {} 0", port))
                        .unwrap()
                })
            })
            .collect::<Vec<_>>();

        let mut outputs = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>();
        outputs.sort_by_key(|lines| lines[0].is_err());

        // One source wins the single sensor slot
        assert_eq!(outputs[0], vec![Line::Out("Device added.".into())]);
        assert_eq!(
            outputs[1],
            vec![Line::Err("Error: devID already in use for Sensor.".into())]
        );
        assert_eq!(shared.with(|bench| bench.dispatcher().registry().len()).unwrap(), 1);
    }

    #[test]
    fn test_shared_bench_queue() {
        let shared = SharedBench::new(bench(MemoryLogSink::new()));
        shared.submit("list sensor").unwrap();
        shared.submit("bogus").unwrap();

        assert_eq!(
            shared.run_queued().unwrap(),
            vec![
                Line::Out("list of Sensors:".into()),
                Line::Err("Unknown command: bogus".into()),
            ]
        );
    }
}

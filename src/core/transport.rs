use crate::core::clock::Clock;
use log::{debug, warn};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// A timer firing, stamped with the session generation it belongs to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Pulse {
    Tick { generation: u64, tick: u64, now: f64 },
    Sweep { generation: u64, now: f64 },
}

/// A recurring timer thread. Dropping `stop` wakes it immediately.
struct Timer {
    name: &'static str,
    stop: Option<Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Timer {
    fn spawn<F>(name: &'static str, period: Duration, mut fire: F) -> std::io::Result<Self>
    where
        F: FnMut(u64) -> bool + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name(format!("tapsync-{}", name))
            .spawn(move || timer_loop(period, &stop_rx, &mut fire))?;
        Ok(Self {
            name,
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    fn stop(&mut self) {
        self.stop.take();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("{} timer thread panicked", self.name);
            }
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fires at 0, period, 2*period, ... measured from the first firing, so a
/// slow consumer does not accumulate drift. Exits when `fire` returns false or
/// the stop channel is signalled or dropped.
fn timer_loop(period: Duration, stop: &Receiver<()>, fire: &mut dyn FnMut(u64) -> bool) {
    let origin = Instant::now();
    let mut count: u64 = 0;
    loop {
        if !fire(count) {
            return;
        }
        count += 1;
        let deadline = origin + period.mul_f64(count as f64);
        let wait = deadline.saturating_duration_since(Instant::now());
        match stop.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// The tick and sweep timers of one session.
pub struct Transport {
    generation: u64,
    tick: Timer,
    sweep: Timer,
}

impl Transport {
    /// Starts both timers. Each firing reads `clock` and is sent into `sink`
    /// as a [`Pulse`]. A timer exits by itself once `sink` is closed.
    pub fn start<T>(
        generation: u64,
        tick_period_ms: f64,
        sweep_period_ms: u64,
        clock: Arc<dyn Clock>,
        sink: Sender<T>,
    ) -> std::io::Result<Self>
    where
        T: From<Pulse> + Send + 'static,
    {
        let tick_period = Duration::from_secs_f64(tick_period_ms.max(1.0) / 1000.0);
        let sweep_period = Duration::from_millis(sweep_period_ms.max(1));

        let tick_clock = Arc::clone(&clock);
        let tick_sink = sink.clone();
        let tick = Timer::spawn("tick", tick_period, move |tick| {
            let now = tick_clock.now_ms();
            tick_sink.send(Pulse::Tick { generation, tick, now }.into()).is_ok()
        })?;

        let sweep = Timer::spawn("sweep", sweep_period, move |_| {
            let now = clock.now_ms();
            sink.send(Pulse::Sweep { generation, now }.into()).is_ok()
        })?;

        debug!(
            "Transport {} running: tick every {:.1}ms, sweep every {}ms",
            generation, tick_period_ms, sweep_period_ms
        );
        Ok(Self { generation, tick, sweep })
    }

    /// Cancels both timers and waits for their threads to exit. No pulse is
    /// sent after this returns.
    pub fn stop(mut self) {
        self.tick.stop();
        self.sweep.stop();
        debug!("Transport {} stopped", self.generation);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// Seconds elapsed since the previous tick.
    Tick(u64),
}

/// Handle to a running ticker; dropping it does not stop the thread, call
/// [`Ticker::stop`] for that.
#[derive(Debug)]
pub struct Ticker {
    pub rx: mpsc::Receiver<TimerEvent>,
    stop: Arc<AtomicBool>,
}

impl Ticker {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Spawn a thread that sends a tick every `interval`. The thread exits when
/// stopped or when the receiver goes away.
pub fn spawn_ticker(interval: Duration) -> Ticker {
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let step = interval.as_secs().max(1);

    thread::spawn(move || loop {
        thread::sleep(interval);
        if stop_flag.load(Ordering::SeqCst) {
            break;
        }
        if tx.send(TimerEvent::Tick(step)).is_err() {
            break;
        }
    });

    Ticker { rx, stop }
}

/// `MM:SS`, minutes not capped at 59.
pub fn format_clock(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

pub fn format_duration(total_secs: u64) -> String {
    if total_secs == 0 {
        return "0s".to_string();
    }
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

//! Background activation runs.
//!
//! One worker thread computes activation closures. Triggers are debounced
//! and coalesced: at most one request waits, and a newer trigger replaces
//! it. A trigger arriving while a run is in progress cancels that run, and
//! its partial result is dropped.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio_util::sync::CancellationToken;

use super::activation::{Closure, ClosureInput, compute_closure};

#[derive(Default)]
struct State {
    /// Latest trigger generation.
    generation: u64,
    pending: Option<ClosureInput>,
    last_trigger: Option<Instant>,
    running: Option<CancellationToken>,
    result: Option<Closure>,
    /// Runs started, cancelled ones included.
    runs: usize,
    shutdown: bool,
}

impl State {
    fn is_idle(&self) -> bool {
        self.pending.is_none() && self.running.is_none()
    }
}

struct Shared {
    state: Mutex<State>,
    /// Signals the worker: new request or shutdown.
    wake: Condvar,
    /// Signals waiters: a run finished.
    done: Condvar,
    debounce: Duration,
}

pub struct ActivationScheduler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl ActivationScheduler {
    pub fn new(debounce: Duration) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            wake: Condvar::new(),
            done: Condvar::new(),
            debounce,
        });
        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("unitscope-activation".into())
            .spawn(move || worker_loop(&worker_shared))
            .map_err(|err| tracing::warn!("[SCHEDULER] could not spawn worker: {}", err))
            .ok();
        Self { shared, worker }
    }

    /// Request a run over `input`, replacing any request still waiting.
    pub fn trigger(&self, input: ClosureInput) {
        if self.worker.is_none() {
            // no worker thread: compute in place
            let closure = compute_closure(input, &CancellationToken::new());
            let mut state = self.shared.state.lock();
            state.runs += 1;
            state.result = closure;
            return;
        }
        let mut state = self.shared.state.lock();
        state.generation += 1;
        if state.pending.replace(input).is_some() {
            tracing::trace!("[SCHEDULER] coalesced trigger {}", state.generation);
        }
        state.last_trigger = Some(Instant::now());
        if let Some(token) = &state.running {
            tracing::debug!("[SCHEDULER] cancelling running closure");
            token.cancel();
        }
        self.shared.wake.notify_one();
    }

    /// Take the latest completed closure, if any.
    pub fn take_result(&self) -> Option<Closure> {
        self.shared.state.lock().result.take()
    }

    /// Block until no run is pending or in progress, or until `timeout`.
    /// Returns whether the scheduler went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while !state.is_idle() {
            if self.shared.done.wait_until(&mut state, deadline).timed_out() {
                return state.is_idle();
            }
        }
        true
    }

    pub fn is_idle(&self) -> bool {
        self.shared.state.lock().is_idle()
    }

    /// Number of runs started so far.
    pub fn runs(&self) -> usize {
        self.shared.state.lock().runs
    }
}

impl Drop for ActivationScheduler {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            state.pending = None;
            if let Some(token) = &state.running {
                token.cancel();
            }
            self.shared.wake.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("[SCHEDULER] worker panicked");
            }
        }
    }
}

fn worker_loop(shared: &Shared) {
    let mut state = shared.state.lock();
    loop {
        while state.pending.is_none() && !state.shutdown {
            shared.wake.wait(&mut state);
        }
        if state.shutdown {
            break;
        }

        // quiet period: every new trigger restarts it
        while let Some(last) = state.last_trigger {
            let ready_at = last + shared.debounce;
            if Instant::now() >= ready_at || state.shutdown {
                break;
            }
            shared.wake.wait_until(&mut state, ready_at);
        }
        if state.shutdown {
            break;
        }
        let Some(input) = state.pending.take() else {
            continue;
        };

        let generation = state.generation;
        let token = CancellationToken::new();
        state.running = Some(token.clone());
        state.runs += 1;
        let run = state.runs;
        drop(state);

        tracing::debug!("[SCHEDULER] run {} started ({} starts)", run, input.starts.len());
        let closure = compute_closure(input, &token);

        state = shared.state.lock();
        state.running = None;
        match closure {
            Some(closure) if generation == state.generation && !token.is_cancelled() => {
                tracing::debug!("[SCHEDULER] run {} finished: {} active", run, closure.active.len());
                state.result = Some(closure);
            }
            _ => tracing::debug!("[SCHEDULER] run {} discarded", run),
        }
        shared.done.notify_all();
    }
    state.running = None;
    shared.done.notify_all();
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::hir::UnitResolver;
    use crate::project::vfs::Vfs;

    fn input() -> ClosureInput {
        let mut vfs = Vfs::new();
        let a = vfs.intern(Path::new("/p/A.pas"));
        vfs.set_overlay(a, "unit A; interface uses B; implementation end.");
        let b = vfs.intern(Path::new("/p/B.pas"));
        vfs.set_overlay(b, "unit B; interface implementation end.");
        let mut units = UnitResolver::new();
        units.add_candidate(a, Path::new("/p/A.pas"));
        units.add_candidate(b, Path::new("/p/B.pas"));
        ClosureInput {
            vfs,
            units,
            starts: vec![a],
            search: Vec::new(),
        }
    }

    /// A uses chain `C0 -> C1 -> ... -> C{len-1}` of overlay files.
    fn chain(len: usize) -> ClosureInput {
        let mut vfs = Vfs::new();
        let mut units = UnitResolver::new();
        let mut starts = Vec::new();
        for i in 0..len {
            let path = PathBuf::from(format!("/c/C{i}.pas"));
            let file = vfs.intern(&path);
            let text = if i + 1 < len {
                format!("unit C{i}; interface uses C{}; implementation end.", i + 1)
            } else {
                format!("unit C{i}; interface implementation end.")
            };
            vfs.set_overlay(file, text);
            units.add_candidate(file, &path);
            if i == 0 {
                starts.push(file);
            }
        }
        ClosureInput {
            vfs,
            units,
            starts,
            search: Vec::new(),
        }
    }

    #[test]
    fn test_single_trigger_produces_result() {
        let scheduler = ActivationScheduler::new(Duration::from_millis(5));
        scheduler.trigger(input());
        assert!(scheduler.wait_idle(Duration::from_secs(10)));
        let closure = scheduler.take_result().unwrap();
        assert_eq!(closure.active.len(), 2);
        assert!(scheduler.take_result().is_none());
    }

    #[test]
    fn test_burst_coalesces_into_one_run() {
        let scheduler = ActivationScheduler::new(Duration::from_millis(200));
        for _ in 0..20 {
            scheduler.trigger(input());
        }
        assert!(scheduler.wait_idle(Duration::from_secs(10)));
        assert_eq!(scheduler.runs(), 1);
        assert!(scheduler.take_result().is_some());
    }

    #[test]
    fn test_trigger_during_run_replaces_its_result() {
        let scheduler = ActivationScheduler::new(Duration::ZERO);
        scheduler.trigger(chain(40_000));
        let deadline = Instant::now() + Duration::from_secs(10);
        while scheduler.runs() == 0 && Instant::now() < deadline {
            std::thread::yield_now();
        }
        assert_eq!(scheduler.runs(), 1);

        scheduler.trigger(input());
        assert!(scheduler.wait_idle(Duration::from_secs(60)));
        assert_eq!(scheduler.runs(), 2);
        let closure = scheduler.take_result().unwrap();
        assert_eq!(closure.active.len(), 2);
        assert_eq!(closure.active[0].path, Path::new("/p/A.pas"));
        assert!(scheduler.is_idle());
        assert!(scheduler.take_result().is_none());
    }

    #[test]
    fn test_idle_without_triggers() {
        let scheduler = ActivationScheduler::new(Duration::ZERO);
        assert!(scheduler.is_idle());
        assert!(scheduler.wait_idle(Duration::from_millis(1)));
        assert_eq!(scheduler.runs(), 0);
    }
}

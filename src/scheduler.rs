use std::sync::mpsc::{channel, sync_channel, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::coverage::Profile;
use crate::error::Error;
use crate::executor::Executor;
use crate::gomodule::GoModule;
use crate::mutants::{Mutant, MutantStatus};
use crate::results::Results;
use crate::scanner::Scanner;
use crate::toolchain::Toolchain;
use crate::workdir::Dealer;
use crate::CancelToken;

enum Event {
    Outcome(Mutant),
    ScanFailed(Error),
    WorkerFailed(Error),
}

/// Bounded-parallelism driver: one producer thread scans and feeds a
/// bounded queue, `P` workers each own a sandbox for their lifetime and
/// pull one mutant at a time, and the calling thread aggregates results.
/// Result ordering is whatever the workers produce.
pub struct Scheduler<'a> {
    module: &'a GoModule,
    profile: &'a Profile,
    toolchain: &'a dyn Toolchain,
    config: &'a Config,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        module: &'a GoModule,
        profile: &'a Profile,
        toolchain: &'a dyn Toolchain,
        config: &'a Config,
    ) -> Self {
        Scheduler {
            module,
            profile,
            toolchain,
            config,
        }
    }

    pub fn run(
        &self,
        dealer: &Dealer,
        coverage_elapsed: Duration,
        cancel: &CancelToken,
    ) -> Result<Results, Error> {
        let started = Instant::now();
        let workers = self.config.worker_count();
        let timeout = Executor::timeout_for(coverage_elapsed, self.config.timeout_coefficient);

        let (mutant_tx, mutant_rx) = sync_channel::<Mutant>(workers * 2);
        let mutant_rx = Arc::new(Mutex::new(mutant_rx));
        let (event_tx, event_rx) = channel::<Event>();

        let mut mutants = Vec::new();
        let mut scan_failure: Option<Error> = None;
        let mut worker_failures: Vec<Error> = Vec::new();

        thread::scope(|s| {
            {
                let event_tx = event_tx.clone();
                let cancel = cancel.clone();
                let module = self.module;
                let profile = self.profile;
                let enabled = &self.config.enabled_kinds;
                s.spawn(move || {
                    produce(
                        Scanner::new(module, profile, enabled),
                        mutant_tx,
                        event_tx,
                        cancel,
                    )
                });
            }

            for _ in 0..workers {
                let mutant_rx = Arc::clone(&mutant_rx);
                let event_tx = event_tx.clone();
                let cancel = cancel.clone();
                let executor = Executor::new(self.toolchain, self.module, &self.config.tags, timeout);
                s.spawn(move || work(dealer, executor, mutant_rx, event_tx, cancel));
            }

            // Only the threads may keep senders and the shared receiver
            // alive; otherwise the channels never close and neither does
            // the event loop below.
            drop(event_tx);
            drop(mutant_rx);

            for event in event_rx {
                match event {
                    Event::Outcome(mutant) => mutants.push(mutant),
                    Event::ScanFailed(e) => {
                        // A scan failure is fatal; stop feeding the workers.
                        scan_failure = Some(e);
                        cancel.cancel();
                    }
                    Event::WorkerFailed(e) => worker_failures.push(e),
                }
            }
        });

        if let Some(e) = scan_failure {
            return Err(e);
        }
        if worker_failures.len() == workers {
            let first = worker_failures
                .first()
                .map(|e| e.to_string())
                .unwrap_or_default();
            return Err(Error::WorkersExhausted { workers, first });
        }

        let cancelled = cancel.is_cancelled();
        let mut results = Results::new(mutants, coverage_elapsed, started.elapsed(), cancelled);
        results.worker_errors = worker_failures.iter().map(Error::to_string).collect();
        Ok(results)
    }
}

fn produce(
    scanner: Scanner,
    mutant_tx: SyncSender<Mutant>,
    event_tx: Sender<Event>,
    cancel: CancelToken,
) {
    let files = match scanner.source_files() {
        Ok(files) => files,
        Err(e) => {
            let _ = event_tx.send(Event::ScanFailed(e));
            return;
        }
    };

    for rel in files {
        if cancel.is_cancelled() {
            return;
        }
        let file_mutants = match scanner.scan_file(&rel) {
            Ok(mutants) => mutants,
            Err(e) => {
                let _ = event_tx.send(Event::ScanFailed(e));
                return;
            }
        };
        for mutant in file_mutants {
            if cancel.is_cancelled() {
                return;
            }
            if mutant.status() == MutantStatus::Runnable {
                // Bounded queue: blocks while the workers are behind. A
                // send error means every worker is gone.
                if mutant_tx.send(mutant).is_err() {
                    return;
                }
            } else {
                // NotCovered mutants bypass the executor entirely.
                let _ = event_tx.send(Event::Outcome(mutant));
            }
        }
    }
}

fn work(
    dealer: &Dealer,
    executor: Executor,
    mutant_rx: Arc<Mutex<Receiver<Mutant>>>,
    event_tx: Sender<Event>,
    cancel: CancelToken,
) {
    let sandbox = match dealer.get() {
        Ok(sandbox) => sandbox,
        Err(e) => {
            let _ = event_tx.send(Event::WorkerFailed(e));
            return;
        }
    };

    let mut failure: Option<Error> = None;
    while let Some(mut mutant) = next_mutant(&mutant_rx) {
        if cancel.is_cancelled() {
            // Drain without executing so every discovered mutant still
            // reaches the aggregator; it stays Runnable.
            let _ = event_tx.send(Event::Outcome(mutant));
            continue;
        }
        match executor.execute(sandbox.path(), &mut mutant, &cancel) {
            Ok(_) => {
                let _ = event_tx.send(Event::Outcome(mutant));
            }
            Err(e) => {
                // Sandbox I/O failure: this worker is done, the run is not.
                let _ = event_tx.send(Event::Outcome(mutant));
                failure = Some(e);
                break;
            }
        }
    }

    dealer.release(sandbox);
    if let Some(e) = failure {
        let _ = event_tx.send(Event::WorkerFailed(e));
    }
}

fn next_mutant(rx: &Arc<Mutex<Receiver<Mutant>>>) -> Option<Mutant> {
    let guard = rx.lock().ok()?;
    guard.recv().ok()
}

//! Period scheduler: fans periods out to a private rayon pool.
//!
//! Each submitted period runs as one task with its own predictor, its own
//! seeded generator and its own account. The result travels back over a
//! one-shot `mpsc` channel and is fetched lazily through a [`PeriodHandle`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error};

use pipbench_core::domain::{Account, Frame, PeriodId};
use pipbench_core::engine::{PeriodSimulator, SimulationError};
use pipbench_core::lock::ResourceLock;
use pipbench_core::predictors::{create_predictor, FactoryError, PredictorConfig, PredictorContext};
use pipbench_core::rng::RngHierarchy;

use crate::periods::PeriodPlan;

/// Why a period produced no account.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeriodFailure {
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("period {period_id}: {source}")]
    Predictor {
        period_id: PeriodId,
        #[source]
        source: FactoryError,
    },
    #[error("period {period_id}: worker panicked: {message}")]
    Panicked { period_id: PeriodId, message: String },
    #[error("period {period_id}: worker exited without a result")]
    WorkerLost { period_id: PeriodId },
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Lazily fetched result of one submitted period.
///
/// The first [`wait`](PeriodHandle::wait) blocks on the worker; the outcome is
/// kept so later calls return the same account without receiving twice.
#[derive(Debug)]
pub struct PeriodHandle {
    period_id: PeriodId,
    rx: Mutex<Option<Receiver<Result<Account, PeriodFailure>>>>,
    outcome: OnceLock<Result<Account, PeriodFailure>>,
}

impl PeriodHandle {
    fn new(period_id: PeriodId, rx: Receiver<Result<Account, PeriodFailure>>) -> Self {
        Self {
            period_id,
            rx: Mutex::new(Some(rx)),
            outcome: OnceLock::new(),
        }
    }

    /// A handle that already holds its outcome.
    pub fn ready(period_id: PeriodId, outcome: Result<Account, PeriodFailure>) -> Self {
        let handle = Self {
            period_id,
            rx: Mutex::new(None),
            outcome: OnceLock::new(),
        };
        let _ = handle.outcome.set(outcome);
        handle
    }

    pub fn period_id(&self) -> PeriodId {
        self.period_id
    }

    pub fn is_ready(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Block until the period finishes and return its finalized account.
    pub fn wait(&self) -> Result<&Account, PeriodFailure> {
        let outcome = self.outcome.get_or_init(|| {
            let period_id = self.period_id;
            match self.rx.lock().take() {
                Some(rx) => rx
                    .recv()
                    .unwrap_or(Err(PeriodFailure::WorkerLost { period_id })),
                None => Err(PeriodFailure::WorkerLost { period_id }),
            }
        });
        outcome.as_ref().map_err(Clone::clone)
    }
}

/// Fixed-size worker pool running one period per task.
pub struct PeriodScheduler {
    pool: rayon::ThreadPool,
    simulator: Arc<PeriodSimulator>,
    predictor: PredictorConfig,
    rng: RngHierarchy,
    lock: ResourceLock,
}

impl PeriodScheduler {
    pub fn new(
        worker_count: usize,
        simulator: PeriodSimulator,
        predictor: PredictorConfig,
        seed: u64,
    ) -> Result<Self, SchedulerError> {
        // A private pool, not the global one.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count.max(1))
            .thread_name(|i| format!("pipbench-period-{i}"))
            .panic_handler(|_| error!("period worker panicked"))
            .build()?;
        Ok(Self {
            pool,
            simulator: Arc::new(simulator),
            predictor,
            rng: RngHierarchy::new(seed),
            lock: ResourceLock::new(),
        })
    }

    /// The coarse lock shared by every predictor this scheduler builds.
    pub fn lock(&self) -> &ResourceLock {
        &self.lock
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queue one period over `data[plan.start..plan.start + plan.len]`.
    pub fn submit(&self, plan: PeriodPlan, data: Arc<Vec<Frame>>) -> PeriodHandle {
        let (tx, rx) = mpsc::channel();
        let period_id = plan.period_id;
        let simulator = Arc::clone(&self.simulator);
        let predictor = self.predictor.clone();
        let ctx = PredictorContext {
            period_id,
            rng: self.rng.predictor_rng(period_id),
            lock: self.lock.clone(),
        };

        debug!(period = %period_id, start = plan.start, minutes = plan.len, "submitting period");
        self.pool.spawn(move || {
            let outcome = guarded(period_id, || {
                let frames = data.get(plan.range()).unwrap_or_default();
                run_period(&simulator, &predictor, ctx, frames)
            });
            // The handle may already be gone if the run was abandoned.
            let _ = tx.send(outcome);
        });
        PeriodHandle::new(period_id, rx)
    }

    /// Submit every plan, returning handles in plan order.
    pub fn submit_all(&self, plans: &[PeriodPlan], data: &Arc<Vec<Frame>>) -> Vec<PeriodHandle> {
        plans
            .iter()
            .map(|plan| self.submit(*plan, Arc::clone(data)))
            .collect()
    }
}

/// Run `work`, turning a panic into a failure that carries its message.
fn guarded<F>(period_id: PeriodId, work: F) -> Result<Account, PeriodFailure>
where
    F: FnOnce() -> Result<Account, PeriodFailure>,
{
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        error!(period = %period_id, %message, "period worker panicked");
        Err(PeriodFailure::Panicked { period_id, message })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_period(
    simulator: &PeriodSimulator,
    config: &PredictorConfig,
    ctx: PredictorContext,
    frames: &[Frame],
) -> Result<Account, PeriodFailure> {
    let period_id = ctx.period_id;
    let mut predictor = create_predictor(config, ctx)
        .map_err(|source| PeriodFailure::Predictor { period_id, source })?;
    Ok(simulator.run(period_id, frames, predictor.as_mut())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pipbench_core::domain::{Bar, Symbol};
    use pipbench_core::engine::SimConfig;
    use pipbench_core::symbols::SymbolGraph;

    fn sym(id: &str) -> Symbol {
        Symbol::new(id).unwrap()
    }

    fn data(minutes: usize) -> Arc<Vec<Frame>> {
        let start = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let frames = (0..minutes)
            .map(|i| {
                let t = start + Duration::minutes(i as i64);
                let close = 1.10 + (i % 7) as f64 * 0.0003;
                Frame::new(t, vec![Bar::flat(sym("EURUSD"), t, close)])
            })
            .collect();
        Arc::new(frames)
    }

    fn scheduler(workers: usize, predictor: &str) -> PeriodScheduler {
        let graph = SymbolGraph::new(&[sym("EURUSD")]).unwrap();
        let sim = PeriodSimulator::new(Arc::new(graph), vec![sym("EURUSD")], SimConfig::default()).unwrap();
        PeriodScheduler::new(workers, sim, PredictorConfig::new(predictor), 42).unwrap()
    }

    fn plans(count: usize, len: usize) -> Vec<PeriodPlan> {
        (0..count)
            .map(|i| PeriodPlan {
                period_id: PeriodId(i),
                start: i * len,
                len,
            })
            .collect()
    }

    #[test]
    fn handles_can_be_waited_in_any_order() {
        let sched = scheduler(3, "random");
        let handles = sched.submit_all(&plans(4, 20), &data(80));
        for handle in handles.iter().rev() {
            let account = handle.wait().unwrap();
            assert_eq!(account.period_id, handle.period_id());
            assert!(account.is_finalized());
        }
    }

    #[test]
    fn second_wait_returns_cached_account() {
        let sched = scheduler(1, "random");
        let handle = sched.submit(plans(1, 30)[0], data(30));
        let first = handle.wait().unwrap().clone();
        assert!(handle.is_ready());
        assert_eq!(handle.wait().unwrap(), &first);
    }

    #[test]
    fn results_do_not_depend_on_worker_count() {
        let one = scheduler(1, "random");
        let four = scheduler(4, "random");
        let frames = data(100);
        let a = one.submit_all(&plans(5, 20), &frames);
        let b = four.submit_all(&plans(5, 20), &frames);
        for (x, y) in a.iter().zip(&b) {
            let x = serde_json::to_string(x.wait().unwrap()).unwrap();
            let y = serde_json::to_string(y.wait().unwrap()).unwrap();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn simulation_errors_surface_through_the_handle() {
        let sched = scheduler(2, "random");
        let short = PeriodPlan {
            period_id: PeriodId(9),
            start: 0,
            len: 2,
        };
        let err = sched.submit(short, data(2)).wait().unwrap_err();
        match err {
            PeriodFailure::Simulation(e) => {
                assert_eq!(e.period_id, PeriodId(9));
                assert!(e.source.is_data());
            }
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[test]
    fn unknown_predictor_fails_the_period() {
        let sched = scheduler(1, "oracle");
        let err = sched.submit(plans(1, 10)[0], data(10)).wait().unwrap_err();
        assert!(matches!(err, PeriodFailure::Predictor { .. }));
    }

    #[test]
    fn panics_are_reported_with_their_message() {
        let err = guarded(PeriodId(3), || panic!("bad bar at minute {}", 7)).unwrap_err();
        assert_eq!(
            err,
            PeriodFailure::Panicked {
                period_id: PeriodId(3),
                message: "bad bar at minute 7".into()
            }
        );
        assert_eq!(err.to_string(), "period 003: worker panicked: bad bar at minute 7");

        let err = guarded(PeriodId(0), || panic!("static")).unwrap_err();
        assert!(matches!(err, PeriodFailure::Panicked { ref message, .. } if message == "static"));
    }

    #[test]
    fn plan_past_the_data_is_a_data_error() {
        let sched = scheduler(1, "random");
        let err = sched.submit(plans(1, 50)[0], data(10)).wait().unwrap_err();
        match err {
            PeriodFailure::Simulation(e) => assert!(e.source.is_data()),
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[test]
    fn ready_handles_skip_the_channel() {
        let handle = PeriodHandle::ready(PeriodId(1), Err(PeriodFailure::WorkerLost { period_id: PeriodId(1) }));
        assert!(handle.is_ready());
        assert!(handle.wait().is_err());
    }
}

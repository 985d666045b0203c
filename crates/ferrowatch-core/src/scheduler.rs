//! Cycle loop: evaluate every instrument, deliver alerts, sleep.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument as _};
use uuid::Uuid;

use crate::evaluator::{InstrumentEvaluator, InstrumentOutcome};
use crate::notifier::{DeliveryError, Notifier};
use crate::{InstrumentId, UtcDateTime};

/// Outcome of one instrument within a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentReport {
    pub instrument: InstrumentId,
    #[serde(flatten)]
    pub outcome: InstrumentOutcome,
}

/// An alert that could not be delivered.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryFailure {
    pub instrument: InstrumentId,
    pub error: String,
}

/// Summary of one evaluation cycle, in registry order.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: UtcDateTime,
    pub elapsed_ms: u64,
    pub instruments: Vec<InstrumentReport>,
    pub alerts_delivered: usize,
    pub delivery_failures: Vec<DeliveryFailure>,
}

impl CycleReport {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn count(&self, label: &str) -> usize {
        self.instruments
            .iter()
            .filter(|report| report.outcome.label() == label)
            .count()
    }
}

/// Drives evaluation cycles and alert delivery.
pub struct Scheduler {
    evaluator: InstrumentEvaluator,
    notifier: Arc<dyn Notifier>,
}

impl Scheduler {
    pub fn new(evaluator: InstrumentEvaluator, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            evaluator,
            notifier,
        }
    }

    /// Pause before the next cycle: `max(min_sleep, interval - elapsed)`.
    pub fn next_sleep(&self, elapsed: Duration) -> Duration {
        let schedule = &self.evaluator.config().schedule;
        schedule
            .interval()
            .saturating_sub(elapsed)
            .max(schedule.min_sleep())
    }

    /// Runs cycles until Ctrl-C.
    pub async fn run(&self) -> usize {
        self.run_until(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!(%error, "ctrl-c handler unavailable; running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs cycles until `shutdown` resolves; returns the number of cycles run.
    ///
    /// Shutdown is observed while sleeping, so an in-flight cycle always
    /// finishes delivering.
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut cycles = 0;

        loop {
            let report = self.run_cycle().await;
            cycles += 1;

            let pause = self.next_sleep(report.elapsed());
            info!(
                cycle_id = %report.cycle_id,
                sleep_ms = u64::try_from(pause.as_millis()).unwrap_or(u64::MAX),
                "sleeping until next cycle"
            );

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = &mut shutdown => {
                    info!(cycles, "shutdown requested");
                    return cycles;
                }
            }
        }
    }

    /// Evaluates every instrument concurrently, then delivers in registry order.
    pub async fn run_cycle(&self) -> CycleReport {
        let cycle_id = Uuid::new_v4();
        self.cycle(cycle_id)
            .instrument(info_span!("cycle", %cycle_id))
            .await
    }

    async fn cycle(&self, cycle_id: Uuid) -> CycleReport {
        let started = Instant::now();
        let started_at = UtcDateTime::now();
        let instruments = &self.evaluator.config().instruments;

        let mut tasks = JoinSet::new();
        let mut task_slots = HashMap::with_capacity(instruments.len());
        for (slot, instrument) in instruments.iter().enumerate() {
            let evaluator = self.evaluator.clone();
            let instrument = instrument.clone();
            let handle = tasks.spawn(
                async move { (slot, evaluator.evaluate(&instrument).await) }.in_current_span(),
            );
            task_slots.insert(handle.id(), slot);
        }

        let mut outcomes: Vec<Option<InstrumentOutcome>> = vec![None; instruments.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, outcome)) => outcomes[slot] = Some(outcome),
                Err(join_error) => {
                    let Some(&slot) = task_slots.get(&join_error.id()) else {
                        continue;
                    };
                    let message = if join_error.is_panic() {
                        panic_message(join_error.into_panic())
                    } else {
                        String::from("evaluation task was cancelled")
                    };
                    error!(instrument = %instruments[slot].id, %message, "instrument evaluation panicked");
                    outcomes[slot] = Some(InstrumentOutcome::Panicked { message });
                }
            }
        }

        let reports = instruments
            .iter()
            .zip(outcomes)
            .map(|(instrument, outcome)| InstrumentReport {
                instrument: instrument.id.clone(),
                outcome: outcome.unwrap_or_else(|| InstrumentOutcome::Panicked {
                    message: String::from("evaluation task produced no outcome"),
                }),
            })
            .collect::<Vec<_>>();

        let mut alerts_delivered = 0;
        let mut delivery_failures = Vec::new();
        for report in &reports {
            let Some(alert) = report.outcome.alert() else {
                continue;
            };
            match self.deliver(alert).await {
                Ok(()) => alerts_delivered += 1,
                Err(error) => {
                    warn!(instrument = %report.instrument, %error, "alert delivery failed");
                    delivery_failures.push(DeliveryFailure {
                        instrument: report.instrument.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        let report = CycleReport {
            cycle_id,
            started_at,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            instruments: reports,
            alerts_delivered,
            delivery_failures,
        };

        info!(
            instruments = report.instruments.len(),
            signals = report.count("signal"),
            unavailable = report.count("unavailable"),
            anomalies = report.count("anomaly"),
            panicked = report.count("panicked"),
            delivered = report.alerts_delivered,
            delivery_failures = report.delivery_failures.len(),
            elapsed_ms = report.elapsed_ms,
            "cycle complete"
        );
        report
    }

    async fn deliver(&self, alert: &crate::Alert) -> Result<(), DeliveryError> {
        let timeout = self.evaluator.config().schedule.call_timeout();
        match tokio::time::timeout(timeout, self.notifier.deliver(alert)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout {
                timeout_ms: timeout.as_millis(),
            }),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_owned();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    String::from("evaluation panicked")
}

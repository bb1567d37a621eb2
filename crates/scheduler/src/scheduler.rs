//! Adaptive scan loop
//!
//! One tick at a time: build a fresh context, scan, report, then sleep for
//! the interval the state machine picked. The stop signal is checked before
//! every tick and interrupts the sleep, never an in-flight scan.

use alloy_primitives::U256;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use triarb_core::{ConfigError, ConfigResult, Cycle, GasSettings, ScheduleSettings, Settings};
use triarb_detector::{ConversionRates, EvalContext, Scanner};
use triarb_quote_source::{with_timeout, QuoteSource};

use crate::{Reporter, SchedulerState, TickOutcome, Transition};

/// Scan scheduler
pub struct Scheduler {
    cycles: Vec<Cycle>,
    amounts: Vec<Decimal>,
    schedule: ScheduleSettings,
    gas: Arc<GasSettings>,
    quote_timeout: Duration,
    scanner: Scanner,
    sources: Vec<Arc<dyn QuoteSource>>,
    rates: Arc<ConversionRates>,
    reporter: Arc<dyn Reporter>,
    state: SchedulerState,
}

impl Scheduler {
    /// One quote source per configured endpoint, in rotation order
    pub fn new(
        settings: &Settings,
        sources: Vec<Arc<dyn QuoteSource>>,
        reporter: Arc<dyn Reporter>,
    ) -> ConfigResult<Self> {
        if sources.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        Ok(Self {
            cycles: settings.cycles.clone(),
            amounts: settings.amounts.clone(),
            schedule: settings.schedule.clone(),
            gas: Arc::new(settings.gas.clone()),
            quote_timeout: settings.quote_timeout,
            scanner: Scanner::from_settings(settings),
            state: SchedulerState::new(sources.len()),
            sources,
            rates: Arc::new(ConversionRates::new()),
            reporter,
        })
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn current_source(&self) -> &Arc<dyn QuoteSource> {
        &self.sources[self.state.endpoint_index]
    }

    /// Run until stopped or `max_ticks` is reached. Returns the final state.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> SchedulerState {
        info!(
            "Starting scheduler: {} cycles x {} amounts, {} endpoints, scan every {:?}",
            self.cycles.len(),
            self.amounts.len(),
            self.sources.len(),
            self.schedule.scan_interval
        );

        loop {
            if *stop.borrow() {
                info!("Stop requested");
                break;
            }
            if self.reached_max_ticks() {
                break;
            }

            let transition = self.tick().await;

            if self.reached_max_ticks() {
                break;
            }
            if wait_or_stop(transition.next_delay, &mut stop).await {
                info!("Stop requested");
                break;
            }
        }

        self.state.stop();
        info!(
            "Scheduler stopped after {} ticks ({} rotations)",
            self.state.tick, self.state.rotations
        );
        self.state
    }

    /// Run one tick against the active endpoint
    pub async fn tick(&mut self) -> Transition {
        let now = Utc::now();
        let tick = self.state.begin_tick(now);
        let source = self.current_source().clone();
        let gas_price_wei = self.gas_price(source.as_ref()).await;

        let ctx = EvalContext::new(source, self.gas.clone(), self.rates.clone())
            .with_tick(tick)
            .with_gas_price(gas_price_wei)
            .with_quote_timeout(self.quote_timeout)
            .with_timestamp(now);

        let outcome = match self.scanner.scan(&self.cycles, &self.amounts, &ctx).await {
            Ok(result) => {
                self.reporter.report_scan(&result);
                if result.has_opportunities() {
                    TickOutcome::Opportunities
                } else {
                    TickOutcome::Quiet
                }
            }
            Err(failure) => {
                warn!("Scan #{} on {} failed: {}", tick, ctx.endpoint(), failure);
                self.reporter.report_failure(tick, ctx.endpoint(), &failure);
                TickOutcome::Failed
            }
        };

        let transition = self.state.record_outcome(outcome, &self.schedule);

        if transition.rotated {
            let to = self.current_source().endpoint().to_string();
            warn!(
                "{} consecutive failed scans, rotating endpoint {} -> {}",
                self.schedule.max_consecutive_failures,
                ctx.endpoint(),
                to
            );
            self.reporter.report_rotation(ctx.endpoint(), &to);
        }

        debug!(
            "Tick #{} done, phase {:?}, next scan in {:?}",
            tick, self.state.phase, transition.next_delay
        );
        transition
    }

    /// Live gas price when enabled, else (or on failure) the static price
    async fn gas_price(&self, source: &dyn QuoteSource) -> U256 {
        let fallback = self.gas.static_gas_price_wei;
        if !self.gas.live_gas_price {
            return fallback;
        }

        match with_timeout(self.quote_timeout, source.gas_price()).await {
            Ok(price) if !price.is_zero() => price,
            Ok(_) => {
                debug!("{} reported zero gas price, using static {} wei", source.endpoint(), fallback);
                fallback
            }
            Err(e) => {
                warn!(
                    "Gas price query on {} failed: {}, using static {} wei",
                    source.endpoint(),
                    e,
                    fallback
                );
                fallback
            }
        }
    }

    fn reached_max_ticks(&self) -> bool {
        match self.schedule.max_ticks {
            Some(max) if self.state.tick >= max => {
                info!("Reached max ticks ({})", max);
                true
            }
            _ => false,
        }
    }
}

/// Sleep for `delay`; true if a stop arrived first (or the sender is gone)
async fn wait_or_stop(delay: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return true;
                }
            }
        }
    }
}

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use shared::models::{CalculateRequest, PricingQuote};

use super::inputs::PricingInputs;
use crate::{ClientResult, HttpClient};

/// Codes up to this length are still being typed; no error is shown
pub const VOUCHER_MIN_LENGTH: usize = 3;

/// Inline message for a code that produced no discount
pub const VOUCHER_REJECTED_MESSAGE: &str = "Mã chưa đủ điều kiện hoặc không tồn tại.";

/// Quote endpoint (read-only on the server)
#[async_trait]
pub trait PricingApi: Send + Sync {
    async fn calculate(&self, request: &CalculateRequest) -> ClientResult<PricingQuote>;
}

#[async_trait]
impl PricingApi for HttpClient {
    async fn calculate(&self, request: &CalculateRequest) -> ClientResult<PricingQuote> {
        HttpClient::calculate(self, request).await
    }
}

/// What the checkout screen shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteState {
    /// Latest applied quote; `None` for an empty cart
    pub quote: Option<PricingQuote>,
    /// Voucher that produced a discount on the current quote
    pub applied_voucher: Option<String>,
    pub voucher_error: Option<String>,
    pub is_calculating: bool,
    /// Last transport/backend failure; cleared by the next success
    pub last_error: Option<String>,
}

impl QuoteState {
    fn apply(&mut self, voucher: Option<&str>, quote: PricingQuote) {
        match voucher {
            Some(code) if quote.voucher_applied() => {
                self.applied_voucher = Some(code.to_string());
                self.voucher_error = None;
            }
            Some(code) => {
                self.applied_voucher = None;
                self.voucher_error = (code.chars().count() > VOUCHER_MIN_LENGTH)
                    .then(|| VOUCHER_REJECTED_MESSAGE.to_string());
            }
            None => {
                self.applied_voucher = None;
                self.voucher_error = None;
            }
        }
        self.quote = Some(quote);
        self.last_error = None;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Debounced price calculator.
///
/// Every [`update`](Self::update) restarts the quiet period; only the last
/// inputs of a burst are sent. Responses are tagged with a sequence number
/// and only the most recently issued one is applied.
pub struct PriceCalculator {
    updates: mpsc::UnboundedSender<PricingInputs>,
    state: watch::Receiver<QuoteState>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PriceCalculator {
    pub fn spawn(api: Arc<dyn PricingApi>, debounce: Duration) -> Self {
        let (updates, updates_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(QuoteState::default());
        let shutdown = CancellationToken::new();

        let worker = CalculatorWorker {
            api,
            debounce,
            state: Arc::new(state_tx),
            latest: Arc::new(AtomicU64::new(0)),
            shutdown: shutdown.clone(),
        };
        let task = tokio::spawn(worker.run(updates_rx));

        Self {
            updates,
            state,
            shutdown,
            task: Some(task),
        }
    }

    /// Schedule a recalculation for `inputs`, replacing any pending one
    pub fn update(&self, inputs: PricingInputs) {
        if self.updates.send(inputs).is_err() {
            tracing::debug!("Price calculator stopped, update ignored");
        }
    }

    pub fn state(&self) -> QuoteState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuoteState> {
        self.state.clone()
    }

    /// Voucher to submit with the order: only one that produced a discount
    pub fn applied_voucher(&self) -> Option<String> {
        self.state.borrow().applied_voucher.clone()
    }

    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!("Price calculator ended abnormally: {e}");
        }
    }
}

impl Drop for PriceCalculator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for PriceCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceCalculator")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

struct CalculatorWorker {
    api: Arc<dyn PricingApi>,
    debounce: Duration,
    state: Arc<watch::Sender<QuoteState>>,
    latest: Arc<AtomicU64>,
    shutdown: CancellationToken,
}

impl CalculatorWorker {
    async fn run(self, mut updates: mpsc::UnboundedReceiver<PricingInputs>) {
        let mut pending: Option<PricingInputs> = None;
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,

                update = updates.recv() => {
                    let Some(inputs) = update else { break };
                    pending = Some(inputs);
                    deadline = Instant::now() + self.debounce;
                }

                _ = tokio::time::sleep_until(deadline), if pending.is_some() => {
                    if let Some(inputs) = pending.take() {
                        self.issue(inputs);
                    }
                }
            }
        }
        tracing::debug!("Price calculator stopped");
    }

    fn issue(&self, inputs: PricingInputs) {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if inputs.is_empty() {
            // nothing to price; also invalidates anything in flight
            self.state.send_modify(QuoteState::clear);
            return;
        }

        self.state.send_modify(|state| {
            state.is_calculating = true;
            state.voucher_error = None;
        });

        let api = self.api.clone();
        let state = self.state.clone();
        let latest = self.latest.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let request = inputs.to_request();
            tracing::debug!(seq, items = request.items.len(), voucher = ?request.voucher_code, "Calculating price");

            let result = tokio::select! {
                _ = shutdown.cancelled() => return,
                result = api.calculate(&request) => result,
            };

            if latest.load(Ordering::SeqCst) != seq {
                tracing::debug!(seq, "Discarding stale quote");
                return;
            }
            state.send_modify(|state| {
                state.is_calculating = false;
                match result {
                    Ok(quote) => state.apply(inputs.voucher(), quote),
                    Err(e) => {
                        tracing::warn!("Price calculation failed: {e}");
                        state.last_error = Some(e.to_string());
                    }
                }
            });
        });
    }
}

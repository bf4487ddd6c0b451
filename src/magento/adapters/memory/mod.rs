//! In-memory Magento store for tests and dry runs.
//!
//! Tax-rate bulks for the `taxRates` topic are applied to the fake store when
//! they settle. How soon they settle is scripted with [`BulkBehavior`].

use crate::magento::{
    domain::{
        BulkAccepted, BulkMethod, BulkOperation, BulkOperationStatus, BulkRequest,
        BulkRequestItem, BulkSummary, MagentoRegion, MagentoTaxRate, TAX_RATE_TOPIC,
    },
    ports::{MagentoBulkSupport, MagentoError, MagentoResult, MagentoTaxRateGateway},
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// When submitted bulks settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkBehavior {
    /// Operations settle once the bulk has been polled this many times.
    /// Zero settles them on submission.
    SettleAfterPolls(u32),
    /// Operations stay open forever.
    NeverSettle,
}

impl Default for BulkBehavior {
    fn default() -> Self {
        Self::SettleAfterPolls(0)
    }
}

#[derive(Debug)]
struct PendingBulk {
    request: BulkRequest,
    polls: u32,
    operations: Vec<BulkOperation>,
}

#[derive(Debug, Default)]
struct MagentoState {
    rates: BTreeMap<u64, MagentoTaxRate>,
    next_id: u64,
    regions: HashMap<String, Vec<MagentoRegion>>,
    bulks: HashMap<String, PendingBulk>,
    submissions: Vec<BulkRequest>,
    behavior: BulkBehavior,
    failing_codes: HashSet<String>,
    submissions_allowed: Option<usize>,
}

impl MagentoState {
    fn insert_rate(&mut self, rate: &MagentoTaxRate) -> MagentoResult<MagentoTaxRate> {
        if self.rates.values().any(|existing| existing.code == rate.code) {
            return Err(MagentoError::Http {
                status: 400,
                message: format!("Code \"{}\" already exists.", rate.code),
            });
        }
        self.next_id = self.next_id.saturating_add(1);
        let created = rate.clone().with_id(Some(self.next_id));
        self.rates.insert(self.next_id, created.clone());
        Ok(created)
    }

    fn replace_rate(&mut self, rate: &MagentoTaxRate) -> MagentoResult<MagentoTaxRate> {
        let id = rate
            .id
            .ok_or_else(|| MagentoError::Http {
                status: 400,
                message: "\"id\" is required for updates.".to_owned(),
            })?;
        let Some(slot) = self.rates.get_mut(&id) else {
            return Err(MagentoError::NotFound(format!("taxRates/{id}")));
        };
        *slot = rate.clone();
        Ok(rate.clone())
    }

    fn apply_operation(&mut self, method: BulkMethod, payload: &Value) -> Result<(), String> {
        let envelope = payload.get("taxRate").cloned().unwrap_or(Value::Null);
        let rate: MagentoTaxRate =
            serde_json::from_value(envelope).map_err(|err| err.to_string())?;
        if self.failing_codes.contains(&rate.code) {
            return Err(format!("Tax rate \"{}\" was refused.", rate.code));
        }
        let outcome = match method {
            BulkMethod::Post => self.insert_rate(&rate).map(drop),
            BulkMethod::Put => self.replace_rate(&rate).map(drop),
            BulkMethod::Delete => rate
                .id
                .and_then(|id| self.rates.remove(&id))
                .map(drop)
                .ok_or_else(|| MagentoError::NotFound(rate.code.clone())),
        };
        outcome.map_err(|err| err.to_string())
    }

    fn settle(&mut self, bulk_uuid: &str) {
        let Some(mut bulk) = self.bulks.remove(bulk_uuid) else {
            return;
        };
        let mut operations = Vec::with_capacity(bulk.request.payloads.len());
        for (position, payload) in bulk.request.payloads.iter().enumerate() {
            let outcome = if bulk.request.topic == TAX_RATE_TOPIC {
                self.apply_operation(bulk.request.method, payload)
            } else {
                Ok(())
            };
            operations.push(settled_operation(position, outcome));
        }
        bulk.operations = operations;
        self.bulks.insert(bulk_uuid.to_owned(), bulk);
    }
}

fn settled_operation(position: usize, outcome: Result<(), String>) -> BulkOperation {
    let id = u64::try_from(position).unwrap_or(u64::MAX);
    match outcome {
        Ok(()) => BulkOperation {
            id,
            status: BulkOperationStatus::Complete,
            result_message: None,
            error_code: None,
        },
        Err(message) => BulkOperation {
            id,
            status: BulkOperationStatus::NotRetriablyFailed,
            result_message: Some(message),
            error_code: Some(0),
        },
    }
}

fn open_operations(count: usize) -> Vec<BulkOperation> {
    (0..count)
        .map(|position| BulkOperation {
            id: u64::try_from(position).unwrap_or(u64::MAX),
            status: BulkOperationStatus::Open,
            result_message: None,
            error_code: None,
        })
        .collect()
}

/// Fake Magento implementing both tax-rate and bulk ports.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMagento {
    state: Arc<Mutex<MagentoState>>,
}

impl InMemoryMagento {
    /// Creates an empty store whose bulks settle on submission.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MagentoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Changes how open bulks settle from now on.
    pub fn set_bulk_behavior(&self, behavior: BulkBehavior) {
        self.lock().behavior = behavior;
    }

    /// Makes bulk operations for the given rate code fail.
    pub fn fail_operations_for(&self, code: impl Into<String>) {
        self.lock().failing_codes.insert(code.into());
    }

    /// Makes every subsequent bulk submission fail with HTTP 400.
    pub fn reject_submissions(&self, reject: bool) {
        self.lock().submissions_allowed = reject.then_some(0);
    }

    /// Accepts `count` more bulk submissions, then refuses the rest.
    pub fn reject_submissions_after(&self, count: usize) {
        self.lock().submissions_allowed = Some(count);
    }

    /// Registers the directory regions of a country.
    pub fn add_regions(&self, country: &str, regions: Vec<MagentoRegion>) {
        self.lock().regions.insert(country.to_owned(), regions);
    }

    /// Stores a rate directly, assigning an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::Http`] when the code is already taken.
    pub fn seed_rate(&self, rate: &MagentoTaxRate) -> MagentoResult<MagentoTaxRate> {
        self.lock().insert_rate(rate)
    }

    /// Returns every stored rate ordered by identifier.
    #[must_use]
    pub fn rates(&self) -> Vec<MagentoTaxRate> {
        self.lock().rates.values().cloned().collect()
    }

    /// Returns every bulk request submitted so far.
    #[must_use]
    pub fn submissions(&self) -> Vec<BulkRequest> {
        self.lock().submissions.clone()
    }
}

#[async_trait]
impl MagentoTaxRateGateway for InMemoryMagento {
    async fn list_tax_rates(&self) -> MagentoResult<Vec<MagentoTaxRate>> {
        Ok(self.rates())
    }

    async fn create_tax_rate(&self, rate: &MagentoTaxRate) -> MagentoResult<MagentoTaxRate> {
        self.lock().insert_rate(rate)
    }

    async fn update_tax_rate(&self, rate: &MagentoTaxRate) -> MagentoResult<MagentoTaxRate> {
        self.lock().replace_rate(rate)
    }

    async fn delete_tax_rate(&self, id: u64) -> MagentoResult<()> {
        self.lock()
            .rates
            .remove(&id)
            .map(drop)
            .ok_or_else(|| MagentoError::NotFound(format!("taxRates/{id}")))
    }

    async fn list_regions(&self, country: &str) -> MagentoResult<Vec<MagentoRegion>> {
        self.lock()
            .regions
            .get(country)
            .cloned()
            .ok_or_else(|| MagentoError::NotFound(country.to_owned()))
    }
}

#[async_trait]
impl MagentoBulkSupport for InMemoryMagento {
    async fn submit_bulk(&self, request: &BulkRequest) -> MagentoResult<BulkAccepted> {
        let mut state = self.lock();
        match state.submissions_allowed {
            Some(0) => {
                return Err(MagentoError::Http {
                    status: 400,
                    message: "Bulk submission refused.".to_owned(),
                });
            }
            Some(remaining) => state.submissions_allowed = Some(remaining.saturating_sub(1)),
            None => {}
        }
        let bulk_uuid = Uuid::new_v4().to_string();
        state.submissions.push(request.clone());
        state.bulks.insert(
            bulk_uuid.clone(),
            PendingBulk {
                request: request.clone(),
                polls: 0,
                operations: open_operations(request.payloads.len()),
            },
        );
        if state.behavior == BulkBehavior::SettleAfterPolls(0) {
            state.settle(&bulk_uuid);
        }
        let request_items = (0..request.payloads.len())
            .map(|position| BulkRequestItem {
                id: u64::try_from(position).unwrap_or(u64::MAX),
                data_hash: None,
                status: "accepted".to_owned(),
            })
            .collect();
        Ok(BulkAccepted {
            bulk_uuid,
            request_items,
            errors: false,
        })
    }

    async fn bulk_status(&self, bulk_uuid: &str) -> MagentoResult<BulkSummary> {
        let mut state = self.lock();
        let behavior = state.behavior;
        let polls = {
            let bulk = state
                .bulks
                .get_mut(bulk_uuid)
                .ok_or_else(|| MagentoError::NotFound(bulk_uuid.to_owned()))?;
            bulk.polls = bulk.polls.saturating_add(1);
            bulk.polls
        };
        if let BulkBehavior::SettleAfterPolls(threshold) = behavior {
            let still_open = state.bulks.get(bulk_uuid).is_some_and(|bulk| {
                bulk.operations
                    .iter()
                    .any(|operation| operation.status == BulkOperationStatus::Open)
            });
            if still_open && polls >= threshold {
                state.settle(bulk_uuid);
            }
        }
        let operations = state
            .bulks
            .get(bulk_uuid)
            .map(|bulk| bulk.operations.clone())
            .unwrap_or_default();
        Ok(BulkSummary {
            bulk_uuid: bulk_uuid.to_owned(),
            operations,
        })
    }
}

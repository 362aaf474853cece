//! Service layer API for draft persistence and sale submission
use super::config::{Config, IdConfig};
use super::error::{StoreError, ValidationError};
use super::sale::{SaleDraft, SalePayload};
use super::utils::new_uuid_to_bech32;
use sled::Transactional;
use sled::transaction::ConflictableTransactionError;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: String,
    pub payload_hash: String, // sha256 of the stored cbor payload
}

/// Drafts and submitted orders live in separate trees of one database.
pub struct SaleService {
    drafts: sled::Tree,
    orders: sled::Tree,
    ids: IdConfig,
}

impl SaleService {
    pub fn new(instance: Arc<sled::Db>) -> anyhow::Result<Self> {
        Self::with_ids(instance, IdConfig::default())
    }

    pub fn with_ids(instance: Arc<sled::Db>, ids: IdConfig) -> anyhow::Result<Self> {
        Ok(Self {
            drafts: instance.open_tree("drafts")?,
            orders: instance.open_tree("orders")?,
            ids,
        })
    }

    /// Open the database named in `config`
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let db = sled::open(&config.database.path)?;
        info!(path = %config.database.path, "opened sales database");
        Self::with_ids(Arc::new(db), config.ids.clone())
    }

    /// Store a fresh empty draft and hand back its id
    pub fn start_draft(&self) -> anyhow::Result<String> {
        let draft_id = new_uuid_to_bech32(&self.ids.draft_prefix)?;
        self.save_draft(&draft_id, &SaleDraft::new())?;
        info!(%draft_id, "started draft");
        Ok(draft_id)
    }

    pub fn save_draft(&self, draft_id: &str, draft: &SaleDraft) -> anyhow::Result<()> {
        self.drafts
            .insert(draft_id.as_bytes(), minicbor::to_vec(draft)?)?;
        Ok(())
    }

    pub fn load_draft(&self, draft_id: &str) -> anyhow::Result<SaleDraft> {
        let bytes = self
            .drafts
            .get(draft_id.as_bytes())?
            .ok_or_else(|| StoreError::DraftNotFound(draft_id.to_string()))?;
        let draft: SaleDraft = minicbor::decode(&bytes)?;
        Ok(draft)
    }

    /// Drop an abandoned draft
    pub fn discard_draft(&self, draft_id: &str) -> anyhow::Result<()> {
        self.drafts
            .remove(draft_id.as_bytes())?
            .ok_or_else(|| StoreError::DraftNotFound(draft_id.to_string()))?;
        info!(%draft_id, "discarded draft");
        Ok(())
    }

    /// Finalise `draft` into an order, remove the stored draft and reset the in-memory one.
    ///
    /// On a validation failure nothing is written and the draft is left untouched.
    pub fn submit_draft(
        &self,
        draft_id: &str,
        draft: &mut SaleDraft,
    ) -> anyhow::Result<OrderReceipt> {
        let (payload_hash, payload_cbor) = draft
            .validate_and_finalise(draft_id)
            .inspect_err(|e| warn!(%draft_id, error = %e, "rejected draft submission"))?;

        let order_id = new_uuid_to_bech32(&self.ids.order_prefix)?;

        // order payload in, draft out, in one transaction across both trees
        let payload = sled::IVec::from(payload_cbor);
        (&self.drafts, &self.orders)
            .transaction(|(drafts, orders)| {
                orders.insert(order_id.as_bytes(), payload.clone())?;
                drafts.remove(draft_id.as_bytes())?;
                Ok::<(), ConflictableTransactionError>(())
            })
            .map_err(|e| anyhow::anyhow!("failed to move draft {draft_id} into orders: {e:?}"))?;

        draft.reset();
        info!(%draft_id, %order_id, "submitted sale");

        Ok(OrderReceipt {
            order_id,
            payload_hash,
        })
    }

    pub fn load_order(&self, order_id: &str) -> anyhow::Result<SalePayload> {
        let bytes = self.order_bytes(order_id)?;
        let payload: SalePayload = minicbor::decode(&bytes)?;
        Ok(payload)
    }

    /// Load the order and check its stored contents still hash to the receipt's hash
    pub fn verify_order(&self, receipt: &OrderReceipt) -> anyhow::Result<SalePayload> {
        let bytes = self.order_bytes(&receipt.order_id)?;
        if sha256::digest(&bytes[..]) != receipt.payload_hash {
            return Err(ValidationError::HashMismatch(receipt.payload_hash.clone()).into());
        }
        let payload: SalePayload = minicbor::decode(&bytes)?;
        Ok(payload)
    }

    fn order_bytes(&self, order_id: &str) -> anyhow::Result<sled::IVec> {
        let bytes = self
            .orders
            .get(order_id.as_bytes())?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))?;
        Ok(bytes)
    }
}

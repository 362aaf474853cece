//! Sale draft aggregate: catalog buffer, per-product registries and the sale-item assembler
use super::error::{StoreError, ValidationError};
use super::types::{
    CostMap, Customer, DeviceAssignment, GuarantorDetails, IdentificationDetails,
    MiscellaneousCosts, MiscellaneousPrice, NextOfKinDetails, Parameters, PaymentMode, Product,
    SaleItem, SaleRecipient, TimeStamp,
};
use chrono::Utc;
use tracing::debug;

/// All state accumulated for one in-progress sale.
///
/// A draft is owned by whoever drives the wizard session and is reset with
/// [`SaleDraft::reset`] once the sale is submitted or abandoned.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq)]
pub struct SaleDraft {
    #[n(0)]
    products: Vec<Product>,
    #[n(1)]
    parameters: Vec<Parameters>, // append-only, first match wins on lookup
    #[n(2)]
    miscellaneous_prices: Vec<MiscellaneousPrice>,
    #[n(3)]
    devices: Vec<DeviceAssignment>,
    #[n(4)]
    sale_items: Vec<SaleItem>,
    #[n(5)]
    customer: Option<Customer>,
    #[n(6)]
    identification_details: IdentificationDetails,
    #[n(7)]
    next_of_kin_details: NextOfKinDetails,
    #[n(8)]
    guarantor_details: GuarantorDetails,
}

/// Everything handed to order creation when a draft is submitted.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct SalePayload {
    #[n(0)]
    pub draft_id: String,
    #[n(1)]
    pub submitted_at: TimeStamp<Utc>,
    #[n(2)]
    pub customer: Customer,
    #[n(3)]
    pub identification_details: IdentificationDetails,
    #[n(4)]
    pub next_of_kin_details: NextOfKinDetails,
    #[n(5)]
    pub guarantor_details: GuarantorDetails,
    #[n(6)]
    pub products: Vec<Product>,
    #[n(7)]
    pub parameters: Vec<Parameters>,
    #[n(8)]
    pub miscellaneous_prices: Vec<MiscellaneousPrice>,
    #[n(9)]
    pub devices: Vec<DeviceAssignment>,
    #[n(10)]
    pub sale_items: Vec<SaleItem>,
}

impl SaleDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every registry, the sale items and all party records.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // CATALOG BUFFER

    /// Appends `product`, or overwrites the stored record with the same id in place.
    pub fn add_product(&mut self, product: Product) {
        match self
            .products
            .iter_mut()
            .find(|p| p.product_id == product.product_id)
        {
            Some(existing) => {
                debug!(product_id = %product.product_id, "overwriting staged product");
                *existing = product;
            }
            None => {
                debug!(product_id = %product.product_id, "staging product");
                self.products.push(product);
            }
        }
    }
    pub fn remove_product(&mut self, product_id: &str) -> Option<Product> {
        let index = self
            .products
            .iter()
            .position(|p| p.product_id == product_id)?;
        Some(self.products.remove(index))
    }
    pub fn current_product_units(&self, product_id: &str) -> Option<u32> {
        self.product(product_id).map(|p| p.product_units)
    }
    pub fn empty_products(&mut self) {
        self.products.clear();
    }
    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id == product_id)
    }
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    // PER-PRODUCT REGISTRIES

    /// Always appends. Repeated calls for one product accumulate records and
    /// only the first is ever read back.
    pub fn add_parameters(&mut self, params: Parameters) {
        debug!(product_id = %params.current_product_id, mode = ?params.payment_mode, "adding parameters");
        self.parameters.push(params);
    }
    pub fn remove_parameter(&mut self, product_id: &str) -> Option<Parameters> {
        let index = self
            .parameters
            .iter()
            .position(|p| p.current_product_id == product_id)?;
        Some(self.parameters.remove(index))
    }
    pub fn parameters_for(&self, product_id: &str) -> Option<&Parameters> {
        self.parameters
            .iter()
            .find(|p| p.current_product_id == product_id)
    }

    /// Upserts each key of `costs` into the product's cost map, keeping unrelated keys.
    pub fn add_or_update_miscellaneous_price(&mut self, product_id: &str, costs: CostMap) {
        match self
            .miscellaneous_prices
            .iter_mut()
            .find(|m| m.current_product_id == product_id)
        {
            Some(existing) => existing.costs.extend(costs),
            None => self.miscellaneous_prices.push(MiscellaneousPrice {
                current_product_id: product_id.to_string(),
                costs,
            }),
        }
    }
    pub fn remove_miscellaneous_price(&mut self, product_id: &str) -> Option<MiscellaneousPrice> {
        let index = self
            .miscellaneous_prices
            .iter()
            .position(|m| m.current_product_id == product_id)?;
        Some(self.miscellaneous_prices.remove(index))
    }
    pub fn miscellaneous_price_for(&self, product_id: &str) -> Option<&CostMap> {
        self.miscellaneous_prices
            .iter()
            .find(|m| m.current_product_id == product_id)
            .map(|m| &m.costs)
    }

    /// Replaces the product's whole device list; devices are assigned as one batch.
    pub fn add_or_update_devices(&mut self, product_id: &str, devices: Vec<String>) {
        match self
            .devices
            .iter_mut()
            .find(|d| d.current_product_id == product_id)
        {
            Some(existing) => existing.devices = devices,
            None => self.devices.push(DeviceAssignment {
                current_product_id: product_id.to_string(),
                devices,
            }),
        }
    }
    pub fn remove_devices(&mut self, product_id: &str) -> Option<DeviceAssignment> {
        let index = self
            .devices
            .iter()
            .position(|d| d.current_product_id == product_id)?;
        Some(self.devices.remove(index))
    }
    pub fn devices_for(&self, product_id: &str) -> Option<&[String]> {
        self.devices
            .iter()
            .find(|d| d.current_product_id == product_id)
            .map(|d| d.devices.as_slice())
    }

    // SALE ITEMS

    /// Joins the staged product with its registries into a new sale item.
    ///
    /// Quantity is the product's `product_units`. Missing discount and
    /// installment values become `0`, a missing device list becomes empty.
    /// The miscellaneous costs are folded across *every* product's cost map
    /// in registry order, so a cost name shared by two products resolves to
    /// the later record. Merging into an existing record keeps that record's
    /// position, so a later merge into an earlier product does not win over
    /// a product added after it. No uniqueness check: assembling twice
    /// appends twice.
    pub fn add_sale_item(&mut self, product_id: &str) -> Result<&SaleItem, StoreError> {
        let product = self
            .product(product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.to_string()))?;
        let params = self
            .parameters_for(product_id)
            .ok_or_else(|| StoreError::ParametersNotConfigured(product_id.to_string()))?;
        let devices = self
            .devices_for(product_id)
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        let costs = self
            .miscellaneous_prices
            .iter()
            .fold(CostMap::new(), |mut acc, entry| {
                acc.extend(entry.costs.iter().map(|(k, v)| (k.clone(), *v)));
                acc
            });

        let item = SaleItem {
            product_id: product.product_id.clone(),
            quantity: product.product_units,
            payment_mode: params.payment_mode,
            discount: params.discount.unwrap_or(0.0),
            installment_duration: params.installment_duration.unwrap_or(0),
            installment_starting_price: params.installment_starting_price.unwrap_or(0.0),
            devices,
            miscellaneous_prices: MiscellaneousCosts { costs },
            sale_recipient: SaleRecipient::default(),
        };

        debug!(product_id, quantity = item.quantity, "assembled sale item");

        let index = self.sale_items.len();
        self.sale_items.push(item);
        Ok(&self.sale_items[index])
    }
    /// Removes every sale item for `product_id`, returning how many were dropped.
    pub fn remove_sale_item(&mut self, product_id: &str) -> usize {
        let before = self.sale_items.len();
        self.sale_items.retain(|item| item.product_id != product_id);
        before - self.sale_items.len()
    }
    pub fn clear_sale_items(&mut self) {
        self.sale_items.clear();
    }
    pub fn sale_items(&self) -> &[SaleItem] {
        &self.sale_items
    }

    // PARTIES

    pub fn add_customer(&mut self, customer: Customer) {
        self.customer = Some(customer);
    }
    pub fn remove_customer(&mut self) -> Option<Customer> {
        self.customer.take()
    }
    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }
    pub fn add_identification_details(&mut self, details: IdentificationDetails) {
        self.identification_details = details;
    }
    pub fn remove_identification_details(&mut self) {
        self.identification_details = IdentificationDetails::default();
    }
    pub fn identification_details(&self) -> &IdentificationDetails {
        &self.identification_details
    }
    pub fn add_next_of_kin_details(&mut self, details: NextOfKinDetails) {
        self.next_of_kin_details = details;
    }
    pub fn remove_next_of_kin_details(&mut self) {
        self.next_of_kin_details = NextOfKinDetails::default();
    }
    pub fn next_of_kin_details(&self) -> &NextOfKinDetails {
        &self.next_of_kin_details
    }
    pub fn add_guarantor_details(&mut self, details: GuarantorDetails) {
        self.guarantor_details = details;
    }
    pub fn remove_guarantor_details(&mut self) {
        self.guarantor_details = GuarantorDetails::default();
    }
    pub fn guarantor_details(&self) -> &GuarantorDetails {
        &self.guarantor_details
    }

    // SUBMISSION

    /// Checks the draft is submittable and snapshots it into a payload.
    pub fn payload(&self, draft_id: &str) -> Result<SalePayload, ValidationError> {
        let customer = self
            .customer
            .clone()
            .ok_or(ValidationError::MissingCustomer)?;

        if self.sale_items.is_empty() {
            return Err(ValidationError::NoSaleItems);
        }
        if let Some(item) = self.sale_items.iter().find(|item| {
            item.payment_mode == PaymentMode::Installment && item.installment_duration == 0
        }) {
            return Err(ValidationError::MissingInstallmentDuration(
                item.product_id.clone(),
            ));
        }

        Ok(SalePayload {
            draft_id: draft_id.to_string(),
            submitted_at: TimeStamp::new(),
            customer,
            identification_details: self.identification_details.clone(),
            next_of_kin_details: self.next_of_kin_details.clone(),
            guarantor_details: self.guarantor_details.clone(),
            products: self.products.clone(),
            parameters: self.parameters.clone(),
            miscellaneous_prices: self.miscellaneous_prices.clone(),
            devices: self.devices.clone(),
            sale_items: self.sale_items.clone(),
        })
    }

    // Validates, then returns a hash of the payload and its contents serialised into cbor
    pub fn validate_and_finalise(&self, draft_id: &str) -> anyhow::Result<(String, Vec<u8>)> {
        let payload = self.payload(draft_id)?;

        let contents = minicbor::to_vec(&payload)?;
        let hash = sha256::digest(&contents);

        Ok((hash, contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, units: u32) -> Product {
        Product {
            product_id: id.into(),
            product_name: format!("{id} solar kit"),
            product_units: units,
            product_price: "1500.00".into(),
            ..Default::default()
        }
    }

    fn costs(entries: &[(&str, f64)]) -> CostMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn re_adding_product_overwrites_in_place() {
        let mut draft = SaleDraft::new();
        draft.add_product(product("P1", 5));
        draft.add_product(product("P2", 1));
        draft.add_product(product("P1", 9));

        assert_eq!(draft.products().len(), 2);
        assert_eq!(draft.products()[0].product_id, "P1");
        assert_eq!(draft.current_product_units("P1"), Some(9));
    }

    #[test]
    fn remove_product_reports_absence() {
        let mut draft = SaleDraft::new();
        draft.add_product(product("P1", 5));

        assert!(draft.remove_product("P2").is_none());
        assert_eq!(draft.remove_product("P1").map(|p| p.product_units), Some(5));
        assert_eq!(draft.current_product_units("P1"), None);
    }

    #[test]
    fn parameters_accumulate_and_first_wins() {
        let mut draft = SaleDraft::new();
        draft.add_parameters(Parameters::new("P1", PaymentMode::OneOff));
        draft.add_parameters(Parameters::new("P1", PaymentMode::Installment));

        assert_eq!(
            draft.parameters_for("P1").map(|p| p.payment_mode),
            Some(PaymentMode::OneOff)
        );

        draft.remove_parameter("P1");
        assert_eq!(
            draft.parameters_for("P1").map(|p| p.payment_mode),
            Some(PaymentMode::Installment)
        );
    }

    #[test]
    fn costs_merge_per_key() {
        let mut draft = SaleDraft::new();
        draft.add_or_update_miscellaneous_price("P1", costs(&[("a", 1.0)]));
        draft.add_or_update_miscellaneous_price("P1", costs(&[("b", 2.0), ("a", 3.0)]));

        assert_eq!(
            draft.miscellaneous_price_for("P1"),
            Some(&costs(&[("a", 3.0), ("b", 2.0)]))
        );
    }

    #[test]
    fn devices_replace_wholesale() {
        let mut draft = SaleDraft::new();
        draft.add_or_update_devices("P1", vec!["d1".into()]);
        draft.add_or_update_devices("P1", vec!["d2".into(), "d3".into()]);

        assert_eq!(
            draft.devices_for("P1"),
            Some(&["d2".to_string(), "d3".to_string()][..])
        );
        assert!(draft.remove_devices("P1").is_some());
        assert_eq!(draft.devices_for("P1"), None);
    }

    #[test]
    fn sale_item_requires_product_then_parameters() {
        let mut draft = SaleDraft::new();

        assert_eq!(
            draft.add_sale_item("P1").unwrap_err(),
            StoreError::ProductNotFound("P1".into())
        );

        draft.add_product(product("P1", 5));
        assert_eq!(
            draft.add_sale_item("P1").unwrap_err(),
            StoreError::ParametersNotConfigured("P1".into())
        );
        assert!(draft.sale_items().is_empty());
    }

    #[test]
    fn sale_item_defaults() {
        let mut draft = SaleDraft::new();
        draft.add_product(product("P1", 5));
        draft.add_parameters(Parameters::new("P1", PaymentMode::OneOff));

        let item = draft.add_sale_item("P1").unwrap().clone();

        assert_eq!(item.quantity, 5);
        assert_eq!(item.discount, 0.0);
        assert_eq!(item.installment_duration, 0);
        assert_eq!(item.installment_starting_price, 0.0);
        assert!(item.devices.is_empty());
        assert!(item.miscellaneous_prices.costs.is_empty());
        assert_eq!(item.sale_recipient, SaleRecipient::default());
    }

    #[test]
    fn remove_sale_item_drops_duplicates() {
        let mut draft = SaleDraft::new();
        draft.add_product(product("P1", 5));
        draft.add_product(product("P2", 2));
        draft.add_parameters(Parameters::new("P1", PaymentMode::OneOff));
        draft.add_parameters(Parameters::new("P2", PaymentMode::OneOff));
        draft.add_sale_item("P1").unwrap();
        draft.add_sale_item("P1").unwrap();
        draft.add_sale_item("P2").unwrap();

        assert_eq!(draft.remove_sale_item("P1"), 2);
        assert_eq!(draft.sale_items().len(), 1);

        draft.clear_sale_items();
        assert!(draft.sale_items().is_empty());
    }

    #[test]
    fn party_records_reset_to_sentinel() {
        let mut draft = SaleDraft::new();
        draft.add_customer(Customer {
            customer_id: "C1".into(),
            ..Default::default()
        });
        draft.add_guarantor_details(GuarantorDetails {
            full_name: "Musa Bello".into(),
            ..Default::default()
        });

        assert!(!draft.guarantor_details().is_empty());
        draft.remove_guarantor_details();
        assert!(draft.guarantor_details().is_empty());

        assert!(draft.remove_customer().is_some());
        assert!(draft.customer().is_none());
        draft.add_identification_details(IdentificationDetails {
            id_number: "A0012345".into(),
            ..Default::default()
        });
        draft.add_next_of_kin_details(NextOfKinDetails {
            full_name: "Ada Obi".into(),
            ..Default::default()
        });
        assert!(!draft.identification_details().is_empty());
        assert!(!draft.next_of_kin_details().is_empty());

        draft.remove_identification_details();
        draft.remove_next_of_kin_details();
        assert!(draft.identification_details().is_empty());
        assert!(draft.next_of_kin_details().is_empty());
    }

    #[test]
    fn payload_requires_customer_and_items() {
        let mut draft = SaleDraft::new();
        assert_eq!(
            draft.payload("draft_x").unwrap_err(),
            ValidationError::MissingCustomer
        );

        draft.add_customer(Customer::default());
        assert_eq!(
            draft.payload("draft_x").unwrap_err(),
            ValidationError::NoSaleItems
        );

        draft.add_product(product("P1", 1));
        draft.add_parameters(Parameters::new("P1", PaymentMode::Installment));
        draft.add_sale_item("P1").unwrap();
        assert_eq!(
            draft.payload("draft_x").unwrap_err(),
            ValidationError::MissingInstallmentDuration("P1".into())
        );
    }

    #[test]
    fn finalised_payload_decodes() {
        let mut draft = SaleDraft::new();
        draft.add_customer(Customer::default());
        draft.add_product(product("P1", 3));
        draft.add_parameters(Parameters::new("P1", PaymentMode::OneOff).with_discount(10.0));
        draft.add_sale_item("P1").unwrap();

        let (hash, contents) = draft.validate_and_finalise("draft_x").unwrap();
        let payload: SalePayload = minicbor::decode(&contents).unwrap();

        assert_eq!(hash, sha256::digest(&contents));
        assert_eq!(payload.draft_id, "draft_x");
        assert_eq!(payload.sale_items, draft.sale_items());
    }

    #[test]
    fn reset_clears_everything() {
        let mut draft = SaleDraft::new();
        draft.add_product(product("P1", 3));
        draft.add_customer(Customer::default());
        draft.add_or_update_devices("P1", vec!["d1".into()]);

        draft.reset();
        assert_eq!(draft, SaleDraft::default());
    }
}

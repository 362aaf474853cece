//! Records staged on a sale draft
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;

/// Named extra charges, e.g. `"delivery fee" -> 25.0`
pub type CostMap = BTreeMap<String, f64>;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum PaymentMode {
    #[n(0)]
    OneOff,
    #[n(1)]
    Installment,
}

/// A catalog item staged for sale. Unique by `product_id` within a buffer.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, Eq, PartialEq)]
pub struct Product {
    #[n(0)]
    pub product_id: String,
    #[n(1)]
    pub product_name: String,
    #[n(2)]
    pub product_units: u32,
    #[n(3)]
    pub product_price: String, // kept as entered, e.g. "1500.00"
    #[n(4)]
    pub product_image: String,
    #[n(5)]
    pub product_tag: String,
}

/// Payment configuration for one product line.
///
/// The installment fields only carry meaning under [`PaymentMode::Installment`];
/// nothing here enforces that.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Parameters {
    #[n(0)]
    pub current_product_id: String,
    #[n(1)]
    pub payment_mode: PaymentMode,
    #[n(2)]
    pub installment_duration: Option<u32>,
    #[n(3)]
    pub installment_starting_price: Option<f64>,
    #[n(4)]
    pub address: String,
    #[n(5)]
    pub discount: Option<f64>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct MiscellaneousPrice {
    #[n(0)]
    pub current_product_id: String,
    #[n(1)]
    pub costs: CostMap,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Eq, PartialEq)]
pub struct DeviceAssignment {
    #[n(0)]
    pub current_product_id: String,
    #[n(1)]
    pub devices: Vec<String>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq)]
pub struct MiscellaneousCosts {
    #[n(0)]
    pub costs: CostMap,
}

/// Filled in by a later flow; always empty when a sale item is assembled.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, Eq, PartialEq)]
pub struct SaleRecipient {
    #[n(0)]
    pub firstname: String,
    #[n(1)]
    pub lastname: String,
    #[n(2)]
    pub address: String,
    #[n(3)]
    pub phone: String,
    #[n(4)]
    pub email: String,
}

/// One finalised product line. Only produced by the draft's assembler.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct SaleItem {
    #[n(0)]
    pub product_id: String,
    #[n(1)]
    pub quantity: u32,
    #[n(2)]
    pub payment_mode: PaymentMode,
    #[n(3)]
    pub discount: f64,
    #[n(4)]
    pub installment_duration: u32,
    #[n(5)]
    pub installment_starting_price: f64,
    #[n(6)]
    pub devices: Vec<String>,
    #[n(7)]
    pub miscellaneous_prices: MiscellaneousCosts,
    #[n(8)]
    pub sale_recipient: SaleRecipient,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, Eq, PartialEq)]
pub struct Customer {
    #[n(0)]
    pub customer_id: String,
    #[n(1)]
    pub firstname: String,
    #[n(2)]
    pub lastname: String,
    #[n(3)]
    pub email: String,
    #[n(4)]
    pub phone: String,
    #[n(5)]
    pub address: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, Eq, PartialEq)]
pub struct IdentificationDetails {
    #[n(0)]
    pub customer_id: String,
    #[n(1)]
    pub type_of_id: String,
    #[n(2)]
    pub id_number: String,
    #[n(3)]
    pub issuing_country: String,
    #[n(4)]
    pub issue_date: String,
    #[n(5)]
    pub expiration_date: String,
    #[n(6)]
    pub full_names_on_id: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, Eq, PartialEq)]
pub struct NextOfKinDetails {
    #[n(0)]
    pub customer_id: String,
    #[n(1)]
    pub full_name: String,
    #[n(2)]
    pub relationship: String,
    #[n(3)]
    pub phone_number: String,
    #[n(4)]
    pub home_address: String,
    #[n(5)]
    pub email: String,
    #[n(6)]
    pub date_of_birth: String,
    #[n(7)]
    pub nationality: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, Eq, PartialEq)]
pub struct GuarantorDetails {
    #[n(0)]
    pub customer_id: String,
    #[n(1)]
    pub full_name: String,
    #[n(2)]
    pub phone_number: String,
    #[n(3)]
    pub email: String,
    #[n(4)]
    pub home_address: String,
    #[n(5)]
    pub identification_type: String,
    #[n(6)]
    pub identification_number: String,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

impl Parameters {
    pub fn new(current_product_id: &str, payment_mode: PaymentMode) -> Self {
        Self {
            current_product_id: current_product_id.to_string(),
            payment_mode,
            installment_duration: None,
            installment_starting_price: None,
            address: String::new(),
            discount: None,
        }
    }
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = Some(discount);
        self
    }
    pub fn with_installment(mut self, duration: u32, starting_price: f64) -> Self {
        self.installment_duration = Some(duration);
        self.installment_starting_price = Some(starting_price);
        self
    }
    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }
}

macro_rules! sentinel_record {
    ($($ty:ty),+) => {
        $(
            impl $ty {
                /// True for the all-empty record that stands in for "not provided".
                pub fn is_empty(&self) -> bool {
                    *self == Self::default()
                }
            }
        )+
    };
}

sentinel_record!(IdentificationDetails, NextOfKinDetails, GuarantorDetails);

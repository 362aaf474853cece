#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Product `{0}` is not in the catalog")]
    ProductNotFound(String),
    #[error("Product `{0}` has no payment parameters configured")]
    ParametersNotConfigured(String),
    #[error("No stored draft with id `{0}`")]
    DraftNotFound(String),
    #[error("No submitted order with id `{0}`")]
    OrderNotFound(String),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Sale has no customer attached")]
    MissingCustomer,
    #[error("Sale has no sale items")]
    NoSaleItems,
    #[error("Installment sale item `{0}` has no installment duration")]
    MissingInstallmentDuration(String),
    #[error("Stored order payload does not match hash `{0}`")]
    HashMismatch(String),
}

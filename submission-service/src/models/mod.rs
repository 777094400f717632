//! Domain models for submission-service.

mod environment;
mod invoice;
mod invoice_item;
mod outcome;
mod seller;

pub use environment::{Environment, UnknownEnvironment};
pub use invoice::{Invoice, InvoiceStatus, NewInvoice};
pub use invoice_item::{InvoiceItem, NewInvoiceItem};
pub use outcome::{
    Classification, ItemError, SubmissionOutcome, ERROR_CODE_LOCAL,
    ERROR_CODE_MALFORMED_RESPONSE, ERROR_CODE_MISSING_INVOICE_NUMBER, ERROR_CODE_PERSISTENCE,
    ERROR_CODE_TRANSPORT, STATUS_CODE_ERROR, STATUS_CODE_INVALID, STATUS_CODE_VALID,
};
pub use seller::Seller;

//! Rule-based field extractors for Finnish service receipts.
//!
//! Each module owns one field concern; every rule either yields exactly one
//! typed value or nothing. Absence is not an error here: the pattern stage
//! records it as missing and defers to the fallback stage.

pub mod amounts;
pub mod company;
pub mod dates;
pub mod invoice;
pub mod odometer;
pub mod patterns;
pub mod work;

pub use amounts::{extract_total, extract_vat, parse_finnish_amount};
pub use company::extract_company;
pub use dates::extract_date;
pub use invoice::extract_invoice_number;
pub use odometer::{extract_odometer, repair_reading};
pub use work::extract_work_description;

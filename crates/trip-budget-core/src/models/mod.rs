//! Data models for Trip Budget

mod category;
mod conversion;
mod record;

pub use category::Category;
pub use conversion::{Conversion, DEFAULT_CONVERSION_MARKUP};
pub use record::{NewRecord, Record, RecordId};

//! Network device log
//!
//! A flat text file holding one line per device entry, plus the payload and
//! record types shared by the HTTP server and the scripted client.

mod error;
mod record;
mod store;

pub use error::{StoreError, StoreResult};
pub use record::{
    Clock, DeviceInfo, DeviceRecord, FixedClock, SystemClock, ValidationError, REQUIRED_FIELDS,
    TIMESTAMP_FORMAT,
};
pub use store::LogStore;

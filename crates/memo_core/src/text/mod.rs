//! Pure text helpers shared by views and services.
//!
//! Nothing in here touches storage or the system clock except
//! [`time::now_epoch_ms`].

pub mod preview;
pub mod query;
pub mod time;

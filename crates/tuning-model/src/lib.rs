//! cops tuning model
//!
//! Plain data types shared by the cops workload tuner:
//! - `WorkloadMutationRequest`: one validated batch row
//! - `ReconciliationResult`: one row of output
//! - `Quantity`: exact numeric view of Kubernetes resource quantities
//! - unit validators for the CPU/memory literals accepted in a batch

pub mod error;
pub mod kind;
pub mod quantity;
pub mod request;
pub mod result;
pub mod units;

pub use error::ValidationError;
pub use kind::WorkloadKind;
pub use quantity::{Quantity, QuantityError};
pub use request::{WorkloadMutationRequest, FIELD_COUNT};
pub use result::{Availability, Outcome, ReconciliationResult, ResourceQuantities};
pub use units::{is_mebibyte_memory, is_milli_cpu};

//! Clock port - Source of "now".
//!
//! Every read of the current instant goes through this trait so resolution,
//! lifecycle operations and the sweep can be driven deterministically.

use crate::domain::foundation::EpochMillis;

pub trait Clock: Send + Sync {
    fn now(&self) -> EpochMillis;
}

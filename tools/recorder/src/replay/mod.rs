//! Call recording and replay.
//!
//! # Overview
//!
//! A [`facade::Facade`] stands in for a target. Every operation sent to it is
//! captured as a [`record::Record`] in its [`ledger::Ledger`] and then
//! forwarded. The ledger can later replay the captured sequence against the
//! current target, which may have been swapped in the meantime; one failing
//! record never stops the rest from being replayed.
//!
//! Everything here is single-threaded and in memory.

pub mod facade;
pub mod ledger;
pub mod record;

pub use facade::{wrap, Facade};
pub use ledger::{Ledger, LedgerOptions};
pub use record::Record;

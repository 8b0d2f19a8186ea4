//! Host sink contract

use crate::raddec::Raddec;

/// Downstream consumer of normalized records.
///
/// One sink is shared by every listener in the process, so
/// implementations own their synchronization. `accept` is infallible by
/// contract: a sink that hits trouble logs and moves on rather than
/// pushing an error back into the decoding path.
pub trait RaddecSink: Send + Sync {
    /// Take ownership of one normalized record
    fn accept(&self, raddec: Raddec);
}

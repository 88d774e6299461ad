/// Event broadcast when fresh analysis state is available.
///
/// Deliberately carries no payload: one event is sent per repository per
/// analysis pass, and consumers are expected to be idempotent re-renderers
/// that read the hierarchy on receipt rather than count events.
#[derive(Debug, Clone, Copy)]
pub struct StateChanged;

/// Capacity of the state-changed broadcast channel.
pub(crate) const EVENT_CAPACITY: usize = 256;

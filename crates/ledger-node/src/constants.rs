/// Messages exchanged with one peer per outbound conversation before giving up.
pub(crate) const MAX_GOSSIP_ROUNDS: usize = 4;
/// Per-request timeout for outbound gossip, in seconds.
pub(crate) const PEER_TIMEOUT_SECS: u64 = 10;

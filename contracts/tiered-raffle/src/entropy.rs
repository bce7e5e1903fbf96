use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Env};
use sha2::{Digest, Sha256};

/// Something that yields an unpredictable value per sequencing step.
///
/// On chain this is the block the purchase lands in; tests plug in fixed
/// values so draws are reproducible.
pub trait EntropySource {
    /// Current position in the ordering of submitted operations.
    fn ordering_marker(&self) -> u64;

    /// 32 bytes bound to a (possibly earlier) ordering marker.
    fn ordering_source(&self, marker: u64) -> [u8; 32];

    /// Per-step value outside any single purchaser's control.
    fn auxiliary_entropy(&self) -> [u8; 32];
}

/// Entropy drawn from the block metadata of the executing transaction.
pub struct BlockEntropy {
    chain_id: String,
    height: u64,
    time_nanos: u64,
    tx_index: u32,
    contract: Addr,
}

impl BlockEntropy {
    pub fn new(env: &Env) -> Self {
        BlockEntropy {
            chain_id: env.block.chain_id.clone(),
            height: env.block.height,
            time_nanos: env.block.time.nanos(),
            tx_index: env
                .transaction
                .as_ref()
                .map(|tx| tx.index)
                .unwrap_or_default(),
            contract: env.contract.address.clone(),
        }
    }
}

impl EntropySource for BlockEntropy {
    fn ordering_marker(&self) -> u64 {
        self.height
    }

    fn ordering_source(&self, marker: u64) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.chain_id.as_bytes());
        hasher.update(marker.to_be_bytes());
        hasher.finalize().into()
    }

    fn auxiliary_entropy(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.time_nanos.to_be_bytes());
        hasher.update(self.tx_index.to_be_bytes());
        hasher.update(self.contract.as_bytes());
        hasher.finalize().into()
    }
}

/// Append-only hash chain fed once per ticket sold.
///
/// `digest' = sha256(ordering_source(last_marker) || auxiliary || digest)`.
/// The final seed depends on the whole purchase sequence. It is not a
/// secure randomness beacon: a block producer can still influence it.
#[cw_serde]
pub struct RandomnessAccumulator {
    pub last_marker: u64,
    pub digest: [u8; 32],
}

impl RandomnessAccumulator {
    pub fn new(source: &impl EntropySource) -> Self {
        RandomnessAccumulator {
            last_marker: source.ordering_marker(),
            digest: [0u8; 32],
        }
    }

    pub fn mix(&mut self, source: &impl EntropySource) {
        let mut hasher = Sha256::new();
        hasher.update(source.ordering_source(self.last_marker));
        hasher.update(source.auxiliary_entropy());
        hasher.update(self.digest);
        self.digest = hasher.finalize().into();
        self.last_marker = source.ordering_marker();
    }

    /// One last mix at draw time; the result is the seed.
    pub fn finalize(&mut self, source: &impl EntropySource) -> [u8; 32] {
        self.mix(source);
        self.digest
    }
}

use clap::Parser;
use ledger_core::constants::{
    BLOCK_GENERATION_INTERVAL, DIFFICULTY_ADJUSTMENT_INTERVAL, TIMESTAMP_SKEW_SECS,
};
use ledger_core::ChainParams;

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, env = "LEDGER_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: String,

    /// Peer base URLs, comma separated (e.g. http://127.0.0.1:8081)
    #[arg(long, env = "LEDGER_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Search nonces on all cores instead of one
    #[arg(long, env = "LEDGER_PARALLEL_MINING")]
    pub parallel_mining: bool,

    /// Target seconds per block
    #[arg(long, default_value_t = BLOCK_GENERATION_INTERVAL)]
    pub block_generation_interval: u64,

    /// Blocks between difficulty recalculations
    #[arg(
        long,
        default_value_t = DIFFICULTY_ADJUSTMENT_INTERVAL,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub difficulty_adjustment_interval: u64,

    /// Allowed clock skew for block timestamps, in seconds
    #[arg(long, default_value_t = TIMESTAMP_SKEW_SECS)]
    pub timestamp_skew: u64,

    /// Accept blocks without checking their proof-of-work
    #[arg(long)]
    pub no_proof_of_work: bool,
}

impl Args {
    pub fn chain_params(&self) -> ChainParams {
        ChainParams {
            block_generation_interval: self.block_generation_interval,
            difficulty_adjustment_interval: self.difficulty_adjustment_interval,
            timestamp_skew: self.timestamp_skew,
            proof_of_work: !self.no_proof_of_work,
        }
    }
}

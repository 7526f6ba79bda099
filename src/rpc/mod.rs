//! Bitcoin node integration
//!
//! - **Node** - the [`ChainNode`] trait every processor talks to
//! - **Client** - Bitcoin Core JSON-RPC implementation over `corepc-client`
//! - **Retry** - Exponential backoff for idempotent calls

pub mod client;
pub mod node;
pub mod retry;

pub use client::{core_chain_name, BitcoinRpcClient};
pub use node::{AddressInfo, ChainNode, MultisigAddress, SignedTx, UnspentOutput};
pub use retry::{calculate_next_backoff, retry_with_backoff};

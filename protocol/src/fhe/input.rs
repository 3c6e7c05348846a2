//! Encrypted inputs submitted by wallets.
//!
//! A wallet never hands the ledger a plaintext amount. It submits an
//! [`EncryptedInput`]: a handle to a freshly encrypted value plus a proof
//! binding that handle to the wallet's address. The coprocessor checks the
//! binding in [`FheContext::verify_input`](super::FheContext::verify_input),
//! so a handle lifted from someone else's input is useless to the thief.

use serde::{Deserialize, Serialize};

use super::handle::Handle;

/// A handle plus its proof of origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub handle: Handle,
    pub proof: [u8; 32],
}

//! The confidential-value coprocessor.
//!
//! [`FheContext`] owns every ciphertext in the system. Callers only ever hold
//! handles; the coprocessor opens operands, evaluates the operation and seals
//! the result under a new handle, all inside one write lock. Nothing outside
//! this file can observe a plaintext except through [`FheContext::decrypt`],
//! which is gated by the per-handle access-control list.
//!
//! ## Arithmetic semantics
//!
//! - `add` saturates at `u64::MAX`.
//! - `sub` saturates at zero. Balances can never underflow.
//! - comparisons return [`Ebool`]; branch with [`FheContext::select`], never
//!   with `if`.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::trace;

use super::handle::{Ebool, Euint64, FheType, Handle};
use super::input::EncryptedInput;
use crate::config::{AES_KEY_LENGTH, HANDLE_DOMAIN, INPUT_PROOF_DOMAIN};
use crate::crypto::encryption::{self, EncryptionError};
use crate::crypto::hash::tagged_hash;
use crate::identity::Address;

/// Errors raised by the coprocessor.
#[derive(Debug, Error)]
pub enum FheError {
    #[error("unknown ciphertext handle {0}")]
    UnknownHandle(Handle),

    #[error("handle {handle} is not of type {expected:?}")]
    TypeMismatch { handle: Handle, expected: FheType },

    #[error("account {account} may not access handle {handle}")]
    NotAllowed { handle: Handle, account: Address },

    #[error("input proof does not match handle {0}")]
    InvalidInputProof(Handle),

    #[error("corrupted ciphertext behind handle {0}")]
    Corrupted(Handle),

    #[error(transparent)]
    Sealing(#[from] EncryptionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plaintext {
    Bool(bool),
    Uint64(u64),
}

impl Plaintext {
    fn fhe_type(self) -> FheType {
        match self {
            Plaintext::Bool(_) => FheType::Bool,
            Plaintext::Uint64(_) => FheType::Uint64,
        }
    }

    fn to_bytes(self) -> Vec<u8> {
        match self {
            Plaintext::Bool(b) => vec![b as u8],
            Plaintext::Uint64(v) => v.to_le_bytes().to_vec(),
        }
    }

    fn from_bytes(fhe_type: FheType, bytes: &[u8]) -> Option<Self> {
        match fhe_type {
            FheType::Bool => match bytes {
                [0] => Some(Plaintext::Bool(false)),
                [1] => Some(Plaintext::Bool(true)),
                _ => None,
            },
            FheType::Uint64 => {
                let arr: [u8; 8] = bytes.try_into().ok()?;
                Some(Plaintext::Uint64(u64::from_le_bytes(arr)))
            }
        }
    }
}

/// Ciphertexts are append-only: every operation result stays addressable
/// for the life of the context, as on-chain handles do. Nothing is reclaimed.
#[derive(Default)]
struct Store {
    ciphertexts: HashMap<Handle, Vec<u8>>,
    acl: HashMap<Handle, HashSet<Address>>,
    counter: u64,
}

/// The coprocessor. Share it behind an `Arc`; every method takes `&self`.
pub struct FheContext {
    sealing_key: [u8; AES_KEY_LENGTH],
    proof_key: [u8; 32],
    store: RwLock<Store>,
}

impl FheContext {
    /// A coprocessor with a fresh random sealing key.
    pub fn new() -> Self {
        let sealing_key = encryption::generate_key();
        let proof_key = blake3::derive_key(INPUT_PROOF_DOMAIN, &sealing_key);
        Self {
            sealing_key,
            proof_key,
            store: RwLock::new(Store::default()),
        }
    }

    // -----------------------------------------------------------------------
    // Constants and inputs
    // -----------------------------------------------------------------------

    /// Encrypt a public constant.
    pub fn trivial_encrypt(&self, value: u64) -> Result<Euint64, FheError> {
        let mut store = self.store.write();
        self.insert(&mut store, "trivial_u64", &[], Plaintext::Uint64(value))
            .map(Euint64::from_handle)
    }

    /// Encrypt a public boolean constant.
    pub fn trivial_bool(&self, value: bool) -> Result<Ebool, FheError> {
        let mut store = self.store.write();
        self.insert(&mut store, "trivial_bool", &[], Plaintext::Bool(value))
            .map(Ebool::from_handle)
    }

    /// Client-side encryption of an amount for `owner`. In a deployment the
    /// wallet SDK produces this against the network key; the result is only
    /// usable by `owner` through [`verify_input`](Self::verify_input).
    pub fn encrypt_input(&self, value: u64, owner: Address) -> Result<EncryptedInput, FheError> {
        let mut store = self.store.write();
        let handle = self.insert(&mut store, "input", &[], Plaintext::Uint64(value))?;
        Ok(EncryptedInput {
            handle,
            proof: *self.input_proof(handle, owner).as_bytes(),
        })
    }

    /// Check that `input` was produced for `caller` and grant `caller`
    /// access to it.
    pub fn verify_input(
        &self,
        input: &EncryptedInput,
        caller: Address,
    ) -> Result<Euint64, FheError> {
        let handle = input.handle;
        if handle.fhe_type() != Some(FheType::Uint64) {
            return Err(FheError::TypeMismatch {
                handle,
                expected: FheType::Uint64,
            });
        }
        // blake3::Hash equality is constant time.
        if self.input_proof(handle, caller) != blake3::Hash::from(input.proof) {
            return Err(FheError::InvalidInputProof(handle));
        }

        let mut store = self.store.write();
        if !store.ciphertexts.contains_key(&handle) {
            return Err(FheError::UnknownHandle(handle));
        }
        store.acl.entry(handle).or_default().insert(caller);
        Ok(Euint64::from_handle(handle))
    }

    fn input_proof(&self, handle: Handle, owner: Address) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(&self.proof_key);
        hasher.update(handle.as_bytes());
        hasher.update(owner.as_bytes());
        hasher.finalize()
    }

    // -----------------------------------------------------------------------
    // Arithmetic
    // -----------------------------------------------------------------------

    pub fn add(&self, a: Euint64, b: Euint64) -> Result<Euint64, FheError> {
        self.binary_u64("add", a, b, |x, y| Plaintext::Uint64(x.saturating_add(y)))
            .map(Euint64::from_handle)
    }

    pub fn sub(&self, a: Euint64, b: Euint64) -> Result<Euint64, FheError> {
        self.binary_u64("sub", a, b, |x, y| Plaintext::Uint64(x.saturating_sub(y)))
            .map(Euint64::from_handle)
    }

    pub fn le(&self, a: Euint64, b: Euint64) -> Result<Ebool, FheError> {
        self.binary_u64("le", a, b, |x, y| Plaintext::Bool(x <= y))
            .map(Ebool::from_handle)
    }

    pub fn lt(&self, a: Euint64, b: Euint64) -> Result<Ebool, FheError> {
        self.binary_u64("lt", a, b, |x, y| Plaintext::Bool(x < y))
            .map(Ebool::from_handle)
    }

    pub fn eq(&self, a: Euint64, b: Euint64) -> Result<Ebool, FheError> {
        self.binary_u64("eq", a, b, |x, y| Plaintext::Bool(x == y))
            .map(Ebool::from_handle)
    }

    // -----------------------------------------------------------------------
    // Boolean logic
    // -----------------------------------------------------------------------

    pub fn and(&self, a: Ebool, b: Ebool) -> Result<Ebool, FheError> {
        self.binary_bool("and", a, b, |x, y| x && y)
    }

    pub fn or(&self, a: Ebool, b: Ebool) -> Result<Ebool, FheError> {
        self.binary_bool("or", a, b, |x, y| x || y)
    }

    pub fn not(&self, a: Ebool) -> Result<Ebool, FheError> {
        let mut store = self.store.write();
        let x = self.open_bool(&store, a)?;
        self.insert(&mut store, "not", &[a.handle()], Plaintext::Bool(!x))
            .map(Ebool::from_handle)
    }

    /// `cond ? if_true : if_false`, evaluated under encryption.
    pub fn select(
        &self,
        cond: Ebool,
        if_true: Euint64,
        if_false: Euint64,
    ) -> Result<Euint64, FheError> {
        let mut store = self.store.write();
        let c = self.open_bool(&store, cond)?;
        let t = self.open_u64(&store, if_true)?;
        let f = self.open_u64(&store, if_false)?;
        let chosen = if c { t } else { f };
        self.insert(
            &mut store,
            "select",
            &[cond.handle(), if_true.handle(), if_false.handle()],
            Plaintext::Uint64(chosen),
        )
        .map(Euint64::from_handle)
    }

    // -----------------------------------------------------------------------
    // Access control & decryption
    // -----------------------------------------------------------------------

    /// Grant `account` access to `handle`.
    pub fn allow(&self, handle: impl Into<Handle>, account: Address) -> Result<(), FheError> {
        let handle = handle.into();
        let mut store = self.store.write();
        if !store.ciphertexts.contains_key(&handle) {
            return Err(FheError::UnknownHandle(handle));
        }
        store.acl.entry(handle).or_default().insert(account);
        Ok(())
    }

    pub fn is_allowed(&self, handle: impl Into<Handle>, account: Address) -> bool {
        let handle = handle.into();
        self.store
            .read()
            .acl
            .get(&handle)
            .is_some_and(|accounts| accounts.contains(&account))
    }

    /// Decrypt `value` on behalf of `requester`.
    pub fn decrypt(&self, value: Euint64, requester: Address) -> Result<u64, FheError> {
        let store = self.store.read();
        Self::require_allowed(&store, value.handle(), requester)?;
        self.open_u64(&store, value)
    }

    /// Decrypt an encrypted boolean on behalf of `requester`.
    pub fn decrypt_bool(&self, value: Ebool, requester: Address) -> Result<bool, FheError> {
        let store = self.store.read();
        Self::require_allowed(&store, value.handle(), requester)?;
        self.open_bool(&store, value)
    }

    /// Number of ciphertexts held. Grows by one per encryption or operation
    /// result and never shrinks, since any handle may still be referenced.
    pub fn ciphertext_count(&self) -> usize {
        self.store.read().ciphertexts.len()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require_allowed(store: &Store, handle: Handle, account: Address) -> Result<(), FheError> {
        if !store.ciphertexts.contains_key(&handle) {
            return Err(FheError::UnknownHandle(handle));
        }
        let allowed = store
            .acl
            .get(&handle)
            .is_some_and(|accounts| accounts.contains(&account));
        if !allowed {
            return Err(FheError::NotAllowed { handle, account });
        }
        Ok(())
    }

    fn binary_u64(
        &self,
        op: &'static str,
        a: Euint64,
        b: Euint64,
        f: impl FnOnce(u64, u64) -> Plaintext,
    ) -> Result<Handle, FheError> {
        let mut store = self.store.write();
        let x = self.open_u64(&store, a)?;
        let y = self.open_u64(&store, b)?;
        self.insert(&mut store, op, &[a.handle(), b.handle()], f(x, y))
    }

    fn binary_bool(
        &self,
        op: &'static str,
        a: Ebool,
        b: Ebool,
        f: impl FnOnce(bool, bool) -> bool,
    ) -> Result<Ebool, FheError> {
        let mut store = self.store.write();
        let x = self.open_bool(&store, a)?;
        let y = self.open_bool(&store, b)?;
        self.insert(&mut store, op, &[a.handle(), b.handle()], Plaintext::Bool(f(x, y)))
            .map(Ebool::from_handle)
    }

    fn open_u64(&self, store: &Store, value: Euint64) -> Result<u64, FheError> {
        match self.open(store, value.handle(), FheType::Uint64)? {
            Plaintext::Uint64(v) => Ok(v),
            Plaintext::Bool(_) => Err(FheError::Corrupted(value.handle())),
        }
    }

    fn open_bool(&self, store: &Store, value: Ebool) -> Result<bool, FheError> {
        match self.open(store, value.handle(), FheType::Bool)? {
            Plaintext::Bool(b) => Ok(b),
            Plaintext::Uint64(_) => Err(FheError::Corrupted(value.handle())),
        }
    }

    fn open(&self, store: &Store, handle: Handle, expected: FheType) -> Result<Plaintext, FheError> {
        if handle.fhe_type() != Some(expected) {
            return Err(FheError::TypeMismatch { handle, expected });
        }
        let sealed = store
            .ciphertexts
            .get(&handle)
            .ok_or(FheError::UnknownHandle(handle))?;
        let bytes = encryption::open(&self.sealing_key, sealed, handle.as_bytes())?;
        Plaintext::from_bytes(expected, &bytes).ok_or(FheError::Corrupted(handle))
    }

    fn insert(
        &self,
        store: &mut Store,
        op: &str,
        operands: &[Handle],
        value: Plaintext,
    ) -> Result<Handle, FheError> {
        store.counter += 1;
        let counter = store.counter.to_le_bytes();
        let mut parts: Vec<&[u8]> = vec![op.as_bytes(), counter.as_slice()];
        parts.extend(operands.iter().map(|h| h.as_bytes().as_slice()));

        let handle = Handle::new(tagged_hash(HANDLE_DOMAIN, &parts), value.fhe_type());
        let sealed = encryption::seal(&self.sealing_key, &value.to_bytes(), handle.as_bytes())?;
        store.ciphertexts.insert(handle, sealed);
        trace!(op, %handle, "ciphertext sealed");
        Ok(handle)
    }
}

impl Default for FheContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FheContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FheContext")
            .field("ciphertexts", &self.ciphertext_count())
            .finish_non_exhaustive()
    }
}

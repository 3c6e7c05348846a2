//! # Approval-Gated Transfers (DVA)
//!
//! An [`ApprovalTransferManager`] sits in front of a token for transfers that
//! need sign-off. The sender's funds move into escrow at initiation; they
//! reach the recipient only once every approver in the transfer's list has
//! approved, and go back to the sender on rejection or cancellation.
//!
//! ```text
//!               approve (last)
//!   Pending ─────────────────────▶ Completed
//!      │  ╲
//!      │   ╲ reject
//!      │    ╲──────────────────▶ Rejected
//!      │ cancel (sender)
//!      └───────────────────────▶ Cancelled
//! ```
//!
//! Approval criteria are per asset and may change while transfers are in
//! flight. Each transfer remembers the hash of the criteria it was built
//! from; the first touch after a change rebuilds its approver list instead
//! of recording an approval.

/// 32-byte digest newtype with `0x`-hex display and serde.
macro_rules! digest_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; 32]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}(0x{}..)", stringify!($name), hex::encode(&self.0[..6]))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&self.to_hex())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(d)?;
                let stripped = s.strip_prefix("0x").unwrap_or(&s);
                let bytes = hex::decode(stripped).map_err(serde::de::Error::custom)?;
                let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    serde::de::Error::custom(concat!(stringify!($name), " must be 32 bytes"))
                })?;
                Ok(Self(arr))
            }
        }
    };
}

pub mod criteria;
pub mod manager;
pub mod transfer;

pub use criteria::{ApprovalCriteria, CriteriaHash};
pub use manager::{ApprovalTransferManager, DvaError};
pub use transfer::{
    ApprovalOutcome, Approver, ApproverWallet, DelegatedApproval, Transfer, TransferId,
    TransferStatus,
};

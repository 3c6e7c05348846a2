//! Compliance verdicts.
//!
//! A rule that only looks at public state (who is sending, which country the
//! recipient is in) produces a plaintext answer. A rule that compares against
//! an encrypted counter can only produce an encrypted one. [`Verdict`] carries
//! either, and combines them without decrypting anything.

use super::clamp;
use super::context::{FheContext, FheError};
use super::handle::{Ebool, Euint64};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Plain(bool),
    Encrypted(Ebool),
}

impl Verdict {
    pub const ALLOW: Verdict = Verdict::Plain(true);
    pub const DENY: Verdict = Verdict::Plain(false);

    /// Conjunction. A plaintext `false` short-circuits and touches no
    /// ciphertext.
    pub fn and(self, other: Verdict, fhe: &FheContext) -> Result<Verdict, FheError> {
        Ok(match (self, other) {
            (Verdict::Plain(false), _) | (_, Verdict::Plain(false)) => Verdict::DENY,
            (Verdict::Plain(true), v) | (v, Verdict::Plain(true)) => v,
            (Verdict::Encrypted(a), Verdict::Encrypted(b)) => Verdict::Encrypted(fhe.and(a, b)?),
        })
    }

    /// `true` only for a plaintext denial. An encrypted verdict may still
    /// turn out false, but nobody can tell from here.
    pub fn is_denied(&self) -> bool {
        matches!(self, Verdict::Plain(false))
    }

    /// Clamp `amount` by this verdict: the amount itself when allowed, an
    /// encrypted zero when denied.
    pub fn apply(self, fhe: &FheContext, amount: Euint64) -> Result<Euint64, FheError> {
        match self {
            Verdict::Plain(true) => Ok(amount),
            Verdict::Plain(false) => clamp::zero(fhe),
            Verdict::Encrypted(cond) => clamp::gate(fhe, cond, amount),
        }
    }
}

impl From<bool> for Verdict {
    fn from(value: bool) -> Self {
        Verdict::Plain(value)
    }
}

impl From<Ebool> for Verdict {
    fn from(value: Ebool) -> Self {
        Verdict::Encrypted(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Address;

    #[test]
    fn plain_false_short_circuits() {
        let fhe = FheContext::new();
        let enc = Verdict::Encrypted(fhe.trivial_bool(true).unwrap());
        let before = fhe.ciphertext_count();
        assert_eq!(Verdict::DENY.and(enc, &fhe).unwrap(), Verdict::DENY);
        assert_eq!(enc.and(Verdict::DENY, &fhe).unwrap(), Verdict::DENY);
        assert_eq!(fhe.ciphertext_count(), before);
    }

    #[test]
    fn plain_true_is_identity() {
        let fhe = FheContext::new();
        let enc = Verdict::Encrypted(fhe.trivial_bool(false).unwrap());
        assert_eq!(Verdict::ALLOW.and(enc, &fhe).unwrap(), enc);
        assert_eq!(Verdict::ALLOW.and(Verdict::ALLOW, &fhe).unwrap(), Verdict::ALLOW);
    }

    #[test]
    fn apply_clamps_amount() {
        let fhe = FheContext::new();
        let reader = Address::derive("reader");
        let amount = fhe.trivial_encrypt(12).unwrap();
        let dec = |v: Euint64| {
            fhe.allow(v, reader).unwrap();
            fhe.decrypt(v, reader).unwrap()
        };

        assert_eq!(dec(Verdict::ALLOW.apply(&fhe, amount).unwrap()), 12);
        assert_eq!(dec(Verdict::DENY.apply(&fhe, amount).unwrap()), 0);

        let a = Verdict::Encrypted(fhe.trivial_bool(true).unwrap());
        let b = Verdict::Encrypted(fhe.trivial_bool(false).unwrap());
        assert_eq!(dec(a.apply(&fhe, amount).unwrap()), 12);
        assert_eq!(dec(a.and(b, &fhe).unwrap().apply(&fhe, amount).unwrap()), 0);
    }
}

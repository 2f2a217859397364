//! Transfer Batch Circuit
//!
//! Proves that every slot of a fixed-size batch of transfers is valid.
//! Uses the BLS12-381 scalar field.
//!
//! ```text
//! Public Inputs (3N field elements, order matters for verifier):
//!   - to[0..N]               recipient identifiers
//!   - from[0..N]             sender identifiers
//!   - transactionHash[0..N]  transfer commitments
//!
//! Private Witness:
//!   - amount[0..N]
//!   - fromBalances[0..N]     sender balances before the transfer
//!   - toBalances[0..N]       recipient balances before the transfer
//! ```
//!
//! Per slot:
//! 1. amount <= fromBalance
//! 2. updatedFrom = fromBalance - amount
//! 3. updatedTo   = toBalance + amount
//!
//! The public tags are not linked to the balances.

use core::cmp::Ordering;

use ark_bls12_381::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError,
};
use tracing::debug;

use crate::{
    constants::BATCH_SIZE,
    error::SchemaError,
    witness::{BatchRecord, Column, TransferSlot},
};

/// Allocated variables of one slot.
#[derive(Clone, Debug)]
pub struct TransferSlotVar {
    pub to: FpVar<Fr>,
    pub from: FpVar<Fr>,
    pub amount: FpVar<Fr>,
    pub transaction_hash: FpVar<Fr>,
    pub from_balance: FpVar<Fr>,
    pub to_balance: FpVar<Fr>,
}

/// The batch circuit
///
/// Proves that:
/// 1. No slot moves more than its sender holds
/// 2. Both updated balances of every slot are bound to witness wires
#[derive(Clone, Debug)]
pub struct TransferBatchCircuit<const N: usize = BATCH_SIZE> {
    /// Assignment for every variable; `None` when only the shape is needed
    pub record: Option<BatchRecord<N>>,
}

impl<const N: usize> TransferBatchCircuit<N> {
    /// Create an unassigned circuit
    pub fn new() -> Self {
        Self { record: None }
    }

    pub fn with_record(record: BatchRecord<N>) -> Self {
        Self {
            record: Some(record),
        }
    }

    /// Create a dummy circuit for key generation
    /// Same structure as real proofs, all values zero
    pub fn dummy() -> Self {
        Self::with_record(BatchRecord::zeroed())
    }

    fn value(&self, index: usize, column: Column) -> Result<Fr, SynthesisError> {
        self.record
            .as_ref()
            .and_then(|record| record.slot(index))
            .map(|slot| slot.get(column))
            .ok_or(SynthesisError::AssignmentMissing)
    }

    fn slot(&self, index: usize) -> Result<TransferSlot, SynthesisError> {
        self.record
            .as_ref()
            .and_then(|record| record.slot(index).copied())
            .ok_or(SynthesisError::AssignmentMissing)
    }
}

impl<const N: usize> Default for TransferBatchCircuit<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ConstraintSynthesizer<Fr> for TransferBatchCircuit<N> {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // =====================================================================
        // Allocate Public Inputs (ORDER MATTERS - must match verifier)
        // =====================================================================

        let mut to_vars = Vec::with_capacity(N);
        for i in 0..N {
            to_vars.push(FpVar::new_input(cs.clone(), || self.value(i, Column::To))?);
        }

        let mut from_vars = Vec::with_capacity(N);
        for i in 0..N {
            from_vars.push(FpVar::new_input(cs.clone(), || self.value(i, Column::From))?);
        }

        let mut tx_hash_vars = Vec::with_capacity(N);
        for i in 0..N {
            tx_hash_vars.push(FpVar::new_input(cs.clone(), || {
                self.value(i, Column::TransactionHash)
            })?);
        }

        // =====================================================================
        // Allocate Private Witness
        // =====================================================================

        let mut amount_vars = Vec::with_capacity(N);
        for i in 0..N {
            amount_vars.push(FpVar::new_witness(cs.clone(), || self.value(i, Column::Amount))?);
        }

        let mut from_balance_vars = Vec::with_capacity(N);
        for i in 0..N {
            from_balance_vars.push(FpVar::new_witness(cs.clone(), || {
                self.value(i, Column::FromBalances)
            })?);
        }

        let mut to_balance_vars = Vec::with_capacity(N);
        for i in 0..N {
            to_balance_vars.push(FpVar::new_witness(cs.clone(), || {
                self.value(i, Column::ToBalances)
            })?);
        }

        // =====================================================================
        // Per-slot relations
        // =====================================================================

        let slots = to_vars
            .into_iter()
            .zip(from_vars)
            .zip(tx_hash_vars)
            .zip(amount_vars)
            .zip(from_balance_vars)
            .zip(to_balance_vars)
            .map(
                |(((((to, from), transaction_hash), amount), from_balance), to_balance)| {
                    TransferSlotVar {
                        to,
                        from,
                        amount,
                        transaction_hash,
                        from_balance,
                        to_balance,
                    }
                },
            );

        for (i, slot) in slots.enumerate() {
            enforce_transfer(cs.clone(), &slot, || self.slot(i))?;
        }

        Ok(())
    }
}

/// Constrain one slot.
///
/// `amount <= from_balance` is checked as `amount < from_balance + 1`, and both sides of
/// that must be at most `(p - 1) / 2`. So `amount` is bounded by `(p - 1) / 2` and
/// `from_balance` by `(p - 3) / 2`; anything above makes the system unsatisfiable.
///
/// The updated balances are allocated as their own wires and then asserted equal to the
/// same expression recomputed from the inputs.
pub fn enforce_transfer(
    cs: ConstraintSystemRef<Fr>,
    slot: &TransferSlotVar,
    assignment: impl Fn() -> Result<TransferSlot, SynthesisError>,
) -> Result<(), SynthesisError> {
    // Enforce sender has sufficient balance: from_balance >= amount
    slot.from_balance.enforce_cmp(&slot.amount, Ordering::Greater, true)?;

    let updated_from = FpVar::new_witness(cs.clone(), || {
        assignment().map(|s| s.updated_from_balance())
    })?;
    let updated_to = FpVar::new_witness(cs, || assignment().map(|s| s.updated_to_balance()))?;

    // TODO: compare against caller-supplied post-transfer balances once the input
    // document carries them; today both sides derive from the same inputs.
    updated_from.enforce_equal(&(&slot.from_balance - &slot.amount))?;
    updated_to.enforce_equal(&(&slot.to_balance + &slot.amount))?;

    Ok(())
}

/// Size of a synthesized batch circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstraintReport {
    pub num_constraints: usize,
    /// Includes the constant `1` arkworks prepends
    pub num_instance_variables: usize,
    pub num_witness_variables: usize,
}

/// Evaluate a batch against the schema.
///
/// Either every slot satisfies its relations or the whole batch is rejected with
/// [`SchemaError::ConstraintViolation`]; the offending slot is not reported.
pub fn evaluate_batch<const N: usize>(
    record: &BatchRecord<N>,
) -> Result<ConstraintReport, SchemaError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    TransferBatchCircuit::with_record(record.clone()).generate_constraints(cs.clone())?;

    let report = ConstraintReport {
        num_constraints: cs.num_constraints(),
        num_instance_variables: cs.num_instance_variables(),
        num_witness_variables: cs.num_witness_variables(),
    };
    debug!(?report, slots = N, "synthesized transfer batch");

    if !cs.is_satisfied()? {
        return Err(SchemaError::ConstraintViolation);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::PUBLIC_COLUMNS,
        field::{encode_integer, field_modulus},
    };
    use num_bigint::BigUint;

    fn record(amounts: [u64; 2]) -> BatchRecord<2> {
        let to = [1u64, 2];
        let from = [3u64, 4];
        let tx = [100u64, 101];
        let from_balances = [10u64, 1];
        BatchRecord::new(std::array::from_fn(|i| TransferSlot {
            to: Fr::from(to[i]),
            from: Fr::from(from[i]),
            amount: Fr::from(amounts[i]),
            transaction_hash: Fr::from(tx[i]),
            from_balance: Fr::from(from_balances[i]),
            to_balance: Fr::from(0u64),
        }))
    }

    #[test]
    fn test_valid_batch_is_satisfied() {
        let report = evaluate_batch(&record([5, 1])).unwrap();
        assert!(report.num_constraints > 0);
    }

    #[test]
    fn test_overdraft_rejects_whole_batch() {
        let err = evaluate_batch(&record([5, 2])).unwrap_err();
        assert!(matches!(err, SchemaError::ConstraintViolation));

        // The offending slot can be anywhere
        let err = evaluate_batch(&record([11, 1])).unwrap_err();
        assert!(matches!(err, SchemaError::ConstraintViolation));
    }

    #[test]
    fn test_amount_equal_to_balance_is_allowed() {
        assert!(evaluate_batch(&record([10, 1])).is_ok());
        assert!(evaluate_batch(&record([0, 0])).is_ok());
    }

    #[test]
    fn test_public_input_count() {
        let circuit = TransferBatchCircuit::<2>::with_record(record([5, 1]));
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();

        // 3N public inputs + 1 (arkworks adds a constant "1" as first input)
        assert_eq!(cs.num_instance_variables(), PUBLIC_COLUMNS * 2 + 1);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_default_batch_size_dummy() {
        let report = evaluate_batch(&BatchRecord::<BATCH_SIZE>::zeroed()).unwrap();
        assert_eq!(report.num_instance_variables, PUBLIC_COLUMNS * BATCH_SIZE + 1);
    }

    #[test]
    fn test_unassigned_circuit_fails_synthesis() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let result = TransferBatchCircuit::<2>::new().generate_constraints(cs);
        assert!(matches!(result, Err(SynthesisError::AssignmentMissing)));
    }

    #[test]
    fn test_wrapped_amount_is_rejected() {
        // amount = p - 1 would satisfy the balance equations mod p but is out of the
        // comparable range
        let huge = encode_integer(&(field_modulus() - 1u32)).unwrap();
        let mut slots = *record([0, 0]).slots();
        slots[0].amount = huge;
        assert!(matches!(
            evaluate_batch(&BatchRecord::new(slots)),
            Err(SchemaError::ConstraintViolation)
        ));
    }

    #[test]
    fn test_sender_balance_bound() {
        let with_balance = |balance: BigUint| {
            let mut slots = *record([0, 0]).slots();
            slots[0].from_balance = encode_integer(&balance).unwrap();
            evaluate_batch(&BatchRecord::new(slots))
        };

        // The equality case compares against from_balance + 1
        let p = field_modulus();
        assert!(with_balance((&p - 3u32) / 2u32).is_ok());
        assert!(matches!(
            with_balance((&p - 1u32) / 2u32),
            Err(SchemaError::ConstraintViolation)
        ));
    }

    #[test]
    fn test_tags_are_unconstrained() {
        let mut slots = *record([5, 1]).slots();
        slots[0].to = Fr::from(999_999u64);
        slots[1].transaction_hash = -Fr::from(1u64);
        assert!(evaluate_batch(&BatchRecord::new(slots)).is_ok());
    }
}

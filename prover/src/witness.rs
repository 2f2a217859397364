use std::fmt;

use ark_bls12_381::Fr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};

use crate::{
    circuit::TransferBatchCircuit,
    constants::{BATCH_SIZE, PRIVATE_COLUMNS, PUBLIC_COLUMNS},
    error::WitnessError,
};

/// Whether a value is revealed to the verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// One of the six per-slot columns of an input document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    To,
    From,
    Amount,
    TransactionHash,
    FromBalances,
    ToBalances,
}

impl Column {
    /// Document order.
    pub const ALL: [Column; 6] = [
        Column::To,
        Column::From,
        Column::Amount,
        Column::TransactionHash,
        Column::FromBalances,
        Column::ToBalances,
    ];

    /// Public columns, in instance-vector order.
    pub const PUBLIC: [Column; PUBLIC_COLUMNS] =
        [Column::To, Column::From, Column::TransactionHash];

    /// Private columns, in witness-vector order.
    pub const PRIVATE: [Column; PRIVATE_COLUMNS] =
        [Column::Amount, Column::FromBalances, Column::ToBalances];

    /// Key of this column in the input document.
    pub fn key(self) -> &'static str {
        match self {
            Column::To => "to",
            Column::From => "from",
            Column::Amount => "amount",
            Column::TransactionHash => "transactionHash",
            Column::FromBalances => "fromBalances",
            Column::ToBalances => "toBalances",
        }
    }

    pub fn visibility(self) -> Visibility {
        match self {
            Column::To | Column::From | Column::TransactionHash => Visibility::Public,
            Column::Amount | Column::FromBalances | Column::ToBalances => Visibility::Private,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single transfer in a batch.
///
/// `to`, `from` and `transaction_hash` are public tags; the balances and the amount are
/// private. No relation ties the tags to the balances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferSlot {
    /// Recipient identifier
    pub to: Fr,
    /// Sender identifier
    pub from: Fr,
    /// Amount moved from sender to recipient
    pub amount: Fr,
    /// Commitment identifying the transfer
    pub transaction_hash: Fr,
    /// Sender balance before the transfer
    pub from_balance: Fr,
    /// Recipient balance before the transfer
    pub to_balance: Fr,
}

impl TransferSlot {
    pub fn get(&self, column: Column) -> Fr {
        match column {
            Column::To => self.to,
            Column::From => self.from,
            Column::Amount => self.amount,
            Column::TransactionHash => self.transaction_hash,
            Column::FromBalances => self.from_balance,
            Column::ToBalances => self.to_balance,
        }
    }

    /// Sender balance after the transfer.
    pub fn updated_from_balance(&self) -> Fr {
        self.from_balance - self.amount
    }

    /// Recipient balance after the transfer.
    pub fn updated_to_balance(&self) -> Fr {
        self.to_balance + self.amount
    }
}

/// The N transfer slots of one batch. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchRecord<const N: usize = BATCH_SIZE> {
    slots: [TransferSlot; N],
}

impl<const N: usize> BatchRecord<N> {
    pub fn new(slots: [TransferSlot; N]) -> Self {
        Self { slots }
    }

    /// All-zero batch. Every relation holds for it.
    pub fn zeroed() -> Self {
        Self::new([TransferSlot::default(); N])
    }

    pub fn slots(&self) -> &[TransferSlot; N] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&TransferSlot> {
        self.slots.get(index)
    }

    /// Values of one column across all slots.
    pub fn column(&self, column: Column) -> [Fr; N] {
        std::array::from_fn(|i| self.slots[i].get(column))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransferSlot> {
        self.slots.iter()
    }
}

/// Assembled witness for one batch, ready for a proving backend.
///
/// Layout follows the column visibility: the instance vector is
/// `to ‖ from ‖ transactionHash` and the private vector is
/// `amount ‖ fromBalances ‖ toBalances`, N elements per column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WitnessArtifact<const N: usize = BATCH_SIZE> {
    record: BatchRecord<N>,
}

impl<const N: usize> WitnessArtifact<N> {
    pub fn new(record: BatchRecord<N>) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &BatchRecord<N> {
        &self.record
    }

    pub fn into_record(self) -> BatchRecord<N> {
        self.record
    }

    /// Values exposed to the verifier, in allocation order.
    pub fn public_inputs(&self) -> Vec<Fr> {
        self.flatten(&Column::PUBLIC)
    }

    /// Values kept from the verifier, in allocation order.
    pub fn private_inputs(&self) -> Vec<Fr> {
        self.flatten(&Column::PRIVATE)
    }

    /// Circuit with every variable assigned from this witness.
    pub fn circuit(&self) -> TransferBatchCircuit<N> {
        TransferBatchCircuit::with_record(self.record.clone())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = Vec::new();
        self.public_inputs().serialize_compressed(&mut bytes)?;
        self.private_inputs().serialize_compressed(&mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WitnessError> {
        let mut reader = bytes;
        let public = read_vector(&mut reader, PUBLIC_COLUMNS * N, "public")?;
        let private = read_vector(&mut reader, PRIVATE_COLUMNS * N, "private")?;
        if !reader.is_empty() {
            return Err(WitnessError::Decode(format!(
                "{} trailing bytes after witness",
                reader.len()
            )));
        }

        let slots = std::array::from_fn(|i| TransferSlot {
            to: public[i],
            from: public[N + i],
            transaction_hash: public[2 * N + i],
            amount: private[i],
            from_balance: private[N + i],
            to_balance: private[2 * N + i],
        });
        Ok(Self::new(BatchRecord::new(slots)))
    }

    fn flatten(&self, columns: &[Column]) -> Vec<Fr> {
        columns
            .iter()
            .flat_map(|&column| self.record.column(column))
            .collect()
    }
}

/// Reads a length-prefixed `Fr` vector, checking the prefix before any element is read.
fn read_vector(reader: &mut &[u8], expected: usize, label: &str) -> Result<Vec<Fr>, WitnessError> {
    let len = u64::deserialize_compressed(&mut *reader)
        .map_err(|e| WitnessError::Decode(format!("{label} inputs: {e}")))?;
    if len != expected as u64 {
        return Err(WitnessError::Decode(format!("expected {expected} {label} values, got {len}")));
    }

    let mut values = Vec::with_capacity(expected);
    for _ in 0..expected {
        let value = Fr::deserialize_compressed(&mut *reader)
            .map_err(|e| WitnessError::Decode(format!("{label} inputs: {e}")))?;
        values.push(value);
    }
    Ok(values)
}

//! Witness builder
//!
//! Turns an input document into a [`WitnessArtifact`]:
//!
//! ```text
//! {
//!   "to":              [N scalars],
//!   "from":            [N scalars],
//!   "amount":          [N scalars],
//!   "transactionHash": [N scalars],
//!   "fromBalances":    [N scalars],
//!   "toBalances":      [N scalars]
//! }
//! ```
//!
//! Keys outside these six are ignored.

use std::{
    fs::File,
    io::BufReader,
    path::{self, Path},
};

use ark_bls12_381::Fr;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    constants::BATCH_SIZE,
    error::{Result, ShapeIssue, WitnessError},
    field::{ScalarError, encode_scalar},
    witness::{BatchRecord, Column, TransferSlot, WitnessArtifact},
};

/// Read and decode the document at `path`.
///
/// The file is closed before this returns, whatever the outcome.
pub fn read_document(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let absolute = path::absolute(path).map_err(|source| WitnessError::Path {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %absolute.display(), "reading witness document");

    let file = File::open(&absolute).map_err(|source| WitnessError::Io {
        path: absolute.clone(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        if e.is_io() {
            WitnessError::Io {
                path: absolute,
                source: e.into(),
            }
        } else {
            WitnessError::Decode(e.to_string())
        }
    })
}

/// Build a witness from the document stored at `path`.
pub fn assemble_witness_from_path<const N: usize>(
    path: impl AsRef<Path>,
) -> Result<WitnessArtifact<N>> {
    let document = read_document(path)?;
    assemble_witness(&document)
}

/// Build a witness from an already decoded document.
pub fn assemble_witness<const N: usize>(document: &Value) -> Result<WitnessArtifact<N>> {
    let object = document.as_object().ok_or_else(|| {
        WitnessError::Decode(format!("expected a JSON object, got {}", kind(document)))
    })?;

    let to = read_column::<N>(object, Column::To)?;
    let from = read_column::<N>(object, Column::From)?;
    let amount = read_column::<N>(object, Column::Amount)?;
    let transaction_hash = read_column::<N>(object, Column::TransactionHash)?;
    let from_balance = read_column::<N>(object, Column::FromBalances)?;
    let to_balance = read_column::<N>(object, Column::ToBalances)?;

    let slots = std::array::from_fn(|i| TransferSlot {
        to: to[i],
        from: from[i],
        amount: amount[i],
        transaction_hash: transaction_hash[i],
        from_balance: from_balance[i],
        to_balance: to_balance[i],
    });

    info!(slots = N, "assembled transfer batch witness");
    Ok(WitnessArtifact::new(BatchRecord::new(slots)))
}

/// Build a witness for the default batch size.
pub fn assemble_default_witness(document: &Value) -> Result<WitnessArtifact<BATCH_SIZE>> {
    assemble_witness(document)
}

fn read_column<const N: usize>(object: &Map<String, Value>, key: Column) -> Result<[Fr; N]> {
    let shape = |issue| WitnessError::Shape { key, issue };

    let values = object
        .get(key.key())
        .ok_or_else(|| shape(ShapeIssue::Missing))?
        .as_array()
        .ok_or_else(|| shape(ShapeIssue::NotAnArray))?;

    if values.len() != N {
        return Err(shape(ShapeIssue::Length {
            expected: N,
            actual: values.len(),
        }));
    }

    let mut column = [Fr::default(); N];
    for (index, value) in values.iter().enumerate() {
        column[index] = encode_scalar(value).map_err(|e| match e {
            ScalarError::NotNumeric => shape(ShapeIssue::NotNumeric { index }),
            ScalarError::Unrepresentable(issue) => WitnessError::Encoding { key, index, issue },
        })?;
    }
    Ok(column)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

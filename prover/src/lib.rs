pub mod constants;
pub mod error;
pub mod field;
pub mod groth16;
pub mod witness;
pub mod witness_builder;

pub mod circuit;

// Re-export key types for external usage
pub use ark_bls12_381::Fr;
pub use circuit::{ConstraintReport, TransferBatchCircuit, evaluate_batch};
pub use constants::BATCH_SIZE;
pub use error::{EncodingIssue, SchemaError, ShapeIssue, WitnessError};
pub use witness::{BatchRecord, Column, TransferSlot, Visibility, WitnessArtifact};
pub use witness_builder::{
    assemble_default_witness, assemble_witness, assemble_witness_from_path, read_document,
};

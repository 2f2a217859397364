//! Error types for witness assembly and schema evaluation.

use std::path::PathBuf;

use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

use crate::witness::Column;

/// Errors raised while turning an input document into a witness.
#[derive(Error, Debug)]
pub enum WitnessError {
    /// The input path could not be made absolute
    #[error("cannot resolve path {}: {source}", .path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input document could not be opened or read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not a well-formed JSON object
    #[error("malformed document: {0}")]
    Decode(String),

    /// A column is missing, has the wrong length, or holds a non-numeric element
    #[error("invalid `{key}`: {issue}")]
    Shape { key: Column, issue: ShapeIssue },

    /// A scalar cannot be represented as a field element
    #[error("cannot encode `{key}`[{index}] as a field element: {issue}")]
    Encoding {
        key: Column,
        index: usize,
        issue: EncodingIssue,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeIssue {
    #[error("key is missing")]
    Missing,

    #[error("expected an array")]
    NotAnArray,

    #[error("expected {expected} elements, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("element {index} is not numeric")]
    NotNumeric { index: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingIssue {
    #[error("value is negative")]
    Negative,

    #[error("value is not an integer")]
    NotInteger,

    #[error("value is not below the field modulus")]
    OutOfRange,
}

impl WitnessError {
    /// The column this error refers to, if any.
    pub fn key(&self) -> Option<Column> {
        match self {
            WitnessError::Shape { key, .. } | WitnessError::Encoding { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// The slot index this error refers to, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            WitnessError::Shape {
                issue: ShapeIssue::NotNumeric { index },
                ..
            } => Some(*index),
            WitnessError::Encoding { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Errors raised while evaluating a batch against the constraint schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("constraint synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// At least one slot violates the schema; the batch is rejected as a whole
    #[error("batch rejected: constraint system is not satisfied")]
    ConstraintViolation,
}

pub type Result<T> = std::result::Result<T, WitnessError>;

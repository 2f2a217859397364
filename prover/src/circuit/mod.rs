pub mod transfer_batch;

pub use transfer_batch::{
    ConstraintReport, TransferBatchCircuit, TransferSlotVar, enforce_transfer, evaluate_batch,
};

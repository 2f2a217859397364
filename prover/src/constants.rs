/// Number of transfer slots in every batch.
/// The circuit and the witness assembler are both sized by this value.
pub const BATCH_SIZE: usize = 25;

/// Number of public field elements per transfer slot (`to`, `from`, `transactionHash`).
pub const PUBLIC_COLUMNS: usize = 3;

/// Number of private field elements per transfer slot (`amount`, `fromBalances`, `toBalances`).
pub const PRIVATE_COLUMNS: usize = 3;

//! Groth16 integration
//!
//! Thin wiring between the batch circuit and `ark-groth16` on BLS12-381.
//! Key generation uses the dummy circuit; keys must be regenerated whenever the
//! circuit or the batch size changes.

use std::{fs, path::Path};

use ark_bls12_381::{Bls12_381, Fr};
use ark_groth16::Groth16;
use ark_relations::r1cs::SynthesisError;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use thiserror::Error;
use tracing::info;

use crate::{
    circuit::{TransferBatchCircuit, evaluate_batch},
    error::SchemaError,
    witness::WitnessArtifact,
};

pub type Curve = Bls12_381;
pub type ProvingKey = ark_groth16::ProvingKey<Curve>;
pub type VerifyingKey = ark_groth16::VerifyingKey<Curve>;
pub type Proof = ark_groth16::Proof<Curve>;

#[derive(Error, Debug)]
pub enum ProverError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("proving backend failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Circuit-specific setup for batches of `N` slots.
pub fn setup<const N: usize, R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<(ProvingKey, VerifyingKey), ProverError> {
    let (pk, vk) =
        Groth16::<Curve>::circuit_specific_setup(TransferBatchCircuit::<N>::dummy(), rng)?;
    info!(slots = N, "groth16 setup complete");
    Ok((pk, vk))
}

/// Prove a batch. An unsatisfiable batch is refused before reaching the backend.
pub fn prove<const N: usize, R: RngCore + CryptoRng>(
    pk: &ProvingKey,
    witness: &WitnessArtifact<N>,
    rng: &mut R,
) -> Result<Proof, ProverError> {
    let report = evaluate_batch(witness.record())?;
    info!(
        constraints = report.num_constraints,
        slots = N,
        "batch satisfies schema, proving"
    );
    Ok(Groth16::<Curve>::prove(pk, witness.circuit(), rng)?)
}

/// Verify a proof against the instance vector of a witness.
pub fn verify(
    vk: &VerifyingKey,
    public_inputs: &[Fr],
    proof: &Proof,
) -> Result<bool, ProverError> {
    Ok(Groth16::<Curve>::verify(vk, public_inputs, proof)?)
}

/// Compressed encoding of a key or proof.
pub fn to_bytes<T: CanonicalSerialize>(value: &T) -> Result<Vec<u8>, ProverError> {
    let mut bytes = Vec::new();
    value.serialize_compressed(&mut bytes)?;
    Ok(bytes)
}

pub fn from_bytes<T: CanonicalDeserialize>(bytes: &[u8]) -> Result<T, ProverError> {
    Ok(T::deserialize_compressed(bytes)?)
}

/// Write a key or proof, creating parent directories if needed.
pub fn write_to<T: CanonicalSerialize>(path: &Path, value: &T) -> Result<usize, ProverError> {
    let bytes = to_bytes(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }
    fs::write(path, &bytes).map_err(|source| io_error(path, source))?;
    Ok(bytes.len())
}

pub fn read_from<T: CanonicalDeserialize>(path: &Path) -> Result<T, ProverError> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    from_bytes(&bytes)
}

/// Fingerprint of a verifying key (blake3 of its compressed encoding).
pub fn key_fingerprint(vk: &VerifyingKey) -> Result<[u8; 32], ProverError> {
    Ok(*blake3::hash(&to_bytes(vk)?).as_bytes())
}

fn io_error(path: &Path, source: std::io::Error) -> ProverError {
    ProverError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::witness_builder::assemble_witness;
    use ark_std::rand::{SeedableRng, rngs::StdRng};
    use serde_json::json;

    fn witness(amount: [u64; 2]) -> WitnessArtifact<2> {
        assemble_witness(&json!({
            "to": [1, 2],
            "from": [3, 4],
            "amount": amount,
            "transactionHash": [100, 101],
            "fromBalances": [10, 1],
            "toBalances": [0, 0],
        }))
        .unwrap()
    }

    #[test]
    fn test_prove_and_verify() {
        let mut rng = StdRng::seed_from_u64(0);
        let (pk, vk) = setup::<2, _>(&mut rng).unwrap();

        let witness = witness([5, 1]);
        let proof = prove(&pk, &witness, &mut rng).unwrap();
        assert!(verify(&vk, &witness.public_inputs(), &proof).unwrap());

        // Tampered instance
        let mut public = witness.public_inputs();
        public[4] += Fr::from(1u64);
        assert!(!verify(&vk, &public, &proof).unwrap());

        // Keys and proofs survive their encoding
        let dir = tempfile::TempDir::new().unwrap();
        let vk_path = dir.path().join("keys").join("verifying.key");
        let proof_path = dir.path().join("batch.proof");
        write_to(&vk_path, &vk).unwrap();
        write_to(&proof_path, &proof).unwrap();
        let vk2: VerifyingKey = read_from(&vk_path).unwrap();
        let proof2: Proof = read_from(&proof_path).unwrap();
        assert!(verify(&vk2, &witness.public_inputs(), &proof2).unwrap());
        assert_eq!(key_fingerprint(&vk).unwrap(), key_fingerprint(&vk2).unwrap());
    }

    #[test]
    fn test_unsatisfiable_batch_is_not_proved() {
        let mut rng = StdRng::seed_from_u64(1);
        let (pk, _) = setup::<2, _>(&mut rng).unwrap();

        let err = prove(&pk, &witness([5, 2]), &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ProverError::Schema(SchemaError::ConstraintViolation)
        ));
    }

    #[test]
    fn test_prove_with_entropy_rng() {
        let (pk, vk) = setup::<2, _>(&mut StdRng::from_entropy()).unwrap();

        let witness = witness([10, 0]);
        let proof = prove(&pk, &witness, &mut StdRng::from_entropy()).unwrap();
        assert!(verify(&vk, &witness.public_inputs(), &proof).unwrap());
    }
}

//! Batch Prover CLI
//!
//! ```text
//! batch-prover witness --input batch.json --out batch.witness
//! batch-prover check   --input batch.json
//! batch-prover keygen  --pk-out ./keys/proving.key --vk-out ./keys/verifying.key
//! batch-prover prove   --witness batch.witness --proof-out batch.proof
//! batch-prover verify  --witness batch.witness --proof batch.proof
//! ```
//!
//! Paths not given on the command line come from the batch-prover config
//! (`BP_CONFIG`, `./batch-prover.toml`, `~/.batch-prover/config.toml`).

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result, anyhow, bail};
use ark_std::rand::{SeedableRng, rngs::StdRng};
use batch_config::BatchProverConfig;
use batch_prover::{
    BATCH_SIZE, WitnessArtifact, assemble_witness_from_path,
    constants::PUBLIC_COLUMNS,
    evaluate_batch,
    groth16::{self, Proof, ProvingKey, VerifyingKey},
};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "batch-prover")]
#[command(
    about = "Witness assembly and Groth16 proving for fixed-size transfer batches",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a witness from a JSON batch document
    Witness {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Assemble a witness and evaluate it against the constraint schema
    Check {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Generate Groth16 proving and verifying keys
    Keygen {
        #[arg(long)]
        pk_out: Option<PathBuf>,
        #[arg(long)]
        vk_out: Option<PathBuf>,
        /// Overwrite existing keys
        #[arg(long, short)]
        force: bool,
        /// Seed for the setup RNG (fresh entropy when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Prove a previously assembled witness
    Prove {
        #[arg(long)]
        witness: Option<PathBuf>,
        #[arg(long)]
        pk: Option<PathBuf>,
        #[arg(long)]
        proof_out: Option<PathBuf>,
    },
    /// Verify a proof against the public half of a witness
    Verify {
        #[arg(long)]
        witness: Option<PathBuf>,
        #[arg(long)]
        vk: Option<PathBuf>,
        #[arg(long)]
        proof: Option<PathBuf>,
    },
    /// Print a sample config file
    SampleConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "batch_prover=info,batch_config=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = BatchProverConfig::global();

    match args.command {
        Command::Witness { input, out } => {
            let input = input_path(input, config)?;
            let out = out.unwrap_or_else(|| config.witness.output_path.clone().into());

            let witness = load_witness(&input)?;
            let bytes = witness.to_bytes().context("Failed to serialize witness")?;
            write_file(&out, &bytes)?;
            println!("Witness for {} slots written to {}", BATCH_SIZE, out.display());
        }
        Command::Check { input } => {
            let input = input_path(input, config)?;
            let witness = load_witness(&input)?;
            let report = evaluate_batch(witness.record())
                .with_context(|| format!("Batch in {} is invalid", input.display()))?;
            println!(
                "Batch satisfied: {} constraints, {} public inputs",
                report.num_constraints,
                report.num_instance_variables - 1
            );
        }
        Command::Keygen {
            pk_out,
            vk_out,
            force,
            seed,
        } => {
            let pk_path = pk_out.unwrap_or_else(|| config.keys.proving_key_path.clone().into());
            let vk_path = vk_out.unwrap_or_else(|| config.keys.verifying_key_path.clone().into());
            keygen(&pk_path, &vk_path, force, seed)?;
        }
        Command::Prove {
            witness,
            pk,
            proof_out,
        } => {
            let witness_path = witness.unwrap_or_else(|| config.witness.output_path.clone().into());
            let pk_path = pk.unwrap_or_else(|| config.keys.proving_key_path.clone().into());
            let proof_path = proof_out.unwrap_or_else(|| config.witness.proof_path.clone().into());

            let witness = read_witness(&witness_path)?;
            let pk: ProvingKey = groth16::read_from(&pk_path)
                .with_context(|| format!("Failed to load proving key {}", pk_path.display()))?;

            let start = Instant::now();
            let proof = groth16::prove(&pk, &witness, &mut StdRng::from_entropy())
                .context("Failed to prove batch")?;
            info!(elapsed = ?start.elapsed(), "proof generated");

            groth16::write_to(&proof_path, &proof).context("Failed to write proof")?;
            println!("Proof written to {}", proof_path.display());
        }
        Command::Verify { witness, vk, proof } => {
            let witness_path = witness.unwrap_or_else(|| config.witness.output_path.clone().into());
            let vk_path = vk.unwrap_or_else(|| config.keys.verifying_key_path.clone().into());
            let proof_path = proof.unwrap_or_else(|| config.witness.proof_path.clone().into());

            let witness = read_witness(&witness_path)?;
            let vk: VerifyingKey = groth16::read_from(&vk_path)
                .with_context(|| format!("Failed to load verifying key {}", vk_path.display()))?;
            let proof: Proof = groth16::read_from(&proof_path)
                .with_context(|| format!("Failed to load proof {}", proof_path.display()))?;

            if !groth16::verify(&vk, &witness.public_inputs(), &proof)? {
                bail!("Proof verification failed");
            }
            println!("Proof is valid");
        }
        Command::SampleConfig => {
            print!("{}", BatchProverConfig::generate_sample());
        }
    }

    Ok(())
}

fn input_path(arg: Option<PathBuf>, config: &BatchProverConfig) -> Result<PathBuf> {
    arg.or_else(|| config.witness.input_path.clone().map(PathBuf::from))
        .ok_or_else(|| anyhow!("No input document given (use --input or BP_INPUT)"))
}

fn load_witness(input: &Path) -> Result<WitnessArtifact> {
    assemble_witness_from_path::<BATCH_SIZE>(input)
        .with_context(|| format!("Failed to assemble witness from {}", input.display()))
}

fn read_witness(path: &Path) -> Result<WitnessArtifact> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read witness {}", path.display()))?;
    WitnessArtifact::<BATCH_SIZE>::from_bytes(&bytes)
        .with_context(|| format!("Failed to decode witness {}", path.display()))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn keygen(pk_path: &Path, vk_path: &Path, force: bool, seed: Option<u64>) -> Result<()> {
    // Check if keys already exist
    if !force && pk_path.exists() && vk_path.exists() {
        println!("Keys already exist at:");
        println!("  Proving key:   {}", pk_path.display());
        println!("  Verifying key: {}", vk_path.display());
        println!("\nUse --force to regenerate keys.");
        return Ok(());
    }

    info!(
        slots = BATCH_SIZE,
        public_inputs = PUBLIC_COLUMNS * BATCH_SIZE,
        "performing groth16 circuit-specific setup"
    );

    let mut rng = setup_rng(seed);
    let start = Instant::now();
    let (pk, vk) =
        groth16::setup::<BATCH_SIZE, _>(&mut rng).context("Failed to perform circuit setup")?;
    info!(elapsed = ?start.elapsed(), "setup complete");

    let pk_len = groth16::write_to(pk_path, &pk).context("Failed to write proving key")?;
    println!(
        "Proving key:   {} ({:.2} MB)",
        pk_path.display(),
        pk_len as f64 / 1024.0 / 1024.0
    );
    let vk_len = groth16::write_to(vk_path, &vk).context("Failed to write verifying key")?;
    println!("Verifying key: {} ({} bytes)", vk_path.display(), vk_len);

    let fingerprint = groth16::key_fingerprint(&vk)?;
    println!();
    println!("Verification key hash (blake3):");
    println!("  {}", hex::encode(fingerprint));

    Ok(())
}

/// Deterministic RNG for a given seed, fresh entropy otherwise.
fn setup_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::rand::RngCore;

    #[test]
    fn test_setup_rng() {
        assert_eq!(setup_rng(Some(7)).next_u64(), setup_rng(Some(7)).next_u64());

        let mut a = setup_rng(None);
        let mut b = setup_rng(None);
        let a: [u64; 4] = std::array::from_fn(|_| a.next_u64());
        let b: [u64; 4] = std::array::from_fn(|_| b.next_u64());
        assert_ne!(a, b);
    }

    #[test]
    fn test_input_flag_is_optional() {
        let args = Args::try_parse_from(["batch-prover", "check"]).unwrap();
        assert!(matches!(args.command, Command::Check { input: None }));

        let args = Args::try_parse_from(["batch-prover", "witness", "--input", "b.json"]).unwrap();
        assert!(matches!(args.command, Command::Witness { input: Some(_), out: None }));
    }

    #[test]
    fn test_input_path_falls_back_to_config() {
        let mut config = BatchProverConfig::default();
        assert!(input_path(None, &config).is_err());

        config.witness.input_path = Some("from-config.json".into());
        assert_eq!(input_path(None, &config).unwrap(), PathBuf::from("from-config.json"));
        assert_eq!(
            input_path(Some("cli.json".into()), &config).unwrap(),
            PathBuf::from("cli.json")
        );
    }
}

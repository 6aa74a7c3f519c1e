//! ClaimCraft CLI
//!
//! Operator tooling for Merkle airdrop distributions: build a tree from a
//! recipient list, look up proofs, record the deployed contract and move
//! records between machines.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use claimcraft_chain::{AccountFacts, DistributionParams, MockChain};
use claimcraft_claim::{ClaimEngine, ClaimOutcome, EngineConfig, ManualProof};
use claimcraft_core::{hex_encode, parse_hash, parse_recipient_list, Address, Hash, Recipient, TokenAmount};
use claimcraft_logging::LogLevel;
use claimcraft_merkle::{encode_leaf, parse_manual_proof, verify_proof, MerkleTree};
use claimcraft_settings::{default_settings_path, Settings};
use claimcraft_store::{DistributionKey, DistributionRecord, FileKvStore, MemoryKvStore, ProofStore};

/// ClaimCraft - Merkle airdrop entitlements
#[derive(Parser)]
#[command(name = "claimcraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the proof store directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a distribution from an `address,amount` list and store it
    Build {
        /// Recipient list (CSV or whitespace separated)
        file: PathBuf,

        /// Also write `{address: proof}` JSON here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the stored amount and proof for an account
    Proof {
        account: Address,

        /// Distribution root
        #[arg(long, conflicts_with = "contract")]
        root: Option<String>,

        /// Deployed distribution contract
        #[arg(long)]
        contract: Option<Address>,
    },

    /// Record the contract a distribution was deployed to
    Attach {
        #[arg(long)]
        root: String,

        #[arg(long)]
        contract: Address,
    },

    /// List stored distributions
    List,

    /// Write a distribution record as JSON
    Export {
        #[arg(long)]
        root: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Validate and store an exported record
    Import { file: PathBuf },

    /// Normalize a pasted proof into 0x-prefixed hashes
    ParseProof { text: String },

    /// Check a proof against a root without touching the store
    Verify {
        account: Address,
        amount: TokenAmount,

        #[arg(long)]
        root: String,

        /// Proof as pasted (JSON array or comma/space separated)
        #[arg(long)]
        proof: String,
    },

    /// Developer tools
    Dev {
        #[command(subcommand)]
        action: DevAction,
    },
}

#[derive(Subcommand)]
enum DevAction {
    /// Walk a claim for a stored distribution against an in-process mock chain
    Simulate {
        #[arg(long)]
        root: String,

        account: Address,

        /// Pasted proof, used when the store has none for this account
        #[arg(long)]
        proof: Option<String>,

        /// Amount covered by --proof
        #[arg(long)]
        amount: Option<TokenAmount>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_settings_path);
    let mut settings = Settings::load_from(&config_path)
        .with_context(|| format!("loading settings from {}", config_path.display()))?;
    if let Some(dir) = &cli.data_dir {
        settings.store.data_dir = dir.clone();
    }

    let level = if cli.verbose { LogLevel::Debug } else { settings.logging.level };
    claimcraft_logging::init(level);

    match cli.command {
        Commands::Build { file, out } => build(&settings, &file, out.as_deref())?,
        Commands::Proof { account, root, contract } => {
            let key = match (root, contract) {
                (Some(root), _) => DistributionKey::Root(parse_root(&root)?),
                (None, Some(contract)) => DistributionKey::Contract(contract),
                (None, None) => bail!("pass --root or --contract"),
            };
            proof(&settings, account, key)?;
        }
        Commands::Attach { root, contract } => {
            let root = parse_root(&root)?;
            open_store(&settings)?
                .attach_distribution_address(&root, contract)
                .context("attaching distribution contract")?;
            println!("Attached {} to {}", contract, hex_encode(root));
        }
        Commands::List => list(&settings)?,
        Commands::Export { root, out } => {
            let root = parse_root(&root)?;
            let json = open_store(&settings)?.export(&root)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Exported {} to {}", hex_encode(root), path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let record = open_store(&settings)?.import(&text).context("importing distribution")?;
            println!(
                "Imported {} ({} recipients)",
                hex_encode(record.root),
                record.recipients.len()
            );
        }
        Commands::ParseProof { text } => {
            let proof = parse_manual_proof(&text)?;
            println!("{}", serde_json::to_string_pretty(&proof_hex(&proof))?);
        }
        Commands::Verify { account, amount, root, proof } => {
            let root = parse_root(&root)?;
            let proof = parse_manual_proof(&proof)?;
            let leaf = encode_leaf(&Recipient::new(account, amount));
            if verify_proof(&leaf, &proof, &root) {
                println!("Valid: {} is entitled to {} under {}", account, amount, hex_encode(root));
            } else {
                bail!("proof does not verify against {}", hex_encode(root));
            }
        }
        Commands::Dev { action } => run_dev(&settings, action).await?,
    }

    Ok(())
}

// ============================================================================
// Store Commands
// ============================================================================

fn open_store(settings: &Settings) -> Result<ProofStore> {
    let backend = FileKvStore::open(&settings.store.data_dir)
        .with_context(|| format!("opening store at {}", settings.store.data_dir.display()))?;
    Ok(ProofStore::open(Arc::new(backend))?)
}

fn parse_root(text: &str) -> Result<Hash> {
    parse_hash(text).with_context(|| format!("invalid root '{}'", text))
}

fn proof_hex(proof: &[Hash]) -> Vec<String> {
    proof.iter().map(hex_encode).collect()
}

fn build(settings: &Settings, file: &Path, out: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let parsed = parse_recipient_list(&text);
    for row in &parsed.skipped {
        warn!("Skipped line {}: {} ({})", row.line, row.content, row.reason);
    }

    let tree = MerkleTree::build(&parsed.recipients).context("building distribution")?;
    open_store(settings)?.save(DistributionRecord::from_tree(&tree))?;
    info!("Stored distribution under {}", settings.store.data_dir.display());

    println!("Root:       {}", hex_encode(tree.root()));
    println!("Recipients: {}", tree.len());
    if !parsed.skipped.is_empty() {
        println!("Skipped:    {} line(s)", parsed.skipped.len());
    }

    if let Some(path) = out {
        let proofs: serde_json::Map<String, serde_json::Value> = tree
            .proofs()
            .into_iter()
            .map(|(address, proof)| (address.to_hex(), serde_json::json!(proof_hex(&proof))))
            .collect();
        std::fs::write(path, serde_json::to_string_pretty(&proofs)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Proofs:     {}", path.display());
    }
    Ok(())
}

fn proof(settings: &Settings, account: Address, key: DistributionKey) -> Result<()> {
    let store = open_store(settings)?;
    match store.lookup(&key, &account) {
        Some(entitlement) => {
            println!("Amount: {}", entitlement.amount);
            println!("Proof:  {}", serde_json::to_string_pretty(&proof_hex(&entitlement.proof))?);
        }
        None => bail!("no stored proof for {} in {}", account, key),
    }
    Ok(())
}

fn list(settings: &Settings) -> Result<()> {
    let store = open_store(settings)?;
    let roots = store.roots();
    if roots.is_empty() {
        println!("No distributions stored");
        return Ok(());
    }
    for root in roots {
        if let Some(record) = store.record(&DistributionKey::Root(root)) {
            let contract = record
                .distribution_contract
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{}  {:>6} recipients  {}", hex_encode(root), record.recipients.len(), contract);
        }
    }
    Ok(())
}

// ============================================================================
// Developer Tools
// ============================================================================

async fn run_dev(settings: &Settings, action: DevAction) -> Result<()> {
    match action {
        DevAction::Simulate { root, account, proof, amount } => {
            let root = parse_root(&root)?;
            simulate(settings, root, account, proof, amount).await
        }
    }
}

async fn simulate(
    settings: &Settings,
    root: Hash,
    account: Address,
    proof: Option<String>,
    amount: Option<TokenAmount>,
) -> Result<()> {
    let registry = settings
        .chain
        .reputation_registry
        .unwrap_or(Address::from_bytes([0x11; 20]));
    let contract = Address::from_bytes([0xD1; 20]);

    let chain = Arc::new(MockChain::new(registry));
    chain.deploy_distribution(contract, DistributionParams::with_root(root));
    chain.set_account(account, AccountFacts::verified(100, 2));

    // in-memory copy so the simulated attach never touches the real store
    let store = Arc::new(ProofStore::open(Arc::new(MemoryKvStore::new()))?);
    let source = open_store(settings)?;
    if let Some(record) = source.record(&DistributionKey::Root(root)) {
        store.save((*record).clone())?;
        store.attach_distribution_address(&root, contract)?;
    }

    let engine = ClaimEngine::new(
        store,
        chain.clone(),
        chain.clone(),
        EngineConfig {
            reputation_registry: Some(registry),
            confirmation_timeout: settings.chain.confirmation_timeout(),
        },
    );

    let manual = match (proof, amount) {
        (Some(proof_text), Some(amount)) => Some(ManualProof { amount, proof_text }),
        (Some(_), None) => bail!("--proof needs --amount"),
        _ => None,
    };

    match engine.submit_claim(account, contract, manual).await? {
        ClaimOutcome::Claimed { amount, receipt } => {
            println!("Claimed {} in tx {} (block {})", amount, receipt.tx, receipt.block_number);
        }
        ClaimOutcome::Blocked { verdict } => println!("Blocked: {}", verdict.reason.message()),
        ClaimOutcome::ProofRequired { error } => match error {
            Some(error) => println!("Proof rejected: {}", error),
            None => println!("No stored proof; pass --proof and --amount"),
        },
        ClaimOutcome::Failed { failure } => println!("Failed: {}", failure),
    }
    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ethers_core::types::U256;
use permit_signer::amount::{format_amount, parse_amount};
use permit_signer::config::{self, PermitConfig};
use permit_signer::eip712::{domain_separator, TypedData, TypedDataSigner};
use permit_signer::permit::{PermitDomain, PermitMessage, PermitReport};
use permit_signer::rpc::{FixedNonce, NonceSource, RpcClient};
use permit_signer::utils::crypto::to_checksum_address;
use permit_signer::utils::logging;
use permit_signer::{log_debug, log_error, log_info, log_warn, PermitError};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

/// Sign EIP-712 typed data and check that the signature recovers the signer.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit debug log lines on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign an EIP-2612 permit for the configured owner, spender and token
    Permit(PermitArgs),
    /// Sign EIP-712 typed data JSON read from a file or stdin
    TypedData(TypedDataArgs),
}

#[derive(Args, Debug)]
struct PermitArgs {
    /// Owner private key (hex)
    #[arg(long, env = config::PRIVATE_KEY, hide_env_values = true)]
    private_key: Option<String>,

    #[arg(long, env = config::OWNER)]
    owner: Option<String>,

    #[arg(long, env = config::SPENDER)]
    spender: Option<String>,

    /// Token contract (EIP-712 verifying contract)
    #[arg(long, env = config::CONTRACT)]
    contract: Option<String>,

    #[arg(long, env = config::RPC_URL)]
    rpc_url: Option<String>,

    #[arg(long, env = config::CHAIN_ID)]
    chain_id: Option<String>,

    #[arg(long, env = config::TOKEN_NAME)]
    token_name: Option<String>,

    #[arg(long, env = config::TOKEN_VERSION)]
    token_version: Option<String>,

    /// Decimal token amount, e.g. 0.5
    #[arg(long, env = config::AMOUNT)]
    amount: Option<String>,

    #[arg(long, env = config::DECIMALS)]
    decimals: Option<String>,

    /// Permit lifetime in seconds from now
    #[arg(long, env = config::DEADLINE_SECS)]
    deadline_secs: Option<String>,

    /// Absolute deadline (unix seconds); overrides --deadline-secs
    #[arg(long)]
    deadline: Option<u64>,

    /// Use this nonce instead of reading `nonces(owner)` from chain
    #[arg(long)]
    nonce: Option<String>,

    /// Compare the local domain separator with the token's DOMAIN_SEPARATOR() (needs RPC_URL)
    #[arg(long)]
    check_domain: bool,
}

impl PermitArgs {
    fn settings(&self) -> HashMap<&'static str, String> {
        let pairs = [
            (config::PRIVATE_KEY, &self.private_key),
            (config::OWNER, &self.owner),
            (config::SPENDER, &self.spender),
            (config::CONTRACT, &self.contract),
            (config::RPC_URL, &self.rpc_url),
            (config::CHAIN_ID, &self.chain_id),
            (config::TOKEN_NAME, &self.token_name),
            (config::TOKEN_VERSION, &self.token_version),
            (config::AMOUNT, &self.amount),
            (config::DECIMALS, &self.decimals),
            (config::DEADLINE_SECS, &self.deadline_secs),
        ];

        pairs
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
            .collect()
    }
}

#[derive(Args, Debug)]
struct TypedDataArgs {
    /// Typed data JSON file; stdin when omitted
    path: Option<PathBuf>,

    /// Signer private key (hex)
    #[arg(long, env = config::PRIVATE_KEY, hide_env_values = true)]
    private_key: Option<String>,
}

fn main() -> Result<()> {
    // .env must be loaded before clap reads env fallbacks
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::set_debug(cli.verbose);

    let report = match &cli.command {
        Command::Permit(args) => run_permit(args)?,
        Command::TypedData(args) => run_typed_data(args)?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }

    if !report.valid {
        log_error!(
            "verify",
            "Signature does not recover the signer",
            recovered_address = report.recovered,
            expected_signer = report.expected_signer,
        );
        bail!(
            "recovered {} but expected {}",
            report.recovered,
            report.expected_signer
        );
    }
    Ok(())
}

fn run_permit(args: &PermitArgs) -> Result<PermitReport> {
    let settings = args.settings();
    let config = PermitConfig::from_lookup(|key| settings.get(key).cloned())?;
    log_debug!(
        "config",
        "Loaded permit config",
        chain_id = config.chain_id,
        token = to_checksum_address(config.token.as_bytes()),
    );

    let signer = TypedDataSigner::from_hex(&config.private_key).map_err(PermitError::from)?;
    if signer.address() != config.owner.to_fixed_bytes() {
        log_warn!(
            "permit",
            "Signing key does not control OWNER; the token will reject this permit",
            signer = signer.checksum_address(),
            owner = to_checksum_address(config.owner.as_bytes()),
        );
    }

    let domain = PermitDomain {
        name: config.token_name.clone(),
        version: config.token_version.clone(),
        chain_id: config.chain_id,
        verifying_contract: config.token,
    };

    if args.check_domain {
        check_domain(&RpcClient::new(config.require_rpc_url()?)?, &domain)?;
    }

    let nonce_source: Box<dyn NonceSource> = match &args.nonce {
        Some(raw) => {
            let nonce = Some(raw.trim())
                .filter(|digits| !digits.is_empty())
                .and_then(|digits| U256::from_dec_str(digits).ok())
                .ok_or_else(|| PermitError::invalid_input(format!("invalid --nonce {:?}", raw)))?;
            Box::new(FixedNonce(nonce))
        }
        None => Box::new(RpcClient::new(config.require_rpc_url()?)?),
    };
    let nonce = nonce_source.nonce(config.token, config.owner)?;

    let deadline = match args.deadline {
        Some(deadline) => deadline,
        None => config.deadline_from(chrono::Utc::now().timestamp())?,
    };

    let message = PermitMessage {
        owner: config.owner,
        spender: config.spender,
        value: parse_amount(&config.amount, config.decimals)?,
        nonce,
        deadline: U256::from(deadline),
    };

    log_info!(
        "permit",
        "Signing permit",
        owner = to_checksum_address(message.owner.as_bytes()),
        spender = to_checksum_address(message.spender.as_bytes()),
        amount = format_amount(message.value, config.decimals)?,
        nonce = message.nonce,
        deadline = deadline,
    );

    let report = PermitReport::build(&signer, &message.to_typed_data(&domain))?;
    log_info!(
        "permit",
        "Permit signed",
        digest = report.digest,
        valid = report.valid,
    );
    Ok(report)
}

fn check_domain(client: &RpcClient, domain: &PermitDomain) -> Result<()> {
    let chain_id = client.chain_id()?;
    if chain_id != domain.chain_id {
        log_warn!(
            "rpc",
            "RPC endpoint serves a different chain",
            rpc_chain_id = chain_id,
            chain_id = domain.chain_id,
        );
    }

    let onchain = client.domain_separator(domain.verifying_contract)?;
    let local = domain_separator(&domain.to_eip712()).map_err(PermitError::from)?;
    if onchain != local {
        bail!(
            "domain separator mismatch: token has 0x{}, local domain gives 0x{}",
            hex::encode(onchain),
            hex::encode(local)
        );
    }

    log_info!(
        "rpc",
        "Domain separator matches token",
        domain_separator = format!("0x{}", hex::encode(local)),
    );
    Ok(())
}

fn run_typed_data(args: &TypedDataArgs) -> Result<PermitReport> {
    let private_key = args
        .private_key
        .as_deref()
        .ok_or_else(|| PermitError::config_missing(config::PRIVATE_KEY))?;

    let payload = match &args.path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let typed_data = TypedData::from_json(&payload).map_err(PermitError::from)?;
    let signer = TypedDataSigner::from_hex(private_key).map_err(PermitError::from)?;

    log_info!(
        "typed-data",
        "Signing typed data",
        primary_type = typed_data.primary_type,
        signer = signer.checksum_address(),
    );
    Ok(PermitReport::build(&signer, &typed_data)?)
}

// fundledger CLI - drives the ledger and the fund intake against a local sled store

use chrono::Utc;
use clap::{Parser, Subcommand};
use fundledger::access::{CallContext, Capability, CapabilityCheck, PauseSwitch, RoleRegistry};
use fundledger::fund::{FundIntake, InMemoryToken, IntakeConfig, ValueTransfer};
use fundledger::identity::{Address, ExternalRef, Keypair};
use fundledger::ledger::{AmendRequest, ContributionLedger};
use fundledger::storage::LedgerStore;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "fundledger", version, about = "Contribution ledger and fund intake")]
struct Cli {
    /// Directory holding the sled database
    #[arg(long, env = "FUNDLEDGER_DATA_DIR", default_value = "./fundledger-data", global = true)]
    data_dir: PathBuf,

    /// Log filter (overridden by RUST_LOG)
    #[arg(long, env = "FUNDLEDGER_LOG", default_value = "fundledger=info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a keypair and print its address
    Keygen,
    /// Manage capabilities
    Roles {
        #[command(subcommand)]
        action: RolesCommand,
    },
    /// Halt every mutating operation
    Pause {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
    },
    /// Lift the halt
    Resume {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
    },
    /// Contribution ledger operations
    Ledger {
        #[command(subcommand)]
        action: LedgerCommand,
    },
    /// Fund intake operations
    Fund {
        #[command(subcommand)]
        action: FundCommand,
    },
}

#[derive(Subcommand)]
enum RolesCommand {
    /// Create the role registry with one all-capability admin
    Init {
        #[arg(long)]
        admin: Address,
    },
    Grant {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        account: Address,
        #[arg(long)]
        capability: Capability,
    },
    Revoke {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        account: Address,
        #[arg(long)]
        capability: Capability,
    },
    Show {
        #[arg(long)]
        account: Address,
    },
}

#[derive(Subcommand)]
enum LedgerCommand {
    Append {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        account: Address,
        #[arg(long)]
        amount: u64,
        /// Event clock value (defaults to now)
        #[arg(long)]
        clock: Option<u64>,
        /// 32-byte hex reference
        #[arg(long)]
        reference: Option<ExternalRef>,
        #[arg(long, default_value = "")]
        note: String,
    },
    Amend {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        account: Address,
        #[arg(long)]
        index: usize,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        clock: Option<u64>,
        #[arg(long)]
        reference: Option<ExternalRef>,
        /// Replace the note (kept as-is when omitted)
        #[arg(long)]
        note: Option<String>,
    },
    Overwrite {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        account: Address,
        #[arg(long)]
        total: u64,
        #[arg(long, default_value = "")]
        note: String,
    },
    Show {
        #[arg(long)]
        account: Address,
    },
    Audit,
}

#[derive(Subcommand)]
enum FundCommand {
    Init {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        custody: Address,
        #[arg(long = "treasury", required = true)]
        treasury: Vec<Address>,
        #[arg(long, default_value_t = 0)]
        min: u64,
        #[arg(long, default_value_t = 0)]
        max: u64,
    },
    /// Credit test funds on the local token
    Mint {
        /// Admin's hex secret key
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        account: Address,
        #[arg(long)]
        amount: u64,
    },
    /// Let the custody account pull funds from the signer
    Approve {
        /// Owner's hex secret key
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        amount: u64,
    },
    Contribute {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        amount: u64,
    },
    Limits {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        min: u64,
        #[arg(long)]
        max: u64,
    },
    Withdraw {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        to: Address,
        #[arg(long)]
        amount: u64,
    },
    AddTreasury {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        wallet: Address,
    },
    RemoveTreasury {
        /// Caller's hex secret key, as printed by `keygen`
        #[arg(long, env = "FUNDLEDGER_SECRET", hide_env_values = true)]
        secret: Keypair,
        #[arg(long)]
        wallet: Address,
    },
    Show,
}

/// Everything loaded from the store for one invocation
struct Session {
    store: LedgerStore,
    roles: RoleRegistry,
    pause: PauseSwitch,
}

impl Session {
    fn open(data_dir: &Path) -> CliResult<Self> {
        let store = LedgerStore::open(data_dir)?;
        let roles = store.load_roles()?.unwrap_or_default();
        let pause = store.load_pause()?;
        Ok(Self {
            store,
            roles,
            pause,
        })
    }

    /// The caller is whoever holds `signer`'s secret key
    fn context(&self, signer: &Keypair) -> CallContext<'_> {
        CallContext::new(signer.address(), now(), &self.roles, &self.pause)
    }

    fn ledger(&self) -> CliResult<ContributionLedger> {
        Ok(self.store.load_ledger()?.unwrap_or_default())
    }

    fn fund(&self) -> CliResult<FundIntake> {
        self.store
            .load_fund()?
            .ok_or_else(|| "fund not initialised; run `fund init` first".into())
    }

    fn token(&self) -> CliResult<InMemoryToken> {
        Ok(self.store.load_token()?.unwrap_or_default())
    }

    /// Check a capability outside a `CallContext` and return the signer's address
    fn require_role(&self, signer: &Keypair, capability: Capability) -> CliResult<Address> {
        let caller = signer.address();
        if !self.roles.has_capability(&caller, capability) {
            return Err(format!("{} lacks capability '{}'", caller, capability).into());
        }
        Ok(caller)
    }
}

fn now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    // Key generation needs no store
    if matches!(cli.command, Command::Keygen) {
        return keygen();
    }

    let mut session = Session::open(&cli.data_dir)?;
    info!(data_dir = %cli.data_dir.display(), "store opened");

    match cli.command {
        Command::Keygen => keygen()?,
        Command::Roles { action } => run_roles(&mut session, action)?,
        Command::Pause { secret } => {
            let caller = session.require_role(&secret, Capability::Pauser)?;
            session.pause.halt();
            session.store.save_pause(&session.pause)?;
            info!(%caller, "system halted");
            println!("halted");
        }
        Command::Resume { secret } => {
            let caller = session.require_role(&secret, Capability::Pauser)?;
            session.pause.resume();
            session.store.save_pause(&session.pause)?;
            info!(%caller, "system resumed");
            println!("resumed");
        }
        Command::Ledger { action } => run_ledger(&session, action)?,
        Command::Fund { action } => run_fund(&session, action)?,
    }

    session.store.flush()?;
    Ok(())
}

fn keygen() -> CliResult {
    let keypair = Keypair::generate();
    println!("address: {}", keypair.address());
    println!("secret:  {}", keypair.to_hex());
    Ok(())
}

fn run_roles(session: &mut Session, action: RolesCommand) -> CliResult {
    match action {
        RolesCommand::Init { admin } => {
            if session.store.load_roles()?.is_some() {
                return Err("role registry already initialised".into());
            }
            session.roles = RoleRegistry::with_admin(admin);
            session.store.save_roles(&session.roles)?;
            println!("admin: {}", admin);
        }
        RolesCommand::Grant {
            secret,
            account,
            capability,
        } => {
            let caller = session.require_role(&secret, Capability::Admin)?;
            session.roles.grant(account, capability);
            session.store.save_roles(&session.roles)?;
            info!(%caller, %account, %capability, "capability granted");
            println!("granted {} to {}", capability, account);
        }
        RolesCommand::Revoke {
            secret,
            account,
            capability,
        } => {
            let caller = session.require_role(&secret, Capability::Admin)?;
            if !session.roles.revoke(&account, capability) {
                return Err(format!("{} does not hold '{}'", account, capability).into());
            }
            session.store.save_roles(&session.roles)?;
            info!(%caller, %account, %capability, "capability revoked");
            println!("revoked {} from {}", capability, account);
        }
        RolesCommand::Show { account } => {
            for capability in session.roles.capabilities_of(&account) {
                println!("{}", capability);
            }
        }
    }
    Ok(())
}

fn run_ledger(session: &Session, action: LedgerCommand) -> CliResult {
    let mut ledger = session.ledger()?;

    match action {
        LedgerCommand::Append {
            secret,
            account,
            amount,
            clock,
            reference,
            note,
        } => {
            let ctx = session.context(&secret);
            let clock = clock.unwrap_or_else(|| ctx.now());
            let reference = reference.unwrap_or_default();
            let index = ledger.append(&ctx, account, amount, clock, reference, note)?;
            println!("appended entry {} for {}", index, account);
        }
        LedgerCommand::Amend {
            secret,
            account,
            index,
            amount,
            clock,
            reference,
            note,
        } => {
            let ctx = session.context(&secret);
            let mut request = AmendRequest::new(
                index,
                amount,
                clock.unwrap_or_else(|| ctx.now()),
                reference.unwrap_or_default(),
            );
            if let Some(note) = note {
                request = request.with_note(note);
            }
            ledger.amend(&ctx, account, request)?;
            println!("amended entry {} for {}", index, account);
        }
        LedgerCommand::Overwrite {
            secret,
            account,
            total,
            note,
        } => {
            let ctx = session.context(&secret);
            ledger.overwrite_total(&ctx, account, total, note)?;
            println!("total for {} set to {}", account, total);
        }
        LedgerCommand::Show { account } => {
            println!("account: {}", account);
            println!("total:   {}", ledger.total_of(&account));
            for (index, entry) in ledger.history(&account).iter().enumerate() {
                println!(
                    "  [{}] {:>12} at {} {:?} ref={} note={:?}",
                    index,
                    entry.amount(),
                    entry.recorded_at(),
                    entry.kind(),
                    entry.external_ref(),
                    entry.note()
                );
            }
            return Ok(());
        }
        LedgerCommand::Audit => {
            let report = ledger.reconcile()?;
            println!("grand total:    {}", report.grand_total);
            println!("sum of totals:  {}", report.sum_of_totals);
            println!("accounts:       {}", report.accounts);
            println!("balanced:       {}", report.is_balanced());
            for d in &report.diverged {
                println!("  diverged {} total={} history={}", d.account, d.total, d.history_sum);
            }
            return Ok(());
        }
    }

    for event in ledger.poll_events() {
        println!("event: {:?}", event);
    }
    session.store.save_ledger(&ledger)?;
    Ok(())
}

fn run_fund(session: &Session, action: FundCommand) -> CliResult {
    match action {
        FundCommand::Init {
            secret,
            custody,
            treasury,
            min,
            max,
        } => {
            let caller = session.require_role(&secret, Capability::Admin)?;
            if session.store.load_fund()?.is_some() {
                return Err("fund already initialised".into());
            }
            let config = IntakeConfig::new(custody)
                .with_treasury(treasury)
                .with_min_contribution(min)
                .with_max_contribution(max);
            let intake = FundIntake::new(config)?;
            session.store.save_fund(&intake)?;
            info!(%caller, %custody, "fund initialised");
            println!("fund initialised with custody {}", custody);
        }
        FundCommand::Mint {
            secret,
            account,
            amount,
        } => {
            session.require_role(&secret, Capability::Admin)?;
            let mut token = session.token()?;
            token.mint(account, amount)?;
            session.store.save_token(&token)?;
            println!("minted {} to {}", amount, account);
        }
        FundCommand::Approve { secret, amount } => {
            let owner = secret.address();
            let intake = session.fund()?;
            let mut token = session.token()?;
            token.approve(owner, intake.custody(), amount);
            session.store.save_token(&token)?;
            println!("{} approved {} for custody", owner, amount);
        }
        FundCommand::Contribute { secret, amount } => {
            let (mut intake, mut token) = (session.fund()?, session.token()?);
            let ctx = session.context(&secret);
            let receipt = intake.contribute(&ctx, &mut token, amount)?;
            println!(
                "accepted {} from {} (cumulative {})",
                receipt.amount, receipt.contributor, receipt.contributed
            );
            commit_fund(session, &mut intake, &token)?;
        }
        FundCommand::Limits { secret, min, max } => {
            let (mut intake, token) = (session.fund()?, session.token()?);
            intake.update_limits(&session.context(&secret), min, max)?;
            println!("limits set to min={} max={}", min, max);
            commit_fund(session, &mut intake, &token)?;
        }
        FundCommand::Withdraw { secret, to, amount } => {
            let (mut intake, mut token) = (session.fund()?, session.token()?);
            let ctx = session.context(&secret);
            intake.emergency_withdraw(&ctx, &mut token, to, amount)?;
            println!("withdrew {} to {}", amount, to);
            commit_fund(session, &mut intake, &token)?;
        }
        FundCommand::AddTreasury { secret, wallet } => {
            let (mut intake, token) = (session.fund()?, session.token()?);
            intake.add_treasury_wallet(&session.context(&secret), wallet)?;
            println!("added treasury wallet {}", wallet);
            commit_fund(session, &mut intake, &token)?;
        }
        FundCommand::RemoveTreasury { secret, wallet } => {
            let (mut intake, token) = (session.fund()?, session.token()?);
            intake.remove_treasury_wallet(&session.context(&secret), wallet)?;
            println!("removed treasury wallet {}", wallet);
            commit_fund(session, &mut intake, &token)?;
        }
        FundCommand::Show => {
            let (intake, token) = (session.fund()?, session.token()?);
            let limits = intake.limits();
            println!("custody:           {}", intake.custody());
            println!("custody balance:   {}", intake.custody_balance(&token));
            println!("total contributed: {}", intake.total_contributed());
            println!("limits:            min={} max={}", limits.min(), limits.max());
            for wallet in intake.treasury_members() {
                println!("  treasury {}", wallet);
            }
            for contributor in intake.contributors() {
                println!(
                    "  contributor {} contributed={} balance={}",
                    contributor,
                    intake.contributed_of(&contributor),
                    token.balance_of(&contributor)
                );
            }
        }
    }
    Ok(())
}

fn commit_fund(session: &Session, intake: &mut FundIntake, token: &InMemoryToken) -> CliResult {
    for event in intake.poll_events() {
        println!("event: {:?}", event);
    }
    session.store.save_fund_with_token(intake, token)?;
    Ok(())
}

//! # Scenarios
//!
//! A scenario is a JSON document naming a token, its participants, the
//! compliance modules it starts with and a list of steps. The runner builds
//! an in-memory ledger (coprocessor, identity and agent registries, a manual
//! clock, the token and one approval manager) and replays the steps in
//! order.
//!
//! Plaintext amounts in the file are encrypted on the fly for whichever
//! participant submits them. A step that the ledger rejects is recorded in
//! the report and the replay carries on.
//!
//! ```json
//! { "op": "transfer", "from": "alice", "to": "bob", "amount": 500 }
//! { "op": "module_call", "module": "monthly",
//!   "call": { "function": "set_supply_limit", "args": 1000 } }
//! ```
//!
//! Steps refer to the approval manager as `"dva"`.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use shroud_contracts::compliance::{
    ComplianceModule, CountryAllowModule, ExchangeMonthlyLimitsModule, ModuleCall,
    SupplyLimitModule, TimeExchangeLimitsModule, TransferRestrictModule,
};
use shroud_contracts::dva::{DelegatedApproval, TransferId};
use shroud_contracts::{
    ApprovalTransferManager, ComplianceEngine, ConfidentialToken, TokenConfig, TokenServices,
};
use shroud_protocol::clock::ManualClock;
use shroud_protocol::crypto::hash::sha256;
use shroud_protocol::crypto::keys::Keypair;
use shroud_protocol::fhe::{Euint64, FheContext};
use shroud_protocol::identity::{AgentRegistry, Address, IdentityId, IdentityRegistry};

/// Name under which steps refer to the approval manager.
pub const MANAGER: &str = "dva";

const DEMO: &str = include_str!("../scenarios/dva_demo.json");

// ---------------------------------------------------------------------------
// Scenario file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub token: TokenSpec,
    /// Participant that owns the token and its compliance engine.
    pub owner: String,
    /// Initial clock reading; the current time when absent.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenSpec {
    fn default() -> Self {
        Self {
            name: "Scenario Token".into(),
            symbol: "SCN".into(),
            decimals: 6,
        }
    }
}

/// A wallet. Its key is derived from the name, so delegated approvals can
/// be signed during replay.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Participant {
    pub name: String,
    #[serde(default = "default_country")]
    pub country: u16,
    #[serde(default)]
    pub agent: bool,
    #[serde(default = "default_verified")]
    pub verified: bool,
}

fn default_country() -> u16 {
    250
}

fn default_verified() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    pub kind: ModuleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    ExchangeMonthlyLimits,
    TimeExchangeLimits,
    SupplyLimit,
    TransferRestrict,
    CountryAllow,
}

/// A module call with plaintext amounts and participant names.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "function", content = "args", rename_all = "snake_case")]
pub enum CallSpec {
    AddExchangeId(String),
    RemoveExchangeId(String),
    SetExchangeMonthlyLimit {
        exchange: String,
        limit: u64,
    },
    SetExchangeTimeLimit {
        exchange: String,
        window_secs: i64,
        limit: u64,
    },
    SetSupplyLimit(u64),
    AllowUser(String),
    DisallowUser(String),
    BatchAllowUsers(Vec<String>),
    AddAllowedCountry(u16),
    RemoveAllowedCountry(u16),
    BatchAllowCountries(Vec<u16>),
}

/// One replayed operation. Agent-only steps act as `by`, or as the first
/// agent participant when `by` is absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Mint {
        to: String,
        amount: u64,
        #[serde(default)]
        by: Option<String>,
    },
    Transfer {
        from: String,
        to: String,
        amount: u64,
    },
    Approve {
        owner: String,
        spender: String,
        amount: u64,
    },
    TransferFrom {
        spender: String,
        from: String,
        to: String,
        amount: u64,
    },
    Freeze {
        account: String,
        amount: u64,
        #[serde(default)]
        by: Option<String>,
    },
    Unfreeze {
        account: String,
        amount: u64,
        #[serde(default)]
        by: Option<String>,
    },
    FreezeAddress {
        account: String,
        frozen: bool,
        #[serde(default)]
        by: Option<String>,
    },
    ForcedTransfer {
        from: String,
        to: String,
        amount: u64,
        #[serde(default)]
        by: Option<String>,
    },
    Burn {
        from: String,
        amount: u64,
        #[serde(default)]
        by: Option<String>,
    },
    Pause {
        #[serde(default)]
        by: Option<String>,
    },
    Unpause {
        #[serde(default)]
        by: Option<String>,
    },
    SetCriteria {
        #[serde(default)]
        recipient: bool,
        #[serde(default)]
        agent: bool,
        #[serde(default)]
        sequential: bool,
        #[serde(default)]
        additional: Vec<String>,
        #[serde(default)]
        by: Option<String>,
    },
    /// Open an approval-gated transfer, remembered under `label`.
    Initiate {
        label: String,
        from: String,
        to: String,
        amount: u64,
    },
    ApproveTransfer {
        transfer: String,
        by: String,
    },
    DelegateApprove {
        transfer: String,
        signers: Vec<String>,
    },
    RejectTransfer {
        transfer: String,
        by: String,
    },
    CancelTransfer {
        transfer: String,
        by: String,
    },
    AdvanceDays {
        days: i64,
    },
    AddModule(ModuleSpec),
    ModuleCall {
        module: String,
        call: CallSpec,
    },
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::Mint { .. } => "mint",
            Step::Transfer { .. } => "transfer",
            Step::Approve { .. } => "approve",
            Step::TransferFrom { .. } => "transfer_from",
            Step::Freeze { .. } => "freeze",
            Step::Unfreeze { .. } => "unfreeze",
            Step::FreezeAddress { .. } => "freeze_address",
            Step::ForcedTransfer { .. } => "forced_transfer",
            Step::Burn { .. } => "burn",
            Step::Pause { .. } => "pause",
            Step::Unpause { .. } => "unpause",
            Step::SetCriteria { .. } => "set_criteria",
            Step::Initiate { .. } => "initiate",
            Step::ApproveTransfer { .. } => "approve_transfer",
            Step::DelegateApprove { .. } => "delegate_approve",
            Step::RejectTransfer { .. } => "reject_transfer",
            Step::CancelTransfer { .. } => "cancel_transfer",
            Step::AdvanceDays { .. } => "advance_days",
            Step::AddModule(_) => "add_module",
            Step::ModuleCall { .. } => "module_call",
        }
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid scenario")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// The bundled approval-gated transfer walkthrough.
    pub fn demo() -> Result<Self> {
        Self::from_json(DEMO)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Report {
    pub scenario: String,
    pub steps: Vec<StepReport>,
    /// Effect records emitted while building the ledger.
    pub setup_records: usize,
    pub total_records: usize,
    pub total_supply: u64,
    pub holders: BTreeMap<String, HolderView>,
    pub transfers: BTreeMap<String, TransferView>,
}

impl Report {
    pub fn rejected(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.ok)
    }
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Effect records the step emitted.
    pub records: usize,
}

/// Balances as the holder decrypts them.
#[derive(Debug, Serialize)]
pub struct HolderView {
    pub address: String,
    pub balance: u64,
    pub frozen: u64,
}

#[derive(Debug, Serialize)]
pub struct TransferView {
    pub id: String,
    pub status: String,
    pub pending_approvals: usize,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Build a fresh ledger for `scenario` and replay every step.
pub fn replay(scenario: &Scenario) -> Result<Report> {
    let mut runner = Runner::new(scenario)?;
    let setup_records = runner.drain_records();
    info!(scenario = %scenario.name, steps = scenario.steps.len(), "replaying");

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = runner.apply(step);
        let records = runner.drain_records();
        let report = match outcome {
            Ok(detail) => StepReport {
                index,
                op: step.op(),
                ok: true,
                detail,
                error: None,
                records,
            },
            Err(err) => {
                let error = format!("{err:#}");
                warn!(index, op = step.op(), %error, "step rejected");
                StepReport {
                    index,
                    op: step.op(),
                    ok: false,
                    detail: None,
                    error: Some(error),
                    records,
                }
            }
        };
        steps.push(report);
    }

    let total_records = setup_records + steps.iter().map(|s| s.records).sum::<usize>();
    Ok(Report {
        scenario: scenario.name.clone(),
        steps,
        setup_records,
        total_records,
        total_supply: runner.fhe.decrypt(runner.token.total_supply(), runner.owner)?,
        holders: runner.holders()?,
        transfers: runner.transfer_views(),
    })
}

struct Runner {
    fhe: Arc<FheContext>,
    clock: Arc<ManualClock>,
    token: ConfidentialToken,
    dva: ApprovalTransferManager,
    owner: Address,
    default_agent: Option<Address>,
    addresses: BTreeMap<String, Address>,
    keys: HashMap<String, Keypair>,
    modules: HashMap<String, Address>,
    transfers: BTreeMap<String, TransferId>,
}

impl Runner {
    fn new(scenario: &Scenario) -> Result<Self> {
        let fhe = Arc::new(FheContext::new());
        let identity = Arc::new(IdentityRegistry::new());
        let agents = Arc::new(AgentRegistry::new());
        let clock = Arc::new(ManualClock::new(scenario.start.unwrap_or_else(Utc::now)));

        let mut addresses = BTreeMap::new();
        let mut keys = HashMap::new();
        for p in &scenario.participants {
            if p.name == MANAGER {
                bail!("participant name {MANAGER:?} is reserved for the approval manager");
            }
            let keypair = Keypair::from_seed(&sha256(p.name.as_bytes()));
            let address = Address::from_public_key(&keypair.public_key());
            if addresses.insert(p.name.clone(), address).is_some() {
                bail!("duplicate participant {:?}", p.name);
            }
            keys.insert(p.name.clone(), keypair);
        }
        let owner = *addresses
            .get(&scenario.owner)
            .with_context(|| format!("owner {:?} is not a participant", scenario.owner))?;

        let config = TokenConfig {
            name: scenario.token.name.clone(),
            symbol: scenario.token.symbol.clone(),
            decimals: scenario.token.decimals,
            owner,
        };
        let asset = config.address();

        let mut default_agent = None;
        for p in &scenario.participants {
            let address = addresses[&p.name];
            if p.verified {
                identity.enroll(asset, address, p.country);
            } else {
                identity.register(address, IdentityId(address), p.country);
            }
            if p.agent {
                agents.add_agent(asset, address);
                default_agent.get_or_insert(address);
            }
        }

        let manager = Address::derive(&format!("dva/{}", config.symbol));
        identity.enroll(asset, manager, default_country());
        addresses.insert(MANAGER.to_string(), manager);

        let compliance = ComplianceEngine::new(
            Address::derive(&format!("compliance/{}", config.symbol)),
            owner,
            Arc::clone(&fhe),
        );
        let services = TokenServices {
            fhe: Arc::clone(&fhe),
            identity,
            agents,
            clock: clock.clone(),
        };
        let token =
            ConfidentialToken::new(config, services, compliance).context("failed to create token")?;

        let mut runner = Self {
            fhe,
            clock,
            token,
            dva: ApprovalTransferManager::new(manager),
            owner,
            default_agent,
            addresses,
            keys,
            modules: HashMap::new(),
            transfers: BTreeMap::new(),
        };
        for spec in &scenario.modules {
            runner
                .add_module(spec)
                .with_context(|| format!("failed to add module {:?}", spec.name))?;
        }
        Ok(runner)
    }

    /// Apply one step. `Ok` carries a human-readable note on what happened.
    fn apply(&mut self, step: &Step) -> Result<Option<String>> {
        match step {
            Step::Mint { to, amount, by } => {
                let agent = self.agent(by)?;
                let to = self.address(to)?;
                let amount = self.encrypt(agent, *amount)?;
                let minted = self.token.mint(agent, to, amount)?;
                self.note("minted", minted, agent)
            }
            Step::Transfer { from, to, amount } => {
                let (from, to) = (self.address(from)?, self.address(to)?);
                let amount = self.encrypt(from, *amount)?;
                let moved = self.token.transfer(from, to, amount)?;
                self.note("moved", moved, from)
            }
            Step::Approve {
                owner,
                spender,
                amount,
            } => {
                let (owner, spender) = (self.address(owner)?, self.address(spender)?);
                let amount = self.encrypt(owner, *amount)?;
                self.token.approve(owner, spender, amount)?;
                Ok(None)
            }
            Step::TransferFrom {
                spender,
                from,
                to,
                amount,
            } => {
                let spender = self.address(spender)?;
                let (from, to) = (self.address(from)?, self.address(to)?);
                let amount = self.encrypt(spender, *amount)?;
                let moved = self.token.transfer_from(spender, from, to, amount)?;
                self.note("moved", moved, spender)
            }
            Step::Freeze {
                account,
                amount,
                by,
            } => {
                let agent = self.agent(by)?;
                let account = self.address(account)?;
                let amount = self.encrypt(agent, *amount)?;
                let frozen = self.token.freeze_partial_tokens(agent, account, amount)?;
                self.note("froze", frozen, agent)
            }
            Step::Unfreeze {
                account,
                amount,
                by,
            } => {
                let agent = self.agent(by)?;
                let account = self.address(account)?;
                let amount = self.encrypt(agent, *amount)?;
                let unfrozen = self.token.unfreeze_partial_tokens(agent, account, amount)?;
                self.note("unfroze", unfrozen, agent)
            }
            Step::FreezeAddress {
                account,
                frozen,
                by,
            } => {
                let agent = self.agent(by)?;
                let account = self.address(account)?;
                self.token.set_address_frozen(agent, account, *frozen)?;
                Ok(None)
            }
            Step::ForcedTransfer {
                from,
                to,
                amount,
                by,
            } => {
                let agent = self.agent(by)?;
                let (from, to) = (self.address(from)?, self.address(to)?);
                let amount = self.encrypt(agent, *amount)?;
                let moved = self.token.forced_transfer(agent, from, to, amount)?;
                self.note("moved", moved, agent)
            }
            Step::Burn { from, amount, by } => {
                let agent = self.agent(by)?;
                let from = self.address(from)?;
                let amount = self.encrypt(agent, *amount)?;
                let burnt = self.token.burn(agent, from, amount)?;
                self.note("burnt", burnt, agent)
            }
            Step::Pause { by } => {
                let agent = self.agent(by)?;
                self.token.pause(agent)?;
                Ok(None)
            }
            Step::Unpause { by } => {
                let agent = self.agent(by)?;
                self.token.unpause(agent)?;
                Ok(None)
            }
            Step::SetCriteria {
                recipient,
                agent,
                sequential,
                additional,
                by,
            } => {
                let caller = self.agent(by)?;
                let additional = additional
                    .iter()
                    .map(|name| self.address(name))
                    .collect::<Result<Vec<_>>>()?;
                let hash = self.dva.set_approval_criteria(
                    &self.token,
                    caller,
                    *recipient,
                    *agent,
                    *sequential,
                    additional,
                )?;
                Ok(Some(format!("criteria {hash}")))
            }
            Step::Initiate {
                label,
                from,
                to,
                amount,
            } => {
                if self.transfers.contains_key(label) {
                    bail!("transfer label {label:?} already used");
                }
                let (from, to) = (self.address(from)?, self.address(to)?);
                let input = self.fhe.encrypt_input(*amount, from)?;
                let id = self.dva.initiate_transfer(&mut self.token, from, to, &input)?;
                self.transfers.insert(label.clone(), id);
                let escrowed = self
                    .dva
                    .get_transfer(id)
                    .map(|t| t.actual_amount)
                    .ok_or_else(|| anyhow!("transfer {id} vanished"))?;
                let escrowed = self.fhe.decrypt(escrowed, from)?;
                Ok(Some(format!("{label} = {id}, escrowed {escrowed}")))
            }
            Step::ApproveTransfer { transfer, by } => {
                let id = self.transfer(transfer)?;
                let by = self.address(by)?;
                let outcome = self.dva.approve_transfer(&mut self.token, by, id)?;
                Ok(Some(format!("{outcome:?}")))
            }
            Step::DelegateApprove { transfer, signers } => {
                let id = self.transfer(transfer)?;
                let manager = self.dva.address();
                let approvals = signers
                    .iter()
                    .map(|name| {
                        self.keys
                            .get(name)
                            .map(|kp| DelegatedApproval::sign(kp, manager, id))
                            .ok_or_else(|| anyhow!("unknown signer {name:?}"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let outcome = self
                    .dva
                    .delegate_approve_transfer(&mut self.token, id, &approvals)?;
                Ok(Some(format!("{outcome:?}")))
            }
            Step::RejectTransfer { transfer, by } => {
                let id = self.transfer(transfer)?;
                let by = self.address(by)?;
                let outcome = self.dva.reject_transfer(&mut self.token, by, id)?;
                Ok(Some(format!("{outcome:?}")))
            }
            Step::CancelTransfer { transfer, by } => {
                let id = self.transfer(transfer)?;
                let by = self.address(by)?;
                self.dva.cancel_transfer(&mut self.token, by, id)?;
                Ok(None)
            }
            Step::AdvanceDays { days } => {
                if *days < 0 {
                    bail!("the clock only moves forward");
                }
                self.clock.advance(Duration::days(*days));
                Ok(Some(format!("now {}", self.token.now().to_rfc3339())))
            }
            Step::AddModule(spec) => {
                self.add_module(spec)?;
                Ok(None)
            }
            Step::ModuleCall { module, call } => {
                let id = *self
                    .modules
                    .get(module)
                    .ok_or_else(|| anyhow!("unknown module {module:?}"))?;
                let call = self.module_call(call)?;
                self.token
                    .compliance_mut()
                    .call_module_function(self.owner, id, call)?;
                Ok(None)
            }
        }
    }

    fn add_module(&mut self, spec: &ModuleSpec) -> Result<()> {
        if self.modules.contains_key(&spec.name) {
            bail!("module name {:?} already used", spec.name);
        }
        let id = Address::derive(&format!("module/{}", spec.name));
        let module: Box<dyn ComplianceModule> = match spec.kind {
            ModuleKind::ExchangeMonthlyLimits => Box::new(ExchangeMonthlyLimitsModule::new(id)),
            ModuleKind::TimeExchangeLimits => Box::new(TimeExchangeLimitsModule::new(id)),
            ModuleKind::SupplyLimit => Box::new(SupplyLimitModule::new(id)),
            ModuleKind::TransferRestrict => Box::new(TransferRestrictModule::new(id)),
            ModuleKind::CountryAllow => Box::new(CountryAllowModule::new(id)),
        };
        self.token.compliance_mut().add_module(self.owner, module)?;
        self.modules.insert(spec.name.clone(), id);
        Ok(())
    }

    /// Resolve names and encrypt amounts for the owner, who relays the call.
    fn module_call(&self, spec: &CallSpec) -> Result<ModuleCall> {
        Ok(match spec {
            CallSpec::AddExchangeId(name) => ModuleCall::AddExchangeId(self.identity(name)?),
            CallSpec::RemoveExchangeId(name) => ModuleCall::RemoveExchangeId(self.identity(name)?),
            CallSpec::SetExchangeMonthlyLimit { exchange, limit } => {
                ModuleCall::SetExchangeMonthlyLimit {
                    exchange: self.identity(exchange)?,
                    limit: self.encrypt(self.owner, *limit)?,
                }
            }
            CallSpec::SetExchangeTimeLimit {
                exchange,
                window_secs,
                limit,
            } => ModuleCall::SetExchangeTimeLimit {
                exchange: self.identity(exchange)?,
                window_secs: *window_secs,
                limit: self.encrypt(self.owner, *limit)?,
            },
            CallSpec::SetSupplyLimit(limit) => {
                ModuleCall::SetSupplyLimit(self.encrypt(self.owner, *limit)?)
            }
            CallSpec::AllowUser(name) => ModuleCall::AllowUser(self.address(name)?),
            CallSpec::DisallowUser(name) => ModuleCall::DisallowUser(self.address(name)?),
            CallSpec::BatchAllowUsers(names) => ModuleCall::BatchAllowUsers(
                names
                    .iter()
                    .map(|n| self.address(n))
                    .collect::<Result<_>>()?,
            ),
            CallSpec::AddAllowedCountry(c) => ModuleCall::AddAllowedCountry(*c),
            CallSpec::RemoveAllowedCountry(c) => ModuleCall::RemoveAllowedCountry(*c),
            CallSpec::BatchAllowCountries(cs) => ModuleCall::BatchAllowCountries(cs.clone()),
        })
    }

    fn address(&self, name: &str) -> Result<Address> {
        self.addresses
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown participant {name:?}"))
    }

    /// Participants are enrolled as their own identity.
    fn identity(&self, name: &str) -> Result<IdentityId> {
        Ok(IdentityId(self.address(name)?))
    }

    fn agent(&self, by: &Option<String>) -> Result<Address> {
        match by {
            Some(name) => self.address(name),
            None => self
                .default_agent
                .ok_or_else(|| anyhow!("no agent participant to act")),
        }
    }

    fn transfer(&self, label: &str) -> Result<TransferId> {
        self.transfers
            .get(label)
            .copied()
            .ok_or_else(|| anyhow!("unknown transfer label {label:?}"))
    }

    /// A fresh encrypted amount usable by `account`.
    fn encrypt(&self, account: Address, value: u64) -> Result<Euint64> {
        let input = self.fhe.encrypt_input(value, account)?;
        Ok(self.fhe.verify_input(&input, account)?)
    }

    fn note(&self, verb: &str, value: Euint64, reader: Address) -> Result<Option<String>> {
        let value = self.fhe.decrypt(value, reader)?;
        Ok(Some(format!("{verb} {value}")))
    }

    fn drain_records(&mut self) -> usize {
        self.token.drain_events().len()
            + self.token.compliance_mut().drain_events().len()
            + self.dva.drain_events().len()
    }

    fn holders(&self) -> Result<BTreeMap<String, HolderView>> {
        self.addresses
            .iter()
            .map(|(name, &address)| -> Result<(String, HolderView)> {
                let balance = self.token.balance_of(address)?;
                let frozen = self.token.frozen_tokens(address)?;
                let view = HolderView {
                    address: address.to_hex(),
                    balance: self.fhe.decrypt(balance, address)?,
                    frozen: self.fhe.decrypt(frozen, address)?,
                };
                Ok((name.clone(), view))
            })
            .collect()
    }

    fn transfer_views(&self) -> BTreeMap<String, TransferView> {
        self.transfers
            .iter()
            .filter_map(|(label, id)| {
                let t = self.dva.get_transfer(*id)?;
                Some((
                    label.clone(),
                    TransferView {
                        id: id.to_hex(),
                        status: t.status.to_string(),
                        pending_approvals: t.pending_approvals(),
                    },
                ))
            })
            .collect()
    }
}

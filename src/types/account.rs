//! Account buckets and their static multisig policies

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Highest authorization account number (`auth1` .. `auth15`)
pub const MAX_AUTH_ACCOUNTS: u8 = 15;

/// Maximum number of keys in a standard multisig script
pub const MAX_MULTISIG_KEYS: usize = 15;

/// Logical bucket a key belongs to
///
/// `Anonymous` stands for external receivers and is never derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AccountType {
    Client,
    Deposit,
    Payment,
    Fee,
    Stored,
    /// Authorization account `authN`, N in 1..=15
    Auth(u8),
    Anonymous,
}

impl AccountType {
    /// Name used in the database, file names and node labels
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            AccountType::Client => Cow::Borrowed("client"),
            AccountType::Deposit => Cow::Borrowed("deposit"),
            AccountType::Payment => Cow::Borrowed("payment"),
            AccountType::Fee => Cow::Borrowed("fee"),
            AccountType::Stored => Cow::Borrowed("stored"),
            AccountType::Auth(n) => Cow::Owned(format!("auth{}", n)),
            AccountType::Anonymous => Cow::Borrowed("anonymous"),
        }
    }

    /// BIP44 account component (hardened) used in `m/44'/coin'/account'/0/index`
    pub fn derivation_value(&self) -> AppResult<u32> {
        match self {
            AccountType::Client => Ok(0),
            AccountType::Deposit => Ok(1),
            AccountType::Payment => Ok(2),
            AccountType::Stored => Ok(3),
            AccountType::Fee => Ok(4),
            AccountType::Auth(n) => Ok(10 + u32::from(*n)),
            AccountType::Anonymous => Err(AppError::Validation(
                "anonymous account has no derivation path".to_string(),
            )),
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, AccountType::Auth(_))
    }

    /// Only these accounts may carry a multisig policy
    pub fn is_multisig_eligible(&self) -> bool {
        matches!(
            self,
            AccountType::Deposit | AccountType::Payment | AccountType::Stored
        )
    }

    /// All authorization accounts in numeric order
    pub fn authorization_accounts() -> impl Iterator<Item = AccountType> {
        (1..=MAX_AUTH_ACCOUNTS).map(AccountType::Auth)
    }

    /// Check sender/receiver of an internal transfer
    ///
    /// Client and authorization accounts can take part on neither side,
    /// and funds cannot move to the account they came from.
    pub fn validate_transfer(sender: AccountType, receiver: AccountType) -> AppResult<()> {
        for (role, account) in [("sender", sender), ("receiver", receiver)] {
            if matches!(account, AccountType::Client | AccountType::Anonymous)
                || account.is_authorization()
            {
                return Err(AppError::Validation(format!(
                    "{} account {} is not allowed in a transfer",
                    role, account
                )));
            }
        }
        if sender == receiver {
            return Err(AppError::Validation(format!(
                "sender and receiver account must differ ({})",
                sender
            )));
        }
        Ok(())
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for AccountType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(AccountType::Client),
            "deposit" | "receipt" => Ok(AccountType::Deposit),
            "payment" => Ok(AccountType::Payment),
            "fee" => Ok(AccountType::Fee),
            "stored" => Ok(AccountType::Stored),
            "anonymous" => Ok(AccountType::Anonymous),
            other => {
                let n = other
                    .strip_prefix("auth")
                    .and_then(|rest| rest.parse::<u8>().ok())
                    .ok_or_else(|| AppError::Validation(format!("unknown account: {}", other)))?;
                if (1..=MAX_AUTH_ACCOUNTS).contains(&n) {
                    Ok(AccountType::Auth(n))
                } else {
                    Err(AppError::Validation(format!(
                        "authorization account out of range: {}",
                        other
                    )))
                }
            }
        }
    }
}

impl TryFrom<String> for AccountType {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountType> for String {
    fn from(account: AccountType) -> Self {
        account.name().into_owned()
    }
}

/// `M`-of-`N` policy: the account key plus `N-1` authorization legs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigPolicy {
    pub required: usize,
    pub auth_accounts: Vec<AccountType>,
}

impl MultisigPolicy {
    /// Total number of keys in the script
    pub fn total(&self) -> usize {
        self.auth_accounts.len() + 1
    }

    pub fn validate(&self, account: AccountType) -> AppResult<()> {
        if !account.is_multisig_eligible() {
            return Err(AppError::Config(format!(
                "account {} cannot be multisig",
                account
            )));
        }
        let total = self.total();
        if self.required < 1 || total < 2 || self.required > total || total > MAX_MULTISIG_KEYS {
            return Err(AppError::Config(format!(
                "invalid multisig policy for {}: {}-of-{}",
                account, self.required, total
            )));
        }
        for auth in &self.auth_accounts {
            if !auth.is_authorization() {
                return Err(AppError::Config(format!(
                    "multisig leg {} of {} is not an authorization account",
                    auth, account
                )));
            }
        }
        let mut seen = self.auth_accounts.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != self.auth_accounts.len() {
            return Err(AppError::Config(format!(
                "duplicate authorization account in policy for {}",
                account
            )));
        }
        Ok(())
    }
}

/// Static per-account multisig configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPolicy {
    policies: BTreeMap<AccountType, MultisigPolicy>,
}

impl AccountPolicy {
    pub fn new(policies: BTreeMap<AccountType, MultisigPolicy>) -> AppResult<Self> {
        for (account, policy) in &policies {
            policy.validate(*account)?;
        }
        Ok(Self { policies })
    }

    pub fn is_multisig(&self, account: AccountType) -> bool {
        self.policies.contains_key(&account)
    }

    pub fn policy(&self, account: AccountType) -> Option<&MultisigPolicy> {
        self.policies.get(&account)
    }

    pub fn multisig_accounts(&self) -> impl Iterator<Item = (&AccountType, &MultisigPolicy)> {
        self.policies.iter()
    }
}

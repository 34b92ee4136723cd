//! Identity keys for remote accounts and the eligibility rule applied before
//! any nickname operation touches the network.
//!
//! A key packs four fields into 64 bits:
//!
//! ```text
//! | universe (8) | account type (4) | instance (20) | account id (32) |
//! ```


use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

const ACCOUNT_ID_MASK: u64 = 0xFFFF_FFFF;
const INSTANCE_SHIFT: u32 = 32;
const INSTANCE_MASK: u64 = 0x000F_FFFF;
const ACCOUNT_TYPE_SHIFT: u32 = 52;
const ACCOUNT_TYPE_MASK: u64 = 0xF;
const UNIVERSE_SHIFT: u32 = 56;

const PUBLIC_UNIVERSE: u8 = 1;
const DESKTOP_INSTANCE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    Invalid,
    Individual,
    Multiseat,
    GameServer,
    AnonGameServer,
    Pending,
    ContentServer,
    Clan,
    Chat,
    ConsoleUser,
    AnonUser,
}

impl AccountType {
    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => AccountType::Individual,
            2 => AccountType::Multiseat,
            3 => AccountType::GameServer,
            4 => AccountType::AnonGameServer,
            5 => AccountType::Pending,
            6 => AccountType::ContentServer,
            7 => AccountType::Clan,
            8 => AccountType::Chat,
            9 => AccountType::ConsoleUser,
            10 => AccountType::AnonUser,
            _ => AccountType::Invalid,
        }
    }

    fn bits(self) -> u64 {
        match self {
            AccountType::Invalid => 0,
            AccountType::Individual => 1,
            AccountType::Multiseat => 2,
            AccountType::GameServer => 3,
            AccountType::AnonGameServer => 4,
            AccountType::Pending => 5,
            AccountType::ContentServer => 6,
            AccountType::Clan => 7,
            AccountType::Chat => 8,
            AccountType::ConsoleUser => 9,
            AccountType::AnonUser => 10,
        }
    }

    fn letter(self) -> char {
        match self {
            AccountType::Invalid => 'I',
            AccountType::Individual => 'U',
            AccountType::Multiseat => 'M',
            AccountType::GameServer => 'G',
            AccountType::AnonGameServer => 'A',
            AccountType::Pending => 'P',
            AccountType::ContentServer => 'C',
            AccountType::Clan => 'g',
            AccountType::Chat => 'T',
            AccountType::ConsoleUser => '?',
            AccountType::AnonUser => 'a',
        }
    }
}

/// Opaque identifier of a remote account whose display name is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(u64);

impl IdentityKey {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Public-universe individual account, as pushed by notifications that only
    /// carry the 32-bit account id.
    pub fn individual(account_id: u32) -> Self {
        Self::from_parts(
            PUBLIC_UNIVERSE,
            AccountType::Individual,
            DESKTOP_INSTANCE,
            account_id,
        )
    }

    pub fn from_parts(
        universe: u8,
        account_type: AccountType,
        instance: u32,
        account_id: u32,
    ) -> Self {
        let raw = (u64::from(universe) << UNIVERSE_SHIFT)
            | (account_type.bits() << ACCOUNT_TYPE_SHIFT)
            | ((u64::from(instance) & INSTANCE_MASK) << INSTANCE_SHIFT)
            | u64::from(account_id);
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn universe(&self) -> u8 {
        (self.0 >> UNIVERSE_SHIFT) as u8
    }

    pub fn account_type(&self) -> AccountType {
        AccountType::from_bits(((self.0 >> ACCOUNT_TYPE_SHIFT) & ACCOUNT_TYPE_MASK) as u8)
    }

    pub fn instance(&self) -> u32 {
        ((self.0 >> INSTANCE_SHIFT) & INSTANCE_MASK) as u32
    }

    pub fn account_id(&self) -> u32 {
        (self.0 & ACCOUNT_ID_MASK) as u32
    }

    /// Bracketed form used in log lines, e.g. `[U:1:22202]`.
    pub fn render(&self) -> String {
        format!(
            "[{}:{}:{}]",
            self.account_type().letter(),
            self.universe(),
            self.account_id()
        )
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IdentityKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl From<u64> for IdentityKey {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Decides which identities may be resolved or renamed.
pub trait IdentityPolicy: Send + Sync + 'static {
    fn is_eligible(
        &self,
        key: &IdentityKey,
    ) -> bool;
}

/// Only individual user accounts carry nicknames.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndividualOnly;

impl IdentityPolicy for IndividualOnly {
    fn is_eligible(
        &self,
        key: &IdentityKey,
    ) -> bool {
        key.account_type() == AccountType::Individual
    }
}

/// For hosts that validate keys before handing them over.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl IdentityPolicy for AllowAll {
    fn is_eligible(
        &self,
        _key: &IdentityKey,
    ) -> bool {
        true
    }
}

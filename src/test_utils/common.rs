use crate::IdentityKey;
use crate::NicknameRecord;

pub(crate) fn individual(account_id: u32) -> IdentityKey {
    IdentityKey::individual(account_id)
}

pub(crate) fn record(
    account_id: u32,
    name: &str,
) -> NicknameRecord {
    NicknameRecord::new(individual(account_id), name)
}

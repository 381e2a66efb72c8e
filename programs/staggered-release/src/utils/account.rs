use anchor_lang::prelude::*;

/// Deserializes a program-owned PDA that may not have been created yet.
/// `None` when the account is empty or owned by someone else (never initialized).
pub fn load_optional<T: AccountDeserialize>(info: &AccountInfo) -> Result<Option<T>> {
    if info.owner != &crate::ID || info.data_is_empty() {
        return Ok(None);
    }
    let data = info.try_borrow_data()?;
    let mut bytes: &[u8] = &data;
    Ok(Some(T::try_deserialize(&mut bytes)?))
}

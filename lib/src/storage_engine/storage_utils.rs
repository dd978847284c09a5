// lib/src/storage_engine/storage_utils.rs
use bincode::{
    config::{self, BigEndian, Configuration, Fixint},
    serde::{decode_from_slice, encode_to_vec},
};
use serde::{de::DeserializeOwned, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionalTree, UnabortableTransactionError};
use sled::IVec;
use uuid::Uuid;

use crate::errors::{NeoCareError, Result};

pub const SEQ_HOSPITAL: &str = "seq:hospital";
pub const SEQ_VACCINE: &str = "seq:vaccine";

/// Provides a standard bincode configuration.
pub fn bincode_config() -> Configuration<BigEndian, Fixint> {
    config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
}

pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(encode_to_vec(value, bincode_config())?)
}

pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _): (T, usize) = decode_from_slice(bytes, bincode_config())?;
    Ok(value)
}

pub fn u32_key(id: u32) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

/// `parent ++ child`, so every child row of a parent shares a scan prefix.
pub fn composite_key(parent: &Uuid, child: &Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(parent.as_bytes());
    key.extend_from_slice(child.as_bytes());
    key
}

pub fn uuid_from_ivec(bytes: &IVec) -> Result<Uuid> {
    Uuid::from_slice(bytes).map_err(|e| NeoCareError::SerializationError(format!("Invalid UUID bytes: {}", e)))
}

pub fn decode_counter(value: Option<IVec>) -> u64 {
    value
        .and_then(|v| <[u8; 8]>::try_from(v.as_ref()).ok())
        .map(u64::from_be_bytes)
        .unwrap_or(0)
}

pub fn hospital_children_key(hospital_id: u32) -> String {
    format!("refs:hospital-children:{}", hospital_id)
}

pub fn hospital_users_key(hospital_id: u32) -> String {
    format!("refs:hospital-users:{}", hospital_id)
}

pub fn vaccine_schedules_key(vaccine_id: u32) -> String {
    format!("refs:vaccine-schedules:{}", vaccine_id)
}

pub type TxResult<T> = std::result::Result<T, ConflictableTransactionError<NeoCareError>>;

/// Wraps a domain error so it aborts the surrounding transaction.
pub fn abort(err: impl Into<NeoCareError>) -> ConflictableTransactionError<NeoCareError> {
    ConflictableTransactionError::Abort(err.into())
}

pub fn tx_counter(tree: &TransactionalTree, key: &str) -> std::result::Result<u64, UnabortableTransactionError> {
    Ok(decode_counter(tree.get(key.as_bytes())?))
}

pub fn tx_set_counter(tree: &TransactionalTree, key: &str, value: u64) -> std::result::Result<(), UnabortableTransactionError> {
    if value == 0 {
        tree.remove(key.as_bytes())?;
    } else {
        tree.insert(key.as_bytes(), value.to_be_bytes().to_vec())?;
    }
    Ok(())
}

/// Adds `delta` to a counter inside a transaction and returns the new value.
pub fn tx_adjust_counter(tree: &TransactionalTree, key: &str, delta: i64) -> TxResult<u64> {
    let current = tx_counter(tree, key)?;
    let next = if delta >= 0 {
        current.saturating_add(delta as u64)
    } else {
        current.checked_sub(delta.unsigned_abs()).ok_or_else(|| {
            abort(NeoCareError::InternalError(format!("counter {} would become negative", key)))
        })?
    };
    tx_set_counter(tree, key, next)?;
    Ok(next)
}

pub fn tx_encode<T: Serialize>(value: &T) -> TxResult<Vec<u8>> {
    serialize(value).map_err(abort)
}

pub fn tx_decode<T: DeserializeOwned>(bytes: &[u8]) -> TxResult<T> {
    deserialize(bytes).map_err(abort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::Role;

    #[test]
    fn should_decode_missing_counter_as_zero() {
        assert_eq!(decode_counter(None), 0);
        assert_eq!(decode_counter(Some(IVec::from(7u64.to_be_bytes().to_vec()))), 7);
    }

    #[test]
    fn should_order_composite_keys_by_parent_first() {
        let parent = Uuid::new_v4();
        let key = composite_key(&parent, &Uuid::new_v4());
        assert!(key.starts_with(parent.as_bytes()));
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn should_encode_stored_enums() {
        let bytes = serialize(&Role::HospitalAdmin).unwrap();
        assert_eq!(deserialize::<Role>(&bytes).unwrap(), Role::HospitalAdmin);
    }
}

//! Conversion between flat resource state and the typed cluster model
//!
//! `parse` reads a [`ResourceData`] into `rke_common` types, `state` writes a
//! [`Cluster`](rke_common::Cluster) back through a [`StateWriter`] using the
//! same keys. Both sides treat an empty value and an absent key alike: readers
//! map absent keys to zero values and writers skip zero values.
//!
//! [`StateWriter`]: crate::resources::StateWriter

pub mod parse;
pub mod state;

pub use parse::*;
pub use state::cluster_to_state;

use crate::resources::ResourceData;
use rke_common::{Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A nested block: one element of a block list
pub type Block = Map<String, Value>;

/// Value under `key`; explicit nulls count as absent
fn lookup<'a, D: ResourceData + ?Sized>(d: &'a D, key: &str) -> Option<&'a Value> {
    d.get_ok(key).filter(|v| !v.is_null())
}

pub(crate) fn get_string<D: ResourceData + ?Sized>(d: &D, key: &str) -> Result<String> {
    match lookup(d, key) {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::invalid_type(key, "string")),
    }
}

pub(crate) fn get_bool<D: ResourceData + ?Sized>(d: &D, key: &str) -> Result<bool> {
    match lookup(d, key) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(Error::invalid_type(key, "bool")),
    }
}

pub(crate) fn get_int<D: ResourceData + ?Sized>(d: &D, key: &str) -> Result<Option<i64>> {
    match lookup(d, key) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| Error::invalid_type(key, "integer")),
    }
}

pub(crate) fn get_string_list<D: ResourceData + ?Sized>(d: &D, key: &str) -> Result<Vec<String>> {
    let Some(value) = lookup(d, key) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| Error::invalid_type(key, "list of strings"))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| Error::invalid_type(key, "list of strings"))
        })
        .collect()
}

pub(crate) fn get_string_map<D: ResourceData + ?Sized>(
    d: &D,
    key: &str,
) -> Result<BTreeMap<String, String>> {
    let Some(value) = lookup(d, key) else {
        return Ok(BTreeMap::new());
    };
    let entries = value
        .as_object()
        .ok_or_else(|| Error::invalid_type(key, "map of strings"))?;

    entries
        .iter()
        .map(|(k, v)| {
            v.as_str()
                .map(|s| (k.clone(), s.to_string()))
                .ok_or_else(|| Error::invalid_type(key, "map of strings"))
        })
        .collect()
}

pub(crate) fn get_block_list<'a, D: ResourceData + ?Sized>(
    d: &'a D,
    key: &str,
) -> Result<Vec<&'a Block>> {
    let Some(value) = lookup(d, key) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| Error::invalid_type(key, "list of blocks"))?;

    items
        .iter()
        .map(|item| {
            item.as_object()
                .ok_or_else(|| Error::invalid_type(key, "list of blocks"))
        })
        .collect()
}

/// A single-occurrence block: element 0 of its block list, `None` when the
/// key is absent or the list is empty
pub(crate) fn get_block<'a, D: ResourceData + ?Sized>(
    d: &'a D,
    key: &str,
) -> Result<Option<&'a Block>> {
    Ok(get_block_list(d, key)?.into_iter().next())
}

/// Values the writers leave out
pub(crate) fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        Value::Number(_) => false,
    }
}

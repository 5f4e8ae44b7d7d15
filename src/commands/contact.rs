use anyhow::Result;
use pimbridge_core::contact::{Contact, ContactMutator};
use pimbridge_core::fields::FieldMap;
use pimbridge_core::hash::hash_contact;
use serde_json::{Value, json};

use super::open_store;
use crate::input::read_json;

pub async fn mutate(id: Option<String>, container: &str, data: &str) -> Result<Value> {
    let (_, store) = open_store()?;
    let fields: FieldMap = read_json(data)?;

    let mut contact: Contact = match id {
        Some(id) => store.get(container, &id)?,
        None => store.create(container),
    };

    ContactMutator.mutate_async(&mut contact, &fields).await?;
    store.save(container, &mut contact)?;

    Ok(json!({
        "hash": hash_contact(&contact)?,
        "contact": contact,
    }))
}

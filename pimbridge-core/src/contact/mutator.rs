//! Applying field mappings to contacts.
//!
//! Contact mutation is best effort about keys and strict about values:
//! keys the mutator does not know are skipped, but a known key with a
//! malformed value rejects the whole call before anything is written.

use serde_json::Value;

use super::record::{
    ContactField, ContactHandle, ContactKey, ContactType, InstantMessageAddress, Labeled,
    PartialDate, PostalAddress,
};
use crate::error::{BridgeError, BridgeResult};
use crate::fields::{self, FieldMap};
use crate::resolver::{self, Resolver};

/// Keys that describe the contact but cannot be written through a mapping.
const READ_ONLY_KEYS: &[&str] = &["id", "uid", "name", "imageAvailable"];

/// Applies field mappings to contacts and reports through a resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContactMutator;

impl ContactMutator {
    /// Apply `fields` to `contact` and complete `resolver` with the outcome.
    ///
    /// The contact is not persisted; saving it is up to the caller.
    pub fn mutate<C>(&self, contact: &mut C, fields: &FieldMap, resolver: Resolver<()>)
    where
        C: ContactHandle + ?Sized,
    {
        resolver.settle(apply_contact_fields(contact, fields));
    }

    /// Awaitable form of [`ContactMutator::mutate`].
    pub async fn mutate_async<C>(&self, contact: &mut C, fields: &FieldMap) -> BridgeResult<()>
    where
        C: ContactHandle + ?Sized,
    {
        let (resolver, completion) = resolver::channel();
        self.mutate(contact, fields, resolver);
        completion.await
    }
}

/// Decode every recognized key, then write them all. Nothing is written if
/// any value fails to decode.
pub fn apply_contact_fields<C>(contact: &mut C, fields: &FieldMap) -> BridgeResult<()>
where
    C: ContactHandle + ?Sized,
{
    let mut decoded = Vec::with_capacity(fields.len());

    for (name, value) in fields {
        match ContactKey::from_mapping_key(name) {
            Some(key) => decoded.push(decode_field(key, value)?),
            None if READ_ONLY_KEYS.contains(&name.as_str()) => {}
            None => tracing::debug!(key = %name, "ignoring unrecognized contact key"),
        }
    }

    for field in decoded {
        contact.set(field);
    }

    Ok(())
}

/// Convert one mapping value into the property it writes. `null` clears.
pub fn decode_field(key: ContactKey, value: &Value) -> BridgeResult<ContactField> {
    let name = key.mapping_key();
    let text = |value: &Value| -> BridgeResult<String> {
        Ok(fields::opt_string(name, value)?.unwrap_or_default())
    };

    let field = match key {
        ContactKey::GivenName => ContactField::GivenName(text(value)?),
        ContactKey::MiddleName => ContactField::MiddleName(text(value)?),
        ContactKey::FamilyName => ContactField::FamilyName(text(value)?),
        ContactKey::PreviousFamilyName => ContactField::PreviousFamilyName(text(value)?),
        ContactKey::NamePrefix => ContactField::NamePrefix(text(value)?),
        ContactKey::NameSuffix => ContactField::NameSuffix(text(value)?),
        ContactKey::Nickname => ContactField::Nickname(text(value)?),
        ContactKey::PhoneticGivenName => ContactField::PhoneticGivenName(text(value)?),
        ContactKey::PhoneticMiddleName => ContactField::PhoneticMiddleName(text(value)?),
        ContactKey::PhoneticFamilyName => ContactField::PhoneticFamilyName(text(value)?),
        ContactKey::OrganizationName => ContactField::OrganizationName(text(value)?),
        ContactKey::DepartmentName => ContactField::DepartmentName(text(value)?),
        ContactKey::JobTitle => ContactField::JobTitle(text(value)?),
        ContactKey::Note => ContactField::Note(text(value)?),
        ContactKey::ContactType => ContactField::ContactType(decode_contact_type(value)?),
        ContactKey::Birthday => ContactField::Birthday(match value {
            Value::Null => None,
            other => Some(decode_partial_date(name, other)?),
        }),
        ContactKey::Dates => ContactField::Dates(decode_labeled(name, value, |entry| {
            decode_partial_date(name, &Value::Object(entry.clone()))
        })?),
        ContactKey::PhoneNumbers => ContactField::PhoneNumbers(decode_labeled(
            name,
            value,
            |entry| required_string(name, entry, "number"),
        )?),
        ContactKey::EmailAddresses => ContactField::EmailAddresses(decode_labeled(
            name,
            value,
            |entry| required_string(name, entry, "email"),
        )?),
        ContactKey::UrlAddresses => ContactField::UrlAddresses(decode_labeled(
            name,
            value,
            |entry| required_string(name, entry, "url"),
        )?),
        ContactKey::PostalAddresses => {
            ContactField::PostalAddresses(decode_labeled(name, value, |entry| {
                Ok(PostalAddress {
                    street: optional_string(name, entry, "street")?,
                    city: optional_string(name, entry, "city")?,
                    state: optional_string(name, entry, "region")?,
                    postal_code: optional_string(name, entry, "postalCode")?,
                    country: optional_string(name, entry, "country")?,
                    iso_country_code: optional_string(name, entry, "isoCountryCode")?,
                    po_box: optional_string(name, entry, "poBox")?,
                })
            })?)
        }
        ContactKey::InstantMessageAddresses => {
            ContactField::InstantMessageAddresses(decode_labeled(name, value, |entry| {
                let service = match entry.get("service") {
                    Some(v) => fields::opt_string(name, v)?,
                    None => None,
                };
                Ok(InstantMessageAddress {
                    service,
                    username: required_string(name, entry, "username")?,
                })
            })?)
        }
    };

    Ok(field)
}

fn decode_contact_type(value: &Value) -> BridgeResult<ContactType> {
    match value {
        Value::Null => Ok(ContactType::Person),
        Value::String(s) if s == "person" => Ok(ContactType::Person),
        Value::String(s) if s == "company" => Ok(ContactType::Company),
        other => Err(BridgeError::invalid(
            "contactType",
            format!("expected 'person' or 'company', got {}", other),
        )),
    }
}

/// `{day, month, year}` with a zero-based month; any component may be absent.
fn decode_partial_date(field: &str, value: &Value) -> BridgeResult<PartialDate> {
    let date = fields::object(field, value)?;

    let component = |key: &str, range: std::ops::RangeInclusive<i64>| -> BridgeResult<Option<i64>> {
        match date.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => {
                let n = fields::integer(field, v)?;
                if range.contains(&n) {
                    Ok(Some(n))
                } else {
                    Err(BridgeError::invalid(
                        field,
                        format!("{} {} is out of range", key, n),
                    ))
                }
            }
        }
    };

    Ok(PartialDate {
        day: component("day", 1..=31)?.map(|d| d as u32),
        month: component("month", 0..=11)?.map(|m| m as u32 + 1),
        year: component("year", -9999..=9999)?.map(|y| y as i32),
    })
}

/// Decode a list of `{label?, ...}` objects, mapping each entry's payload with `f`.
fn decode_labeled<T>(
    field: &str,
    value: &Value,
    f: impl Fn(&FieldMap) -> BridgeResult<T>,
) -> BridgeResult<Vec<Labeled<T>>> {
    if value.is_null() {
        return Ok(Vec::new());
    }

    fields::array(field, value)?
        .iter()
        .map(|item| {
            let entry = fields::object(field, item)?;
            let label = match entry.get("label") {
                None => None,
                Some(v) => fields::opt_string(&format!("{}.label", field), v)?,
            };
            Ok(Labeled {
                label,
                value: f(entry)?,
            })
        })
        .collect()
}

fn required_string(field: &str, entry: &FieldMap, key: &str) -> BridgeResult<String> {
    match entry.get(key) {
        Some(v) => fields::string(&format!("{}.{}", field, key), v),
        None => Err(BridgeError::invalid(field, format!("entry is missing '{}'", key))),
    }
}

fn optional_string(field: &str, entry: &FieldMap, key: &str) -> BridgeResult<String> {
    match entry.get(key) {
        Some(v) => Ok(fields::opt_string(&format!("{}.{}", field, key), v)?.unwrap_or_default()),
        None => Ok(String::new()),
    }
}

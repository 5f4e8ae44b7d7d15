//! Contact records and the capability interface used to mutate them.

use serde::{Deserialize, Serialize};

/// Whether a contact describes a person or an organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactType {
    #[default]
    Person,
    Company,
}

/// A date that may lack its year (birthdays) or other components.
///
/// `month` is one-based here, unlike the zero-based month in field mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDate {
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// A value with an optional free-form label ("home", "work", "mobile", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labeled<T> {
    pub label: Option<String>,
    pub value: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub iso_country_code: String,
    pub po_box: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantMessageAddress {
    pub service: Option<String>,
    pub username: String,
}

/// A writable contact as held by the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    pub id: String,
    pub contact_type: ContactType,
    pub given_name: String,
    pub middle_name: String,
    pub family_name: String,
    pub previous_family_name: String,
    pub name_prefix: String,
    pub name_suffix: String,
    pub nickname: String,
    pub phonetic_given_name: String,
    pub phonetic_middle_name: String,
    pub phonetic_family_name: String,
    pub organization_name: String,
    pub department_name: String,
    pub job_title: String,
    pub note: String,
    pub birthday: Option<PartialDate>,
    pub dates: Vec<Labeled<PartialDate>>,
    pub phone_numbers: Vec<Labeled<String>>,
    pub email_addresses: Vec<Labeled<String>>,
    pub postal_addresses: Vec<Labeled<PostalAddress>>,
    pub url_addresses: Vec<Labeled<String>>,
    pub instant_message_addresses: Vec<Labeled<InstantMessageAddress>>,
}

/// Names of the writable contact properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKey {
    GivenName,
    MiddleName,
    FamilyName,
    PreviousFamilyName,
    NamePrefix,
    NameSuffix,
    Nickname,
    PhoneticGivenName,
    PhoneticMiddleName,
    PhoneticFamilyName,
    OrganizationName,
    DepartmentName,
    JobTitle,
    Note,
    ContactType,
    Birthday,
    Dates,
    PhoneNumbers,
    EmailAddresses,
    PostalAddresses,
    UrlAddresses,
    InstantMessageAddresses,
}

/// Mapping keys and the property each one writes.
const MAPPING_KEYS: &[(&str, ContactKey)] = &[
    ("firstName", ContactKey::GivenName),
    ("middleName", ContactKey::MiddleName),
    ("lastName", ContactKey::FamilyName),
    ("maidenName", ContactKey::PreviousFamilyName),
    ("namePrefix", ContactKey::NamePrefix),
    ("nameSuffix", ContactKey::NameSuffix),
    ("nickname", ContactKey::Nickname),
    ("phoneticFirstName", ContactKey::PhoneticGivenName),
    ("phoneticMiddleName", ContactKey::PhoneticMiddleName),
    ("phoneticLastName", ContactKey::PhoneticFamilyName),
    ("company", ContactKey::OrganizationName),
    ("department", ContactKey::DepartmentName),
    ("jobTitle", ContactKey::JobTitle),
    ("note", ContactKey::Note),
    ("contactType", ContactKey::ContactType),
    ("birthday", ContactKey::Birthday),
    ("dates", ContactKey::Dates),
    ("phoneNumbers", ContactKey::PhoneNumbers),
    ("emails", ContactKey::EmailAddresses),
    ("addresses", ContactKey::PostalAddresses),
    ("urlAddresses", ContactKey::UrlAddresses),
    ("instantMessageAddresses", ContactKey::InstantMessageAddresses),
];

impl ContactKey {
    pub fn from_mapping_key(key: &str) -> Option<Self> {
        MAPPING_KEYS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, k)| *k)
    }

    pub fn mapping_key(self) -> &'static str {
        MAPPING_KEYS
            .iter()
            .find(|(_, k)| *k == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

/// A contact property together with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactField {
    GivenName(String),
    MiddleName(String),
    FamilyName(String),
    PreviousFamilyName(String),
    NamePrefix(String),
    NameSuffix(String),
    Nickname(String),
    PhoneticGivenName(String),
    PhoneticMiddleName(String),
    PhoneticFamilyName(String),
    OrganizationName(String),
    DepartmentName(String),
    JobTitle(String),
    Note(String),
    ContactType(ContactType),
    Birthday(Option<PartialDate>),
    Dates(Vec<Labeled<PartialDate>>),
    PhoneNumbers(Vec<Labeled<String>>),
    EmailAddresses(Vec<Labeled<String>>),
    PostalAddresses(Vec<Labeled<PostalAddress>>),
    UrlAddresses(Vec<Labeled<String>>),
    InstantMessageAddresses(Vec<Labeled<InstantMessageAddress>>),
}

/// Read and write access to a contact the caller does not own.
pub trait ContactHandle {
    fn get(&self, key: ContactKey) -> ContactField;
    fn set(&mut self, field: ContactField);
}

impl ContactHandle for Contact {
    fn get(&self, key: ContactKey) -> ContactField {
        match key {
            ContactKey::GivenName => ContactField::GivenName(self.given_name.clone()),
            ContactKey::MiddleName => ContactField::MiddleName(self.middle_name.clone()),
            ContactKey::FamilyName => ContactField::FamilyName(self.family_name.clone()),
            ContactKey::PreviousFamilyName => {
                ContactField::PreviousFamilyName(self.previous_family_name.clone())
            }
            ContactKey::NamePrefix => ContactField::NamePrefix(self.name_prefix.clone()),
            ContactKey::NameSuffix => ContactField::NameSuffix(self.name_suffix.clone()),
            ContactKey::Nickname => ContactField::Nickname(self.nickname.clone()),
            ContactKey::PhoneticGivenName => {
                ContactField::PhoneticGivenName(self.phonetic_given_name.clone())
            }
            ContactKey::PhoneticMiddleName => {
                ContactField::PhoneticMiddleName(self.phonetic_middle_name.clone())
            }
            ContactKey::PhoneticFamilyName => {
                ContactField::PhoneticFamilyName(self.phonetic_family_name.clone())
            }
            ContactKey::OrganizationName => {
                ContactField::OrganizationName(self.organization_name.clone())
            }
            ContactKey::DepartmentName => {
                ContactField::DepartmentName(self.department_name.clone())
            }
            ContactKey::JobTitle => ContactField::JobTitle(self.job_title.clone()),
            ContactKey::Note => ContactField::Note(self.note.clone()),
            ContactKey::ContactType => ContactField::ContactType(self.contact_type),
            ContactKey::Birthday => ContactField::Birthday(self.birthday.clone()),
            ContactKey::Dates => ContactField::Dates(self.dates.clone()),
            ContactKey::PhoneNumbers => ContactField::PhoneNumbers(self.phone_numbers.clone()),
            ContactKey::EmailAddresses => {
                ContactField::EmailAddresses(self.email_addresses.clone())
            }
            ContactKey::PostalAddresses => {
                ContactField::PostalAddresses(self.postal_addresses.clone())
            }
            ContactKey::UrlAddresses => ContactField::UrlAddresses(self.url_addresses.clone()),
            ContactKey::InstantMessageAddresses => {
                ContactField::InstantMessageAddresses(self.instant_message_addresses.clone())
            }
        }
    }

    fn set(&mut self, field: ContactField) {
        match field {
            ContactField::GivenName(v) => self.given_name = v,
            ContactField::MiddleName(v) => self.middle_name = v,
            ContactField::FamilyName(v) => self.family_name = v,
            ContactField::PreviousFamilyName(v) => self.previous_family_name = v,
            ContactField::NamePrefix(v) => self.name_prefix = v,
            ContactField::NameSuffix(v) => self.name_suffix = v,
            ContactField::Nickname(v) => self.nickname = v,
            ContactField::PhoneticGivenName(v) => self.phonetic_given_name = v,
            ContactField::PhoneticMiddleName(v) => self.phonetic_middle_name = v,
            ContactField::PhoneticFamilyName(v) => self.phonetic_family_name = v,
            ContactField::OrganizationName(v) => self.organization_name = v,
            ContactField::DepartmentName(v) => self.department_name = v,
            ContactField::JobTitle(v) => self.job_title = v,
            ContactField::Note(v) => self.note = v,
            ContactField::ContactType(v) => self.contact_type = v,
            ContactField::Birthday(v) => self.birthday = v,
            ContactField::Dates(v) => self.dates = v,
            ContactField::PhoneNumbers(v) => self.phone_numbers = v,
            ContactField::EmailAddresses(v) => self.email_addresses = v,
            ContactField::PostalAddresses(v) => self.postal_addresses = v,
            ContactField::UrlAddresses(v) => self.url_addresses = v,
            ContactField::InstantMessageAddresses(v) => self.instant_message_addresses = v,
        }
    }
}

//! Contacts: the record type and the mutator that applies field mappings to it.

mod mutator;
mod record;

pub use mutator::{ContactMutator, apply_contact_fields, decode_field};
pub use record::{
    Contact, ContactField, ContactHandle, ContactKey, ContactType, InstantMessageAddress,
    Labeled, PartialDate, PostalAddress,
};

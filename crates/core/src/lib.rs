//! Core logic for the "Items" admin field: a repeatable list-of-rows input
//! whose value is a JSON array stored on a single record attribute.
//!
//! Everything in this crate is pure, in-memory logic. The host application
//! owns request parsing, record storage and rendering; it talks to this crate
//! through [`submission::Submission`], [`record::Record`] and the serialized
//! [`items::FieldMeta`] / [`widget::WidgetView`] projections.

pub mod error;
pub mod items;
pub mod record;
pub mod registry;
pub mod submission;
pub mod types;
pub mod validation;
pub mod widget;

//! Declarative UI schemas and the dynamic renderer.
//!
//! This module is the presentation-layer contract of the agent: tool
//! results are mapped into a [`UiSchema`] (sections, tabs, typed fields,
//! actions over a flat data bag) and the [`Renderer`] walks that schema
//! into a consistent, fully formatted view tree. No per-record-type
//! rendering code exists anywhere; the field type alone decides how a
//! value is displayed.

pub mod dataset;
pub mod render;
pub mod types;

pub use dataset::dataset_detail_schema;
pub use render::{
    format_currency, format_date, format_phone, format_value, status_tone, ActionInvocation,
    FieldControl, RenderedField, RenderedSection, RenderedView, Renderer, Tone, NOT_SPECIFIED,
};
pub use types::{
    ActionKind, FieldType, FieldValue, SchemaKind, SectionLayout, UiAction, UiField, UiHeader,
    UiSchema, UiSection, UiTab,
};

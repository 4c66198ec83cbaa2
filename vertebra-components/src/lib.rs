//! vertebra-components: base for device components
//!
//! Provides:
//! - Component identity, display name and icon
//! - Group-based authorization of introspection queries
//! - UI parameters and dashboard links
//! - Wire records with camelCase keys

pub mod component;
pub mod dashboard;
pub mod error;
pub mod info;
pub mod naming;

pub use component::{Component, ComponentDetails, ComponentOptions, PlainDetails};
pub use dashboard::{DashboardLink, ANY_DASHBOARD};
pub use error::ComponentError;
pub use info::{ComponentInfo, ComponentReference, LinkDescriptor, RESERVED_INFO_KEYS};
pub use naming::{camel_case_parameters, underscore_to_camel_case};

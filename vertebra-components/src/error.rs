//! Error types for vertebra-components

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("Invalid ui parameter '{name}' for component '{component_id}'")]
    InvalidParameter { component_id: String, name: String },
}

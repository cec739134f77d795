use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::{
    error::DomainError,
    kit::{Kit, KitManifest},
    module::ModuleManifest,
    variables::VariableSchema,
};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across services.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_kit_manifest(manifest: &KitManifest) -> Result<(), DomainError> {
        manifest.validate()
    }

    pub fn validate_module_manifest(manifest: &ModuleManifest) -> Result<(), DomainError> {
        manifest.validate()
    }

    /// A resolved kit's chain must end in the kit itself.
    pub fn validate_kit(kit: &Kit) -> Result<(), DomainError> {
        match kit.profile_chain.last() {
            Some(last) if *last == kit.name => kit.variables.validate_defaults(),
            _ => Err(DomainError::InvalidKitManifest {
                kit: kit.name.clone(),
                reason: format!(
                    "profile chain {:?} does not end in the kit",
                    kit.profile_chain
                ),
            }),
        }
    }

    /// Every supplied value must satisfy its declaration. Undeclared names
    /// pass through untouched.
    pub fn validate_values(
        schema: &VariableSchema,
        values: &BTreeMap<String, Value>,
    ) -> Result<(), DomainError> {
        for (name, value) in values {
            if let Some(def) = schema.get(name) {
                def.validate_value(name, value)?;
            }
        }
        Ok(())
    }
}

//! Terminal prompts for missing variables.

use rapidkit_core::prelude::VariablePrompt;

use crate::error::CliResult;

/// The prompt for `--interactive`, or an error when this build has no
/// terminal prompt support.
pub fn interactive_prompt(interactive: bool) -> CliResult<Option<Box<dyn VariablePrompt>>> {
    if !interactive {
        return Ok(None);
    }
    #[cfg(feature = "interactive")]
    {
        Ok(Some(Box::new(terminal::TerminalPrompt)))
    }
    #[cfg(not(feature = "interactive"))]
    {
        Err(crate::error::CliError::FeatureNotAvailable {
            feature: "interactive",
        })
    }
}

#[cfg(feature = "interactive")]
mod terminal {
    use dialoguer::{Confirm, Input, Select};
    use rapidkit_core::{
        application::ApplicationError,
        domain::variables::display_value,
        prelude::{RapidkitResult, VariableDef, VariablePrompt, VariableType},
    };
    use serde_json::Value;
    use tracing::warn;

    /// Asks on the terminal with dialoguer widgets matched to the type.
    pub struct TerminalPrompt;

    impl VariablePrompt for TerminalPrompt {
        fn prompt(&self, name: &str, definition: &VariableDef) -> RapidkitResult<Value> {
            let label = match &definition.description {
                Some(text) => format!("{name} ({text})"),
                None => name.to_string(),
            };

            let answer = match definition.kind() {
                VariableType::Bool => Confirm::new()
                    .with_prompt(label)
                    .default(
                        definition
                            .default
                            .as_ref()
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                    )
                    .interact()
                    .map(Value::Bool),
                VariableType::Choice => {
                    let choices = definition.choices.clone().unwrap_or_default();
                    let items: Vec<String> = choices.iter().map(display_value).collect();
                    let selected = definition
                        .default
                        .as_ref()
                        .and_then(|d| choices.iter().position(|c| c == d))
                        .unwrap_or(0);
                    Select::new()
                        .with_prompt(label)
                        .items(&items)
                        .default(selected)
                        .interact()
                        .map(|i| choices.get(i).cloned().unwrap_or(Value::Null))
                }
                VariableType::String | VariableType::Int => {
                    let mut input = Input::<String>::new().with_prompt(label);
                    if let Some(default) = definition.default.as_ref().filter(|d| !d.is_null()) {
                        input = input.default(display_value(default));
                    }
                    input.interact_text().map(Value::from)
                }
            };

            answer.map_err(|e| {
                warn!(variable = %name, error = %e, "Prompt failed");
                ApplicationError::VariableMissing {
                    names: vec![name.to_string()],
                }
                .into()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_prompt_unless_interactive() {
        assert!(interactive_prompt(false).unwrap().is_none());
    }
}

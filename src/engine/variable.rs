//! Variable resolution
//!
//! References look like `${scope.name}` or `${name}`. The `profile` scope
//! reads the run profile, the `store` scope reads the scenario store, and an
//! unscoped name tries the profile first, then the store.

use once_cell::sync::Lazy;
use regex::Regex;

use super::context::{GlobalContext, ScenarioContext, StoreVariables};
use super::profile::Profile;
use crate::common::{Error, Result};

/// Separator between scope and variable name
pub const SCOPE_SEPARATOR: char = '.';
/// Scope name for profile variables
pub const SCOPE_PROFILE: &str = "profile";
/// Scope name for store variables
pub const SCOPE_STORE: &str = "store";
/// Upper bound on how deeply resolved values may nest references
pub const MAX_SUBSTITUTION_DEPTH: usize = 64;

static VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("variable pattern is valid"));

/// Resolves variable references against a profile and a store
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    profile: &'a Profile,
    store: &'a StoreVariables,
}

impl<'a> Resolver<'a> {
    pub fn new(profile: &'a Profile, store: &'a StoreVariables) -> Self {
        Self { profile, store }
    }

    /// Resolver over the run profile and a scenario's store
    pub fn for_scenario(gc: &'a GlobalContext, sc: &'a ScenarioContext) -> Self {
        Self::new(gc.profile(), &sc.store)
    }

    /// Resolve one reference (the text between `${` and `}`)
    pub fn resolve(&self, reference: &str) -> Result<String> {
        let segments: Vec<&str> = reference.split(SCOPE_SEPARATOR).collect();
        let found = match segments.as_slice() {
            [name] => {
                tracing::debug!(target_name = name, "resolving from all scopes");
                self.profile.get(name).or_else(|| self.store.get(name))
            }
            [SCOPE_PROFILE, name] => {
                tracing::debug!(
                    scope = SCOPE_PROFILE,
                    target_name = name,
                    "resolving scoped variable"
                );
                self.profile.get(name)
            }
            [SCOPE_STORE, name] => {
                tracing::debug!(
                    scope = SCOPE_STORE,
                    target_name = name,
                    "resolving scoped variable"
                );
                self.store.get(name)
            }
            _ => None,
        };
        found
            .map(str::to_string)
            .ok_or_else(|| Error::UnresolvedVariable(reference.to_string()))
    }

    /// Substitute every variable reference in `text`
    ///
    /// Resolved values may introduce new references; those are expanded
    /// before the value is spliced in. A reference that reappears inside its
    /// own expansion is a cycle, and values may nest at most
    /// `MAX_SUBSTITUTION_DEPTH` levels deep.
    /// On failure nothing is substituted; the caller keeps `text`.
    pub fn replace(&self, text: &str) -> Result<String> {
        let mut chain = Vec::new();
        self.expand(text, &mut chain).map_err(|e| match e {
            Error::SubstitutionDepthExceeded { limit, .. } => {
                Error::SubstitutionDepthExceeded {
                    text: text.to_string(),
                    limit,
                }
            }
            other => other,
        })
    }

    /// Expand `text`, where `chain` holds the references whose values led here
    fn expand(&self, text: &str, chain: &mut Vec<String>) -> Result<String> {
        let mut expanded = String::with_capacity(text.len());
        let mut last = 0;

        for caps in VARIABLE.captures_iter(text) {
            let (Some(token), Some(reference)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let reference = reference.as_str();

            if chain.iter().any(|r| r == reference) {
                tracing::error!(reference, "variable refers back to itself");
                return Err(Error::VariableCycle(reference.to_string()));
            }
            if chain.len() >= MAX_SUBSTITUTION_DEPTH {
                return Err(Error::SubstitutionDepthExceeded {
                    text: text.to_string(),
                    limit: MAX_SUBSTITUTION_DEPTH,
                });
            }

            let value = self.resolve(reference)?;
            chain.push(reference.to_string());
            let value = self.expand(&value, chain)?;
            chain.pop();

            expanded.push_str(&text[last..token.start()]);
            expanded.push_str(&value);
            last = token.end();
        }

        expanded.push_str(&text[last..]);
        Ok(expanded)
    }
}

impl ScenarioContext {
    /// Substitute variables in `text` using the run profile and this store
    pub fn replace_variables(&self, gc: &GlobalContext, text: &str) -> Result<String> {
        Resolver::for_scenario(gc, self).replace(text)
    }
}

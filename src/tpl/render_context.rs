use crate::error::TemplateError;
use crate::tpl::serializer;
use serde::Serialize;
use std::collections::HashMap;

/// Variable and flag bindings for a single render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    vars: HashMap<String, String>,
    flags: HashMap<String, bool>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from a serializable struct or map: `bool` fields
    /// become flags, scalar fields become variables and `None` is skipped.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, TemplateError> {
        serializer::to_context(value)
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_var(name, value);
        self
    }

    pub fn flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.set_flag(name, value);
        self
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }

    pub fn extend_flags<I, K>(&mut self, flags: I)
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        self.flags
            .extend(flags.into_iter().map(|(k, v)| (k.into(), v)));
    }

    pub fn get_var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn get_flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }
}

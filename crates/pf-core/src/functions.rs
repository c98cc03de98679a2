//! Caller-resolved named scalar functions.
//!
//! Models that reference a function (named system curves, named tank
//! inflows) store only its name, so they stay serializable. The caller
//! supplies the callables through a registry at solve time.

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

pub type ScalarFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, ScalarFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.register(name, f);
        self
    }

    /// Register a function, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ScalarFn> {
        self.functions.get(name)
    }

    pub fn evaluate(&self, name: &str, x: f64) -> Option<f64> {
        self.functions.get(name).map(|f| f(x))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_evaluate() {
        let reg = FunctionRegistry::new().with("double", |x| 2.0 * x);
        assert!(reg.contains("double"));
        assert_eq!(reg.evaluate("double", 3.0), Some(6.0));
        assert_eq!(reg.evaluate("missing", 3.0), None);
    }

    #[test]
    fn debug_lists_names_only() {
        let reg = FunctionRegistry::new().with("b", |x| x).with("a", |x| x);
        assert_eq!(
            format!("{reg:?}"),
            "FunctionRegistry { functions: [\"a\", \"b\"] }"
        );
    }
}

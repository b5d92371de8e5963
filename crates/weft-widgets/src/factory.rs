#![forbid(unsafe_code)]

//! Widget factories keyed by class name.
//!
//! The boundary contract for declarative UI loaders: the loader reads
//! a serialized widget tree and instantiates nodes through this
//! registry. The core ships factories for its stock widgets; apps
//! register their own under additional names.

use std::collections::HashMap;

use tracing::warn;

use crate::basic::{Button, Container, Label, Spacer};
use crate::widget::Widget;

type Factory = Box<dyn Fn() -> Box<dyn Widget>>;

/// Name-keyed widget constructors.
pub struct WidgetFactory {
    factories: HashMap<String, Factory>,
}

impl Default for WidgetFactory {
    fn default() -> Self {
        Self::with_stock_widgets()
    }
}

impl WidgetFactory {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry pre-loaded with the stock widget classes.
    #[must_use]
    pub fn with_stock_widgets() -> Self {
        let mut registry = Self::new();
        registry.register("Container", || Box::new(Container::new()));
        registry.register("Spacer", || Box::new(Spacer::new()));
        registry.register("Label", || Box::new(Label::new("")));
        registry.register("Button", || Box::new(Button::new("")));
        registry
    }

    /// Register a constructor under a class name, replacing any
    /// previous registration.
    pub fn register(
        &mut self,
        class: impl Into<String>,
        factory: impl Fn() -> Box<dyn Widget> + 'static,
    ) {
        self.factories.insert(class.into(), Box::new(factory));
    }

    /// Instantiate a widget by class name.
    ///
    /// Unknown classes log at WARN and return `None`.
    #[must_use]
    pub fn build(&self, class: &str) -> Option<Box<dyn Widget>> {
        match self.factories.get(class) {
            Some(factory) => Some(factory()),
            None => {
                warn!(class, "no widget factory registered");
                None
            }
        }
    }

    /// Registered class names, sorted.
    #[must_use]
    pub fn classes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

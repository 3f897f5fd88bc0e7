//! Inspector property descriptors.
//!
//! Scripts describe the properties an editor may show and tweak with a
//! declarative table, built once per type through [`Inspectable`]. Nothing
//! here inspects runtime values; the kind of each property is declared.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PropertyError;

/// How the editor should present a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Number,
    String,
    Boolean,
    Vector2,
    Color,
    Any,
}

/// One exposed property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub kind: PropertyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Help text shown next to the control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Inspector group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            min: None,
            max: None,
            step: None,
            hint: None,
            category: None,
        }
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Number)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::String)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Boolean)
    }

    pub fn vector2(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Vector2)
    }

    pub fn color(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Color)
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Check the numeric constraints.
    pub fn validate(&self) -> Result<(), PropertyError> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(PropertyError::InvalidRange {
                    name: self.name.clone(),
                    min,
                    max,
                });
            }
        }
        if let Some(step) = self.step {
            if step.is_nan() || step <= 0.0 {
                return Err(PropertyError::InvalidStep {
                    name: self.name.clone(),
                    step,
                });
            }
        }
        Ok(())
    }
}

/// A type's exposed properties, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyTable {
    properties: IndexMap<String, PropertyDescriptor>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validated descriptor. Names must be unique.
    pub fn insert(&mut self, descriptor: PropertyDescriptor) -> Result<(), PropertyError> {
        descriptor.validate()?;
        if self.properties.contains_key(&descriptor.name) {
            return Err(PropertyError::Duplicate(descriptor.name));
        }
        self.properties.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, descriptor: PropertyDescriptor) -> Result<Self, PropertyError> {
        self.insert(descriptor)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.values()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Serialize for the editor.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Implemented by script types that expose properties to an editor.
pub trait Inspectable {
    fn properties() -> Result<PropertyTable, PropertyError>;
}

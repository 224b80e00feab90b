//! Speaker name styling.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// RGBA color, rendered as `#RRGGBBAA` in rich-text markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    #[default]
    None,
    Bold,
    Italic,
    BoldItalic,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameStyle {
    pub name: String,
    #[serde(default)]
    pub color: Rgba,
    #[serde(default)]
    pub emphasis: Emphasis,
}

impl NameStyle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Rgba::default(),
            emphasis: Emphasis::default(),
        }
    }

    /// Renders the name with emphasis tags inside a color tag.
    pub fn render(&self) -> String {
        let body = match self.emphasis {
            Emphasis::None => self.name.clone(),
            Emphasis::Bold => format!("<b>{}</b>", self.name),
            Emphasis::Italic => format!("<i>{}</i>", self.name),
            Emphasis::BoldItalic => format!("<i><b>{}</b></i>", self.name),
        };
        format!("<color={}>{body}</color>", self.color)
    }
}

/// Name to style mapping, filled lazily as speakers are discovered.
///
/// Lookups use exact string matches. Entries are never removed
/// automatically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameStyleRegistry {
    styles: BTreeMap<String, NameStyle>,
}

impl NameStyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the default style for `name`. Returns false if it was known.
    pub fn register(&mut self, name: &str) -> bool {
        if self.styles.contains_key(name) {
            return false;
        }
        self.styles.insert(name.to_string(), NameStyle::new(name));
        true
    }

    /// Inserts or replaces an explicit style.
    pub fn set_style(&mut self, style: NameStyle) {
        self.styles.insert(style.name.clone(), style);
    }

    pub fn get(&self, name: &str) -> Option<&NameStyle> {
        self.styles.get(name)
    }

    /// Styled display string for `name`; unknown names come back unstyled.
    pub fn resolve(&self, name: &str) -> String {
        match self.styles.get(name) {
            Some(style) => style.render(),
            None => name.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameStyle> {
        self.styles.values()
    }
}

impl FromIterator<NameStyle> for NameStyleRegistry {
    fn from_iter<T: IntoIterator<Item = NameStyle>>(iter: T) -> Self {
        let mut registry = Self::new();
        for style in iter {
            registry.set_style(style);
        }
        registry
    }
}

//! Element geometry as seen by the engine
//!
//! The engine never measures anything itself. Hosts implement
//! [`LayoutProvider`] and the engine reads it through a [`LayoutCache`]
//! that is filled at most once per frame.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a presentation element
///
/// The engine only addresses elements, it never owns them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Element bounds in document coordinates, independent of the scroll offset
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementBox {
    pub top: f64,
    pub height: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub width: f64,
    /// Total scrollable width for horizontally overflowing content
    #[serde(default)]
    pub scroll_width: Option<f64>,
}

impl ElementBox {
    pub fn new(top: f64, height: f64) -> Self {
        Self {
            top,
            height,
            ..Default::default()
        }
    }

    pub fn with_scroll_width(mut self, scroll_width: f64) -> Self {
        self.scroll_width = Some(scroll_width);
        self
    }
}

/// Geometry queries the host answers for the engine
pub trait LayoutProvider {
    fn viewport(&self) -> Viewport;

    /// Total document height before any pin spacing
    fn document_height(&self) -> f64;

    /// `None` when the element is not (or no longer) attached
    fn element_box(&self, element: &ElementRef) -> Option<ElementBox>;
}

/// Per-frame snapshot of layout reads
///
/// Reads within a frame are answered from the snapshot so every trigger sees
/// the same geometry. `invalidate` marks cached trigger bounds stale after a
/// resize or content mutation.
#[derive(Debug, Default)]
pub struct LayoutCache {
    generation: u64,
    viewport: Option<Viewport>,
    document_height: Option<f64>,
    boxes: HashMap<ElementRef, Option<ElementBox>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the snapshot taken for the previous frame
    pub fn begin_frame(&mut self) {
        self.viewport = None;
        self.document_height = None;
        self.boxes.clear();
    }

    /// Layout changed structurally; anything derived from it is stale
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.begin_frame();
    }

    /// Bumped on every invalidation
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn viewport(&mut self, provider: &dyn LayoutProvider) -> Viewport {
        *self.viewport.get_or_insert_with(|| provider.viewport())
    }

    pub fn document_height(&mut self, provider: &dyn LayoutProvider) -> f64 {
        *self
            .document_height
            .get_or_insert_with(|| provider.document_height())
    }

    pub fn element_box(
        &mut self,
        provider: &dyn LayoutProvider,
        element: &ElementRef,
    ) -> Option<ElementBox> {
        if let Some(cached) = self.boxes.get(element) {
            return *cached;
        }
        let measured = provider.element_box(element);
        self.boxes.insert(element.clone(), measured);
        measured
    }
}

/// In-memory layout, used by scenes and tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticLayout {
    pub viewport: Viewport,
    pub document_height: f64,
    #[serde(default)]
    pub elements: HashMap<ElementRef, ElementBox>,
}

impl StaticLayout {
    pub fn new(viewport: Viewport, document_height: f64) -> Self {
        Self {
            viewport,
            document_height,
            elements: HashMap::new(),
        }
    }

    pub fn with_element(mut self, element: impl Into<ElementRef>, bounds: ElementBox) -> Self {
        self.elements.insert(element.into(), bounds);
        self
    }

    pub fn set_element(&mut self, element: impl Into<ElementRef>, bounds: ElementBox) {
        self.elements.insert(element.into(), bounds);
    }

    pub fn remove_element(&mut self, element: &ElementRef) -> Option<ElementBox> {
        self.elements.remove(element)
    }
}

impl LayoutProvider for StaticLayout {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn document_height(&self) -> f64 {
        self.document_height
    }

    fn element_box(&self, element: &ElementRef) -> Option<ElementBox> {
        self.elements.get(element).copied()
    }
}

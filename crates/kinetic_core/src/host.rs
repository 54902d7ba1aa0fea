//! Host collaborator contract
//!
//! The engine is embedded in something that owns real elements: a DOM, a
//! retained widget tree, a test double. [`LayoutHost`] is the whole surface the
//! engine needs from it. Frame scheduling goes the other way: the host calls
//! the engine's `tick` once per display refresh.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::element::ElementId;
use crate::geometry::BoundingBox;

/// Geometry queries and style writes, provided by the host
///
/// Methods take `&self`: hosts are shared between the engine and layout
/// tracker, so implementations use interior mutability.
pub trait LayoutHost {
    /// Current geometry of `element`, or `None` once it is detached
    fn bounding_box(&self, element: ElementId) -> Option<BoundingBox>;

    /// Write a named style value
    fn set_style(&self, element: ElementId, property: &str, value: &str);

    /// Read back a named style value
    fn style(&self, element: ElementId, property: &str) -> Option<String>;
}

/// One recorded style write
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleWrite {
    pub element: ElementId,
    pub property: String,
    pub value: String,
}

/// In-memory host for headless runs and tests
///
/// Stores geometry per attached element and keeps an ordered log of every
/// style write so callers can assert on write order.
#[derive(Default)]
pub struct MemoryHost {
    bounds: RefCell<FxHashMap<ElementId, BoundingBox>>,
    styles: RefCell<FxHashMap<(ElementId, String), String>>,
    writes: RefCell<Vec<StyleWrite>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an element (or move an attached one)
    pub fn set_bounds(&self, element: ElementId, bounds: BoundingBox) {
        self.bounds.borrow_mut().insert(element, bounds);
    }

    /// Detach an element; its styles are dropped with it
    pub fn detach(&self, element: ElementId) {
        self.bounds.borrow_mut().remove(&element);
        self.styles.borrow_mut().retain(|(el, _), _| *el != element);
    }

    pub fn is_attached(&self, element: ElementId) -> bool {
        self.bounds.borrow().contains_key(&element)
    }

    /// Snapshot of the write log
    pub fn writes(&self) -> Vec<StyleWrite> {
        self.writes.borrow().clone()
    }

    /// Drain the write log
    pub fn take_writes(&self) -> Vec<StyleWrite> {
        std::mem::take(&mut *self.writes.borrow_mut())
    }

    /// Writes to one element's property, oldest first
    pub fn writes_to(&self, element: ElementId, property: &str) -> Vec<String> {
        self.writes
            .borrow()
            .iter()
            .filter(|w| w.element == element && w.property == property)
            .map(|w| w.value.clone())
            .collect()
    }
}

impl LayoutHost for MemoryHost {
    fn bounding_box(&self, element: ElementId) -> Option<BoundingBox> {
        self.bounds.borrow().get(&element).copied()
    }

    fn set_style(&self, element: ElementId, property: &str, value: &str) {
        if !self.is_attached(element) {
            tracing::trace!(element = %element, property, value, "style write to detached element");
        }
        self.styles
            .borrow_mut()
            .insert((element, property.to_string()), value.to_string());
        self.writes.borrow_mut().push(StyleWrite {
            element,
            property: property.to_string(),
            value: value.to_string(),
        });
    }

    fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.styles
            .borrow()
            .get(&(element, property.to_string()))
            .cloned()
    }
}

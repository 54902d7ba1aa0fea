//! FLIP layout transitions
//!
//! - **F**irst: Record an element's bounds before a layout change
//! - **L**ast: Let the host compute the new bounds
//! - **I**nvert: Compute the transform that makes the new box look like the old
//! - **P**lay: Animate that transform back to identity
//!
//! The host owns layout truth. Nothing here moves an element's layout box;
//! only its `transform` is touched.

use std::cell::Cell;
use std::rc::Rc;
use std::str::FromStr;

use kinetic_animation::Easing;
use kinetic_core::{BoundingBox, ElementId, LayoutHost, MotionError, TransformComponent, TransformDelta};
use rustc_hash::FxHashMap;

// ============================================================================
// Transform Origin
// ============================================================================

/// Point of the element that stays fixed while it scales
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransformOrigin {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl TransformOrigin {
    /// Position inside the box as fractions of its width and height
    pub fn fractions(&self) -> (f32, f32) {
        match self {
            TransformOrigin::Center => (0.5, 0.5),
            TransformOrigin::TopLeft => (0.0, 0.0),
            TransformOrigin::TopRight => (1.0, 0.0),
            TransformOrigin::BottomLeft => (0.0, 1.0),
            TransformOrigin::BottomRight => (1.0, 1.0),
        }
    }

    /// CSS `transform-origin` value
    pub fn to_css(&self) -> &'static str {
        match self {
            TransformOrigin::Center => "center",
            TransformOrigin::TopLeft => "top left",
            TransformOrigin::TopRight => "top right",
            TransformOrigin::BottomLeft => "bottom left",
            TransformOrigin::BottomRight => "bottom right",
        }
    }

    /// Re-express a top-left delta so it holds when scaling about this origin
    ///
    /// Scaling by `s` about a point `o` of the box shifts its top-left corner
    /// by `o * size * (1 - s)`; the translation absorbs that shift.
    pub fn adjust(&self, delta: &TransformDelta, to: &BoundingBox) -> TransformDelta {
        let (ox, oy) = self.fractions();
        TransformDelta {
            x: delta.x + ox * to.width * (delta.scale_x - 1.0),
            y: delta.y + oy * to.height * (delta.scale_y - 1.0),
            ..*delta
        }
    }

    /// Where `layout` is drawn once `delta` is applied about this origin
    pub fn visual_bounds(&self, layout: &BoundingBox, delta: &TransformDelta) -> BoundingBox {
        let (ox, oy) = self.fractions();
        BoundingBox::new(
            layout.x + delta.x + ox * layout.width * (1.0 - delta.scale_x),
            layout.y + delta.y + oy * layout.height * (1.0 - delta.scale_y),
            layout.width * delta.scale_x,
            layout.height * delta.scale_y,
        )
    }
}

impl FromStr for TransformOrigin {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "center" => Ok(TransformOrigin::Center),
            "top-left" | "top left" => Ok(TransformOrigin::TopLeft),
            "top-right" | "top right" => Ok(TransformOrigin::TopRight),
            "bottom-left" | "bottom left" => Ok(TransformOrigin::BottomLeft),
            "bottom-right" | "bottom right" => Ok(TransformOrigin::BottomRight),
            other => Err(MotionError::InvalidOrigin(other.to_string())),
        }
    }
}

// ============================================================================
// Keyframes
// ============================================================================

/// Inputs for one FLIP keyframe pair
#[derive(Clone, Debug, PartialEq)]
pub struct FlipOptions {
    pub from: BoundingBox,
    pub to: BoundingBox,
    pub duration_ms: f32,
    pub easing: Easing,
    pub origin: TransformOrigin,
}

impl FlipOptions {
    pub fn new(from: BoundingBox, to: BoundingBox) -> Self {
        Self {
            from,
            to,
            duration_ms: 300.0,
            easing: Easing::EaseOut,
            origin: TransformOrigin::default(),
        }
    }

    pub fn duration(mut self, ms: f32) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn origin(mut self, origin: TransformOrigin) -> Self {
        self.origin = origin;
        self
    }
}

/// A uniquely named keyframe pair (inverted transform to identity) and the
/// class that plays it
#[derive(Clone, Debug, PartialEq)]
pub struct FlipKeyframeSet {
    pub style_text: String,
    pub rule_name: String,
    pub selector_class_name: String,
    /// The starting transform, origin-adjusted
    pub start: TransformDelta,
}

/// CSS transform text for a delta, in composition order
pub fn transform_css(delta: &TransformDelta) -> String {
    [
        (TransformComponent::TranslateX, delta.x),
        (TransformComponent::TranslateY, delta.y),
        (TransformComponent::ScaleX, delta.scale_x),
        (TransformComponent::ScaleY, delta.scale_y),
    ]
    .iter()
    .map(|(component, value)| component.to_css(*value))
    .collect::<Vec<_>>()
    .join(" ")
}

/// Identifier-safe form of a caller-supplied name
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    match cleaned.chars().next() {
        None => "kinetic".to_string(),
        Some(c) if c.is_ascii_digit() => format!("k{cleaned}"),
        Some(_) => cleaned,
    }
}

// ============================================================================
// Change Detection
// ============================================================================

/// Last known bounds per element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutSnapshot {
    bounds: FxHashMap<ElementId, BoundingBox>,
}

impl LayoutSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, element: ElementId) -> Option<BoundingBox> {
        self.bounds.get(&element).copied()
    }

    pub fn insert(&mut self, element: ElementId, bounds: BoundingBox) -> Option<BoundingBox> {
        self.bounds.insert(element, bounds)
    }

    pub fn remove(&mut self, element: ElementId) -> Option<BoundingBox> {
        self.bounds.remove(&element)
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

/// One element whose geometry moved past the noise thresholds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutChange {
    pub element: ElementId,
    /// Makes the new box look like the previous one
    pub delta: TransformDelta,
    pub previous: BoundingBox,
    pub current: BoundingBox,
}

// ============================================================================
// Engine
// ============================================================================

/// Geometry queries and FLIP computation against a host
pub struct LayoutTransitionEngine {
    host: Rc<dyn LayoutHost>,
    position_threshold: f32,
    scale_threshold: f32,
    next_name: Cell<u64>,
}

impl LayoutTransitionEngine {
    /// Changes must exceed 1 unit of position or 1% of scale to count
    pub fn new(host: Rc<dyn LayoutHost>) -> Self {
        Self {
            host,
            position_threshold: 1.0,
            scale_threshold: 0.01,
            next_name: Cell::new(0),
        }
    }

    pub fn with_thresholds(mut self, position: f32, scale: f32) -> Self {
        self.position_threshold = position;
        self.scale_threshold = scale;
        self
    }

    pub fn host(&self) -> &Rc<dyn LayoutHost> {
        &self.host
    }

    pub fn thresholds(&self) -> (f32, f32) {
        (self.position_threshold, self.scale_threshold)
    }

    /// Current bounds of `element`, or a zeroed box if it's detached
    pub fn measure_element(&self, element: ElementId) -> BoundingBox {
        self.host.bounding_box(element).unwrap_or_else(|| {
            tracing::warn!(element = %element, "measuring detached element");
            BoundingBox::zero()
        })
    }

    /// Measure every attached element in one pass
    ///
    /// Detached elements are left out of the snapshot.
    pub fn measure_batch(&self, elements: &[ElementId]) -> LayoutSnapshot {
        let mut snapshot = LayoutSnapshot::new();
        for element in elements {
            match self.host.bounding_box(*element) {
                Some(bounds) => {
                    snapshot.insert(*element, bounds);
                }
                None => tracing::debug!(element = %element, "skipping detached element"),
            }
        }
        snapshot
    }

    /// The delta that makes `to` look like `from` (top-left origin)
    pub fn calculate_transform_delta(from: &BoundingBox, to: &BoundingBox) -> TransformDelta {
        TransformDelta::between(from, to)
    }

    /// Whether a delta is large enough to animate
    pub fn is_significant(&self, delta: &TransformDelta) -> bool {
        delta.exceeds(self.position_threshold, self.scale_threshold)
    }

    /// Build a keyframe pair that starts at the inverted transform and ends at
    /// identity, plus a class that plays it once
    pub fn generate_flip_keyframes(&self, name: &str, options: &FlipOptions) -> FlipKeyframeSet {
        let serial = self.next_name.get() + 1;
        self.next_name.set(serial);

        let rule_name = format!("{}-flip-{}", sanitize(name), serial);
        let selector_class_name = format!("{rule_name}-active");
        let origin = options.origin.to_css();

        let start = options.origin.adjust(
            &Self::calculate_transform_delta(&options.from, &options.to),
            &options.to,
        );
        let end = TransformDelta::identity();

        let style_text = format!(
            "@keyframes {rule} {{\n  \
               from {{ transform: {from}; transform-origin: {origin}; }}\n  \
               to {{ transform: {to}; transform-origin: {origin}; }}\n\
             }}\n\
             .{class} {{\n  \
               animation: {rule} {duration}ms {easing} both;\n  \
               transform-origin: {origin};\n\
             }}\n",
            rule = rule_name,
            class = selector_class_name,
            from = transform_css(&start),
            to = transform_css(&end),
            duration = options.duration_ms.max(0.0),
            easing = options.easing.to_css(),
        );

        tracing::debug!(rule = %rule_name, ?start, "flip keyframes generated");
        FlipKeyframeSet {
            style_text,
            rule_name,
            selector_class_name,
            start,
        }
    }

    /// Re-measure `elements` against `previous`, reporting significant moves
    ///
    /// `previous` is updated to the fresh measurements, so calling again
    /// without a layout change reports nothing. Elements seen for the first
    /// time are recorded without a change; detached ones are skipped.
    pub fn detect_layout_changes(&self, elements: &[ElementId], previous: &mut LayoutSnapshot) -> Vec<LayoutChange> {
        let current = self.measure_batch(elements);

        let mut changes = Vec::new();
        for element in elements {
            let Some(now) = current.get(*element) else {
                continue;
            };
            let Some(before) = previous.insert(*element, now) else {
                continue;
            };
            let delta = Self::calculate_transform_delta(&before, &now);
            if self.is_significant(&delta) {
                tracing::debug!(element = %element, ?delta, "layout change detected");
                changes.push(LayoutChange {
                    element: *element,
                    delta,
                    previous: before,
                    current: now,
                });
            }
        }
        changes
    }
}

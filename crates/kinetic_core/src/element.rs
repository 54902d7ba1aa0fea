//! Element handles and animatable style slots

use std::fmt;
use std::str::FromStr;

/// Opaque handle for a host element
///
/// The host decides what the number means (a node id, an arena index, ...).
/// The engine only uses it as a map key and passes it back to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub u64);

impl From<u64> for ElementId {
    fn from(raw: u64) -> Self {
        ElementId(raw)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sub-part of an element's `transform` that a single value can drive
///
/// The declaration order is the order components appear in a composed
/// transform string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransformComponent {
    TranslateX,
    TranslateY,
    Rotate,
    Scale,
    ScaleX,
    ScaleY,
}

impl TransformComponent {
    pub fn name(&self) -> &'static str {
        match self {
            TransformComponent::TranslateX => "translateX",
            TransformComponent::TranslateY => "translateY",
            TransformComponent::Rotate => "rotate",
            TransformComponent::Scale => "scale",
            TransformComponent::ScaleX => "scaleX",
            TransformComponent::ScaleY => "scaleY",
        }
    }

    /// Value that leaves the element untransformed
    pub fn identity(&self) -> f32 {
        match self {
            TransformComponent::TranslateX
            | TransformComponent::TranslateY
            | TransformComponent::Rotate => 0.0,
            TransformComponent::Scale | TransformComponent::ScaleX | TransformComponent::ScaleY => {
                1.0
            }
        }
    }

    /// Render as a CSS transform function, e.g. `translateX(12px)`
    pub fn to_css(&self, value: f32) -> String {
        let v = css_number(value);
        match self {
            TransformComponent::TranslateX | TransformComponent::TranslateY => {
                format!("{}({}px)", self.name(), v)
            }
            TransformComponent::Rotate => format!("rotate({}deg)", v),
            TransformComponent::Scale | TransformComponent::ScaleX | TransformComponent::ScaleY => {
                format!("{}({})", self.name(), v)
            }
        }
    }
}

/// A named style slot a motion value can be bound to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StyleProperty {
    /// One component of the element's composed `transform`
    Transform(TransformComponent),
    Opacity,
    Width,
    Height,
    Top,
    Left,
    /// Any other host style name, written unitless
    Custom(String),
}

impl StyleProperty {
    pub const TRANSLATE_X: StyleProperty = StyleProperty::Transform(TransformComponent::TranslateX);
    pub const TRANSLATE_Y: StyleProperty = StyleProperty::Transform(TransformComponent::TranslateY);
    pub const ROTATE: StyleProperty = StyleProperty::Transform(TransformComponent::Rotate);
    pub const SCALE: StyleProperty = StyleProperty::Transform(TransformComponent::Scale);
    pub const SCALE_X: StyleProperty = StyleProperty::Transform(TransformComponent::ScaleX);
    pub const SCALE_Y: StyleProperty = StyleProperty::Transform(TransformComponent::ScaleY);

    /// Name used for classification and diagnostics
    pub fn name(&self) -> &str {
        match self {
            StyleProperty::Transform(component) => component.name(),
            StyleProperty::Opacity => "opacity",
            StyleProperty::Width => "width",
            StyleProperty::Height => "height",
            StyleProperty::Top => "top",
            StyleProperty::Left => "left",
            StyleProperty::Custom(name) => name,
        }
    }

    /// The host slot actually written; transform components share `transform`
    pub fn slot_name(&self) -> &str {
        match self {
            StyleProperty::Transform(_) => "transform",
            other => other.name(),
        }
    }

    pub fn transform_component(&self) -> Option<TransformComponent> {
        match self {
            StyleProperty::Transform(component) => Some(*component),
            _ => None,
        }
    }

    /// Render a scalar for this slot, with the slot's unit
    pub fn format_value(&self, value: f32) -> String {
        let v = css_number(value);
        match self {
            StyleProperty::Transform(component) => component.to_css(value),
            StyleProperty::Width | StyleProperty::Height | StyleProperty::Top | StyleProperty::Left => {
                format!("{}px", v)
            }
            StyleProperty::Opacity | StyleProperty::Custom(_) => format!("{}", v),
        }
    }

    pub fn is_hardware_accelerated(&self) -> bool {
        is_hardware_accelerated(self.name())
    }

    pub fn triggers_layout(&self) -> bool {
        LAYOUT_PROPERTIES.contains(&self.name())
    }
}

impl FromStr for StyleProperty {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "x" | "translateX" => StyleProperty::TRANSLATE_X,
            "y" | "translateY" => StyleProperty::TRANSLATE_Y,
            "rotate" => StyleProperty::ROTATE,
            "scale" => StyleProperty::SCALE,
            "scaleX" => StyleProperty::SCALE_X,
            "scaleY" => StyleProperty::SCALE_Y,
            "opacity" => StyleProperty::Opacity,
            "width" => StyleProperty::Width,
            "height" => StyleProperty::Height,
            "top" => StyleProperty::Top,
            "left" => StyleProperty::Left,
            other => StyleProperty::Custom(other.to_string()),
        })
    }
}

/// Properties the compositor can animate without layout or paint
const ACCELERATED_PROPERTIES: &[&str] = &[
    "transform",
    "translateX",
    "translateY",
    "rotate",
    "scale",
    "scaleX",
    "scaleY",
    "opacity",
    "filter",
    "backdrop-filter",
];

/// Properties whose change forces the host to re-run layout
const LAYOUT_PROPERTIES: &[&str] = &[
    "width",
    "height",
    "top",
    "left",
    "right",
    "bottom",
    "margin",
    "padding",
    "border-width",
    "font-size",
];

/// Whether animating `name` stays on the compositor
///
/// Diagnostic only: classification never changes how a value animates.
pub fn is_hardware_accelerated(name: &str) -> bool {
    ACCELERATED_PROPERTIES.contains(&name)
}

/// Round to three decimals and normalize `-0`
fn css_number(value: f32) -> f32 {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        assert!(StyleProperty::TRANSLATE_X.is_hardware_accelerated());
        assert!(StyleProperty::Opacity.is_hardware_accelerated());
        assert!(!StyleProperty::Width.is_hardware_accelerated());
        assert!(StyleProperty::Width.triggers_layout());
        assert!(!StyleProperty::SCALE.triggers_layout());
        assert!(is_hardware_accelerated("filter"));
        assert!(!is_hardware_accelerated("background-color"));
    }

    #[test]
    fn test_transform_slot_is_shared() {
        assert_eq!(StyleProperty::TRANSLATE_Y.slot_name(), "transform");
        assert_eq!(StyleProperty::ROTATE.slot_name(), "transform");
        assert_eq!(StyleProperty::Opacity.slot_name(), "opacity");
    }

    #[test]
    fn test_format_with_units() {
        assert_eq!(StyleProperty::TRANSLATE_X.format_value(12.5), "translateX(12.5px)");
        assert_eq!(StyleProperty::ROTATE.format_value(-0.0), "rotate(0deg)");
        assert_eq!(StyleProperty::SCALE.format_value(1.25), "scale(1.25)");
        assert_eq!(StyleProperty::Height.format_value(40.0), "40px");
        assert_eq!(StyleProperty::Opacity.format_value(0.3333333), "0.333");
    }

    #[test]
    fn test_parse_property_names() {
        assert_eq!("x".parse::<StyleProperty>().unwrap(), StyleProperty::TRANSLATE_X);
        assert_eq!("opacity".parse::<StyleProperty>().unwrap(), StyleProperty::Opacity);
        assert_eq!(
            "stroke-dashoffset".parse::<StyleProperty>().unwrap(),
            StyleProperty::Custom("stroke-dashoffset".into())
        );
    }
}

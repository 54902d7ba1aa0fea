//! Per-element transform composition
//!
//! Several motion values can drive parts of one element's `transform`
//! (`translateX` from one, `scale` from another). The host only has a single
//! `transform` slot, so every change re-renders the slot from the full set of
//! contributors registered for that element.
//!
//! The registry is a plain object. Engines hold it behind
//! `Rc<RefCell<TransformRegistry>>`, and several engines may share one.

use kinetic_core::{ElementId, TransformComponent};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle to one registered transform contributor
    pub struct ContributorId;
}

/// Stable per-element identifier, assigned on first registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompositionId(pub u64);

struct Contributor {
    element: ElementId,
    component: TransformComponent,
    value: f32,
}

struct ElementEntry {
    id: CompositionId,
    /// In registration order
    contributors: SmallVec<[ContributorId; 4]>,
    composed: String,
}

/// Registry of transform contributors, grouped by element
#[derive(Default)]
pub struct TransformRegistry {
    contributors: SlotMap<ContributorId, Contributor>,
    elements: FxHashMap<ElementId, ElementEntry>,
    next_id: u64,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contributor for `component` of `element`'s transform
    pub fn register(&mut self, element: ElementId, component: TransformComponent, value: f32) -> ContributorId {
        let key = self.contributors.insert(Contributor {
            element,
            component,
            value,
        });

        let next_id = &mut self.next_id;
        let entry = self.elements.entry(element).or_insert_with(|| {
            *next_id += 1;
            ElementEntry {
                id: CompositionId(*next_id),
                contributors: SmallVec::new(),
                composed: String::new(),
            }
        });
        entry.contributors.push(key);

        tracing::trace!(element = %element, component = component.name(), "transform contributor registered");
        self.recompose(element);
        key
    }

    /// Record a new value for one contributor
    ///
    /// Returns the element and its recomposed transform, built from every
    /// contributor currently registered on it.
    pub fn update(&mut self, contributor: ContributorId, value: f32) -> Option<(ElementId, String)> {
        let entry = self.contributors.get_mut(contributor)?;
        entry.value = value;
        let element = entry.element;
        self.recompose(element).map(|text| (element, text))
    }

    /// Remove one contributor
    ///
    /// Returns the element and what its transform should now read: the
    /// remaining contributors, or `none` when this was the last one (the
    /// element's entry is torn down in that case).
    pub fn unregister(&mut self, contributor: ContributorId) -> Option<(ElementId, String)> {
        let removed = self.contributors.remove(contributor)?;
        let element = removed.element;

        let now_empty = match self.elements.get_mut(&element) {
            Some(entry) => {
                entry.contributors.retain(|c| *c != contributor);
                entry.contributors.is_empty()
            }
            None => return None,
        };

        if now_empty {
            self.elements.remove(&element);
            tracing::trace!(element = %element, "transform composition torn down");
            return Some((element, "none".to_string()));
        }
        self.recompose(element).map(|text| (element, text))
    }

    /// Drop every contributor of a detached element
    ///
    /// Returns the removed contributor handles.
    pub fn unregister_element(&mut self, element: ElementId) -> Vec<ContributorId> {
        let Some(entry) = self.elements.remove(&element) else {
            return Vec::new();
        };
        for key in &entry.contributors {
            self.contributors.remove(*key);
        }
        tracing::debug!(element = %element, count = entry.contributors.len(), "element composition removed");
        entry.contributors.into_vec()
    }

    pub fn composition_id(&self, element: ElementId) -> Option<CompositionId> {
        self.elements.get(&element).map(|entry| entry.id)
    }

    /// The element's current composed transform text
    pub fn composed(&self, element: ElementId) -> Option<&str> {
        self.elements.get(&element).map(|entry| entry.composed.as_str())
    }

    pub fn contributor_count(&self, element: ElementId) -> usize {
        self.elements
            .get(&element)
            .map_or(0, |entry| entry.contributors.len())
    }

    pub fn is_registered(&self, element: ElementId) -> bool {
        self.elements.contains_key(&element)
    }

    pub fn element_of(&self, contributor: ContributorId) -> Option<ElementId> {
        self.contributors.get(contributor).map(|c| c.element)
    }

    /// Rebuild an element's transform from all of its contributors
    ///
    /// Components render in canonical order (translate, rotate, scale);
    /// contributors to the same component keep registration order.
    fn recompose(&mut self, element: ElementId) -> Option<String> {
        let entry = self.elements.get_mut(&element)?;

        let mut parts: SmallVec<[(TransformComponent, usize, f32); 4]> = entry
            .contributors
            .iter()
            .enumerate()
            .filter_map(|(order, key)| {
                self.contributors
                    .get(*key)
                    .map(|c| (c.component, order, c.value))
            })
            .collect();
        parts.sort_by_key(|(component, order, _)| (*component, *order));

        entry.composed = parts
            .iter()
            .map(|(component, _, value)| component.to_css(*value))
            .collect::<Vec<_>>()
            .join(" ");
        Some(entry.composed.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composes_all_contributors() {
        let mut registry = TransformRegistry::new();
        let el = ElementId(1);
        let scale = registry.register(el, TransformComponent::Scale, 1.0);
        let x = registry.register(el, TransformComponent::TranslateX, 0.0);

        assert_eq!(registry.composed(el), Some("translateX(0px) scale(1)"));

        let (element, text) = registry.update(x, 40.0).unwrap();
        assert_eq!(element, el);
        assert_eq!(text, "translateX(40px) scale(1)");

        let (_, text) = registry.update(scale, 1.5).unwrap();
        assert_eq!(text, "translateX(40px) scale(1.5)");
    }

    #[test]
    fn test_stable_id_per_element() {
        let mut registry = TransformRegistry::new();
        let a = ElementId(10);
        let b = ElementId(11);
        registry.register(a, TransformComponent::Rotate, 0.0);
        let id = registry.composition_id(a).unwrap();
        registry.register(a, TransformComponent::Scale, 1.0);
        registry.register(b, TransformComponent::Scale, 1.0);

        assert_eq!(registry.composition_id(a), Some(id));
        assert_ne!(registry.composition_id(b), Some(id));
    }

    #[test]
    fn test_unregister_keeps_others_and_tears_down_last() {
        let mut registry = TransformRegistry::new();
        let el = ElementId(3);
        let x = registry.register(el, TransformComponent::TranslateX, 5.0);
        let r = registry.register(el, TransformComponent::Rotate, 90.0);

        assert_eq!(registry.unregister(x), Some((el, "rotate(90deg)".to_string())));
        assert_eq!(registry.contributor_count(el), 1);

        assert_eq!(registry.unregister(r), Some((el, "none".to_string())));
        assert!(!registry.is_registered(el));
        assert_eq!(registry.unregister(r), None);
    }

    #[test]
    fn test_unregister_element_drops_contributors() {
        let mut registry = TransformRegistry::new();
        let el = ElementId(4);
        let x = registry.register(el, TransformComponent::TranslateX, 1.0);
        registry.register(el, TransformComponent::TranslateY, 2.0);

        assert_eq!(registry.unregister_element(el).len(), 2);
        assert_eq!(registry.update(x, 3.0), None);
        assert_eq!(registry.composed(el), None);
    }
}

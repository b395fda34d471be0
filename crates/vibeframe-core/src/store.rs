use serde::{Deserialize, Serialize};

pub trait Entity {
    fn id(&self) -> &str;
}

/// Insertion-ordered collection of entities keyed by their string id.
///
/// Relations between stores are plain ids resolved on each lookup, so
/// removing an entity only ever turns a lookup into a miss.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EntityStore<T> {
    items: Vec<T>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityStore<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn insert(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    /// Swaps the entity `id` for `replacements`, keeping its slot in iteration order.
    pub fn replace_with(&mut self, id: &str, replacements: impl IntoIterator<Item = T>) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.items.splice(index..=index, replacements);
        true
    }

    /// First id that occurs more than once, if any.
    #[must_use]
    pub fn duplicate_id(&self) -> Option<&str> {
        self.items.iter().enumerate().find_map(|(index, item)| {
            self.items[..index]
                .iter()
                .any(|earlier| earlier.id() == item.id())
                .then(|| item.id())
        })
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}

impl<'a, T> IntoIterator for &'a EntityStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> FromIterator<T> for EntityStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Named(&'static str);

    impl Entity for Named {
        fn id(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn replace_with_keeps_position() {
        let mut store: EntityStore<Named> =
            [Named("a"), Named("b"), Named("c")].into_iter().collect();
        assert!(store.replace_with("b", [Named("b1"), Named("b2")]));

        let ids: Vec<&str> = store.iter().map(Entity::id).collect();
        assert_eq!(ids, ["a", "b1", "b2", "c"]);
        assert!(!store.replace_with("missing", [Named("x")]));
    }

    #[test]
    fn remove_is_not_repeatable() {
        let mut store: EntityStore<Named> = [Named("a")].into_iter().collect();
        assert_eq!(store.remove("a"), Some(Named("a")));
        assert_eq!(store.remove("a"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_id_reports_second_occurrence() {
        let store: EntityStore<Named> = [Named("a"), Named("b"), Named("a")].into_iter().collect();
        assert_eq!(store.duplicate_id(), Some("a"));
    }
}

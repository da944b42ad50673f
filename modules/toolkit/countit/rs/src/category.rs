use std::fmt::{Display, Formatter};

use ahash::HashMap;

/// Annotation category assigned to (a part of) a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category<T> {
    /// Bases not covered by any annotation.
    Empty,
    Annotation(T),
}

impl<T> Category<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Category::Empty)
    }

    pub fn map<K>(&self, f: impl FnOnce(&T) -> K) -> Category<K> {
        match self {
            Category::Empty => Category::Empty,
            Category::Annotation(x) => Category::Annotation(f(x)),
        }
    }
}

impl<T> From<T> for Category<T> {
    fn from(value: T) -> Self {
        Category::Annotation(value)
    }
}

impl<T: Display> Display for Category<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Empty => write!(f, "<empty>"),
            Category::Annotation(x) => write!(f, "{}", x),
        }
    }
}

/// Weights of annotation categories for a single fragment or a whole library.
pub type Weights<T> = HashMap<Category<T>, f64>;

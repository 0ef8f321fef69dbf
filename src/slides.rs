use crate::error::{EngineError, Result};

/// One carousel entry. The payload is owned by the caller and never
/// inspected by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide<C> {
    pub index: usize,
    pub content: C,
}

/// Fixed, non-empty, ordered slide set.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideSet<C> {
    slides: Vec<Slide<C>>,
}

impl<C> SlideSet<C> {
    pub fn new(contents: impl IntoIterator<Item = C>) -> Result<Self> {
        let slides: Vec<Slide<C>> = contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| Slide { index, content })
            .collect();
        if slides.is_empty() {
            return Err(EngineError::EmptySlideSet);
        }
        Ok(Self { slides })
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide<C>> {
        self.slides.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slide<C>> {
        self.slides.iter()
    }
}

use serde::{Deserialize, Serialize};

use crate::catalog::Category;

/// Ordered set of categories that together make a complete outfit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutfitSlotTemplate {
    pub required: Vec<Category>,
}

impl OutfitSlotTemplate {
    pub fn new(required: impl Into<Vec<Category>>) -> Self {
        Self {
            required: required.into(),
        }
    }

    pub fn contains(&self, category: Category) -> bool {
        self.required.contains(&category)
    }

    /// Human readable form, e.g. "top + bottom + shoes".
    pub fn describe(&self) -> String {
        self.required
            .iter()
            .map(|category| category.label())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("outfit layout needs at least one template")]
    NoTemplates,
    #[error("template {0} has no required categories")]
    EmptyTemplate(usize),
    #[error("category {category} repeats within template {template}")]
    DuplicateCategory { template: usize, category: Category },
    #[error("category {0} cannot be both required and optional")]
    OptionalOverlap(Category),
}

/// Every way the engine may assemble an outfit: alternative required
/// templates plus add-on categories that never block validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotLayout {
    templates: Vec<OutfitSlotTemplate>,
    optional: Vec<Category>,
}

impl SlotLayout {
    /// Separates and dresses, each with optional jacket and accessory.
    pub fn standard() -> Self {
        Self {
            templates: vec![
                OutfitSlotTemplate::new([Category::Top, Category::Bottom, Category::Shoes]),
                OutfitSlotTemplate::new([Category::Dress, Category::Shoes]),
            ],
            optional: vec![Category::Jacket, Category::Accessory],
        }
    }

    pub fn new(
        templates: Vec<OutfitSlotTemplate>,
        optional: Vec<Category>,
    ) -> Result<Self, LayoutError> {
        if templates.is_empty() {
            return Err(LayoutError::NoTemplates);
        }

        for (index, template) in templates.iter().enumerate() {
            if template.required.is_empty() {
                return Err(LayoutError::EmptyTemplate(index));
            }
            for (position, category) in template.required.iter().enumerate() {
                if template.required[..position].contains(category) {
                    return Err(LayoutError::DuplicateCategory {
                        template: index,
                        category: *category,
                    });
                }
                if optional.contains(category) {
                    return Err(LayoutError::OptionalOverlap(*category));
                }
            }
        }

        let mut unique = Vec::with_capacity(optional.len());
        for category in optional {
            if !unique.contains(&category) {
                unique.push(category);
            }
        }

        Ok(Self {
            templates,
            optional: unique,
        })
    }

    pub fn templates(&self) -> &[OutfitSlotTemplate] {
        &self.templates
    }

    pub fn optional(&self) -> &[Category] {
        &self.optional
    }

    pub fn is_optional(&self, category: Category) -> bool {
        self.optional.contains(&category)
    }
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self::standard()
    }
}

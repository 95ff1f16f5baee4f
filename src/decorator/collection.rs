//! Collections of decorated models
//!
//! Items are wrapped in a `data` property so that metadata (pagination,
//! counts) can sit at the root:
//!
//! ```json
//! {"type": "list", "data": [{"id": 1}, {"id": 2}], "total_entries": 2}
//! ```

use super::RenderOptions;
use super::association::DecoratorSpec;
use super::pagination::Page;
use crate::core::error::DecoratorResult;
use crate::core::model::Model;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Renders a list of models with a shared item decorator
#[derive(Debug, Clone, Default)]
pub struct CollectionDecorator {
    instance: Option<DecoratorSpec>,
}

impl CollectionDecorator {
    /// Items are rendered with their own `as_json`
    pub fn new() -> Self {
        Self::default()
    }

    /// Decorate each item with `instance`
    pub fn decorate_with(instance: impl Into<DecoratorSpec>) -> Self {
        Self {
            instance: Some(instance.into()),
        }
    }

    /// Pick the item decorator per item
    pub fn decorate_with_fn<F>(factory: F) -> Self
    where
        F: Fn(&dyn Model) -> Arc<super::DecoratorType> + Send + Sync + 'static,
    {
        Self {
            instance: Some(DecoratorSpec::Factory(Arc::new(factory))),
        }
    }

    /// Render every item with the same options
    pub fn render(&self, items: &[Arc<dyn Model>], options: &RenderOptions) -> DecoratorResult<Map<String, Value>> {
        tracing::debug!(items = items.len(), "Rendering collection");

        let data = items
            .iter()
            .map(|item| self.render_item(item.as_ref(), options))
            .collect::<DecoratorResult<Vec<_>>>()?;

        let mut output = Map::new();
        output.insert("type".to_string(), Value::String("list".to_string()));
        output.insert("data".to_string(), Value::Array(data));
        Ok(output)
    }

    /// Render one page of items with its pagination metadata
    pub fn render_page(
        &self,
        items: &[Arc<dyn Model>],
        page: &Page,
        options: &RenderOptions,
    ) -> DecoratorResult<Map<String, Value>> {
        let mut output = self.render(items, options)?;
        page.merge_into(&mut output);
        Ok(output)
    }

    pub fn to_json(&self, items: &[Arc<dyn Model>], options: &RenderOptions) -> DecoratorResult<Value> {
        self.render(items, options).map(Value::Object)
    }

    fn render_item(&self, item: &dyn Model, options: &RenderOptions) -> DecoratorResult<Value> {
        match &self.instance {
            Some(spec) => spec.resolve(item).to_json(item, options),
            None => Ok(item.as_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{DecoratorError, ExpansionError};
    use crate::core::object::Object;
    use crate::decorator::DecoratorType;
    use crate::decorator::association::{ExpandSet, ReflectionOptions};
    use serde_json::json;

    fn items() -> Vec<Arc<dyn Model>> {
        vec![
            Object::new("Article").with("id", 1i64).with("title", "One").shared(),
            Object::new("Article").with("id", 2i64).with("title", "Two").shared(),
        ]
    }

    #[test]
    fn test_render_with_decorator() {
        let article = DecoratorType::builder("ArticleDecorator")
            .property("id")
            .build()
            .unwrap();

        let json = CollectionDecorator::decorate_with(article)
            .to_json(&items(), &RenderOptions::new())
            .unwrap();
        assert_eq!(json, json!({"type": "list", "data": [{"id": 1}, {"id": 2}]}));
    }

    #[test]
    fn test_render_without_decorator() {
        let json = CollectionDecorator::new()
            .to_json(&items(), &RenderOptions::new())
            .unwrap();
        assert_eq!(json["data"][1], json!({"id": 2, "title": "Two"}));
    }

    #[test]
    fn test_factory_picks_decorator_per_item() {
        let short = DecoratorType::builder("ShortDecorator").property("id").build().unwrap();
        let long = DecoratorType::builder("LongDecorator")
            .property("id")
            .property("title")
            .build()
            .unwrap();

        let collection = CollectionDecorator::decorate_with_fn(move |item| {
            if item.id() == Some(1i64.into()) {
                Arc::clone(&short)
            } else {
                Arc::clone(&long)
            }
        });

        let json = collection.to_json(&items(), &RenderOptions::new()).unwrap();
        assert_eq!(json["data"], json!([{"id": 1}, {"id": 2, "title": "Two"}]));
    }

    #[test]
    fn test_items_share_expand_options() {
        let author = DecoratorType::builder("AuthorDecorator").property("name").build().unwrap();
        let article = DecoratorType::builder("ArticleDecorator")
            .property("id")
            .belongs_to(
                "author",
                ReflectionOptions::new().expandable(true).decorator(author),
            )
            .unwrap()
            .build()
            .unwrap();
        let items: Vec<Arc<dyn Model>> = vec![
            Object::new("Article")
                .with("id", 1i64)
                .with_association("author", Object::new("Author").with("id", "a1").with("name", "Ann"))
                .shared(),
        ];
        let collection = CollectionDecorator::decorate_with(article);

        let json = collection
            .to_json(&items, &RenderOptions::new().with_expand(ExpandSet::parse("author")))
            .unwrap();
        assert_eq!(json["data"][0]["author"], json!({"name": "Ann"}));

        let err = collection
            .to_json(&items, &RenderOptions::new().with_expand(ExpandSet::parse("editor")))
            .unwrap_err();
        assert!(matches!(
            err,
            DecoratorError::Expansion(ExpansionError::AssociationNotFound { .. })
        ));
    }

    #[test]
    fn test_render_page() {
        let output = CollectionDecorator::new()
            .render_page(&items(), &Page::new(1, 2, 5), &RenderOptions::new())
            .unwrap();

        assert_eq!(output["total_pages"], json!(3));
        assert_eq!(output["next_page"], json!(2));
        assert_eq!(output["data"].as_array().map(Vec::len), Some(2));
    }
}

//! Product image lookups with a shared, never-evicted cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::domain::{OrderItem, ProductId};
use crate::port::ProductCatalog;

/// Image shown when a product has no image or the lookup failed.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=150&width=200";

/// Resolves product images through a [`ProductCatalog`], caching every
/// answer (the placeholder included) for the lifetime of the cache.
///
/// Pass one instance to every consumer that should share lookups.
pub struct ProductImageCache {
    catalog: Arc<dyn ProductCatalog>,
    images: RwLock<HashMap<ProductId, String>>,
    placeholder: String,
}

impl ProductImageCache {
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self::with_placeholder(catalog, PLACEHOLDER_IMAGE)
    }

    pub fn with_placeholder(catalog: Arc<dyn ProductCatalog>, placeholder: impl Into<String>) -> Self {
        Self {
            catalog,
            images: RwLock::new(HashMap::new()),
            placeholder: placeholder.into(),
        }
    }

    /// Image URL for a product. Empty ids resolve to the placeholder
    /// without a lookup.
    pub async fn image_for(&self, id: &ProductId) -> String {
        if id.is_empty() {
            return self.placeholder.clone();
        }
        if let Some(url) = self.cached(id) {
            return url;
        }

        let url = match self.catalog.product_image(id).await {
            Ok(Some(url)) if !url.trim().is_empty() => url,
            Ok(_) => {
                debug!(product_id = %id, "Product has no image");
                self.placeholder.clone()
            }
            Err(e) => {
                warn!(product_id = %id, error = %e, "Product image lookup failed");
                self.placeholder.clone()
            }
        };
        self.images
            .write()
            .entry(id.clone())
            .or_insert(url)
            .clone()
    }

    /// Image for an order line: the snapshot taken at checkout if present,
    /// otherwise a catalog lookup.
    pub async fn image_for_item(&self, item: &OrderItem) -> String {
        match item.image.as_deref() {
            Some(url) if !url.trim().is_empty() => url.to_string(),
            _ => self.image_for(&item.product_id).await,
        }
    }

    /// Cached answer, if any.
    #[must_use]
    pub fn cached(&self, id: &ProductId) -> Option<String> {
        self.images.read().get(id).cloned()
    }

    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Number of cached products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::item;
    use crate::testkit::repository::StaticCatalog;

    fn cache(catalog: &StaticCatalog) -> ProductImageCache {
        ProductImageCache::new(Arc::new(catalog.clone()))
    }

    #[tokio::test]
    async fn test_lookup_is_cached() {
        let catalog = StaticCatalog::new(&[("p-1", "https://cdn/bread.png")]);
        let cache = cache(&catalog);
        let id = ProductId::new("p-1");

        assert_eq!(cache.image_for(&id).await, "https://cdn/bread.png");
        assert_eq!(cache.image_for(&id).await, "https://cdn/bread.png");

        assert_eq!(catalog.lookups(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_and_failed_products_cache_placeholder() {
        let catalog = StaticCatalog::new(&[]).with_failures(&["broken"]);
        let cache = cache(&catalog);

        assert_eq!(cache.image_for(&ProductId::new("gone")).await, PLACEHOLDER_IMAGE);
        assert_eq!(cache.image_for(&ProductId::new("broken")).await, PLACEHOLDER_IMAGE);
        assert_eq!(cache.image_for(&ProductId::new("broken")).await, PLACEHOLDER_IMAGE);

        assert_eq!(catalog.lookups(), 2);
        assert_eq!(
            cache.cached(&ProductId::new("gone")).as_deref(),
            Some(PLACEHOLDER_IMAGE)
        );
    }

    #[tokio::test]
    async fn test_empty_id_skips_lookup() {
        let catalog = StaticCatalog::new(&[]);
        let cache = cache(&catalog);

        assert_eq!(cache.image_for(&ProductId::new("")).await, PLACEHOLDER_IMAGE);
        assert_eq!(catalog.lookups(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_item_snapshot_wins_over_catalog() {
        let catalog = StaticCatalog::new(&[("p-1", "https://cdn/catalog.png")]);
        let cache = cache(&catalog);
        let mut line = item("p-1", "Bread", 1);

        assert_eq!(cache.image_for_item(&line).await, "https://cdn/catalog.png");

        line.image = Some("https://cdn/snapshot.png".into());
        assert_eq!(cache.image_for_item(&line).await, "https://cdn/snapshot.png");
        assert_eq!(catalog.lookups(), 1);
    }

    #[tokio::test]
    async fn test_shared_instances_share_entries() {
        let catalog = StaticCatalog::new(&[("p-1", "https://cdn/bread.png")]);
        let shared = Arc::new(cache(&catalog));
        let other = shared.clone();

        shared.image_for(&ProductId::new("p-1")).await;
        other.image_for(&ProductId::new("p-1")).await;

        assert_eq!(catalog.lookups(), 1);
    }
}

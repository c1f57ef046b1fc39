//! Catalog read paths: search and featured listings.
//!
//! Both reads are cache-aside. The key is derived from the query
//! parameters, hits carry `from_cache: true`, and misses write back with
//! a fixed TTL. Mutations do not invalidate these keys; entries age out.

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use crate::{
    cache::AppCache,
    entities::product::{self, Entity as ProductEntity, Model as ProductModel},
    errors::ServiceError,
};

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ProductSearchQuery {
    /// Free-text query matched against name, description and SKU
    pub q: Option<String>,
    pub category: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub products: Vec<ProductModel>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CachedProductPage {
    #[serde(flatten)]
    pub page: ProductPage,
    pub from_cache: bool,
}

/// Product search and featured listings with cache-aside reads
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    cache: AppCache,
    search_ttl: Duration,
    listing_ttl: Duration,
}

impl CatalogService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cache: AppCache,
        search_ttl: Duration,
        listing_ttl: Duration,
    ) -> Self {
        Self {
            db,
            cache,
            search_ttl,
            listing_ttl,
        }
    }

    fn search_cache_key(&self, query: &ProductSearchQuery) -> String {
        let q = query.q.as_deref().unwrap_or("");
        let category = query.category.as_deref().unwrap_or("");
        self.cache.key(&[
            "search",
            &format!("q={}", q.trim().to_lowercase()),
            &format!("cat={}", category.trim().to_lowercase()),
            &format!("page={}", query.page),
            &format!("limit={}", query.limit),
        ])
    }

    /// `LIKE`-based catalog search
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: ProductSearchQuery,
    ) -> Result<CachedProductPage, ServiceError> {
        let key = self.search_cache_key(&query);

        if let Some(cached) = self.cache.get_json::<ProductPage>(&key).await {
            return Ok(CachedProductPage {
                page: cached,
                from_cache: true,
            });
        }

        let mut db_query = ProductEntity::find().filter(product::Column::IsActive.eq(true));

        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            db_query = db_query.filter(
                Condition::any()
                    .add(product::Column::Name.contains(q))
                    .add(product::Column::Description.contains(q))
                    .add(product::Column::Sku.contains(q)),
            );
        }
        if let Some(category) = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            db_query = db_query.filter(product::Column::Category.eq(category));
        }

        let limit = query.limit.clamp(1, MAX_LIMIT);
        let paginator = db_query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(query.page.saturating_sub(1)).await?;

        let page = ProductPage {
            products,
            total,
            page: query.page,
            limit,
        };

        self.cache.put_json(&key, &page, self.search_ttl).await;

        Ok(CachedProductPage {
            page,
            from_cache: false,
        })
    }

    /// Featured products, newest first
    #[instrument(skip(self))]
    pub async fn featured(&self) -> Result<CachedProductPage, ServiceError> {
        let key = self.cache.key(&["products", "featured"]);

        if let Some(cached) = self.cache.get_json::<ProductPage>(&key).await {
            return Ok(CachedProductPage {
                page: cached,
                from_cache: true,
            });
        }

        let products = ProductEntity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::IsFeatured.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let page = ProductPage {
            total: products.len() as u64,
            page: 1,
            limit: products.len().max(1) as u64,
            products,
        };

        self.cache.put_json(&key, &page, self.listing_ttl).await;

        Ok(CachedProductPage {
            page,
            from_cache: false,
        })
    }
}

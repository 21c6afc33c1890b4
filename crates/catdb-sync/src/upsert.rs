//! Dedup & upsert: the only code path that writes catalog rows.

use std::sync::Arc;

use catdb_core::{CatalogStore, NormalizedProduct, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertResult {
    /// `true` when a new row was inserted.
    pub created: bool,
    pub id: i64,
}

/// States of one upsert. A unique conflict on insert moves to
/// `RetryAsUpdate` rather than failing, since it means another writer
/// inserted the same product between our lookup and our insert.
#[derive(Debug)]
enum Step {
    Resolve,
    Insert,
    Update(i64),
    RetryAsUpdate(StoreError),
    Done(UpsertResult),
}

/// Resolves a normalized product to an existing row, by external id then by
/// name, and writes it.
///
/// Name fallback merges two distinct products that share a name within one
/// brand; that behavior is kept so sources whose ids drift between runs do
/// not accumulate duplicates.
pub struct UpsertEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: CatalogStore + ?Sized> UpsertEngine<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Finds the row `product` would update, without writing anything.
    ///
    /// # Errors
    ///
    /// Propagates store lookup failures.
    pub async fn resolve(&self, product: &NormalizedProduct) -> Result<Option<i64>, StoreError> {
        if let Some(id) = self
            .store
            .find_by_brand_and_external_id(product.brand_id, &product.external_id)
            .await?
        {
            return Ok(Some(id));
        }
        self.store
            .find_by_brand_and_name(product.brand_id, &product.name)
            .await
    }

    /// Inserts or updates `product`, then replaces its category links.
    ///
    /// # Errors
    ///
    /// Returns the store error for any failed lookup or write. A unique
    /// violation is only returned when the conflicting row cannot be found
    /// again afterwards.
    pub async fn upsert(&self, product: &NormalizedProduct) -> Result<UpsertResult, StoreError> {
        let mut step = Step::Resolve;

        let result = loop {
            step = match step {
                Step::Resolve => match self.resolve(product).await? {
                    Some(id) => Step::Update(id),
                    None => Step::Insert,
                },
                Step::Insert => match self.store.insert_product(product).await {
                    Ok(id) => Step::Done(UpsertResult { created: true, id }),
                    Err(e) if e.is_unique_violation() => Step::RetryAsUpdate(e),
                    Err(e) => return Err(e),
                },
                Step::Update(id) => {
                    self.store.update_product(id, product).await?;
                    Step::Done(UpsertResult { created: false, id })
                }
                Step::RetryAsUpdate(conflict) => {
                    tracing::debug!(
                        brand_id = product.brand_id,
                        external_id = %product.external_id,
                        error = %conflict,
                        "insert conflicted, retrying as update"
                    );
                    let existing = match self
                        .store
                        .find_by_brand_and_name(product.brand_id, &product.name)
                        .await?
                    {
                        Some(id) => Some(id),
                        None => {
                            self.store
                                .find_by_brand_and_external_id(product.brand_id, &product.external_id)
                                .await?
                        }
                    };
                    match existing {
                        Some(id) => Step::Update(id),
                        None => return Err(conflict),
                    }
                }
                Step::Done(result) => break result,
            };
        };

        self.store
            .replace_category_associations(result.id, &product.category_ids())
            .await?;
        Ok(result)
    }
}

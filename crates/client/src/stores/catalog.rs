//! Catalog slice: categories (by facet) and the paginated product list.
//!
//! The product list has one query identity at a time - the combination of
//! selected category, search term, and diet filter. Changing any of those
//! resets pagination and logically cancels whatever fetch is in flight, so
//! a slow page for the old identity can never land in the new one. Page 1
//! replaces the collection; later pages append with duplicate-id
//! suppression.
//!
//! Category facets (plain / high-protein / quick-delivery) are three
//! independent slots; fetching one never touches another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument, warn};

use tiffin_core::{CategoryFacet, CategoryId, DietType};

use crate::endpoints;
use crate::entity::EntityStore;
use crate::normalize::{self, PageInfo};
use crate::registry::ChangeNotifier;
use crate::request::RequestEnvelope;
use crate::transport::{Method, RequestContext, Transport};
use crate::types::{Category, Product};

/// One facet's categories plus its fetch envelope.
#[derive(Debug, Default)]
struct FacetSlot {
    categories: EntityStore<Category>,
    request: RequestEnvelope,
}

#[derive(Debug, Default)]
struct CatalogState {
    plain: FacetSlot,
    high_protein: FacetSlot,
    quick_delivery: FacetSlot,
    products: EntityStore<Product>,
    products_request: RequestEnvelope,
    pagination: PageInfo,
    selected_category: Option<CategoryId>,
    search_query: Option<String>,
    diet_filter: Option<DietType>,
}

impl CatalogState {
    fn slot_mut(&mut self, facet: CategoryFacet) -> &mut FacetSlot {
        match facet {
            CategoryFacet::Plain => &mut self.plain,
            CategoryFacet::HighProtein => &mut self.high_protein,
            CategoryFacet::QuickDelivery => &mut self.quick_delivery,
        }
    }

    fn slot(&self, facet: CategoryFacet) -> &FacetSlot {
        match facet {
            CategoryFacet::Plain => &self.plain,
            CategoryFacet::HighProtein => &self.high_protein,
            CategoryFacet::QuickDelivery => &self.quick_delivery,
        }
    }

    /// Query identity changed: restart pagination and cancel the in-flight
    /// fetch logically. Existing products stay visible until the new page 1
    /// replaces them (non-destructive).
    fn reset_products(&mut self) {
        self.pagination = PageInfo::default();
        self.products_request.invalidate();
    }
}

/// One facet's view in a snapshot.
#[derive(Debug, Clone)]
pub struct FacetSnapshot {
    pub categories: Vec<Category>,
    pub request: RequestEnvelope,
}

/// Immutable catalog view for screens.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub plain: FacetSnapshot,
    pub high_protein: FacetSnapshot,
    pub quick_delivery: FacetSnapshot,
    pub products: Vec<Product>,
    pub products_request: RequestEnvelope,
    pub pagination: PageInfo,
    pub selected_category: Option<CategoryId>,
    pub search_query: Option<String>,
    pub diet_filter: Option<DietType>,
}

impl CatalogSnapshot {
    /// The snapshot slot for a facet.
    #[must_use]
    pub const fn facet(&self, facet: CategoryFacet) -> &FacetSnapshot {
        match facet {
            CategoryFacet::Plain => &self.plain,
            CategoryFacet::HighProtein => &self.high_protein,
            CategoryFacet::QuickDelivery => &self.quick_delivery,
        }
    }
}

/// The catalog slice.
#[derive(Debug)]
pub struct CatalogStore<T> {
    inner: Arc<CatalogInner<T>>,
}

impl<T> Clone for CatalogStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug)]
struct CatalogInner<T> {
    transport: Arc<T>,
    context: RequestContext,
    state: Mutex<CatalogState>,
    notifier: ChangeNotifier,
}

impl<T: Transport> CatalogStore<T> {
    pub(crate) fn new(transport: Arc<T>, context: RequestContext, notifier: ChangeNotifier) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                transport,
                context,
                state: Mutex::new(CatalogState::default()),
                notifier,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the category list for one facet.
    ///
    /// Idempotent: a pending or already-populated facet is a no-op, which
    /// absorbs repeated mount-triggered calls from the screens.
    #[instrument(skip(self))]
    pub async fn fetch_categories(&self, facet: CategoryFacet) {
        let token = {
            let mut state = self.lock();
            let slot = state.slot_mut(facet);
            if slot.request.is_pending() {
                debug!("category fetch already pending");
                return;
            }
            if !slot.categories.is_empty() {
                debug!("categories already loaded");
                return;
            }
            slot.request.begin()
        };
        self.inner.notifier.notify();

        let path = endpoints::categories(facet);
        let result = self.inner.transport.request(Method::Get, &path, None).await;

        {
            let mut state = self.lock();
            let slot = state.slot_mut(facet);
            match result.and_then(normalize::many::<Category>) {
                Ok(categories) => {
                    if slot.request.succeed(token) {
                        slot.categories.replace_all(categories);
                    } else {
                        debug!("stale category response discarded");
                    }
                }
                Err(e) => {
                    if slot.request.fail(token, e.user_message()) {
                        warn!(error = %e, "category fetch failed");
                    }
                }
            }
        }
        self.inner.notifier.notify();
    }

    /// Fetch one page of products for the current query identity.
    ///
    /// Page 1 replaces the collection; later pages append with duplicate-id
    /// suppression, and are only issued when the previous page reported a
    /// next page. A fetch already in flight makes this a no-op (re-entrancy
    /// guard against fast repeated scroll triggers).
    #[instrument(skip(self))]
    pub async fn fetch_products(&self, page: u32, limit: u32) {
        let (token, path) = {
            let mut state = self.lock();
            if state.products_request.is_pending() {
                debug!("product fetch already pending");
                return;
            }
            if page > 1 && !state.pagination.has_next_page {
                debug!("no next page to fetch");
                return;
            }
            let path = endpoints::products(
                page,
                limit,
                state.selected_category.as_ref(),
                state.search_query.as_deref(),
            );
            (state.products_request.begin(), path)
        };
        self.inner.notifier.notify();

        let result = self.inner.transport.request(Method::Get, &path, None).await;

        {
            let mut state = self.lock();
            match result.and_then(normalize::paginated::<Product>) {
                Ok(fetched) => {
                    if state.products_request.succeed(token) {
                        if page <= 1 {
                            state.products.replace_all(fetched.items);
                        } else {
                            state.products.append_dedup(fetched.items);
                        }
                        let mut info = fetched.info;
                        if info.current_page == 0 {
                            info.current_page = page;
                        }
                        state.pagination = info;
                    } else {
                        debug!("stale product page discarded");
                    }
                }
                Err(e) => {
                    // Prior data stays visible; the envelope carries the error.
                    if state.products_request.fail(token, e.user_message()) {
                        warn!(error = %e, "product fetch failed");
                    }
                }
            }
        }
        self.inner.notifier.notify();
    }

    /// Change the selected category. Resets pagination and logically
    /// cancels any in-flight product fetch.
    pub fn set_selected_category(&self, category: Option<CategoryId>) {
        {
            let mut state = self.lock();
            if state.selected_category == category {
                return;
            }
            state.selected_category = category;
            state.reset_products();
        }
        self.inner.notifier.notify();
    }

    /// Change the search term. An empty or whitespace-only term clears the
    /// search. Resets pagination and logically cancels any in-flight fetch.
    pub fn set_search_query(&self, query: Option<String>) {
        let query = query.filter(|q| !q.trim().is_empty());
        {
            let mut state = self.lock();
            if state.search_query == query {
                return;
            }
            state.search_query = query;
            state.reset_products();
        }
        self.inner.notifier.notify();
    }

    /// Change the diet filter. Published to the shared request context so
    /// the transport sends it as the `type` header on every request.
    pub fn set_diet_filter(&self, diet: Option<DietType>) {
        {
            let mut state = self.lock();
            if state.diet_filter == diet {
                return;
            }
            state.diet_filter = diet;
            state.reset_products();
        }
        self.inner.context.set_diet(diet);
        self.inner.notifier.notify();
    }

    /// Restart pagination for the current query identity without changing
    /// it (pull-to-refresh).
    pub fn reset_pagination(&self) {
        {
            let mut state = self.lock();
            state.reset_products();
        }
        self.inner.notifier.notify();
    }

    /// Current catalog state.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.lock();
        let facet = |slot: &FacetSlot| FacetSnapshot {
            categories: slot.categories.to_vec(),
            request: slot.request.clone(),
        };
        CatalogSnapshot {
            plain: facet(state.slot(CategoryFacet::Plain)),
            high_protein: facet(state.slot(CategoryFacet::HighProtein)),
            quick_delivery: facet(state.slot(CategoryFacet::QuickDelivery)),
            products: state.products.to_vec(),
            products_request: state.products_request.clone(),
            pagination: state.pagination,
            selected_category: state.selected_category.clone(),
            search_query: state.search_query.clone(),
            diet_filter: state.diet_filter,
        }
    }
}

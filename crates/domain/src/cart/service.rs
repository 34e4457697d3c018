//! Store-backed cart service.

use common::OwnerId;
use docstore::{Document, DocumentStore, DocumentStoreExt, PutOptions, Version};

use crate::collections;
use crate::error::DomainError;
use crate::value_objects::ProductRef;

use super::{Cart, CartLine};

/// A read-consistent view of a cart taken at the start of a checkout.
///
/// The version token identifies the exact cart document the snapshot was
/// read from; the checkout's final clear carries it, so any concurrent cart
/// mutation surfaces as a concurrency conflict instead of being silently
/// lost.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    /// The owning user.
    pub owner: OwnerId,

    /// The cart lines at snapshot time.
    pub lines: Vec<CartLine>,

    /// The cart document version the snapshot was read from.
    pub version: Version,
}

impl CartSnapshot {
    /// Returns true if the snapshot has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Service for managing carts.
///
/// Carts are stored one document per owner, keyed by the owner ID. All
/// mutations are optimistic-concurrency writes against the version read.
pub struct CartService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> CartService<S> {
    /// Creates a new cart service with the given document store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads an owner's cart, creating an empty one if none exists yet.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create(&self, owner: OwnerId) -> Result<Cart, DomainError> {
        let (cart, _) = self.load(owner).await?;
        Ok(cart)
    }

    /// Adds a line to an owner's cart, merging by sum into an existing line.
    #[tracing::instrument(skip(self))]
    pub async fn add_or_merge_line(
        &self,
        owner: OwnerId,
        product: ProductRef,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        let (mut cart, version) = self.load(owner).await?;
        cart.add_line(product, quantity)?;
        self.save(&cart, version).await?;
        Ok(cart)
    }

    /// Replaces the quantity of an existing line; 0 removes it.
    #[tracing::instrument(skip(self))]
    pub async fn set_line_quantity(
        &self,
        owner: OwnerId,
        product: ProductRef,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        let (mut cart, version) = self.load(owner).await?;
        cart.set_line_quantity(&product, quantity)?;
        self.save(&cart, version).await?;
        Ok(cart)
    }

    /// Removes a line from an owner's cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_line(
        &self,
        owner: OwnerId,
        product: ProductRef,
    ) -> Result<Cart, DomainError> {
        let (mut cart, version) = self.load(owner).await?;
        cart.remove_line(&product)?;
        self.save(&cart, version).await?;
        Ok(cart)
    }

    /// Empties an owner's cart. The cart document is kept.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, owner: OwnerId) -> Result<Cart, DomainError> {
        let (mut cart, version) = self.load(owner).await?;
        cart.clear();
        self.save(&cart, version).await?;
        Ok(cart)
    }

    /// Takes a read-consistent snapshot of an owner's cart for checkout.
    #[tracing::instrument(skip(self))]
    pub async fn snapshot_for_checkout(
        &self,
        owner: OwnerId,
    ) -> Result<CartSnapshot, DomainError> {
        let (cart, version) = self.load(owner).await?;
        Ok(CartSnapshot {
            owner,
            lines: cart.lines().to_vec(),
            version,
        })
    }

    /// Empties an owner's cart only if it is still at the snapshot version.
    ///
    /// Fails with a concurrency conflict when the cart was mutated since
    /// the snapshot was taken.
    #[tracing::instrument(skip(self))]
    pub async fn clear_checked(
        &self,
        owner: OwnerId,
        expected: Version,
    ) -> Result<Version, DomainError> {
        let (mut cart, _) = self.load(owner).await?;
        cart.clear();
        self.save(&cart, expected).await
    }

    async fn load(&self, owner: OwnerId) -> Result<(Cart, Version), DomainError> {
        match self
            .store
            .get_typed::<Cart>(collections::CARTS, &owner.to_string())
            .await?
        {
            Some((cart, version)) => Ok((cart, version)),
            None => Ok((Cart::new(owner), Version::initial())),
        }
    }

    async fn save(&self, cart: &Cart, expected: Version) -> Result<Version, DomainError> {
        let document = Document::builder()
            .collection(collections::CARTS)
            .key(cart.owner().to_string())
            .body(cart)?
            .build();

        let version = self
            .store
            .put(document, PutOptions::expect_version(expected))
            .await?;
        Ok(version)
    }
}

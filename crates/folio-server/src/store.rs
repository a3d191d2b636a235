//! In-memory document store.
//!
//! Each collection is a `BTreeMap` keyed by UUIDv7 id behind its own
//! `RwLock`. v7 ids sort by creation time, so iterating in reverse yields
//! newest-first without a separate index.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use folio_protocol::{Comment, ContactMessage, Portfolio, Principal, Project};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::image::StoredImage;

pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// A stored portfolio entry
#[derive(Debug, Clone)]
pub struct PortfolioRecord {
    pub id: String,
    pub title: String,
    pub category: String,
    pub content: String,
    pub image: Option<StoredImage>,
    pub author: Option<String>,
    pub read_time: Option<String>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl PortfolioRecord {
    pub fn to_api(&self) -> Portfolio {
        Portfolio {
            id: self.id.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
            content: self.content.clone(),
            image: self.image.as_ref().map(StoredImage::to_data_url),
            author: self.author.clone(),
            read_time: self.read_time.clone(),
            comments: self.comments.clone(),
            created_at: self.created_at,
        }
    }
}

/// A stored project
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: Option<StoredImage>,
    pub demo_link: Option<String>,
    pub github_link: Option<String>,
    pub tech: Vec<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn to_api(&self) -> Project {
        Project {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            image: self.image.as_ref().map(StoredImage::to_data_url),
            demo_link: self.demo_link.clone(),
            github_link: self.github_link.clone(),
            tech: self.tech.clone(),
            category: self.category.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
        }
    }
}

/// One slice of a filtered, newest-first listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// A lock-guarded collection of documents keyed by id
pub struct Collection<T> {
    docs: RwLock<BTreeMap<String, T>>,
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.docs.read().await.get(id).cloned()
    }

    pub async fn insert(&self, id: String, doc: T) {
        self.docs.write().await.insert(id, doc);
    }

    /// Apply `change` to the document in place, returning the updated copy
    pub async fn update<F>(&self, id: &str, change: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(id)?;
        change(doc);
        Some(doc.clone())
    }

    pub async fn remove(&self, id: &str) -> Option<T> {
        self.docs.write().await.remove(id)
    }

    /// Newest-first page of documents matching `filter`; `page` is 1-based
    pub async fn page<F>(&self, filter: F, page: u32, limit: u32) -> Page<T>
    where
        F: Fn(&T) -> bool,
    {
        let docs = self.docs.read().await;
        let matching: Vec<&T> = docs.values().rev().filter(|d| filter(d)).collect();
        let skip = (page.max(1) as usize - 1).saturating_mul(limit as usize);
        Page {
            total: matching.len(),
            items: matching
                .into_iter()
                .skip(skip)
                .take(limit as usize)
                .cloned()
                .collect(),
        }
    }

    /// Every document, newest first
    pub async fn all(&self) -> Vec<T> {
        self.docs.read().await.values().rev().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }
}

impl<T: Clone> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// All collections the API serves
#[derive(Default)]
pub struct Store {
    pub portfolios: Collection<PortfolioRecord>,
    pub projects: Collection<ProjectRecord>,
    pub messages: Collection<ContactMessage>,
    users: RwLock<HashMap<String, UserRecord>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the given users (keyed by lowercased email)
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        let users = users
            .into_iter()
            .map(|u| (u.email.to_lowercase(), u))
            .collect();
        Self {
            users: RwLock::new(users),
            ..Self::default()
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users
            .read()
            .await
            .get(&email.trim().to_lowercase())
            .cloned()
    }

    pub async fn insert_user(&self, user: UserRecord) {
        self.users
            .write()
            .await
            .insert(user.email.to_lowercase(), user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_page_is_newest_first() {
        let c: Collection<u32> = Collection::new();
        for n in 0..5 {
            c.insert(new_id(), n).await;
        }

        let page = c.page(|_| true, 1, 2).await;
        assert_eq!(page.items, vec![4, 3]);
        assert_eq!(page.total, 5);

        let last = c.page(|_| true, 3, 2).await;
        assert_eq!(last.items, vec![0]);
    }

    #[tokio::test]
    async fn test_page_filters_before_counting() {
        let c: Collection<u32> = Collection::new();
        for n in 0..6 {
            c.insert(new_id(), n).await;
        }
        let page = c.page(|n| n % 2 == 0, 1, 10).await;
        assert_eq!(page.items, vec![4, 2, 0]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let c: Collection<String> = Collection::new();
        let id = new_id();
        c.insert(id.clone(), "a".into()).await;

        let updated = c.update(&id, |s| s.push('b')).await;
        assert_eq!(updated.as_deref(), Some("ab"));
        assert!(c.update("missing", |s| s.clear()).await.is_none());

        assert!(c.remove(&id).await.is_some());
        assert!(c.get(&id).await.is_none());
        assert_eq!(c.len().await, 0);
    }

    #[tokio::test]
    async fn test_user_lookup_ignores_case() {
        let store = Store::with_users(vec![UserRecord {
            id: new_id(),
            email: "Admin@Example.com".into(),
            password_hash: String::new(),
            is_admin: true,
            created_at: Utc::now(),
        }]);
        assert!(store.find_user_by_email("admin@example.com").await.is_some());
        assert!(store.find_user_by_email("other@example.com").await.is_none());
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::{Debug, Display};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, warn};

use crate::query::{Clause, Fields, Query};
use crate::schema::{FieldType, Schema};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any document must implement to be kept by a [`ResourceActor`].
pub trait Document: Fields + Clone + Debug + Send + Sync + 'static {
    type Id: Ord + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Send + Sync + Debug;

    /// Shape and constraints of the collection.
    fn schema() -> &'static Schema;

    fn id(&self) -> &Self::Id;

    /// Id chosen by the caller. The store generates one when this is `None`.
    fn requested_id(_payload: &Self::CreatePayload) -> Option<Self::Id> {
        None
    }

    /// Construct the full document from its id and the creation payload.
    fn from_create(id: Self::Id, payload: Self::CreatePayload) -> Self;

    /// Runs before every insert and replace.
    fn validate(&self) -> Result<(), String> {
        Self::schema().validate(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped the request")]
    ActorDropped,
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Document> {
    Insert {
        payload: T::CreatePayload,
        respond_to: Response<T>,
    },
    Replace {
        document: T,
        respond_to: Response<T>,
    },
    FindById {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    FindByIds {
        ids: Vec<T::Id>,
        respond_to: Response<Vec<T>>,
    },
    Find {
        query: Query,
        respond_to: Response<Vec<T>>,
    },
    DeleteOne {
        id: T::Id,
        respond_to: Response<DeleteResult>,
    },
}

// =============================================================================
// 3. SECONDARY INDEXES
// =============================================================================

/// field -> value -> ids, for every field the schema marks `indexed`.
/// List fields are indexed per element.
struct Indexes<Id> {
    fields: HashMap<&'static str, FieldIndex<Id>>,
}

struct FieldIndex<Id> {
    field_type: FieldType,
    entries: HashMap<String, BTreeSet<Id>>,
}

impl<Id: Ord + Clone> Indexes<Id> {
    fn new(schema: &Schema) -> Self {
        let fields = schema
            .indexed_fields()
            .map(|spec| {
                let index = FieldIndex {
                    field_type: spec.field_type,
                    entries: HashMap::new(),
                };
                (spec.name, index)
            })
            .collect();
        Self { fields }
    }

    fn add<D: Fields>(&mut self, id: &Id, doc: &D) {
        for (field, index) in self.fields.iter_mut() {
            let keys = doc.field(field).map(|v| v.index_keys()).unwrap_or_default();
            for key in keys {
                index.entries.entry(key).or_default().insert(id.clone());
            }
        }
    }

    fn remove<D: Fields>(&mut self, id: &Id, doc: &D) {
        for (field, index) in self.fields.iter_mut() {
            let keys = doc.field(field).map(|v| v.index_keys()).unwrap_or_default();
            for key in keys {
                if let Some(ids) = index.entries.get_mut(&key) {
                    ids.remove(id);
                    if ids.is_empty() {
                        index.entries.remove(&key);
                    }
                }
            }
        }
    }

    /// Ids that can possibly match the indexed clauses of `clauses`, or `None`
    /// when no clause hits an index and a full scan is needed.
    fn candidates(&self, clauses: &[Clause]) -> Option<BTreeSet<Id>> {
        let mut result: Option<BTreeSet<Id>> = None;
        for clause in clauses {
            let Some(index) = self.fields.get(clause.field()) else {
                continue;
            };
            let hits = index
                .field_type
                .lookup_key(clause.value())
                .and_then(|key| index.entries.get(&key).cloned())
                .unwrap_or_default();
            result = Some(match result {
                Some(acc) => acc.intersection(&hits).cloned().collect(),
                None => hits,
            });
        }
        result
    }
}

// =============================================================================
// 4. THE GENERIC ACTOR SERVER
// =============================================================================

/// Owns one collection. Requests are handled one at a time, so each request is
/// atomic with respect to the others.
pub struct ResourceActor<T: Document> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    documents: BTreeMap<T::Id, T>,
    indexes: Indexes<T::Id>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Document> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            documents: BTreeMap::new(),
            indexes: Indexes::new(T::schema()),
            next_id_fn: Box::new(next_id_fn),
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs until every client has been dropped.
    #[instrument(name = "resource_actor", skip(self), fields(collection = T::schema().collection))]
    pub async fn run(mut self) {
        debug!("Store actor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Insert { payload, respond_to } => {
                    let _ = respond_to.send(self.insert(payload));
                }
                ResourceRequest::Replace { document, respond_to } => {
                    let _ = respond_to.send(self.replace(document));
                }
                ResourceRequest::FindById { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.documents.get(&id).cloned()));
                }
                ResourceRequest::FindByIds { ids, respond_to } => {
                    let found = ids.iter().filter_map(|id| self.documents.get(id).cloned()).collect();
                    let _ = respond_to.send(Ok(found));
                }
                ResourceRequest::Find { query, respond_to } => {
                    let _ = respond_to.send(self.find(&query));
                }
                ResourceRequest::DeleteOne { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.delete_one(&id)));
                }
            }
        }
        debug!(document_count = self.documents.len(), "Store actor stopped");
    }

    fn insert(&mut self, payload: T::CreatePayload) -> Result<T, StoreError> {
        let id = T::requested_id(&payload).unwrap_or_else(|| (self.next_id_fn)());
        if self.documents.contains_key(&id) {
            warn!(%id, "Rejected insert with existing id");
            return Err(StoreError::DuplicateId(id.to_string()));
        }
        let document = T::from_create(id.clone(), payload);
        document.validate().map_err(StoreError::Validation)?;
        self.indexes.add(&id, &document);
        self.documents.insert(id, document.clone());
        Ok(document)
    }

    fn replace(&mut self, document: T) -> Result<T, StoreError> {
        let id = document.id().clone();
        let Some(previous) = self.documents.get(&id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        document.validate().map_err(StoreError::Validation)?;
        self.indexes.remove(&id, previous);
        self.indexes.add(&id, &document);
        self.documents.insert(id, document.clone());
        Ok(document)
    }

    fn find(&self, query: &Query) -> Result<Vec<T>, StoreError> {
        let schema = T::schema();
        if let Some(field) = query.referenced_fields().find(|field| !schema.has_field(field)) {
            return Err(StoreError::InvalidQuery(format!(
                "unknown field `{}` in {}",
                field, schema.collection
            )));
        }
        let results = match self.indexes.candidates(query.filter.clauses()) {
            Some(ids) => query.apply(ids.iter().filter_map(|id| self.documents.get(id))),
            None => query.apply(self.documents.values()),
        };
        Ok(results)
    }

    fn delete_one(&mut self, id: &T::Id) -> DeleteResult {
        match self.documents.remove(id) {
            Some(document) => {
                self.indexes.remove(id, &document);
                DeleteResult { deleted_count: 1 }
            }
            None => DeleteResult { deleted_count: 0 },
        }
    }
}

// =============================================================================
// 5. THE GENERIC CLIENT
// =============================================================================

#[derive(Debug)]
pub struct ResourceClient<T: Document> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Document> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Document> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }

    pub async fn insert(&self, payload: T::CreatePayload) -> Result<T, StoreError> {
        self.request(|respond_to| ResourceRequest::Insert { payload, respond_to })
            .await
    }

    /// Overwrites the stored document with the same id.
    pub async fn replace(&self, document: T) -> Result<T, StoreError> {
        self.request(|respond_to| ResourceRequest::Replace { document, respond_to })
            .await
    }

    pub async fn find_by_id(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        self.request(|respond_to| ResourceRequest::FindById { id, respond_to })
            .await
    }

    /// Fetches documents in the order of `ids`; unknown ids are left out.
    pub async fn find_by_ids(&self, ids: Vec<T::Id>) -> Result<Vec<T>, StoreError> {
        self.request(|respond_to| ResourceRequest::FindByIds { ids, respond_to })
            .await
    }

    pub async fn find(&self, query: Query) -> Result<Vec<T>, StoreError> {
        self.request(|respond_to| ResourceRequest::Find { query, respond_to })
            .await
    }

    pub async fn delete_one(&self, id: T::Id) -> Result<DeleteResult, StoreError> {
        self.request(|respond_to| ResourceRequest::DeleteOne { id, respond_to })
            .await
    }
}

// =============================================================================
// 6. EXAMPLE USAGE (Test)
// =============================================================================

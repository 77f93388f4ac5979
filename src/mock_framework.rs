//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_find`] or [`expect_replace`] to assert the
//! request that arrived and script the store's reply.

use tokio::sync::mpsc;

use crate::actor_framework::{DeleteResult, Document, ResourceClient, ResourceRequest, Response};
use crate::query::Query;

/// Creates a mock client and a receiver for asserting requests.
///
/// Nothing runs behind the client: every request waits in `receiver` until the
/// test answers it through the returned responder, so success, failure and
/// ordering are fully under the test's control.
pub fn create_mock_client<T: Document>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is an Insert request
pub async fn expect_insert<T: Document>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreatePayload, Response<T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Insert { payload, respond_to }) => Some((payload, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Replace request
pub async fn expect_replace<T: Document>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T, Response<T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Replace { document, respond_to }) => Some((document, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a FindById request
pub async fn expect_find_by_id<T: Document>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::FindById { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a FindByIds request
pub async fn expect_find_by_ids<T: Document>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(Vec<T::Id>, Response<Vec<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::FindByIds { ids, respond_to }) => Some((ids, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Find request
pub async fn expect_find<T: Document>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(Query, Response<Vec<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Find { query, respond_to }) => Some((query, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a DeleteOne request
pub async fn expect_delete_one<T: Document>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<DeleteResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::DeleteOne { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Order, OrderInput, OrderStatus};

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<Order>(10);

        // Test Insert
        let insert_task = tokio::spawn(async move {
            client.insert(OrderInput::new("test@example.com", ["p1"])).await
        });

        let (payload, responder) = expect_insert(&mut receiver).await.expect("Expected Insert request");
        assert_eq!(payload.buyer_email, "test@example.com");
        let order = Order {
            id: "order_1".to_string(),
            buyer_email: payload.buyer_email,
            products: vec!["p1".to_string()],
            status: OrderStatus::Created,
        };
        responder.send(Ok(order.clone())).unwrap();

        let result = insert_task.await.unwrap();
        assert_eq!(result, Ok(order));
    }

    #[tokio::test]
    async fn test_unexpected_request_yields_none() {
        let (client, mut receiver) = create_mock_client::<Order>(10);
        let _task = tokio::spawn(async move { client.find_by_id("order_1".to_string()).await });

        assert!(expect_delete_one(&mut receiver).await.is_none());
    }
}

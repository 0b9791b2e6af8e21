// Scripted store for unit tests
// Returns canned replies and records every call it receives

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kvlock_common::StoreError;
use kvlock_foundation::KvStore;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Reply<T> {
    Value(T),
    NetworkError,
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T, StoreError> {
        match self {
            Reply::Value(v) => Ok(v),
            Reply::NetworkError => Err(StoreError::backend(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "network error",
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    SetIfAbsent {
        key: String,
        value: String,
        ttl: Duration,
    },
    CompareAndDelete {
        key: String,
        expected: String,
    },
}

pub(crate) struct StubStore {
    set_reply: Reply<bool>,
    delete_reply: Reply<i64>,
    calls: Mutex<Vec<Call>>,
}

impl StubStore {
    pub(crate) fn new(set_reply: Reply<bool>, delete_reply: Reply<i64>) -> Arc<Self> {
        Arc::new(Self {
            set_reply,
            delete_reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KvStore for StubStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.calls.lock().unwrap().push(Call::SetIfAbsent {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
        });
        self.set_reply.into_result()
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<i64, StoreError> {
        self.calls.lock().unwrap().push(Call::CompareAndDelete {
            key: key.to_string(),
            expected: expected.to_string(),
        });
        self.delete_reply.into_result()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "stub"
    }
}

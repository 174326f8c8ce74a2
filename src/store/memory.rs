//! In-process document store backing tests and offline development.

use std::sync::Mutex;

use serde_json::Value;

use super::{DocumentStore, StoreError};

pub struct InMemoryStore {
    document: Mutex<Value>,
}

impl InMemoryStore {
    pub fn new(document: Value) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    /// Current document contents, for assertions.
    pub fn snapshot(&self) -> Value {
        self.document.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryStore {
    async fn read(&self) -> Result<Value, StoreError> {
        Ok(self.document.lock().expect("store mutex poisoned").clone())
    }

    async fn replace(&self, document: &Value) -> Result<(), StoreError> {
        *self.document.lock().expect("store mutex poisoned") = document.clone();
        Ok(())
    }
}

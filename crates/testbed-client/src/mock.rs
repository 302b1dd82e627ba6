//! Scripted [`RpcClient`] for tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use testbed_common::error::{Result, TestbedError};

use crate::client::RpcClient;

/// Replies are queued per method and consumed in order; the last reply of
/// a method is repeated once its queue has a single entry left.
#[derive(Debug, Default)]
pub struct MockRpc {
    replies: RefCell<HashMap<String, VecDeque<std::result::Result<serde_json::Value, String>>>>,
    calls: RefCell<Vec<(String, serde_json::Value)>>,
}

impl MockRpc {
    /// Creates a mock with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply for `method`.
    #[must_use]
    pub fn reply(self, method: &str, result: serde_json::Value) -> Self {
        self.replies
            .borrow_mut()
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(result));
        self
    }

    /// Queues a failing reply for `method`.
    #[must_use]
    pub fn fail(self, method: &str, message: &str) -> Self {
        self.replies
            .borrow_mut()
            .entry(method.to_string())
            .or_default()
            .push_back(Err(message.to_string()));
        self
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.borrow().clone()
    }

    /// Returns how many times `method` was called.
    pub fn count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|(m, _)| m == method).count()
    }
}

impl RpcClient for MockRpc {
    fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        self.calls.borrow_mut().push((method.to_string(), params));
        let mut replies = self.replies.borrow_mut();
        let queue = replies
            .get_mut(method)
            .ok_or_else(|| TestbedError::rpc(method, "no scripted reply"))?;
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match reply {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(TestbedError::rpc(method, message)),
            None => Err(TestbedError::rpc(method, "no scripted reply")),
        }
    }
}

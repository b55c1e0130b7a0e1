use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::model::{TokenId, TokenInfo};

/// Token metadata keyed by id. Token metadata never changes once listed, so
/// entries are never evicted; the cache lives as long as the login session.
#[derive(Default)]
pub struct TokenInfoCache {
    map: Mutex<HashMap<TokenId, TokenInfo>>,
}

impl TokenInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token_id: TokenId) -> Option<TokenInfo> {
        self.map.lock().get(&token_id).cloned()
    }

    pub fn contains(&self, token_id: TokenId) -> bool {
        self.map.lock().contains_key(&token_id)
    }

    pub fn insert(&self, info: TokenInfo) {
        let token_id = info.token_id;
        let replaced = self.map.lock().insert(token_id, info).is_some();
        debug!(token_id, replaced, "token info cached");
    }

    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }

    pub fn clear(&self) {
        let count = {
            let mut map = self.map.lock();
            let n = map.len();
            map.clear();
            n
        };
        info!(count, "token info cache cleared");
    }
}

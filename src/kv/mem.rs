//! In-memory ordered key-value backend.
//!
//! Reference implementation of the [`KvTransaction`] contract used by the
//! test suite and benchmarks. Single-threaded by design, like the layer it
//! backs: interior mutability is `Cell`/`RefCell`, not locks, and a
//! transaction must not be shared across threads.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::rc::Rc;

use bytes::Bytes;

use crate::error::{GraphError, Result};

use super::{KvIterator, KvTransaction};

type Map = BTreeMap<Vec<u8>, Bytes>;

/// Shared in-memory keyspace. Hands out transactions over the same map;
/// isolation and durability are out of scope here, so a "transaction" is a
/// direct view with a read-only flag and a mutation generation counter.
#[derive(Default)]
pub struct MemStore {
    map: Rc<RefCell<Map>>,
    generation: Rc<Cell<u64>>,
}

impl MemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a writable transaction.
    pub fn write_txn(&self) -> MemTransaction {
        MemTransaction {
            map: Rc::clone(&self.map),
            generation: Rc::clone(&self.generation),
            read_only: false,
        }
    }

    /// Opens a read-only transaction.
    pub fn read_txn(&self) -> MemTransaction {
        MemTransaction {
            map: Rc::clone(&self.map),
            generation: Rc::clone(&self.generation),
            read_only: true,
        }
    }

    /// Number of live entries, for assertions in tests.
    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    /// True when the keyspace holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}

/// Transaction over a [`MemStore`].
pub struct MemTransaction {
    map: Rc<RefCell<Map>>,
    generation: Rc<Cell<u64>>,
    read_only: bool,
}

impl MemTransaction {
    fn bump(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(GraphError::ReadOnlyTxn);
        }
        Ok(())
    }
}

impl KvTransaction for MemTransaction {
    type Iter<'a> = MemIterator<'a>;

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn generation(&self) -> u64 {
        self.generation.get()
    }

    fn iterator(&self) -> MemIterator<'_> {
        MemIterator {
            txn: self,
            pos: None,
            seen_generation: self.generation.get(),
        }
    }
}

/// Cursor over a [`MemTransaction`]. Holds its position as an owned key so a
/// sibling delete cannot leave it pointing at freed storage; stale positions
/// are healed by [`KvIterator::refresh_after_modify`].
pub struct MemIterator<'a> {
    txn: &'a MemTransaction,
    pos: Option<Vec<u8>>,
    seen_generation: u64,
}

impl MemIterator<'_> {
    fn sync(&mut self) {
        self.seen_generation = self.txn.generation.get();
    }
}

impl KvIterator for MemIterator<'_> {
    fn goto_first_key(&mut self) -> bool {
        self.sync();
        self.pos = self.txn.map.borrow().keys().next().cloned();
        self.pos.is_some()
    }

    fn goto_last_key(&mut self) -> bool {
        self.sync();
        self.pos = self.txn.map.borrow().keys().next_back().cloned();
        self.pos.is_some()
    }

    fn goto_key(&mut self, key: &[u8]) -> bool {
        self.sync();
        self.pos = self
            .txn
            .map
            .borrow()
            .contains_key(key)
            .then(|| key.to_vec());
        self.pos.is_some()
    }

    fn goto_closest_key(&mut self, key: &[u8]) -> bool {
        self.sync();
        self.pos = self
            .txn
            .map
            .borrow()
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone());
        self.pos.is_some()
    }

    fn next(&mut self) -> bool {
        let Some(cur) = self.pos.take() else {
            return false;
        };
        self.pos = self
            .txn
            .map
            .borrow()
            .range::<[u8], _>((Bound::Excluded(cur.as_slice()), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone());
        self.pos.is_some()
    }

    fn prev(&mut self) -> bool {
        let Some(cur) = self.pos.take() else {
            return false;
        };
        self.pos = self
            .txn
            .map
            .borrow()
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(cur.as_slice())))
            .next_back()
            .map(|(k, _)| k.clone());
        self.pos.is_some()
    }

    fn is_valid(&self) -> bool {
        self.pos.is_some()
    }

    fn key(&self) -> Option<Bytes> {
        self.pos.as_deref().map(Bytes::copy_from_slice)
    }

    fn value(&self) -> Option<Bytes> {
        let pos = self.pos.as_deref()?;
        self.txn.map.borrow().get(pos).cloned()
    }

    fn set_value(&mut self, value: &[u8]) -> Result<()> {
        self.txn.check_writable()?;
        let Some(pos) = self.pos.as_deref() else {
            return Err(GraphError::Corruption(
                "set_value on unpositioned cursor".into(),
            ));
        };
        let mut map = self.txn.map.borrow_mut();
        let Some(slot) = map.get_mut(pos) else {
            return Err(GraphError::Corruption(
                "set_value target key vanished".into(),
            ));
        };
        *slot = Bytes::copy_from_slice(value);
        drop(map);
        self.txn.bump();
        self.sync();
        Ok(())
    }

    fn add_key_value(&mut self, key: &[u8], value: &[u8], overwrite: bool) -> Result<bool> {
        self.txn.check_writable()?;
        {
            let mut map = self.txn.map.borrow_mut();
            if !overwrite && map.contains_key(key) {
                return Ok(false);
            }
            map.insert(key.to_vec(), Bytes::copy_from_slice(value));
        }
        self.pos = Some(key.to_vec());
        self.txn.bump();
        self.sync();
        Ok(true)
    }

    fn delete_key(&mut self) -> Result<()> {
        self.txn.check_writable()?;
        let Some(cur) = self.pos.take() else {
            return Err(GraphError::Corruption(
                "delete_key on unpositioned cursor".into(),
            ));
        };
        let successor = {
            let mut map = self.txn.map.borrow_mut();
            if map.remove(&cur).is_none() {
                return Err(GraphError::Corruption(
                    "delete_key target key vanished".into(),
                ));
            }
            map.range::<[u8], _>((Bound::Excluded(cur.as_slice()), Bound::Unbounded))
                .next()
                .map(|(k, _)| k.clone())
        };
        self.pos = successor;
        self.txn.bump();
        self.sync();
        Ok(())
    }

    fn refresh_after_modify(&mut self) -> bool {
        self.sync();
        let Some(cur) = self.pos.take() else {
            return false;
        };
        let map = self.txn.map.borrow();
        if map.contains_key(&cur) {
            drop(map);
            self.pos = Some(cur);
            return true;
        }
        self.pos = map
            .range::<[u8], _>((Bound::Included(cur.as_slice()), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone());
        self.pos.is_some()
    }

    fn underlying_modified(&self) -> bool {
        self.txn.generation.get() != self.seen_generation
    }
}

use log::{debug, trace};
use parking_lot::Mutex;

use super::{greeting_for, BoxKey, Greeting};
use crate::{
    config::COUNTER_GLOBAL_KEY,
    error::GreetingError,
    storage::{AppStorage, GlobalValue, StagedStorage},
};

/// Read the greeting counter, an absent slot counts as 0
pub(crate) fn read_counter<S: AppStorage + ?Sized>(storage: &S) -> Result<u64, GreetingError> {
    match storage.get_global(COUNTER_GLOBAL_KEY)? {
        None => Ok(0),
        Some(GlobalValue::Uint(counter)) => Ok(counter),
        Some(other) => Err(GreetingError::CorruptCounter {
            found: other.kind(),
        }),
    }
}

/// Create the counter slot at 0 unless it already exists
pub(crate) fn initialize_counter<S: AppStorage + ?Sized>(
    storage: &mut S,
) -> Result<(), GreetingError> {
    if storage.get_global(COUNTER_GLOBAL_KEY)?.is_none() {
        storage.set_global(COUNTER_GLOBAL_KEY, GlobalValue::Uint(0))?;
    }
    Ok(())
}

/// Counter-keyed greeting: one new box per call
///
/// Every check happens before the first write. Callers still run this on a
/// staged overlay so a failing backend cannot leave half a call behind.
pub(crate) fn greet_counter_keyed<S: AppStorage + ?Sized>(
    storage: &mut S,
    name: &str,
) -> Result<Greeting, GreetingError> {
    let counter = read_counter(storage)?;
    let next = counter
        .checked_add(1)
        .ok_or(GreetingError::CounterOverflow)?;

    let key = BoxKey::for_greeting(name, counter);
    if storage.box_exists(&key)? {
        return Err(GreetingError::StorageCollision { key });
    }

    let text = greeting_for(name);
    storage.put_box(&key, text.as_bytes())?;
    storage.set_global(COUNTER_GLOBAL_KEY, GlobalValue::Uint(next))?;

    if log::log_enabled!(log::Level::Trace) {
        trace!("greeting #{} stored in box {:?}", counter, key);
    }

    Ok(Greeting {
        key,
        counter: Some(counter),
        text,
    })
}

/// Legacy greeting: the fixed box is replaced on every call
pub(crate) fn greet_overwrite<S: AppStorage + ?Sized>(
    storage: &mut S,
    name: &str,
) -> Result<Greeting, GreetingError> {
    let key = BoxKey::fixed_greeting();
    let text = greeting_for(name);
    storage.put_box(&key, text.as_bytes())?;

    Ok(Greeting {
        key,
        counter: None,
        text,
    })
}

/// Off-chain greeting store using counter-keyed boxes
///
/// The counter read, the box write and the counter increment happen under
/// one lock scoped to this instance: two calls never observe the same
/// counter value.
pub struct GreetingStore<S: AppStorage> {
    storage: Mutex<S>,
}

impl<S: AppStorage> GreetingStore<S> {
    /// Take ownership of `storage`, creating the counter at 0 if needed
    pub fn new(mut storage: S) -> Result<Self, GreetingError> {
        initialize_counter(&mut storage)?;
        Ok(Self {
            storage: Mutex::new(storage),
        })
    }

    /// Store `"Hello, " + name` in a new box and advance the counter
    pub fn greet(&self, name: &str) -> Result<Greeting, GreetingError> {
        let mut storage = self.storage.lock();
        let (greeting, changes) = {
            let mut staged = StagedStorage::new(&*storage);
            let greeting = greet_counter_keyed(&mut staged, name)?;
            (greeting, staged.into_changes())
        };
        storage.apply(changes)?;

        if log::log_enabled!(log::Level::Debug) {
            debug!("{:?} greeted, counter is now {:?}", name, greeting.counter.map(|c| c + 1));
        }
        Ok(greeting)
    }

    pub fn counter(&self) -> Result<u64, GreetingError> {
        read_counter(&*self.storage.lock())
    }

    pub fn greeting_at(&self, key: &BoxKey) -> Result<Option<String>, GreetingError> {
        let value = self.storage.lock().get_box(key)?;
        Ok(value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// All stored greetings with their name and counter, oldest first
    pub fn entries(&self) -> Result<Vec<(BoxKey, String)>, GreetingError> {
        let storage = self.storage.lock();
        let mut entries = Vec::new();
        for key in storage.box_keys()? {
            if key.decode_greeting().is_none() {
                continue;
            }
            if let Some(value) = storage.get_box(&key)? {
                entries.push((key, String::from_utf8_lossy(&value).into_owned()));
            }
        }
        Ok(entries)
    }

    pub fn into_inner(self) -> S {
        self.storage.into_inner()
    }
}

/// Off-chain greeting store using the legacy fixed `greeting` box
///
/// Only the latest greeting is kept.
pub struct OverwriteGreetingStore<S: AppStorage> {
    storage: Mutex<S>,
}

impl<S: AppStorage> OverwriteGreetingStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage: Mutex::new(storage),
        }
    }

    pub fn greet_overwrite(&self, name: &str) -> Result<Greeting, GreetingError> {
        let mut storage = self.storage.lock();
        let (greeting, changes) = {
            let mut staged = StagedStorage::new(&*storage);
            let greeting = greet_overwrite(&mut staged, name)?;
            (greeting, staged.into_changes())
        };
        storage.apply(changes)?;
        Ok(greeting)
    }

    /// Latest greeting, if any call happened
    pub fn current(&self) -> Result<Option<String>, GreetingError> {
        let value = self.storage.lock().get_box(&BoxKey::fixed_greeting())?;
        Ok(value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    pub fn into_inner(self) -> S {
        self.storage.into_inner()
    }
}

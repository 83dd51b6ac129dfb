//! HelloWorld application
//!
//! The contract exposes a single method, `hello(string) -> string`. Which
//! greeting scheme backs it is decided once, when the application is
//! created, and never changes afterwards.

mod abi;

use log::debug;
use thiserror::Error;

use crate::{
    config::HELLO_METHOD,
    error::GreetingError,
    greeting::{self, BoxKey, GreetingMode},
    storage::AppStorage,
};

pub use abi::AbiValue;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("Unknown method '{0}'")]
    UnknownMethod(String),

    #[error("Invalid arguments for '{method}': expected ({expected}), got ({got})")]
    InvalidArguments {
        method: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error(transparent)]
    Greeting(#[from] GreetingError),
}

/// The HelloWorld contract logic, bound to one greeting scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloWorld {
    mode: GreetingMode,
}

impl HelloWorld {
    pub fn new(mode: GreetingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> GreetingMode {
        self.mode
    }

    /// Application creation: set up the initial global state
    pub fn create<S: AppStorage + ?Sized>(&self, storage: &mut S) -> Result<(), ContractError> {
        if self.mode == GreetingMode::CounterKeyed {
            greeting::initialize_counter(storage)?;
        }
        Ok(())
    }

    /// Dispatch an application call
    pub fn call<S: AppStorage + ?Sized>(
        &self,
        storage: &mut S,
        method: &str,
        args: &[AbiValue],
    ) -> Result<AbiValue, ContractError> {
        match method {
            HELLO_METHOD => {
                let name = match args {
                    [AbiValue::String(name)] => name,
                    _ => {
                        return Err(ContractError::InvalidArguments {
                            method: HELLO_METHOD,
                            expected: "string",
                            got: describe_args(args),
                        })
                    }
                };
                self.hello(storage, name).map(AbiValue::String)
            }
            _ => Err(ContractError::UnknownMethod(method.to_owned())),
        }
    }

    /// `hello(name) -> "Hello, " + name`, stored according to the mode
    pub fn hello<S: AppStorage + ?Sized>(
        &self,
        storage: &mut S,
        name: &str,
    ) -> Result<String, ContractError> {
        let greeting = match self.mode {
            GreetingMode::CounterKeyed => greeting::greet_counter_keyed(storage, name)?,
            GreetingMode::FixedKey => greeting::greet_overwrite(storage, name)?,
        };

        if log::log_enabled!(log::Level::Debug) {
            debug!("hello({:?}) stored in {:?}", name, greeting.key);
        }
        Ok(greeting.into_text())
    }

    /// Box a `hello(name)` call will write when the counter is at `counter`
    ///
    /// Callers declare it as a box reference before submitting the call.
    pub fn box_reference(&self, name: &str, counter: u64) -> BoxKey {
        match self.mode {
            GreetingMode::CounterKeyed => BoxKey::for_greeting(name, counter),
            GreetingMode::FixedKey => BoxKey::fixed_greeting(),
        }
    }
}

fn describe_args(args: &[AbiValue]) -> String {
    args.iter()
        .map(AbiValue::type_name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::COUNTER_GLOBAL_KEY,
        storage::{GlobalValue, MemoryAppStorage},
    };

    #[test]
    fn test_create_initializes_counter() {
        let mut storage = MemoryAppStorage::new();
        HelloWorld::new(GreetingMode::CounterKeyed)
            .create(&mut storage)
            .unwrap();
        assert_eq!(
            storage.get_global(COUNTER_GLOBAL_KEY).unwrap(),
            Some(GlobalValue::Uint(0))
        );

        let mut storage = MemoryAppStorage::new();
        HelloWorld::new(GreetingMode::FixedKey)
            .create(&mut storage)
            .unwrap();
        assert_eq!(storage.get_global(COUNTER_GLOBAL_KEY).unwrap(), None);
    }

    #[test]
    fn test_hello_dispatch() {
        let contract = HelloWorld::new(GreetingMode::CounterKeyed);
        let mut storage = MemoryAppStorage::new();
        contract.create(&mut storage).unwrap();

        let result = contract
            .call(&mut storage, "hello", &[AbiValue::from("John Doe")])
            .unwrap();
        assert_eq!(result, AbiValue::from("Hello, John Doe"));
        assert!(storage
            .box_exists(&BoxKey::for_greeting("John Doe", 0))
            .unwrap());
    }

    #[test]
    fn test_unknown_method() {
        let contract = HelloWorld::new(GreetingMode::CounterKeyed);
        let mut storage = MemoryAppStorage::new();
        let err = contract.call(&mut storage, "goodbye", &[]).unwrap_err();
        assert_eq!(err, ContractError::UnknownMethod("goodbye".into()));
    }

    #[test]
    fn test_invalid_arguments() {
        let contract = HelloWorld::new(GreetingMode::CounterKeyed);
        let mut storage = MemoryAppStorage::new();

        let err = contract
            .call(&mut storage, "hello", &[AbiValue::from(1u64), AbiValue::from("x")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments for 'hello': expected (string), got (uint64, string)"
        );
        assert!(contract.call(&mut storage, "hello", &[]).is_err());
        assert!(storage.box_keys().unwrap().is_empty());
    }

    #[test]
    fn test_fixed_key_mode_overwrites() {
        let contract = HelloWorld::new(GreetingMode::FixedKey);
        let mut storage = MemoryAppStorage::new();
        contract.hello(&mut storage, "A").unwrap();
        contract.hello(&mut storage, "B").unwrap();

        assert_eq!(storage.box_keys().unwrap(), vec![BoxKey::fixed_greeting()]);
        assert_eq!(
            storage.get_box(&BoxKey::fixed_greeting()).unwrap().as_deref(),
            Some(&b"Hello, B"[..])
        );
    }

    #[test]
    fn test_box_reference() {
        let counter_keyed = HelloWorld::new(GreetingMode::CounterKeyed);
        assert_eq!(
            counter_keyed.box_reference("Bob", 5),
            BoxKey::for_greeting("Bob", 5)
        );
        let fixed = HelloWorld::new(GreetingMode::FixedKey);
        assert_eq!(fixed.box_reference("Bob", 5), BoxKey::fixed_greeting());
    }
}

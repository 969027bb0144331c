/*!
# Welcome to Republic Rust

Republic is a decentralized dark pool. Independent nodes, called **Darknodes**, are
grouped into fixed-size **Pods** which jointly run the confidential order matching
protocol. The membership of every Pod is fixed for the duration of an **Epoch**, a
snapshot of the Darknode registry taken from the chain.

This crate holds the registry/topology and secure messaging layer of a Darknode:

* the `Pod` / `Epoch` data model and the `PodHeap` routing algorithm which maps an
  order to the path of Pods responsible for it.
* the `Crypter`, which signs, verifies, encrypts and decrypts messages between
  Darknodes and only trusts counterparties that are currently registered. Registry
  lookups go through the `ContractBinder` trait and are cached for a configurable
  period so the chain is not queried on every message.

# Usage

```bash
darknodecli keygen --keyfile data/keystore.json --password asdf
darknodecli route --epoch data/epoch.json --order 00ff...
```

See `darknodecli help` for the remaining subcommands.

*/
pub mod address;
pub mod binder;
pub mod cache;
pub mod crypter;
pub mod crypto;
pub mod epoch;
pub mod keypair;
pub mod keystore;
pub mod pod;
pub mod pod_heap;
pub mod pod_path;
pub mod settings;

#[cfg(test)]
pub mod test_utilities;

mod test_setup;

/// Error returned by most functions.
///
/// When writing a real application, one might want to consider a specialized
/// error handling crate or defining an error type as an `enum` of causes.
/// The library modules do exactly that; this boxed error is what the binaries
/// bubble everything up into.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for Republic operations.
///
/// This is defined as a convenience.
pub type Result<T> = std::result::Result<T, Error>;

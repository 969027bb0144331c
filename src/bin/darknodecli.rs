/*!
# Darknode Command Line Interface

A binary for managing the keystore of a Darknode and inspecting how orders are
routed through the Pods of an epoch.

## Usage

```bash
darknodecli help [subcommand]
```

## Available subcommands

**keygen**

creates a new keystore and writes it, encrypted, to the keyfile

**print**

prints the address and public keys of a keystore

**route**

prints the path of pods responsible for an order in an epoch

**sign**

signs a message with the keystore

**verify**

checks that a signature was produced by a registered darknode

## Example

```bash
darknodecli keygen --keyfile data/keystore.json --password asdf
darknodecli route --epoch data/epoch.json --order 00000000000000000000000000000000000000000000000000000000000000ff
darknodecli sign -k data/keystore.json -p asdf -m hello
```

## Dev

To run from source:

```bash
cargo run --bin darknodecli -- verify --registry data/registry.json --message hello --signature 1f2e...
```
*/
use clap::{App, Arg, ArgMatches};
use republic_rust::{
    address::Address,
    binder::InMemoryBinder,
    crypter::Crypter,
    crypto::{recover, Signer},
    epoch::Epoch,
    keystore::Keystore,
    pod_heap::OrderId,
    settings::CrypterSettings,
};
use std::fs;
use tracing::info;

fn keyfile_arg() -> Arg<'static, 'static> {
    Arg::with_name("keyfile")
        .short("k")
        .long("keyfile")
        .required(true)
        .takes_value(true)
        .help("path to keyfile")
}

fn password_arg() -> Arg<'static, 'static> {
    Arg::with_name("password")
        .short("p")
        .long("password")
        .required(true)
        .takes_value(true)
        .help("password of keyfile")
}

fn message_arg() -> Arg<'static, 'static> {
    Arg::with_name("message")
        .short("m")
        .long("message")
        .required(true)
        .takes_value(true)
        .help("message to sign or verify")
}

pub fn main() -> republic_rust::Result<()> {
    tracing_subscriber::fmt::init();

    let command_matches = App::new("Darknode Command Line Interface")
        .about("Manage the keystore of a darknode and inspect order routing")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .takes_value(true)
                .help("config file name"),
        )
        .subcommand(
            App::new("keygen")
                .about("creates a new keystore")
                .arg(keyfile_arg())
                .arg(password_arg()),
        )
        .subcommand(
            App::new("print")
                .about("prints the address and public keys of a keystore")
                .arg(keyfile_arg())
                .arg(password_arg()),
        )
        .subcommand(
            App::new("route")
                .about("prints the pods an order is routed through")
                .arg(
                    Arg::with_name("epoch")
                        .short("e")
                        .long("epoch")
                        .required(true)
                        .takes_value(true)
                        .help("path to epoch json file"),
                )
                .arg(
                    Arg::with_name("order")
                        .short("o")
                        .long("order")
                        .required(true)
                        .takes_value(true)
                        .help("order id, 32 bytes of hex"),
                ),
        )
        .subcommand(
            App::new("sign")
                .about("signs a message")
                .arg(keyfile_arg())
                .arg(password_arg())
                .arg(message_arg()),
        )
        .subcommand(
            App::new("verify")
                .about("checks a signature against the darknode registry")
                .arg(message_arg())
                .arg(
                    Arg::with_name("registry")
                        .short("r")
                        .long("registry")
                        .required(true)
                        .takes_value(true)
                        .help("path to registry json file"),
                )
                .arg(
                    Arg::with_name("signature")
                        .short("s")
                        .long("signature")
                        .required(true)
                        .takes_value(true)
                        .help("signature in hex"),
                ),
        )
        .get_matches();

    let config_name = match command_matches.value_of("config") {
        Some(name) => name,
        None => "config",
    };

    if let Some(matches) = command_matches.subcommand_matches("keygen") {
        let keystore = Keystore::random();
        keystore.save(required(matches, "keyfile")?, required(matches, "password")?)?;
        println!("address : {}", keystore.address());
    }
    if let Some(matches) = command_matches.subcommand_matches("print") {
        let keystore = load_keystore(matches)?;
        println!("id                    : {}", keystore.id());
        println!("address               : {}", keystore.address());
        println!(
            "ecdsa public key      : {}",
            hex::encode(keystore.ecdsa_key().public_key().serialize())
        );
        println!(
            "encryption public key : {}",
            hex::encode(keystore.encryption_public_key().serialize())
        );
    }
    if let Some(matches) = command_matches.subcommand_matches("route") {
        let epoch: Epoch = serde_json::from_slice(&fs::read(required(matches, "epoch")?)?)?;
        let mut order_id: OrderId = [0; 32];
        hex::decode_to_slice(required(matches, "order")?, &mut order_id)?;

        let path = epoch.path_of_order(&order_id);
        info!(
            "routed order through {} of {} pods",
            path.len(),
            epoch.pods().len()
        );
        for pod in &path {
            println!("--------------------------------------------------------------");
            println!("pod position : {}", pod.position());
            println!("pod hash     : {}", hex::encode(pod.hash()));
            println!("threshold    : {} of {}", pod.threshold(), pod.size());
            for darknode in pod.darknodes() {
                println!("  {}", darknode);
            }
        }
    }
    if let Some(matches) = command_matches.subcommand_matches("sign") {
        let keystore = load_keystore(matches)?;
        let signature = keystore.sign(required(matches, "message")?.as_bytes())?;
        println!("{}", hex::encode(&signature[..]));
    }
    if let Some(matches) = command_matches.subcommand_matches("verify") {
        // verifying never touches our own keys
        let binder = InMemoryBinder::from_registry_file(required(matches, "registry")?)?;
        let settings = CrypterSettings::load(config_name)?;
        let crypter = Crypter::from_settings(Keystore::random(), binder, &settings);

        let message = required(matches, "message")?.as_bytes();
        let signature = hex::decode(required(matches, "signature")?)?;
        crypter.verify(message, &signature)?;
        println!(
            "signed by registered darknode {}",
            Address::from_public_key(&recover(message, &signature)?)
        );
    }
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> republic_rust::Result<&'a str> {
    matches
        .value_of(name)
        .ok_or_else(|| format!("missing argument {}", name).into())
}

fn load_keystore(matches: &ArgMatches) -> republic_rust::Result<Keystore> {
    Ok(Keystore::load(
        required(matches, "keyfile")?,
        required(matches, "password")?,
    )?)
}

//! Account identifier derivation and validation tool
//!
//! ```text
//! account-id <principal> [subaccount-hex]
//! account-id --check <account-identifier>
//! ```

use anyhow::{bail, Context};
use ledger_core::{AccountIdentifier, Config, Principal, SubAccount};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [flag, id] if flag == "--check" => {
            AccountIdentifier::validate(id).with_context(|| format!("'{}' is not valid", id))?;
            tracing::info!("Account identifier {} is valid", id);
            println!("valid");
        }
        [principal] => {
            let principal = Principal::from_text(principal)?;
            println!("{}", AccountIdentifier::new(&principal, None));
        }
        [principal, subaccount] => {
            let principal = Principal::from_text(principal)?;
            let subaccount = SubAccount::from_hex(subaccount)?;
            tracing::debug!("Deriving {} with subaccount {:?}", principal, subaccount);
            println!("{}", AccountIdentifier::new(&principal, Some(&subaccount)));
        }
        _ => bail!(
            "usage: {} <principal> [subaccount-hex] | --check <account-identifier>",
            config.service_name
        ),
    }

    Ok(())
}

//! # Signing RPC proxy
//!
//! Listens for Ethereum JSON-RPC calls and forwards them to an upstream node. Transactions sent
//! from one of the configured private keys are signed locally and submitted as raw
//! transactions, so the upstream node never needs the keys unlocked.

use clap::Parser;
use parking_lot::Mutex;
use rawtx_signer::command::Opts;
use rawtx_signer::middleware::SignAndSendRawMiddleware;
use rawtx_signer::{Client, HttpTransport, KeyRing};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let keys = KeyRing::new(opts.private_keys.iter().map(String::as_str))?;
    log::info!("Signing for {} local account(s): {:?}", keys.len(), keys.addresses());

    let transport = HttpTransport::with_timeout(&opts.upstream, Duration::from_secs(opts.timeout))?;
    let mut client = Client::new(Arc::new(transport), opts.address_matching.registry());
    let signer = SignAndSendRawMiddleware::new(keys).with_matching(opts.address_matching);
    client
        .stack_mut()
        .insert(Arc::new(signer), opts.placement())?;
    log::info!("Middleware stack: {:?}", client.stack());

    let (addr, handle) = rawtx_signer::server::run_server(client, opts.rpc_port).await?;
    println!("Signing proxy listening on {addr}, upstream {}", opts.upstream);

    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Mutex::new(Some(tx));
    ctrlc::set_handler(move || {
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(());
        }
    })?;

    tokio::select! {
        _ = rx => {
            log::info!("Shutting down");
            handle.stop()?;
        }
        _ = handle.clone().stopped() => {}
    }

    Ok(())
}

//! Offline walkthrough of the Soondex SDK
//!
//! Seeds an in-memory ledger and directory with one pool, quotes a swap,
//! prints the batch the SDK would submit and then executes it.

use std::sync::Arc;

use soondex_sdk::{
    format_amount,
    testing::{keypair_signer, seed_pool, InMemoryDirectory, MockLedger, PoolSeed},
    AssetRef, PdaBuilder, SdkConfig, SoondexClient,
};
use solana_sdk::pubkey::Pubkey;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("soondex_sdk=debug")
        .init();

    let config = SdkConfig::localnet();
    let ledger = Arc::new(MockLedger::new());
    let directory = Arc::new(InMemoryDirectory::new());
    let (signer, wallet) = keypair_signer();
    ledger.set_lamports(wallet, 5_000_000_000);

    let usdc = Pubkey::new_unique();
    ledger.add_mint(usdc, 6, 1_000_000_000_000);
    let pool = seed_pool(
        &ledger,
        &directory,
        &PdaBuilder::new(config.program_id),
        spl_token::native_mint::id(),
        usdc,
        PoolSeed {
            reserve_a: 100_000_000_000,
            reserve_b: 15_000_000_000,
            lp_supply: 1_000_000_000,
            fee_bps: 30,
        },
    );
    println!("pool {} ({} / {})", pool.address, pool.asset_a(), pool.asset_b());

    let client = SoondexClient::new(config, ledger.clone(), signer, directory.clone())?;
    let (sol, usdc) = (AssetRef::Native, AssetRef::Fungible(usdc));

    let quote = client.swap.estimate(&sol, &usdc, "1.5", 50).await?;
    println!(
        "1.5 SOL -> {} USDC (minimum {}, fee {} lamports)",
        format_amount(quote.estimated_output, 6),
        format_amount(quote.minimum_received, 6),
        quote.fee
    );

    let plan = client.swap.prepare_swap(&sol, &usdc, "1.5", 50).await?;
    for (i, ix) in plan.instructions.iter().enumerate() {
        println!("  #{} {} ({} accounts)", i, ix.program_id, ix.accounts.len());
    }

    let signature = client.swap.swap(&sol, &usdc, "1.5", 50).await?;
    println!("confirmed {}", signature);
    println!("recorded trades: {}", directory.trades().len());

    let balance = client.balance_of(&client.wallet(), &sol).await?;
    println!("wallet balance {} SOL", format_amount(balance.amount, balance.decimals));
    Ok(())
}

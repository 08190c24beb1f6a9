mod common;

use common::*;
use solana_sdk::{pubkey::Pubkey, signature::Signature, system_program};
use soondex_sdk::{
    core::{program_id, AssetRef, ErrorKind, LiquidityRequest, PoolRecord, SdkError},
    protocol::holder_address,
    testing::{seed_pool, PoolSeed},
};

const ADD: [u8; 8] = [181, 157, 89, 67, 143, 182, 52, 72];
const INITIALIZE: [u8; 8] = [95, 180, 10, 172, 84, 174, 232, 40];
const REMOVE: [u8; 8] = [80, 85, 209, 72, 24, 206, 177, 108];

fn pool_with(h: &Harness, mint_a: Pubkey, mint_b: Pubkey, reserve_a: u64, reserve_b: u64) -> PoolRecord {
    seed_pool(
        &h.ledger,
        &h.directory,
        &h.pda,
        mint_a,
        mint_b,
        PoolSeed {
            reserve_a,
            reserve_b,
            lp_supply: 1_000,
            fee_bps: 30,
        },
    )
}

#[tokio::test]
async fn test_add_liquidity_shortfall_reports_base_units() {
    let h = harness();
    let (a, b) = (mint(&h.ledger, 6), mint(&h.ledger, 6));
    pool_with(&h, a, b, 1_000_000, 1_000_000);
    h.ledger.fund(&h.wallet, &a, 5_000_000);
    h.ledger.fund(&h.wallet, &b, 50_000_000);

    let request = LiquidityRequest::existing(AssetRef::Fungible(a), AssetRef::Fungible(b), "10", "1");
    let err = h.client.liquidity.add_liquidity(&request).await.unwrap_err();
    match err {
        SdkError::InsufficientBalance {
            required, available, ..
        } => {
            assert_eq!(required, 10_000_000);
            assert_eq!(available, 5_000_000);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.ledger.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_add_liquidity_requires_pool() {
    let h = harness();
    let (a, b) = (mint(&h.ledger, 6), mint(&h.ledger, 6));
    let request = LiquidityRequest::existing(AssetRef::Fungible(a), AssetRef::Fungible(b), "1", "1");
    let err = h.client.liquidity.add_liquidity(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_add_liquidity_orients_to_pool_order() {
    let h = harness();
    let (a, b) = (mint(&h.ledger, 6), mint(&h.ledger, 6));
    let pool = pool_with(&h, a, b, 1_000_000, 1_000_000);
    h.ledger.fund(&h.wallet, &a, 5_000_000);
    h.ledger.fund(&h.wallet, &b, 5_000_000);

    // Caller passes the pair reversed.
    let request = LiquidityRequest::existing(AssetRef::Fungible(b), AssetRef::Fungible(a), "2", "1");
    let plan = h.client.liquidity.prepare_add_liquidity(&request).await.unwrap();

    assert_eq!(
        program_ids(&plan.instructions),
        vec![spl_associated_token_account::id(), program_id()]
    );
    let core = &plan.instructions[1];
    assert_eq!(&core.data[..8], &ADD);
    assert_eq!(&core.data[8..16], &1_000_000u64.to_le_bytes());
    assert_eq!(&core.data[16..24], &2_000_000u64.to_le_bytes());
    assert_eq!(core.accounts[1].pubkey, pool.mint_a);
    assert_eq!(core.accounts[2].pubkey, pool.mint_b);

    h.client.liquidity.add_liquidity(&request).await.unwrap();
    assert_eq!(h.ledger.sent_transactions().len(), 1);
    assert!(h.directory.trades().is_empty());
}

#[tokio::test]
async fn test_create_pool_builds_lp_mint_and_records_pool() {
    let h = harness();
    let (a, b) = (mint(&h.ledger, 6), mint(&h.ledger, 9));
    h.ledger.fund(&h.wallet, &a, 10_000_000);
    h.ledger.fund(&h.wallet, &b, 20_000_000_000);

    let request = LiquidityRequest::new_pool(AssetRef::Fungible(a), AssetRef::Fungible(b), "10", "20", "0.3");
    let plan = h.client.liquidity.prepare_add_liquidity(&request).await.unwrap();
    assert_eq!(
        program_ids(&plan.instructions),
        vec![
            system_program::id(),
            spl_token::id(),
            spl_associated_token_account::id(),
            spl_associated_token_account::id(),
            spl_associated_token_account::id(),
            program_id(),
            program_id(),
        ]
    );
    let initialize = &plan.instructions[5];
    assert_eq!(&initialize.data[..8], &INITIALIZE);
    assert_eq!(&initialize.data[8..], &30u64.to_le_bytes());
    assert_eq!(initialize.accounts[0].pubkey, h.pda.pool(&b).0);
    assert_eq!(plan.local_signer_keys().len(), 1);

    h.client.liquidity.add_liquidity(&request).await.unwrap();
    let tx = only_transaction(&h.ledger);
    assert_eq!(tx.signatures.len(), 2);
    assert!(tx.signatures.iter().all(|s| *s != Signature::default()));

    let pools = h.client.pools_of(&h.wallet).await.unwrap();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].address, h.pda.pool(&b).0);
    assert_eq!(pools[0].mint_a, a);
    assert_eq!(pools[0].mint_b, b);
    assert_eq!(pools[0].fee_bps, 30);
    assert_eq!(pools[0].reserve_b, holder_address(&pools[0].address, &b));
}

#[tokio::test]
async fn test_create_pool_over_existing_pool() {
    let h = harness();
    let (a, b) = (mint(&h.ledger, 6), mint(&h.ledger, 6));
    let pool = pool_with(&h, a, b, 1_000, 1_000);
    h.ledger.fund(&h.wallet, &a, 10_000_000);
    h.ledger.fund(&h.wallet, &b, 10_000_000);

    let request = LiquidityRequest::new_pool(AssetRef::Fungible(b), AssetRef::Fungible(a), "1", "1", "0.3");
    let err = h.client.liquidity.add_liquidity(&request).await.unwrap_err();
    assert!(matches!(err, SdkError::AlreadyExists { address } if address == pool.address));
    assert!(h.ledger.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_create_pool_fee_policy() {
    let h = harness();
    let (a, b) = (mint(&h.ledger, 6), mint(&h.ledger, 6));
    h.ledger.fund(&h.wallet, &a, 10_000_000);
    h.ledger.fund(&h.wallet, &b, 10_000_000);

    // 5% would be built and then rejected by initialize_pool (max 300 bps)
    for fee in ["5", "3.01", "31", "-1", "abc"] {
        let request = LiquidityRequest::new_pool(AssetRef::Fungible(a), AssetRef::Fungible(b), "1", "1", fee);
        let err = h.client.liquidity.add_liquidity(&request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "fee {:?}", fee);
    }
    assert!(h.ledger.sent_transactions().is_empty());

    let request = LiquidityRequest::new_pool(AssetRef::Fungible(a), AssetRef::Fungible(b), "1", "1", "3");
    let plan = h.client.liquidity.prepare_add_liquidity(&request).await.unwrap();
    let initialize = plan
        .instructions
        .iter()
        .find(|ix| ix.program_id == program_id() && ix.data[..8] == INITIALIZE)
        .unwrap();
    assert_eq!(&initialize.data[8..], &300u64.to_le_bytes());
}

#[tokio::test]
async fn test_create_pool_with_native_side_wraps() {
    let h = harness();
    let token = mint(&h.ledger, 6);
    h.ledger.fund(&h.wallet, &token, 10_000_000);

    let request = LiquidityRequest::new_pool(AssetRef::Native, AssetRef::Fungible(token), "1", "10", "1");
    let plan = h.client.liquidity.prepare_add_liquidity(&request).await.unwrap();
    let ids = program_ids(&plan.instructions);

    // mint account, mint init, two reserve holders, wrapped holder, LP holder,
    // transfer + sync, initialize + add, unwrap
    assert_eq!(ids.len(), 11);
    assert_eq!(ids[6], system_program::id());
    assert_eq!(ids[7], spl_token::id());
    assert_eq!(&ids[8..10], &[program_id(), program_id()]);
    assert_eq!(ids[10], spl_token::id());
    assert_eq!(&plan.instructions[9].data[8..16], &1_000_000_000u64.to_le_bytes());
}

#[tokio::test]
async fn test_full_redemption_closes_lp_holder() {
    let h = harness();
    let (a, b) = (mint(&h.ledger, 6), mint(&h.ledger, 6));
    let pool = pool_with(&h, a, b, 2_000_000, 1_000_000);
    let lp = h.ledger.fund(&h.wallet, &pool.lp_mint, 1_000);
    h.ledger.fund(&h.wallet, &a, 0);
    h.ledger.fund(&h.wallet, &b, 0);

    let plan = h
        .client
        .liquidity
        .prepare_remove_liquidity(&AssetRef::Fungible(a), &AssetRef::Fungible(b), "0.001")
        .await
        .unwrap();

    // Fungible holders receive the payout, so only the LP holder is closed.
    let ids = program_ids(&plan.instructions);
    assert_eq!(ids, vec![program_id(), spl_token::id()]);
    assert_eq!(&plan.instructions[0].data[..8], &REMOVE);
    assert_eq!(&plan.instructions[0].data[8..], &1_000u64.to_le_bytes());
    assert_eq!(plan.instructions[1].accounts[0].pubkey, lp);
}

#[tokio::test]
async fn test_zero_payout_removal_is_rejected() {
    let h = harness();
    let (a, b) = (mint(&h.ledger, 6), mint(&h.ledger, 6));
    let pool = pool_with(&h, a, b, 0, 1_000_000);
    h.ledger.fund(&h.wallet, &pool.lp_mint, 1_000);

    let err = h
        .client
        .liquidity
        .remove_liquidity(&AssetRef::Fungible(a), &AssetRef::Fungible(b), "0.001")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // 1 LP unit of 1000 against a reserve of 500 rounds down to nothing
    let (c, d) = (mint(&h.ledger, 6), mint(&h.ledger, 6));
    let pool = pool_with(&h, c, d, 500, 1_000_000);
    h.ledger.fund(&h.wallet, &pool.lp_mint, 1_000);
    let err = h
        .client
        .liquidity
        .remove_liquidity(&pool.asset_a(), &pool.asset_b(), "0.000001")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(h.ledger.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_partial_redemption_creates_missing_holders_and_closes_nothing() {
    let h = harness();
    let (a, b) = (mint(&h.ledger, 6), mint(&h.ledger, 6));
    let pool = pool_with(&h, a, b, 1_000_000, 1_000_000);
    h.ledger.fund(&h.wallet, &pool.lp_mint, 1_000);

    let plan = h
        .client
        .liquidity
        .prepare_remove_liquidity(&AssetRef::Fungible(b), &AssetRef::Fungible(a), "0.0005")
        .await
        .unwrap();
    assert_eq!(
        program_ids(&plan.instructions),
        vec![
            spl_associated_token_account::id(),
            spl_associated_token_account::id(),
            program_id(),
        ]
    );
}

#[tokio::test]
async fn test_remove_more_than_held() {
    let h = harness();
    let (a, b) = (mint(&h.ledger, 6), mint(&h.ledger, 6));
    let pool = pool_with(&h, a, b, 1_000_000, 1_000_000);
    h.ledger.fund(&h.wallet, &pool.lp_mint, 1_000);

    let err = h
        .client
        .liquidity
        .remove_liquidity(&AssetRef::Fungible(a), &AssetRef::Fungible(b), "0.002")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SdkError::InsufficientBalance {
            required: 2_000,
            available: 1_000,
            ..
        }
    ));
}

#[tokio::test]
async fn test_native_underlying_always_unwrapped() {
    let h = harness();
    let token = mint(&h.ledger, 6);
    let pool = pool_with(&h, spl_token::native_mint::id(), token, 1_000_000, 1_000_000);
    h.ledger.fund(&h.wallet, &pool.lp_mint, 1_000);
    h.ledger.fund(&h.wallet, &token, 5);

    let plan = h
        .client
        .liquidity
        .prepare_remove_liquidity(&AssetRef::Native, &AssetRef::Fungible(token), "0.0001")
        .await
        .unwrap();
    let wrapped = holder_address(&h.wallet, &spl_token::native_mint::id());
    assert_eq!(
        program_ids(&plan.instructions),
        vec![spl_associated_token_account::id(), program_id(), spl_token::id()]
    );
    assert_eq!(plan.instructions[2].accounts[0].pubkey, wrapped);

    h.client
        .liquidity
        .remove_liquidity(&AssetRef::Native, &AssetRef::Fungible(token), "0.0001")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_balance_queries() {
    let h = harness();
    let token = mint(&h.ledger, 6);
    h.ledger.fund(&h.wallet, &token, 1_234_567);

    let native = h.client.balance_of(&h.wallet, &AssetRef::Native).await.unwrap();
    assert_eq!((native.amount, native.decimals), (5_000_000_000, 9));

    let fungible = h.client.balance_of(&h.wallet, &AssetRef::Fungible(token)).await.unwrap();
    assert_eq!((fungible.amount, fungible.decimals), (1_234_567, 6));
    assert_eq!(soondex_sdk::format_amount(fungible.amount, fungible.decimals), "1.234567");
}

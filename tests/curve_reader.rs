//! Tests for reading bonding curve accounts through a network client.

mod common;

use common::{curve_account, reference_curve, test_settings, test_token, MockNetworkClient};
use pump_trader::chain::pubkeys::PUMP_PROGRAM;
use pump_trader::chain::{BondingCurveManager, ClientError, CurveError, CurveReader, Wallet};
use pump_trader::trading::instructions::SELL_DISCRIMINATOR;
use pump_trader::trading::{ExecutionContext, TokenSeller, TradeError, TradeIntent, Trader};
use rust_decimal_macros::dec;
use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use std::sync::Arc;

fn seller_over_chain(client: &Arc<MockNetworkClient>) -> TokenSeller {
    let ctx = ExecutionContext::new(
        client.clone(),
        Arc::new(Wallet::new(Keypair::new())),
        Arc::new(BondingCurveManager::new(client.clone())),
        test_settings(),
    );
    TokenSeller::new(ctx)
}

#[tokio::test]
async fn test_reads_curve_owned_by_pump_program() {
    let token = test_token();
    let client = Arc::new(
        MockNetworkClient::new()
            .with_account(token.bonding_curve, curve_account(&reference_curve(), PUMP_PROGRAM)),
    );

    let state = BondingCurveManager::new(client)
        .get_curve_state(&token.bonding_curve)
        .await
        .unwrap();

    assert_eq!(state, reference_curve());
}

#[tokio::test]
async fn test_rejects_curve_owned_by_another_program() {
    let token = test_token();
    let impostor = Pubkey::new_unique();
    let client = Arc::new(
        MockNetworkClient::new()
            .with_account(token.bonding_curve, curve_account(&reference_curve(), impostor)),
    );

    let result = BondingCurveManager::new(client)
        .get_curve_state(&token.bonding_curve)
        .await;

    assert_eq!(
        result,
        Err(CurveError::WrongOwner {
            account: token.bonding_curve,
            owner: impostor
        })
    );
}

#[tokio::test]
async fn test_missing_curve_is_fetch_error() {
    let token = test_token();
    let client = Arc::new(MockNetworkClient::new());

    let result = BondingCurveManager::new(client)
        .get_curve_state(&token.bonding_curve)
        .await;

    assert_eq!(
        result,
        Err(CurveError::Fetch(ClientError::AccountNotFound(token.bonding_curve)))
    );
}

#[tokio::test]
async fn test_truncated_curve_account_is_rejected() {
    let token = test_token();
    let mut account = curve_account(&reference_curve(), PUMP_PROGRAM);
    account.data.truncate(30);
    let client = Arc::new(MockNetworkClient::new().with_account(token.bonding_curve, account));

    let result = BondingCurveManager::new(client)
        .get_curve_state(&token.bonding_curve)
        .await;

    assert_eq!(result, Err(CurveError::TooShort(30)));
}

#[tokio::test]
async fn test_sell_prices_from_fetched_curve() {
    let token = test_token();
    let client = Arc::new(
        MockNetworkClient::new()
            .with_token_balance(1_000_000)
            .with_account(token.bonding_curve, curve_account(&reference_curve(), PUMP_PROGRAM)),
    );

    let result = seller_over_chain(&client)
        .execute(&token, &TradeIntent::sell_all(dec!(0.2)))
        .await;

    assert!(result.is_success());
    assert_eq!(
        client.last_pump_payload(),
        Some((SELL_DISCRIMINATOR, 1_000_000, 40_000))
    );
}

#[tokio::test]
async fn test_sell_against_foreign_curve_is_price_unavailable() {
    let token = test_token();
    let client = Arc::new(
        MockNetworkClient::new()
            .with_token_balance(1_000_000)
            .with_account(
                token.bonding_curve,
                curve_account(&reference_curve(), Pubkey::new_unique()),
            ),
    );

    let result = seller_over_chain(&client)
        .execute(&token, &TradeIntent::sell_all(dec!(0.2)))
        .await;

    assert!(matches!(
        result.error(),
        Some(TradeError::PriceUnavailable(reason)) if reason.contains("not the pump program")
    ));
    assert_eq!(client.send_count(), 0);
}

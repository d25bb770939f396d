//! Buy path: spend a SOL budget on a token still trading on its bonding curve.

use async_trait::async_trait;
use tracing::{info, info_span, Instrument, Span};

use crate::chain::pubkeys::TOKEN_DECIMALS;
use crate::trading::executor::{ensure_direction, log_outcome, ExecutionContext, Trader};
use crate::trading::instructions::{build_buy, create_user_token_account, TradeAccounts};
use crate::trading::pricing::{lamports_to_sol, max_sol_cost, raw_to_ui_amount, token_amount_for_budget};
use crate::trading::types::{TradeDirection, TradeError, TradeFill, TradeIntent, TradeResult};
use crate::types::TokenInfo;

pub struct TokenBuyer {
    ctx: ExecutionContext,
    span: Span,
}

impl TokenBuyer {
    pub fn new(ctx: ExecutionContext) -> Self {
        Self::with_span(ctx, info_span!("buyer"))
    }

    pub fn with_span(ctx: ExecutionContext, span: Span) -> Self {
        Self { ctx, span }
    }

    async fn buy(&self, token: &TokenInfo, intent: &TradeIntent) -> Result<TradeFill, TradeError> {
        ensure_direction(intent, TradeDirection::Buy)?;
        intent.validate()?;

        let ctx = &self.ctx;
        let budget = intent.amount.unwrap_or(ctx.settings.default_buy_lamports);
        if budget == 0 {
            return Err(TradeError::InvalidIntent("buy budget is zero".to_string()));
        }
        let max_cost = max_sol_cost(budget, intent.slippage)?;

        let user = ctx.signer.pubkey();
        let balance = ctx
            .client
            .get_balance(&user)
            .await
            .map_err(|e| TradeError::Unexpected(format!("failed to fetch SOL balance: {}", e)))?;
        info!("SOL balance: {}", lamports_to_sol(balance));

        if balance == 0 {
            return Err(TradeError::NoInventory);
        }
        if balance < max_cost {
            return Err(TradeError::InsufficientBalance {
                required: max_cost,
                available: balance,
            });
        }

        let (curve, price) = ctx.quote(token).await?;
        info!("Price per token: {:.20} SOL", price);

        let token_amount = token_amount_for_budget(budget, &curve)?;
        if token_amount == 0 {
            return Err(TradeError::InvalidIntent(format!(
                "{} lamports buy no tokens at {} SOL",
                budget, price
            )));
        }
        info!(
            "Buying {} tokens for {} SOL, maximum cost {} SOL ({} lamports) at {} slippage",
            raw_to_ui_amount(token_amount, TOKEN_DECIMALS),
            lamports_to_sol(budget),
            lamports_to_sol(max_cost),
            max_cost,
            intent.slippage
        );

        let accounts = TradeAccounts::new(token, user, ctx.signer.associated_token_address(&token.mint));
        let mut instructions = ctx.preamble();
        instructions.push(create_user_token_account(&accounts));
        instructions.push(build_buy(&accounts, token_amount, max_cost)?);

        let signature = ctx.submit(&instructions, intent.max_retries).await?;

        let fill = TradeFill {
            signature,
            amount: raw_to_ui_amount(token_amount, TOKEN_DECIMALS),
            price,
            confirmed: false,
        };
        ctx.finish(&token.mint, TradeDirection::Buy, fill, intent.confirmation)
            .await
    }
}

#[async_trait]
impl Trader for TokenBuyer {
    async fn execute(&self, token: &TokenInfo, intent: &TradeIntent) -> TradeResult {
        let result: TradeResult = self
            .buy(token, intent)
            .instrument(self.span.clone())
            .await
            .into();
        self.span
            .in_scope(|| log_outcome(TradeDirection::Buy, token, &result));
        result
    }
}

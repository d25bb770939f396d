//! Sell path: turn a token balance back into SOL on the bonding curve.

use async_trait::async_trait;
use tracing::{info, info_span, Instrument, Span};

use crate::chain::pubkeys::TOKEN_DECIMALS;
use crate::trading::executor::{ensure_direction, log_outcome, ExecutionContext, Trader};
use crate::trading::instructions::{build_sell, TradeAccounts};
use crate::trading::pricing::{lamports_to_sol, min_sol_output, raw_to_ui_amount};
use crate::trading::types::{TradeDirection, TradeError, TradeFill, TradeIntent, TradeResult};
use crate::types::TokenInfo;

pub struct TokenSeller {
    ctx: ExecutionContext,
    span: Span,
}

impl TokenSeller {
    pub fn new(ctx: ExecutionContext) -> Self {
        Self::with_span(ctx, info_span!("seller"))
    }

    /// Scope every event of this seller under `span`.
    pub fn with_span(ctx: ExecutionContext, span: Span) -> Self {
        Self { ctx, span }
    }

    async fn sell(&self, token: &TokenInfo, intent: &TradeIntent) -> Result<TradeFill, TradeError> {
        ensure_direction(intent, TradeDirection::Sell)?;
        intent.validate()?;

        let ctx = &self.ctx;
        let user = ctx.signer.pubkey();
        let user_token_account = ctx.signer.associated_token_address(&token.mint);

        let balance = ctx
            .client
            .get_token_account_balance(&user_token_account)
            .await
            .map_err(|e| TradeError::Unexpected(format!("failed to fetch token balance: {}", e)))?;
        info!("Token balance of {}: {}", token.mint, raw_to_ui_amount(balance, TOKEN_DECIMALS));

        if balance == 0 {
            return Err(TradeError::NoInventory);
        }
        let token_amount = match intent.amount {
            Some(requested) if requested > balance => {
                return Err(TradeError::InsufficientBalance {
                    required: requested,
                    available: balance,
                })
            }
            Some(requested) => requested,
            None => balance,
        };

        let (curve, price) = ctx.quote(token).await?;
        info!("Price per token: {:.20} SOL", price);

        let min_output = min_sol_output(token_amount, &curve, intent.slippage)?;
        info!(
            "Selling {} tokens, minimum output {} SOL ({} lamports) at {} slippage",
            raw_to_ui_amount(token_amount, TOKEN_DECIMALS),
            lamports_to_sol(min_output),
            min_output,
            intent.slippage
        );

        let accounts = TradeAccounts::new(token, user, user_token_account);
        let mut instructions = ctx.preamble();
        instructions.push(build_sell(&accounts, token_amount, min_output)?);

        let signature = ctx.submit(&instructions, intent.max_retries).await?;

        let fill = TradeFill {
            signature,
            amount: raw_to_ui_amount(token_amount, TOKEN_DECIMALS),
            price,
            confirmed: false,
        };
        ctx.finish(&token.mint, TradeDirection::Sell, fill, intent.confirmation)
            .await
    }
}

#[async_trait]
impl Trader for TokenSeller {
    async fn execute(&self, token: &TokenInfo, intent: &TradeIntent) -> TradeResult {
        let result: TradeResult = self
            .sell(token, intent)
            .instrument(self.span.clone())
            .await
            .into();
        self.span
            .in_scope(|| log_outcome(TradeDirection::Sell, token, &result));
        result
    }
}

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::common::errors::Result;
use crate::common::traits::ExecutionAdapter;

/// Log-only adapter; nothing leaves the process
#[derive(Debug, Default)]
pub struct DryRunAdapter {
    qty: Decimal,
    opens: u64,
    settles: u64,
}

impl DryRunAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity staged for the next open
    pub fn staged_qty(&self) -> Decimal {
        self.qty
    }

    pub fn opens(&self) -> u64 {
        self.opens
    }

    pub fn settles(&self) -> u64 {
        self.settles
    }
}

#[async_trait]
impl ExecutionAdapter for DryRunAdapter {
    async fn prepare_next_entry_qty(&mut self, qty: Decimal) -> Result<()> {
        self.qty = qty;
        info!(qty = %qty, "[DRY] set qty");
        Ok(())
    }

    async fn fast_click_long(&mut self) -> Result<()> {
        self.opens += 1;
        info!(qty = %self.qty, "[DRY] CLICK LONG");
        Ok(())
    }

    async fn fast_click_short(&mut self) -> Result<()> {
        self.opens += 1;
        info!(qty = %self.qty, "[DRY] CLICK SHORT");
        Ok(())
    }

    async fn fast_click_settle(&mut self) -> Result<()> {
        self.settles += 1;
        info!("[DRY] CLICK SETTLE (close position)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry_run"
    }
}

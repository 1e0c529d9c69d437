//! Portfolio-level roll-up of a ranked target list.

use crate::targets::ConsolidationTarget;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Integration cost as a share of acquisition cost
pub const INTEGRATION_COST_RATE: f64 = 0.10;
pub const PROJECTION_YEARS: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialProjections {
    pub target_count: usize,
    pub total_revenue: Decimal,
    pub total_acquisition_cost: Decimal,
    pub integration_cost: Decimal,
    pub total_investment: Decimal,
    pub cost_synergies: Decimal,
    pub revenue_synergies: Decimal,
    pub total_synergies: Decimal,
    pub annual_ebitda: Decimal,
    /// Combined EBITDA plus synergies
    pub annual_return: Decimal,
    pub roi_pct: f64,
    /// None when the portfolio returns nothing
    pub payback_years: Option<f64>,
    pub five_year_value: Decimal,
}

fn dollars(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO).round_dp(2)
}

/// Aggregate acquisition cost, synergies, ROI, and payback for a target list.
pub fn project_portfolio(targets: &[ConsolidationTarget], operating_margin: f64) -> FinancialProjections {
    let revenue: f64 = targets.iter().filter_map(|t| t.estimated_revenue).sum();
    let acquisition: f64 = targets.iter().map(|t| t.estimated_acquisition_cost).sum();
    let cost_synergies: f64 = targets.iter().map(|t| t.cost_synergies).sum();
    let revenue_synergies: f64 = targets.iter().map(|t| t.revenue_synergies).sum();

    let total_revenue = dollars(revenue);
    let total_acquisition_cost = dollars(acquisition);
    let integration_cost = dollars(acquisition * INTEGRATION_COST_RATE);
    let total_investment = total_acquisition_cost + integration_cost;
    let cost_synergies = dollars(cost_synergies);
    let revenue_synergies = dollars(revenue_synergies);
    let total_synergies = cost_synergies + revenue_synergies;
    let annual_ebitda = dollars(revenue * operating_margin.max(0.0));
    let annual_return = annual_ebitda + total_synergies;

    let investment_f64 = total_investment.to_f64().unwrap_or(0.0);
    let return_f64 = annual_return.to_f64().unwrap_or(0.0);
    let roi_pct = if investment_f64 > 0.0 {
        return_f64 / investment_f64 * 100.0
    } else {
        0.0
    };
    let payback_years = (return_f64 > 0.0).then(|| investment_f64 / return_f64);

    FinancialProjections {
        target_count: targets.len(),
        total_revenue,
        total_acquisition_cost,
        integration_cost,
        total_investment,
        cost_synergies,
        revenue_synergies,
        total_synergies,
        annual_ebitda,
        annual_return,
        roi_pct,
        payback_years,
        five_year_value: annual_return * Decimal::from(PROJECTION_YEARS) - total_investment,
    }
}

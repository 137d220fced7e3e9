use serde::{Deserialize, Serialize};

use super::models::{Category, Plan};

/// Fields shown in the side-by-side comparison, in display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonField {
    CreditValue,
    InstallmentValue,
    TermMonths,
    AdminFee,
    AverageBid,
    Group,
    Notes,
    ProjectedTotalPaid,
}

impl ComparisonField {
    pub const ORDER: [ComparisonField; 8] = [
        ComparisonField::CreditValue,
        ComparisonField::InstallmentValue,
        ComparisonField::TermMonths,
        ComparisonField::AdminFee,
        ComparisonField::AverageBid,
        ComparisonField::Group,
        ComparisonField::Notes,
        ComparisonField::ProjectedTotalPaid,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ComparisonField::CreditValue => "Valor da carta",
            ComparisonField::InstallmentValue => "Parcela",
            ComparisonField::TermMonths => "Prazo (meses)",
            ComparisonField::AdminFee => "Taxa Adm % (aprox)",
            ComparisonField::AverageBid => "Média de lance",
            ComparisonField::Group => "Grupo",
            ComparisonField::Notes => "Observações",
            ComparisonField::ProjectedTotalPaid => "Total estimado em parcelas",
        }
    }

    /// Reads the field from the plan as it is right now.
    pub fn extract(&self, plan: &Plan) -> ComparisonValue {
        match self {
            ComparisonField::CreditValue => ComparisonValue::Money(plan.credit_value),
            ComparisonField::InstallmentValue => {
                if plan.installment_value > 0.0 {
                    ComparisonValue::Money(plan.installment_value)
                } else {
                    ComparisonValue::Unknown
                }
            }
            ComparisonField::TermMonths => ComparisonValue::Months(plan.term_months),
            ComparisonField::AdminFee => ComparisonValue::Percent(plan.admin_fee_percent),
            ComparisonField::AverageBid => ComparisonValue::Bid {
                percent: plan.average_bid_percent,
                amount: plan.average_bid_amount(),
            },
            ComparisonField::Group => text_or_unknown(plan.group.as_deref()),
            ComparisonField::Notes => text_or_unknown(plan.notes.as_deref()),
            ComparisonField::ProjectedTotalPaid => plan
                .projected_total_paid()
                .map(ComparisonValue::Money)
                .unwrap_or(ComparisonValue::Unknown),
        }
    }
}

fn text_or_unknown(value: Option<&str>) -> ComparisonValue {
    match value {
        Some(text) => ComparisonValue::Text(text.to_string()),
        None => ComparisonValue::Unknown,
    }
}

/// One cell of the comparison table. Formatting is left to the presenter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ComparisonValue {
    Money(f64),
    Percent(f64),
    Months(u32),
    Bid { percent: f64, amount: f64 },
    Text(String),
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonColumn {
    pub plan_id: String,
    pub administrator: String,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonRow {
    pub field: ComparisonField,
    pub label: String,
    pub values: Vec<ComparisonValue>,
}

/// Row-major comparison: one row per field, one value per selected plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComparisonTable {
    pub columns: Vec<ComparisonColumn>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn row(&self, field: ComparisonField) -> Option<&ComparisonRow> {
        self.rows.iter().find(|row| row.field == field)
    }
}

/// Projects the plans, already in selection order, onto the fixed field list.
pub fn project<'a, I>(plans: I) -> ComparisonTable
where
    I: IntoIterator<Item = &'a Plan>,
{
    let plans: Vec<&Plan> = plans.into_iter().collect();
    if plans.is_empty() {
        return ComparisonTable::default();
    }
    let columns = plans
        .iter()
        .map(|plan| ComparisonColumn {
            plan_id: plan.id.clone(),
            administrator: plan.administrator.clone(),
            category: plan.category,
        })
        .collect();
    let rows = ComparisonField::ORDER
        .iter()
        .map(|field| ComparisonRow {
            field: *field,
            label: field.label().to_string(),
            values: plans.iter().map(|plan| field.extract(plan)).collect(),
        })
        .collect();
    ComparisonTable { columns, rows }
}

/// Bid simulator: a fixed amount wins over the percentage of the credit.
/// Advisory only; administrators apply their own rules.
pub fn estimate_bid(credit_value: f64, percent: f64, fixed: Option<f64>) -> f64 {
    match fixed {
        Some(amount) => amount,
        None => percent / 100.0 * credit_value,
    }
}

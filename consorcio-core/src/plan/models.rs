use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of good a consortium plan finances.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum Category {
    #[default]
    Automobile,
    Services,
    RealEstate,
    Motorcycle,
    Truck,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Automobile,
        Category::Services,
        Category::RealEstate,
        Category::Motorcycle,
        Category::Truck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Automobile => "Automobile",
            Category::Services => "Services",
            Category::RealEstate => "RealEstate",
            Category::Motorcycle => "Motorcycle",
            Category::Truck => "Truck",
        }
    }

    /// Label used by the Portuguese catalog screens and older export files.
    pub fn label_pt(&self) -> &'static str {
        match self {
            Category::Automobile => "Automóvel",
            Category::Services => "Serviços",
            Category::RealEstate => "Imóvel",
            Category::Motorcycle => "Moto",
            Category::Truck => "Caminhão",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .map(fold_accent)
            .flat_map(char::to_lowercase)
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect();
        match folded.as_str() {
            "automobile" | "automovel" => Ok(Category::Automobile),
            "services" | "servicos" => Ok(Category::Services),
            "realestate" | "imovel" => Ok(Category::RealEstate),
            "motorcycle" | "moto" => Ok(Category::Motorcycle),
            "truck" | "caminhao" => Ok(Category::Truck),
            _ => Err(format!("unknown plan category: {s}")),
        }
    }
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'Á' | 'À' | 'Â' | 'Ã' => 'a',
        'é' | 'ê' | 'É' | 'Ê' => 'e',
        'í' | 'Í' => 'i',
        'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' | 'Õ' => 'o',
        'ú' | 'Ú' => 'u',
        'ç' | 'Ç' => 'c',
        other => other,
    }
}

/// A registered consortium plan.
///
/// Serialized with the camelCase field names used by the exchange file and
/// the persisted catalog. `group` and `notes` are omitted when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub administrator: String,
    pub category: Category,
    pub credit_value: f64,
    pub installment_value: f64,
    pub term_months: u32,
    pub admin_fee_percent: f64,
    pub average_bid_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    pub fn from_draft(id: impl Into<String>, draft: PlanDraft, updated_at: DateTime<Utc>) -> Self {
        let draft = draft.normalized();
        Self {
            id: id.into(),
            administrator: draft.administrator,
            category: draft.category,
            credit_value: draft.credit_value,
            installment_value: draft.installment_value,
            term_months: draft.term_months,
            admin_fee_percent: draft.admin_fee_percent,
            average_bid_percent: draft.average_bid_percent,
            group: draft.group,
            notes: draft.notes,
            updated_at,
        }
    }

    /// Editable fields of the plan, as loaded into the edit form.
    pub fn to_draft(&self) -> PlanDraft {
        PlanDraft {
            administrator: self.administrator.clone(),
            category: self.category,
            credit_value: self.credit_value,
            installment_value: self.installment_value,
            term_months: self.term_months,
            admin_fee_percent: self.admin_fee_percent,
            average_bid_percent: self.average_bid_percent,
            group: self.group.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Average winning bid expressed as money: `averageBidPercent / 100 × creditValue`.
    pub fn average_bid_amount(&self) -> f64 {
        self.average_bid_percent / 100.0 * self.credit_value
    }

    /// Sum of all installments, known only when both installment and term are set.
    pub fn projected_total_paid(&self) -> Option<f64> {
        if self.installment_value > 0.0 && self.term_months > 0 {
            Some(self.installment_value * f64::from(self.term_months))
        } else {
            None
        }
    }

    /// Lowercase text the free-text search runs against. Carries the category
    /// both as displayed (`Imóvel`) and as stored (`RealEstate`).
    pub fn search_haystack(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.administrator,
            self.category.label_pt(),
            self.category,
            self.group.as_deref().unwrap_or(""),
            self.notes.as_deref().unwrap_or("")
        )
        .to_lowercase()
    }
}

/// Form input for creating or editing a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanDraft {
    pub administrator: String,
    pub category: Category,
    pub credit_value: f64,
    pub installment_value: f64,
    pub term_months: u32,
    pub admin_fee_percent: f64,
    pub average_bid_percent: f64,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Default for PlanDraft {
    fn default() -> Self {
        Self {
            administrator: String::new(),
            category: Category::Automobile,
            credit_value: 0.0,
            installment_value: 0.0,
            term_months: 60,
            admin_fee_percent: 15.0,
            average_bid_percent: 20.0,
            group: None,
            notes: None,
        }
    }
}

impl PlanDraft {
    pub fn new(administrator: impl Into<String>, category: Category) -> Self {
        Self {
            administrator: administrator.into(),
            category,
            ..Self::default()
        }
    }

    /// Returns every rule the draft breaks; an empty list means it can be saved.
    pub fn validate(&self) -> Vec<DraftIssue> {
        let mut issues = Vec::new();
        if self.administrator.trim().is_empty() {
            issues.push(DraftIssue::MissingAdministrator);
        }
        if !(self.credit_value.is_finite() && self.credit_value > 0.0) {
            issues.push(DraftIssue::NonPositiveCreditValue);
        }
        if self.term_months == 0 {
            issues.push(DraftIssue::NonPositiveTerm);
        }
        if !is_non_negative(self.installment_value) {
            issues.push(DraftIssue::NegativeInstallmentValue);
        }
        if !is_non_negative(self.admin_fee_percent) {
            issues.push(DraftIssue::NegativeAdminFee);
        }
        if !is_non_negative(self.average_bid_percent) {
            issues.push(DraftIssue::NegativeAverageBid);
        }
        issues
    }

    fn normalized(mut self) -> Self {
        self.administrator = self.administrator.trim().to_string();
        self.group = non_blank(self.group);
        self.notes = non_blank(self.notes);
        self
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// A rule a [`PlanDraft`] failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftIssue {
    MissingAdministrator,
    NonPositiveCreditValue,
    NonPositiveTerm,
    NegativeInstallmentValue,
    NegativeAdminFee,
    NegativeAverageBid,
}

impl DraftIssue {
    /// Exchange-file name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            DraftIssue::MissingAdministrator => "administrator",
            DraftIssue::NonPositiveCreditValue => "creditValue",
            DraftIssue::NonPositiveTerm => "termMonths",
            DraftIssue::NegativeInstallmentValue => "installmentValue",
            DraftIssue::NegativeAdminFee => "adminFeePercent",
            DraftIssue::NegativeAverageBid => "averageBidPercent",
        }
    }
}

impl fmt::Display for DraftIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DraftIssue::MissingAdministrator => "is required",
            DraftIssue::NonPositiveCreditValue | DraftIssue::NonPositiveTerm => {
                "must be greater than zero"
            }
            DraftIssue::NegativeInstallmentValue
            | DraftIssue::NegativeAdminFee
            | DraftIssue::NegativeAverageBid => "must not be negative",
        };
        write!(f, "{} {reason}", self.field())
    }
}

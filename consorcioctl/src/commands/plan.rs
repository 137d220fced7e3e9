use clap::{Args, ValueEnum};
use consorcio_core::{Category, PlanDraft};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    Automobile,
    Services,
    RealEstate,
    Motorcycle,
    Truck,
}

impl From<CategoryArg> for Category {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Automobile => Category::Automobile,
            CategoryArg::Services => Category::Services,
            CategoryArg::RealEstate => Category::RealEstate,
            CategoryArg::Motorcycle => Category::Motorcycle,
            CategoryArg::Truck => Category::Truck,
        }
    }
}

/// Campos do formulário de plano. Campos omitidos mantêm o valor de base.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanFieldArgs {
    /// Administradora (ex.: Rodobens, Porto Seguro)
    #[arg(long, value_name = "NOME")]
    pub administrator: Option<String>,
    /// Tipo do bem
    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,
    /// Valor da carta de crédito
    #[arg(long = "credit", value_name = "VALOR")]
    pub credit_value: Option<f64>,
    /// Valor da parcela (0 = desconhecido)
    #[arg(long = "installment", value_name = "VALOR")]
    pub installment_value: Option<f64>,
    /// Prazo em meses
    #[arg(long = "term", value_name = "MESES")]
    pub term_months: Option<u32>,
    /// Taxa de administração total aproximada (%)
    #[arg(long = "admin-fee", value_name = "PCT")]
    pub admin_fee_percent: Option<f64>,
    /// Média de lance observada (%)
    #[arg(long = "average-bid", value_name = "PCT")]
    pub average_bid_percent: Option<f64>,
    /// Grupo (vazio remove)
    #[arg(long, value_name = "GRUPO")]
    pub group: Option<String>,
    /// Observações (vazio remove)
    #[arg(long, value_name = "TEXTO")]
    pub notes: Option<String>,
}

impl PlanFieldArgs {
    /// Overlays the given flags on `base`.
    pub fn apply(&self, mut base: PlanDraft) -> PlanDraft {
        if let Some(administrator) = &self.administrator {
            base.administrator = administrator.clone();
        }
        if let Some(category) = self.category {
            base.category = category.into();
        }
        if let Some(value) = self.credit_value {
            base.credit_value = value;
        }
        if let Some(value) = self.installment_value {
            base.installment_value = value;
        }
        if let Some(value) = self.term_months {
            base.term_months = value;
        }
        if let Some(value) = self.admin_fee_percent {
            base.admin_fee_percent = value;
        }
        if let Some(value) = self.average_bid_percent {
            base.average_bid_percent = value;
        }
        if let Some(group) = &self.group {
            base.group = Some(group.clone());
        }
        if let Some(notes) = &self.notes {
            base.notes = Some(notes.clone());
        }
        base
    }
}

#[derive(Args, Debug, Clone)]
pub struct PlanIdArgs {
    /// Identificador do plano
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Identificador do plano a editar
    #[arg(value_name = "ID")]
    pub id: String,
    #[command(flatten)]
    pub fields: PlanFieldArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Identificador do plano a excluir
    #[arg(value_name = "ID")]
    pub id: String,
    /// Exclui sem pedir confirmação
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_overlays_only_given_fields() {
        let args = PlanFieldArgs {
            credit_value: Some(80_000.0),
            category: Some(CategoryArg::RealEstate),
            group: Some(String::new()),
            ..PlanFieldArgs::default()
        };
        let base = PlanDraft {
            group: Some("A1".into()),
            ..PlanDraft::new("Rodobens", Category::Automobile)
        };
        let draft = args.apply(base);
        assert_eq!(draft.administrator, "Rodobens");
        assert_eq!(draft.category, Category::RealEstate);
        assert_eq!(draft.credit_value, 80_000.0);
        assert_eq!(draft.term_months, 60);
        assert_eq!(draft.group.as_deref(), Some(""));
    }
}
